// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Real-time mood relay.
//!
//! At-most-once fan-out of small JSON events to subscribers of a logical
//! channel. Publishing never waits on subscribers.

use crate::models::{Location, MoodColor};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Channel carrying cohort-visible mood events.
pub const ANONYMOUS_CHANNEL: &str = "anonymous-journal-update";

/// Channel for a shared mood session.
pub fn session_channel(session_id: &str) -> String {
    format!("session:{session_id}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum RelayEvent {
    /// A journal entry was shared anonymously. Carries no owner field.
    #[serde(rename_all = "camelCase")]
    AnonymousJournalUpdate {
        mood: u8,
        timestamp: DateTime<Utc>,
        location: Option<Location>,
    },
    #[serde(rename_all = "camelCase")]
    MoodBroadcast {
        session_id: String,
        mood: u8,
        colors: Vec<MoodColor>,
    },
}

impl RelayEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RelayEvent::AnonymousJournalUpdate { .. } => "anonymous-journal-update",
            RelayEvent::MoodBroadcast { .. } => "mood-broadcast",
        }
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay backend error: {0}")]
    Backend(String),
}

pub type EventStream = Pin<Box<dyn Stream<Item = RelayEvent> + Send>>;

/// Publishing capability handed to operations that emit events.
///
/// `publish` must not block. Callers treat errors as non-fatal.
pub trait MoodRelay: Send + Sync {
    fn publish(&self, channel: &str, event: RelayEvent) -> Result<(), RelayError>;

    fn subscribe(&self, channel: &str) -> Result<EventStream, RelayError>;
}

type Channels = DashMap<String, broadcast::Sender<RelayEvent>>;

/// Single-process relay on tokio broadcast channels.
///
/// A channel exists while it has subscribers; the last subscription to go
/// away removes it.
pub struct MemoryRelay {
    channels: Arc<Channels>,
    capacity: usize,
}

impl MemoryRelay {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Number of channels that currently exist.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

impl MoodRelay for MemoryRelay {
    fn publish(&self, channel: &str, event: RelayEvent) -> Result<(), RelayError> {
        let Some(tx) = self.channels.get(channel).map(|tx| tx.clone()) else {
            return Ok(());
        };

        if tx.send(event).is_err() {
            // Every subscriber went away.
            self.channels
                .remove_if(channel, |_, tx| tx.receiver_count() == 0);
        }
        Ok(())
    }

    fn subscribe(&self, channel: &str) -> Result<EventStream, RelayError> {
        let rx = self
            .channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();

        // Lagged receivers skip the events they missed.
        let stream = BroadcastStream::new(rx).filter_map(|result| result.ok());
        Ok(Box::pin(Subscription {
            inner: Some(Box::pin(stream)),
            channel: channel.to_string(),
            channels: Arc::clone(&self.channels),
        }))
    }
}

/// Subscriber side of a [`MemoryRelay`] channel.
struct Subscription {
    inner: Option<EventStream>,
    channel: String,
    channels: Arc<Channels>,
}

impl Stream for Subscription {
    type Item = RelayEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<RelayEvent>> {
        match self.get_mut().inner.as_mut() {
            Some(inner) => inner.as_mut().poll_next(cx),
            None => Poll::Ready(None),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Release the receiver first so it no longer counts.
        self.inner.take();
        self.channels
            .remove_if(&self.channel, |_, tx| tx.receiver_count() == 0);
    }
}
