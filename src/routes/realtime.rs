// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Real-time mood streams (server-sent events).

use crate::error::{AppError, Result};
use crate::middleware::auth::ConsentedUser;
use crate::services::relay::{session_channel, EventStream, RelayEvent, ANONYMOUS_CHANNEL};
use crate::validation::schema::SessionMoodInput;
use crate::validation::ValidJson;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures_util::Stream;
use serde::Serialize;
use std::sync::Arc;
use tokio_stream::StreamExt;

const MAX_SESSION_ID_CHARS: usize = 64;

/// Public streams. Only cohort-visible events are carried here.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/realtime/anonymous", get(anonymous_stream))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/realtime/sessions/{session_id}", get(session_stream))
        .route(
            "/api/realtime/sessions/{session_id}/mood",
            post(broadcast_mood),
        )
}

fn sse(events: EventStream) -> Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>> {
    let stream = events.map(|event: RelayEvent| Event::default().event(event.name()).json_data(&event));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn check_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id.chars().count() <= MAX_SESSION_ID_CHARS
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::invalid_field(
            "sessionId",
            "format",
            "Session id must be 1-64 letters, digits, '-' or '_'",
        ))
    }
}

async fn anonymous_stream(
    State(state): State<Arc<AppState>>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>>> {
    let events = state
        .relay
        .subscribe(ANONYMOUS_CHANNEL)
        .map_err(|e| AppError::Internal(e.into()))?;
    tracing::debug!("Anonymous mood stream opened");
    Ok(sse(events))
}

async fn session_stream(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    Path(session_id): Path<String>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>>> {
    let who = user.proof()?;
    check_session_id(&session_id)?;
    let events = state
        .relay
        .subscribe(&session_channel(&session_id))
        .map_err(|e| AppError::Internal(e.into()))?;
    tracing::debug!(user_id = %who.subject(), session_id = %session_id, "Session mood stream opened");
    Ok(sse(events))
}

#[derive(Serialize)]
pub struct BroadcastResponse {
    pub message: &'static str,
}

/// Relay a mood update to everyone watching the session. Delivery is best
/// effort; a relay failure is logged and the request still succeeds.
async fn broadcast_mood(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    Path(session_id): Path<String>,
    ValidJson(update): ValidJson<SessionMoodInput>,
) -> Result<(StatusCode, Json<BroadcastResponse>)> {
    let who = user.proof()?;
    check_session_id(&session_id)?;

    let event = RelayEvent::MoodBroadcast {
        session_id: session_id.clone(),
        mood: update.mood,
        colors: update.colors,
    };
    if let Err(e) = state.relay.publish(&session_channel(&session_id), event) {
        tracing::warn!(
            user_id = %who.subject(),
            session_id = %session_id,
            error = %e,
            "Session mood broadcast failed"
        );
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(BroadcastResponse {
            message: "Mood broadcast",
        }),
    ))
}
