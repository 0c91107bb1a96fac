// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`Store`] is the storage seam. [`FirestoreDb`] backs production;
//! [`MemoryDb`] backs local development and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{CohortSample, JournalEntry, User, UserUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Collection names as constants.
pub mod collections {
    /// User profiles (keyed by URL-encoded auth subject)
    pub const USERS: &str = "users";
    /// Journal entries (keyed by entry id). `expiresAt` is the TTL field.
    pub const JOURNAL_ENTRIES: &str = "journal_entries";
}

/// Inclusive bounds on an entry's `createdAt`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at <= e)
    }
}

/// Persistent storage for users and journal entries.
///
/// Every write is a single-document write; callers rely on per-document
/// atomicity only.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_user(&self, subject: &str) -> Result<Option<User>, AppError>;

    /// Create or fully replace a user. Only used when the user is first
    /// created; later changes go through [`Store::update_user`].
    async fn upsert_user(&self, user: &User) -> Result<(), AppError>;

    /// Field-level write of the fields `update` sets. Returns the stored
    /// user afterwards. Fails with `NotFound` when there is no user and with
    /// `AccountInactive` once the account is no longer active.
    async fn update_user(&self, subject: &str, update: &UserUpdate) -> Result<User, AppError>;

    /// Field-level write of `lastActive` only.
    async fn touch_last_active(&self, subject: &str, at: DateTime<Utc>) -> Result<(), AppError>;

    async fn get_entry(&self, id: &str) -> Result<Option<JournalEntry>, AppError>;

    /// Create or fully replace an entry.
    async fn put_entry(&self, entry: &JournalEntry) -> Result<(), AppError>;

    async fn delete_entry(&self, id: &str) -> Result<(), AppError>;

    /// A page of a user's entries, newest first.
    async fn list_entries(
        &self,
        user_id: &str,
        range: DateRange,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<JournalEntry>, AppError>;

    async fn count_entries(&self, user_id: &str, range: DateRange) -> Result<u64, AppError>;

    /// All of a user's entries created at or after `since` (all entries when
    /// `None`), newest first.
    async fn entries_since(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<JournalEntry>, AppError>;

    /// Cohort projection of entries shared anonymously since `since`. No
    /// owner field is read.
    async fn cohort_samples(&self, since: DateTime<Utc>) -> Result<Vec<CohortSample>, AppError>;

    /// Delete entries whose `expiresAt` is at or before `now`. Returns the
    /// number of deleted entries.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError>;
}

/// Periodically purge expired entries until the task is aborted.
pub fn spawn_expiry_sweeper(db: Arc<dyn Store>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match db.purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(count) => tracing::info!(count, "Purged expired journal entries"),
                Err(e) => tracing::warn!(error = %e, "Expiry sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_date_range_is_inclusive() {
        let now = Utc::now();
        let range = DateRange {
            start: Some(now - ChronoDuration::days(1)),
            end: Some(now),
        };
        assert!(range.contains(now));
        assert!(range.contains(now - ChronoDuration::days(1)));
        assert!(!range.contains(now + ChronoDuration::seconds(1)));
        assert!(DateRange::default().contains(now));
    }
}
