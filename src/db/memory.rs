// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory [`Store`] for local development and tests.
//!
//! Expired entries stay readable until the next sweep, mirroring the purge
//! latency of a TTL policy.

use crate::db::{DateRange, Store};
use crate::error::AppError;
use crate::models::{CohortSample, JournalEntry, User, UserUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemoryDb {
    users: Arc<DashMap<String, User>>,
    entries: Arc<DashMap<String, JournalEntry>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// A user's entries inside `range`, newest first.
    fn owned_entries(&self, user_id: &str, range: DateRange) -> Vec<JournalEntry> {
        let mut entries: Vec<JournalEntry> = self
            .entries
            .iter()
            .filter(|e| e.is_owned_by(user_id) && range.contains(e.created_at))
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        entries
    }
}

#[async_trait]
impl Store for MemoryDb {
    async fn get_user(&self, subject: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(subject).map(|u| u.value().clone()))
    }

    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        self.users.insert(user.auth_subject.clone(), user.clone());
        Ok(())
    }

    async fn update_user(&self, subject: &str, update: &UserUpdate) -> Result<User, AppError> {
        let mut user = self
            .users
            .get_mut(subject)
            .ok_or_else(|| AppError::NotFound(format!("user {subject}")))?;
        if !user.is_active() {
            return Err(AppError::AccountInactive);
        }
        update.apply(&mut user);
        Ok(user.clone())
    }

    async fn touch_last_active(&self, subject: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(mut user) = self.users.get_mut(subject) {
            user.last_active = at;
        }
        Ok(())
    }

    async fn get_entry(&self, id: &str) -> Result<Option<JournalEntry>, AppError> {
        Ok(self.entries.get(id).map(|e| e.value().clone()))
    }

    async fn put_entry(&self, entry: &JournalEntry) -> Result<(), AppError> {
        self.entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn delete_entry(&self, id: &str) -> Result<(), AppError> {
        self.entries.remove(id);
        Ok(())
    }

    async fn list_entries(
        &self,
        user_id: &str,
        range: DateRange,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<JournalEntry>, AppError> {
        Ok(self
            .owned_entries(user_id, range)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_entries(&self, user_id: &str, range: DateRange) -> Result<u64, AppError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.is_owned_by(user_id) && range.contains(e.created_at))
            .count() as u64)
    }

    async fn entries_since(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<JournalEntry>, AppError> {
        let range = DateRange {
            start: since,
            end: None,
        };
        Ok(self.owned_entries(user_id, range))
    }

    async fn cohort_samples(&self, since: DateTime<Utc>) -> Result<Vec<CohortSample>, AppError> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.privacy.anonymous_sharing && e.created_at >= since)
            .map(|e| CohortSample::from(e.value()))
            .collect())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.expires_at.map_or(true, |at| at > now));
        Ok(before.saturating_sub(self.entries.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::ANONYMOUS_EMAIL;
    use crate::models::{EntryAnalytics, EntryBody, EntryContext, EntryPrivacy, Mood, Prompts};
    use chrono::Duration;

    fn entry(id: &str, owner: &str, created_at: DateTime<Utc>) -> JournalEntry {
        JournalEntry {
            id: id.to_string(),
            user_id: owner.to_string(),
            entry: EntryBody {
                content: "note".to_string(),
                mood: Mood {
                    scale: 5,
                    colors: vec![],
                    tags: vec![],
                },
                prompts: Prompts::default(),
                context: EntryContext::default(),
            },
            privacy: EntryPrivacy::default(),
            analytics: EntryAnalytics::default(),
            expires_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_paged() {
        let db = MemoryDb::new();
        let now = Utc::now();
        for i in 0..5 {
            db.put_entry(&entry(&format!("e{i}"), "alice", now - Duration::days(i)))
                .await
                .unwrap();
        }
        db.put_entry(&entry("other", "bob", now)).await.unwrap();

        let page = db
            .list_entries("alice", DateRange::default(), 2, 2)
            .await
            .unwrap();
        let ids: Vec<&str> = page.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e2", "e3"]);
        assert_eq!(
            db.count_entries("alice", DateRange::default()).await.unwrap(),
            5
        );
        assert_eq!(
            db.count_entries("alice", DateRange::since(now - Duration::hours(36)))
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_unexpired() {
        let db = MemoryDb::new();
        let now = Utc::now();

        let mut expired = entry("old", "alice", now - Duration::days(40));
        expired.expires_at = Some(now - Duration::seconds(1));
        let mut live = entry("new", "alice", now);
        live.expires_at = Some(now + Duration::days(30));
        let no_expiry = entry("none", "alice", now);

        for e in [&expired, &live, &no_expiry] {
            db.put_entry(e).await.unwrap();
        }

        assert_eq!(db.purge_expired(now).await.unwrap(), 1);
        assert!(db.get_entry("old").await.unwrap().is_none());
        assert!(db.get_entry("new").await.unwrap().is_some());
        assert!(db.get_entry("none").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_touch_last_active_only_changes_timestamp() {
        let db = MemoryDb::new();
        let created = Utc::now() - Duration::days(3);
        let user = User::new("auth0|t", ANONYMOUS_EMAIL, Some("Taylor"), created);
        db.upsert_user(&user).await.unwrap();

        let now = Utc::now();
        db.touch_last_active("auth0|t", now).await.unwrap();

        let stored = db.get_user("auth0|t").await.unwrap().unwrap();
        assert_eq!(stored.last_active, now);
        assert_eq!(stored.updated_at, created);
        assert_eq!(stored.display_name, "Taylor");
    }

    #[tokio::test]
    async fn test_update_user_writes_named_fields_only() {
        let db = MemoryDb::new();
        let now = Utc::now();
        let user = User::new("auth0|u", "digest", Some("Robin"), now);
        db.upsert_user(&user).await.unwrap();

        let stored = db
            .update_user(
                "auth0|u",
                &UserUpdate {
                    display_name: Some("Rob".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(stored.display_name, "Rob");
        assert_eq!(stored.email, "digest");
        assert_eq!(stored, db.get_user("auth0|u").await.unwrap().unwrap());

        let err = db
            .update_user("auth0|nobody", &UserUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_update_user_refuses_deleted_account() {
        let db = MemoryDb::new();
        let mut user = User::new("auth0|d", "anonymized", None, Utc::now());
        user.account_status = crate::models::AccountStatus::Deleted;
        db.upsert_user(&user).await.unwrap();

        let err = db
            .update_user(
                "auth0|d",
                &UserUpdate {
                    display_name: Some("Back again".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "account_inactive");
        assert_eq!(db.get_user("auth0|d").await.unwrap().unwrap(), user);
    }

    #[tokio::test]
    async fn test_cohort_samples_only_shared_entries() {
        let db = MemoryDb::new();
        let now = Utc::now();
        let mut shared = entry("s", "alice", now);
        shared.privacy.anonymous_sharing = true;
        shared.entry.context.stress_level = Some(6);
        db.put_entry(&shared).await.unwrap();
        db.put_entry(&entry("p", "bob", now)).await.unwrap();

        let samples = db
            .cohort_samples(now - Duration::days(1))
            .await
            .unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].stress_level, Some(6));
    }
}
