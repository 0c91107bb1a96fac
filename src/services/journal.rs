// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal entry commands.
//!
//! Every operation takes a [`Consented`] proof; entries are only ever
//! looked up inside the caller's own scope.

use crate::db::{DateRange, Store};
use crate::error::{AppError, Result};
use crate::models::{EntryAnalytics, EntryBody, EntryPrivacy, JournalEntry, MoodStats};
use crate::policy::aggregation::{self, Window};
use crate::policy::anonymize::anonymize_entry;
use crate::policy::{require_analytics_opt_in, retention, Consented};
use crate::services::relay::{MoodRelay, RelayEvent, ANONYMOUS_CHANNEL};
use crate::time_utils::format_utc_rfc3339;
use crate::validation::schema::{EntryUpdate, ListParams, NewEntry};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// An entry as returned to its owner. The analytics block is never included.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    pub id: String,
    pub entry: EntryBody,
    pub privacy: EntryPrivacy,
    pub expires_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<JournalEntry> for EntryView {
    fn from(entry: JournalEntry) -> Self {
        Self {
            id: entry.id,
            entry: entry.entry,
            privacy: entry.privacy,
            expires_at: entry.expires_at.map(format_utc_rfc3339),
            created_at: format_utc_rfc3339(entry.created_at),
            updated_at: format_utc_rfc3339(entry.updated_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub pages: u64,
}

impl Pagination {
    fn new(params: &ListParams, total: u64) -> Self {
        let limit = u64::from(params.limit.max(1));
        Self {
            page: params.page,
            limit: params.limit,
            total,
            pages: total.div_ceil(limit),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryPage {
    pub entries: Vec<EntryView>,
    pub pagination: Pagination,
}

pub struct JournalService {
    db: Arc<dyn Store>,
    relay: Arc<dyn MoodRelay>,
}

impl JournalService {
    pub fn new(db: Arc<dyn Store>, relay: Arc<dyn MoodRelay>) -> Self {
        Self { db, relay }
    }

    /// Save a new entry, stamped with its retention expiry.
    ///
    /// A cohort-visible mood event is published only after the save commits,
    /// and a relay failure is logged without failing the save.
    pub async fn create(&self, who: Consented<'_>, input: NewEntry) -> Result<JournalEntry> {
        let now = Utc::now();
        let owner = who.subject();
        let expires_at = retention::schedule(self.db.as_ref(), owner, now).await;

        let entry = JournalEntry {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: owner.to_string(),
            entry: EntryBody {
                content: input.content,
                mood: input.mood,
                prompts: input.prompts,
                context: input.context,
            },
            privacy: EntryPrivacy {
                is_private: true,
                share_with_counselor: input.share_with_counselor,
                anonymous_sharing: input.anonymous_sharing,
            },
            analytics: EntryAnalytics::default(),
            expires_at,
            created_at: now,
            updated_at: now,
        };

        self.db.put_entry(&entry).await?;
        tracing::info!(
            user_id = %owner,
            entry_id = %entry.id,
            has_expiry = expires_at.is_some(),
            "Journal entry created"
        );

        if entry.privacy.anonymous_sharing {
            let event = RelayEvent::AnonymousJournalUpdate {
                mood: entry.entry.mood.scale,
                timestamp: entry.created_at,
                location: entry.entry.context.location,
            };
            if let Err(e) = self.relay.publish(ANONYMOUS_CHANNEL, event) {
                tracing::warn!(entry_id = %entry.id, error = %e, "Anonymous mood broadcast failed");
            }
        }

        Ok(entry)
    }

    pub async fn list(&self, who: Consented<'_>, params: ListParams) -> Result<EntryPage> {
        let range = DateRange {
            start: params.start,
            end: params.end,
        };
        let owner = who.subject();
        let entries = self
            .db
            .list_entries(owner, range, params.limit, params.offset())
            .await?;
        let total = self.db.count_entries(owner, range).await?;

        Ok(EntryPage {
            entries: entries.into_iter().map(EntryView::from).collect(),
            pagination: Pagination::new(&params, total),
        })
    }

    pub async fn get(&self, who: Consented<'_>, id: &str) -> Result<JournalEntry> {
        self.owned_entry(who, id).await
    }

    pub async fn update(
        &self,
        who: Consented<'_>,
        id: &str,
        update: EntryUpdate,
    ) -> Result<JournalEntry> {
        let mut entry = self.owned_entry(who, id).await?;
        update.apply(&mut entry);
        entry.analytics.edit_count = entry.analytics.edit_count.saturating_add(1);
        entry.updated_at = Utc::now();

        self.db.put_entry(&entry).await?;
        tracing::info!(
            user_id = %who.subject(),
            entry_id = %entry.id,
            edit_count = entry.analytics.edit_count,
            "Journal entry updated"
        );
        Ok(entry)
    }

    pub async fn delete(&self, who: Consented<'_>, id: &str) -> Result<()> {
        let entry = self.owned_entry(who, id).await?;
        self.db.delete_entry(&entry.id).await?;
        tracing::info!(user_id = %who.subject(), entry_id = %entry.id, "Journal entry deleted");
        Ok(())
    }

    /// Scrub an entry in place. Repeating the call writes nothing.
    pub async fn anonymize(&self, who: Consented<'_>, id: &str) -> Result<JournalEntry> {
        let mut entry = self.owned_entry(who, id).await?;
        if anonymize_entry(&mut entry, Utc::now()) {
            self.db.put_entry(&entry).await?;
            tracing::info!(user_id = %who.subject(), entry_id = %entry.id, "Journal entry anonymized");
        } else {
            tracing::debug!(entry_id = %entry.id, "Journal entry already anonymized");
        }
        Ok(entry)
    }

    /// Personal mood summary. Needs the analytics opt-in like every other
    /// personal analytics view.
    pub async fn mood_stats(&self, who: Consented<'_>, window: Window) -> Result<MoodStats> {
        require_analytics_opt_in(who)?;
        let since = window.start(Utc::now());
        let entries = self.db.entries_since(who.subject(), Some(since)).await?;
        Ok(aggregation::mood_stats(&entries))
    }

    /// Look up an entry inside the caller's scope. Entries owned by someone
    /// else are indistinguishable from missing ones.
    async fn owned_entry(&self, who: Consented<'_>, id: &str) -> Result<JournalEntry> {
        self.db
            .get_entry(id)
            .await?
            .filter(|entry| entry.is_owned_by(who.subject()))
            .ok_or_else(|| AppError::NotFound("Journal entry not found".to_string()))
    }
}
