// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Retention scheduler: stamps each new entry with its purge deadline.

use crate::db::Store;
use chrono::{DateTime, Duration, Utc};

/// Purge deadline for an entry created at `created_at`.
pub fn expiry_for(created_at: DateTime<Utc>, retention_days: u32) -> DateTime<Utc> {
    created_at + Duration::days(i64::from(retention_days))
}

/// Compute the expiry for a new entry from the owner's current retention
/// setting. A failed or empty owner lookup is logged and yields `None`; the
/// entry is still saved.
pub async fn schedule(
    db: &dyn Store,
    owner: &str,
    created_at: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match db.get_user(owner).await {
        Ok(Some(user)) => Some(expiry_for(
            created_at,
            user.privacy_settings.data_retention_days,
        )),
        Ok(None) => {
            tracing::warn!(user_id = %owner, "Owner not found, entry saved without expiry");
            None
        }
        Err(e) => {
            tracing::warn!(
                user_id = %owner,
                error = %e,
                "Owner lookup failed, entry saved without expiry"
            );
            None
        }
    }
}
