// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Irreversible in-place scrubbing of accounts and entries.

use crate::models::journal::ANONYMIZED_CONTENT;
use crate::models::user::{ANONYMIZED_EMAIL, DEFAULT_DISPLAY_NAME};
use crate::models::{AccountStatus, JournalEntry, UserUpdate};
use chrono::{DateTime, Utc};

/// The write that scrubs identifying fields and marks the account deleted.
/// Owned entries are left alone; they expire on their own schedule.
pub fn anonymize_user(now: DateTime<Utc>) -> UserUpdate {
    UserUpdate {
        email: Some(ANONYMIZED_EMAIL.to_string()),
        display_name: Some(DEFAULT_DISPLAY_NAME.to_string()),
        account_status: Some(AccountStatus::Deleted),
        updated_at: Some(now),
        ..Default::default()
    }
}

/// Replace the content and close the sharing flags. Returns `false` when the
/// entry was already anonymized, in which case nothing changes.
pub fn anonymize_entry(entry: &mut JournalEntry, now: DateTime<Utc>) -> bool {
    if entry.is_anonymized() {
        return false;
    }
    entry.entry.content = ANONYMIZED_CONTENT.to_string();
    entry.privacy.is_private = true;
    entry.privacy.share_with_counselor = false;
    entry.updated_at = now;
    true
}
