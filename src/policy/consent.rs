// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Consent gate and consent recorder.
//!
//! Data-bearing operations take a [`Consented`] proof, which can only be
//! obtained from [`authorize`]. A handler that skips the gate does not
//! compile.

use crate::error::AppError;
use crate::models::user::PrivacyUpdate;
use crate::models::{User, UserUpdate};
use crate::validation::schema::ConsentRecord;
use chrono::{DateTime, Duration, Utc};

/// How long a recorded consent stays valid.
pub const CONSENT_VALIDITY_DAYS: i64 = 365;

/// Why the gate refused a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConsentDenial {
    #[error("Privacy consent required")]
    Missing,
    #[error("Privacy consent expired")]
    Expired,
}

/// Proof that `user` passed the consent gate.
#[derive(Debug, Clone, Copy)]
pub struct Consented<'a> {
    user: &'a User,
}

impl<'a> Consented<'a> {
    pub fn user(&self) -> &'a User {
        self.user
    }

    /// The owner key for this user's data.
    pub fn subject(&self) -> &'a str {
        &self.user.auth_subject
    }
}

/// Evaluate the gate without side effects.
pub fn check(user: &User, now: DateTime<Utc>) -> Result<(), ConsentDenial> {
    let Some(consent_date) = user.consent_date else {
        return Err(ConsentDenial::Missing);
    };
    if now - consent_date > Duration::days(CONSENT_VALIDITY_DAYS) {
        return Err(ConsentDenial::Expired);
    }
    Ok(())
}

/// Run the gate, yielding the proof data-bearing operations require.
pub fn authorize(user: &User, now: DateTime<Utc>) -> Result<Consented<'_>, AppError> {
    check(user, now).map_err(|denial| {
        tracing::debug!(user_id = %user.auth_subject, reason = %denial, "Consent gate denied");
        AppError::ConsentRequired(denial)
    })?;
    Ok(Consented { user })
}

/// Personal analytics additionally need the user's analytics opt-in.
pub fn require_analytics_opt_in(who: Consented<'_>) -> Result<(), AppError> {
    if who.user().privacy_settings.analytics_opt_in {
        Ok(())
    } else {
        Err(AppError::AnalyticsNotEnabled)
    }
}

/// The write that records a consent submission. Overwrites the version,
/// resets the date and replaces all three privacy settings.
pub fn record(consent: &ConsentRecord, now: DateTime<Utc>) -> UserUpdate {
    UserUpdate {
        consent_version: Some(consent.consent_version.clone()),
        consent_date: Some(now),
        privacy_settings: PrivacyUpdate::overwrite(consent.settings),
        updated_at: Some(now),
        ..Default::default()
    }
}
