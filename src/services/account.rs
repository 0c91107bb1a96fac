// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account commands: user resolution, consent, settings, export and
//! anonymization.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::user::{PreferencesUpdate, PrivacyUpdate, ANONYMOUS_EMAIL};
use crate::models::{Preferences, PrivacySettings, User, UserUpdate};
use crate::policy::anonymize::anonymize_user;
use crate::policy::{consent, Consented};
use crate::services::identity::VerifiedIdentity;
use crate::services::journal::EntryView;
use crate::time_utils::format_utc_rfc3339;
use crate::validation::schema::{ConsentRecord, ProfileUpdate};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const EXPORT_VERSION: &str = "1.0";

/// Consent state returned after recording consent.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ConsentView {
    pub consent_version: Option<String>,
    pub consent_date: Option<String>,
    pub privacy_settings: PrivacySettings,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesView {
    pub preferences: Preferences,
    pub privacy_settings: PrivacySettings,
}

/// Profile as shown to its owner. Never carries the email or subject id.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub display_name: String,
    pub preferences: Preferences,
    pub privacy_settings: PrivacySettings,
    pub consent_version: Option<String>,
    pub consent_date: Option<String>,
    pub last_active: String,
}

impl From<&User> for ProfileView {
    fn from(user: &User) -> Self {
        Self {
            display_name: user.display_name.clone(),
            preferences: user.preferences,
            privacy_settings: user.privacy_settings,
            consent_version: user.consent_version.clone(),
            consent_date: user.consent_date.map(format_utc_rfc3339),
            last_active: format_utc_rfc3339(user.last_active),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProfile {
    pub display_name: String,
    pub preferences: Preferences,
    pub privacy_settings: PrivacySettings,
    pub consent_version: Option<String>,
    pub consent_date: Option<String>,
    pub account_created: String,
}

/// Everything stored about a user, in portable form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataExport {
    pub profile: ExportProfile,
    pub journal_entries: Vec<EntryView>,
    pub export_date: String,
    pub export_version: &'static str,
}

pub struct AccountService {
    db: Arc<dyn Store>,
    email_hash_key: Vec<u8>,
}

impl AccountService {
    pub fn new(db: Arc<dyn Store>, email_hash_key: Vec<u8>) -> Self {
        Self { db, email_hash_key }
    }

    /// Keyed digest of a normalized email, or the anonymous sentinel when
    /// the identity provider supplied none.
    pub fn hash_email(&self, email: Option<&str>) -> Result<String> {
        let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
            return Ok(ANONYMOUS_EMAIL.to_string());
        };

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.email_hash_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid email hash key: {e}")))?;
        mac.update(email.to_lowercase().as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Find the user for a verified identity, creating it on first sight.
    ///
    /// New users get default settings and no consent. Inactive accounts are
    /// rejected. The `lastActive` touch is best effort.
    pub async fn resolve_user(&self, identity: &VerifiedIdentity) -> Result<User> {
        let now = Utc::now();

        let mut user = match self.db.get_user(&identity.subject).await? {
            Some(user) => user,
            None => {
                let email = self.hash_email(identity.email.as_deref())?;
                let user = User::new(&identity.subject, email, identity.name.as_deref(), now);
                self.db.upsert_user(&user).await?;
                tracing::info!(user_id = %user.auth_subject, "Created user on first sign-in");
                user
            }
        };

        if !user.is_active() {
            tracing::info!(
                user_id = %user.auth_subject,
                status = ?user.account_status,
                "Rejected inactive account"
            );
            return Err(AppError::AccountInactive);
        }

        match self.db.touch_last_active(&user.auth_subject, now).await {
            Ok(()) => user.last_active = now,
            Err(e) => {
                tracing::warn!(user_id = %user.auth_subject, error = %e, "Failed to update lastActive")
            }
        }

        Ok(user)
    }

    /// Record consent. The only path from a denied to an authorized user.
    pub async fn record_consent(&self, user: &User, record: &ConsentRecord) -> Result<ConsentView> {
        let user = self
            .db
            .update_user(&user.auth_subject, &consent::record(record, Utc::now()))
            .await?;

        tracing::info!(
            user_id = %user.auth_subject,
            consent_version = %record.consent_version,
            analytics_opt_in = record.settings.analytics_opt_in,
            share_anonymized_data = record.settings.share_anonymized_data,
            retention_days = record.settings.data_retention_days,
            "Consent recorded"
        );

        Ok(ConsentView {
            consent_version: user.consent_version,
            consent_date: user.consent_date.map(format_utc_rfc3339),
            privacy_settings: user.privacy_settings,
        })
    }

    pub fn privacy(&self, who: Consented<'_>) -> PrivacySettings {
        who.user().privacy_settings
    }

    /// Apply a partial privacy update. Existing entries keep their expiry.
    pub async fn update_privacy(
        &self,
        who: Consented<'_>,
        update: &PrivacyUpdate,
    ) -> Result<PrivacySettings> {
        let user = self
            .db
            .update_user(
                who.subject(),
                &UserUpdate {
                    privacy_settings: *update,
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        if update.changes_retention() {
            tracing::info!(
                user_id = %user.auth_subject,
                retention_days = user.privacy_settings.data_retention_days,
                "Retention changed; applies to new entries only"
            );
        }
        Ok(user.privacy_settings)
    }

    pub fn preferences(&self, who: Consented<'_>) -> PreferencesView {
        let user = who.user();
        PreferencesView {
            preferences: user.preferences,
            privacy_settings: user.privacy_settings,
        }
    }

    pub async fn update_preferences(
        &self,
        who: Consented<'_>,
        update: &PreferencesUpdate,
    ) -> Result<Preferences> {
        let user = self
            .db
            .update_user(
                who.subject(),
                &UserUpdate {
                    preferences: *update,
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        tracing::debug!(user_id = %user.auth_subject, "Preferences updated");
        Ok(user.preferences)
    }

    pub fn profile(&self, who: Consented<'_>) -> ProfileView {
        ProfileView::from(who.user())
    }

    pub async fn update_profile(
        &self,
        who: Consented<'_>,
        update: &ProfileUpdate,
    ) -> Result<ProfileView> {
        let user = self
            .db
            .update_user(
                who.subject(),
                &UserUpdate {
                    display_name: update.display_name.clone(),
                    preferences: update.preferences,
                    updated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        tracing::debug!(user_id = %user.auth_subject, "Profile updated");
        Ok(ProfileView::from(&user))
    }

    /// Export the profile and every journal entry the user still has.
    pub async fn export(&self, who: Consented<'_>) -> Result<DataExport> {
        let user = who.user();
        let entries = self.db.entries_since(who.subject(), None).await?;
        tracing::info!(user_id = %user.auth_subject, count = entries.len(), "Personal data exported");

        Ok(DataExport {
            profile: ExportProfile {
                display_name: user.display_name.clone(),
                preferences: user.preferences,
                privacy_settings: user.privacy_settings,
                consent_version: user.consent_version.clone(),
                consent_date: user.consent_date.map(format_utc_rfc3339),
                account_created: format_utc_rfc3339(user.created_at),
            },
            journal_entries: entries.into_iter().map(EntryView::from).collect(),
            export_date: format_utc_rfc3339(Utc::now()),
            export_version: EXPORT_VERSION,
        })
    }

    /// Soft-delete the account. Journal entries are left to their own expiry.
    pub async fn anonymize_account(&self, who: Consented<'_>) -> Result<()> {
        self.db
            .update_user(who.subject(), &anonymize_user(Utc::now()))
            .await?;
        tracing::info!(user_id = %who.subject(), "Account anonymized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;
    use crate::models::AccountStatus;

    fn service() -> (AccountService, Arc<MemoryDb>) {
        let db = Arc::new(MemoryDb::new());
        (AccountService::new(db.clone(), b"test-key".to_vec()), db)
    }

    fn identity(subject: &str) -> VerifiedIdentity {
        VerifiedIdentity {
            subject: subject.to_string(),
            email: Some("Student@Example.edu".to_string()),
            name: Some("Sam".to_string()),
        }
    }

    #[test]
    fn test_hash_email_normalizes_and_hides_address() {
        let (service, _) = service();
        let a = service.hash_email(Some(" Student@Example.edu ")).unwrap();
        let b = service.hash_email(Some("student@example.edu")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(!a.contains("example"));
        assert_eq!(service.hash_email(None).unwrap(), ANONYMOUS_EMAIL);
        assert_eq!(service.hash_email(Some("  ")).unwrap(), ANONYMOUS_EMAIL);
    }

    #[tokio::test]
    async fn test_resolve_user_creates_without_consent() {
        let (service, db) = service();
        let user = service.resolve_user(&identity("auth0|new")).await.unwrap();

        assert_eq!(user.display_name, "Sam");
        assert!(user.consent_date.is_none());
        assert_ne!(user.email, "Student@Example.edu");
        assert!(db.get_user("auth0|new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_resolve_user_rejects_deleted_account() {
        let (service, db) = service();
        let mut user = User::new("auth0|gone", ANONYMOUS_EMAIL, None, Utc::now());
        user.account_status = AccountStatus::Deleted;
        db.upsert_user(&user).await.unwrap();

        let err = service.resolve_user(&identity("auth0|gone")).await.unwrap_err();
        assert_eq!(err.kind(), "account_inactive");
    }

    fn consented(subject: &str) -> User {
        let now = Utc::now();
        let mut user = User::new(subject, "digest", Some("Sam"), now);
        user.consent_version = Some("1.0".to_string());
        user.consent_date = Some(now);
        user
    }

    #[tokio::test]
    async fn test_stale_settings_write_cannot_undo_anonymization() {
        let (service, db) = service();
        let stale = consented("auth0|racing");
        db.upsert_user(&stale).await.unwrap();

        let fresh = db.get_user("auth0|racing").await.unwrap().unwrap();
        service
            .anonymize_account(consent::authorize(&fresh, Utc::now()).unwrap())
            .await
            .unwrap();

        // Requests that authenticated before the deletion must not write.
        let who = consent::authorize(&stale, Utc::now()).unwrap();
        let prefs = service
            .update_preferences(
                who,
                &PreferencesUpdate {
                    journal_prompts: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        let privacy = service
            .update_privacy(
                who,
                &PrivacyUpdate {
                    analytics_opt_in: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        let profile = service
            .update_profile(
                who,
                &ProfileUpdate {
                    display_name: Some("Sam Again".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        for err in [prefs, privacy, profile] {
            assert_eq!(err.kind(), "account_inactive");
        }

        let stored = db.get_user("auth0|racing").await.unwrap().unwrap();
        assert_eq!(stored.account_status, AccountStatus::Deleted);
        assert_eq!(stored.email, crate::models::user::ANONYMIZED_EMAIL);
        assert_eq!(stored.display_name, crate::models::user::DEFAULT_DISPLAY_NAME);
        assert!(stored.preferences.journal_prompts);
        assert!(!stored.privacy_settings.analytics_opt_in);
    }

    #[tokio::test]
    async fn test_privacy_update_keeps_concurrent_changes() {
        let (service, db) = service();
        let stale = consented("auth0|two-tabs");
        db.upsert_user(&stale).await.unwrap();
        let who = consent::authorize(&stale, Utc::now()).unwrap();

        service
            .update_privacy(
                who,
                &PrivacyUpdate {
                    data_retention_days: Some(90),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let settings = service
            .update_privacy(
                who,
                &PrivacyUpdate {
                    share_anonymized_data: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(settings.data_retention_days, 90);
        assert!(settings.share_anonymized_data);
    }
}
