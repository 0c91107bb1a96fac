// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Display name used when the identity provider supplies none.
pub const DEFAULT_DISPLAY_NAME: &str = "Anonymous User";
/// Stored in place of an email when the identity provider supplies none.
pub const ANONYMOUS_EMAIL: &str = "anonymous@privacy.local";
/// Stored in place of the email once an account is anonymized.
pub const ANONYMIZED_EMAIL: &str = "anonymized@privacy.local";

pub const MIN_RETENTION_DAYS: u32 = 30;
pub const MAX_RETENTION_DAYS: u32 = 1095;
pub const DEFAULT_RETENTION_DAYS: u32 = 365;

/// Per-user privacy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettings {
    /// Days a journal entry is kept before automatic purge (30..=1095)
    pub data_retention_days: u32,
    /// Whether personal analytics may be computed
    pub analytics_opt_in: bool,
    /// Whether the user agreed to contribute to anonymized cohort data
    pub share_anonymized_data: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            data_retention_days: DEFAULT_RETENTION_DAYS,
            analytics_opt_in: false,
            share_anonymized_data: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ColorTheme {
    #[default]
    Calming,
    Energizing,
    Balanced,
    Custom,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ReminderFrequency {
    #[default]
    Daily,
    Weekly,
    Custom,
    None,
}

/// UI and reminder preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub color_theme: ColorTheme,
    pub reminder_frequency: ReminderFrequency,
    pub journal_prompts: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            color_theme: ColorTheme::default(),
            reminder_frequency: ReminderFrequency::default(),
            journal_prompts: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
    Deleted,
}

/// User profile stored in Firestore.
///
/// Keyed by the identity provider's subject id. Email is never stored in
/// clear: it holds a keyed digest or one of the sentinel addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identity provider subject (unique)
    pub auth_subject: String,
    pub email: String,
    pub display_name: String,
    pub privacy_settings: PrivacySettings,
    #[serde(default)]
    pub preferences: Preferences,
    /// Policy text version the user accepted
    #[serde(default)]
    pub consent_version: Option<String>,
    /// When consent was last given
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub consent_date: Option<DateTime<Utc>>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub last_active: DateTime<Utc>,
    #[serde(default)]
    pub account_status: AccountStatus,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A freshly authenticated user with default settings and no consent.
    pub fn new(
        auth_subject: impl Into<String>,
        email: impl Into<String>,
        display_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| name.chars().take(MAX_DISPLAY_NAME_CHARS).collect())
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

        Self {
            auth_subject: auth_subject.into(),
            email: email.into(),
            display_name,
            privacy_settings: PrivacySettings::default(),
            preferences: Preferences::default(),
            consent_version: None,
            consent_date: None,
            last_active: now,
            account_status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.account_status == AccountStatus::Active
    }
}

/// Upper bound on display name length (characters).
pub const MAX_DISPLAY_NAME_CHARS: usize = 50;

/// Partial privacy update: only provided fields change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_retention_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics_opt_in: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_anonymized_data: Option<bool>,
}

impl PrivacyUpdate {
    /// Every field set, as consent recording overwrites all three.
    pub fn overwrite(settings: PrivacySettings) -> Self {
        Self {
            data_retention_days: Some(settings.data_retention_days),
            analytics_opt_in: Some(settings.analytics_opt_in),
            share_anonymized_data: Some(settings.share_anonymized_data),
        }
    }

    pub fn apply(&self, settings: &mut PrivacySettings) {
        if let Some(days) = self.data_retention_days {
            settings.data_retention_days = days;
        }
        if let Some(opt_in) = self.analytics_opt_in {
            settings.analytics_opt_in = opt_in;
        }
        if let Some(share) = self.share_anonymized_data {
            settings.share_anonymized_data = share;
        }
    }

    pub fn changes_retention(&self) -> bool {
        self.data_retention_days.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn field_paths(&self, paths: &mut Vec<&'static str>) {
        if self.data_retention_days.is_some() {
            paths.push("privacySettings.dataRetentionDays");
        }
        if self.analytics_opt_in.is_some() {
            paths.push("privacySettings.analyticsOptIn");
        }
        if self.share_anonymized_data.is_some() {
            paths.push("privacySettings.shareAnonymizedData");
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_theme: Option<ColorTheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_frequency: Option<ReminderFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_prompts: Option<bool>,
}

impl PreferencesUpdate {
    pub fn apply(&self, preferences: &mut Preferences) {
        if let Some(theme) = self.color_theme {
            preferences.color_theme = theme;
        }
        if let Some(frequency) = self.reminder_frequency {
            preferences.reminder_frequency = frequency;
        }
        if let Some(prompts) = self.journal_prompts {
            preferences.journal_prompts = prompts;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn field_paths(&self, paths: &mut Vec<&'static str>) {
        if self.color_theme.is_some() {
            paths.push("preferences.colorTheme");
        }
        if self.reminder_frequency.is_some() {
            paths.push("preferences.reminderFrequency");
        }
        if self.journal_prompts.is_some() {
            paths.push("preferences.journalPrompts");
        }
    }
}

/// Field-level change to a stored user.
///
/// Only the fields that are set are written, so a change made from a stale
/// copy of the user cannot revert anything it does not name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_status: Option<AccountStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_version: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "firestore::serialize_as_optional_timestamp"
    )]
    pub consent_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "PrivacyUpdate::is_empty")]
    pub privacy_settings: PrivacyUpdate,
    #[serde(default, skip_serializing_if = "PreferencesUpdate::is_empty")]
    pub preferences: PreferencesUpdate,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "firestore::serialize_as_optional_timestamp"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserUpdate {
    /// Document paths this update writes, for a Firestore update mask.
    pub fn field_paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::new();
        if self.email.is_some() {
            paths.push("email");
        }
        if self.display_name.is_some() {
            paths.push("displayName");
        }
        if self.account_status.is_some() {
            paths.push("accountStatus");
        }
        if self.consent_version.is_some() {
            paths.push("consentVersion");
        }
        if self.consent_date.is_some() {
            paths.push("consentDate");
        }
        self.privacy_settings.field_paths(&mut paths);
        self.preferences.field_paths(&mut paths);
        if self.updated_at.is_some() {
            paths.push("updatedAt");
        }
        paths
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(name) = &self.display_name {
            user.display_name = name.clone();
        }
        if let Some(status) = self.account_status {
            user.account_status = status;
        }
        if let Some(version) = &self.consent_version {
            user.consent_version = Some(version.clone());
        }
        if let Some(date) = self.consent_date {
            user.consent_date = Some(date);
        }
        self.privacy_settings.apply(&mut user.privacy_settings);
        self.preferences.apply(&mut user.preferences);
        if let Some(at) = self.updated_at {
            user.updated_at = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults() {
        let now = Utc::now();
        let user = User::new("auth0|abc", ANONYMOUS_EMAIL, None, now);

        assert_eq!(user.display_name, DEFAULT_DISPLAY_NAME);
        assert_eq!(user.privacy_settings, PrivacySettings::default());
        assert_eq!(user.privacy_settings.data_retention_days, 365);
        assert!(user.preferences.journal_prompts);
        assert!(user.consent_date.is_none());
        assert!(user.is_active());
    }

    #[test]
    fn test_new_user_truncates_long_display_name() {
        let long_name = "x".repeat(80);
        let user = User::new("auth0|abc", ANONYMOUS_EMAIL, Some(&long_name), Utc::now());
        assert_eq!(user.display_name.chars().count(), MAX_DISPLAY_NAME_CHARS);
    }

    #[test]
    fn test_blank_display_name_falls_back() {
        let user = User::new("auth0|abc", ANONYMOUS_EMAIL, Some("   "), Utc::now());
        assert_eq!(user.display_name, DEFAULT_DISPLAY_NAME);
    }

    #[test]
    fn test_user_update_masks_only_set_fields() {
        let update = UserUpdate {
            privacy_settings: PrivacyUpdate {
                analytics_opt_in: Some(true),
                ..Default::default()
            },
            preferences: PreferencesUpdate {
                journal_prompts: Some(false),
                ..Default::default()
            },
            updated_at: Some(Utc::now()),
            ..Default::default()
        };

        assert_eq!(
            update.field_paths(),
            vec![
                "privacySettings.analyticsOptIn",
                "preferences.journalPrompts",
                "updatedAt"
            ]
        );
        assert!(!update.field_paths().contains(&"accountStatus"));
    }

    #[test]
    fn test_user_update_leaves_unnamed_fields() {
        let now = Utc::now();
        let mut user = User::new("auth0|abc", "digest", Some("Riley"), now);
        user.account_status = AccountStatus::Deleted;

        UserUpdate {
            preferences: PreferencesUpdate {
                color_theme: Some(ColorTheme::Balanced),
                ..Default::default()
            },
            ..Default::default()
        }
        .apply(&mut user);

        assert_eq!(user.preferences.color_theme, ColorTheme::Balanced);
        assert_eq!(user.account_status, AccountStatus::Deleted);
        assert_eq!(user.email, "digest");
        assert_eq!(user.updated_at, now);
    }
}
