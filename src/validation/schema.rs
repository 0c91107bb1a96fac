// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request schemas and the typed commands they validate into.

use super::{Checked, FieldErrors, Schema};
use crate::error::AppError;
use crate::models::journal::MAX_CONTENT_CHARS;
use crate::models::user::{
    ColorTheme, PreferencesUpdate, PrivacyUpdate, ReminderFrequency, MAX_DISPLAY_NAME_CHARS,
    MAX_RETENTION_DAYS, MIN_RETENTION_DAYS,
};
use crate::models::{
    EntryContext, JournalEntry, Location, Mood, MoodColor, MoodTag, PrivacySettings, Prompts,
    TimeOfDay,
};
use crate::policy::aggregation::{Window, MAX_WINDOW_DAYS, MIN_WINDOW_DAYS};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

const MAX_CONSENT_VERSION_CHARS: u64 = 50;
const MAX_COLOR_CHARS: u64 = 32;
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 50;

// ─── Consent ─────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsentForm {
    consent_version: Checked<String>,
    analytics_opt_in: Checked<bool>,
    share_anonymized_data: Checked<bool>,
    #[serde(alias = "dataRetention")]
    data_retention_days: Checked<u32>,
}

/// A complete consent submission. All three settings overwrite the stored ones.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsentRecord {
    pub consent_version: String,
    pub settings: PrivacySettings,
}

impl Schema for ConsentForm {
    type Output = ConsentRecord;

    fn validate(self) -> Result<ConsentRecord, AppError> {
        let mut errors = FieldErrors::default();

        let version = errors
            .required(
                "consentVersion",
                self.consent_version,
                "Consent version is required",
            )
            .map(|v| v.trim().to_string());
        let version =
            errors.with_length("consentVersion", version, 1, MAX_CONSENT_VERSION_CHARS);
        let analytics_opt_in = errors.required(
            "analyticsOptIn",
            self.analytics_opt_in,
            "Analytics opt-in must be boolean",
        );
        let share_anonymized_data = errors.required(
            "shareAnonymizedData",
            self.share_anonymized_data,
            "Data sharing opt-in must be boolean",
        );
        let days = errors.required(
            "dataRetentionDays",
            self.data_retention_days,
            "Data retention must be an integer between 30 and 1095 days",
        );
        let days = errors.in_range(
            "dataRetentionDays",
            days,
            MIN_RETENTION_DAYS,
            MAX_RETENTION_DAYS,
        );

        errors.finish(|| ConsentRecord {
            consent_version: version.unwrap_or_default(),
            settings: PrivacySettings {
                data_retention_days: days.unwrap_or_default(),
                analytics_opt_in: analytics_opt_in.unwrap_or_default(),
                share_anonymized_data: share_anonymized_data.unwrap_or_default(),
            },
        })
    }
}

// ─── Privacy settings ────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrivacySettingsPatch {
    #[serde(alias = "dataRetention")]
    data_retention_days: Checked<u32>,
    analytics_opt_in: Checked<bool>,
    share_anonymized_data: Checked<bool>,
}

impl Schema for PrivacySettingsPatch {
    type Output = PrivacyUpdate;

    fn validate(self) -> Result<PrivacyUpdate, AppError> {
        let mut errors = FieldErrors::default();

        let days = errors.optional(
            "dataRetentionDays",
            self.data_retention_days,
            "Data retention must be an integer between 30 and 1095 days",
        );
        let data_retention_days = errors.in_range(
            "dataRetentionDays",
            days,
            MIN_RETENTION_DAYS,
            MAX_RETENTION_DAYS,
        );
        let analytics_opt_in = errors.optional(
            "analyticsOptIn",
            self.analytics_opt_in,
            "Analytics opt-in must be boolean",
        );
        let share_anonymized_data = errors.optional(
            "shareAnonymizedData",
            self.share_anonymized_data,
            "Data sharing opt-in must be boolean",
        );

        errors.finish(|| PrivacyUpdate {
            data_retention_days,
            analytics_opt_in,
            share_anonymized_data,
        })
    }
}

// ─── Preferences and profile ─────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreferencesPatch {
    color_theme: Checked<ColorTheme>,
    reminder_frequency: Checked<ReminderFrequency>,
    journal_prompts: Checked<bool>,
}

impl PreferencesPatch {
    fn check(self, prefix: &str, errors: &mut FieldErrors) -> PreferencesUpdate {
        PreferencesUpdate {
            color_theme: errors.optional(
                &format!("{prefix}colorTheme"),
                self.color_theme,
                "must be one of calming, energizing, balanced, custom",
            ),
            reminder_frequency: errors.optional(
                &format!("{prefix}reminderFrequency"),
                self.reminder_frequency,
                "must be one of daily, weekly, custom, none",
            ),
            journal_prompts: errors.optional(
                &format!("{prefix}journalPrompts"),
                self.journal_prompts,
                "must be a boolean",
            ),
        }
    }
}

impl Schema for PreferencesPatch {
    type Output = PreferencesUpdate;

    fn validate(self) -> Result<PreferencesUpdate, AppError> {
        let mut errors = FieldErrors::default();
        let update = self.check("", &mut errors);
        errors.finish(|| update)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfilePatch {
    display_name: Checked<String>,
    preferences: Checked<PreferencesPatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// Trimmed; blank names leave the stored name unchanged
    pub display_name: Option<String>,
    pub preferences: PreferencesUpdate,
}

impl Schema for ProfilePatch {
    type Output = ProfileUpdate;

    fn validate(self) -> Result<ProfileUpdate, AppError> {
        let mut errors = FieldErrors::default();

        let name = errors
            .optional(
                "displayName",
                self.display_name,
                "Display name must be a string",
            )
            .map(|n| n.trim().to_string());
        let display_name = errors
            .with_length("displayName", name, 0, MAX_DISPLAY_NAME_CHARS as u64)
            .filter(|n| !n.is_empty());

        let preferences = errors
            .optional("preferences", self.preferences, "must be an object")
            .map(|p| p.check("preferences.", &mut errors))
            .unwrap_or_default();

        errors.finish(|| ProfileUpdate {
            display_name,
            preferences,
        })
    }
}

// ─── Journal entries ─────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ColorInput {
    color: Checked<String>,
    intensity: Checked<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MoodInput {
    scale: Checked<u8>,
    colors: Checked<Vec<ColorInput>>,
    tags: Checked<Vec<MoodTag>>,
}

/// Validated mood fields; `None` means "not provided".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoodFields {
    pub scale: Option<u8>,
    pub colors: Option<Vec<MoodColor>>,
    pub tags: Option<Vec<MoodTag>>,
}

impl MoodInput {
    fn check(self, errors: &mut FieldErrors, require_scale: bool) -> MoodFields {
        const SCALE_MESSAGE: &str = "Mood scale must be an integer between 1 and 10";
        let scale = if require_scale {
            errors.required("mood.scale", self.scale, SCALE_MESSAGE)
        } else {
            errors.optional("mood.scale", self.scale, SCALE_MESSAGE)
        };
        let scale = errors.in_range("mood.scale", scale, 1, 10);

        let colors = errors
            .optional("mood.colors", self.colors, "Mood colors must be an array")
            .map(|colors| check_colors(colors, "mood.colors", errors));

        let tags = errors
            .optional(
                "mood.tags",
                self.tags,
                "Mood tags must be an array of known mood tags",
            )
            .map(dedup_tags);

        MoodFields {
            scale,
            colors,
            tags,
        }
    }
}

fn check_colors(colors: Vec<ColorInput>, prefix: &str, errors: &mut FieldErrors) -> Vec<MoodColor> {
    colors
        .into_iter()
        .enumerate()
        .filter_map(|(i, input)| {
            let field = format!("{prefix}[{i}].color");
            let color = errors
                .required(&field, input.color, "Color is required")
                .map(|c| c.trim().to_string());
            let color = errors.with_length(&field, color, 1, MAX_COLOR_CHARS);

            let field = format!("{prefix}[{i}].intensity");
            let intensity = errors.optional(
                &field,
                input.intensity,
                "Intensity must be an integer between 1 and 5",
            );
            let intensity = errors.in_range(&field, intensity, 1, 5);

            color.map(|color| MoodColor { color, intensity })
        })
        .collect()
}

/// Tags form a set; keep the first occurrence of each.
fn dedup_tags(tags: Vec<MoodTag>) -> Vec<MoodTag> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextInput {
    location: Checked<Location>,
    time_of_day: Checked<TimeOfDay>,
    stress_level: Checked<u8>,
}

impl ContextInput {
    fn check(self, errors: &mut FieldErrors) -> EntryContext {
        let location = errors.optional(
            "context.location",
            self.location,
            "must be one of campus, dorm, library, outdoors, home, other",
        );
        let time_of_day = errors.optional(
            "context.timeOfDay",
            self.time_of_day,
            "must be one of morning, afternoon, evening, night",
        );
        let stress = errors.optional(
            "context.stressLevel",
            self.stress_level,
            "Stress level must be an integer between 1 and 10",
        );
        EntryContext {
            location,
            time_of_day,
            stress_level: errors.in_range("context.stressLevel", stress, 1, 10),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PromptsInput {
    gratitude: Checked<Vec<String>>,
    challenges: Checked<Vec<String>>,
    goals: Checked<Vec<String>>,
    reflections: Checked<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptFields {
    pub gratitude: Option<Vec<String>>,
    pub challenges: Option<Vec<String>>,
    pub goals: Option<Vec<String>>,
    pub reflections: Option<Vec<String>>,
}

impl PromptFields {
    fn merge_into(self, prompts: &mut Prompts) {
        if let Some(v) = self.gratitude {
            prompts.gratitude = v;
        }
        if let Some(v) = self.challenges {
            prompts.challenges = v;
        }
        if let Some(v) = self.goals {
            prompts.goals = v;
        }
        if let Some(v) = self.reflections {
            prompts.reflections = v;
        }
    }
}

impl PromptsInput {
    fn check(self, errors: &mut FieldErrors) -> PromptFields {
        const MESSAGE: &str = "must be an array of strings";
        PromptFields {
            gratitude: errors.optional("prompts.gratitude", self.gratitude, MESSAGE),
            challenges: errors.optional("prompts.challenges", self.challenges, MESSAGE),
            goals: errors.optional("prompts.goals", self.goals, MESSAGE),
            reflections: errors.optional("prompts.reflections", self.reflections, MESSAGE),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrivacyFlagsInput {
    share_with_counselor: Checked<bool>,
    anonymous_sharing: Checked<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrivacyFlags {
    pub share_with_counselor: Option<bool>,
    pub anonymous_sharing: Option<bool>,
}

impl PrivacyFlagsInput {
    fn check(self, errors: &mut FieldErrors) -> PrivacyFlags {
        PrivacyFlags {
            share_with_counselor: errors.optional(
                "privacy.shareWithCounselor",
                self.share_with_counselor,
                "must be a boolean",
            ),
            anonymous_sharing: errors.optional(
                "privacy.anonymousSharing",
                self.anonymous_sharing,
                "must be a boolean",
            ),
        }
    }
}

fn nested<T>(errors: &mut FieldErrors, field: &str, value: Checked<T>) -> Option<T> {
    errors.optional(field, value, "must be an object")
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EntryInput {
    content: Checked<String>,
    mood: Checked<MoodInput>,
    context: Checked<ContextInput>,
    prompts: Checked<PromptsInput>,
    privacy: Checked<PrivacyFlagsInput>,
}

/// A validated journal submission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub content: String,
    pub mood: Mood,
    pub context: EntryContext,
    pub prompts: Prompts,
    pub share_with_counselor: bool,
    pub anonymous_sharing: bool,
}

impl Schema for EntryInput {
    type Output = NewEntry;

    fn validate(self) -> Result<NewEntry, AppError> {
        let mut errors = FieldErrors::default();

        let content = errors.required(
            "content",
            self.content,
            "Content is required and must be less than 5000 characters",
        );
        let content = errors.with_length("content", content, 1, MAX_CONTENT_CHARS);

        let mood = match nested(&mut errors, "mood", self.mood) {
            Some(mood) => mood.check(&mut errors, true),
            None => {
                if !errors.has("mood") {
                    errors.push(
                        "mood.scale",
                        "required",
                        "Mood scale must be an integer between 1 and 10",
                    );
                }
                MoodFields::default()
            }
        };
        let context = nested(&mut errors, "context", self.context)
            .map(|c| c.check(&mut errors))
            .unwrap_or_default();
        let mut prompts = Prompts::default();
        if let Some(input) = nested(&mut errors, "prompts", self.prompts) {
            input.check(&mut errors).merge_into(&mut prompts);
        }
        let privacy = nested(&mut errors, "privacy", self.privacy)
            .map(|p| p.check(&mut errors))
            .unwrap_or_default();

        errors.finish(|| NewEntry {
            content: content.unwrap_or_default(),
            mood: Mood {
                scale: mood.scale.unwrap_or_default(),
                colors: mood.colors.unwrap_or_default(),
                tags: mood.tags.unwrap_or_default(),
            },
            context,
            prompts,
            share_with_counselor: privacy.share_with_counselor.unwrap_or(false),
            anonymous_sharing: privacy.anonymous_sharing.unwrap_or(false),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EntryPatch {
    content: Checked<String>,
    mood: Checked<MoodInput>,
    context: Checked<ContextInput>,
    prompts: Checked<PromptsInput>,
    privacy: Checked<PrivacyFlagsInput>,
}

/// A validated partial edit of an entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryUpdate {
    /// Replaces the content; empty content is ignored
    pub content: Option<String>,
    pub mood: MoodFields,
    pub context: EntryContext,
    pub prompts: PromptFields,
    pub privacy: PrivacyFlags,
}

impl EntryUpdate {
    /// Merge provided fields into `entry`. Owner, expiry and timestamps are
    /// never touched here.
    pub fn apply(self, entry: &mut JournalEntry) {
        let body = &mut entry.entry;
        if let Some(content) = self.content {
            body.content = content;
        }

        if let Some(scale) = self.mood.scale {
            body.mood.scale = scale;
        }
        if let Some(colors) = self.mood.colors {
            body.mood.colors = colors;
        }
        if let Some(tags) = self.mood.tags {
            body.mood.tags = tags;
        }

        if let Some(location) = self.context.location {
            body.context.location = Some(location);
        }
        if let Some(time_of_day) = self.context.time_of_day {
            body.context.time_of_day = Some(time_of_day);
        }
        if let Some(stress) = self.context.stress_level {
            body.context.stress_level = Some(stress);
        }

        self.prompts.merge_into(&mut body.prompts);

        if let Some(share) = self.privacy.share_with_counselor {
            entry.privacy.share_with_counselor = share;
        }
        if let Some(share) = self.privacy.anonymous_sharing {
            entry.privacy.anonymous_sharing = share;
        }
    }
}

impl Schema for EntryPatch {
    type Output = EntryUpdate;

    fn validate(self) -> Result<EntryUpdate, AppError> {
        let mut errors = FieldErrors::default();

        let content = errors
            .optional(
                "content",
                self.content,
                "Content must be less than 5000 characters",
            )
            .filter(|c| !c.is_empty());
        let content = errors.with_length("content", content, 1, MAX_CONTENT_CHARS);

        let mood = nested(&mut errors, "mood", self.mood)
            .map(|m| m.check(&mut errors, false))
            .unwrap_or_default();
        let context = nested(&mut errors, "context", self.context)
            .map(|c| c.check(&mut errors))
            .unwrap_or_default();
        let prompts = nested(&mut errors, "prompts", self.prompts)
            .map(|p| p.check(&mut errors))
            .unwrap_or_default();
        let privacy = nested(&mut errors, "privacy", self.privacy)
            .map(|p| p.check(&mut errors))
            .unwrap_or_default();

        errors.finish(|| EntryUpdate {
            content,
            mood,
            context,
            prompts,
            privacy,
        })
    }
}

// ─── Real-time session mood ──────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionMoodInput {
    mood: Checked<u8>,
    colors: Checked<Vec<ColorInput>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionMood {
    pub mood: u8,
    pub colors: Vec<MoodColor>,
}

impl Schema for SessionMoodInput {
    type Output = SessionMood;

    fn validate(self) -> Result<SessionMood, AppError> {
        let mut errors = FieldErrors::default();
        let mood = errors.required(
            "mood",
            self.mood,
            "Mood must be an integer between 1 and 10",
        );
        let mood = errors.in_range("mood", mood, 1, 10);
        let colors = errors
            .optional("colors", self.colors, "Colors must be an array")
            .map(|c| check_colors(c, "colors", &mut errors))
            .unwrap_or_default();

        errors.finish(|| SessionMood {
            mood: mood.unwrap_or_default(),
            colors,
        })
    }
}

// ─── Query strings ───────────────────────────────────────────

fn parse_window(field: &str, raw: Option<&str>, errors: &mut FieldErrors) -> Option<Window> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;
    let message = format!("{field} must be an integer between {MIN_WINDOW_DAYS} and {MAX_WINDOW_DAYS}");
    let Ok(days) = raw.parse::<u32>() else {
        errors.push(field, "invalid_type", message);
        return None;
    };
    let days = errors.in_range(field, Some(days), MIN_WINDOW_DAYS, MAX_WINDOW_DAYS)?;
    Window::new(days)
}

/// `?days=` on the personal mood statistics command.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DaysQuery {
    days: Option<String>,
}

impl Schema for DaysQuery {
    /// `None` when the caller did not choose a window
    type Output = Option<Window>;

    fn validate(self) -> Result<Option<Window>, AppError> {
        let mut errors = FieldErrors::default();
        let window = parse_window("days", self.days.as_deref(), &mut errors);
        errors.finish(|| window)
    }
}

/// `?timeframe=` on the analytics commands.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TimeframeQuery {
    timeframe: Option<String>,
}

impl Schema for TimeframeQuery {
    type Output = Option<Window>;

    fn validate(self) -> Result<Option<Window>, AppError> {
        let mut errors = FieldErrors::default();
        let window = parse_window("timeframe", self.timeframe.as_deref(), &mut errors);
        errors.finish(|| window)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListQuery {
    page: Option<String>,
    limit: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

/// Validated list parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            start: None,
            end: None,
        }
    }
}

impl ListParams {
    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Clone, Copy)]
enum DateBound {
    Start,
    End,
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates. A plain end
/// date covers the whole day.
fn parse_date_param(raw: &str, bound: DateBound) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = match bound {
        DateBound::Start => NaiveTime::MIN,
        DateBound::End => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)?,
    };
    Some(date.and_time(time).and_utc())
}

impl Schema for ListQuery {
    type Output = ListParams;

    fn validate(self) -> Result<ListParams, AppError> {
        let mut errors = FieldErrors::default();
        let mut params = ListParams::default();

        if let Some(raw) = self.page.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            match raw.parse::<u32>() {
                Ok(page) if page >= 1 => params.page = page,
                _ => errors.push("page", "range", "Page must be a positive integer"),
            }
        }

        if let Some(raw) = self.limit.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            let limit = raw.parse::<u32>().ok();
            match errors.in_range("limit", limit, 1, MAX_PAGE_LIMIT) {
                Some(limit) => params.limit = limit,
                None if limit.is_none() => {
                    errors.push("limit", "invalid_type", "Limit must be between 1-50")
                }
                None => {}
            }
        }

        for (field, raw, bound) in [
            ("startDate", self.start_date.as_deref(), DateBound::Start),
            ("endDate", self.end_date.as_deref(), DateBound::End),
        ] {
            let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
                continue;
            };
            match parse_date_param(raw, bound) {
                Some(dt) => match bound {
                    DateBound::Start => params.start = Some(dt),
                    DateBound::End => params.end = Some(dt),
                },
                None => errors.push(field, "invalid_date", format!("{field} must be a valid ISO date")),
            }
        }

        if let (Some(start), Some(end)) = (params.start, params.end) {
            if end < start {
                errors.push("endDate", "range", "endDate must not be before startDate");
            }
        }

        errors.finish(|| params)
    }
}
