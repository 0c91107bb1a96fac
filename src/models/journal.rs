// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal entry model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Maximum entry content length (characters).
pub const MAX_CONTENT_CHARS: u64 = 5000;
/// Content stored in place of the original text once an entry is anonymized.
pub const ANONYMIZED_CONTENT: &str = "[Content removed for privacy]";

/// Fixed mood tag vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum MoodTag {
    Anxious,
    Calm,
    Stressed,
    Happy,
    Sad,
    Angry,
    Motivated,
    Tired,
    Focused,
    Overwhelmed,
    Peaceful,
    Excited,
}

impl MoodTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoodTag::Anxious => "anxious",
            MoodTag::Calm => "calm",
            MoodTag::Stressed => "stressed",
            MoodTag::Happy => "happy",
            MoodTag::Sad => "sad",
            MoodTag::Angry => "angry",
            MoodTag::Motivated => "motivated",
            MoodTag::Tired => "tired",
            MoodTag::Focused => "focused",
            MoodTag::Overwhelmed => "overwhelmed",
            MoodTag::Peaceful => "peaceful",
            MoodTag::Excited => "excited",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Campus,
    Dorm,
    Library,
    Outdoors,
    Home,
    Other,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Campus => "campus",
            Location::Dorm => "dorm",
            Location::Library => "library",
            Location::Outdoors => "outdoors",
            Location::Home => "home",
            Location::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

/// A colour the user associated with their mood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MoodColor {
    pub color: String,
    /// 1..=5
    #[serde(default)]
    pub intensity: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Mood {
    /// 1..=10
    pub scale: u8,
    #[serde(default)]
    pub colors: Vec<MoodColor>,
    /// Distinct tags in the order first given
    #[serde(default)]
    pub tags: Vec<MoodTag>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct EntryContext {
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub time_of_day: Option<TimeOfDay>,
    /// 1..=10
    #[serde(default)]
    pub stress_level: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Prompts {
    #[serde(default)]
    pub gratitude: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub reflections: Vec<String>,
}

/// The user-authored part of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EntryBody {
    pub content: String,
    pub mood: Mood,
    #[serde(default)]
    pub prompts: Prompts,
    #[serde(default)]
    pub context: EntryContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct EntryPrivacy {
    pub is_private: bool,
    pub share_with_counselor: bool,
    /// Contributes to the anonymized cohort aggregation
    pub anonymous_sharing: bool,
}

impl Default for EntryPrivacy {
    fn default() -> Self {
        Self {
            is_private: true,
            share_with_counselor: false,
            anonymous_sharing: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Sentiment {
    /// -1.0..=1.0
    pub score: f64,
    pub confidence: f64,
}

/// Incidental usage data; never authoritative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct EntryAnalytics {
    #[serde(default)]
    pub edit_count: u32,
    /// Seconds
    #[serde(default)]
    pub read_time: Option<f64>,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
}

/// Stored journal entry in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    /// Entry ID (also used as document ID)
    pub id: String,
    /// Owner's auth subject; immutable after creation
    pub user_id: String,
    pub entry: EntryBody,
    #[serde(default)]
    pub privacy: EntryPrivacy,
    #[serde(default)]
    pub analytics: EntryAnalytics,
    /// Purge deadline, set once at creation. Storage deletes the document
    /// at or after this instant.
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Whether the entry already carries the anonymized state.
    pub fn is_anonymized(&self) -> bool {
        self.entry.content == ANONYMIZED_CONTENT
            && self.privacy.is_private
            && !self.privacy.share_with_counselor
    }
}

/// Cohort projection of an entry: the only fields that may leave storage
/// for cross-user aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CohortSample {
    pub created_at: DateTime<Utc>,
    pub mood_scale: u8,
    pub stress_level: Option<u8>,
}

impl From<&JournalEntry> for CohortSample {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            created_at: entry.created_at,
            mood_scale: entry.entry.mood.scale,
            stress_level: entry.entry.context.stress_level,
        }
    }
}
