// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod journal;
pub mod stats;
pub mod user;

pub use journal::{
    CohortSample, EntryAnalytics, EntryBody, EntryContext, EntryPrivacy, JournalEntry, Location,
    Mood, MoodColor, MoodTag, Prompts, TimeOfDay,
};
pub use stats::{
    CohortStats, ColorStat, DashboardSummary, Insights, MoodStats, Recommendation,
};
pub use user::{AccountStatus, Preferences, PrivacySettings, User, UserUpdate};
