// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Analytics results computed from journal entries.
//!
//! All averages are rounded to two decimals and are `None` when the
//! window holds no data, so "no data" never reads as a zero mean.

use serde::Serialize;
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One point of a personal mood trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MoodTrendPoint {
    /// Day of the entry ("YYYY-MM-DD", UTC)
    pub date: String,
    pub mood: u8,
    pub stress: Option<u8>,
}

/// Personal mood summary over a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct MoodStats {
    pub avg_mood: Option<f64>,
    pub avg_stress: Option<f64>,
    pub total_entries: u32,
    /// Chronological
    pub mood_trend: Vec<MoodTrendPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_entries: u32,
    pub avg_mood: Option<f64>,
    pub avg_stress: Option<f64>,
    pub avg_read_time: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub mood_tag_frequency: BTreeMap<String, u32>,
    pub location_frequency: BTreeMap<String, u32>,
    pub time_patterns: BTreeMap<String, u32>,
    pub mood_trend: Vec<MoodTrendPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Mood,
    Stress,
    Engagement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub message: &'static str,
    pub action: &'static str,
}

/// Usage statistics for a single mood colour.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ColorStat {
    pub color: String,
    pub frequency: u32,
    pub avg_intensity: Option<f64>,
    pub avg_mood_when_used: Option<f64>,
}

/// One anonymized cohort trend point. Carries no owner field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CohortTrendPoint {
    /// Entry creation time (RFC 3339)
    pub date: String,
    pub mood: u8,
    pub stress: Option<u8>,
}

/// Campus-wide statistics over entries shared anonymously.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct CohortStats {
    pub avg_mood: Option<f64>,
    pub avg_stress: Option<f64>,
    pub total_entries: u32,
    pub mood_trends: Vec<CohortTrendPoint>,
}
