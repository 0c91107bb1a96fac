// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Personal and cohort aggregation over journal entries.
//!
//! Each function is a filter → group → project pass over entries already
//! fetched from storage. Averages are rounded to two decimals and are
//! `None` over an empty input.

use crate::models::stats::{CohortTrendPoint, MoodTrendPoint};
use crate::models::{
    CohortSample, CohortStats, ColorStat, DashboardSummary, Insights, JournalEntry, MoodStats,
};
use crate::time_utils::{day_key, format_utc_rfc3339};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

pub const MIN_WINDOW_DAYS: u32 = 7;
pub const MAX_WINDOW_DAYS: u32 = 365;
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Colours used fewer times than this get no insight.
const COLOR_INSIGHT_MIN_USES: u32 = 3;

/// A look-back window in days, always within `7..=365`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window(u32);

impl Window {
    pub fn new(days: u32) -> Option<Self> {
        (MIN_WINDOW_DAYS..=MAX_WINDOW_DAYS)
            .contains(&days)
            .then_some(Self(days))
    }

    /// The widest window, used by exports.
    pub fn full_year() -> Self {
        Self(MAX_WINDOW_DAYS)
    }

    pub fn days(&self) -> u32 {
        self.0
    }

    /// Earliest creation time inside the window.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.0))
    }
}

impl Default for Window {
    fn default() -> Self {
        Self(DEFAULT_WINDOW_DAYS)
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Running mean that reports `None` until it has seen a value.
#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn push(&mut self, value: impl Into<f64>) {
        self.sum += value.into();
        self.count += 1;
    }

    fn push_opt<T: Into<f64>>(&mut self, value: Option<T>) {
        if let Some(v) = value {
            self.push(v);
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| round2(self.sum / f64::from(self.count)))
    }
}

/// Entries sorted oldest first.
fn chronological(entries: &[JournalEntry]) -> Vec<&JournalEntry> {
    let mut sorted: Vec<&JournalEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.created_at);
    sorted
}

fn trend_point(entry: &JournalEntry) -> MoodTrendPoint {
    MoodTrendPoint {
        date: day_key(entry.created_at),
        mood: entry.entry.mood.scale,
        stress: entry.entry.context.stress_level,
    }
}

/// Mood summary for one user's entries in a window.
pub fn mood_stats(entries: &[JournalEntry]) -> MoodStats {
    let mut mood = Mean::default();
    let mut stress = Mean::default();
    let sorted = chronological(entries);

    for entry in &sorted {
        mood.push(entry.entry.mood.scale);
        stress.push_opt(entry.entry.context.stress_level);
    }

    MoodStats {
        avg_mood: mood.value(),
        avg_stress: stress.value(),
        total_entries: sorted.len() as u32,
        mood_trend: sorted.into_iter().map(trend_point).collect(),
    }
}

/// Dashboard summary and frequency tables.
pub fn dashboard(entries: &[JournalEntry]) -> (DashboardSummary, Insights) {
    let mut mood = Mean::default();
    let mut stress = Mean::default();
    let mut read_time = Mean::default();
    let mut insights = Insights::default();
    let sorted = chronological(entries);

    for entry in &sorted {
        let body = &entry.entry;
        mood.push(body.mood.scale);
        stress.push_opt(body.context.stress_level);
        read_time.push_opt(entry.analytics.read_time);

        for tag in &body.mood.tags {
            *insights
                .mood_tag_frequency
                .entry(tag.as_str().to_string())
                .or_default() += 1;
        }
        if let Some(location) = body.context.location {
            *insights
                .location_frequency
                .entry(location.as_str().to_string())
                .or_default() += 1;
        }
        if let Some(time) = body.context.time_of_day {
            *insights
                .time_patterns
                .entry(time.as_str().to_string())
                .or_default() += 1;
        }
    }

    insights.mood_trend = sorted.iter().copied().map(trend_point).collect();
    let summary = DashboardSummary {
        total_entries: sorted.len() as u32,
        avg_mood: mood.value(),
        avg_stress: stress.value(),
        avg_read_time: read_time.value(),
    };
    (summary, insights)
}

/// Per-colour usage, most frequent first.
pub fn color_stats(entries: &[JournalEntry]) -> Vec<ColorStat> {
    #[derive(Default)]
    struct Acc {
        frequency: u32,
        intensity: Mean,
        mood: Mean,
    }

    let mut by_color: HashMap<&str, Acc> = HashMap::new();
    for entry in entries {
        for color in &entry.entry.mood.colors {
            let acc = by_color.entry(color.color.as_str()).or_default();
            acc.frequency += 1;
            acc.intensity.push_opt(color.intensity);
            acc.mood.push(entry.entry.mood.scale);
        }
    }

    let mut stats: Vec<ColorStat> = by_color
        .into_iter()
        .map(|(color, acc)| ColorStat {
            color: color.to_string(),
            frequency: acc.frequency,
            avg_intensity: acc.intensity.value(),
            avg_mood_when_used: acc.mood.value(),
        })
        .collect();
    stats.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.color.cmp(&b.color)));
    stats
}

/// Plain-language notes for frequently used colours.
pub fn color_insights(stats: &[ColorStat]) -> Vec<String> {
    stats
        .iter()
        .filter(|s| s.frequency >= COLOR_INSIGHT_MIN_USES)
        .filter_map(|s| {
            let n = s.frequency;
            match s.color.to_lowercase().as_str() {
                "blue" => Some(format!(
                    "Blue appears frequently in your entries ({n} times), often associated with calm and stability."
                )),
                "red" => Some(format!(
                    "Red usage ({n} times) may indicate high energy or stress periods."
                )),
                "green" => Some(format!(
                    "Green in your entries ({n} times) often represents growth and balance."
                )),
                "yellow" => Some(format!(
                    "Yellow usage ({n} times) may reflect optimism and energy."
                )),
                _ => s
                    .avg_mood_when_used
                    .filter(|avg| *avg > 7.0)
                    .map(|_| format!("{} seems to be associated with your positive moods.", s.color)),
            }
        })
        .collect()
}

/// Campus-wide statistics. `None` when no entry was shared, so callers can
/// report "no data" rather than a zero-filled summary.
pub fn cohort_stats(samples: &[CohortSample]) -> Option<CohortStats> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by_key(|s| s.created_at);

    let mut mood = Mean::default();
    let mut stress = Mean::default();
    for sample in &sorted {
        mood.push(sample.mood_scale);
        stress.push_opt(sample.stress_level);
    }

    Some(CohortStats {
        avg_mood: mood.value(),
        avg_stress: stress.value(),
        total_entries: sorted.len() as u32,
        mood_trends: sorted
            .iter()
            .map(|s| CohortTrendPoint {
                date: format_utc_rfc3339(s.created_at),
                mood: s.mood_scale,
                stress: s.stress_level,
            })
            .collect(),
    })
}
