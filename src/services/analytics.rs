// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Personal analytics (consent and opt-in gated) and the anonymized cohort
//! view.

use crate::db::Store;
use crate::error::Result;
use crate::models::{
    CohortStats, ColorStat, DashboardSummary, EntryAnalytics, EntryContext, Insights,
    JournalEntry, Mood, Recommendation,
};
use crate::policy::aggregation::{self, Window};
use crate::policy::recommendations::recommend;
use crate::policy::{require_analytics_opt_in, Consented};
use crate::time_utils::format_utc_rfc3339;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const COHORT_DISCLAIMER: &str =
    "This data is anonymized and aggregated from users who opted into data sharing.";

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Dashboard {
    pub timeframe: u32,
    pub summary: DashboardSummary,
    pub insights: Insights,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ColorReport {
    pub color_analytics: Vec<ColorStat>,
    pub timeframe: u32,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    pub analytics_opt_in: bool,
    pub data_retention_days: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportEntry {
    pub date: String,
    pub mood: Mood,
    pub context: EntryContext,
    pub analytics: EntryAnalytics,
}

impl From<JournalEntry> for ExportEntry {
    fn from(entry: JournalEntry) -> Self {
        Self {
            date: format_utc_rfc3339(entry.created_at),
            mood: entry.entry.mood,
            context: entry.entry.context,
            analytics: entry.analytics,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsExport {
    pub user: ExportSettings,
    pub timeframe: u32,
    pub entries: Vec<ExportEntry>,
    pub export_timestamp: String,
    pub format: &'static str,
    pub version: &'static str,
}

pub struct AnalyticsService {
    db: Arc<dyn Store>,
}

impl AnalyticsService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    pub async fn dashboard(&self, who: Consented<'_>, window: Window) -> Result<Dashboard> {
        let entries = self.personal_entries(who, window).await?;
        let (summary, insights) = aggregation::dashboard(&entries);
        let recommendations = recommend(&summary);

        Ok(Dashboard {
            timeframe: window.days(),
            summary,
            insights,
            recommendations,
        })
    }

    pub async fn mood_colors(&self, who: Consented<'_>, window: Window) -> Result<ColorReport> {
        let entries = self.personal_entries(who, window).await?;
        let color_analytics = aggregation::color_stats(&entries);
        let insights = aggregation::color_insights(&color_analytics);

        Ok(ColorReport {
            color_analytics,
            timeframe: window.days(),
            insights,
        })
    }

    pub async fn export(&self, who: Consented<'_>, window: Window) -> Result<AnalyticsExport> {
        let entries = self.personal_entries(who, window).await?;
        let settings = who.user().privacy_settings;
        tracing::info!(user_id = %who.subject(), count = entries.len(), "Analytics exported");

        Ok(AnalyticsExport {
            user: ExportSettings {
                analytics_opt_in: settings.analytics_opt_in,
                data_retention_days: settings.data_retention_days,
            },
            timeframe: window.days(),
            entries: entries.into_iter().map(ExportEntry::from).collect(),
            export_timestamp: format_utc_rfc3339(Utc::now()),
            format: "JSON",
            version: "1.0",
        })
    }

    /// Campus-wide statistics over entries shared anonymously. `None` when
    /// nothing was shared in the window.
    pub async fn cohort(&self, window: Window) -> Result<Option<CohortStats>> {
        let samples = self.db.cohort_samples(window.start(Utc::now())).await?;
        Ok(aggregation::cohort_stats(&samples))
    }

    /// The caller's entries in `window`, after the opt-in check.
    async fn personal_entries(
        &self,
        who: Consented<'_>,
        window: Window,
    ) -> Result<Vec<JournalEntry>> {
        require_analytics_opt_in(who)?;
        let since = window.start(Utc::now());
        self.db.entries_since(who.subject(), Some(since)).await
    }
}
