// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Analytics routes.

use crate::error::Result;
use crate::middleware::auth::ConsentedUser;
use crate::models::CohortStats;
use crate::policy::aggregation::Window;
use crate::services::analytics::{AnalyticsExport, ColorReport, Dashboard, COHORT_DISCLAIMER};
use crate::validation::schema::TimeframeQuery;
use crate::validation::ValidQuery;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/analytics/dashboard", get(dashboard))
        .route("/api/analytics/mood-colors", get(mood_colors))
        .route("/api/analytics/export", get(export))
        .route("/api/analytics/anonymous", get(cohort))
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    ValidQuery(window): ValidQuery<TimeframeQuery>,
) -> Result<Json<Dashboard>> {
    let who = user.proof()?;
    let report = state
        .analytics
        .dashboard(who, window.unwrap_or_default())
        .await?;
    Ok(Json(report))
}

async fn mood_colors(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    ValidQuery(window): ValidQuery<TimeframeQuery>,
) -> Result<Json<ColorReport>> {
    let who = user.proof()?;
    let report = state
        .analytics
        .mood_colors(who, window.unwrap_or_default())
        .await?;
    Ok(Json(report))
}

#[derive(Serialize)]
pub struct AnalyticsExportResponse {
    pub message: &'static str,
    pub data: AnalyticsExport,
}

/// Export defaults to a full year rather than the usual 30 days.
async fn export(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    ValidQuery(window): ValidQuery<TimeframeQuery>,
) -> Result<Json<AnalyticsExportResponse>> {
    let who = user.proof()?;
    let data = state
        .analytics
        .export(who, window.unwrap_or_else(Window::full_year))
        .await?;
    Ok(Json(AnalyticsExportResponse {
        message: "Analytics data export generated",
        data,
    }))
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum CohortResponse {
    #[serde(rename_all = "camelCase")]
    Stats {
        campus_stats: CohortStats,
        timeframe: u32,
        disclaimer: &'static str,
    },
    NoData {
        message: &'static str,
        stats: Option<CohortStats>,
        timeframe: u32,
    },
}

/// Campus-wide statistics. Requires authentication only; no personal data
/// is read.
async fn cohort(
    State(state): State<Arc<AppState>>,
    ValidQuery(window): ValidQuery<TimeframeQuery>,
) -> Result<Json<CohortResponse>> {
    let window = window.unwrap_or_default();
    let response = match state.analytics.cohort(window).await? {
        Some(campus_stats) => CohortResponse::Stats {
            campus_stats,
            timeframe: window.days(),
            disclaimer: COHORT_DISCLAIMER,
        },
        None => CohortResponse::NoData {
            message: "No anonymized data available",
            stats: None,
            timeframe: window.days(),
        },
    };
    Ok(Json(response))
}
