// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journal entry routes.

use crate::error::Result;
use crate::middleware::auth::ConsentedUser;
use crate::models::{EntryContext, Mood, MoodStats};
use crate::services::journal::{EntryPage, EntryView};
use crate::time_utils::format_utc_rfc3339;
use crate::validation::schema::{DaysQuery, EntryInput, EntryPatch, ListQuery};
use crate::validation::{ValidJson, ValidQuery};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/journal", get(list_entries).post(create_entry))
        .route("/api/journal/stats/mood", get(mood_stats))
        .route(
            "/api/journal/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/api/journal/{id}/anonymize", post(anonymize_entry))
}

// ─── Create / list ───────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEntry {
    pub id: String,
    pub created_at: String,
    pub mood: Mood,
    pub context: EntryContext,
}

#[derive(Serialize)]
pub struct CreateEntryResponse {
    pub message: &'static str,
    pub entry: CreatedEntry,
}

async fn create_entry(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    ValidJson(input): ValidJson<EntryInput>,
) -> Result<(StatusCode, Json<CreateEntryResponse>)> {
    let who = user.proof()?;
    let entry = state.journal.create(who, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateEntryResponse {
            message: "Journal entry created successfully",
            entry: CreatedEntry {
                id: entry.id,
                created_at: format_utc_rfc3339(entry.created_at),
                mood: entry.entry.mood,
                context: entry.entry.context,
            },
        }),
    ))
}

async fn list_entries(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    ValidQuery(params): ValidQuery<ListQuery>,
) -> Result<Json<EntryPage>> {
    let who = user.proof()?;
    Ok(Json(state.journal.list(who, params).await?))
}

// ─── Single entry ────────────────────────────────────────────

#[derive(Serialize)]
pub struct EntryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub entry: EntryView,
}

async fn get_entry(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    Path(id): Path<String>,
) -> Result<Json<EntryResponse>> {
    let who = user.proof()?;
    let entry = state.journal.get(who, &id).await?;
    Ok(Json(EntryResponse {
        message: None,
        entry: entry.into(),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedEntry {
    pub id: String,
    pub updated_at: String,
    pub edit_count: u32,
}

#[derive(Serialize)]
pub struct UpdateEntryResponse {
    pub message: &'static str,
    pub entry: UpdatedEntry,
}

async fn update_entry(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    Path(id): Path<String>,
    ValidJson(update): ValidJson<EntryPatch>,
) -> Result<Json<UpdateEntryResponse>> {
    let who = user.proof()?;
    let entry = state.journal.update(who, &id, update).await?;
    Ok(Json(UpdateEntryResponse {
        message: "Journal entry updated successfully",
        entry: UpdatedEntry {
            id: entry.id,
            updated_at: format_utc_rfc3339(entry.updated_at),
            edit_count: entry.analytics.edit_count,
        },
    }))
}

#[derive(Serialize)]
pub struct DeleteEntryResponse {
    pub message: &'static str,
}

async fn delete_entry(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteEntryResponse>> {
    let who = user.proof()?;
    state.journal.delete(who, &id).await?;
    Ok(Json(DeleteEntryResponse {
        message: "Journal entry deleted successfully",
    }))
}

async fn anonymize_entry(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    Path(id): Path<String>,
) -> Result<Json<EntryResponse>> {
    let who = user.proof()?;
    let entry = state.journal.anonymize(who, &id).await?;
    Ok(Json(EntryResponse {
        message: Some("Journal entry anonymized"),
        entry: entry.into(),
    }))
}

// ─── Statistics ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct MoodStatsResponse {
    pub stats: MoodStats,
    pub timeframe: u32,
}

async fn mood_stats(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    ValidQuery(window): ValidQuery<DaysQuery>,
) -> Result<Json<MoodStatsResponse>> {
    let who = user.proof()?;
    let window = window.unwrap_or_default();
    let stats = state.journal.mood_stats(who, window).await?;
    Ok(Json(MoodStatsResponse {
        stats,
        timeframe: window.days(),
    }))
}
