// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Privacy settings and preferences routes.

use crate::error::Result;
use crate::middleware::auth::ConsentedUser;
use crate::models::{Preferences, PrivacySettings};
use crate::services::account::PreferencesView;
use crate::validation::schema::{PreferencesPatch, PrivacySettingsPatch};
use crate::validation::ValidJson;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user/privacy", get(get_privacy).put(update_privacy))
        .route(
            "/api/user/preferences",
            get(get_preferences).put(update_preferences),
        )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub privacy_settings: PrivacySettings,
}

async fn get_privacy(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
) -> Result<Json<PrivacyResponse>> {
    let who = user.proof()?;
    Ok(Json(PrivacyResponse {
        message: None,
        privacy_settings: state.accounts.privacy(who),
    }))
}

async fn update_privacy(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    ValidJson(update): ValidJson<PrivacySettingsPatch>,
) -> Result<Json<PrivacyResponse>> {
    let who = user.proof()?;
    let privacy_settings = state.accounts.update_privacy(who, &update).await?;
    Ok(Json(PrivacyResponse {
        message: Some("Privacy settings updated successfully"),
        privacy_settings,
    }))
}

async fn get_preferences(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
) -> Result<Json<PreferencesView>> {
    let who = user.proof()?;
    Ok(Json(state.accounts.preferences(who)))
}

#[derive(Serialize)]
pub struct PreferencesResponse {
    pub message: &'static str,
    pub preferences: Preferences,
}

async fn update_preferences(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    ValidJson(update): ValidJson<PreferencesPatch>,
) -> Result<Json<PreferencesResponse>> {
    let who = user.proof()?;
    let preferences = state.accounts.update_preferences(who, &update).await?;
    Ok(Json(PreferencesResponse {
        message: "Preferences updated successfully",
        preferences,
    }))
}
