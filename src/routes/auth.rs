// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: consent, profile, export and account deletion.

use crate::error::Result;
use crate::middleware::auth::{AuthUser, ConsentedUser};
use crate::services::account::{ConsentView, DataExport, ProfileView};
use crate::validation::schema::{ConsentForm, ProfilePatch};
use crate::validation::ValidJson;
use crate::AppState;
use axum::{
    extract::State,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/consent", post(record_consent))
        .route("/api/auth/profile", get(get_profile).put(update_profile))
        .route("/api/auth/account", delete(delete_account))
        .route("/api/auth/data-export", post(export_data))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ConsentResponse {
    pub message: &'static str,
    pub user: ConsentView,
}

/// Record consent. Authenticated, but deliberately not consent-gated.
async fn record_consent(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidJson(consent): ValidJson<ConsentForm>,
) -> Result<Json<ConsentResponse>> {
    let user = state.accounts.record_consent(&auth.user, &consent).await?;
    Ok(Json(ConsentResponse {
        message: "Consent updated successfully",
        user,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub user: ProfileView,
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
) -> Result<Json<ProfileResponse>> {
    let who = user.proof()?;
    Ok(Json(ProfileResponse {
        message: None,
        user: state.accounts.profile(who),
    }))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
    ValidJson(update): ValidJson<ProfilePatch>,
) -> Result<Json<ProfileResponse>> {
    let who = user.proof()?;
    let profile = state.accounts.update_profile(who, &update).await?;
    Ok(Json(ProfileResponse {
        message: Some("Profile updated successfully"),
        user: profile,
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Anonymize the caller's account. The account cannot sign in afterwards.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
) -> Result<Json<MessageResponse>> {
    let who = user.proof()?;
    state.accounts.anonymize_account(who).await?;
    Ok(Json(MessageResponse {
        message: "Account successfully anonymized and scheduled for deletion",
    }))
}

#[derive(Serialize)]
pub struct DataExportResponse {
    pub message: &'static str,
    pub data: DataExport,
}

async fn export_data(
    State(state): State<Arc<AppState>>,
    user: ConsentedUser,
) -> Result<Json<DataExportResponse>> {
    let who = user.proof()?;
    let data = state.accounts.export(who).await?;
    Ok(Json(DataExportResponse {
        message: "Data export generated",
        data,
    }))
}
