// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Privacy settings, preferences and profile routes.

use axum::http::StatusCode;
use campus_journal::models::PrivacySettings;
use serde_json::{json, Value};

mod common;

fn field_names(body: &Value) -> Vec<String> {
    body["fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

async fn consented_app(subject: &str) -> (axum::Router, std::sync::Arc<campus_journal::AppState>, String) {
    let (app, state) = common::create_test_app();
    common::seed_consented_user(
        &state,
        subject,
        PrivacySettings {
            data_retention_days: 180,
            analytics_opt_in: false,
            share_anonymized_data: true,
        },
    )
    .await;
    let token = common::create_test_jwt(subject);
    (app, state, token)
}

#[tokio::test]
async fn test_partial_privacy_update_leaves_other_fields() {
    let (app, state, token) = consented_app("auth0|partial").await;

    let (status, body) = common::send(
        &app,
        "PUT",
        "/api/user/privacy",
        Some(&token),
        Some(json!({ "analyticsOptIn": true })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["privacySettings"]["analyticsOptIn"], true);
    assert_eq!(body["privacySettings"]["dataRetentionDays"], 180);
    assert_eq!(body["privacySettings"]["shareAnonymizedData"], true);

    let stored = state.db.get_user("auth0|partial").await.unwrap().unwrap();
    assert_eq!(
        stored.privacy_settings,
        PrivacySettings {
            data_retention_days: 180,
            analytics_opt_in: true,
            share_anonymized_data: true,
        }
    );
}

#[tokio::test]
async fn test_retention_bounds() {
    let (app, _, token) = consented_app("auth0|bounds").await;

    for days in [29, 1096] {
        let (status, body) = common::send(
            &app,
            "PUT",
            "/api/user/privacy",
            Some(&token),
            Some(json!({ "dataRetentionDays": days })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{days}");
        assert_eq!(field_names(&body), vec!["dataRetentionDays"]);
    }

    for days in [30, 1095] {
        let (status, body) = common::send(
            &app,
            "PUT",
            "/api/user/privacy",
            Some(&token),
            Some(json!({ "dataRetentionDays": days })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{days}");
        assert_eq!(body["privacySettings"]["dataRetentionDays"], days);
    }
}

#[tokio::test]
async fn test_privacy_update_reports_every_bad_field() {
    let (app, state, token) = consented_app("auth0|many").await;

    let (status, body) = common::send(
        &app,
        "PUT",
        "/api/user/privacy",
        Some(&token),
        Some(json!({
            "dataRetentionDays": "forever",
            "analyticsOptIn": 1,
            "shareAnonymizedData": "no",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = field_names(&body);
    assert_eq!(fields.len(), 3, "{fields:?}");
    for expected in ["dataRetentionDays", "analyticsOptIn", "shareAnonymizedData"] {
        assert!(fields.iter().any(|f| f == expected), "missing {expected}");
    }

    let stored = state.db.get_user("auth0|many").await.unwrap().unwrap();
    assert_eq!(stored.privacy_settings.data_retention_days, 180);
}

#[tokio::test]
async fn test_malformed_json_is_a_validation_error() {
    let (app, _, token) = consented_app("auth0|malformed").await;

    let request = axum::http::Request::builder()
        .method("PUT")
        .uri("/api/user/privacy")
        .header(axum::http::header::AUTHORIZATION, format!("Bearer {token}"))
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_preferences_round_trip() {
    let (app, _, token) = consented_app("auth0|prefs").await;

    let (status, body) = common::send(&app, "GET", "/api/user/preferences", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preferences"]["colorTheme"], "calming");
    assert_eq!(body["preferences"]["reminderFrequency"], "daily");
    assert_eq!(body["preferences"]["journalPrompts"], true);
    assert_eq!(body["privacySettings"]["dataRetentionDays"], 180);

    let (status, body) = common::send(
        &app,
        "PUT",
        "/api/user/preferences",
        Some(&token),
        Some(json!({ "colorTheme": "energizing" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preferences"]["colorTheme"], "energizing");
    assert_eq!(body["preferences"]["reminderFrequency"], "daily");

    let (status, body) = common::send(
        &app,
        "PUT",
        "/api/user/preferences",
        Some(&token),
        Some(json!({ "colorTheme": "neon", "reminderFrequency": "hourly" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(field_names(&body).len(), 2);
}

#[tokio::test]
async fn test_profile_hides_identity_fields() {
    let (app, _, token) = consented_app("auth0|profile").await;

    let (status, body) = common::send(&app, "GET", "/api/auth/profile", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    let user = body["user"].as_object().unwrap();
    assert_eq!(user["displayName"], "Test Student");
    assert_eq!(user["consentVersion"], "2026-01");
    assert!(user.contains_key("lastActive"));
    assert!(!user.contains_key("email"));
    assert!(!user.contains_key("authSubject"));
}

#[tokio::test]
async fn test_profile_update_validation() {
    let (app, state, token) = consented_app("auth0|rename").await;

    let (status, body) = common::send(
        &app,
        "PUT",
        "/api/auth/profile",
        Some(&token),
        Some(json!({
            "displayName": "x".repeat(51),
            "preferences": { "journalPrompts": "sometimes" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = field_names(&body);
    assert!(fields.iter().any(|f| f == "displayName"));
    assert!(fields.iter().any(|f| f == "preferences.journalPrompts"));

    let (status, body) = common::send(
        &app,
        "PUT",
        "/api/auth/profile",
        Some(&token),
        Some(json!({
            "displayName": "  Riley  ",
            "preferences": { "reminderFrequency": "weekly" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["displayName"], "Riley");
    assert_eq!(body["user"]["preferences"]["reminderFrequency"], "weekly");

    let stored = state.db.get_user("auth0|rename").await.unwrap().unwrap();
    assert_eq!(stored.display_name, "Riley");
    assert!(stored.preferences.journal_prompts);
}
