// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Consent gate and consent recording over HTTP.

use axum::http::StatusCode;
use campus_journal::db::DateRange;
use chrono::{Duration, Utc};
use serde_json::json;

mod common;

/// Every data-bearing route, with a body where one is required.
fn gated_requests() -> Vec<(&'static str, &'static str, Option<serde_json::Value>)> {
    vec![
        ("GET", "/api/user/privacy", None),
        ("PUT", "/api/user/privacy", Some(json!({ "analyticsOptIn": true }))),
        ("GET", "/api/user/preferences", None),
        ("PUT", "/api/user/preferences", Some(json!({ "journalPrompts": false }))),
        ("GET", "/api/auth/profile", None),
        ("PUT", "/api/auth/profile", Some(json!({ "displayName": "New" }))),
        ("POST", "/api/auth/data-export", None),
        ("DELETE", "/api/auth/account", None),
        ("GET", "/api/journal", None),
        (
            "POST",
            "/api/journal",
            Some(json!({ "content": "hello", "mood": { "scale": 5 } })),
        ),
        ("GET", "/api/journal/some-id", None),
        ("PUT", "/api/journal/some-id", Some(json!({ "content": "x" }))),
        ("DELETE", "/api/journal/some-id", None),
        ("POST", "/api/journal/some-id/anonymize", None),
        ("GET", "/api/journal/stats/mood", None),
        ("GET", "/api/analytics/dashboard", None),
        ("GET", "/api/analytics/mood-colors", None),
        ("GET", "/api/analytics/export", None),
    ]
}

#[tokio::test]
async fn test_expired_consent_blocks_every_data_operation() {
    let (app, state) = common::create_test_app();
    let mut user = common::consented_user("auth0|stale", common::analytics_settings());
    user.consent_date = Some(Utc::now() - Duration::days(366));
    state.db.upsert_user(&user).await.unwrap();
    let token = common::create_test_jwt("auth0|stale");

    for (method, uri, body) in gated_requests() {
        let (status, json) = common::send(&app, method, uri, Some(&token), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(json["error"], "consent_required", "{method} {uri}");
        assert_eq!(json["requiresConsent"], true);
        assert_eq!(json["message"], "Privacy consent expired");
    }

    // Nothing was written through the gate.
    let count = state
        .db
        .count_entries("auth0|stale", DateRange::default())
        .await
        .unwrap();
    assert_eq!(count, 0);
    let stored = state.db.get_user("auth0|stale").await.unwrap().unwrap();
    assert_eq!(stored.display_name, "Test Student");
}

#[tokio::test]
async fn test_consent_just_inside_a_year_is_accepted() {
    let (app, state) = common::create_test_app();
    let mut user = common::consented_user("auth0|edge", Default::default());
    user.consent_date = Some(Utc::now() - Duration::days(365) + Duration::seconds(5));
    state.db.upsert_user(&user).await.unwrap();
    let token = common::create_test_jwt("auth0|edge");

    let (status, _) = common::send(&app, "GET", "/api/user/privacy", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_gate_runs_before_body_validation() {
    let (app, _) = common::create_test_app();
    let token = common::create_test_jwt("auth0|nobody");

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/journal",
        Some(&token),
        Some(json!({ "content": "", "mood": { "scale": 99 } })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Privacy consent required");
}

#[tokio::test]
async fn test_recording_consent_authorizes_user() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("auth0|newcomer");

    let (status, _) = common::send(&app, "GET", "/api/user/privacy", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/auth/consent",
        Some(&token),
        Some(common::consent_body(90, true, false)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["consentVersion"], "2026-01");
    assert_eq!(body["user"]["privacySettings"]["dataRetentionDays"], 90);

    let (status, body) = common::send(&app, "GET", "/api/user/privacy", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["privacySettings"]["analyticsOptIn"], true);
    assert_eq!(body["privacySettings"]["shareAnonymizedData"], false);

    let user = state.db.get_user("auth0|newcomer").await.unwrap().unwrap();
    assert!(user.consent_date.is_some());
}

#[tokio::test]
async fn test_reconsent_overwrites_all_settings() {
    let (app, state) = common::create_test_app();
    let mut user = common::consented_user("auth0|again", common::analytics_settings());
    user.consent_date = Some(Utc::now() - Duration::days(400));
    state.db.upsert_user(&user).await.unwrap();
    let token = common::create_test_jwt("auth0|again");

    let (status, _) = common::send(
        &app,
        "POST",
        "/api/auth/consent",
        Some(&token),
        Some(json!({
            "consentVersion": "2027-01",
            "analyticsOptIn": false,
            "shareAnonymizedData": false,
            "dataRetention": 30,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let stored = state.db.get_user("auth0|again").await.unwrap().unwrap();
    assert_eq!(stored.consent_version.as_deref(), Some("2027-01"));
    assert_eq!(stored.privacy_settings.data_retention_days, 30);
    assert!(!stored.privacy_settings.analytics_opt_in);
    assert!(!stored.privacy_settings.share_anonymized_data);
    assert!(Utc::now() - stored.consent_date.unwrap() < Duration::minutes(1));
}

#[tokio::test]
async fn test_consent_validation_lists_every_field() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("auth0|sloppy");

    let (status, body) = common::send(
        &app,
        "POST",
        "/api/auth/consent",
        Some(&token),
        Some(json!({
            "analyticsOptIn": "yes",
            "dataRetentionDays": 29,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    for expected in [
        "consentVersion",
        "analyticsOptIn",
        "shareAnonymizedData",
        "dataRetentionDays",
    ] {
        assert!(fields.contains(&expected), "missing {expected} in {fields:?}");
    }

    let user = state.db.get_user("auth0|sloppy").await.unwrap().unwrap();
    assert!(user.consent_date.is_none(), "invalid consent must not be recorded");
}
