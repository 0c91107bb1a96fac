// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication middleware tests.

use axum::http::StatusCode;
use campus_journal::models::user::ANONYMOUS_EMAIL;
use campus_journal::models::{AccountStatus, User};
use chrono::{Duration, Utc};

mod common;

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = common::create_test_app();

    for uri in ["/health", "/api/health"] {
        let (status, body) = common::send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let (app, _) = common::create_test_app();

    let (status, body) = common::send(&app, "GET", "/api/user/privacy", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_protected_route_with_garbage_token() {
    let (app, _) = common::create_test_app();

    let (status, body) = common::send(
        &app,
        "GET",
        "/api/user/privacy",
        Some("invalid.token.here"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn test_token_claim_mismatches_are_rejected() {
    let (app, _) = common::create_test_app();
    let now = Utc::now().timestamp();

    let mut wrong_issuer = common::test_claims("auth0|a");
    wrong_issuer["iss"] = "https://evil.example/".into();

    let mut wrong_audience = common::test_claims("auth0|a");
    wrong_audience["aud"] = "https://other-api.example".into();

    let mut expired = common::test_claims("auth0|a");
    expired["exp"] = (now - 3600).into();

    for claims in [wrong_issuer, wrong_audience, expired] {
        let token = common::sign_claims(&claims, common::TEST_KID);
        let (status, body) =
            common::send(&app, "GET", "/api/user/privacy", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "claims: {claims}");
        assert_eq!(body["error"], "invalid_token");
    }

    let unknown_kid = common::sign_claims(&common::test_claims("auth0|a"), "rotated-key");
    let (status, _) =
        common::send(&app, "GET", "/api/user/privacy", Some(&unknown_kid), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_first_request_creates_user_without_consent() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("auth0|fresh");

    let (status, body) = common::send(&app, "GET", "/api/user/privacy", Some(&token), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "consent_required");
    assert_eq!(body["requiresConsent"], true);

    let user = state.db.get_user("auth0|fresh").await.unwrap().unwrap();
    assert!(user.consent_date.is_none());
    assert_eq!(user.display_name, "Test Student");
    assert_eq!(user.privacy_settings.data_retention_days, 365);
    assert!(!user.privacy_settings.analytics_opt_in);
    assert!(!user.email.contains("example.edu"), "email must be stored as a digest");
}

#[tokio::test]
async fn test_token_without_email_uses_sentinel() {
    let (app, state) = common::create_test_app();
    let mut claims = common::test_claims("auth0|noemail");
    claims.as_object_mut().unwrap().remove("email");
    let token = common::sign_claims(&claims, common::TEST_KID);

    common::send(&app, "GET", "/api/user/privacy", Some(&token), None).await;

    let user = state.db.get_user("auth0|noemail").await.unwrap().unwrap();
    assert_eq!(user.email, ANONYMOUS_EMAIL);
}

#[tokio::test]
async fn test_inactive_accounts_are_rejected() {
    let (app, state) = common::create_test_app();

    for (subject, status) in [
        ("auth0|suspended", AccountStatus::Suspended),
        ("auth0|deleted", AccountStatus::Deleted),
    ] {
        let mut user = common::consented_user(subject, Default::default());
        user.account_status = status;
        state.db.upsert_user(&user).await.unwrap();

        let token = common::create_test_jwt(subject);
        let (code, body) = common::send(&app, "GET", "/api/user/privacy", Some(&token), None).await;
        assert_eq!(code, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "account_inactive");
    }
}

#[tokio::test]
async fn test_authenticated_request_touches_last_active() {
    let (app, state) = common::create_test_app();
    let stale = Utc::now() - Duration::days(2);
    let mut user: User = common::consented_user("auth0|active", Default::default());
    user.last_active = stale;
    state.db.upsert_user(&user).await.unwrap();

    let token = common::create_test_jwt("auth0|active");
    let (status, _) = common::send(&app, "GET", "/api/user/privacy", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let stored = state.db.get_user("auth0|active").await.unwrap().unwrap();
    assert!(stored.last_active > stale);
}

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let (app, _) = common::create_test_app();
    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::builder()
            .uri("/health")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
    assert_eq!(response.headers().get("X-Frame-Options").unwrap(), "DENY");
}
