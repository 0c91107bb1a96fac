// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use campus_journal::config::Config;
use campus_journal::db::{FirestoreDb, MemoryDb, Store};
use campus_journal::models::{
    EntryAnalytics, EntryBody, EntryContext, EntryPrivacy, JournalEntry, Mood, PrivacySettings,
    Prompts, User,
};
use campus_journal::routes::create_router;
use campus_journal::services::{MemoryRelay, MoodRelay, OidcVerifier};
use campus_journal::AppState;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Key id of the fixed test signing key.
pub const TEST_KID: &str = "test-key";

const PRIVATE_KEY_PEM: &str = include_str!("../fixtures/test_rsa_private.pem");
const PUBLIC_KEY_PEM: &str = include_str!("../fixtures/test_rsa_public.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Verifier that trusts only the fixed test key.
#[allow(dead_code)]
pub fn test_verifier(config: &Config) -> OidcVerifier {
    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY_PEM.as_bytes()).expect("test public key");
    OidcVerifier::new_with_static_key(config, TEST_KID, key).expect("static verifier")
}

/// Create a test app over an in-memory store and relay.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    let config = Config::test_default();
    let relay = Arc::new(MemoryRelay::new(config.relay_channel_capacity));
    create_test_app_with(Arc::new(MemoryDb::new()), relay)
}

/// Create a test app over the given store and relay.
#[allow(dead_code)]
pub fn create_test_app_with(
    db: Arc<dyn Store>,
    relay: Arc<dyn MoodRelay>,
) -> (Router, Arc<AppState>) {
    let config = Config::test_default();
    let verifier = Arc::new(test_verifier(&config));
    let state = Arc::new(AppState::new(config, db, verifier, relay));
    (create_router(state.clone()), state)
}

/// Sign arbitrary claims with the test key.
#[allow(dead_code)]
pub fn sign_claims(claims: &Value, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY_PEM.as_bytes()).expect("test private key");
    encode(&header, claims, &key).expect("sign test token")
}

/// Valid claims for `subject`, issued for the test configuration.
#[allow(dead_code)]
pub fn test_claims(subject: &str) -> Value {
    let config = Config::test_default();
    let now = Utc::now().timestamp();
    json!({
        "iss": config.auth_issuer(),
        "aud": config.auth_audience,
        "sub": subject,
        "iat": now,
        "exp": now + 3600,
        "email": format!("{}@example.edu", subject.replace('|', "_")),
        "name": "Test Student",
    })
}

/// Create a valid access token for `subject`.
#[allow(dead_code)]
pub fn create_test_jwt(subject: &str) -> String {
    sign_claims(&test_claims(subject), TEST_KID)
}

/// A user who consented just now with the given settings.
#[allow(dead_code)]
pub fn consented_user(subject: &str, settings: PrivacySettings) -> User {
    let now = Utc::now();
    let mut user = User::new(subject, "digest", Some("Test Student"), now);
    user.consent_version = Some("2026-01".to_string());
    user.consent_date = Some(now);
    user.privacy_settings = settings;
    user
}

/// Store a consented user and return it.
#[allow(dead_code)]
pub async fn seed_consented_user(
    state: &AppState,
    subject: &str,
    settings: PrivacySettings,
) -> User {
    let user = consented_user(subject, settings);
    state.db.upsert_user(&user).await.expect("seed user");
    user
}

/// Settings with analytics enabled.
#[allow(dead_code)]
pub fn analytics_settings() -> PrivacySettings {
    PrivacySettings {
        data_retention_days: 365,
        analytics_opt_in: true,
        share_anonymized_data: true,
    }
}

/// A minimal entry owned by `owner`.
#[allow(dead_code)]
pub fn entry(id: &str, owner: &str, mood: u8, created_at: DateTime<Utc>) -> JournalEntry {
    JournalEntry {
        id: id.to_string(),
        user_id: owner.to_string(),
        entry: EntryBody {
            content: format!("entry {id}"),
            mood: Mood {
                scale: mood,
                colors: vec![],
                tags: vec![],
            },
            prompts: Prompts::default(),
            context: EntryContext::default(),
        },
        privacy: EntryPrivacy::default(),
        analytics: EntryAnalytics::default(),
        expires_at: None,
        created_at,
        updated_at: created_at,
    }
}

/// Send a request and decode the JSON response (`Null` for empty bodies).
#[allow(dead_code)]
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Consent payload accepted by `POST /api/auth/consent`.
#[allow(dead_code)]
pub fn consent_body(retention_days: u32, analytics: bool, share: bool) -> Value {
    json!({
        "consentVersion": "2026-01",
        "analyticsOptIn": analytics,
        "shareAnonymizedData": share,
        "dataRetentionDays": retention_days,
    })
}
