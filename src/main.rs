// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Campus Journal API Server
//!
//! Private mood journaling with consent-gated analytics and automatic
//! data retention.

use anyhow::Context;
use campus_journal::{
    config::{Config, StorageBackend},
    db::{self, FirestoreDb, MemoryDb, Store},
    error::set_expose_details,
    services::{MemoryRelay, MoodRelay, OidcVerifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env().context("Failed to load configuration")?;
    set_expose_details(config.environment.is_development());
    tracing::info!(
        port = config.port,
        environment = ?config.environment,
        storage = ?config.storage_backend,
        "Starting Campus Journal API"
    );

    let db: Arc<dyn Store> = match config.storage_backend {
        StorageBackend::Firestore => {
            let firestore = FirestoreDb::new(&config.gcp_project_id)
                .await
                .context("Failed to connect to Firestore")?;
            // Expiry is enforced by the Firestore TTL policy on expiresAt.
            Arc::new(firestore)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            let memory: Arc<dyn Store> = Arc::new(MemoryDb::new());
            db::spawn_expiry_sweeper(memory.clone(), config.expiry_sweep_interval);
            tracing::info!(
                interval_secs = config.expiry_sweep_interval.as_secs(),
                "Expiry sweeper started"
            );
            memory
        }
    };

    let verifier =
        Arc::new(OidcVerifier::new(&config).context("Failed to initialize token verifier")?);

    let relay: Arc<dyn MoodRelay> = Arc::new(MemoryRelay::new(config.relay_channel_capacity));

    let port = config.port;
    let state = Arc::new(AppState::new(config, db, verifier, relay));

    let app = campus_journal::routes::create_router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("campus_journal=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .try_init()?;
    Ok(())
}
