// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Campus Journal: private mood journaling for students
//!
//! This crate provides the backend API for structured journal entries,
//! personal and anonymized campus analytics, and the consent, retention and
//! anonymization rules that govern that data.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod validation;

use config::Config;
use db::Store;
use services::{AccountService, AnalyticsService, JournalService, MoodRelay, OidcVerifier};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub verifier: Arc<OidcVerifier>,
    pub relay: Arc<dyn MoodRelay>,
    pub accounts: AccountService,
    pub journal: JournalService,
    pub analytics: AnalyticsService,
}

impl AppState {
    /// Wire the services over a storage backend and relay.
    pub fn new(
        config: Config,
        db: Arc<dyn Store>,
        verifier: Arc<OidcVerifier>,
        relay: Arc<dyn MoodRelay>,
    ) -> Self {
        let accounts = AccountService::new(db.clone(), config.email_hash_key.clone());
        let journal = JournalService::new(db.clone(), relay.clone());
        let analytics = AnalyticsService::new(db.clone());

        Self {
            config,
            db,
            verifier,
            relay,
            accounts,
            journal,
            analytics,
        }
    }
}
