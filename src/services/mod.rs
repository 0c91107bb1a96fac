// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod account;
pub mod analytics;
pub mod identity;
pub mod journal;
pub mod relay;

pub use account::AccountService;
pub use analytics::AnalyticsService;
pub use identity::{IdentityError, OidcVerifier, VerifiedIdentity};
pub use journal::JournalService;
pub use relay::{MemoryRelay, MoodRelay, RelayError, RelayEvent};
