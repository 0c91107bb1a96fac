// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Privacy, consent and retention policy.

pub mod aggregation;
pub mod anonymize;
pub mod consent;
pub mod recommendations;
pub mod retention;

pub use consent::{authorize, require_analytics_opt_in, Consented, ConsentDenial};
