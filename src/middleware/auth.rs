// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token authentication middleware.

use crate::error::AppError;
use crate::models::User;
use crate::policy::{self, Consented};
use crate::services::VerifiedIdentity;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Authenticated caller, resolved to a stored user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: VerifiedIdentity,
    pub user: User,
}

/// An authenticated caller that passed the consent gate.
///
/// Extracting this runs the gate before any body extractor, so a caller
/// without valid consent is refused before its input is even looked at.
#[derive(Debug, Clone)]
pub struct ConsentedUser {
    auth: AuthUser,
    checked_at: DateTime<Utc>,
}

impl ConsentedUser {
    /// The gate proof, evaluated at the time of extraction.
    pub fn proof(&self) -> Result<Consented<'_>, AppError> {
        policy::authorize(&self.auth.user, self.checked_at)
    }

    pub fn auth(&self) -> &AuthUser {
        &self.auth
    }
}

impl<S> FromRequestParts<S> for ConsentedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)?;
        let checked_at = Utc::now();
        policy::authorize(&auth.user, checked_at)?;
        Ok(Self { auth, checked_at })
    }
}

/// Middleware that requires a valid identity provider token.
///
/// Resolves (or lazily creates) the user and inserts [`AuthUser`] into the
/// request extensions. Consent is not checked here.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = state
        .verifier
        .verify(request.headers().get(header::AUTHORIZATION))
        .await?;

    let user = state.accounts.resolve_user(&identity).await?;

    request
        .extensions_mut()
        .insert(AuthUser { identity, user });

    Ok(next.run(request).await)
}
