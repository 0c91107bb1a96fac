// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Explicit request validation.
//!
//! Request bodies are deserialized leniently into schema types whose fields
//! are [`Checked`], so a wrong type on one field never hides errors on the
//! others. Each schema then produces either its typed command or a
//! [`FieldErrors`] listing every failing field.

pub mod schema;

use crate::error::AppError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use validator::{ValidateLength, ValidateRange};

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted JSON path, e.g. `mood.scale`
    pub field: String,
    pub code: &'static str,
    pub message: String,
}

/// Every validation failure found in a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.iter().map(|e| e.field.as_str()).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl FieldErrors {
    pub fn single(field: impl Into<String>, code: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, code, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, code: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            code,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// A field that must be present and well-typed.
    pub fn required<T>(&mut self, field: &str, value: Checked<T>, message: &str) -> Option<T> {
        match value {
            Checked::Present(v) => Some(v),
            Checked::Absent => {
                self.push(field, "required", message);
                None
            }
            Checked::Invalid(_) => {
                self.push(field, "invalid_type", message);
                None
            }
        }
    }

    /// A field that may be omitted but must be well-typed when given.
    pub fn optional<T>(&mut self, field: &str, value: Checked<T>, message: &str) -> Option<T> {
        match value {
            Checked::Present(v) => Some(v),
            Checked::Absent => None,
            Checked::Invalid(_) => {
                self.push(field, "invalid_type", message);
                None
            }
        }
    }

    /// Keep `value` only if it lies in `min..=max`.
    pub fn in_range<T>(&mut self, field: &str, value: Option<T>, min: T, max: T) -> Option<T>
    where
        T: ValidateRange<T> + PartialOrd + Copy + fmt::Display,
    {
        let value = value?;
        if value.validate_range(Some(min), Some(max), None, None) {
            Some(value)
        } else {
            self.push(field, "range", format!("must be between {min} and {max}"));
            None
        }
    }

    /// Keep `value` only if its character count lies in `min..=max`.
    pub fn with_length(
        &mut self,
        field: &str,
        value: Option<String>,
        min: u64,
        max: u64,
    ) -> Option<String> {
        let value = value?;
        if value.validate_length(Some(min), Some(max), None) {
            Some(value)
        } else if min > 0 && value.is_empty() {
            self.push(field, "required", "must not be empty");
            None
        } else {
            self.push(field, "length", format!("must be at most {max} characters"));
            None
        }
    }

    /// Finish validation: `ok` when nothing failed.
    pub fn finish<T>(self, ok: impl FnOnce() -> T) -> Result<T, AppError> {
        if self.is_empty() {
            Ok(ok())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

/// A leniently deserialized field: absent (missing or `null`), present with
/// the expected type, or present with the wrong type.
#[derive(Debug, Clone, PartialEq)]
pub enum Checked<T> {
    Absent,
    Present(T),
    Invalid(String),
}

impl<T> Default for Checked<T> {
    fn default() -> Self {
        Checked::Absent
    }
}

impl<T> Checked<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Checked::Absent)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Checked<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(Checked::Absent);
        }
        Ok(match serde_json::from_value(value) {
            Ok(v) => Checked::Present(v),
            Err(e) => Checked::Invalid(e.to_string()),
        })
    }
}

/// A request schema that validates into a typed command.
pub trait Schema: DeserializeOwned {
    type Output;

    fn validate(self) -> Result<Self::Output, AppError>;
}

/// JSON body extractor that runs the schema's validation and rejects with
/// a structured validation error.
pub struct ValidJson<S: Schema>(pub S::Output);

impl<St, S> FromRequest<St> for ValidJson<S>
where
    S: Schema,
    St: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
        let Json(schema) = Json::<S>::from_request(req, state)
            .await
            .map_err(body_rejection)?;
        schema.validate().map(ValidJson)
    }
}

/// Query string extractor with the same validation contract as [`ValidJson`].
pub struct ValidQuery<S: Schema>(pub S::Output);

impl<St, S> FromRequestParts<St> for ValidQuery<S>
where
    S: Schema,
    St: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &St) -> Result<Self, Self::Rejection> {
        let Query(schema) = Query::<S>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::invalid_field("query", "malformed", "Invalid query string"))?;
        schema.validate().map(ValidQuery)
    }
}

fn body_rejection(rejection: JsonRejection) -> AppError {
    let message = match rejection {
        JsonRejection::JsonDataError(_) => "Request body must be a JSON object",
        JsonRejection::JsonSyntaxError(_) => "Malformed JSON",
        JsonRejection::MissingJsonContentType(_) => {
            "Missing or invalid Content-Type header. Expected 'application/json'"
        }
        JsonRejection::BytesRejection(_) => "Failed to read request body",
        _ => "Invalid JSON request",
    };
    AppError::invalid_field("body", "malformed", message)
}
