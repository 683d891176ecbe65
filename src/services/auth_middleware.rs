// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Shared-secret check and API error responses for Axum.
//!
//! Every `/api/*` request carries the site's secret in the `secret-key`
//! header. Failures are answered the way the website client expects:
//! - `ApiError::Validation`: 400 with `{errors: [{location, path, msg}]}`
//! - `ApiError::Failed`: 400 with `{error: "<message>"}`

use crate::models::forms::{ErrorResponse, FieldError, ValidationErrorsResponse};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use sha2::{Digest, Sha256};

/// Header holding the shared secret
pub const SECRET_HEADER: &str = "secret-key";

/// Compare a provided secret with the configured one.
///
/// Digests are compared so the check does not depend on where the first
/// differing byte is. An empty configured secret never matches.
pub fn secret_matches(provided: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    Sha256::digest(provided.as_bytes()) == Sha256::digest(expected.as_bytes())
}

/// Check the `secret-key` header of a request.
pub fn check_secret_header(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    let provided = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if secret_matches(provided, expected) {
        Ok(())
    } else {
        Err(ApiError::Validation(vec![FieldError::invalid_header(
            SECRET_HEADER,
        )]))
    }
}

/// API error responses
#[derive(Debug)]
pub enum ApiError {
    /// Request failed validation (header or body fields)
    Validation(Vec<FieldError>),
    /// The request was valid but the operation failed
    Failed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationErrorsResponse { errors }),
            )
                .into_response(),
            ApiError::Failed(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
        }
    }
}
