// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Website form route handlers.
//!
//! The website posts forms either as JSON or as `multipart/form-data`.

use crate::app::{ApiAccess, AppState};
use crate::models::forms::{FormKind, FormReceivedResponse, FormSubmission};
use crate::services::auth_middleware::ApiError;
use crate::services::logging::anonymize_email;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    routing::post,
    Json, Router,
};
use serde_json::{Map, Value};

/// Create forms router. Nested under `/api/forms`.
pub fn forms_router() -> Router<AppState> {
    Router::new()
        .route("/contact", post(contact_form_handler))
        .route("/support", post(support_form_handler))
        .route("/partner", post(partner_form_handler))
}

async fn contact_form_handler(
    _access: ApiAccess,
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<FormReceivedResponse>, ApiError> {
    receive_form(&state, FormKind::Contact, request).await
}

async fn support_form_handler(
    _access: ApiAccess,
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<FormReceivedResponse>, ApiError> {
    receive_form(&state, FormKind::Support, request).await
}

async fn partner_form_handler(
    _access: ApiAccess,
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<FormReceivedResponse>, ApiError> {
    receive_form(&state, FormKind::Partner, request).await
}

/// Validate a form body and forward it to the CRM.
async fn receive_form(
    state: &AppState,
    kind: FormKind,
    request: Request,
) -> Result<Json<FormReceivedResponse>, ApiError> {
    let body = form_body(request).await;
    let submission = FormSubmission::validate(kind, &body).map_err(ApiError::Validation)?;

    let email = anonymize_email(submission.value("email"));
    state.forwarder.forward(&submission).await.map_err(|e| {
        tracing::error!(form = %kind, email = %email, error = ?e, "Error forwarding form");
        ApiError::Failed(e.to_string())
    })?;

    tracing::info!(form = %kind, email = %email, "Form forwarded");
    Ok(Json(FormReceivedResponse {
        message: format!("{kind} form data received"),
    }))
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// Read the body into a JSON value. A body that cannot be read is
/// validated as an empty one, so every required field is reported.
async fn form_body(request: Request) -> Value {
    if is_multipart(&request) {
        let fields = match Multipart::from_request(request, &()).await {
            Ok(multipart) => multipart_fields(multipart).await.map_err(|e| e.to_string()),
            Err(rejection) => Err(rejection.to_string()),
        };
        return fields.unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Unreadable multipart form body");
            Value::Null
        });
    }

    match Bytes::from_request(request, &()).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable form body");
            Value::Null
        }
    }
}

/// Text fields of a multipart body as a JSON object. File parts are ignored.
async fn multipart_fields(mut multipart: Multipart) -> Result<Value, MultipartError> {
    let mut fields = Map::new();
    while let Some(field) = multipart.next_field().await? {
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field.text().await?;
        fields.insert(name, Value::String(value));
    }
    Ok(Value::Object(fields))
}
