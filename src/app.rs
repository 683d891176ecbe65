// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, the shared-secret extractor, catalog route handlers, and
//! router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::models::partner::PartnersResponse;
use crate::models::product::ProductsResponse;
use crate::models::version::VersionResponse;
use crate::routes::forms_router;
use crate::services::auth_middleware::{check_secret_header, ApiError};
use crate::services::hubspot::FormForwarder;
use crate::services::partner_db::PartnerRepository;
use crate::services::product_db::ProductRepository;
use anyhow::{Context, Result};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `CATALOG_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("CATALOG_VERSION");

pub const AGENT_NAME: &str = "catalog-agent";

const NOT_FOUND_PAGE: &str = "<!DOCTYPE html>\
<html><head><title>Page not found</title></head>\
<body><h1>404</h1><p>The page you are looking for does not exist.</p></body></html>";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Settings of the HTTP server and its databases
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub secret_key: String,
    /// Public base URL that media file names are joined onto
    pub public_base_url: String,
    /// Directory holding `crm.db` and `rackbeat.db`
    pub database_dir: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            secret_key: env::var("SECRET_KEY").context("SECRET_KEY must be set")?,
            public_base_url: env::var("SERVER").context("SERVER must be set")?,
            database_dir: Self::database_dir_from_env()?,
        })
    }

    /// `DATABASE_DIR` alone, for commands that do not serve HTTP
    pub fn database_dir_from_env() -> Result<PathBuf> {
        env::var("DATABASE_DIR")
            .map(PathBuf::from)
            .context("DATABASE_DIR must be set")
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub partners: Arc<PartnerRepository>,
    pub products: Arc<ProductRepository>,
    /// CRM the website forms are forwarded to
    pub forwarder: Arc<dyn FormForwarder>,
    pub secret_key: Arc<str>,
    pub public_base_url: Arc<str>,
}

// ---------------------------------------------------------------------------
// Shared-secret extractor
// ---------------------------------------------------------------------------

/// Axum extractor that only succeeds when the request carries the configured
/// `secret-key` header. Rejections are 400 `{errors: [...]}`.
pub struct ApiAccess;

impl FromRequestParts<AppState> for ApiAccess {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        check_secret_header(&parts.headers, &state.secret_key).map(|()| ApiAccess)
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

pub async fn version_handler() -> Json<VersionResponse> {
    Json(VersionResponse {
        agent: AGENT_NAME.to_string(),
        version: VERSION.to_string(),
    })
}

async fn products_response(
    state: &AppState,
    current_only: bool,
) -> Result<Json<ProductsResponse>, ApiError> {
    let products = state
        .products
        .list_products(current_only)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "Error sending products");
            ApiError::Failed(e.to_string())
        })?;

    Ok(Json(ProductsResponse {
        products: products
            .into_iter()
            .map(|p| p.with_media_urls(&state.public_base_url))
            .collect(),
    }))
}

pub async fn current_products_handler(
    _access: ApiAccess,
    State(state): State<AppState>,
) -> Result<Json<ProductsResponse>, ApiError> {
    products_response(&state, true).await
}

pub async fn all_products_handler(
    _access: ApiAccess,
    State(state): State<AppState>,
) -> Result<Json<ProductsResponse>, ApiError> {
    products_response(&state, false).await
}

pub async fn partners_handler(
    _access: ApiAccess,
    State(state): State<AppState>,
) -> Result<Json<PartnersResponse>, ApiError> {
    let partners = state.partners.list_partners().await.map_err(|e| {
        tracing::error!(error = ?e, "Error sending partners");
        ApiError::Failed(e.to_string())
    })?;

    Ok(Json(PartnersResponse {
        partners: partners
            .into_iter()
            .map(|p| p.with_media_urls(&state.public_base_url))
            .collect(),
    }))
}

pub async fn not_found_handler() -> (StatusCode, Html<&'static str>) {
    (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE))
}

/// Any origin may call the API. Preflight requests are answered directly.
async fn allow_any_origin(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET,HEAD,POST,OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("content-type,secret-key"),
        );
        return response;
    }

    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/version", get(version_handler))
        .route("/api/products/current", get(current_products_handler))
        .route("/api/products/all", get(all_products_handler))
        .route("/api/partners/all", get(partners_handler))
        .nest("/api/forms", forms_router())
        .fallback(not_found_handler)
        .with_state(state)
        .layer(middleware::from_fn(allow_any_origin))
}
