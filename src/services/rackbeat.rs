// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Daily import of inventory lots from Rackbeat into the product catalog.

use crate::models::lot::{newest_lot_revisions, Lot, LotsResponse};
use crate::services::product_db::ProductRepository;
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_RACKBEAT_BASE_URL: &str = "https://app.rackbeat.com/api";
const LOTS_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_RACKBEAT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RackbeatConfig {
    pub api_key: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl RackbeatConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: env::var("RACKBEAT_API_KEY").context("RACKBEAT_API_KEY must be set")?,
            base_url: env::var("RACKBEAT_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_RACKBEAT_BASE_URL.to_string()),
            request_timeout: match env::var("RACKBEAT_TIMEOUT_SECS") {
                Ok(secs) => Duration::from_secs(
                    secs.parse()
                        .context("RACKBEAT_TIMEOUT_SECS must be a valid number")?,
                ),
                Err(_) => DEFAULT_RACKBEAT_TIMEOUT,
            },
        })
    }
}

pub struct RackbeatClient {
    config: RackbeatConfig,
    http: reqwest::Client,
}

impl RackbeatClient {
    pub fn new(config: RackbeatConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build Rackbeat HTTP client")?;
        Ok(Self { config, http })
    }

    pub fn lots_url(&self) -> String {
        format!(
            "{}/lots?limit={}",
            self.config.base_url.trim_end_matches('/'),
            LOTS_PAGE_LIMIT
        )
    }

    pub async fn fetch_lots(&self) -> Result<Vec<Lot>> {
        let response = self
            .http
            .get(self.lots_url())
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .context("Failed to request lots from Rackbeat")?
            .error_for_status()
            .context("Rackbeat rejected the lots request")?;

        let body: LotsResponse = response
            .json()
            .await
            .context("Failed to decode Rackbeat lots")?;
        Ok(body.lots)
    }
}

/// Fetch lots, keep the newest revision per serial, and upsert them as products.
/// Returns the number of products written.
pub async fn sync_lots(client: &RackbeatClient, products: &ProductRepository) -> Result<usize> {
    let lots = client.fetch_lots().await?;
    let newest = newest_lot_revisions(&lots);
    tracing::info!(
        lots = lots.len(),
        products = newest.len(),
        "Fetched lots from Rackbeat"
    );

    products.upsert_lots(&newest).await?;
    Ok(newest.len())
}
