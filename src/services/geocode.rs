// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Partner address lookup with the Mapbox forward geocoding API.

use crate::models::geocode::{Coordinates, GeocodingResponse};
use crate::services::partner_db::PartnerRepository;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;
use url::Url;

pub const DEFAULT_MAPBOX_BASE_URL: &str = "https://api.mapbox.com";
pub const DEFAULT_MAPBOX_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub access_token: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl GeocodingConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            access_token: env::var("MAPBOX_ACCESS_TOKEN")
                .context("MAPBOX_ACCESS_TOKEN must be set")?,
            base_url: env::var("MAPBOX_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_MAPBOX_BASE_URL.to_string()),
            request_timeout: DEFAULT_MAPBOX_TIMEOUT,
        })
    }
}

pub struct GeocodingClient {
    config: GeocodingConfig,
    http: reqwest::Client,
}

impl GeocodingClient {
    pub fn new(config: GeocodingConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build geocoding HTTP client")?;
        Ok(Self { config, http })
    }

    /// `{base}/geocoding/v5/mapbox.places/{address}.json?access_token=...`
    /// with the address percent-encoded as one path segment.
    pub fn request_url(&self, address: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .with_context(|| format!("Invalid geocoding base URL {}", self.config.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Geocoding base URL cannot have a path"))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places", &format!("{address}.json")]);
        url.query_pairs_mut()
            .append_pair("access_token", &self.config.access_token);
        Ok(url)
    }

    async fn lookup(&self, address: &str) -> Result<Option<Coordinates>> {
        let response: GeocodingResponse = self
            .http
            .get(self.request_url(address)?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.first_coordinates())
    }

    /// Coordinates of the best match, `None` when nothing matched or the
    /// request failed.
    pub async fn geocode(&self, address: &str) -> Option<Coordinates> {
        match self.lookup(address).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "Geocoding failed");
                None
            }
        }
    }
}

/// Result of geocoding one partner
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPartner {
    pub id: i64,
    pub address: String,
    pub coordinates: Option<Coordinates>,
}

/// Geocode every partner's postal address. With `write`, found coordinates
/// are stored on the partner.
pub async fn geocode_partners(
    client: &GeocodingClient,
    partners: &PartnerRepository,
    write: bool,
) -> Result<Vec<GeocodedPartner>> {
    let mut results = Vec::new();
    for partner in partners.list_partners().await? {
        let address = partner.postal_address();
        let coordinates = client.geocode(&address).await;

        match coordinates {
            Some(c) => tracing::info!(
                partner_id = partner.id,
                "Address: {}, Latitude: {}, Longitude: {}",
                address,
                c.latitude,
                c.longitude
            ),
            None => tracing::info!(partner_id = partner.id, "Address: {}, not found", address),
        }

        if let (true, Some(c)) = (write, coordinates) {
            partners
                .update_coordinates(partner.id, c.latitude, c.longitude)
                .await?;
        }

        results.push(GeocodedPartner {
            id: partner.id,
            address,
            coordinates,
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::db::Database;
    use axum::extract::{Path, Query};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn client(base_url: &str) -> GeocodingClient {
        GeocodingClient::new(GeocodingConfig {
            access_token: "pk.test".to_string(),
            base_url: base_url.to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    async fn spawn_mapbox() -> String {
        let app = Router::new().route(
            "/geocoding/v5/mapbox.places/{query}",
            get(
                |Path(query): Path<String>, Query(params): Query<HashMap<String, String>>| async move {
                    if params.get("access_token").map(String::as_str) != Some("pk.test") {
                        return Json(json!({"message": "Not Authorized"}));
                    }
                    let features: Vec<Value> = if query.starts_with("Main Street 1") {
                        vec![json!({"geometry": {"coordinates": [10.38, 55.4]}})]
                    } else {
                        vec![]
                    };
                    Json(json!({ "features": features }))
                },
            ),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_request_url_encodes_address() {
        let url = client("https://api.mapbox.com")
            .request_url("Main Street 1, Odense/C, Denmark")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.mapbox.com/geocoding/v5/mapbox.places/Main%20Street%201,%20Odense%2FC,%20Denmark.json?access_token=pk.test"
        );
    }

    #[tokio::test]
    async fn test_geocode_partners_writes_found_coordinates() {
        let base = spawn_mapbox().await;
        let db = Database::in_memory().await.unwrap();
        db.bootstrap_crm().await.unwrap();
        sqlx::query(
            "INSERT INTO partners (id, address, city, country) VALUES \
             (1, 'Main Street 1', 'Odense', 'Denmark'), (2, 'Nowhere 9', 'Atlantis', 'Sea')",
        )
        .execute(db.pool())
        .await
        .unwrap();
        let partners = PartnerRepository::new(db);

        let results = geocode_partners(&client(&base), &partners, true)
            .await
            .unwrap();

        assert_eq!(results[0].address, "Main Street 1, Odense, Denmark");
        assert_eq!(
            results[0].coordinates,
            Some(Coordinates {
                latitude: 55.4,
                longitude: 10.38
            })
        );
        assert_eq!(results[1].coordinates, None);

        let stored = partners.list_partners().await.unwrap();
        assert_eq!(stored[0].latitude, Some(55.4));
        assert_eq!(stored[1].latitude, None);
    }

    #[tokio::test]
    async fn test_geocode_returns_none_on_error() {
        let base = spawn_mapbox().await;
        let mut bad = client(&base);
        bad.config.access_token = "wrong".to_string();
        assert_eq!(bad.geocode("Main Street 1, Odense, Denmark").await, None);
    }
}
