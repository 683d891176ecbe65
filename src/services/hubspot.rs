// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Forwarding of website forms to the HubSpot forms API.

use crate::models::forms::{CrmSubmission, FormKind, FormSubmission};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::env;
use std::time::Duration;

pub const DEFAULT_HUBSPOT_BASE_URL: &str =
    "https://api.hsforms.com/submissions/v3/integration/submit";
pub const DEFAULT_HUBSPOT_TIMEOUT: Duration = Duration::from_secs(10);

/// Hands a validated form to the CRM
#[async_trait]
pub trait FormForwarder: Send + Sync {
    async fn forward(&self, submission: &FormSubmission) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HubSpotConfig {
    pub api_key: String,
    pub portal_id: String,
    pub contact_form_guid: String,
    pub support_form_guid: String,
    pub partner_form_guid: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl HubSpotConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: env::var("HUBSPOT_API_KEY").context("HUBSPOT_API_KEY must be set")?,
            portal_id: env::var("HUBSPOT_PORTAL_ID").context("HUBSPOT_PORTAL_ID must be set")?,
            contact_form_guid: env::var("HUBSPOT_CONTACT_FORM_GUID")
                .context("HUBSPOT_CONTACT_FORM_GUID must be set")?,
            support_form_guid: env::var("HUBSPOT_SUPPORT_FORM_GUID")
                .context("HUBSPOT_SUPPORT_FORM_GUID must be set")?,
            partner_form_guid: env::var("HUBSPOT_PARTNER_FORM_GUID")
                .context("HUBSPOT_PARTNER_FORM_GUID must be set")?,
            base_url: env::var("HUBSPOT_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_HUBSPOT_BASE_URL.to_string()),
            request_timeout: match env::var("HUBSPOT_TIMEOUT_SECS") {
                Ok(secs) => Duration::from_secs(
                    secs.parse()
                        .context("HUBSPOT_TIMEOUT_SECS must be a valid number")?,
                ),
                Err(_) => DEFAULT_HUBSPOT_TIMEOUT,
            },
        })
    }

    fn form_guid(&self, kind: FormKind) -> &str {
        match kind {
            FormKind::Contact => &self.contact_form_guid,
            FormKind::Support => &self.support_form_guid,
            FormKind::Partner => &self.partner_form_guid,
        }
    }
}

pub struct HubSpotClient {
    config: HubSpotConfig,
    http: reqwest::Client,
}

impl HubSpotClient {
    pub fn new(config: HubSpotConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HubSpot HTTP client")?;
        Ok(Self { config, http })
    }

    /// `{base}/{portal}/{form guid}`
    pub fn submission_url(&self, kind: FormKind) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.portal_id,
            self.config.form_guid(kind)
        )
    }
}

#[async_trait]
impl FormForwarder for HubSpotClient {
    async fn forward(&self, submission: &FormSubmission) -> Result<()> {
        let body = CrmSubmission::from(submission);
        let response = self
            .http
            .post(self.submission_url(submission.kind))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to submit {} form", submission.kind))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "HubSpot rejected {} form with status {}: {}",
                submission.kind,
                status,
                detail
            );
        }
        Ok(())
    }
}
