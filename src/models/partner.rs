// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::media::{rewrite_media_field, PARTNER_IMAGES};
use serde::{Deserialize, Serialize};

/// Hardware compatibility flags of a partner (one column per robot brand)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartnerHcl {
    pub universal: Option<i64>,
    pub kassow: Option<i64>,
    pub tm_omron: Option<i64>,
    pub kuka: Option<i64>,
    pub abb: Option<i64>,
    pub fanuc: Option<i64>,
    pub doosan: Option<i64>,
    pub aim_robotics: Option<i64>,
}

/// Integrator or reseller listed on the website
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub id: i64,
    pub company: Option<String>,
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub img_url: Option<String>,
    pub is_integrator: Option<i64>,
    pub hcl: PartnerHcl,
}

impl Partner {
    /// Turn the stored logo file name into a public URL.
    pub fn with_media_urls(mut self, server: &str) -> Self {
        rewrite_media_field(&mut self.img_url, server, PARTNER_IMAGES);
        self
    }

    /// Single-line address used for geocoding: "address, city, country".
    pub fn postal_address(&self) -> String {
        [&self.address, &self.city, &self.country]
            .iter()
            .map(|part| part.as_deref().unwrap_or("").trim())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Name for log lines, falls back to the id
    pub fn display_name(&self) -> String {
        match self.company.as_deref() {
            Some(company) if !company.is_empty() => company.to_string(),
            _ => format!("partner #{}", self.id),
        }
    }
}

/// Response of `GET /api/partners/all`
#[derive(Debug, Serialize, Deserialize)]
pub struct PartnersResponse {
    pub partners: Vec<Partner>,
}
