// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::media::{rewrite_media_field, BLUEPRINTS, SETUP_VIDEOS};
use serde::{Deserialize, Serialize};

/// One value per supported robot brand
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrandValues<T> {
    pub universal: Option<T>,
    pub kassow: Option<T>,
    pub tm_omron: Option<T>,
    pub kuka: Option<T>,
    pub abb: Option<T>,
    pub fanuc: Option<T>,
    pub doosan: Option<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDescription {
    pub name_sub: Option<String>,
    pub desc_short: Option<String>,
    pub desc_long: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductMedia {
    pub blueprint: Option<String>,
    pub img_url: Option<String>,
    pub setup_vid_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDocs {
    pub protocols: BrandValues<String>,
    pub datasheet: Option<String>,
    pub files: Option<String>,
    pub manual: Option<String>,
    pub software: BrandValues<String>,
}

/// Catalog entry as served to the website
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub revision: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    /// Zero-based: the stored category id minus one
    pub category_id: Option<i64>,
    pub sw_version: Option<String>,
    pub is_current: Option<i64>,
    pub interface: Option<String>,
    pub related_products: Option<String>,
    pub description: ProductDescription,
    pub media: ProductMedia,
    pub hcl: BrandValues<i64>,
    pub badges: Vec<Option<String>>,
    pub docs: ProductDocs,
    pub features: Vec<Option<String>>,
    pub faq: Vec<Option<String>>,
}

impl Product {
    /// Turn stored media file names into public URLs.
    pub fn with_media_urls(mut self, server: &str) -> Self {
        rewrite_media_field(&mut self.media.setup_vid_url, server, SETUP_VIDEOS);
        rewrite_media_field(&mut self.media.blueprint, server, BLUEPRINTS);
        self
    }
}

/// Response of `GET /api/products/*`
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_media_urls_leaves_image_untouched() {
        let product = Product {
            id: "100".to_string(),
            media: ProductMedia {
                blueprint: Some("bp.pdf".to_string()),
                img_url: Some("https://cdn.example.com/p.png".to_string()),
                setup_vid_url: None,
            },
            ..Default::default()
        };

        let product = product.with_media_urls("https://api.example.com");
        assert_eq!(
            product.media.blueprint.as_deref(),
            Some("https://api.example.com/images/blueprints/bp.pdf")
        );
        assert_eq!(
            product.media.img_url.as_deref(),
            Some("https://cdn.example.com/p.png")
        );
        assert_eq!(product.media.setup_vid_url, None);
    }
}
