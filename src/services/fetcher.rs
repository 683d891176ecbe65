// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Page fetching for the site crawler.
//!
//! A fetched page is parsed once into a [`Document`] holding only what the
//! crawler needs: the lower-cased visible text and the raw navigation hrefs.
//! The `scraper` tree itself is dropped before returning, so documents can be
//! held across await points.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Regions of a page that hold site navigation
pub const NAV_LINK_SELECTORS: [&str; 5] = [
    "nav a[href]",
    "header a[href]",
    "footer a[href]",
    "a.nav-link[href]",
    "a.menu-link[href]",
];

const HIDDEN_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Why a single page could not be used. Never fatal to a crawl.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("{url} is not an HTML page ({content_type})")]
    NotHtml { url: String, content_type: String },
    #[error("could not read body of {url}: {reason}")]
    Body { url: String, reason: String },
}

/// Parsed page content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Visible body text, lower-cased, with whitespace runs collapsed
    pub text: String,
    /// Raw `href` values from navigation regions, first-seen order, no duplicates
    pub nav_links: Vec<String>,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        let html = Html::parse_document(html);
        Self {
            text: visible_text(&html),
            nav_links: nav_hrefs(&html),
        }
    }
}

fn visible_text(html: &Html) -> String {
    let Ok(body) = Selector::parse("body") else {
        return String::new();
    };

    // Text nodes are joined as written, so `<b>Fa</b>nuc` reads as one word
    let mut raw = String::new();
    for root in html.select(&body) {
        for node in root.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
            });
            if !hidden {
                raw.push_str(text);
            }
        }
    }

    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn nav_hrefs(html: &Html) -> Vec<String> {
    let mut hrefs: Vec<String> = Vec::new();
    for css in NAV_LINK_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for element in html.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                let href = href.trim();
                if !href.is_empty() && !hrefs.iter().any(|h| h == href) {
                    hrefs.push(href.to_string());
                }
            }
        }
    }
    hrefs
}

/// Source of parsed pages
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &Url) -> Result<Document, FetchFailure>;
}

/// Fetches pages over HTTP(S) with reqwest
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<Document, FetchFailure> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| request_failure(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // A missing content type is treated as HTML
        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !content_type.to_ascii_lowercase().contains("html") {
                return Err(FetchFailure::NotHtml {
                    url: url.to_string(),
                    content_type: content_type.to_string(),
                });
            }
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchFailure::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchFailure::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(Document::parse(&body))
    }
}

fn request_failure(url: &Url, error: reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchFailure::Transport {
            url: url.to_string(),
            reason: error.to_string(),
        }
    }
}
