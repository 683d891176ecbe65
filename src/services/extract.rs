// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Pure helpers applied to a fetched [`Document`].

use crate::models::crawler::{KeywordHits, KeywordSet};
use crate::services::fetcher::Document;
use url::Url;

/// Resolve navigation links against the crawl seed and keep those under it.
///
/// Only hrefs starting with `http://`, `https://` or `/` are considered. A
/// link is kept when it has the seed's origin and its path starts with the
/// seed's path. Fragments are dropped. Result is in first-seen order with
/// duplicates removed.
pub fn extract_links(seed: &Url, doc: &Document) -> Vec<Url> {
    let mut links: Vec<Url> = Vec::new();

    for href in &doc.nav_links {
        if !(href.starts_with("http://") || href.starts_with("https://") || href.starts_with('/'))
        {
            continue;
        }

        let Ok(mut link) = seed.join(href) else {
            tracing::debug!(href = %href, "Skipping unresolvable link");
            continue;
        };
        link.set_fragment(None);

        if link.origin() != seed.origin() || !link.path().starts_with(seed.path()) {
            continue;
        }
        if !links.contains(&link) {
            links.push(link);
        }
    }

    links
}

/// Mark every term that occurs in the document's visible text.
pub fn score_keywords(doc: &Document, keywords: &KeywordSet) -> KeywordHits {
    let mut hits = KeywordHits::empty(keywords);
    for term in keywords.terms() {
        if doc.text.contains(term.as_str()) {
            hits.mark(term);
        }
    }
    hits
}
