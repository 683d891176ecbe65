// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Robot brands searched for on partner websites.
pub const DEFAULT_KEYWORDS: [&str; 7] = [
    "universal", "kassow", "fanuc", "abb", "doosan", "kuka", "omron",
];

/// Ordered set of lower-cased search terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    terms: Vec<String>,
}

impl KeywordSet {
    /// Build a keyword set, lower-casing terms and dropping blanks and duplicates.
    /// The first occurrence of a term fixes its position.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if !term.is_empty() && !normalized.contains(&term) {
                normalized.push(term);
            }
        }
        Self { terms: normalized }
    }

    /// Parse a comma separated list, e.g. `"fanuc, kuka"`
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

/// Presence flag per keyword, kept in keyword-set order.
///
/// Serializes as a map of `term -> 0 | 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordHits {
    entries: Vec<(String, bool)>,
}

impl KeywordHits {
    /// All terms of `keywords`, none of them hit yet.
    pub fn empty(keywords: &KeywordSet) -> Self {
        Self {
            entries: keywords
                .terms()
                .iter()
                .map(|term| (term.clone(), false))
                .collect(),
        }
    }

    pub fn get(&self, term: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|(t, _)| t == term)
            .map(|(_, hit)| *hit)
    }

    /// Record a hit for `term`. Unknown terms are ignored.
    pub fn mark(&mut self, term: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(t, _)| t == term) {
            entry.1 = true;
        }
    }

    /// OR another score into this one. A hit is never cleared.
    pub fn absorb(&mut self, other: &KeywordHits) {
        for (term, hit) in other.iter() {
            if hit {
                self.mark(term);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(term, hit)| (term.as_str(), *hit))
    }

    pub fn hit_terms(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, hit)| *hit)
            .map(|(term, _)| term)
            .collect()
    }

    pub fn any(&self) -> bool {
        self.entries.iter().any(|(_, hit)| *hit)
    }
}

impl Serialize for KeywordHits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (term, hit) in &self.entries {
            map.serialize_entry(term, &u8::from(*hit))?;
        }
        map.end()
    }
}

/// How a site crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    /// The frontier drained before the time budget ran out
    Completed,
    /// The time budget ran out during the crawl
    TimedOut,
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlStatus::Completed => write!(f, "completed"),
            CrawlStatus::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// Result of crawling one website
#[derive(Debug, Clone, Serialize)]
pub struct SiteCrawlReport {
    /// The URL the crawl started from
    pub seed: String,
    /// Keywords found on any fetched page
    pub hits: KeywordHits,
    /// Pages fetched and scored successfully
    pub pages_checked: usize,
    /// Distinct URLs taken off the frontier, including failed fetches
    pub pages_visited: usize,
    /// Discovered URLs that were never fetched
    pub pages_skipped: usize,
    pub status: CrawlStatus,
}

/// Keyword hits for one partner, ready to be written back to its HCL row.
///
/// Serializes flat: `{"id": 7, "universal": 0, "fanuc": 1, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartnerHits {
    pub id: i64,
    #[serde(flatten)]
    pub hits: KeywordHits,
}
