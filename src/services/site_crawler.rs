// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Single-site crawl under a time budget.
//!
//! The crawler walks a site from its seed URL, following navigation links that
//! stay under the seed, and ORs the keyword hits of every page it reads. Pages
//! are taken from the frontier most-recently-discovered first and each URL is
//! fetched at most once.
//!
//! What happens when the time budget runs out is chosen by [`TimeoutPolicy`].

use crate::models::crawler::{CrawlStatus, KeywordHits, KeywordSet, SiteCrawlReport};
use crate::services::extract::{extract_links, score_keywords};
use crate::services::fetcher::PageFetcher;
use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use url::Url;

pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(4);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_USER_AGENT: &str = "CatalogAgent/0.1";

/// Behaviour once a crawl runs past its time budget
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Stop discovering links but still fetch every page already queued
    #[default]
    SoftDrain,
    /// Fetch nothing more; a fetch still in flight at the deadline is abandoned
    HardCutoff,
}

impl FromStr for TimeoutPolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "soft" | "soft_drain" => Ok(TimeoutPolicy::SoftDrain),
            "hard" | "hard_cutoff" => Ok(TimeoutPolicy::HardCutoff),
            other => Err(anyhow!(
                "timeout policy must be 'soft' or 'hard', got: {}",
                other
            )),
        }
    }
}

impl fmt::Display for TimeoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutPolicy::SoftDrain => write!(f, "soft"),
            TimeoutPolicy::HardCutoff => write!(f, "hard"),
        }
    }
}

/// Crawler settings
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub keywords: KeywordSet,
    pub time_budget: Duration,
    pub timeout_policy: TimeoutPolicy,
    /// Partner sites crawled at once
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            keywords: KeywordSet::default(),
            time_budget: DEFAULT_TIME_BUDGET,
            timeout_policy: TimeoutPolicy::default(),
            concurrency: 1,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlerConfig {
    pub fn from_env() -> Result<Self> {
        let keywords = match env::var("CRAWLER_KEYWORDS") {
            Ok(list) => KeywordSet::parse(&list),
            Err(_) => KeywordSet::default(),
        };
        if keywords.is_empty() {
            return Err(anyhow!("CRAWLER_KEYWORDS must name at least one term"));
        }

        let concurrency: usize = env::var("CRAWLER_CONCURRENCY")
            .unwrap_or_else(|_| "1".to_string())
            .parse()
            .context("CRAWLER_CONCURRENCY must be a valid number")?;

        Ok(Self {
            keywords,
            time_budget: Duration::from_secs(
                env::var("CRAWLER_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "4".to_string())
                    .parse()
                    .context("CRAWLER_TIMEOUT_SECS must be a valid number")?,
            ),
            timeout_policy: env::var("CRAWLER_TIMEOUT_POLICY")
                .unwrap_or_else(|_| "soft".to_string())
                .parse()
                .context("CRAWLER_TIMEOUT_POLICY is invalid")?,
            concurrency: concurrency.max(1),
            request_timeout: Duration::from_secs(
                env::var("CRAWLER_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("CRAWLER_REQUEST_TIMEOUT_SECS must be a valid number")?,
            ),
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        })
    }
}

/// Crawls one site at a time with a shared fetcher
pub struct SiteCrawler<F> {
    fetcher: F,
    keywords: KeywordSet,
    time_budget: Duration,
    timeout_policy: TimeoutPolicy,
}

impl<F: PageFetcher> SiteCrawler<F> {
    pub fn new(fetcher: F, keywords: KeywordSet) -> Self {
        Self {
            fetcher,
            keywords,
            time_budget: DEFAULT_TIME_BUDGET,
            timeout_policy: TimeoutPolicy::default(),
        }
    }

    pub fn from_config(fetcher: F, config: &CrawlerConfig) -> Self {
        Self::new(fetcher, config.keywords.clone())
            .with_time_budget(config.time_budget)
            .with_timeout_policy(config.timeout_policy)
    }

    pub fn with_time_budget(mut self, time_budget: Duration) -> Self {
        self.time_budget = time_budget;
        self
    }

    pub fn with_timeout_policy(mut self, timeout_policy: TimeoutPolicy) -> Self {
        self.timeout_policy = timeout_policy;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Crawl the site under `seed` and report which keywords it mentions.
    ///
    /// Failed pages are logged and skipped. An unreachable seed gives an
    /// all-zero report with status `Completed`.
    pub async fn crawl(&self, seed: &Url) -> SiteCrawlReport {
        let deadline = Instant::now() + self.time_budget;
        let mut state = CrawlState::new(seed.clone(), &self.keywords);

        while let Some(url) = state.frontier.pop() {
            state.check_deadline(deadline, seed);
            if state.timed_out && self.timeout_policy == TimeoutPolicy::HardCutoff {
                state.frontier.push(url);
                break;
            }

            if !state.visited.insert(url.clone()) {
                continue;
            }

            let fetched = match self.timeout_policy {
                TimeoutPolicy::SoftDrain => self.fetcher.fetch_page(&url).await,
                TimeoutPolicy::HardCutoff => {
                    match timeout_at(deadline, self.fetcher.fetch_page(&url)).await {
                        Ok(fetched) => fetched,
                        Err(_) => {
                            tracing::debug!(url = %url, "Abandoning fetch at crawl deadline");
                            state.check_deadline(deadline, seed);
                            break;
                        }
                    }
                }
            };

            let doc = match fetched {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(seed = %seed, error = %e, "Skipping page");
                    continue;
                }
            };

            state.hits.absorb(&score_keywords(&doc, &self.keywords));

            // Links are only discovered while the budget lasts
            state.check_deadline(deadline, seed);
            if !state.timed_out {
                for link in extract_links(seed, &doc) {
                    if !state.visited.contains(&link) {
                        state.frontier.push(link);
                    }
                }
            }

            state.pages_checked += 1;
            tracing::debug!(
                seed = %seed,
                "Progress: {}/{} pages checked",
                state.pages_checked,
                state.pages_checked + state.frontier.len()
            );
        }

        // The last fetch may have failed after the budget ran out
        state.check_deadline(deadline, seed);
        state.into_report(seed)
    }
}

/// Transient state of one crawl
struct CrawlState {
    /// LIFO: the most recently discovered link is fetched next
    frontier: Vec<Url>,
    visited: HashSet<Url>,
    hits: KeywordHits,
    pages_checked: usize,
    timed_out: bool,
}

impl CrawlState {
    fn new(seed: Url, keywords: &KeywordSet) -> Self {
        Self {
            frontier: vec![seed],
            visited: HashSet::new(),
            hits: KeywordHits::empty(keywords),
            pages_checked: 0,
            timed_out: false,
        }
    }

    fn check_deadline(&mut self, deadline: Instant, seed: &Url) {
        if !self.timed_out && Instant::now() >= deadline {
            self.timed_out = true;
            tracing::info!(seed = %seed, "Crawl time budget reached");
        }
    }

    fn into_report(self, seed: &Url) -> SiteCrawlReport {
        let skipped: HashSet<&Url> = self
            .frontier
            .iter()
            .filter(|url| !self.visited.contains(*url))
            .collect();
        let pages_skipped = skipped.len();

        SiteCrawlReport {
            seed: seed.to_string(),
            hits: self.hits,
            pages_checked: self.pages_checked,
            pages_visited: self.visited.len(),
            pages_skipped,
            status: if self.timed_out {
                CrawlStatus::TimedOut
            } else {
                CrawlStatus::Completed
            },
        }
    }
}
