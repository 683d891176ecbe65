// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Crawl every partner website and write the keyword hits back in one batch.

use crate::models::crawler::{CrawlStatus, PartnerHits};
use crate::models::partner::Partner;
use crate::services::fetcher::PageFetcher;
use crate::services::site_crawler::SiteCrawler;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use url::Url;

/// Where partners to scan come from
#[async_trait]
pub trait PartnerSource: Send + Sync {
    async fn list_partners(&self) -> anyhow::Result<Vec<Partner>>;
}

/// Where scan results are written. The whole batch commits or nothing does.
#[async_trait]
pub trait KeywordHitsSink: Send + Sync {
    async fn write_keyword_hits(&self, batch: &[PartnerHits]) -> anyhow::Result<()>;
}

/// A partner that could not be crawled at all
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartnerCrawlFailure {
    #[error("partner {id} has no website")]
    MissingWebsite { id: i64 },
    #[error("partner {id} has an invalid website {website:?}: {reason}")]
    InvalidWebsite {
        id: i64,
        website: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to list partners: {0}")]
    PartnerSource(anyhow::Error),
    #[error("failed to write keyword hits: {0}")]
    Persistence(anyhow::Error),
}

/// Outcome of scanning a list of partners
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// One record per crawlable partner, in input order
    pub results: Vec<PartnerHits>,
    /// Partners skipped because their website could not be used
    pub failures: Vec<PartnerCrawlFailure>,
    /// How many crawls ran out of time
    pub timed_out: usize,
}

/// Seed URL for a partner's website. A missing scheme defaults to https.
pub fn partner_seed(partner: &Partner) -> Result<Url, PartnerCrawlFailure> {
    let website = partner
        .website
        .as_deref()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .ok_or(PartnerCrawlFailure::MissingWebsite { id: partner.id })?;

    let candidate = if website.contains("://") {
        website.to_string()
    } else {
        format!("https://{website}")
    };

    let url = Url::parse(&candidate).map_err(|e| PartnerCrawlFailure::InvalidWebsite {
        id: partner.id,
        website: website.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(PartnerCrawlFailure::InvalidWebsite {
            id: partner.id,
            website: website.to_string(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }
    Ok(url)
}

/// Runs a [`SiteCrawler`] over partner websites, `concurrency` sites at a time
pub struct PartnerScanner<F> {
    crawler: SiteCrawler<F>,
    concurrency: usize,
}

impl<F: PageFetcher> PartnerScanner<F> {
    pub fn new(crawler: SiteCrawler<F>, concurrency: usize) -> Self {
        Self {
            crawler,
            concurrency: concurrency.max(1),
        }
    }

    /// Crawl each partner's website. Output order follows input order.
    pub async fn scan(&self, partners: &[Partner]) -> ScanSummary {
        let total = partners.len();
        tracing::info!(
            partners = total,
            concurrency = self.concurrency,
            "Scanning partner websites"
        );

        let outcomes: Vec<Result<(PartnerHits, CrawlStatus), PartnerCrawlFailure>> =
            stream::iter(partners.iter().enumerate())
                .map(|(index, partner)| self.scan_partner(index, total, partner))
                .buffered(self.concurrency)
                .collect()
                .await;

        let mut summary = ScanSummary::default();
        for outcome in outcomes {
            match outcome {
                Ok((hits, status)) => {
                    if status == CrawlStatus::TimedOut {
                        summary.timed_out += 1;
                    }
                    summary.results.push(hits);
                }
                Err(failure) => summary.failures.push(failure),
            }
        }

        tracing::info!(
            scanned = summary.results.len(),
            skipped = summary.failures.len(),
            timed_out = summary.timed_out,
            "Partner scan finished"
        );
        summary
    }

    async fn scan_partner(
        &self,
        index: usize,
        total: usize,
        partner: &Partner,
    ) -> Result<(PartnerHits, CrawlStatus), PartnerCrawlFailure> {
        let seed = partner_seed(partner).inspect_err(|failure| {
            tracing::error!(partner_id = partner.id, error = %failure, "Skipping partner");
        })?;

        tracing::info!(
            partner_id = partner.id,
            "Checking website of {} ({}/{}): {}",
            partner.display_name(),
            index + 1,
            total,
            seed
        );

        let report = self.crawler.crawl(&seed).await;
        tracing::info!(
            partner_id = partner.id,
            status = %report.status,
            pages_checked = report.pages_checked,
            hits = ?report.hits.hit_terms(),
            "Website checked"
        );

        Ok((
            PartnerHits {
                id: partner.id,
                hits: report.hits,
            },
            report.status,
        ))
    }

    /// List partners, scan them, and hand the results to `sink` as one batch.
    ///
    /// `report` sees the summary before anything is written, so the results
    /// survive a failed write. Without a sink nothing is written.
    pub async fn run(
        &self,
        source: &dyn PartnerSource,
        sink: Option<&dyn KeywordHitsSink>,
        report: impl FnOnce(&ScanSummary),
    ) -> Result<ScanSummary, ScanError> {
        let partners = source
            .list_partners()
            .await
            .map_err(ScanError::PartnerSource)?;

        let summary = self.scan(&partners).await;
        report(&summary);

        let Some(sink) = sink else {
            return Ok(summary);
        };
        sink.write_keyword_hits(&summary.results)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Keyword hits were not written");
                ScanError::Persistence(e)
            })?;

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::crawler::KeywordSet;
    use crate::services::fetcher::{Document, FetchFailure};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Hosts mapped to their home page; unknown hosts are unreachable
    struct FakeWeb {
        homes: HashMap<String, String>,
        delays: HashMap<String, Duration>,
    }

    impl FakeWeb {
        fn new(homes: &[(&str, &str)]) -> Self {
            Self {
                homes: homes
                    .iter()
                    .map(|(host, html)| (host.to_string(), html.to_string()))
                    .collect(),
                delays: HashMap::new(),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for FakeWeb {
        async fn fetch_page(&self, url: &Url) -> Result<Document, FetchFailure> {
            let host = url.host_str().unwrap_or_default();
            if let Some(delay) = self.delays.get(host) {
                tokio::time::sleep(*delay).await;
            }
            match self.homes.get(host) {
                Some(html) if url.path() == "/" => Ok(Document::parse(html)),
                _ => Err(FetchFailure::Transport {
                    url: url.to_string(),
                    reason: "connection refused".to_string(),
                }),
            }
        }
    }

    fn partner(id: i64, website: Option<&str>) -> Partner {
        Partner {
            id,
            company: Some(format!("Partner {id}")),
            website: website.map(str::to_string),
            ..Default::default()
        }
    }

    fn scanner(web: FakeWeb, concurrency: usize) -> PartnerScanner<FakeWeb> {
        PartnerScanner::new(SiteCrawler::new(web, KeywordSet::default()), concurrency)
    }

    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<Vec<PartnerHits>>>,
        fail: bool,
    }

    #[async_trait]
    impl KeywordHitsSink for RecordingSink {
        async fn write_keyword_hits(&self, batch: &[PartnerHits]) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("database is locked");
            }
            self.batches.lock().unwrap().push(batch.to_vec());
            Ok(())
        }
    }

    struct StaticSource(Vec<Partner>);

    #[async_trait]
    impl PartnerSource for StaticSource {
        async fn list_partners(&self) -> anyhow::Result<Vec<Partner>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_partner_seed_defaults_to_https() {
        let seed = partner_seed(&partner(1, Some("acme.example"))).unwrap();
        assert_eq!(seed.as_str(), "https://acme.example/");

        let seed = partner_seed(&partner(1, Some(" http://acme.example/en/ "))).unwrap();
        assert_eq!(seed.as_str(), "http://acme.example/en/");
    }

    #[test]
    fn test_partner_seed_rejects_unusable_websites() {
        assert_eq!(
            partner_seed(&partner(3, None)),
            Err(PartnerCrawlFailure::MissingWebsite { id: 3 })
        );
        assert_eq!(
            partner_seed(&partner(3, Some("  "))),
            Err(PartnerCrawlFailure::MissingWebsite { id: 3 })
        );
        assert!(matches!(
            partner_seed(&partner(4, Some("ftp://acme.example"))),
            Err(PartnerCrawlFailure::InvalidWebsite { id: 4, .. })
        ));
        assert!(matches!(
            partner_seed(&partner(5, Some("https://"))),
            Err(PartnerCrawlFailure::InvalidWebsite { id: 5, .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_partner_still_gets_zero_record() {
        let web = FakeWeb::new(&[("a.example", "<body>Proud FANUC integrator</body>")]);
        let scanner = scanner(web, 1);

        let summary = scanner
            .scan(&[
                partner(1, Some("https://a.example")),
                partner(2, Some("https://b.example")),
            ])
            .await;

        let json = serde_json::to_value(&summary.results).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"id": 1, "universal": 0, "kassow": 0, "fanuc": 1, "abb": 0, "doosan": 0, "kuka": 0, "omron": 0},
                {"id": 2, "universal": 0, "kassow": 0, "fanuc": 0, "abb": 0, "doosan": 0, "kuka": 0, "omron": 0}
            ])
        );
        assert!(summary.failures.is_empty());
    }

    #[tokio::test]
    async fn test_partner_without_website_is_skipped_not_fatal() {
        let web = FakeWeb::new(&[("c.example", "<body>kuka</body>")]);
        let scanner = scanner(web, 1);

        let summary = scanner
            .scan(&[partner(1, None), partner(2, Some("c.example"))])
            .await;

        assert_eq!(summary.results.len(), 1);
        assert_eq!(summary.results[0].id, 2);
        assert_eq!(summary.results[0].hits.get("kuka"), Some(true));
        assert_eq!(
            summary.failures,
            vec![PartnerCrawlFailure::MissingWebsite { id: 1 }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_scan_keeps_input_order() {
        let mut web = FakeWeb::new(&[
            ("slow.example", "<body>abb</body>"),
            ("fast.example", "<body>doosan</body>"),
        ]);
        web.delays
            .insert("slow.example".to_string(), Duration::from_secs(2));
        web.delays
            .insert("fast.example".to_string(), Duration::from_millis(10));
        let scanner = scanner(web, 4);

        let summary = scanner
            .scan(&[
                partner(10, Some("https://slow.example")),
                partner(20, Some("https://fast.example")),
            ])
            .await;

        let ids: Vec<i64> = summary.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 20]);
        assert_eq!(summary.results[0].hits.hit_terms(), vec!["abb"]);
    }

    #[tokio::test]
    async fn test_run_writes_one_batch() {
        let web = FakeWeb::new(&[("a.example", "<body>omron</body>")]);
        let scanner = scanner(web, 1);
        let source = StaticSource(vec![
            partner(1, Some("a.example")),
            partner(2, Some("b.example")),
        ]);
        let sink = RecordingSink::default();

        let summary = scanner.run(&source, Some(&sink), |_| {}).await.unwrap();

        assert_eq!(summary.results.len(), 2);
        let batches = sink.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[0][0].hits.get("omron"), Some(true));
    }

    #[tokio::test]
    async fn test_run_surfaces_persistence_failure() {
        let scanner = scanner(FakeWeb::new(&[]), 1);
        let source = StaticSource(vec![partner(1, Some("a.example"))]);
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        let mut reported = Vec::new();
        let result = scanner
            .run(&source, Some(&sink), |summary| {
                reported = summary.results.iter().map(|r| r.id).collect();
            })
            .await;
        assert!(matches!(result, Err(ScanError::Persistence(_))));
        // results were handed out before the write failed
        assert_eq!(reported, vec![1]);
    }

    #[tokio::test]
    async fn test_run_without_sink_writes_nothing() {
        let web = FakeWeb::new(&[("a.example", "<body>kassow</body>")]);
        let scanner = scanner(web, 1);
        let source = StaticSource(vec![partner(1, Some("a.example"))]);

        let mut reported = 0;
        let summary = scanner
            .run(&source, None, |summary| reported = summary.results.len())
            .await
            .unwrap();

        assert_eq!(reported, 1);
        assert_eq!(summary.results[0].hits.hit_terms(), vec!["kassow"]);
    }
}
