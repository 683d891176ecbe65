// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{Context, Result};
use catalog_agent::app::{create_router, AppState, ServerConfig, VERSION};
use catalog_agent::services::backup::run_backups;
use catalog_agent::services::db::{Database, CRM_DB, RACKBEAT_DB};
use catalog_agent::services::fetcher::HttpFetcher;
use catalog_agent::services::geocode::{geocode_partners, GeocodingClient, GeocodingConfig};
use catalog_agent::services::hubspot::{HubSpotClient, HubSpotConfig};
use catalog_agent::services::logging::init_tracing;
use catalog_agent::services::partner_db::PartnerRepository;
use catalog_agent::services::partner_scanner::{KeywordHitsSink, PartnerScanner};
use catalog_agent::services::product_db::ProductRepository;
use catalog_agent::services::rackbeat::{sync_lots, RackbeatClient, RackbeatConfig};
use catalog_agent::services::schedule::{spawn_daily, DailySchedule};
use catalog_agent::services::site_crawler::{CrawlerConfig, SiteCrawler};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Catalog backend for the company website
#[derive(Parser, Debug)]
#[command(name = "catalog-agent")]
#[command(version = VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API and run the daily lot sync and backups
    Serve,
    /// Crawl partner websites for robot brand mentions
    CrawlPartners {
        #[arg(long, help = "Print the results without writing them")]
        dry_run: bool,
    },
    /// Sync products from Rackbeat lots once
    SyncLots,
    /// Back up both databases once
    Backup,
    /// Look up partner coordinates from their postal address
    GeocodePartners {
        #[arg(long, help = "Store found coordinates on the partners")]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => serve().await,
        Commands::CrawlPartners { dry_run } => crawl_partners(dry_run).await,
        Commands::SyncLots => {
            let products = open_products(&ServerConfig::database_dir_from_env()?).await?;
            let client = RackbeatClient::new(RackbeatConfig::from_env()?)?;
            let written = sync_lots(&client, &products).await?;
            tracing::info!(products = written, "Lot sync finished");
            Ok(())
        }
        Commands::Backup => {
            let created = run_backups(&ServerConfig::database_dir_from_env()?, Utc::now()).await;
            tracing::info!(backups = created.len(), "Backup finished");
            Ok(())
        }
        Commands::GeocodePartners { write } => {
            let partners = open_partners(&ServerConfig::database_dir_from_env()?).await?;
            let client = GeocodingClient::new(GeocodingConfig::from_env()?)?;
            let results = geocode_partners(&client, &partners, write).await?;
            let found = results.iter().filter(|r| r.coordinates.is_some()).count();
            tracing::info!(partners = results.len(), found, write, "Geocoding finished");
            Ok(())
        }
    }
}

async fn open_partners(database_dir: &Path) -> Result<PartnerRepository> {
    let db = Database::open(database_dir, CRM_DB).await?;
    db.bootstrap_crm().await?;
    Ok(PartnerRepository::new(db))
}

async fn open_products(database_dir: &Path) -> Result<ProductRepository> {
    let db = Database::open(database_dir, RACKBEAT_DB).await?;
    db.bootstrap_rackbeat().await?;
    Ok(ProductRepository::new(db))
}

async fn serve() -> Result<()> {
    let config = ServerConfig::from_env()?;

    let partners = Arc::new(open_partners(&config.database_dir).await?);
    let products = Arc::new(open_products(&config.database_dir).await?);
    let rackbeat = Arc::new(RackbeatClient::new(RackbeatConfig::from_env()?)?);

    spawn_startup_jobs(rackbeat.clone(), products.clone(), config.database_dir.clone());
    spawn_jobs(rackbeat, products.clone(), config.database_dir.clone())?;

    let state = AppState {
        partners,
        products,
        forwarder: Arc::new(HubSpotClient::new(HubSpotConfig::from_env()?)?),
        secret_key: config.secret_key.as_str().into(),
        public_base_url: config.public_base_url.as_str().into(),
    };
    let app = create_router(state);

    // Bind to 0.0.0.0 to accept connections from any network interface (required for Docker)
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("catalog-agent v{} listening on {}", VERSION, addr);
    axum::serve(listener, app).await.context("Server error")
}

/// One lot sync and backup at startup, without holding up the listener
fn spawn_startup_jobs(
    rackbeat: Arc<RackbeatClient>,
    products: Arc<ProductRepository>,
    database_dir: PathBuf,
) {
    tokio::spawn(async move {
        if let Err(e) = sync_lots(&rackbeat, &products).await {
            tracing::error!(error = ?e, "Initial lot sync failed");
        }
    });
    tokio::spawn(async move {
        run_backups(&database_dir, Utc::now()).await;
    });
}

/// Daily lot sync at midnight and backups at 23:50, local time
fn spawn_jobs(
    rackbeat: Arc<RackbeatClient>,
    products: Arc<ProductRepository>,
    database_dir: PathBuf,
) -> Result<()> {
    spawn_daily("lot-sync", DailySchedule::new(0, 0)?, move || {
        let rackbeat = rackbeat.clone();
        let products = products.clone();
        async move {
            if let Err(e) = sync_lots(&rackbeat, &products).await {
                tracing::error!(error = ?e, "Scheduled lot sync failed");
            }
        }
    });

    spawn_daily("backup", DailySchedule::new(23, 50)?, move || {
        let database_dir = database_dir.clone();
        async move {
            run_backups(&database_dir, Utc::now()).await;
        }
    });
    Ok(())
}

async fn crawl_partners(dry_run: bool) -> Result<()> {
    let partners = open_partners(&ServerConfig::database_dir_from_env()?).await?;
    let config = CrawlerConfig::from_env()?;
    let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout)?;
    let scanner = PartnerScanner::new(SiteCrawler::from_config(fetcher, &config), config.concurrency);

    let sink: Option<&dyn KeywordHitsSink> = if dry_run { None } else { Some(&partners) };
    let summary = scanner
        .run(&partners, sink, |summary| {
            match serde_json::to_string_pretty(&summary.results) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!(error = %e, "Could not print keyword hits"),
            }
        })
        .await?;
    tracing::info!(
        crawled = summary.results.len(),
        skipped = summary.failures.len(),
        timed_out = summary.timed_out,
        written = !dry_run,
        "Partner crawl finished"
    );
    Ok(())
}
