// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! SQLite databases: `crm` (partners) and `rackbeat` (product catalog).
//!
//! Tables are created if missing when a database is opened for use. There is
//! no migration step; columns match the files the website already ships with.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

pub const CRM_DB: &str = "crm";
pub const RACKBEAT_DB: &str = "rackbeat";

const CRM_SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS hcl (
        id INTEGER PRIMARY KEY,
        universal INTEGER,
        kassow INTEGER,
        tm_omron INTEGER,
        kuka INTEGER,
        fanuc INTEGER,
        abb INTEGER,
        doosan INTEGER,
        aim_robotics INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS partners (
        id INTEGER PRIMARY KEY,
        company TEXT,
        country_code TEXT,
        phone TEXT,
        email TEXT,
        address TEXT,
        longitude REAL,
        latitude REAL,
        city TEXT,
        country TEXT,
        website TEXT,
        img_url TEXT,
        is_integrator INTEGER,
        hcl INTEGER REFERENCES hcl (id)
    )
    "#,
];

const RACKBEAT_SCHEMA: [&str; 7] = [
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY,
        category TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS hcl (
        id INTEGER PRIMARY KEY,
        compat_universal INTEGER,
        compat_kassow INTEGER,
        compat_tm_omron INTEGER,
        compat_kuka INTEGER,
        compat_abb INTEGER,
        compat_fanuc INTEGER,
        compat_doosan INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS badges (
        id INTEGER PRIMARY KEY,
        badge_1 TEXT,
        badge_2 TEXT,
        badge_3 TEXT,
        badge_4 TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS docs (
        id INTEGER PRIMARY KEY,
        protocol_universal TEXT,
        protocol_kassow TEXT,
        protocol_tm_omron TEXT,
        protocol_kuka TEXT,
        protocol_abb TEXT,
        protocol_fanuc TEXT,
        protocol_doosan TEXT,
        datasheet TEXT,
        files TEXT,
        manual TEXT,
        software_universal TEXT,
        software_kassow TEXT,
        software_tm_omron TEXT,
        software_kuka TEXT,
        software_abb TEXT,
        software_fanuc TEXT,
        software_doosan TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS features (
        id INTEGER PRIMARY KEY,
        feature_1 TEXT,
        feature_2 TEXT,
        feature_3 TEXT,
        feature_4 TEXT,
        feature_5 TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS faq (
        id INTEGER PRIMARY KEY,
        faq_1 TEXT,
        faq_2 TEXT,
        faq_3 TEXT,
        faq_4 TEXT,
        faq_5 TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id TEXT PRIMARY KEY,
        revision TEXT,
        name TEXT,
        name_sub TEXT,
        desc_short TEXT,
        desc_long TEXT,
        related_products TEXT,
        sw_version TEXT,
        blueprint TEXT,
        img_url TEXT,
        is_current INTEGER,
        setup_vid_url TEXT,
        interface TEXT,
        category INTEGER REFERENCES categories (id),
        hcl INTEGER REFERENCES hcl (id),
        badges INTEGER REFERENCES badges (id),
        docs INTEGER REFERENCES docs (id),
        features INTEGER REFERENCES features (id),
        faq INTEGER REFERENCES faq (id)
    )
    "#,
];

/// Path of database `name` inside `dir`, e.g. `<dir>/crm.db`
pub fn database_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.db"))
}

/// Pooled connection to one SQLite database
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) `<dir>/<name>.db`.
    pub async fn open(dir: &Path, name: &str) -> Result<Self> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create database directory {}", dir.display()))?;

        let path = database_path(dir, name);
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {}", path.display()))?;

        tracing::info!(path = %path.display(), "Opened database");
        Ok(Self { pool })
    }

    /// Private in-memory database. A single connection that never expires
    /// keeps the data alive for the lifetime of the pool.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the partner tables if they do not exist.
    pub async fn bootstrap_crm(&self) -> Result<()> {
        self.execute_all(&CRM_SCHEMA)
            .await
            .context("Failed to create crm tables")
    }

    /// Create the catalog tables if they do not exist.
    pub async fn bootstrap_rackbeat(&self) -> Result<()> {
        self.execute_all(&RACKBEAT_SCHEMA)
            .await
            .context("Failed to create rackbeat tables")
    }

    async fn execute_all(&self, statements: &[&str]) -> Result<()> {
        for statement in statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
