// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Daily file copies of the SQLite databases with a bounded history.

use crate::services::db::{database_path, CRM_DB, RACKBEAT_DB};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Backups kept per database
pub const MAX_BACKUPS: usize = 30;

/// `<name>-backup-2024-05-01T23-50-00-123Z.db`
pub fn backup_file_name(name: &str, now: DateTime<Utc>) -> String {
    format!("{}-backup-{}.db", name, now.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}

/// Backup folder of database `name`: `<dir>/backup/<name>`
pub fn backup_dir(database_dir: &Path, name: &str) -> PathBuf {
    database_dir.join("backup").join(name)
}

/// Copy `db_path` into `backup_dir` and prune old copies.
pub async fn create_backup(
    db_path: &Path,
    backup_dir: &Path,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let name = db_path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Invalid database path {}", db_path.display()))?;

    tokio::fs::create_dir_all(backup_dir)
        .await
        .with_context(|| format!("Failed to create {}", backup_dir.display()))?;

    let target = backup_dir.join(backup_file_name(name, now));
    tokio::fs::copy(db_path, &target)
        .await
        .with_context(|| format!("Failed to copy {}", db_path.display()))?;
    tracing::info!(backup = %target.display(), "Database backup created");

    prune_backups(backup_dir, MAX_BACKUPS).await?;
    Ok(target)
}

/// Delete the oldest files in `backup_dir` until at most `keep` remain.
/// Age is the modification time; ties go by file name.
pub async fn prune_backups(backup_dir: &Path, keep: usize) -> Result<Vec<PathBuf>> {
    let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
    let mut entries = tokio::fs::read_dir(backup_dir)
        .await
        .with_context(|| format!("Failed to list {}", backup_dir.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if metadata.is_file() {
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((modified, entry.path()));
        }
    }

    if files.len() <= keep {
        return Ok(Vec::new());
    }

    files.sort();
    let excess = files.len() - keep;
    let mut removed = Vec::with_capacity(excess);
    for (_, path) in files.into_iter().take(excess) {
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("Failed to delete {}", path.display()))?;
        tracing::info!(backup = %path.display(), "Old database backup deleted");
        removed.push(path);
    }
    Ok(removed)
}

/// Back up `crm.db` and `rackbeat.db` from `database_dir`.
/// A failure for one database does not stop the other.
pub async fn run_backups(database_dir: &Path, now: DateTime<Utc>) -> Vec<PathBuf> {
    let mut created = Vec::new();
    for name in [CRM_DB, RACKBEAT_DB] {
        let db_path = database_path(database_dir, name);
        match create_backup(&db_path, &backup_dir(database_dir, name), now).await {
            Ok(path) => created.push(path),
            Err(e) => tracing::error!(database = name, error = ?e, "Database backup failed"),
        }
    }
    created
}
