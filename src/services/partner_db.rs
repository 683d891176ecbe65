// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::crawler::PartnerHits;
use crate::models::partner::{Partner, PartnerHcl};
use crate::services::db::Database;
use crate::services::partner_scanner::{KeywordHitsSink, PartnerSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use std::collections::HashSet;

/// Brand columns of the crm `hcl` table
pub const HCL_COLUMNS: [&str; 8] = [
    "universal",
    "kassow",
    "tm_omron",
    "kuka",
    "fanuc",
    "abb",
    "doosan",
    "aim_robotics",
];

/// HCL column a crawler keyword is stored in, if any
pub fn hcl_column(term: &str) -> Option<&'static str> {
    let column = match term {
        "omron" => "tm_omron",
        other => other,
    };
    HCL_COLUMNS.iter().copied().find(|c| *c == column)
}

const SELECT_PARTNERS: &str = r#"
    SELECT
        p.id,
        p.company,
        p.country_code,
        p.phone,
        p.email,
        p.address,
        p.longitude,
        p.latitude,
        p.city,
        p.country,
        p.website,
        p.img_url,
        p.is_integrator,
        h.universal,
        h.kassow,
        h.tm_omron,
        h.kuka,
        h.fanuc,
        h.abb,
        h.doosan,
        h.aim_robotics
    FROM partners p
    LEFT JOIN hcl h ON p.hcl = h.id
    ORDER BY p.id
"#;

/// Partner records in the crm database
#[derive(Clone)]
pub struct PartnerRepository {
    db: Database,
}

impl PartnerRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list_partners(&self) -> Result<Vec<Partner>> {
        let rows = sqlx::query(SELECT_PARTNERS)
            .fetch_all(self.db.pool())
            .await
            .context("Failed to query partners")?;

        rows.iter().map(partner_from_row).collect()
    }

    /// Store crawl results in each partner's HCL row, all or nothing.
    ///
    /// Terms without an HCL column are ignored. A partner without an HCL row
    /// gets a new one.
    pub async fn write_keyword_hits(&self, batch: &[PartnerHits]) -> Result<()> {
        let mut unknown: HashSet<String> = HashSet::new();
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .context("Failed to begin transaction")?;

        for record in batch {
            let mut values: Vec<(&'static str, i64)> = Vec::new();
            for (term, hit) in record.hits.iter() {
                match hcl_column(term) {
                    Some(column) => values.push((column, i64::from(hit))),
                    None => {
                        if unknown.insert(term.to_string()) {
                            tracing::warn!(term = %term, "Keyword has no HCL column, not stored");
                        }
                    }
                }
            }
            if values.is_empty() {
                continue;
            }

            write_partner_hcl(&mut tx, record.id, &values)
                .await
                .with_context(|| format!("Failed to update HCL of partner {}", record.id))?;
        }

        tx.commit().await.context("Failed to commit keyword hits")?;
        tracing::info!(partners = batch.len(), "Partner HCL updated");
        Ok(())
    }

    pub async fn update_coordinates(&self, id: i64, latitude: f64, longitude: f64) -> Result<()> {
        let result = sqlx::query("UPDATE partners SET latitude = ?, longitude = ? WHERE id = ?")
            .bind(latitude)
            .bind(longitude)
            .bind(id)
            .execute(self.db.pool())
            .await
            .with_context(|| format!("Failed to update coordinates of partner {id}"))?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Partner {id} not found");
        }
        Ok(())
    }
}

async fn write_partner_hcl(
    tx: &mut Transaction<'_, Sqlite>,
    partner_id: i64,
    values: &[(&'static str, i64)],
) -> Result<()> {
    let assignments: Vec<String> = values.iter().map(|(c, _)| format!("{c} = ?")).collect();
    let update = format!(
        "UPDATE hcl SET {} WHERE id = (SELECT hcl FROM partners WHERE id = ?)",
        assignments.join(", ")
    );

    let mut query = sqlx::query(&update);
    for (_, value) in values {
        query = query.bind(*value);
    }
    let updated = query.bind(partner_id).execute(&mut **tx).await?;
    if updated.rows_affected() > 0 {
        return Ok(());
    }

    let exists = sqlx::query("SELECT 1 FROM partners WHERE id = ?")
        .bind(partner_id)
        .fetch_optional(&mut **tx)
        .await?;
    if exists.is_none() {
        anyhow::bail!("Partner {partner_id} not found");
    }

    let columns: Vec<&str> = values.iter().map(|(c, _)| *c).collect();
    let placeholders = vec!["?"; values.len()].join(", ");
    let insert = format!(
        "INSERT INTO hcl ({}) VALUES ({})",
        columns.join(", "),
        placeholders
    );
    let mut query = sqlx::query(&insert);
    for (_, value) in values {
        query = query.bind(*value);
    }
    let hcl_id = query.execute(&mut **tx).await?.last_insert_rowid();

    sqlx::query("UPDATE partners SET hcl = ? WHERE id = ?")
        .bind(hcl_id)
        .bind(partner_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn partner_from_row(row: &SqliteRow) -> Result<Partner> {
    Ok(Partner {
        id: row.try_get("id")?,
        company: row.try_get("company")?,
        country_code: row.try_get("country_code")?,
        phone: row.try_get("phone")?,
        email: row.try_get("email")?,
        longitude: row.try_get("longitude")?,
        latitude: row.try_get("latitude")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        country: row.try_get("country")?,
        website: row.try_get("website")?,
        img_url: row.try_get("img_url")?,
        is_integrator: row.try_get("is_integrator")?,
        hcl: PartnerHcl {
            universal: row.try_get("universal")?,
            kassow: row.try_get("kassow")?,
            tm_omron: row.try_get("tm_omron")?,
            kuka: row.try_get("kuka")?,
            abb: row.try_get("abb")?,
            fanuc: row.try_get("fanuc")?,
            doosan: row.try_get("doosan")?,
            aim_robotics: row.try_get("aim_robotics")?,
        },
    })
}

#[async_trait]
impl PartnerSource for PartnerRepository {
    async fn list_partners(&self) -> Result<Vec<Partner>> {
        PartnerRepository::list_partners(self).await
    }
}

#[async_trait]
impl KeywordHitsSink for PartnerRepository {
    async fn write_keyword_hits(&self, batch: &[PartnerHits]) -> Result<()> {
        PartnerRepository::write_keyword_hits(self, batch).await
    }
}
