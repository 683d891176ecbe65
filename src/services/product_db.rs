// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::lot::LotRecord;
use crate::models::product::{BrandValues, Product, ProductDescription, ProductDocs, ProductMedia};
use crate::services::db::Database;
use anyhow::{Context, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

const SELECT_PRODUCTS: &str = r#"
    SELECT
        p.id,
        p.revision,
        p.name,
        p.name_sub,
        p.desc_short,
        p.desc_long,
        p.related_products,
        p.sw_version,
        p.blueprint,
        p.img_url,
        p.is_current,
        p.setup_vid_url,
        p.interface,
        c.id AS category_id,
        c.category,
        h.compat_universal,
        h.compat_kassow,
        h.compat_tm_omron,
        h.compat_kuka,
        h.compat_abb,
        h.compat_fanuc,
        h.compat_doosan,
        b.badge_1,
        b.badge_2,
        b.badge_3,
        b.badge_4,
        d.protocol_universal,
        d.protocol_kassow,
        d.protocol_tm_omron,
        d.protocol_kuka,
        d.protocol_abb,
        d.protocol_fanuc,
        d.protocol_doosan,
        d.datasheet,
        d.files,
        d.manual,
        d.software_universal,
        d.software_kassow,
        d.software_tm_omron,
        d.software_kuka,
        d.software_abb,
        d.software_fanuc,
        d.software_doosan,
        f.feature_1,
        f.feature_2,
        f.feature_3,
        f.feature_4,
        f.feature_5,
        q.faq_1,
        q.faq_2,
        q.faq_3,
        q.faq_4,
        q.faq_5
    FROM products p
    LEFT JOIN categories c ON p.category = c.id
    LEFT JOIN hcl h ON p.hcl = h.id
    LEFT JOIN badges b ON p.badges = b.id
    LEFT JOIN docs d ON p.docs = d.id
    LEFT JOIN features f ON p.features = f.id
    LEFT JOIN faq q ON p.faq = q.id
"#;

const UPSERT_LOT: &str = r#"
    INSERT INTO products (id, revision, name, desc_short, img_url)
    VALUES (?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        revision = excluded.revision,
        name = excluded.name,
        desc_short = excluded.desc_short,
        img_url = excluded.img_url
"#;

/// Product catalog in the rackbeat database
#[derive(Clone)]
pub struct ProductRepository {
    db: Database,
}

impl ProductRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All products, or only those flagged current.
    pub async fn list_products(&self, current_only: bool) -> Result<Vec<Product>> {
        let sql = if current_only {
            format!("{SELECT_PRODUCTS} WHERE p.is_current = 1 ORDER BY p.id")
        } else {
            format!("{SELECT_PRODUCTS} ORDER BY p.id")
        };

        let rows = sqlx::query(&sql)
            .fetch_all(self.db.pool())
            .await
            .context("Failed to query products")?;

        rows.iter().map(product_from_row).collect()
    }

    /// Insert or refresh one product per lot record in a single transaction.
    pub async fn upsert_lots(&self, lots: &[LotRecord]) -> Result<()> {
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .context("Failed to begin transaction")?;

        for lot in lots {
            sqlx::query(UPSERT_LOT)
                .bind(&lot.node_id)
                .bind(&lot.node_revision)
                .bind(&lot.name)
                .bind(&lot.description)
                .bind(&lot.img_url)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to upsert lot {}", lot.number))?;
        }

        tx.commit().await.context("Failed to commit lots")?;
        tracing::info!(products = lots.len(), "Products table updated from lots");
        Ok(())
    }
}

fn brand_values<T>(row: &SqliteRow, prefix: &str) -> Result<BrandValues<T>>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    let column = |brand: &str| format!("{prefix}_{brand}");
    Ok(BrandValues {
        universal: row.try_get(column("universal").as_str())?,
        kassow: row.try_get(column("kassow").as_str())?,
        tm_omron: row.try_get(column("tm_omron").as_str())?,
        kuka: row.try_get(column("kuka").as_str())?,
        abb: row.try_get(column("abb").as_str())?,
        fanuc: row.try_get(column("fanuc").as_str())?,
        doosan: row.try_get(column("doosan").as_str())?,
    })
}

fn numbered(row: &SqliteRow, prefix: &str, count: usize) -> Result<Vec<Option<String>>> {
    (1..=count)
        .map(|n| Ok(row.try_get(format!("{prefix}_{n}").as_str())?))
        .collect()
}

fn product_from_row(row: &SqliteRow) -> Result<Product> {
    let category_id: Option<i64> = row.try_get("category_id")?;

    Ok(Product {
        id: row.try_get("id")?,
        revision: row.try_get("revision")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        // The website indexes categories from zero
        category_id: category_id.map(|id| id - 1),
        sw_version: row.try_get("sw_version")?,
        is_current: row.try_get("is_current")?,
        interface: row.try_get("interface")?,
        related_products: row.try_get("related_products")?,
        description: ProductDescription {
            name_sub: row.try_get("name_sub")?,
            desc_short: row.try_get("desc_short")?,
            desc_long: row.try_get("desc_long")?,
        },
        media: ProductMedia {
            blueprint: row.try_get("blueprint")?,
            img_url: row.try_get("img_url")?,
            setup_vid_url: row.try_get("setup_vid_url")?,
        },
        hcl: brand_values(row, "compat")?,
        badges: numbered(row, "badge", 4)?,
        docs: ProductDocs {
            protocols: brand_values(row, "protocol")?,
            datasheet: row.try_get("datasheet")?,
            files: row.try_get("files")?,
            manual: row.try_get("manual")?,
            software: brand_values(row, "software")?,
        },
        features: numbered(row, "feature", 5)?,
        faq: numbered(row, "faq", 5)?,
    })
}
