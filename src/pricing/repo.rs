use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// Global price configuration, stored as a single row with `id = 1`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, FromRow)]
pub struct PricingConfig {
    pub price_per_kwh: f64,
    pub reading_fee: i64,
    pub shared_fee_total: i64,
    pub general_fee: i64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

const SINGLETON_ID: i16 = 1;

impl PricingConfig {
    /// Current pricing; all zeros if it was never configured.
    pub async fn get(db: &PgPool) -> anyhow::Result<PricingConfig> {
        let row = sqlx::query_as::<_, PricingConfig>(
            r#"
            SELECT price_per_kwh, reading_fee, shared_fee_total, general_fee, updated_at
              FROM pricing_config
             WHERE id = $1
            "#,
        )
        .bind(SINGLETON_ID)
        .fetch_optional(db)
        .await
        .context("get pricing config")?;
        Ok(row.unwrap_or_default())
    }

    /// Last write wins.
    pub async fn upsert(
        db: &PgPool,
        price_per_kwh: f64,
        reading_fee: i64,
        shared_fee_total: i64,
        general_fee: i64,
    ) -> anyhow::Result<PricingConfig> {
        let row = sqlx::query_as::<_, PricingConfig>(
            r#"
            INSERT INTO pricing_config (id, price_per_kwh, reading_fee, shared_fee_total, general_fee, updated_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (id) DO UPDATE
               SET price_per_kwh    = EXCLUDED.price_per_kwh,
                   reading_fee      = EXCLUDED.reading_fee,
                   shared_fee_total = EXCLUDED.shared_fee_total,
                   general_fee      = EXCLUDED.general_fee,
                   updated_at       = EXCLUDED.updated_at
            RETURNING price_per_kwh, reading_fee, shared_fee_total, general_fee, updated_at
            "#,
        )
        .bind(SINGLETON_ID)
        .bind(price_per_kwh)
        .bind(reading_fee)
        .bind(shared_fee_total)
        .bind(general_fee)
        .fetch_one(db)
        .await
        .context("upsert pricing config")?;
        Ok(row)
    }
}
