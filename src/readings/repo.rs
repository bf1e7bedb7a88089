use anyhow::Context;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::readings::repo_types::Reading;

impl Reading {
    pub async fn create(
        db: &PgPool,
        meter_id: Uuid,
        value_kwh: f64,
        read_at: Option<OffsetDateTime>,
    ) -> anyhow::Result<Reading> {
        let reading = sqlx::query_as::<_, Reading>(
            r#"
            INSERT INTO readings (meter_id, value_kwh, read_at)
            VALUES ($1, $2, COALESCE($3, now()))
            RETURNING id, meter_id, value_kwh, read_at
            "#,
        )
        .bind(meter_id)
        .bind(value_kwh)
        .bind(read_at)
        .fetch_one(db)
        .await
        .context("insert reading")?;
        Ok(reading)
    }

    /// The two most recent readings of a meter, newest first.
    pub async fn latest_two(db: &PgPool, meter_id: Uuid) -> anyhow::Result<Vec<Reading>> {
        let rows = sqlx::query_as::<_, Reading>(
            r#"
            SELECT id, meter_id, value_kwh, read_at
              FROM readings
             WHERE meter_id = $1
             ORDER BY read_at DESC, seq DESC
             LIMIT 2
            "#,
        )
        .bind(meter_id)
        .fetch_all(db)
        .await
        .context("latest two readings")?;
        Ok(rows)
    }

    pub async fn list_by_meter(
        db: &PgPool,
        meter_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Reading>> {
        let rows = sqlx::query_as::<_, Reading>(
            r#"
            SELECT id, meter_id, value_kwh, read_at
              FROM readings
             WHERE meter_id = $1
             ORDER BY read_at DESC, seq DESC
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(meter_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list readings by meter")?;
        Ok(rows)
    }
}
