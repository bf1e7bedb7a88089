use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::meters::repo_types::Meter;

impl Meter {
    /// Insert a meter. Returns `None` when the serial is already registered.
    pub async fn create(
        db: &PgPool,
        serial: &str,
        owner_name: &str,
        location: &str,
        phone: &str,
    ) -> anyhow::Result<Option<Meter>> {
        let meter = sqlx::query_as::<_, Meter>(
            r#"
            INSERT INTO meters (serial, owner_name, location, phone)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (serial) DO NOTHING
            RETURNING id, serial, owner_name, location, phone, created_at
            "#,
        )
        .bind(serial)
        .bind(owner_name)
        .bind(location)
        .bind(phone)
        .fetch_optional(db)
        .await
        .context("insert meter")?;
        Ok(meter)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Meter>> {
        let meter = sqlx::query_as::<_, Meter>(
            r#"
            SELECT id, serial, owner_name, location, phone, created_at
              FROM meters
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find meter by id")?;
        Ok(meter)
    }

    /// Case-insensitive partial match on the serial; an exact match wins.
    /// `pattern` must already be LIKE-escaped.
    pub async fn find_by_serial(
        db: &PgPool,
        serial: &str,
        pattern: &str,
    ) -> anyhow::Result<Option<Meter>> {
        let meter = sqlx::query_as::<_, Meter>(
            r#"
            SELECT id, serial, owner_name, location, phone, created_at
              FROM meters
             WHERE serial ILIKE '%' || $2 || '%' ESCAPE '\'
             ORDER BY lower(serial) = lower($1) DESC, serial
             LIMIT 1
            "#,
        )
        .bind(serial)
        .bind(pattern)
        .fetch_optional(db)
        .await
        .context("find meter by serial")?;
        Ok(meter)
    }

    /// Meters ordered by serial, optionally filtered by a LIKE-escaped pattern.
    pub async fn list(
        db: &PgPool,
        pattern: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Meter>> {
        let rows = sqlx::query_as::<_, Meter>(
            r#"
            SELECT id, serial, owner_name, location, phone, created_at
              FROM meters
             WHERE $1::text IS NULL OR serial ILIKE '%' || $1 || '%' ESCAPE '\'
             ORDER BY serial
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list meters")?;
        Ok(rows)
    }

    /// Number of registered meters; the divisor of the shared facility fee.
    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM meters")
            .fetch_one(db)
            .await
            .context("count meters")?;
        Ok(n)
    }
}
