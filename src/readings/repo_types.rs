use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// A kWh register value taken from a meter. Readings are never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Reading {
    pub id: Uuid,
    pub meter_id: Uuid,
    pub value_kwh: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub read_at: OffsetDateTime,
}
