use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Registered electricity meter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meter {
    pub id: Uuid,
    pub serial: String,     // user assigned, unique
    pub owner_name: String,
    pub location: String,   // apartment / lot label
    pub phone: String,      // digits only, may be empty
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
