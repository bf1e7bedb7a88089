use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::billing::calculator::{check_quantity, MAX_READING_KWH};
use crate::error::BillingError;
use crate::meters::repo_types::Meter;
use crate::readings::{dto::RecordReadingRequest, repo_types::Reading};

/// Register values are non-negative and bounded; ordering against earlier
/// readings is not checked.
pub(crate) fn validate_value(value_kwh: f64) -> Result<f64, BillingError> {
    check_quantity("value_kwh", value_kwh, MAX_READING_KWH)
}

/// Picks `(previous, current)` out of readings sorted newest first.
pub fn consumption_window(latest: &[Reading]) -> Result<(f64, f64), BillingError> {
    match latest {
        [newer, older, ..] => Ok((older.value_kwh, newer.value_kwh)),
        _ => Err(BillingError::InsufficientHistory),
    }
}

pub async fn record_reading(
    db: &PgPool,
    meter_id: Uuid,
    req: RecordReadingRequest,
) -> Result<Reading, BillingError> {
    let value = validate_value(req.value_kwh)?;
    if Meter::find_by_id(db, meter_id).await?.is_none() {
        return Err(BillingError::MeterNotFound);
    }
    let reading = Reading::create(db, meter_id, value, req.read_at).await?;
    info!(%meter_id, value_kwh = value, "reading recorded");
    Ok(reading)
}
