use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{Pagination, RecordReadingRequest};
use super::repo_types::Reading;
use super::services::record_reading;
use crate::{error::BillingError, meters::repo_types::Meter, state::AppState};

pub fn reading_routes() -> Router<AppState> {
    Router::new().route(
        "/meters/:id/readings",
        get(list_readings).post(create_reading),
    )
}

#[instrument(skip(state, payload))]
pub async fn create_reading(
    State(state): State<AppState>,
    Path(meter_id): Path<Uuid>,
    Json(payload): Json<RecordReadingRequest>,
) -> Result<(StatusCode, Json<Reading>), (StatusCode, String)> {
    let reading = record_reading(&state.db, meter_id, payload).await?;
    Ok((StatusCode::CREATED, Json(reading)))
}

#[instrument(skip(state))]
pub async fn list_readings(
    State(state): State<AppState>,
    Path(meter_id): Path<Uuid>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Reading>>, (StatusCode, String)> {
    if Meter::find_by_id(&state.db, meter_id)
        .await
        .map_err(BillingError::from)?
        .is_none()
    {
        return Err(BillingError::MeterNotFound.into());
    }
    let rows = Reading::list_by_meter(&state.db, meter_id, p.limit.clamp(1, 500), p.offset.max(0))
        .await
        .map_err(BillingError::from)?;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn negative_reading_is_rejected_with_bad_request() {
        let state = AppState::fake();
        let err = create_reading(
            State(state),
            Path(Uuid::new_v4()),
            Json(RecordReadingRequest {
                value_kwh: -5.0,
                read_at: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.contains("value_kwh"));
    }
}
