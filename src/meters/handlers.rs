use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{MeterQuery, RegisterMeterRequest};
use super::repo_types::Meter;
use super::services::{like_escape, register_meter};
use crate::{error::BillingError, state::AppState};

pub fn meter_routes() -> Router<AppState> {
    Router::new()
        .route("/meters", get(list_meters).post(create_meter))
        .route("/meters/:id", get(get_meter))
}

#[instrument(skip(state, payload), fields(serial = %payload.serial))]
pub async fn create_meter(
    State(state): State<AppState>,
    Json(payload): Json<RegisterMeterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Meter>), (StatusCode, String)> {
    let meter = register_meter(&state.db, payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/v1/meters/{}", meter.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(meter)))
}

#[instrument(skip(state))]
pub async fn list_meters(
    State(state): State<AppState>,
    Query(q): Query<MeterQuery>,
) -> Result<Json<Vec<Meter>>, (StatusCode, String)> {
    let pattern = q
        .serial
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(like_escape);
    let limit = q.limit.clamp(1, 500);
    let meters = Meter::list(&state.db, pattern.as_deref(), limit, q.offset.max(0))
        .await
        .map_err(BillingError::from)?;
    Ok(Json(meters))
}

#[instrument(skip(state))]
pub async fn get_meter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Meter>, (StatusCode, String)> {
    let meter = Meter::find_by_id(&state.db, id)
        .await
        .map_err(BillingError::from)?
        .ok_or(BillingError::MeterNotFound)?;
    Ok(Json(meter))
}
