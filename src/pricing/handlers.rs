use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{info, instrument};

use super::dto::UpdatePricingRequest;
use super::repo::PricingConfig;
use crate::{error::BillingError, state::AppState};

pub fn pricing_routes() -> Router<AppState> {
    Router::new().route("/pricing", get(get_pricing).put(update_pricing))
}

#[instrument(skip(state))]
pub async fn get_pricing(
    State(state): State<AppState>,
) -> Result<Json<PricingConfig>, (StatusCode, String)> {
    let cfg = PricingConfig::get(&state.db)
        .await
        .map_err(BillingError::from)?;
    Ok(Json(cfg))
}

#[instrument(skip(state, payload))]
pub async fn update_pricing(
    State(state): State<AppState>,
    Json(payload): Json<UpdatePricingRequest>,
) -> Result<Json<PricingConfig>, (StatusCode, String)> {
    payload.validate()?;
    let cfg = PricingConfig::upsert(
        &state.db,
        payload.price_per_kwh,
        payload.reading_fee,
        payload.shared_fee_total,
        payload.general_fee,
    )
    .await
    .map_err(BillingError::from)?;
    info!(
        price_per_kwh = cfg.price_per_kwh,
        reading_fee = cfg.reading_fee,
        shared_fee_total = cfg.shared_fee_total,
        "pricing updated"
    );
    Ok(Json(cfg))
}
