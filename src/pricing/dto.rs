use serde::Deserialize;

use crate::billing::calculator::{check_amount, check_quantity, MAX_PRICE_PER_KWH};
use crate::error::BillingError;

#[derive(Debug, Deserialize)]
pub struct UpdatePricingRequest {
    pub price_per_kwh: f64,
    #[serde(default)]
    pub reading_fee: i64,
    #[serde(default)]
    pub shared_fee_total: i64,
    #[serde(default)]
    pub general_fee: i64,
}

impl UpdatePricingRequest {
    pub fn validate(&self) -> Result<(), BillingError> {
        check_quantity("price_per_kwh", self.price_per_kwh, MAX_PRICE_PER_KWH)?;
        for (name, v) in [
            ("reading_fee", self.reading_fee),
            ("shared_fee_total", self.shared_fee_total),
            ("general_fee", self.general_fee),
        ] {
            check_amount(name, v)?;
        }
        Ok(())
    }
}
