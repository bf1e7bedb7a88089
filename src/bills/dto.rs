use serde::{Deserialize, Serialize};

use crate::billing::calculator::{check_amount, check_quantity, MAX_PRICE_PER_KWH, MAX_READING_KWH};
use crate::billing::{BillInputs, Breakdown};
use crate::error::BillingError;

#[derive(Debug, Serialize)]
pub struct BillResponse {
    pub full: Breakdown,
    pub customer: Breakdown,
    pub receipt_text: String,
    pub whatsapp_url: Option<String>,
    pub warnings: Vec<String>,
}

/// Manual bill, as typed into the billing form.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub owner: String,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub phone: String,
    pub previous_reading: f64,
    pub current_reading: f64,
    pub price_per_kwh: f64,
    #[serde(default)]
    pub reading_fee: i64,
    #[serde(default)]
    pub general_fee: i64,
    #[serde(default)]
    pub extra_charges: i64,
    #[serde(default)]
    pub shared_fee_total: i64,
    /// Meters sharing `shared_fee_total`; 0 means nobody pays it.
    #[serde(default = "default_meter_count")]
    pub meter_count: u32,
}

fn default_meter_count() -> u32 {
    1
}

impl QuoteRequest {
    pub fn into_inputs(self) -> Result<(BillInputs, String), BillingError> {
        check_quantity("previous_reading", self.previous_reading, MAX_READING_KWH)?;
        check_quantity("current_reading", self.current_reading, MAX_READING_KWH)?;
        check_quantity("price_per_kwh", self.price_per_kwh, MAX_PRICE_PER_KWH)?;
        for (name, v) in [
            ("reading_fee", self.reading_fee),
            ("general_fee", self.general_fee),
            ("extra_charges", self.extra_charges),
            ("shared_fee_total", self.shared_fee_total),
        ] {
            check_amount(name, v)?;
        }
        let inputs = BillInputs {
            owner: self.owner.trim().to_string(),
            serial: self.serial.filter(|s| !s.trim().is_empty()),
            previous_reading: self.previous_reading,
            current_reading: self.current_reading,
            price_per_kwh: self.price_per_kwh,
            reading_fee: self.reading_fee,
            general_fee: self.general_fee,
            extra_charges: self.extra_charges,
            shared_fee_total: self.shared_fee_total,
            meter_count: self.meter_count,
        };
        Ok((inputs, self.phone))
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    /// A CSV previously exported by this endpoint, to continue from.
    #[serde(default)]
    pub history_csv: Option<String>,
    pub entries: Vec<QuoteRequest>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::calculator::MAX_AMOUNT;

    fn quote() -> QuoteRequest {
        serde_json::from_value(serde_json::json!({
            "owner": "  Ana  ",
            "previous_reading": 0.0,
            "current_reading": MAX_READING_KWH,
            "price_per_kwh": MAX_PRICE_PER_KWH,
            "reading_fee": MAX_AMOUNT,
            "general_fee": MAX_AMOUNT,
            "extra_charges": MAX_AMOUNT,
            "shared_fee_total": MAX_AMOUNT,
        }))
        .unwrap()
    }

    #[test]
    fn largest_quote_is_accepted_and_billed() {
        let (inputs, phone) = quote().into_inputs().unwrap();
        assert_eq!(inputs.owner, "Ana");
        assert_eq!(inputs.meter_count, 1);
        assert!(phone.is_empty());

        let bill = inputs.compute();
        assert_eq!(bill.amounts.energy_amount, MAX_AMOUNT);
        assert_eq!(bill.amounts.total, 5 * MAX_AMOUNT);
    }

    #[test]
    fn oversized_reading_or_price_is_invalid() {
        let mut q = quote();
        q.current_reading = 1e17;
        let err = q.into_inputs().unwrap_err();
        assert!(matches!(err, BillingError::Invalid(_)));
        assert!(err.to_string().contains("current_reading"));

        let mut q = quote();
        q.price_per_kwh = 1e10;
        let err = q.into_inputs().unwrap_err();
        assert!(err.to_string().contains("price_per_kwh"));
    }

    #[test]
    fn oversized_fee_is_invalid() {
        let mut q = quote();
        q.extra_charges = i64::MAX;
        let err = q.into_inputs().unwrap_err();
        assert!(matches!(err, BillingError::Invalid(_)));
        assert!(err.to_string().contains("extra_charges"));

        let mut q = quote();
        q.shared_fee_total = MAX_AMOUNT + 1;
        assert!(q.into_inputs().is_err());
    }
}
