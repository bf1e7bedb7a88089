use serde::Serialize;

use crate::error::BillingError;

/// Largest meter reading accepted from callers, in kWh.
pub const MAX_READING_KWH: f64 = 1e9;
/// Largest price per kWh accepted from callers, in CLP.
pub const MAX_PRICE_PER_KWH: f64 = 1e6;
/// Largest single money amount accepted from callers, in CLP. A maximal
/// reading at a maximal price bills exactly this much energy.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Amounts derived from two meter readings and the applicable charges.
///
/// Money is whole Chilean pesos; consumption keeps the meter's precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BillAmounts {
    pub consumption: f64,
    pub energy_amount: i64,
    pub shared_fee_per_meter: i64,
    pub total: i64,
    /// The current reading was below the previous one and consumption was clamped to zero.
    pub clamped: bool,
}

/// Computes a bill. Never fails: negative deltas clamp to zero, a zero meter
/// count yields a zero shared fee and non-finite inputs count as zero.
/// Amounts past `i64::MAX` saturate; inputs within the `MAX_*` limits never
/// get there.
pub fn compute_bill(
    previous_reading: f64,
    current_reading: f64,
    price_per_unit: f64,
    fixed_fees: &[i64],
    shared_fee_total: i64,
    meter_count: u32,
) -> BillAmounts {
    let previous = finite_or_zero(previous_reading);
    let current = finite_or_zero(current_reading);
    let price = finite_or_zero(price_per_unit);

    let delta = current - previous;
    let clamped = delta < 0.0;
    let consumption = delta.max(0.0);

    let energy_amount = to_pesos(consumption * price);
    let shared_fee_per_meter = shared_fee_share(shared_fee_total, meter_count);
    let fees = fixed_fees.iter().fold(0i64, |acc, fee| acc.saturating_add(*fee));

    BillAmounts {
        consumption,
        energy_amount,
        shared_fee_per_meter,
        total: energy_amount
            .saturating_add(fees)
            .saturating_add(shared_fee_per_meter),
        clamped,
    }
}

/// Even share of a facility fee across registered meters, rounded to the peso.
pub fn shared_fee_share(shared_fee_total: i64, meter_count: u32) -> i64 {
    if meter_count == 0 {
        return 0;
    }
    to_pesos(shared_fee_total as f64 / f64::from(meter_count))
}

/// Rejects a reading or price that is negative, non-finite or above `max`.
pub fn check_quantity(name: &str, value: f64, max: f64) -> Result<f64, BillingError> {
    if !value.is_finite() || value < 0.0 {
        return Err(BillingError::Invalid(format!(
            "{name} must be a non-negative number, got {value}"
        )));
    }
    if value > max {
        return Err(BillingError::Invalid(format!("{name} must not exceed {max}")));
    }
    Ok(value)
}

/// Rejects a money amount that is negative or above `MAX_AMOUNT`.
pub fn check_amount(name: &str, value: i64) -> Result<i64, BillingError> {
    if value < 0 {
        return Err(BillingError::Invalid(format!("{name} must not be negative")));
    }
    if value > MAX_AMOUNT {
        return Err(BillingError::Invalid(format!("{name} must not exceed {MAX_AMOUNT}")));
    }
    Ok(value)
}

fn to_pesos(amount: f64) -> i64 {
    // f64::round rounds half away from zero; the cast saturates at the i64 bounds
    amount.round() as i64
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
