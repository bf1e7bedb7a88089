use sqlx::PgPool;
use tracing::{info, warn};

use super::dto::{BatchRequest, BillResponse};
use crate::billing::{receipt_text, whatsapp_link, Bill, BillInputs, Ledger, ReceiptLayout};
use crate::error::BillingError;
use crate::meters::{repo_types::Meter, services::lookup_by_serial};
use crate::pricing::repo::PricingConfig;
use crate::readings::{repo_types::Reading, services::consumption_window};

pub struct MeterBill {
    pub meter: Meter,
    pub bill: Bill,
}

/// Bills a meter from its two latest readings and the current pricing.
pub async fn bill_for_serial(db: &PgPool, serial: &str) -> Result<MeterBill, BillingError> {
    let meter = lookup_by_serial(db, serial).await?;
    let latest = Reading::latest_two(db, meter.id).await?;
    let (previous, current) = consumption_window(&latest).map_err(|e| {
        warn!(meter_id = %meter.id, readings = latest.len(), "not enough readings to bill");
        e
    })?;
    let pricing = PricingConfig::get(db).await?;
    let meter_count = Meter::count(db).await?;

    let bill = BillInputs {
        owner: meter.owner_name.clone(),
        serial: Some(meter.serial.clone()),
        previous_reading: previous,
        current_reading: current,
        price_per_kwh: pricing.price_per_kwh,
        reading_fee: pricing.reading_fee,
        general_fee: pricing.general_fee,
        extra_charges: 0,
        shared_fee_total: pricing.shared_fee_total,
        meter_count: u32::try_from(meter_count).unwrap_or(u32::MAX),
    }
    .compute();

    info!(
        meter_id = %meter.id,
        serial = %meter.serial,
        consumption = bill.amounts.consumption,
        total = bill.amounts.total,
        "bill computed"
    );
    Ok(MeterBill { meter, bill })
}

pub fn warnings(bill: &Bill) -> Vec<String> {
    let mut out = Vec::new();
    if bill.amounts.clamped {
        warn!(
            previous = bill.inputs.previous_reading,
            current = bill.inputs.current_reading,
            "current reading below previous; consumption clamped to zero"
        );
        out.push(format!(
            "current reading {} is below previous reading {}; consumption set to 0",
            bill.inputs.current_reading, bill.inputs.previous_reading
        ));
    }
    out
}

pub fn bill_response(bill: &Bill, phone: &str, layout: &ReceiptLayout) -> BillResponse {
    let customer = bill.customer_view(layout);
    let text = receipt_text(&customer);
    BillResponse {
        full: bill.full(),
        whatsapp_url: whatsapp_link(phone, &bill.inputs.owner, &text),
        receipt_text: text,
        customer,
        warnings: warnings(bill),
    }
}

/// Imports the history first so a bad file aborts before anything is computed.
pub fn run_batch(req: BatchRequest) -> Result<Ledger, BillingError> {
    let mut ledger = Ledger::new();
    if let Some(history) = req.history_csv.as_deref() {
        let n = ledger.import_csv(history.as_bytes())?;
        info!(rows = n, "batch history imported");
    }
    let bills = req
        .entries
        .into_iter()
        .map(|entry| entry.into_inputs().map(|(inputs, _)| inputs.compute()))
        .collect::<Result<Vec<_>, _>>()?;
    for bill in &bills {
        if bill.amounts.clamped {
            warn!(owner = %bill.inputs.owner, "consumption clamped to zero");
        }
        ledger.push(bill);
    }
    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bills::dto::QuoteRequest;

    fn quote(owner: &str, previous: f64, current: f64) -> QuoteRequest {
        QuoteRequest {
            owner: owner.into(),
            serial: None,
            phone: String::new(),
            previous_reading: previous,
            current_reading: current,
            price_per_kwh: 150.0,
            reading_fee: 1000,
            general_fee: 0,
            extra_charges: 0,
            shared_fee_total: 0,
            meter_count: 1,
        }
    }

    #[test]
    fn response_totals_agree() {
        let (inputs, phone) = quote("Ana", 100.0, 90.0).into_inputs().unwrap();
        let bill = inputs.compute();
        let resp = bill_response(&bill, &phone, &ReceiptLayout::default());
        assert_eq!(resp.full.total, resp.customer.total);
        assert_eq!(resp.full.total, 1000);
        assert_eq!(resp.warnings.len(), 1);
        assert!(resp.whatsapp_url.is_none());
        assert!(resp.receipt_text.ends_with("TOTAL: $1.000"));
    }

    #[test]
    fn batch_appends_after_history() {
        let first = run_batch(BatchRequest {
            history_csv: None,
            entries: vec![quote("Ana", 0.0, 10.0)],
        })
        .unwrap();
        let csv = String::from_utf8(first.export_csv().unwrap()).unwrap();

        let second = run_batch(BatchRequest {
            history_csv: Some(csv),
            entries: vec![quote("Luis", 5.0, 7.0), quote("Eva", 1.0, 2.0)],
        })
        .unwrap();
        let owners: Vec<_> = second.entries().iter().map(|e| e.owner.as_str()).collect();
        assert_eq!(owners, vec!["Ana", "Luis", "Eva"]);
    }

    #[test]
    fn bad_history_aborts_batch() {
        let err = run_batch(BatchRequest {
            history_csv: Some("just,some\nrandom,text\n".into()),
            entries: vec![quote("Ana", 0.0, 10.0)],
        })
        .unwrap_err();
        assert!(matches!(err, BillingError::IncompatibleFile(_)));
    }

    #[test]
    fn invalid_entry_rejects_batch() {
        let mut bad = quote("Ana", 0.0, 10.0);
        bad.reading_fee = -10;
        let err = run_batch(BatchRequest {
            history_csv: None,
            entries: vec![quote("Luis", 0.0, 1.0), bad],
        })
        .unwrap_err();
        assert!(err.to_string().contains("reading_fee"));
    }
}
