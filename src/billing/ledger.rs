use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::breakdown::Bill;
use crate::error::BillingError;

/// One exported row: the full breakdown of a processed bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub owner: String,
    pub serial: String,
    pub previous_reading: f64,
    pub current_reading: f64,
    pub consumption: f64,
    pub price_per_kwh: f64,
    pub energy: i64,
    pub reading_fee: i64,
    pub shared_fee: i64,
    pub general_fee: i64,
    pub extra_charges: i64,
    pub total: i64,
}

impl From<&Bill> for LedgerEntry {
    fn from(bill: &Bill) -> Self {
        let i = &bill.inputs;
        let a = &bill.amounts;
        Self {
            owner: i.owner.clone(),
            serial: i.serial.clone().unwrap_or_default(),
            previous_reading: i.previous_reading,
            current_reading: i.current_reading,
            consumption: a.consumption,
            price_per_kwh: i.price_per_kwh,
            energy: a.energy_amount,
            reading_fee: i.reading_fee,
            shared_fee: a.shared_fee_per_meter,
            general_fee: i.general_fee,
            extra_charges: i.extra_charges,
            total: a.total,
        }
    }
}

impl LedgerEntry {
    /// Money columns are non-negative and the total equals their sum.
    fn is_consistent(&self) -> bool {
        let items = [
            self.energy,
            self.reading_fee,
            self.shared_fee,
            self.general_fee,
            self.extra_charges,
        ];
        if self.consumption < 0.0 || self.total < 0 || items.iter().any(|v| *v < 0) {
            return false;
        }
        let sum = items.iter().try_fold(0i64, |acc, v| acc.checked_add(*v));
        sum == Some(self.total)
    }
}

/// Append-only list of processed bills, owned by whoever is building a batch.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bill: &Bill) {
        self.entries.push(LedgerEntry::from(bill));
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Loads rows from a previous export. All or nothing: on any error the
    /// ledger is left as it was.
    pub fn import_csv(&mut self, data: &[u8]) -> Result<usize, BillingError> {
        let mut rdr = csv::Reader::from_reader(data);
        let mut rows = Vec::new();
        for (idx, record) in rdr.deserialize::<LedgerEntry>().enumerate() {
            // header is line 1
            let line = idx + 2;
            let entry = record
                .map_err(|e| BillingError::IncompatibleFile(format!("line {line}: {e}")))?;
            if !entry.is_consistent() {
                return Err(BillingError::IncompatibleFile(format!(
                    "line {line}: total does not match its line items"
                )));
            }
            rows.push(entry);
        }
        let n = rows.len();
        self.entries.extend(rows);
        Ok(n)
    }

    pub fn export_csv(&self) -> anyhow::Result<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        if self.entries.is_empty() {
            wtr.write_record(HEADERS).context("write csv header")?;
        }
        for entry in &self.entries {
            wtr.serialize(entry).context("write csv row")?;
        }
        wtr.into_inner().context("flush csv")
    }
}

const HEADERS: [&str; 12] = [
    "owner",
    "serial",
    "previous_reading",
    "current_reading",
    "consumption",
    "price_per_kwh",
    "energy",
    "reading_fee",
    "shared_fee",
    "general_fee",
    "extra_charges",
    "total",
];
