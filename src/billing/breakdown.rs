use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::calculator::{compute_bill, BillAmounts};

/// Every field a bill can show, in the order receipts list them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItem {
    Owner,
    Serial,
    PreviousReading,
    CurrentReading,
    Consumption,
    PricePerKwh,
    Energy,
    ReadingFee,
    SharedFee,
    GeneralFee,
    ExtraCharges,
}

impl LineItem {
    pub const ALL: [LineItem; 11] = [
        LineItem::Owner,
        LineItem::Serial,
        LineItem::PreviousReading,
        LineItem::CurrentReading,
        LineItem::Consumption,
        LineItem::PricePerKwh,
        LineItem::Energy,
        LineItem::ReadingFee,
        LineItem::SharedFee,
        LineItem::GeneralFee,
        LineItem::ExtraCharges,
    ];

    pub fn key(self) -> &'static str {
        match self {
            LineItem::Owner => "owner",
            LineItem::Serial => "serial",
            LineItem::PreviousReading => "previous_reading",
            LineItem::CurrentReading => "current_reading",
            LineItem::Consumption => "consumption",
            LineItem::PricePerKwh => "price_per_kwh",
            LineItem::Energy => "energy",
            LineItem::ReadingFee => "reading_fee",
            LineItem::SharedFee => "shared_fee",
            LineItem::GeneralFee => "general_fee",
            LineItem::ExtraCharges => "extra_charges",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LineItem::Owner => "Dueño",
            LineItem::Serial => "Medidor",
            LineItem::PreviousReading => "Lectura anterior",
            LineItem::CurrentReading => "Lectura actual",
            LineItem::Consumption => "Consumo",
            LineItem::PricePerKwh => "Precio kWh",
            LineItem::Energy => "Luz",
            LineItem::ReadingFee => "Toma de lectura",
            LineItem::SharedFee => "Portón",
            LineItem::GeneralFee => "Cargo general",
            LineItem::ExtraCharges => "Cobros extras",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown receipt field '{0}'")]
pub struct UnknownLineItem(pub String);

impl FromStr for LineItem {
    type Err = UnknownLineItem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        LineItem::ALL
            .into_iter()
            .find(|item| item.key() == key)
            .ok_or(UnknownLineItem(key))
    }
}

/// Which line items the customer receipt shows. The total is always shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLayout {
    customer_fields: Vec<LineItem>,
}

impl ReceiptLayout {
    pub fn new(fields: impl IntoIterator<Item = LineItem>) -> Self {
        let mut customer_fields: Vec<LineItem> = Vec::new();
        for f in fields {
            if !customer_fields.contains(&f) {
                customer_fields.push(f);
            }
        }
        Self { customer_fields }
    }

    pub fn shows(&self, item: LineItem) -> bool {
        self.customer_fields.contains(&item)
    }
}

impl Default for ReceiptLayout {
    fn default() -> Self {
        Self::new([
            LineItem::Owner,
            LineItem::Consumption,
            LineItem::Energy,
            LineItem::ReadingFee,
            LineItem::SharedFee,
        ])
    }
}

impl FromStr for ReceiptLayout {
    type Err = UnknownLineItem;

    /// Parses a comma separated list of field keys, e.g. `owner,consumption,energy`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(LineItem::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(fields))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Kwh(f64),
    PricePerKwh(f64),
    Pesos(i64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Kwh(v) => write!(f, "{} kWh", format_decimal(*v)),
            FieldValue::PricePerKwh(v) => write!(f, "${}/kWh", format_decimal(*v)),
            FieldValue::Pesos(v) => f.write_str(&format_clp(*v)),
        }
    }
}

/// `24480` -> `$24.480`
pub fn format_clp(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Up to two decimals with a decimal comma, trailing zeros dropped.
fn format_decimal(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.replace('.', ",")
}

/// Everything a bill is computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillInputs {
    pub owner: String,
    #[serde(default)]
    pub serial: Option<String>,
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
    #[serde(default)]
    pub meter_count: u32,
}

impl BillInputs {
    pub fn compute(self) -> Bill {
        let amounts = compute_bill(
            self.previous_reading,
            self.current_reading,
            self.price_per_kwh,
            &[self.reading_fee, self.general_fee, self.extra_charges],
            self.shared_fee_total,
            self.meter_count,
        );
        Bill {
            inputs: self,
            amounts,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bill {
    pub inputs: BillInputs,
    pub amounts: BillAmounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub item: LineItem,
    pub label: &'static str,
    pub value: FieldValue,
}

/// An ordered projection of a bill's fields plus its total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub lines: Vec<Line>,
    pub total: i64,
}

impl Breakdown {
    pub fn get(&self, item: LineItem) -> Option<&FieldValue> {
        self.lines.iter().find(|l| l.item == item).map(|l| &l.value)
    }
}

impl Bill {
    pub fn value(&self, item: LineItem) -> Option<FieldValue> {
        let i = &self.inputs;
        let a = &self.amounts;
        let v = match item {
            LineItem::Owner => FieldValue::Text(i.owner.clone()),
            LineItem::Serial => FieldValue::Text(i.serial.clone()?),
            LineItem::PreviousReading => FieldValue::Kwh(i.previous_reading),
            LineItem::CurrentReading => FieldValue::Kwh(i.current_reading),
            LineItem::Consumption => FieldValue::Kwh(a.consumption),
            LineItem::PricePerKwh => FieldValue::PricePerKwh(i.price_per_kwh),
            LineItem::Energy => FieldValue::Pesos(a.energy_amount),
            LineItem::ReadingFee => FieldValue::Pesos(i.reading_fee),
            LineItem::SharedFee => FieldValue::Pesos(a.shared_fee_per_meter),
            LineItem::GeneralFee => FieldValue::Pesos(i.general_fee),
            LineItem::ExtraCharges => FieldValue::Pesos(i.extra_charges),
        };
        Some(v)
    }

    /// Every input and subtotal, for internal export.
    pub fn full(&self) -> Breakdown {
        self.project(|_| true)
    }

    /// Only the fields the layout shows; the total is the same as [`Bill::full`].
    pub fn customer_view(&self, layout: &ReceiptLayout) -> Breakdown {
        self.project(|item| layout.shows(item))
    }

    fn project(&self, keep: impl Fn(LineItem) -> bool) -> Breakdown {
        let lines = LineItem::ALL
            .into_iter()
            .filter(|item| keep(*item))
            .filter_map(|item| {
                self.value(item).map(|value| Line {
                    item,
                    label: item.label(),
                    value,
                })
            })
            .collect();
        Breakdown {
            lines,
            total: self.amounts.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Bill {
        BillInputs {
            owner: "Rosa Pérez".into(),
            serial: Some("MX-2291".into()),
            previous_reading: 1200.0,
            current_reading: 1350.0,
            price_per_kwh: 155.2,
            reading_fee: 1200,
            general_fee: 0,
            extra_charges: 0,
            shared_fee_total: 0,
            meter_count: 3,
        }
        .compute()
    }

    #[test]
    fn full_breakdown_lists_every_field() {
        let full = sample().full();
        assert_eq!(full.lines.len(), LineItem::ALL.len());
        assert_eq!(full.total, 24480);
        assert_eq!(full.get(LineItem::Energy), Some(&FieldValue::Pesos(23280)));
    }

    #[test]
    fn serial_is_skipped_when_absent() {
        let mut bill = sample();
        bill.inputs.serial = None;
        assert!(bill.full().get(LineItem::Serial).is_none());
    }

    #[test]
    fn customer_view_is_subset_with_same_total() {
        let bill = sample();
        let full = bill.full();
        let layouts = [
            ReceiptLayout::default(),
            ReceiptLayout::new(Vec::<LineItem>::new()),
            ReceiptLayout::new(LineItem::ALL),
            ReceiptLayout::new([LineItem::ExtraCharges, LineItem::Owner]),
        ];
        for layout in &layouts {
            let view = bill.customer_view(layout);
            assert_eq!(view.total, full.total);
            for line in &view.lines {
                assert_eq!(full.get(line.item), Some(&line.value));
            }
        }
    }

    #[test]
    fn customer_view_keeps_canonical_order() {
        let layout = ReceiptLayout::new([LineItem::Energy, LineItem::Owner, LineItem::Energy]);
        let view = sample().customer_view(&layout);
        let items: Vec<_> = view.lines.iter().map(|l| l.item).collect();
        assert_eq!(items, vec![LineItem::Owner, LineItem::Energy]);
    }

    #[test]
    fn layout_parses_keys() {
        let layout: ReceiptLayout = " owner, Energy ,,shared_fee".parse().unwrap();
        assert!(layout.shows(LineItem::Owner));
        assert!(layout.shows(LineItem::Energy));
        assert!(layout.shows(LineItem::SharedFee));
        assert!(!layout.shows(LineItem::ReadingFee));

        let err = "owner,cobros".parse::<ReceiptLayout>().unwrap_err();
        assert!(err.to_string().contains("cobros"));
    }

    #[test]
    fn formats_values() {
        assert_eq!(format_clp(24480), "$24.480");
        assert_eq!(format_clp(0), "$0");
        assert_eq!(format_clp(999), "$999");
        assert_eq!(format_clp(1_000_000), "$1.000.000");
        assert_eq!(format_clp(-1500), "-$1.500");
        assert_eq!(FieldValue::Kwh(150.0).to_string(), "150 kWh");
        assert_eq!(FieldValue::Kwh(12.5).to_string(), "12,5 kWh");
        assert_eq!(FieldValue::PricePerKwh(155.2).to_string(), "$155,2/kWh");
    }
}
