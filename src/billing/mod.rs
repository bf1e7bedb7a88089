//! Bill computation and everything derived from a computed bill: the full and
//! customer breakdowns, rendered receipts and batch exports.

pub mod breakdown;
pub mod calculator;
pub mod ledger;
pub mod receipt;

pub use breakdown::{Bill, BillInputs, Breakdown, ReceiptLayout};
pub use ledger::Ledger;
pub use receipt::{receipt_text, whatsapp_link, PdfReceipt, ReceiptRenderer, TextReceipt};
