use anyhow::Context;
use lopdf::{
    content::{Content, Operation},
    dictionary, Document, Object, Stream, StringFormat,
};

use super::breakdown::{format_clp, Breakdown};

/// Turns a customer view into a downloadable document.
pub trait ReceiptRenderer: Send + Sync {
    fn content_type(&self) -> &'static str;
    fn file_name(&self) -> &'static str;
    fn render(&self, view: &Breakdown) -> anyhow::Result<Vec<u8>>;
}

/// One `Label: value` line per field, then the total.
pub fn receipt_text(view: &Breakdown) -> String {
    let mut out = String::new();
    for line in &view.lines {
        out.push_str(&format!("{}: {}\n", line.label, line.value));
    }
    out.push_str(&format!("TOTAL: {}", format_clp(view.total)));
    out
}

/// `https://wa.me/<phone>?text=<message>`, or `None` when the phone is empty.
pub fn whatsapp_link(phone: &str, owner: &str, receipt: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let message = format!("Hola {owner}, tu cobro de luz es:\n{receipt}");
    Some(format!(
        "https://wa.me/{digits}?text={}",
        urlencoding::encode(&message)
    ))
}

pub struct TextReceipt;

impl ReceiptRenderer for TextReceipt {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn file_name(&self) -> &'static str {
        "boleta.txt"
    }

    fn render(&self, view: &Breakdown) -> anyhow::Result<Vec<u8>> {
        Ok(receipt_text(view).into_bytes())
    }
}

/// Single A4 page, Helvetica, WinAnsi encoded.
pub struct PdfReceipt {
    pub title: String,
}

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 72;
const LINE_HEIGHT: i64 = 22;

impl ReceiptRenderer for PdfReceipt {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn file_name(&self) -> &'static str {
        "boleta.pdf"
    }

    fn render(&self, view: &Breakdown) -> anyhow::Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut y = PAGE_HEIGHT - MARGIN;
        let mut ops = Vec::new();
        text_at(&mut ops, "F2", 16, MARGIN, y, &self.title);
        // rule under the title
        ops.push(Operation::new("m", vec![MARGIN.into(), (y - 8).into()]));
        ops.push(Operation::new(
            "l",
            vec![(PAGE_WIDTH - MARGIN).into(), (y - 8).into()],
        ));
        ops.push(Operation::new("S", vec![]));
        y -= LINE_HEIGHT * 2;

        for line in &view.lines {
            text_at(
                &mut ops,
                "F1",
                12,
                MARGIN,
                y,
                &format!("{}: {}", line.label, line.value),
            );
            y -= LINE_HEIGHT;
        }
        y -= LINE_HEIGHT;
        text_at(
            &mut ops,
            "F2",
            14,
            MARGIN,
            y,
            &format!("Total a pagar: {}", format_clp(view.total)),
        );

        let content = Content { operations: ops };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().context("encode receipt content")?,
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).context("write receipt pdf")?;
        Ok(out)
    }
}

fn text_at(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(win_ansi(text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// Latin-1 covers the Spanish alphabet; anything else becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::breakdown::{BillInputs, ReceiptLayout};

    fn view() -> Breakdown {
        BillInputs {
            owner: "Rosa Pérez".into(),
            serial: Some("MX-2291".into()),
            previous_reading: 1200.0,
            current_reading: 1350.0,
            price_per_kwh: 155.2,
            reading_fee: 1200,
            general_fee: 500,
            extra_charges: 0,
            shared_fee_total: 9000,
            meter_count: 3,
        }
        .compute()
        .customer_view(&ReceiptLayout::default())
    }

    #[test]
    fn text_receipt_lists_customer_fields() {
        let text = receipt_text(&view());
        assert_eq!(
            text,
            "Dueño: Rosa Pérez\nConsumo: 150 kWh\nLuz: $23.280\nToma de lectura: $1.200\nPortón: $3.000\nTOTAL: $27.980"
        );
        assert!(!text.contains("Cargo general"));
    }

    #[test]
    fn whatsapp_link_encodes_message() {
        let link = whatsapp_link("+56 9 1234 5678", "Rosa", "TOTAL: $1.000").unwrap();
        assert!(link.starts_with("https://wa.me/56912345678?text="));
        assert!(link.contains("Hola%20Rosa%2C%20tu%20cobro%20de%20luz%20es%3A%0ATOTAL%3A%20%241.000"));
        assert!(whatsapp_link("", "Rosa", "x").is_none());
    }

    #[test]
    fn pdf_receipt_is_a_single_page() {
        let renderer = PdfReceipt {
            title: "BOLETA DE CONSUMO".into(),
        };
        let bytes = renderer.render(&view()).expect("render pdf");
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).expect("parse pdf");
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let content = doc.get_page_content(page_id).expect("page content");
        let content = String::from_utf8_lossy(&content);
        assert!(content.contains("Total a pagar: $27.980"));
    }

    #[test]
    fn win_ansi_keeps_spanish_letters() {
        assert_eq!(win_ansi("Ñandú"), vec![0xD1, b'a', b'n', b'd', 0xFA]);
        assert_eq!(win_ansi("a→b"), b"a?b".to_vec());
    }
}
