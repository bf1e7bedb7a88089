use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{BatchRequest, BillResponse, QuoteRequest};
use super::services::{bill_for_serial, bill_response, run_batch};
use crate::{
    billing::{Breakdown, Ledger, PdfReceipt, ReceiptRenderer, TextReceipt},
    error::BillingError,
    state::AppState,
};

type Download = (HeaderMap, Vec<u8>);

pub fn bill_routes() -> Router<AppState> {
    Router::new()
        .route("/bills/:serial", get(get_bill))
        .route("/bills/:serial/receipt.pdf", get(get_bill_pdf))
        .route("/bills/:serial/receipt.txt", get(get_bill_text))
        .route("/bills/:serial/breakdown.csv", get(get_bill_csv))
}

pub fn quote_routes() -> Router<AppState> {
    Router::new()
        .route("/quotes", post(create_quote))
        .route("/quotes/receipt.pdf", post(create_quote_pdf))
        .route("/quotes/batch", post(create_batch))
}

#[instrument(skip(state))]
pub async fn get_bill(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<Json<BillResponse>, (StatusCode, String)> {
    let mb = bill_for_serial(&state.db, &serial).await?;
    Ok(Json(bill_response(
        &mb.bill,
        &mb.meter.phone,
        &state.config.receipt.customer_layout,
    )))
}

#[instrument(skip(state))]
pub async fn get_bill_pdf(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<Download, (StatusCode, String)> {
    let mb = bill_for_serial(&state.db, &serial).await?;
    let view = mb.bill.customer_view(&state.config.receipt.customer_layout);
    render(&pdf_renderer(&state), &view)
}

#[instrument(skip(state))]
pub async fn get_bill_text(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<Download, (StatusCode, String)> {
    let mb = bill_for_serial(&state.db, &serial).await?;
    let view = mb.bill.customer_view(&state.config.receipt.customer_layout);
    render(&TextReceipt, &view)
}

#[instrument(skip(state))]
pub async fn get_bill_csv(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> Result<Download, (StatusCode, String)> {
    let mb = bill_for_serial(&state.db, &serial).await?;
    let mut ledger = Ledger::new();
    ledger.push(&mb.bill);
    csv_download(&ledger, "desglose.csv")
}

#[instrument(skip(state, payload), fields(owner = %payload.owner))]
pub async fn create_quote(
    State(state): State<AppState>,
    Json(payload): Json<QuoteRequest>,
) -> Result<Json<BillResponse>, (StatusCode, String)> {
    let (inputs, phone) = payload.into_inputs()?;
    let bill = inputs.compute();
    Ok(Json(bill_response(
        &bill,
        &phone,
        &state.config.receipt.customer_layout,
    )))
}

#[instrument(skip(state, payload), fields(owner = %payload.owner))]
pub async fn create_quote_pdf(
    State(state): State<AppState>,
    Json(payload): Json<QuoteRequest>,
) -> Result<Download, (StatusCode, String)> {
    let (inputs, _) = payload.into_inputs()?;
    let view = inputs
        .compute()
        .customer_view(&state.config.receipt.customer_layout);
    render(&pdf_renderer(&state), &view)
}

#[instrument(skip(payload), fields(entries = payload.entries.len()))]
pub async fn create_batch(
    Json(payload): Json<BatchRequest>,
) -> Result<Download, (StatusCode, String)> {
    let ledger = run_batch(payload)?;
    info!(rows = ledger.len(), "batch exported");
    csv_download(&ledger, "boletas.csv")
}

fn pdf_renderer(state: &AppState) -> PdfReceipt {
    PdfReceipt {
        title: state.config.receipt.title.clone(),
    }
}

fn render(
    renderer: &dyn ReceiptRenderer,
    view: &Breakdown,
) -> Result<Download, (StatusCode, String)> {
    let body = renderer.render(view).map_err(BillingError::from)?;
    Ok((attachment(renderer.content_type(), renderer.file_name()), body))
}

fn csv_download(ledger: &Ledger, file_name: &str) -> Result<Download, (StatusCode, String)> {
    let body = ledger.export_csv().map_err(BillingError::from)?;
    Ok((attachment("text/csv; charset=utf-8", file_name), body))
}

fn attachment(content_type: &'static str, file_name: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Ok(v) = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, v);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote() -> QuoteRequest {
        serde_json::from_value(serde_json::json!({
            "owner": "Rosa Pérez",
            "phone": "+56 9 1234 5678",
            "previous_reading": 1200,
            "current_reading": 1350,
            "price_per_kwh": 155.2,
            "reading_fee": 1200
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn quote_matches_worked_example() {
        let Json(resp) = create_quote(State(AppState::fake()), Json(quote()))
            .await
            .unwrap();
        assert_eq!(resp.full.total, 24480);
        assert_eq!(resp.customer.total, 24480);
        assert!(resp.warnings.is_empty());
        let url = resp.whatsapp_url.unwrap();
        assert!(url.starts_with("https://wa.me/56912345678?text=Hola%20Rosa%20P%C3%A9rez"));
    }

    #[tokio::test]
    async fn quote_rejects_negative_price() {
        let mut q = quote();
        q.price_per_kwh = -1.0;
        let err = create_quote(State(AppState::fake()), Json(q))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn quote_pdf_is_an_attachment() {
        let (headers, body) = create_quote_pdf(State(AppState::fake()), Json(quote()))
            .await
            .unwrap();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("boleta.pdf"));
        assert!(body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn batch_with_bad_history_is_unprocessable() {
        let err = create_batch(Json(BatchRequest {
            history_csv: Some("no,valid\ncolumns,here\n".into()),
            entries: vec![quote()],
        }))
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.1.starts_with("incompatible file"));
    }

    #[tokio::test]
    async fn batch_exports_csv() {
        let (headers, body) = create_batch(Json(BatchRequest {
            history_csv: None,
            entries: vec![quote(), quote()],
        }))
        .await
        .unwrap();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
        let text = String::from_utf8(body).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(1).unwrap().ends_with(",24480"));
    }
}
