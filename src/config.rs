use anyhow::Context;

use crate::billing::ReceiptLayout;

#[derive(Debug, Clone)]
pub struct ReceiptConfig {
    pub title: String,
    pub customer_layout: ReceiptLayout,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub receipt: ReceiptConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let customer_layout = match std::env::var("RECEIPT_CUSTOMER_FIELDS") {
            Ok(fields) => fields
                .parse::<ReceiptLayout>()
                .context("invalid RECEIPT_CUSTOMER_FIELDS")?,
            Err(_) => ReceiptLayout::default(),
        };
        let receipt = ReceiptConfig {
            title: std::env::var("RECEIPT_TITLE").unwrap_or_else(|_| "BOLETA DE CONSUMO".into()),
            customer_layout,
        };
        Ok(Self {
            database_url,
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
            receipt,
        })
    }
}
