use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::BillingError;
use crate::meters::{dto::RegisterMeterRequest, repo_types::Meter};

lazy_static! {
    static ref PHONE_SEPARATORS: Regex = Regex::new(r"[\s\-().]").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{8,15}$").unwrap();
}

/// Digits only, as `wa.me` expects them. Empty input stays empty.
pub(crate) fn normalize_phone(raw: &str) -> Result<String, BillingError> {
    let compact = PHONE_SEPARATORS.replace_all(raw.trim(), "");
    if compact.is_empty() {
        return Ok(String::new());
    }
    if !PHONE_RE.is_match(&compact) {
        return Err(BillingError::Invalid(format!("invalid phone number '{raw}'")));
    }
    Ok(compact.trim_start_matches('+').to_string())
}

/// Escape LIKE wildcards so user input only ever matches literally.
pub(crate) fn like_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub async fn register_meter(db: &PgPool, req: RegisterMeterRequest) -> Result<Meter, BillingError> {
    let serial = req.serial.trim();
    if serial.is_empty() {
        return Err(BillingError::Invalid("serial is required".into()));
    }
    let owner_name = req.owner_name.trim();
    if owner_name.is_empty() {
        return Err(BillingError::Invalid("owner_name is required".into()));
    }
    let phone = normalize_phone(&req.phone)?;

    match Meter::create(db, serial, owner_name, req.location.trim(), &phone).await? {
        Some(meter) => {
            info!(meter_id = %meter.id, serial = %meter.serial, "meter registered");
            Ok(meter)
        }
        None => {
            warn!(%serial, "serial already registered");
            Err(BillingError::Conflict(format!("serial '{serial}' is already registered")))
        }
    }
}

pub async fn lookup_by_serial(db: &PgPool, serial: &str) -> Result<Meter, BillingError> {
    let serial = serial.trim();
    if serial.is_empty() {
        return Err(BillingError::MeterNotFound);
    }
    Meter::find_by_serial(db, serial, &like_escape(serial))
        .await?
        .ok_or(BillingError::MeterNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_chilean_numbers() {
        assert_eq!(normalize_phone("+56 9 1234 5678").unwrap(), "56912345678");
        assert_eq!(normalize_phone("(56) 9-1234-5678").unwrap(), "56912345678");
        assert_eq!(normalize_phone("   ").unwrap(), "");
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(normalize_phone("12345"), Err(BillingError::Invalid(_))));
        assert!(normalize_phone("56912abc678").is_err());
        assert!(normalize_phone("+56+912345678").is_err());
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(like_escape("MX-22"), "MX-22");
        assert_eq!(like_escape("50%_a\\b"), "50\\%\\_a\\\\b");
    }

    #[tokio::test]
    async fn blank_serial_is_not_looked_up() {
        let state = crate::state::AppState::fake();
        let err = lookup_by_serial(&state.db, "  ").await.unwrap_err();
        assert!(matches!(err, BillingError::MeterNotFound));
    }

    #[tokio::test]
    async fn registration_validates_before_touching_the_database() {
        let state = crate::state::AppState::fake();
        let req = RegisterMeterRequest {
            serial: " ".into(),
            owner_name: "Rosa".into(),
            location: String::new(),
            phone: String::new(),
        };
        let err = register_meter(&state.db, req).await.unwrap_err();
        assert!(err.to_string().contains("serial"));

        let req = RegisterMeterRequest {
            serial: "MX-1".into(),
            owner_name: "Rosa".into(),
            location: String::new(),
            phone: "abc".into(),
        };
        let err = register_meter(&state.db, req).await.unwrap_err();
        assert!(err.to_string().contains("phone"));
    }
}
