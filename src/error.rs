use axum::http::StatusCode;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("meter not found")]
    MeterNotFound,
    #[error("insufficient history: at least two readings are required")]
    InsufficientHistory,
    #[error("incompatible file: {0}")]
    IncompatibleFile(String),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BillingError {
    pub fn status(&self) -> StatusCode {
        match self {
            BillingError::MeterNotFound => StatusCode::NOT_FOUND,
            BillingError::InsufficientHistory | BillingError::IncompatibleFile(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            BillingError::Invalid(_) => StatusCode::BAD_REQUEST,
            BillingError::Conflict(_) => StatusCode::CONFLICT,
            BillingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BillingError> for (StatusCode, String) {
    fn from(e: BillingError) -> Self {
        let status = e.status();
        if status.is_server_error() {
            error!(error = %e, "internal error");
            return (status, "Internal server error".into());
        }
        (status, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_status_and_message() {
        let (status, msg): (StatusCode, String) = BillingError::InsufficientHistory.into();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(msg.contains("two readings"));

        let (status, msg): (StatusCode, String) = BillingError::MeterNotFound.into();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(msg, "meter not found");

        let (status, msg): (StatusCode, String) =
            BillingError::Internal(anyhow::anyhow!("connection reset")).into();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!msg.contains("connection reset"));
    }
}
