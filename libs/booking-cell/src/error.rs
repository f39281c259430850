// libs/booking-cell/src/error.rs
use thiserror::Error;

use shared_models::error::AppError;

/// Failure reported by a [`DocumentStore`](crate::services::store::DocumentStore).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Failure reported by a [`PaymentGateway`](crate::services::payment::PaymentGateway).
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct PaymentGatewayError(pub String);

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("No available slots for {day}")]
    NoAvailability { day: String },

    #[error("Slot {slot} on {day} is not available")]
    SlotTaken { day: String, slot: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Booking is already completed, it can't be cancelled")]
    AlreadyCompleted,

    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl LedgerError {
    pub fn doctor_not_found() -> Self {
        LedgerError::NotFound("Doctor".to_string())
    }

    pub fn booking_not_found() -> Self {
        LedgerError::NotFound("Booking".to_string())
    }

    /// Only failures with an external cause may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::PaymentGateway(_) | LedgerError::Store(_))
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        LedgerError::Store(err.0)
    }
}

impl From<PaymentGatewayError> for LedgerError {
    fn from(err: PaymentGatewayError) -> Self {
        LedgerError::PaymentGateway(err.0)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::NotFound(_) => AppError::NotFound(message),
            LedgerError::NoAvailability { .. }
            | LedgerError::SlotTaken { .. }
            | LedgerError::AlreadyCompleted => AppError::BadRequest(message),
            LedgerError::InvalidInput(_) => AppError::ValidationError(message),
            LedgerError::PaymentGateway(_) => AppError::ExternalService(message),
            LedgerError::Store(_) => AppError::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn only_external_failures_are_retryable() {
        assert!(LedgerError::Store("timeout".into()).is_retryable());
        assert!(LedgerError::PaymentGateway("declined".into()).is_retryable());
        assert!(!LedgerError::AlreadyCompleted.is_retryable());
        assert!(!LedgerError::doctor_not_found().is_retryable());
        assert!(!LedgerError::SlotTaken { day: "d".into(), slot: "s".into() }.is_retryable());
    }

    #[test]
    fn converts_to_app_error() {
        assert_matches!(AppError::from(LedgerError::booking_not_found()), AppError::NotFound(msg) if msg == "Booking not found");
        assert_matches!(AppError::from(LedgerError::AlreadyCompleted), AppError::BadRequest(_));
        assert_matches!(AppError::from(LedgerError::InvalidInput("x".into())), AppError::ValidationError(_));
        assert_matches!(AppError::from(LedgerError::from(PaymentGatewayError("card".into()))), AppError::ExternalService(_));
        assert_matches!(AppError::from(LedgerError::from(StoreError("down".into()))), AppError::Database(_));
    }
}
