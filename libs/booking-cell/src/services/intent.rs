// libs/booking-cell/src/services/intent.rs
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{PaymentIntent, PaymentIntentRequest};
use crate::services::payment::PaymentGateway;
use crate::services::store::DocumentStore;

/// Creates the payment intent a client pays before reserving a slot.
pub struct PaymentIntentService {
    store: Arc<dyn DocumentStore>,
    payments: Arc<dyn PaymentGateway>,
}

impl PaymentIntentService {
    pub fn new(store: Arc<dyn DocumentStore>, payments: Arc<dyn PaymentGateway>) -> Self {
        Self { store, payments }
    }

    pub async fn create_for_doctor(
        &self,
        doctor_id: Uuid,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, LedgerError> {
        if request.amount <= 0 {
            return Err(LedgerError::InvalidInput("amount must be positive".to_string()));
        }
        if request.currency.trim().is_empty() {
            return Err(LedgerError::InvalidInput("currency is required".to_string()));
        }

        self.store
            .find_doctor_by_id(doctor_id)
            .await?
            .ok_or_else(LedgerError::doctor_not_found)?;

        let intent = self.payments.create_payment_intent(&request).await?;
        info!("Payment intent {} created for doctor {}", intent.id, doctor_id);
        Ok(intent)
    }
}
