// libs/booking-cell/src/services/store.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::StoreError;
use crate::models::{Booking, BookingWithDoctor, Doctor, NewBooking};

/// Persistence used by the slot ledger. Every call stands alone; there is no
/// transaction spanning a doctor write and a booking write.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_doctor_by_id(&self, doctor_id: Uuid) -> Result<Option<Doctor>, StoreError>;

    /// Persist the doctor's `available_slots`. No other doctor field is written.
    async fn save_doctor(&self, doctor: &Doctor) -> Result<(), StoreError>;

    async fn find_booking_by_id(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError>;

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, StoreError>;

    async fn save_booking(&self, booking: &Booking) -> Result<Booking, StoreError>;

    async fn find_bookings_by_user(&self, user_id: Uuid) -> Result<Vec<BookingWithDoctor>, StoreError>;
}

/// [`DocumentStore`] over the Supabase REST interface (`doctors` and
/// `bookings` tables), authenticated with the service key.
pub struct SupabaseDocumentStore {
    supabase: Arc<SupabaseClient>,
    api_key: String,
}

impl SupabaseDocumentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            api_key: config.store_api_key().to_string(),
        }
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, StoreError> {
        self.supabase
            .request::<Vec<T>>(Method::GET, path, Some(&self.api_key), None)
            .await
            .map_err(|e| StoreError(e.to_string()))
    }

    async fn write_row<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Value,
    ) -> Result<T, StoreError> {
        let mut rows: Vec<T> = self
            .supabase
            .request_with_headers(
                method,
                path,
                Some(&self.api_key),
                Some(body),
                Some(SupabaseClient::return_representation()),
            )
            .await
            .map_err(|e| StoreError(e.to_string()))?;

        if rows.is_empty() {
            return Err(StoreError(format!("No row returned for {}", path)));
        }
        Ok(rows.swap_remove(0))
    }
}

#[async_trait]
impl DocumentStore for SupabaseDocumentStore {
    async fn find_doctor_by_id(&self, doctor_id: Uuid) -> Result<Option<Doctor>, StoreError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let mut rows: Vec<Doctor> = self.fetch_rows(&path).await?;
        debug!("Doctor lookup {} returned {} rows", doctor_id, rows.len());
        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }

    async fn save_doctor(&self, doctor: &Doctor) -> Result<(), StoreError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor.id);
        let body = json!({
            "available_slots": doctor.available_slots,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let _: Value = self.write_row(Method::PATCH, &path, body).await?;
        Ok(())
    }

    async fn find_booking_by_id(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError> {
        let path = format!("/rest/v1/bookings?id=eq.{}", booking_id);
        let mut rows: Vec<Booking> = self.fetch_rows(&path).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        let now = Utc::now().to_rfc3339();
        let mut body = serde_json::to_value(&booking).map_err(|e| StoreError(e.to_string()))?;
        body["created_at"] = json!(now);
        body["updated_at"] = json!(now);

        self.write_row(Method::POST, "/rest/v1/bookings", body).await
    }

    async fn save_booking(&self, booking: &Booking) -> Result<Booking, StoreError> {
        let path = format!("/rest/v1/bookings?id=eq.{}", booking.id);
        let body = json!({
            "day": booking.day,
            "slot": booking.slot,
            "status": booking.status,
            "updated_at": Utc::now().to_rfc3339(),
        });

        self.write_row(Method::PATCH, &path, body).await
    }

    async fn find_bookings_by_user(&self, user_id: Uuid) -> Result<Vec<BookingWithDoctor>, StoreError> {
        let path = format!(
            "/rest/v1/bookings?user_id=eq.{}&select=*,doctor:doctors(id,name,specialty,image,address)&order=created_at.desc",
            user_id
        );
        self.fetch_rows(&path).await
    }
}
