// libs/booking-cell/src/services/ledger.rs
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::models::{Booking, BookingStatus, BookingWithDoctor, Doctor, NewBooking, Requester};
use crate::services::locks::DoctorLocks;
use crate::services::notification::{Notification, NotificationSink};
use crate::services::payment::PaymentGateway;
use crate::services::store::DocumentStore;
use crate::templates;

/// Keeps doctors' open slots and booking records partitioned: a (day, slot)
/// pair is either open on the doctor or held by one upcoming booking.
///
/// Doctor and booking writes are separate store calls. Schedule updates for a
/// doctor are serialized within this process only.
pub struct SlotLedger {
    store: Arc<dyn DocumentStore>,
    payments: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationSink>,
    locks: DoctorLocks,
}

impl SlotLedger {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        payments: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            payments,
            notifier,
            locks: DoctorLocks::new(),
        }
    }

    /// Take `slot` on `day` from the doctor and record an upcoming booking
    /// paid by `payment_reference`.
    #[instrument(skip(self, requester), fields(user = %requester.user_id))]
    pub async fn reserve(
        &self,
        doctor_id: Uuid,
        day: &str,
        slot: &str,
        payment_reference: Option<&str>,
        requester: &Requester,
    ) -> Result<Booking, LedgerError> {
        let payment_intent_id = payment_reference
            .map(str::trim)
            .filter(|reference| !reference.is_empty())
            .ok_or_else(|| LedgerError::InvalidInput("paymentIntent is required".to_string()))?;

        let _guard = self.locks.acquire(doctor_id).await;

        let mut doctor = self.load_doctor(doctor_id).await?;
        doctor.available_slots.take(day, slot)?;
        self.store.save_doctor(&doctor).await?;

        let booking = self
            .store
            .create_booking(NewBooking {
                user_id: requester.user_id,
                doctor_id,
                day: day.to_string(),
                slot: slot.to_string(),
                payment_intent_id: payment_intent_id.to_string(),
                status: BookingStatus::Upcoming,
            })
            .await
            .map_err(|e| {
                error!(
                    "Slot {} {} was taken from doctor {} but the booking could not be stored: {}",
                    day, slot, doctor_id, e
                );
                LedgerError::from(e)
            })?;

        self.notifier.notify(Notification::new(
            doctor.email.clone(),
            "Booking Confirmation",
            templates::booking_email(&requester.full_name, day, slot),
        ));

        info!("Booking {} reserved {} {} with doctor {}", booking.id, day, slot, doctor_id);
        Ok(booking)
    }

    /// Move a booking to another slot of the same doctor. The old slot is
    /// returned before the new one is checked, so swapping between two of the
    /// doctor's slots on one day works.
    #[instrument(skip(self, requester), fields(user = %requester.user_id))]
    pub async fn modify(
        &self,
        booking_id: Uuid,
        new_day: &str,
        new_slot: &str,
        requester: &Requester,
    ) -> Result<Booking, LedgerError> {
        let booking = self.load_booking(booking_id).await?;
        let _guard = self.locks.acquire(booking.doctor_id).await;

        // Re-read under the lock; another request may have moved it meanwhile.
        let mut booking = self.load_booking(booking_id).await?;
        let mut doctor = self.load_doctor(booking.doctor_id).await?;

        let mut schedule = doctor.available_slots.clone();
        if booking.holds_slot() {
            schedule.restore(&booking.day, &booking.slot);
        } else {
            debug!(
                "Booking {} is {}, its old slot is not returned",
                booking.id, booking.status
            );
        }
        schedule.take(new_day, new_slot)?;

        doctor.available_slots = schedule;
        self.store.save_doctor(&doctor).await?;

        booking.day = new_day.to_string();
        booking.slot = new_slot.to_string();
        booking.status = BookingStatus::Upcoming;
        let booking = self.store.save_booking(&booking).await?;

        self.notifier.notify(Notification::new(
            doctor.email.clone(),
            "Booking Update",
            templates::booking_email(&requester.full_name, new_day, new_slot),
        ));

        info!("Booking {} moved to {} {}", booking.id, new_day, new_slot);
        Ok(booking)
    }

    /// Refund the booking, then give its slot back and mark it cancelled.
    /// A failed refund leaves schedule and booking untouched.
    #[instrument(skip(self, requester), fields(user = %requester.user_id))]
    pub async fn cancel(&self, booking_id: Uuid, requester: &Requester) -> Result<(), LedgerError> {
        let booking = self.load_booking(booking_id).await?;
        if booking.status == BookingStatus::Completed {
            warn!("Refusing to cancel completed booking {}", booking_id);
            return Err(LedgerError::AlreadyCompleted);
        }

        let _guard = self.locks.acquire(booking.doctor_id).await;

        let mut booking = self.load_booking(booking_id).await?;
        if booking.status == BookingStatus::Completed {
            return Err(LedgerError::AlreadyCompleted);
        }
        let mut doctor = self.load_doctor(booking.doctor_id).await?;

        let refund = self.payments.create_refund(&booking.payment_intent_id).await?;

        // A cancelled booking's slot was already returned and may be booked again.
        let released = booking.holds_slot();
        if released {
            if !doctor.available_slots.restore_sorted(&booking.day, &booking.slot) {
                warn!(
                    "Slot {} {} of booking {} was already open on doctor {}",
                    booking.day, booking.slot, booking.id, doctor.id
                );
            }
            self.store.save_doctor(&doctor).await?;

            booking.status = BookingStatus::Cancelled;
            booking = self.store.save_booking(&booking).await?;
        } else {
            warn!(
                "Booking {} was already cancelled, slot {} {} left with doctor {}",
                booking.id, booking.day, booking.slot, doctor.id
            );
        }

        if let Some(email) = &requester.email {
            self.notifier.notify(Notification::new(
                email.clone(),
                "Cure - Refund Confirmation",
                templates::refund_confirmation_email(
                    &requester.full_name,
                    refund.amount,
                    &refund.currency,
                    &refund.id,
                ),
            ));
        }
        if released {
            self.notifier.notify(Notification::new(
                doctor.email.clone(),
                "Booking Cancellation",
                templates::cancel_booking_email(&requester.full_name, &booking.day, &booking.slot),
            ));
        }

        info!("Booking {} cancelled, refund {} issued", booking.id, refund.id);
        Ok(())
    }

    /// Mark a booking completed. Its slot stays consumed.
    #[instrument(skip(self))]
    pub async fn complete(&self, booking_id: Uuid) -> Result<Booking, LedgerError> {
        let mut booking = self.load_booking(booking_id).await?;
        booking.status = BookingStatus::Completed;
        let booking = self.store.save_booking(&booking).await?;

        info!("Booking {} completed", booking.id);
        Ok(booking)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<BookingWithDoctor>, LedgerError> {
        let bookings = self.store.find_bookings_by_user(user_id).await?;
        debug!("Found {} bookings for user {}", bookings.len(), user_id);
        Ok(bookings)
    }

    async fn load_doctor(&self, doctor_id: Uuid) -> Result<Doctor, LedgerError> {
        self.store
            .find_doctor_by_id(doctor_id)
            .await?
            .ok_or_else(LedgerError::doctor_not_found)
    }

    async fn load_booking(&self, booking_id: Uuid) -> Result<Booking, LedgerError> {
        self.store
            .find_booking_by_id(booking_id)
            .await?
            .ok_or_else(LedgerError::booking_not_found)
    }
}
