#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use booking_cell::error::{PaymentGatewayError, StoreError};
use booking_cell::models::{
    AvailabilitySchedule, Booking, BookingStatus, BookingWithDoctor, Doctor, NewBooking,
    PaymentIntent, PaymentIntentRequest, Refund, Requester,
};
use booking_cell::services::notification::{Notification, NotificationSink};
use booking_cell::services::{DocumentStore, PaymentGateway, SlotLedger};

#[derive(Default)]
pub struct InMemoryStore {
    pub doctors: Mutex<HashMap<Uuid, Doctor>>,
    pub bookings: Mutex<HashMap<Uuid, Booking>>,
    pub fail_writes: Mutex<bool>,
}

impl InMemoryStore {
    pub fn add_doctor(&self, slots: Value) -> Uuid {
        let id = Uuid::new_v4();
        let doctor = Doctor {
            id,
            name: "Dr. Salma".to_string(),
            email: "salma@cure.clinic".to_string(),
            specialty: Some("Dentistry".to_string()),
            image: None,
            price: Some(300.0),
            address: None,
            available_slots: serde_json::from_value(slots).unwrap(),
            updated_at: None,
        };
        self.doctors.lock().unwrap().insert(id, doctor);
        id
    }

    pub fn add_booking(&self, doctor_id: Uuid, day: &str, slot: &str, status: BookingStatus) -> Uuid {
        let id = Uuid::new_v4();
        self.bookings.lock().unwrap().insert(
            id,
            Booking {
                id,
                user_id: Uuid::new_v4(),
                doctor_id,
                day: day.to_string(),
                slot: slot.to_string(),
                payment_intent_id: format!("pi_{}", id.simple()),
                status,
                created_at: Some(Utc::now()),
                updated_at: None,
            },
        );
        id
    }

    pub fn schedule(&self, doctor_id: Uuid) -> AvailabilitySchedule {
        self.doctors.lock().unwrap()[&doctor_id].available_slots.clone()
    }

    pub fn schedule_json(&self, doctor_id: Uuid) -> Value {
        serde_json::to_value(self.schedule(doctor_id)).unwrap()
    }

    pub fn booking(&self, booking_id: Uuid) -> Booking {
        self.bookings.lock().unwrap()[&booking_id].clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if *self.fail_writes.lock().unwrap() {
            Err(StoreError("write rejected".to_string()))
        } else {
            Ok(())
        }
    }

    /// No (day, slot) is both open on a doctor and held by an upcoming booking,
    /// and no two upcoming bookings hold the same pair.
    pub fn assert_partitioned(&self) {
        let doctors = self.doctors.lock().unwrap();
        let bookings = self.bookings.lock().unwrap();
        let mut held = std::collections::HashSet::new();

        for booking in bookings.values().filter(|b| b.status == BookingStatus::Upcoming) {
            let doctor = &doctors[&booking.doctor_id];
            assert!(
                !doctor.available_slots.contains(&booking.day, &booking.slot),
                "{} {} is open and booked at the same time",
                booking.day,
                booking.slot
            );
            assert!(
                held.insert((booking.doctor_id, booking.day.clone(), booking.slot.clone())),
                "{} {} is held by two bookings",
                booking.day,
                booking.slot
            );
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find_doctor_by_id(&self, doctor_id: Uuid) -> Result<Option<Doctor>, StoreError> {
        Ok(self.doctors.lock().unwrap().get(&doctor_id).cloned())
    }

    async fn save_doctor(&self, doctor: &Doctor) -> Result<(), StoreError> {
        self.check_writes()?;
        let mut doctors = self.doctors.lock().unwrap();
        let stored = doctors
            .get_mut(&doctor.id)
            .ok_or_else(|| StoreError("doctor vanished".to_string()))?;
        stored.available_slots = doctor.available_slots.clone();
        stored.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn find_booking_by_id(&self, booking_id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.lock().unwrap().get(&booking_id).cloned())
    }

    async fn create_booking(&self, booking: NewBooking) -> Result<Booking, StoreError> {
        self.check_writes()?;
        let now = Utc::now();
        let created = Booking {
            id: Uuid::new_v4(),
            user_id: booking.user_id,
            doctor_id: booking.doctor_id,
            day: booking.day,
            slot: booking.slot,
            payment_intent_id: booking.payment_intent_id,
            status: booking.status,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.bookings.lock().unwrap().insert(created.id, created.clone());
        Ok(created)
    }

    async fn save_booking(&self, booking: &Booking) -> Result<Booking, StoreError> {
        self.check_writes()?;
        let mut saved = booking.clone();
        saved.updated_at = Some(Utc::now());
        self.bookings.lock().unwrap().insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn find_bookings_by_user(&self, user_id: Uuid) -> Result<Vec<BookingWithDoctor>, StoreError> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.user_id == user_id)
            .map(|b| BookingWithDoctor { booking: b.clone(), doctor: None })
            .collect())
    }
}

#[derive(Default)]
pub struct FakeGateway {
    pub refunds: Mutex<Vec<String>>,
    pub intents: Mutex<Vec<PaymentIntentRequest>>,
    pub fail: Mutex<bool>,
}

impl FakeGateway {
    pub fn failing() -> Self {
        let gateway = Self::default();
        *gateway.fail.lock().unwrap() = true;
        gateway
    }

    pub fn refund_calls(&self) -> Vec<String> {
        self.refunds.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_refund(&self, payment_intent_id: &str) -> Result<Refund, PaymentGatewayError> {
        self.refunds.lock().unwrap().push(payment_intent_id.to_string());
        if *self.fail.lock().unwrap() {
            return Err(PaymentGatewayError("charge already refunded".to_string()));
        }
        Ok(Refund {
            id: "re_fake".to_string(),
            amount: 30000,
            currency: "egp".to_string(),
        })
    }

    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentGatewayError> {
        self.intents.lock().unwrap().push(request.clone());
        if *self.fail.lock().unwrap() {
            return Err(PaymentGatewayError("card declined".to_string()));
        }
        Ok(PaymentIntent {
            id: "pi_fake".to_string(),
            client_secret: Some("pi_fake_secret".to_string()),
            amount: request.amount,
            currency: request.currency.clone(),
            status: Some("requires_payment_method".to_string()),
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn subjects(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|n| n.subject.clone()).collect()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|n| n.recipient.clone()).collect()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub gateway: Arc<FakeGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub ledger: SlotLedger,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_gateway(FakeGateway::default())
    }

    pub fn with_gateway(gateway: FakeGateway) -> Self {
        let store = Arc::new(InMemoryStore::default());
        let gateway = Arc::new(gateway);
        let notifier = Arc::new(RecordingNotifier::default());
        let ledger = SlotLedger::new(store.clone(), gateway.clone(), notifier.clone());
        Self { store, gateway, notifier, ledger }
    }
}

pub fn requester() -> Requester {
    Requester {
        user_id: Uuid::new_v4(),
        email: Some("patient@example.com".to_string()),
        full_name: "Nour Hassan".to_string(),
    }
}

pub fn two_days() -> Value {
    json!([
        { "day": "2024-01-10", "slots": ["9:00", "10:00", "11:00"] },
        { "day": "2024-01-11", "slots": ["14:00"] }
    ])
}
