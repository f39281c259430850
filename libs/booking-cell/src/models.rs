// libs/booking-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use shared_models::auth::User;

use crate::error::LedgerError;

// ==============================================================================
// AVAILABILITY SCHEDULE
// ==============================================================================

/// One `{day, slots}` entry of a doctor's availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlots {
    pub day: String,
    #[serde(default)]
    pub slots: Vec<String>,
}

/// Open (day, slot) pairs of one doctor.
///
/// Days keep insertion order and are unique; a day never holds an empty slot
/// list. Slots keep insertion order unless re-sorted by [`restore_sorted`].
///
/// Storage may hand the schedule back either as a JSON array or as that array
/// encoded into a string; both are accepted on read. Writes are always arrays.
///
/// [`restore_sorted`]: AvailabilitySchedule::restore_sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchedule", into = "Vec<DaySlots>")]
pub struct AvailabilitySchedule {
    days: Vec<DaySlots>,
}

impl AvailabilitySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw entries, merging repeated days and dropping empty ones.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = DaySlots>,
    {
        let mut schedule = Self::new();
        for entry in entries {
            for slot in entry.slots {
                schedule.restore(&entry.day, &slot);
            }
        }
        schedule
    }

    pub fn days(&self) -> &[DaySlots] {
        &self.days
    }

    pub fn slots_for(&self, day: &str) -> Option<&[String]> {
        self.days
            .iter()
            .find(|entry| entry.day == day)
            .map(|entry| entry.slots.as_slice())
    }

    pub fn contains(&self, day: &str, slot: &str) -> bool {
        self.slots_for(day)
            .map(|slots| slots.iter().any(|s| s == slot))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn slot_count(&self) -> usize {
        self.days.iter().map(|entry| entry.slots.len()).sum()
    }

    /// Remove `slot` from `day`. A day left without slots is dropped.
    ///
    /// Nothing changes when an error is returned.
    pub fn take(&mut self, day: &str, slot: &str) -> Result<(), LedgerError> {
        let day_index = self
            .days
            .iter()
            .position(|entry| entry.day == day)
            .ok_or_else(|| LedgerError::NoAvailability { day: day.to_string() })?;

        let slots = &mut self.days[day_index].slots;
        let slot_index = slots
            .iter()
            .position(|s| s == slot)
            .ok_or_else(|| LedgerError::SlotTaken {
                day: day.to_string(),
                slot: slot.to_string(),
            })?;

        slots.remove(slot_index);
        if slots.is_empty() {
            self.days.remove(day_index);
        }
        Ok(())
    }

    /// Put `slot` back on `day`, appending a new day entry when needed.
    /// Returns `false` if the slot was already open.
    pub fn restore(&mut self, day: &str, slot: &str) -> bool {
        match self.days.iter_mut().find(|entry| entry.day == day) {
            Some(entry) => {
                if entry.slots.iter().any(|s| s == slot) {
                    return false;
                }
                entry.slots.push(slot.to_string());
            }
            None => self.days.push(DaySlots {
                day: day.to_string(),
                slots: vec![slot.to_string()],
            }),
        }
        true
    }

    /// Cancellation variant of [`restore`](Self::restore): an existing day's
    /// slots are re-sorted ascending (plain string order) afterwards.
    pub fn restore_sorted(&mut self, day: &str, slot: &str) -> bool {
        let existed = self.slots_for(day).is_some();
        let inserted = self.restore(day, slot);
        if existed {
            if let Some(entry) = self.days.iter_mut().find(|entry| entry.day == day) {
                entry.slots.sort();
            }
        }
        inserted
    }
}

impl From<AvailabilitySchedule> for Vec<DaySlots> {
    fn from(schedule: AvailabilitySchedule) -> Self {
        schedule.days
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSchedule {
    Entries(Vec<DaySlots>),
    Encoded(String),
    Missing(()),
}

impl TryFrom<RawSchedule> for AvailabilitySchedule {
    type Error = String;

    fn try_from(raw: RawSchedule) -> Result<Self, Self::Error> {
        let entries = match raw {
            RawSchedule::Entries(entries) => entries,
            RawSchedule::Encoded(text) if text.trim().is_empty() => Vec::new(),
            RawSchedule::Encoded(text) => serde_json::from_str::<Vec<DaySlots>>(&text)
                .map_err(|e| format!("invalid available slots format: {}", e))?,
            RawSchedule::Missing(()) => Vec::new(),
        };
        Ok(Self::from_entries(entries))
    }
}

/// Accept a JSON value or JSON text holding one; text that does not parse
/// reads as absent.
fn json_text_or_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => serde_json::from_str::<Value>(&text)
            .ok()
            .filter(|parsed| parsed.is_object() || parsed.is_array()),
        Some(Value::Null) | None => None,
        other => other,
    })
}

// ==============================================================================
// DOCTOR & BOOKING RECORDS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "json_text_or_value")]
    pub address: Option<Value>,
    #[serde(default)]
    pub available_slots: AvailabilitySchedule,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Doctor fields embedded in booking listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "json_text_or_value")]
    pub address: Option<Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Upcoming => write!(f, "upcoming"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub doctor_id: Uuid,
    pub day: String,
    pub slot: String,
    #[serde(alias = "payment_intent")]
    pub payment_intent_id: String,
    pub status: BookingStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Whether this booking currently keeps its slot out of the schedule.
    pub fn holds_slot(&self) -> bool {
        self.status == BookingStatus::Upcoming
    }
}

/// Insert payload for a new booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub doctor_id: Uuid,
    pub day: String,
    pub slot: String,
    pub payment_intent_id: String,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingWithDoctor {
    #[serde(flatten)]
    pub booking: Booking,
    pub doctor: Option<DoctorSummary>,
}

/// The authenticated caller of a ledger operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Requester {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub full_name: String,
}

impl Requester {
    pub fn from_user(user: &User) -> Result<Self, LedgerError> {
        let user_id = Uuid::parse_str(&user.id)
            .map_err(|_| LedgerError::InvalidInput(format!("Invalid user id: {}", user.id)))?;

        Ok(Self {
            user_id,
            email: user.email.clone(),
            full_name: user.display_name(),
        })
    }
}

// ==============================================================================
// PAYMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Refund {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    /// Smallest currency unit.
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveSlotRequest {
    pub day: String,
    pub slot: String,
    #[serde(default, alias = "paymentIntent", alias = "payment_intent")]
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModifyBookingRequest {
    pub day: String,
    pub slot: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingIntentRequest {
    pub options: PaymentIntentRequest,
}
