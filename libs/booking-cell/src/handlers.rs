// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{BookingIntentRequest, ModifyBookingRequest, Requester, ReserveSlotRequest};
use crate::router::BookingState;

fn requester(user: &User) -> Result<Requester, AppError> {
    Requester::from_user(user).map_err(|e| AppError::Auth(e.to_string()))
}

#[axum::debug_handler]
pub async fn get_my_bookings(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let requester = requester(&user)?;
    let bookings = state.ledger.list_for_user(requester.user_id).await?;

    Ok(Json(json!({
        "message": "Bookings fetched successfully",
        "bookings": bookings
    })))
}

#[axum::debug_handler]
pub async fn create_booking_intent(
    State(state): State<Arc<BookingState>>,
    Path(doctor_id): Path<Uuid>,
    Extension(_user): Extension<User>,
    Json(request): Json<BookingIntentRequest>,
) -> Result<Json<Value>, AppError> {
    let payment_intent = state
        .intents
        .create_for_doctor(doctor_id, request.options)
        .await?;

    Ok(Json(json!({
        "message": "client secret created successfully",
        "payment_intent": payment_intent
    })))
}

#[axum::debug_handler]
pub async fn reserve_doctor(
    State(state): State<Arc<BookingState>>,
    Path(doctor_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<ReserveSlotRequest>,
) -> Result<Json<Value>, AppError> {
    let requester = requester(&user)?;
    let booking = state
        .ledger
        .reserve(
            doctor_id,
            &request.day,
            &request.slot,
            request.payment_intent_id.as_deref(),
            &requester,
        )
        .await?;

    Ok(Json(json!({
        "message": "Slot reserved successfully",
        "booking": booking
    })))
}

#[axum::debug_handler]
pub async fn update_booking(
    State(state): State<Arc<BookingState>>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<ModifyBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let requester = requester(&user)?;
    let booking = state
        .ledger
        .modify(booking_id, &request.day, &request.slot, &requester)
        .await?;

    Ok(Json(json!({
        "message": "Booking updated successfully",
        "booking": booking
    })))
}

#[axum::debug_handler]
pub async fn complete_booking(
    State(state): State<Arc<BookingState>>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking = state.ledger.complete(booking_id).await?;

    Ok(Json(json!({
        "message": "Booking completed successfully",
        "booking": booking
    })))
}

#[axum::debug_handler]
pub async fn cancel_reservation(
    State(state): State<Arc<BookingState>>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let requester = requester(&user)?;
    state.ledger.cancel(booking_id, &requester).await?;

    Ok(Json(json!({
        "message": "Reservation canceled successfully and slot restored"
    })))
}
