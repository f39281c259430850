use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use booking_cell::{booking_routes, BookingState};

pub fn create_router(bookings: Arc<BookingState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Cure Clinic API is running!" }))
        .nest("/bookings", booking_routes(bookings))
}
