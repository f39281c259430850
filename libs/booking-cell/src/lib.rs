pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod templates;

pub use error::*;
pub use router::{booking_routes, BookingState};
