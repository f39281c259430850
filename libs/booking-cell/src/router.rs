// libs/booking-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::{
    DocumentStore, NotificationSink, PaymentGateway, PaymentIntentService, SlotLedger,
    StripePaymentGateway, SupabaseDocumentStore,
};

pub struct BookingState {
    pub config: Arc<AppConfig>,
    pub ledger: Arc<SlotLedger>,
    pub intents: Arc<PaymentIntentService>,
}

impl BookingState {
    /// Wire the Supabase store and Stripe gateway from configuration.
    pub fn new(config: Arc<AppConfig>, notifier: Arc<dyn NotificationSink>) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(SupabaseDocumentStore::new(&config));
        let payments: Arc<dyn PaymentGateway> = Arc::new(StripePaymentGateway::new(&config));
        Self::with_services(config, store, payments, notifier)
    }

    pub fn with_services(
        config: Arc<AppConfig>,
        store: Arc<dyn DocumentStore>,
        payments: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let ledger = SlotLedger::new(Arc::clone(&store), Arc::clone(&payments), notifier);
        let intents = PaymentIntentService::new(store, payments);

        Self {
            config,
            ledger: Arc::new(ledger),
            intents: Arc::new(intents),
        }
    }
}

pub fn booking_routes(state: Arc<BookingState>) -> Router {
    // Every booking operation acts on behalf of the authenticated user
    let protected_routes = Router::new()
        .route("/my-bookings", get(handlers::get_my_bookings))
        .route("/book-intent/{doctor_id}", post(handlers::create_booking_intent))
        .route("/book-doctor/{doctor_id}", post(handlers::reserve_doctor))
        .route("/update-booking/{booking_id}", put(handlers::update_booking))
        .route("/complete-booking/{booking_id}", put(handlers::complete_booking))
        .route("/cancel-doctor/{booking_id}", delete(handlers::cancel_reservation))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
