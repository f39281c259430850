pub mod intent;
pub mod ledger;
pub mod locks;
pub mod notification;
pub mod payment;
pub mod store;

pub use intent::PaymentIntentService;
pub use ledger::SlotLedger;
pub use notification::{NotificationSink, NotificationWorker, QueuedNotifier};
pub use payment::{PaymentGateway, StripePaymentGateway};
pub use store::{DocumentStore, SupabaseDocumentStore};
