// libs/booking-cell/src/services/notification.rs
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, instrument, warn};

use shared_config::AppConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new(recipient: impl Into<String>, subject: impl Into<String>, body: String) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body,
        }
    }
}

/// Fire-and-forget outlet for ledger events. Implementations must not block
/// and must never report failures back to the caller.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Delivers one rendered notification.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Posts `{from, to, subject, html}` to a transactional email HTTP API.
pub struct HttpEmailTransport {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpEmailTransport {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.email_api_url.clone(),
            api_key: config.email_api_key.clone(),
            from: config.email_from.clone(),
        }
    }
}

#[async_trait]
impl EmailTransport for HttpEmailTransport {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        let mut request = self.client.post(&self.api_url).json(&json!({
            "from": self.from,
            "to": notification.recipient,
            "subject": notification.subject,
            "html": notification.body,
        }));
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("email API returned {}: {}", status, text);
        }
        Ok(())
    }
}

/// Used when no email API is configured.
pub struct LogTransport;

#[async_trait]
impl EmailTransport for LogTransport {
    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        info!(
            "Email to {} not sent (no email API configured): {}",
            notification.recipient, notification.subject
        );
        Ok(())
    }
}

/// Pick the transport the configuration allows.
pub fn transport_from_config(config: &AppConfig) -> Arc<dyn EmailTransport> {
    if config.is_email_configured() {
        Arc::new(HttpEmailTransport::new(config))
    } else {
        Arc::new(LogTransport)
    }
}

/// [`NotificationSink`] that enqueues onto a bounded channel drained by a
/// [`NotificationWorker`].
#[derive(Clone)]
pub struct QueuedNotifier {
    sender: mpsc::Sender<Notification>,
}

impl QueuedNotifier {
    /// Create the notifier and the worker that drains it. The worker stops once
    /// every notifier clone has been dropped and the queue is empty.
    pub fn channel(capacity: usize, transport: Arc<dyn EmailTransport>) -> (Self, NotificationWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self { sender },
            NotificationWorker { receiver, transport },
        )
    }
}

impl NotificationSink for QueuedNotifier {
    fn notify(&self, notification: Notification) {
        match self.sender.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!("Notification queue full, dropping '{}' to {}", dropped.subject, dropped.recipient);
            }
            Err(TrySendError::Closed(dropped)) => {
                warn!("Notification worker stopped, dropping '{}' to {}", dropped.subject, dropped.recipient);
            }
        }
    }
}

pub struct NotificationWorker {
    receiver: mpsc::Receiver<Notification>,
    transport: Arc<dyn EmailTransport>,
}

impl NotificationWorker {
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        info!("Notification worker started");

        while let Some(notification) = self.receiver.recv().await {
            debug!("Delivering '{}' to {}", notification.subject, notification.recipient);
            if let Err(e) = self.transport.send(&notification).await {
                error!(
                    "Failed to deliver '{}' to {}: {}",
                    notification.subject, notification.recipient, e
                );
            }
        }

        info!("Notification worker stopped");
    }
}
