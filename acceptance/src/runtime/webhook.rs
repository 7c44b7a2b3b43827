//! Webhook Receiver
//!
//! HTTP server standing in for a notification destination. Alertmanager
//! instances are configured to post webhook notifications here; every
//! notification is stored with the wall-clock time it arrived.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::post};
use chrono::{DateTime, Utc};
use shared::WebhookMessage;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::error::HarnessResult;

/// One notification as it arrived at the receiver
#[derive(Debug, Clone)]
pub struct ReceivedNotification {
    pub received_at: DateTime<Utc>,
    pub batch_id: String,
    pub message: WebhookMessage,
}

type Inbox = Arc<Mutex<Vec<ReceivedNotification>>>;

#[derive(Debug)]
pub struct WebhookReceiver {
    address: SocketAddr,
    inbox: Inbox,
    server_handle: Mutex<Option<JoinHandle<()>>>,
}

impl WebhookReceiver {
    /// Bind an ephemeral loopback port and start serving
    pub async fn start() -> HarnessResult<Self> {
        let inbox: Inbox = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route("/", post(receive_notification))
            .with_state(inbox.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;

        let server_task = tokio::spawn(async move {
            tracing::debug!("📡 Webhook receiver listening on {}", address);
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Webhook receiver error: {}", e);
            }
        });

        Ok(Self {
            address,
            inbox,
            server_handle: Mutex::new(Some(server_task)),
        })
    }

    /// URL to put into an instance's webhook receiver configuration
    pub fn url(&self) -> String {
        format!("http://{}/", self.address)
    }

    /// Take every notification received so far
    pub fn drain(&self) -> Vec<ReceivedNotification> {
        let mut received = std::mem::take(&mut *self.inbox.lock().unwrap_or_else(PoisonError::into_inner));
        received.sort_by_key(|notification| notification.received_at);
        received
    }

    /// Stop serving; idempotent
    pub fn shutdown(&self) {
        if let Some(handle) = self.server_handle.lock().unwrap_or_else(PoisonError::into_inner).take() {
            handle.abort();
            tracing::debug!("🛑 Webhook receiver on {} stopped", self.address);
        }
    }
}

impl Drop for WebhookReceiver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn receive_notification(State(inbox): State<Inbox>, Json(message): Json<WebhookMessage>) -> StatusCode {
    let notification = ReceivedNotification {
        received_at: Utc::now(),
        batch_id: uuid::Uuid::new_v4().to_string(),
        message,
    };

    tracing::debug!(
        "📨 Notification {} for receiver '{}' with {} alerts",
        notification.batch_id,
        notification.message.receiver,
        notification.message.alerts.len()
    );

    inbox.lock().unwrap_or_else(PoisonError::into_inner).push(notification);

    StatusCode::OK
}
