//! Status-change notifications
//!
//! Fire-and-forget: the order core emits an event after its transaction
//! commits; a worker task delivers it to the configured webhook. Delivery
//! failures are logged and swallowed — they can never affect the
//! transactional outcome, and a full channel drops the event rather than
//! blocking a request.

use serde::Serialize;
use shared::models::OrderStatus;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Event channel capacity; beyond this, events are dropped with a warning
const CHANNEL_CAPACITY: usize = 4096;

/// One outcome notification per status transition.
#[derive(Debug, Clone, Serialize)]
pub struct StatusNotification {
    pub tenant_id: i64,
    pub order_id: i64,
    pub order_no: String,
    pub user_id: i64,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    /// Signed wallet delta applied by this transition (user currency)
    pub wallet_delta: f64,
    pub at: i64,
}

/// Cheap clone-able emit handle held by the order core.
#[derive(Clone)]
pub struct NotificationService {
    tx: mpsc::Sender<StatusNotification>,
}

impl NotificationService {
    /// Build the service plus its worker. The worker must be spawned as a
    /// background task; until then events queue in the channel.
    pub fn new(
        webhook_url: Option<String>,
        shutdown: CancellationToken,
    ) -> (Self, NotificationWorker) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let worker = NotificationWorker {
            rx: Mutex::new(Some(rx)),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            webhook_url,
            shutdown,
        };
        (Self { tx }, worker)
    }

    /// Emit an event. Never blocks, never fails the caller.
    pub fn emit(&self, event: StatusNotification) {
        if let Err(e) = self.tx.try_send(event) {
            tracing::warn!(error = %e, "Notification channel full, event dropped");
        }
    }
}

/// Consumes status events and posts them to the webhook.
pub struct NotificationWorker {
    rx: Mutex<Option<mpsc::Receiver<StatusNotification>>>,
    http: reqwest::Client,
    webhook_url: Option<String>,
    shutdown: CancellationToken,
}

impl NotificationWorker {
    pub async fn run(self) {
        let Some(mut rx) = self.rx.lock().ok().and_then(|mut g| g.take()) else {
            tracing::error!("Notification worker started twice");
            return;
        };
        tracing::info!(
            webhook = self.webhook_url.as_deref().unwrap_or("<none>"),
            "Notification worker started"
        );

        loop {
            tokio::select! {
                event = rx.recv() => {
                    match event {
                        Some(event) => self.deliver(event).await,
                        None => break,
                    }
                }
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Notification worker received shutdown signal");
                    break;
                }
            }
        }

        tracing::info!("Notification worker stopped");
    }

    async fn deliver(&self, event: StatusNotification) {
        let Some(url) = &self.webhook_url else {
            tracing::debug!(
                order_id = event.order_id,
                old = ?event.old_status,
                new = ?event.new_status,
                "No notification webhook configured, dropping event"
            );
            return;
        };

        match self.http.post(url).json(&event).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(order_id = event.order_id, "Notification delivered");
            }
            Ok(resp) => {
                tracing::warn!(
                    order_id = event.order_id,
                    status = %resp.status(),
                    "Notification webhook returned non-success"
                );
            }
            Err(e) => {
                tracing::warn!(
                    order_id = event.order_id,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_never_blocks_when_full() {
        let (service, _worker) =
            NotificationService::new(None, CancellationToken::new());
        // Fill well past capacity; emit must not panic or block
        for i in 0..(CHANNEL_CAPACITY + 10) {
            service.emit(StatusNotification {
                tenant_id: 1,
                order_id: i as i64,
                order_no: format!("ORD{i}"),
                user_id: 1,
                old_status: OrderStatus::Pending,
                new_status: OrderStatus::Approved,
                wallet_delta: 0.0,
                at: 0,
            });
        }
    }
}
