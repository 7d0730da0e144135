// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock notification gateway for deterministic testing.
//!
//! `MockGateway` implements `NotificationGateway` with injectable inbound
//! events and captured outbound actions for assertion in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use flowershop_core::FlowerError;
use flowershop_core::traits::{NotificationGateway, PluginAdapter};
use flowershop_core::types::{AdapterType, HealthStatus, InboundEvent, OutboundAction};

/// A mock chat transport for testing.
///
/// Provides two queues:
/// - **inbound**: Events injected via `inject()` are returned by `receive()`
/// - **sent**: Actions passed to `send()` are captured and retrievable via `sent()`
///
/// Sends can be made to fail (`set_failing`) or hang (`set_stalled`) to
/// exercise the outbox timeout and retry paths.
pub struct MockGateway {
    inbound_tx: std::sync::Mutex<Option<mpsc::UnboundedSender<InboundEvent>>>,
    inbound_rx: Mutex<mpsc::UnboundedReceiver<InboundEvent>>,
    sent: Arc<Mutex<Vec<OutboundAction>>>,
    failing: AtomicBool,
    stalled: AtomicBool,
}

impl MockGateway {
    /// Create a new mock gateway with empty queues.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            inbound_tx: std::sync::Mutex::new(Some(tx)),
            inbound_rx: Mutex::new(rx),
            sent: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
            stalled: AtomicBool::new(false),
        }
    }

    /// Inject an inbound event. Ignored after `close()`.
    pub fn inject(&self, event: InboundEvent) {
        if let Ok(guard) = self.inbound_tx.lock()
            && let Some(tx) = guard.as_ref()
        {
            let _ = tx.send(event);
        }
    }

    /// Close the inbound queue. `receive()` drains what is left, then errors.
    pub fn close(&self) {
        if let Ok(mut guard) = self.inbound_tx.lock() {
            guard.take();
        }
    }

    /// All actions that were sent through `send()`.
    pub async fn sent(&self) -> Vec<OutboundAction> {
        self.sent.lock().await.clone()
    }

    /// Returns and clears the captured actions.
    pub async fn take_sent(&self) -> Vec<OutboundAction> {
        std::mem::take(&mut *self.sent.lock().await)
    }

    /// Texts of captured prompts, in send order.
    pub async fn prompt_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|a| match a {
                OutboundAction::Prompt { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Make every send fail with a gateway error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every send hang until the caller gives up.
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockGateway {
    fn name(&self) -> &str {
        "mock-gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, FlowerError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FlowerError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationGateway for MockGateway {
    async fn connect(&mut self) -> Result<(), FlowerError> {
        Ok(())
    }

    async fn send(&self, action: OutboundAction) -> Result<(), FlowerError> {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(FlowerError::Gateway {
                message: format!("mock gateway refused {}", action.kind()),
                source: None,
            });
        }
        self.sent.lock().await.push(action);
        Ok(())
    }

    async fn receive(&self) -> Result<InboundEvent, FlowerError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| FlowerError::Gateway {
            message: "mock inbound channel closed".into(),
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use flowershop_core::{Outbox, UserId};

    use super::*;

    fn started(user: &str) -> InboundEvent {
        InboundEvent::UserStarted {
            user: UserId::from(user),
        }
    }

    #[tokio::test]
    async fn receive_returns_injected_events_in_order() {
        let gateway = MockGateway::new();
        gateway.inject(started("1"));
        gateway.inject(started("2"));

        assert_eq!(gateway.receive().await.unwrap(), started("1"));
        assert_eq!(gateway.receive().await.unwrap(), started("2"));
    }

    #[tokio::test]
    async fn receive_reports_closed_after_close() {
        let gateway = MockGateway::new();
        gateway.inject(started("1"));
        gateway.close();
        gateway.inject(started("2"));

        assert!(gateway.receive().await.is_ok());
        let err = gateway.receive().await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }

    #[tokio::test]
    async fn send_captures_actions() {
        let gateway = MockGateway::new();
        let user = UserId::from("1");
        gateway
            .send(OutboundAction::text(&user, "привет"))
            .await
            .unwrap();
        assert_eq!(gateway.sent_count().await, 1);
        assert_eq!(gateway.prompt_texts().await, vec!["привет"]);
        assert_eq!(gateway.take_sent().await.len(), 1);
        assert_eq!(gateway.sent_count().await, 0);
    }

    #[tokio::test]
    async fn failing_gateway_is_retried_then_given_up() {
        let gateway = Arc::new(MockGateway::new());
        gateway.set_failing(true);
        let outbox = Outbox::new(gateway.clone(), Duration::from_millis(100), 2);
        let err = outbox
            .deliver(OutboundAction::text(&UserId::from("1"), "x"))
            .await
            .unwrap_err();
        assert!(err.is_gateway());
        assert_eq!(gateway.sent_count().await, 0);
    }

    #[tokio::test]
    async fn stalled_gateway_times_out() {
        let gateway = Arc::new(MockGateway::new());
        gateway.set_stalled(true);
        let outbox = Outbox::new(gateway.clone(), Duration::from_millis(50), 1);
        let err = outbox
            .deliver(OutboundAction::text(&UserId::from("1"), "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowerError::GatewayTimeout { .. }));
    }
}
