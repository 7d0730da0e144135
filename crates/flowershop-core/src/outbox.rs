// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timeout-bounded delivery of outbound actions.
//!
//! Every send to the gateway goes through [`Outbox::deliver`], so no caller
//! ever waits on the transport indefinitely.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::FlowerError;
use crate::traits::NotificationGateway;
use crate::types::OutboundAction;

/// Wraps a gateway with a per-attempt timeout and a bounded retry count.
#[derive(Clone)]
pub struct Outbox {
    gateway: Arc<dyn NotificationGateway>,
    timeout: Duration,
    attempts: u32,
}

impl Outbox {
    pub fn new(gateway: Arc<dyn NotificationGateway>, timeout: Duration, attempts: u32) -> Self {
        Self {
            gateway,
            timeout,
            attempts: attempts.max(1),
        }
    }

    /// Sends one action, retrying up to the configured attempt count.
    ///
    /// Returns the last error if every attempt failed or timed out.
    pub async fn deliver(&self, action: OutboundAction) -> Result<(), FlowerError> {
        let mut last_err = None;
        for attempt in 1..=self.attempts {
            match tokio::time::timeout(self.timeout, self.gateway.send(action.clone())).await {
                Ok(Ok(())) => {
                    debug!(kind = action.kind(), attempt, "outbound action delivered");
                    return Ok(());
                }
                Ok(Err(e)) => {
                    warn!(kind = action.kind(), attempt, error = %e, "outbound send failed");
                    last_err = Some(e);
                }
                Err(_) => {
                    warn!(kind = action.kind(), attempt, timeout = ?self.timeout, "outbound send timed out");
                    last_err = Some(FlowerError::GatewayTimeout {
                        duration: self.timeout,
                    });
                }
            }
        }
        Err(last_err.unwrap_or_else(|| FlowerError::Internal("no delivery attempt made".into())))
    }

    /// Sends actions in order, logging failures and continuing.
    ///
    /// Returns how many actions could not be delivered.
    pub async fn deliver_all(&self, actions: Vec<OutboundAction>) -> usize {
        let mut failed = 0;
        for action in actions {
            if self.deliver(action).await.is_err() {
                failed += 1;
            }
        }
        failed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::traits::PluginAdapter;
    use crate::types::{AdapterType, HealthStatus, InboundEvent, UserId};

    /// Gateway that fails the first `fail_first` sends and can stall forever.
    struct FlakyGateway {
        calls: AtomicUsize,
        fail_first: usize,
        stall: bool,
    }

    #[async_trait]
    impl PluginAdapter for FlakyGateway {
        fn name(&self) -> &str {
            "flaky"
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
    impl NotificationGateway for FlakyGateway {
        async fn connect(&mut self) -> Result<(), FlowerError> {
            Ok(())
        }
        async fn send(&self, _action: OutboundAction) -> Result<(), FlowerError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.stall {
                std::future::pending::<()>().await;
            }
            if n < self.fail_first {
                return Err(FlowerError::Gateway {
                    message: "boom".into(),
                    source: None,
                });
            }
            Ok(())
        }
        async fn receive(&self) -> Result<InboundEvent, FlowerError> {
            std::future::pending().await
        }
    }

    fn action() -> OutboundAction {
        OutboundAction::text(&UserId::from("u1"), "hi")
    }

    #[tokio::test]
    async fn retries_until_success() {
        let gw = Arc::new(FlakyGateway {
            calls: AtomicUsize::new(0),
            fail_first: 1,
            stall: false,
        });
        let outbox = Outbox::new(gw.clone(), Duration::from_secs(1), 2);
        outbox.deliver(action()).await.unwrap();
        assert_eq!(gw.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_configured_attempts() {
        let gw = Arc::new(FlakyGateway {
            calls: AtomicUsize::new(0),
            fail_first: 10,
            stall: false,
        });
        let outbox = Outbox::new(gw.clone(), Duration::from_secs(1), 3);
        let err = outbox.deliver(action()).await.unwrap_err();
        assert!(err.is_gateway());
        assert_eq!(gw.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_send_becomes_gateway_timeout() {
        let gw = Arc::new(FlakyGateway {
            calls: AtomicUsize::new(0),
            fail_first: 0,
            stall: true,
        });
        let outbox = Outbox::new(gw, Duration::from_millis(50), 1);
        let err = outbox.deliver(action()).await.unwrap_err();
        assert!(matches!(err, FlowerError::GatewayTimeout { .. }));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn failed_attempts_are_logged_with_kind() {
        let gw = Arc::new(FlakyGateway {
            calls: AtomicUsize::new(0),
            fail_first: 1,
            stall: false,
        });
        let outbox = Outbox::new(gw, Duration::from_secs(1), 2);
        outbox.deliver(action()).await.unwrap();
        assert!(logs_contain("outbound send failed"));
        assert!(logs_contain("prompt"));
        assert!(logs_contain("outbound action delivered"));
    }

    #[tokio::test]
    async fn deliver_all_counts_failures() {
        let gw = Arc::new(FlakyGateway {
            calls: AtomicUsize::new(0),
            fail_first: 1,
            stall: false,
        });
        let outbox = Outbox::new(gw, Duration::from_secs(1), 1);
        let failed = outbox.deliver_all(vec![action(), action(), action()]).await;
        assert_eq!(failed, 1);
    }
}
