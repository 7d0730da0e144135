// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialog engine and event loop for the Flowershop bot.
//!
//! The [`DialogLoop`] is the central coordinator that:
//! - Receives events from the notification gateway
//! - Spawns one task per event, serialized per user by [`locks::UserLocks`]
//! - Runs the pure transition table in [`engine`] and persists the result
//! - Hands paid orders and callback requests to the ledger and dispatcher
//! - Drains in-flight events on shutdown

pub mod catalog;
pub mod engine;
pub mod locks;
pub mod prompts;
pub mod service;
pub mod session;
pub mod shutdown;
pub mod validate;

use std::sync::Arc;
use std::time::Duration;

use flowershop_core::types::InboundEvent;
use flowershop_core::{FlowerError, NotificationGateway};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

pub use catalog::{Catalog, CatalogSnapshot};
pub use service::DialogService;
pub use session::{DialogSession, DialogState};

/// How long shutdown waits for in-flight events.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Pulls events from the gateway and processes each on its own task.
pub struct DialogLoop {
    gateway: Arc<dyn NotificationGateway>,
    service: Arc<DialogService>,
    tracker: TaskTracker,
}

impl DialogLoop {
    pub fn new(gateway: Arc<dyn NotificationGateway>, service: Arc<DialogService>) -> Self {
        Self {
            gateway,
            service,
            tracker: TaskTracker::new(),
        }
    }

    /// Runs until the cancellation token fires or the gateway closes.
    ///
    /// On exit, in-flight events are drained and storage is closed.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), FlowerError> {
        info!("dialog loop running");

        loop {
            tokio::select! {
                event = self.gateway.receive() => {
                    match event {
                        Ok(event) => self.spawn(event),
                        Err(e) => {
                            error!(error = %e, "gateway receive error");
                            if e.to_string().contains("closed") {
                                break;
                            }
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping dialog loop");
                    break;
                }
            }
        }

        self.tracker.close();
        shutdown::drain_tasks(&self.tracker, DRAIN_TIMEOUT).await;

        self.service.shutdown().await?;

        info!("dialog loop stopped");
        Ok(())
    }

    fn spawn(&self, event: InboundEvent) {
        let service = Arc::clone(&self.service);
        self.tracker.spawn(async move {
            let kind = event.kind();
            if let Err(e) = service.process(event).await {
                error!(kind, error = %e, "failed to handle inbound event");
            }
        });
    }
}
