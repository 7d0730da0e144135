// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification gateway trait for chat transports (Telegram, test doubles).

use async_trait::async_trait;

use crate::error::FlowerError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{InboundEvent, OutboundAction};

/// Bidirectional transport between the engine and customers/workers.
///
/// The gateway turns platform updates into [`InboundEvent`]s and performs
/// [`OutboundAction`]s. Sends may be slow or fail; callers bound them with
/// [`crate::outbox::Outbox`].
#[async_trait]
pub trait NotificationGateway: PluginAdapter {
    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), FlowerError>;

    /// Performs one outbound action.
    async fn send(&self, action: OutboundAction) -> Result<(), FlowerError>;

    /// Receives the next inbound event.
    async fn receive(&self) -> Result<InboundEvent, FlowerError>;
}
