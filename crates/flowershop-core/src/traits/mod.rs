// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod gateway;
pub mod storage;

pub use adapter::PluginAdapter;
pub use gateway::NotificationGateway;
pub use storage::StorageAdapter;
