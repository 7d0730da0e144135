// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Flowershop integration tests.
//!
//! Provides a mock gateway and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without a Telegram connection.
//!
//! # Components
//!
//! - [`MockGateway`] - Mock chat transport with event injection and action capture
//! - [`TestHarness`] - Seeded shop over a temp SQLite database

pub mod harness;
pub mod mock_gateway;

pub use harness::{SeedItem, TestHarness};
pub use mock_gateway::MockGateway;
