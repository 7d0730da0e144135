// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order ledger and assignment dispatcher for the Flowershop engine.
//!
//! The ledger persists paid orders idempotently per payment reference and
//! enforces the forward-only status lifecycle. The dispatcher selects an
//! active courier or florist, records the assignment, notifies the worker
//! through the bounded [`flowershop_core::Outbox`], and processes their
//! acknowledgment.

pub mod dispatcher;
pub mod ledger;

pub use dispatcher::Dispatcher;
pub use ledger::OrderLedger;
