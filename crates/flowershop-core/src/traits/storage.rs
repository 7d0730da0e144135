// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::FlowerError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    AckOutcome, Assignment, AssignmentId, CatalogItem, Category, CategoryId, ItemId, NewOrder,
    Order, OrderId, OrderStatus, PlacedOrder, SessionRecord, UserId, Worker, WorkerId, WorkerKind,
};

/// Adapter for the durable state the engine depends on.
///
/// Multi-step operations (`place_order`, `assign_worker`,
/// `acknowledge_assignment`) are atomic: they either commit fully or leave
/// no trace.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), FlowerError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), FlowerError>;

    // --- Sessions ---

    async fn get_session(&self, user: &UserId) -> Result<Option<SessionRecord>, FlowerError>;

    /// Upserts the session and returns it with the bumped version.
    async fn save_session(
        &self,
        user: &UserId,
        state: &str,
        fields: &str,
    ) -> Result<SessionRecord, FlowerError>;

    /// Deletes the session. Returns whether a row existed.
    async fn delete_session(&self, user: &UserId) -> Result<bool, FlowerError>;

    // --- Catalog ---

    async fn list_categories(&self) -> Result<Vec<Category>, FlowerError>;

    async fn list_items(&self) -> Result<Vec<CatalogItem>, FlowerError>;

    async fn get_item(&self, id: ItemId) -> Result<Option<CatalogItem>, FlowerError>;

    async fn insert_category(&self, name: &str) -> Result<CategoryId, FlowerError>;

    async fn insert_item(&self, item: &CatalogItem) -> Result<ItemId, FlowerError>;

    // --- Orders ---

    /// Inserts the order keyed by `(user_id, payment_ref)` and deletes the
    /// user's session in the same transaction.
    async fn place_order(&self, order: &NewOrder) -> Result<PlacedOrder, FlowerError>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, FlowerError>;

    async fn find_order_by_payment(
        &self,
        user: &UserId,
        payment_ref: &str,
    ) -> Result<Option<Order>, FlowerError>;

    /// Orders still `new` with no courier, lowest id first.
    async fn list_unassigned_orders(&self) -> Result<Vec<Order>, FlowerError>;

    /// Moves the order forward. Returns `false` if the current status does not allow it.
    async fn advance_order_status(&self, id: OrderId, to: OrderStatus)
    -> Result<bool, FlowerError>;

    // --- Workers and assignments ---

    async fn insert_worker(&self, worker: &Worker) -> Result<WorkerId, FlowerError>;

    async fn get_worker(&self, id: WorkerId) -> Result<Option<Worker>, FlowerError>;

    async fn list_workers(&self, kind: WorkerKind) -> Result<Vec<Worker>, FlowerError>;

    /// Selects the active worker of `kind` with the lowest id and records an
    /// assignment. Courier assignments also set `orders.courier_id`.
    /// Returns `None` when no worker is active.
    async fn assign_worker(
        &self,
        kind: WorkerKind,
        order_id: Option<OrderId>,
        contact_phone: Option<&str>,
    ) -> Result<Option<(Worker, Assignment)>, FlowerError>;

    async fn get_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>, FlowerError>;

    async fn list_assignments(&self, open_only: bool) -> Result<Vec<Assignment>, FlowerError>;

    /// Marks the assignment acknowledged once. A courier acknowledgment also
    /// moves its order to `delivered`. Returns `None` for an unknown id.
    async fn acknowledge_assignment(
        &self,
        id: AssignmentId,
    ) -> Result<Option<AckOutcome>, FlowerError>;
}
