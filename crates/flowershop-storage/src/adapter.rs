// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use flowershop_config::model::StorageConfig;
use flowershop_core::types::{
    AckOutcome, Assignment, AssignmentId, CatalogItem, Category, CategoryId, ItemId, NewOrder,
    Order, OrderId, OrderStatus, PlacedOrder, SessionRecord, UserId, Worker, WorkerId, WorkerKind,
};
use flowershop_core::{AdapterType, FlowerError, HealthStatus, PluginAdapter, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, FlowerError> {
        self.db.get().ok_or_else(|| FlowerError::Persistence {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, FlowerError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), FlowerError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), FlowerError> {
        let path = self.config.database_path.clone();
        let db = Database::open_with(&path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| FlowerError::Persistence {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), FlowerError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Sessions ---

    async fn get_session(&self, user: &UserId) -> Result<Option<SessionRecord>, FlowerError> {
        queries::sessions::get_session(self.db()?, user).await
    }

    async fn save_session(
        &self,
        user: &UserId,
        state: &str,
        fields: &str,
    ) -> Result<SessionRecord, FlowerError> {
        queries::sessions::save_session(self.db()?, user, state, fields).await
    }

    async fn delete_session(&self, user: &UserId) -> Result<bool, FlowerError> {
        queries::sessions::delete_session(self.db()?, user).await
    }

    // --- Catalog ---

    async fn list_categories(&self) -> Result<Vec<Category>, FlowerError> {
        queries::catalog::list_categories(self.db()?).await
    }

    async fn list_items(&self) -> Result<Vec<CatalogItem>, FlowerError> {
        queries::catalog::list_items(self.db()?).await
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<CatalogItem>, FlowerError> {
        queries::catalog::get_item(self.db()?, id).await
    }

    async fn insert_category(&self, name: &str) -> Result<CategoryId, FlowerError> {
        queries::catalog::insert_category(self.db()?, name).await
    }

    async fn insert_item(&self, item: &CatalogItem) -> Result<ItemId, FlowerError> {
        queries::catalog::insert_item(self.db()?, item).await
    }

    // --- Orders ---

    async fn place_order(&self, order: &NewOrder) -> Result<PlacedOrder, FlowerError> {
        queries::orders::place_order(self.db()?, order).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, FlowerError> {
        queries::orders::get_order(self.db()?, id).await
    }

    async fn find_order_by_payment(
        &self,
        user: &UserId,
        payment_ref: &str,
    ) -> Result<Option<Order>, FlowerError> {
        queries::orders::find_order_by_payment(self.db()?, user, payment_ref).await
    }

    async fn list_unassigned_orders(&self) -> Result<Vec<Order>, FlowerError> {
        queries::orders::list_unassigned_orders(self.db()?).await
    }

    async fn advance_order_status(
        &self,
        id: OrderId,
        to: OrderStatus,
    ) -> Result<bool, FlowerError> {
        queries::orders::advance_order_status(self.db()?, id, to).await
    }

    // --- Workers and assignments ---

    async fn insert_worker(&self, worker: &Worker) -> Result<WorkerId, FlowerError> {
        queries::workers::insert_worker(self.db()?, worker).await
    }

    async fn get_worker(&self, id: WorkerId) -> Result<Option<Worker>, FlowerError> {
        queries::workers::get_worker(self.db()?, id).await
    }

    async fn list_workers(&self, kind: WorkerKind) -> Result<Vec<Worker>, FlowerError> {
        queries::workers::list_workers(self.db()?, kind).await
    }

    async fn assign_worker(
        &self,
        kind: WorkerKind,
        order_id: Option<OrderId>,
        contact_phone: Option<&str>,
    ) -> Result<Option<(Worker, Assignment)>, FlowerError> {
        queries::assignments::assign_worker(self.db()?, kind, order_id, contact_phone).await
    }

    async fn get_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>, FlowerError> {
        queries::assignments::get_assignment(self.db()?, id).await
    }

    async fn list_assignments(&self, open_only: bool) -> Result<Vec<Assignment>, FlowerError> {
        queries::assignments::list_assignments(self.db()?, open_only).await
    }

    async fn acknowledge_assignment(
        &self,
        id: AssignmentId,
    ) -> Result<Option<AckOutcome>, FlowerError> {
        queries::assignments::acknowledge_assignment(self.db()?, id).await
    }
}
