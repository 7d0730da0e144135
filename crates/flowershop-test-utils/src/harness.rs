// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a complete shop with a temp SQLite database, a
//! seeded catalog and staff, and a [`MockGateway`]. Events are driven through
//! the real [`DialogService`] either directly (`send`) or via a running
//! [`DialogLoop`].

use std::sync::Arc;
use std::time::Duration;

use flowershop_config::model::{ShopConfig, StorageConfig};
use flowershop_core::types::{
    CatalogItem, CategoryId, Choice, InboundEvent, ItemId, Worker, WorkerId, WorkerKind,
    WorkerStatus,
};
use flowershop_core::{FlowerError, Outbox, StorageAdapter, UserId};
use flowershop_dialog::{Catalog, DialogLoop, DialogService};
use flowershop_storage::SqliteStorage;
use rust_decimal::Decimal;

use crate::mock_gateway::MockGateway;

/// Send timeout used by the harness outbox.
const SEND_TIMEOUT: Duration = Duration::from_millis(200);

/// A catalog entry to seed: name, price, and occasion name.
#[derive(Debug, Clone)]
pub struct SeedItem {
    pub name: String,
    pub price: Decimal,
    pub occasion: String,
}

impl SeedItem {
    pub fn new(name: &str, price: i64, occasion: &str) -> Self {
        Self {
            name: name.into(),
            price: Decimal::from(price),
            occasion: occasion.into(),
        }
    }
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    items: Vec<SeedItem>,
    courier: Option<WorkerStatus>,
    florist: Option<WorkerStatus>,
    shop: ShopConfig,
    send_attempts: u32,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            items: vec![
                SeedItem::new("Нежность", 450, "День рождения"),
                SeedItem::new("Весна", 900, "День рождения"),
                SeedItem::new("Пион", 1500, "День рождения"),
                SeedItem::new("Рассвет", 2500, "Свадьба"),
            ],
            courier: Some(WorkerStatus::Active),
            florist: Some(WorkerStatus::Active),
            shop: ShopConfig::default(),
            send_attempts: 2,
        }
    }

    /// Replace the seeded catalog.
    pub fn with_items(mut self, items: Vec<SeedItem>) -> Self {
        self.items = items;
        self
    }

    /// Seed the courier with the given status, or none at all.
    pub fn with_courier(mut self, status: Option<WorkerStatus>) -> Self {
        self.courier = status;
        self
    }

    /// Seed the florist with the given status, or none at all.
    pub fn with_florist(mut self, status: Option<WorkerStatus>) -> Self {
        self.florist = status;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.shop.page_size = page_size;
        self
    }

    pub fn with_delivery_fee(mut self, fee: Decimal) -> Self {
        self.shop.delivery_fee = fee;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, FlowerError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| FlowerError::Persistence {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        }));
        storage.initialize().await?;

        let mut occasions: Vec<(String, CategoryId)> = Vec::new();
        for item in &self.items {
            let category_id = match occasions.iter().find(|(name, _)| *name == item.occasion) {
                Some((_, id)) => *id,
                None => {
                    let id = storage.insert_category(&item.occasion).await?;
                    occasions.push((item.occasion.clone(), id));
                    id
                }
            };
            storage
                .insert_item(&CatalogItem {
                    id: ItemId(0),
                    name: item.name.clone(),
                    description: format!("Букет «{}»", item.name),
                    structure: "Сезонные цветы".into(),
                    price: item.price,
                    category_id,
                    photo: None,
                })
                .await?;
        }

        for (kind, name, contact, status) in [
            (WorkerKind::Courier, "Пётр", "700", self.courier),
            (WorkerKind::Florist, "Ирина", "800", self.florist),
        ] {
            if let Some(status) = status {
                storage
                    .insert_worker(&Worker {
                        id: WorkerId(0),
                        kind,
                        name: name.into(),
                        contact: contact.into(),
                        status,
                    })
                    .await?;
            }
        }

        let gateway = Arc::new(MockGateway::new());
        let outbox = Outbox::new(gateway.clone(), SEND_TIMEOUT, self.send_attempts);
        let catalog = Arc::new(Catalog::load(storage.as_ref()).await?);
        let service = Arc::new(DialogService::new(
            storage.clone(),
            catalog,
            outbox,
            self.shop.clone(),
        ));

        tracing::debug!(items = self.items.len(), "test harness ready");

        Ok(TestHarness {
            gateway,
            storage,
            service,
            shop: self.shop,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock gateway and temp storage.
pub struct TestHarness {
    /// The mock chat transport.
    pub gateway: Arc<MockGateway>,
    /// SQLite storage (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// The dialog service under test.
    pub service: Arc<DialogService>,
    pub shop: ShopConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with the default catalog and active staff.
    pub async fn new() -> Result<Self, FlowerError> {
        Self::builder().build().await
    }

    /// Process one event to completion.
    pub async fn send(&self, event: InboundEvent) -> Result<(), FlowerError> {
        self.service.process(event).await
    }

    pub async fn start(&self, user: &UserId) -> Result<(), FlowerError> {
        self.send(InboundEvent::UserStarted { user: user.clone() })
            .await
    }

    pub async fn choose(&self, user: &UserId, choice: Choice) -> Result<(), FlowerError> {
        self.send(InboundEvent::UserChoice {
            user: user.clone(),
            choice,
        })
        .await
    }

    pub async fn say(&self, user: &UserId, text: &str) -> Result<(), FlowerError> {
        self.send(InboundEvent::UserText {
            user: user.clone(),
            text: text.into(),
        })
        .await
    }

    pub async fn pay(
        &self,
        user: &UserId,
        transaction_ref: &str,
        amount: Decimal,
    ) -> Result<(), FlowerError> {
        self.send(InboundEvent::PaymentConfirmed {
            user: user.clone(),
            transaction_ref: transaction_ref.into(),
            amount,
        })
        .await
    }

    /// The persisted state name for the user, `None` without a session.
    pub async fn state(&self, user: &UserId) -> Result<Option<String>, FlowerError> {
        Ok(self.storage.get_session(user).await?.map(|r| r.state))
    }

    /// Id of the first seeded category with this name.
    pub fn occasion(&self, name: &str) -> Option<CategoryId> {
        self.service
            .catalog()
            .snapshot()
            .categories()
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
    }

    /// Id of the seeded item with this name.
    pub fn item(&self, name: &str) -> Option<ItemId> {
        self.service
            .catalog()
            .snapshot()
            .items()
            .iter()
            .find(|i| i.name == name)
            .map(|i| i.id)
    }

    /// A dialog loop reading from the mock gateway.
    pub fn dialog_loop(&self) -> DialogLoop {
        DialogLoop::new(self.gateway.clone(), Arc::clone(&self.service))
    }
}
