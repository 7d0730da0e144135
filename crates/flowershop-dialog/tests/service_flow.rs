// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! DialogService edge cases against a real SQLite store. Whole-conversation
//! scenarios live in the binary's end-to-end tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use flowershop_config::model::{ShopConfig, StorageConfig};
use flowershop_core::types::{
    AdapterType, CatalogItem, CategoryId, Choice, HealthStatus, InboundEvent, ItemId,
    OutboundAction, PriceBracket, Worker, WorkerId, WorkerKind, WorkerStatus,
};
use flowershop_core::{
    FlowerError, NotificationGateway, Outbox, PluginAdapter, StorageAdapter, UserId,
};
use flowershop_dialog::{Catalog, CatalogSnapshot, DialogService};
use flowershop_storage::SqliteStorage;
use rust_decimal::Decimal;
use tempfile::TempDir;

#[derive(Default)]
struct RecordingGateway {
    sent: Mutex<Vec<OutboundAction>>,
}

impl RecordingGateway {
    fn take(&self) -> Vec<OutboundAction> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

#[async_trait]
impl PluginAdapter for RecordingGateway {
    fn name(&self) -> &str {
        "recording"
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
impl NotificationGateway for RecordingGateway {
    async fn connect(&mut self) -> Result<(), FlowerError> {
        Ok(())
    }
    async fn send(&self, action: OutboundAction) -> Result<(), FlowerError> {
        self.sent.lock().unwrap().push(action);
        Ok(())
    }
    async fn receive(&self) -> Result<InboundEvent, FlowerError> {
        std::future::pending().await
    }
}

struct Shop {
    _dir: TempDir,
    storage: Arc<SqliteStorage>,
    gateway: Arc<RecordingGateway>,
    service: DialogService,
    occasion: CategoryId,
    item: ItemId,
}

async fn shop() -> Shop {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(SqliteStorage::new(StorageConfig {
        database_path: dir.path().join("dialog.db").to_string_lossy().into_owned(),
        wal_mode: true,
    }));
    storage.initialize().await.unwrap();

    let occasion = storage.insert_category("8 Марта").await.unwrap();
    let item = storage
        .insert_item(&CatalogItem {
            id: ItemId(0),
            name: "Весна".into(),
            description: "Тюльпаны в крафте".into(),
            structure: "Тюльпаны".into(),
            price: Decimal::from(900),
            category_id: occasion,
            photo: Some("AgACspring".into()),
        })
        .await
        .unwrap();

    storage
        .insert_worker(&Worker {
            id: WorkerId(0),
            kind: WorkerKind::Courier,
            name: "Пётр".into(),
            contact: "chat-Пётр".into(),
            status: WorkerStatus::Active,
        })
        .await
        .unwrap();

    let gateway = Arc::new(RecordingGateway::default());
    let outbox = Outbox::new(gateway.clone(), Duration::from_secs(1), 1);
    let catalog = Arc::new(Catalog::load(storage.as_ref()).await.unwrap());
    let service = DialogService::new(storage.clone(), catalog, outbox, ShopConfig::default());
    Shop {
        _dir: dir,
        storage,
        gateway,
        service,
        occasion,
        item,
    }
}

fn user() -> UserId {
    UserId::from("1001")
}

fn started() -> InboundEvent {
    InboundEvent::UserStarted { user: user() }
}

fn choice(choice: Choice) -> InboundEvent {
    InboundEvent::UserChoice {
        user: user(),
        choice,
    }
}

fn text(text: &str) -> InboundEvent {
    InboundEvent::UserText {
        user: user(),
        text: text.into(),
    }
}

fn paid(transaction_ref: &str) -> InboundEvent {
    InboundEvent::PaymentConfirmed {
        user: user(),
        transaction_ref: transaction_ref.into(),
        amount: Decimal::from(1400),
    }
}

fn prompt_texts(actions: &[OutboundAction]) -> Vec<String> {
    actions
        .iter()
        .filter_map(|a| match a {
            OutboundAction::Prompt { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

async fn state(shop: &Shop) -> Option<String> {
    shop.storage
        .get_session(&user())
        .await
        .unwrap()
        .map(|r| r.state)
}

/// Walk the customer up to the invoice.
async fn checkout(shop: &Shop) {
    for event in [
        started(),
        choice(Choice::ConsentAccept),
        choice(Choice::Occasion(shop.occasion)),
        choice(Choice::Price(PriceBracket::Upto1000)),
        choice(Choice::Item(shop.item)),
        choice(Choice::MenuOrder),
        text("Светлана"),
        text("г. Москва, ул. Тверская, д. 7, кв. 12"),
        text("2099-03-08"),
        text("09:30"),
    ] {
        shop.service.process(event).await.unwrap();
    }
}

#[tokio::test]
async fn concurrent_duplicate_confirmations_are_serialized() {
    let shop = Arc::new(shop().await);
    checkout(&shop).await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let shop = Arc::clone(&shop);
        handles.push(tokio::spawn(async move {
            shop.service.process(paid("ch_race")).await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }
    let assignments = shop.storage.list_assignments(false).await.unwrap();
    assert_eq!(assignments.len(), 1);
}

#[tokio::test]
async fn item_missing_at_payment_returns_to_catalog() {
    let shop = shop().await;
    // Catalog shows an item that storage does not have.
    let ghost = CatalogItem {
        id: ItemId(999),
        name: "Призрак".into(),
        description: String::new(),
        structure: String::new(),
        price: Decimal::from(700),
        category_id: shop.occasion,
        photo: None,
    };
    let categories = shop.storage.list_categories().await.unwrap();
    let catalog = Arc::new(Catalog::new(CatalogSnapshot::new(categories, vec![ghost])));
    let outbox = Outbox::new(shop.gateway.clone(), Duration::from_secs(1), 1);
    let service = DialogService::new(shop.storage.clone(), catalog, outbox, ShopConfig::default());

    for event in [
        started(),
        choice(Choice::ConsentAccept),
        choice(Choice::Occasion(shop.occasion)),
        choice(Choice::Price(PriceBracket::Any)),
        choice(Choice::Item(ItemId(999))),
        choice(Choice::MenuOrder),
        text("Светлана"),
        text("г. Москва, ул. Тверская, д. 7"),
        text("2099-03-08"),
        text("09:30"),
        paid("ch_ghost"),
    ] {
        service.process(event).await.unwrap();
    }

    assert_eq!(state(&shop).await.as_deref(), Some("browsing_items"));
    assert!(service
        .ledger()
        .find_by_payment(&user(), "ch_ghost")
        .await
        .unwrap()
        .is_none());
    let texts = prompt_texts(&shop.gateway.take());
    assert!(texts.iter().any(|t| t.contains("больше недоступен")));
}

#[tokio::test]
async fn unreadable_session_starts_over() {
    let shop = shop().await;
    shop.storage
        .save_session(&user(), "lost_state", "{}")
        .await
        .unwrap();
    shop.service.process(started()).await.unwrap();
    assert_eq!(state(&shop).await.as_deref(), Some("awaiting_consent"));
}

#[tokio::test]
async fn storage_failure_apologizes_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(SqliteStorage::new(StorageConfig {
        database_path: dir.path().join("never.db").to_string_lossy().into_owned(),
        wal_mode: true,
    }));
    let gateway = Arc::new(RecordingGateway::default());
    let outbox = Outbox::new(gateway.clone(), Duration::from_secs(1), 1);
    let catalog = Arc::new(Catalog::new(CatalogSnapshot::default()));
    let service = DialogService::new(storage, catalog, outbox, ShopConfig::default());

    let err = service.process(started()).await.unwrap_err();
    assert!(matches!(err, FlowerError::Persistence { .. }));
    assert_eq!(
        prompt_texts(&gateway.take()),
        vec!["❌ Не удалось сохранить данные. Пожалуйста, повторите последнее действие."]
    );
}
