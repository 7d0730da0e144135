// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `flowershop serve` command implementation.
//!
//! Opens SQLite storage, loads the catalog, connects the Telegram gateway,
//! and runs the dialog loop until SIGINT/SIGTERM. Shutdown drains in-flight
//! events before storage is closed.

use std::sync::Arc;
use std::time::Duration;

use flowershop_config::model::FlowershopConfig;
use flowershop_core::{
    FlowerError, HealthStatus, NotificationGateway, Outbox, PluginAdapter, StorageAdapter,
};
use flowershop_dialog::{Catalog, DialogLoop, DialogService, shutdown};
use flowershop_storage::SqliteStorage;
use flowershop_telegram::TelegramGateway;
use tracing::{info, warn};

/// Opens and migrates the configured database.
pub async fn open_storage(config: &FlowershopConfig) -> Result<Arc<SqliteStorage>, FlowerError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(Arc::new(storage))
}

/// Outbox over `gateway` with the configured send limits.
pub fn outbox(config: &FlowershopConfig, gateway: Arc<dyn NotificationGateway>) -> Outbox {
    Outbox::new(
        gateway,
        Duration::from_secs(config.dispatch.send_timeout_secs),
        config.dispatch.send_attempts,
    )
}

/// Runs the `flowershop serve` command.
pub async fn run_serve(config: FlowershopConfig) -> Result<(), FlowerError> {
    info!(name = %config.bot.name, "starting flowershop serve");

    let storage = open_storage(&config).await?;
    info!(path = %config.storage.database_path, "storage ready");

    let catalog = Arc::new(Catalog::load(storage.as_ref()).await?);
    let snapshot = catalog.snapshot();
    if snapshot.items().is_empty() {
        warn!("catalog is empty; customers will see no bouquets");
    }
    info!(
        categories = snapshot.categories().len(),
        items = snapshot.items().len(),
        "catalog loaded"
    );

    let mut gateway = TelegramGateway::new(config.telegram.clone())?;
    match gateway.health_check().await? {
        HealthStatus::Healthy => info!("telegram bot reachable"),
        HealthStatus::Degraded(reason) | HealthStatus::Unhealthy(reason) => {
            warn!(reason = %reason, "telegram health check failed, polling anyway");
        }
    }
    gateway.connect().await?;
    let gateway: Arc<dyn NotificationGateway> = Arc::new(gateway);

    let service = Arc::new(DialogService::new(
        storage,
        catalog,
        outbox(&config, Arc::clone(&gateway)),
        config.shop.clone(),
    ));

    let open = service.dispatcher().open_assignments().await?;
    if !open.is_empty() {
        warn!(
            count = open.len(),
            "assignments awaiting acknowledgment; see `flowershop assignments`"
        );
    }
    let unassigned = service.dispatcher().unassigned_orders().await?;
    if !unassigned.is_empty() {
        warn!(
            count = unassigned.len(),
            "paid orders without a courier; retry with `flowershop assignments --assign-order`"
        );
    }

    let cancel = shutdown::install_signal_handler();
    let dialog_loop = DialogLoop::new(Arc::clone(&gateway), service);
    dialog_loop.run(cancel).await?;

    if let Err(e) = gateway.shutdown().await {
        warn!(error = %e, "gateway shutdown failed");
    }

    info!("flowershop serve shutdown complete");
    Ok(())
}
