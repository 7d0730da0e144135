// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `flowershop assignments` command implementation.
//!
//! Unacknowledged assignments are the manual re-notify queue: an operator
//! lists them and pushes the worker notification again with `--renotify`.
//! Paid orders that found no active courier are listed too, and
//! `--assign-order` retries them.

use std::sync::Arc;

use flowershop_config::model::FlowershopConfig;
use flowershop_core::types::{Assignment, AssignmentId, Order, OrderId};
use flowershop_core::{FlowerError, StorageAdapter};
use flowershop_orders::Dispatcher;
use flowershop_telegram::TelegramGateway;

use crate::serve::{open_storage, outbox};

/// One table row per assignment.
pub fn format_row(assignment: &Assignment, worker_name: &str) -> String {
    let target = match (assignment.order_id, assignment.contact_phone.as_deref()) {
        (Some(order_id), _) => format!("order #{order_id}"),
        (None, Some(phone)) => format!("callback {phone}"),
        (None, None) => "-".to_string(),
    };
    let ack = if assignment.acknowledged {
        assignment.acknowledged_at.as_deref().unwrap_or("yes")
    } else {
        "pending"
    };
    format!(
        "{:>5}  {:<8} {:<16} {:<24} {:<26} {}",
        assignment.id, assignment.kind, worker_name, target, assignment.assigned_at, ack
    )
}

/// One table row per order waiting for a courier.
pub fn format_unassigned(order: &Order) -> String {
    format!(
        "{:>5}  {:<12} {:<6} {:<40} {}",
        order.id, order.delivery_date, order.delivery_time, order.address, order.created_at
    )
}

/// Prints open assignments, or all of them with `all`, followed by paid
/// orders still waiting for a courier.
pub async fn run_list(config: &FlowershopConfig, all: bool) -> Result<(), FlowerError> {
    let storage = open_storage(config).await?;
    let assignments = storage.list_assignments(!all).await?;
    let unassigned = storage.list_unassigned_orders().await?;

    print_assignments(storage.as_ref(), &assignments, all).await?;

    if !unassigned.is_empty() {
        println!();
        println!(
            "{:>5}  {:<12} {:<6} {:<40} PAID AT",
            "ORDER", "DATE", "TIME", "ADDRESS"
        );
        for order in &unassigned {
            println!("{}", format_unassigned(order));
        }
        println!("retry with `flowershop assignments --assign-order <ORDER>`");
    }
    storage.close().await
}

async fn print_assignments(
    storage: &dyn StorageAdapter,
    assignments: &[Assignment],
    all: bool,
) -> Result<(), FlowerError> {
    if assignments.is_empty() {
        println!(
            "{}",
            if all {
                "no assignments"
            } else {
                "no assignments awaiting acknowledgment"
            }
        );
        return Ok(());
    }

    println!(
        "{:>5}  {:<8} {:<16} {:<24} {:<26} ACK",
        "ID", "KIND", "WORKER", "FOR", "ASSIGNED"
    );
    for assignment in assignments {
        let name = storage
            .get_worker(assignment.worker_id)
            .await?
            .map(|w| w.name)
            .unwrap_or_else(|| format!("#{}", assignment.worker_id));
        println!("{}", format_row(assignment, &name));
    }
    Ok(())
}

/// Sends the worker notification for an open assignment again.
pub async fn run_renotify(config: &FlowershopConfig, id: i64) -> Result<(), FlowerError> {
    let storage = open_storage(config).await?;
    let gateway = Arc::new(TelegramGateway::new(config.telegram.clone())?);
    let dispatcher = Dispatcher::new(storage.clone(), outbox(config, gateway));

    let result = dispatcher.renotify(AssignmentId(id)).await;
    storage.close().await?;
    result?;
    println!("assignment {id}: worker notified");
    Ok(())
}

/// Retries courier assignment for a paid order that has none.
pub async fn run_assign_order(config: &FlowershopConfig, id: i64) -> Result<(), FlowerError> {
    let storage = open_storage(config).await?;
    let gateway = Arc::new(TelegramGateway::new(config.telegram.clone())?);
    let dispatcher = Dispatcher::new(storage.clone(), outbox(config, gateway));

    let result = dispatcher.assign_pending(OrderId(id)).await;
    storage.close().await?;
    let assignment = result?;
    println!(
        "order {id}: courier assignment {} recorded",
        assignment.id
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use flowershop_core::types::{ItemId, OrderStatus, UserId, WorkerId, WorkerKind};
    use rust_decimal::Decimal;

    use super::*;

    fn assignment(order_id: Option<i64>, phone: Option<&str>, acknowledged: bool) -> Assignment {
        Assignment {
            id: AssignmentId(3),
            kind: if order_id.is_some() {
                WorkerKind::Courier
            } else {
                WorkerKind::Florist
            },
            worker_id: WorkerId(1),
            order_id: order_id.map(OrderId),
            contact_phone: phone.map(String::from),
            assigned_at: "2026-03-07T10:00:00.000Z".into(),
            acknowledged,
            acknowledged_at: acknowledged.then(|| "2026-03-07T10:05:00.000Z".to_string()),
        }
    }

    #[test]
    fn courier_row_names_the_order() {
        let row = format_row(&assignment(Some(12), None, false), "Пётр");
        assert!(row.contains("courier"));
        assert!(row.contains("order #12"));
        assert!(row.ends_with("pending"));
    }

    #[test]
    fn florist_row_names_the_callback_phone() {
        let row = format_row(&assignment(None, Some("+79165551234"), true), "Ирина");
        assert!(row.contains("florist"));
        assert!(row.contains("callback +79165551234"));
        assert!(row.ends_with("2026-03-07T10:05:00.000Z"));
    }

    #[test]
    fn unassigned_row_shows_order_and_delivery_slot() {
        let order = Order {
            id: OrderId(21),
            user_id: UserId::from("42"),
            item_id: ItemId(1),
            recipient_name: "Мария".into(),
            address: "г. Москва, ул. Ленина, д. 15".into(),
            delivery_date: NaiveDate::from_ymd_opt(2026, 3, 8).unwrap(),
            delivery_time: "14:00".into(),
            status: OrderStatus::New,
            total_price: Decimal::from(1400),
            amount_paid: Decimal::from(1400),
            payment_ref: "charge-21".into(),
            courier_id: None,
            created_at: "2026-03-07T09:00:00.000Z".into(),
            completed_at: None,
        };
        let row = format_unassigned(&order);
        assert!(row.trim_start().starts_with("21"));
        assert!(row.contains("2026-03-08"));
        assert!(row.contains("14:00"));
        assert!(row.contains("ул. Ленина"));
    }
}
