// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order ledger persistence.

use flowershop_core::types::{
    ItemId, NewOrder, Order, OrderId, OrderStatus, PlacedOrder, UserId, WorkerId,
};
use flowershop_core::FlowerError;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::database::Database;
use crate::queries::parsed;

const ORDER_COLUMNS: &str = "id, user_id, item_id, recipient_name, address, delivery_date, \
     delivery_time, status, total_price, amount_paid, payment_ref, courier_id, created_at, \
     completed_at";

pub(crate) fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: OrderId(row.get(0)?),
        user_id: UserId(row.get(1)?),
        item_id: ItemId(row.get(2)?),
        recipient_name: row.get(3)?,
        address: row.get(4)?,
        delivery_date: parsed(row, 5)?,
        delivery_time: row.get(6)?,
        status: parsed(row, 7)?,
        total_price: parsed(row, 8)?,
        amount_paid: parsed(row, 9)?,
        payment_ref: row.get(10)?,
        courier_id: row.get::<_, Option<i64>>(11)?.map(WorkerId),
        created_at: row.get(12)?,
        completed_at: row.get(13)?,
    })
}

/// Insert the order unless `(user_id, payment_ref)` already exists, and drop
/// the user's session when a new row is written. One transaction.
///
/// Fails with `ReferenceNotFound` if the item is gone; nothing is written then.
pub async fn place_order(db: &Database, order: &NewOrder) -> Result<PlacedOrder, FlowerError> {
    let new = order.clone();
    let item_id = new.item_id;
    let placed = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let item_exists = tx
                .query_row("SELECT 1 FROM items WHERE id = ?1", params![new.item_id.0], |_| {
                    Ok(())
                })
                .optional()?
                .is_some();
            if !item_exists {
                return Ok(None);
            }

            let inserted = tx.execute(
                "INSERT INTO orders (user_id, item_id, recipient_name, address, delivery_date,
                                     delivery_time, total_price, amount_paid, payment_ref)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(user_id, payment_ref) DO NOTHING",
                params![
                    new.user_id.0,
                    new.item_id.0,
                    new.recipient_name,
                    new.address,
                    new.delivery_date.to_string(),
                    new.delivery_time,
                    new.total_price.to_string(),
                    new.amount_paid.to_string(),
                    new.payment_ref,
                ],
            )?;
            let created = inserted == 1;

            let order = tx.query_row(
                &format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 AND payment_ref = ?2"
                ),
                params![new.user_id.0, new.payment_ref],
                order_from_row,
            )?;

            if created {
                tx.execute(
                    "DELETE FROM sessions WHERE user_id = ?1",
                    params![new.user_id.0],
                )?;
            }

            tx.commit()?;
            Ok(Some(PlacedOrder { order, created }))
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    let placed = placed.ok_or_else(|| FlowerError::not_found("item", item_id))?;
    debug!(
        order_id = %placed.order.id,
        created = placed.created,
        "order placement committed"
    );
    Ok(placed)
}

/// One order by id.
pub async fn get_order(db: &Database, id: OrderId) -> Result<Option<Order>, FlowerError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
                params![id.0],
                order_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The order created by a given payment, if any.
pub async fn find_order_by_payment(
    db: &Database,
    user: &UserId,
    payment_ref: &str,
) -> Result<Option<Order>, FlowerError> {
    let user = user.0.clone();
    let payment_ref = payment_ref.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 AND payment_ref = ?2"
                ),
                params![user, payment_ref],
                order_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// SQL list of the statuses an order may move to `to` from.
pub(crate) fn predecessor_list(to: OrderStatus) -> Option<String> {
    let preds = to.predecessors();
    if preds.is_empty() {
        return None;
    }
    Some(
        preds
            .iter()
            .map(|s| format!("'{s}'"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Advance an order's status. Returns `false` when the current status does
/// not permit the move (including unknown ids).
pub async fn advance_order_status(
    db: &Database,
    id: OrderId,
    to: OrderStatus,
) -> Result<bool, FlowerError> {
    let Some(allowed_from) = predecessor_list(to) else {
        return Ok(false);
    };
    let to_str = to.to_string();
    let stamps_completion = to.is_terminal();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                &format!(
                    "UPDATE orders SET status = ?1,
                        completed_at = CASE WHEN ?2 THEN strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                                            ELSE completed_at END
                     WHERE id = ?3 AND status IN ({allowed_from})"
                ),
                params![to_str, stamps_completion, id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Orders still `new` with no courier, lowest id first.
pub async fn list_unassigned_orders(db: &Database) -> Result<Vec<Order>, FlowerError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders
                 WHERE status = 'new' AND courier_id IS NULL
                 ORDER BY id"
            ))?;
            let rows = stmt.query_map([], order_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    use super::*;
    use crate::queries::{assignments, catalog, sessions, workers};
    use flowershop_core::types::{CatalogItem, Worker, WorkerKind, WorkerStatus};

    async fn setup(dir: &tempfile::TempDir) -> (Database, ItemId) {
        let db = Database::open(dir.path().join("orders.db").to_str().unwrap())
            .await
            .unwrap();
        let cat = catalog::insert_category(&db, "Свадьба").await.unwrap();
        let item = catalog::insert_item(
            &db,
            &CatalogItem {
                id: ItemId(0),
                name: "Белые розы".into(),
                description: String::new(),
                structure: String::new(),
                price: Decimal::from(1500),
                category_id: cat,
                photo: None,
            },
        )
        .await
        .unwrap();
        (db, item)
    }

    fn new_order(user: &str, item: ItemId, payment_ref: &str) -> NewOrder {
        NewOrder {
            user_id: UserId::from(user),
            item_id: item,
            recipient_name: "Мария".into(),
            address: "г. Москва, ул. Тверская, д. 1".into(),
            delivery_date: NaiveDate::from_ymd_opt(2030, 5, 1).unwrap(),
            delivery_time: "14:00".into(),
            total_price: Decimal::from(2000),
            amount_paid: Decimal::from(2000),
            payment_ref: payment_ref.into(),
        }
    }

    #[tokio::test]
    async fn place_order_creates_once_per_payment() {
        let dir = tempdir().unwrap();
        let (db, item) = setup(&dir).await;
        let user = UserId::from("u1");
        sessions::save_session(&db, &user, "awaiting_payment_confirmation", "{}")
            .await
            .unwrap();

        let first = place_order(&db, &new_order("u1", item, "tx-1")).await.unwrap();
        assert!(first.created);
        assert_eq!(first.order.status, OrderStatus::New);
        assert!(first.order.courier_id.is_none());
        assert!(sessions::get_session(&db, &user).await.unwrap().is_none());

        let second = place_order(&db, &new_order("u1", item, "tx-1")).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.order.id, first.order.id);

        let third = place_order(&db, &new_order("u1", item, "tx-2")).await.unwrap();
        assert!(third.created);
        assert_ne!(third.order.id, first.order.id);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_does_not_touch_new_session() {
        let dir = tempdir().unwrap();
        let (db, item) = setup(&dir).await;
        let user = UserId::from("u2");
        place_order(&db, &new_order("u2", item, "tx-9")).await.unwrap();

        sessions::save_session(&db, &user, "choosing_occasion", "{}").await.unwrap();
        place_order(&db, &new_order("u2", item, "tx-9")).await.unwrap();
        assert!(sessions::get_session(&db, &user).await.unwrap().is_some());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_item_writes_nothing() {
        let dir = tempdir().unwrap();
        let (db, _) = setup(&dir).await;
        let user = UserId::from("u3");
        sessions::save_session(&db, &user, "awaiting_payment_confirmation", "{}")
            .await
            .unwrap();

        let err = place_order(&db, &new_order("u3", ItemId(404), "tx-3"))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowerError::ReferenceNotFound { kind: "item", .. }));
        assert!(find_order_by_payment(&db, &user, "tx-3").await.unwrap().is_none());
        assert!(sessions::get_session(&db, &user).await.unwrap().is_some());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn status_only_moves_forward() {
        let dir = tempdir().unwrap();
        let (db, item) = setup(&dir).await;
        let placed = place_order(&db, &new_order("u4", item, "tx-4")).await.unwrap();
        let id = placed.order.id;

        assert!(!advance_order_status(&db, id, OrderStatus::New).await.unwrap());
        assert!(advance_order_status(&db, id, OrderStatus::InWork).await.unwrap());
        assert!(!advance_order_status(&db, id, OrderStatus::InWork).await.unwrap());
        assert!(advance_order_status(&db, id, OrderStatus::Delivered).await.unwrap());
        assert!(!advance_order_status(&db, id, OrderStatus::Canceled).await.unwrap());

        let order = get_order(&db, id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(order.completed_at.is_some());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unassigned_orders_exclude_couriered_and_closed() {
        let dir = tempdir().unwrap();
        let (db, item) = setup(&dir).await;
        let first = place_order(&db, &new_order("u5", item, "tx-5")).await.unwrap();
        let second = place_order(&db, &new_order("u6", item, "tx-6")).await.unwrap();
        let third = place_order(&db, &new_order("u7", item, "tx-7")).await.unwrap();
        assert!(
            advance_order_status(&db, third.order.id, OrderStatus::Canceled)
                .await
                .unwrap()
        );

        let ids: Vec<_> = list_unassigned_orders(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![first.order.id, second.order.id]);

        let courier = workers::insert_worker(
            &db,
            &Worker {
                id: WorkerId(0),
                kind: WorkerKind::Courier,
                name: "Пётр".into(),
                contact: "700".into(),
                status: WorkerStatus::Active,
            },
        )
        .await
        .unwrap();
        let assigned =
            assignments::assign_worker(&db, WorkerKind::Courier, Some(first.order.id), None)
                .await
                .unwrap()
                .unwrap();
        assert_eq!(assigned.0.id, courier);

        let remaining = list_unassigned_orders(&db).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second.order.id);
        db.close().await.unwrap();
    }

    #[test]
    fn predecessor_lists_are_quoted() {
        assert_eq!(predecessor_list(OrderStatus::New), None);
        assert_eq!(
            predecessor_list(OrderStatus::Delivered).as_deref(),
            Some("'new', 'in_work'")
        );
    }
}
