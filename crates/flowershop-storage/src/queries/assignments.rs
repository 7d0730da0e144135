// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assignment records: worker selection, creation, and acknowledgment.
//!
//! Assignments are never deleted. The only mutation is the one-way
//! acknowledgment flag.

use flowershop_core::types::{
    AckOutcome, Assignment, AssignmentId, OrderId, Worker, WorkerId, WorkerKind,
};
use flowershop_core::FlowerError;
use rusqlite::{params, OptionalExtension, Row, Transaction};
use tracing::debug;

use crate::database::Database;
use crate::queries::parsed;
use crate::queries::workers::{worker_from_row, WORKER_COLUMNS};

const ASSIGNMENT_COLUMNS: &str =
    "id, kind, worker_id, order_id, contact_phone, assigned_at, acknowledged, acknowledged_at";

fn assignment_from_row(row: &Row<'_>) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: AssignmentId(row.get(0)?),
        kind: parsed(row, 1)?,
        worker_id: WorkerId(row.get(2)?),
        order_id: row.get::<_, Option<i64>>(3)?.map(OrderId),
        contact_phone: row.get(4)?,
        assigned_at: row.get(5)?,
        acknowledged: row.get(6)?,
        acknowledged_at: row.get(7)?,
    })
}

fn load_assignment(tx: &Transaction<'_>, id: i64) -> rusqlite::Result<Assignment> {
    tx.query_row(
        &format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = ?1"),
        params![id],
        assignment_from_row,
    )
}

fn load_worker(tx: &Transaction<'_>, id: WorkerId) -> rusqlite::Result<Worker> {
    tx.query_row(
        &format!("SELECT {WORKER_COLUMNS} FROM workers WHERE id = ?1"),
        params![id.0],
        worker_from_row,
    )
}

/// Pick the lowest-id active worker of `kind` and record an assignment.
///
/// For couriers the order's `courier_id` is set in the same transaction. If
/// the order already has a courier assignment, that one is returned instead
/// of creating a second. Returns `None` when no worker of the kind is active.
pub async fn assign_worker(
    db: &Database,
    kind: WorkerKind,
    order_id: Option<OrderId>,
    contact_phone: Option<&str>,
) -> Result<Option<(Worker, Assignment)>, FlowerError> {
    let contact_phone = contact_phone.map(str::to_string);
    let kind_str = kind.to_string();
    let result = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            if kind == WorkerKind::Courier
                && let Some(order) = order_id
            {
                let existing = tx
                    .query_row(
                        &format!(
                            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments
                             WHERE kind = 'courier' AND order_id = ?1"
                        ),
                        params![order.0],
                        assignment_from_row,
                    )
                    .optional()?;
                if let Some(assignment) = existing {
                    let worker = load_worker(&tx, assignment.worker_id)?;
                    tx.commit()?;
                    return Ok(Some((worker, assignment, false)));
                }
            }

            let worker = tx
                .query_row(
                    &format!(
                        "SELECT {WORKER_COLUMNS} FROM workers
                         WHERE kind = ?1 AND status = 'active'
                         ORDER BY id LIMIT 1"
                    ),
                    params![kind_str],
                    worker_from_row,
                )
                .optional()?;
            let Some(worker) = worker else {
                return Ok(None);
            };

            tx.execute(
                "INSERT INTO assignments (kind, worker_id, order_id, contact_phone)
                 VALUES (?1, ?2, ?3, ?4)",
                params![kind_str, worker.id.0, order_id.map(|o| o.0), contact_phone],
            )?;
            let assignment = load_assignment(&tx, tx.last_insert_rowid())?;

            if kind == WorkerKind::Courier
                && let Some(order) = order_id
            {
                tx.execute(
                    "UPDATE orders SET courier_id = ?1 WHERE id = ?2",
                    params![worker.id.0, order.0],
                )?;
            }

            tx.commit()?;
            Ok(Some((worker, assignment, true)))
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    Ok(result.map(|(worker, assignment, created)| {
        debug!(
            assignment_id = %assignment.id,
            worker_id = %worker.id,
            kind = %kind,
            created,
            "assignment recorded"
        );
        (worker, assignment)
    }))
}

pub async fn get_assignment(
    db: &Database,
    id: AssignmentId,
) -> Result<Option<Assignment>, FlowerError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = ?1"),
                params![id.0],
                assignment_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Assignments ordered oldest first, optionally only unacknowledged ones.
pub async fn list_assignments(
    db: &Database,
    open_only: bool,
) -> Result<Vec<Assignment>, FlowerError> {
    db.connection()
        .call(move |conn| {
            let filter = if open_only {
                "WHERE acknowledged = 0"
            } else {
                ""
            };
            let mut stmt = conn.prepare(&format!(
                "SELECT {ASSIGNMENT_COLUMNS} FROM assignments {filter} ORDER BY id"
            ))?;
            let rows = stmt.query_map([], assignment_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark an assignment acknowledged. Returns `None` for unknown ids.
///
/// The flag and timestamp are written once; later calls report
/// `AlreadyAcknowledged` with the original timestamp. A first courier
/// acknowledgment also moves the linked order to `delivered`.
pub async fn acknowledge_assignment(
    db: &Database,
    id: AssignmentId,
) -> Result<Option<AckOutcome>, FlowerError> {
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE assignments
                 SET acknowledged = 1,
                     acknowledged_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1 AND acknowledged = 0",
                params![id.0],
            )?;

            let Some(assignment) = tx
                .query_row(
                    &format!("SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = ?1"),
                    params![id.0],
                    assignment_from_row,
                )
                .optional()?
            else {
                return Ok(None);
            };

            if changed == 0 {
                tx.commit()?;
                return Ok(Some(AckOutcome::AlreadyAcknowledged(assignment)));
            }

            if assignment.kind == WorkerKind::Courier
                && let Some(order) = assignment.order_id
            {
                tx.execute(
                    "UPDATE orders
                     SET status = 'delivered',
                         completed_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1 AND status IN ('new', 'in_work')",
                    params![order.0],
                )?;
            }

            tx.commit()?;
            Ok(Some(AckOutcome::Acknowledged(assignment)))
        })
        .await
        .map_err(crate::database::map_tr_err)
}
