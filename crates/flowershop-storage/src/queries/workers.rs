// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker registry queries.

use flowershop_core::types::{Worker, WorkerId, WorkerKind};
use flowershop_core::FlowerError;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::Database;
use crate::queries::parsed;

pub(crate) const WORKER_COLUMNS: &str = "id, kind, name, contact, status";

pub(crate) fn worker_from_row(row: &Row<'_>) -> rusqlite::Result<Worker> {
    Ok(Worker {
        id: WorkerId(row.get(0)?),
        kind: parsed(row, 1)?,
        name: row.get(2)?,
        contact: row.get(3)?,
        status: parsed(row, 4)?,
    })
}

/// Register a worker (its `id` is ignored) and return the assigned id.
pub async fn insert_worker(db: &Database, worker: &Worker) -> Result<WorkerId, FlowerError> {
    let worker = worker.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO workers (kind, name, contact, status) VALUES (?1, ?2, ?3, ?4)",
                params![
                    worker.kind.to_string(),
                    worker.name,
                    worker.contact,
                    worker.status.to_string(),
                ],
            )?;
            Ok(WorkerId(conn.last_insert_rowid()))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_worker(db: &Database, id: WorkerId) -> Result<Option<Worker>, FlowerError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {WORKER_COLUMNS} FROM workers WHERE id = ?1"),
                params![id.0],
                worker_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Workers of one kind, ordered by id, regardless of status.
pub async fn list_workers(db: &Database, kind: WorkerKind) -> Result<Vec<Worker>, FlowerError> {
    let kind = kind.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {WORKER_COLUMNS} FROM workers WHERE kind = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![kind], worker_from_row)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use flowershop_core::types::WorkerStatus;
    use tempfile::tempdir;

    use super::*;

    fn worker(kind: WorkerKind, name: &str, status: WorkerStatus) -> Worker {
        Worker {
            id: WorkerId(0),
            kind,
            name: name.into(),
            contact: format!("chat-{name}"),
            status,
        }
    }

    #[tokio::test]
    async fn workers_are_listed_by_kind() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("workers.db").to_str().unwrap())
            .await
            .unwrap();

        let c1 = insert_worker(&db, &worker(WorkerKind::Courier, "ivan", WorkerStatus::Active))
            .await
            .unwrap();
        insert_worker(&db, &worker(WorkerKind::Florist, "olga", WorkerStatus::Active))
            .await
            .unwrap();
        let c2 = insert_worker(&db, &worker(WorkerKind::Courier, "petr", WorkerStatus::OnLeave))
            .await
            .unwrap();

        let couriers = list_workers(&db, WorkerKind::Courier).await.unwrap();
        assert_eq!(
            couriers.iter().map(|w| w.id).collect::<Vec<_>>(),
            vec![c1, c2]
        );
        assert_eq!(couriers[1].status, WorkerStatus::OnLeave);

        let fetched = get_worker(&db, c1).await.unwrap().unwrap();
        assert_eq!(fetched.contact, "chat-ivan");
        assert!(get_worker(&db, WorkerId(77)).await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
