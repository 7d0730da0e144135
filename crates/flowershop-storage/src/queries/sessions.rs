// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialog session persistence.

use flowershop_core::types::{SessionRecord, UserId};
use flowershop_core::FlowerError;
use rusqlite::{params, OptionalExtension, Row};

use crate::database::Database;

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        user_id: UserId(row.get(0)?),
        state: row.get(1)?,
        fields: row.get(2)?,
        version: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Get the session for a user.
pub async fn get_session(db: &Database, user: &UserId) -> Result<Option<SessionRecord>, FlowerError> {
    let user = user.0.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT user_id, state, fields, version, updated_at
                 FROM sessions WHERE user_id = ?1",
                params![user],
                session_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert or replace the user's session, bumping its version.
pub async fn save_session(
    db: &Database,
    user: &UserId,
    state: &str,
    fields: &str,
) -> Result<SessionRecord, FlowerError> {
    let user = user.0.clone();
    let state = state.to_string();
    let fields = fields.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "INSERT INTO sessions (user_id, state, fields) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                    state = excluded.state,
                    fields = excluded.fields,
                    version = sessions.version + 1,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 RETURNING user_id, state, fields, version, updated_at",
                params![user, state, fields],
                session_from_row,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete the user's session. Returns whether one existed.
pub async fn delete_session(db: &Database, user: &UserId) -> Result<bool, FlowerError> {
    let user = user.0.clone();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM sessions WHERE user_id = ?1", params![user])?;
            Ok(deleted > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn open_db(dir: &tempfile::TempDir) -> Database {
        Database::open(dir.path().join("sessions.db").to_str().unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let db = open_db(&dir).await;
        let user = UserId::from("100");

        let saved = save_session(&db, &user, "awaiting_consent", "{}").await.unwrap();
        assert_eq!(saved.version, 1);
        assert_eq!(saved.state, "awaiting_consent");

        let loaded = get_session(&db, &user).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn upsert_bumps_version_and_replaces_fields() {
        let dir = tempdir().unwrap();
        let db = open_db(&dir).await;
        let user = UserId::from("101");

        save_session(&db, &user, "choosing_occasion", "{}").await.unwrap();
        let second = save_session(&db, &user, "choosing_price", r#"{"occasion":1}"#)
            .await
            .unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(second.state, "choosing_price");
        assert_eq!(second.fields, r#"{"occasion":1}"#);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let dir = tempdir().unwrap();
        let db = open_db(&dir).await;
        let user = UserId::from("102");

        assert!(!delete_session(&db, &user).await.unwrap());
        save_session(&db, &user, "awaiting_phone", "{}").await.unwrap();
        assert!(delete_session(&db, &user).await.unwrap());
        assert!(get_session(&db, &user).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn sessions_survive_reopen() {
        let dir = tempdir().unwrap();
        let user = UserId::from("103");
        {
            let db = open_db(&dir).await;
            save_session(&db, &user, "awaiting_time", r#"{"recipient_name":"Анна"}"#)
                .await
                .unwrap();
            db.close().await.unwrap();
        }
        let db = open_db(&dir).await;
        let loaded = get_session(&db, &user).await.unwrap().unwrap();
        assert_eq!(loaded.state, "awaiting_time");
        assert!(loaded.fields.contains("Анна"));
        db.close().await.unwrap();
    }
}
