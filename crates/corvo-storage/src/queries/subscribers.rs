// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription records used to resolve broadcast recipient sets.
//!
//! Rows are created by the administrative surface; the broadcast worker
//! only reads them.

use corvo_core::types::now_rfc3339;
use corvo_core::CorvoError;
use rusqlite::params;

use crate::database::Database;
use crate::models::Subscriber;

/// Add a subscriber with a validity window. Returns the row id.
pub async fn add(
    db: &Database,
    chat_id: &str,
    starts_at: &str,
    ends_at: Option<&str>,
) -> Result<i64, CorvoError> {
    let chat_id = chat_id.to_string();
    let starts_at = starts_at.to_string();
    let ends_at = ends_at.map(|s| s.to_string());
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO subscribers (chat_id, starts_at, ends_at, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![chat_id, starts_at, ends_at, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Chat ids of subscribers whose validity window is open at `at`.
pub async fn active_at(db: &Database, at: &str) -> Result<Vec<String>, CorvoError> {
    let at = at.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT chat_id FROM subscribers
                 WHERE starts_at <= ?1 AND (ends_at IS NULL OR ends_at >= ?1)
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![at], |row| row.get::<_, String>(0))?;
            let mut chat_ids = Vec::new();
            for row in rows {
                chat_ids.push(row?);
            }
            Ok(chat_ids)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All subscriber rows (administrative listing).
pub async fn list(db: &Database) -> Result<Vec<Subscriber>, CorvoError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, starts_at, ends_at, created_at
                 FROM subscribers ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Subscriber {
                    id: row.get(0)?,
                    chat_id: row.get(1)?,
                    starts_at: row.get(2)?,
                    ends_at: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            let mut subscribers = Vec::new();
            for row in rows {
                subscribers.push(row?);
            }
            Ok(subscribers)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
