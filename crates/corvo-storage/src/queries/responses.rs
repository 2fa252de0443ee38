// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending-response queue operations.
//!
//! A pending response is consumed exactly once: `pending -> sent` on a
//! successful send, `pending -> failed` otherwise. `typing_sent` is an
//! orthogonal idempotency flag so an item can never receive a second typing
//! indicator no matter how many polls observe it.

use corvo_core::types::now_rfc3339;
use corvo_core::CorvoError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{PendingResponse, ResponseStatus};

fn row_to_response(row: &rusqlite::Row<'_>) -> Result<PendingResponse, rusqlite::Error> {
    Ok(PendingResponse {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        message: row.get(2)?,
        reply_to_message_id: row.get(3)?,
        scheduled_for: row.get(4)?,
        typing_sent: row.get(5)?,
        status: super::parse_enum(6, row.get::<_, String>(6)?)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

const SELECT_COLUMNS: &str = "id, chat_id, message, reply_to_message_id, scheduled_for,
     typing_sent, status, created_at, updated_at";

/// Schedule a response for future delivery. Returns the row id.
pub async fn schedule(
    db: &Database,
    chat_id: &str,
    message: &str,
    reply_to_message_id: Option<&str>,
    scheduled_for: &str,
) -> Result<i64, CorvoError> {
    let chat_id = chat_id.to_string();
    let message = message.to_string();
    let reply_to = reply_to_message_id.map(|s| s.to_string());
    let scheduled_for = scheduled_for.to_string();
    let now = now_rfc3339();

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO pending_responses
                 (chat_id, message, reply_to_message_id, scheduled_for, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![chat_id, message, reply_to, scheduled_for, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch pending responses due by `due_by` (inclusive), oldest first.
pub async fn list_due(db: &Database, due_by: &str) -> Result<Vec<PendingResponse>, CorvoError> {
    let due_by = due_by.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM pending_responses
                 WHERE status = 'pending' AND scheduled_for <= ?1
                 ORDER BY scheduled_for ASC, id ASC"
            ))?;
            let rows = stmt.query_map(params![due_by], row_to_response)?;
            let mut responses = Vec::new();
            for row in rows {
                responses.push(row?);
            }
            Ok(responses)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record that the typing indicator for this item was emitted.
pub async fn mark_typing_sent(db: &Database, id: i64) -> Result<(), CorvoError> {
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE pending_responses SET typing_sent = 1, updated_at = ?2 WHERE id = ?1",
                params![id, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Transition to the terminal `sent` state.
pub async fn mark_sent(db: &Database, id: i64) -> Result<(), CorvoError> {
    set_status(db, id, ResponseStatus::Sent).await
}

/// Transition to the terminal `failed` state.
pub async fn mark_failed(db: &Database, id: i64) -> Result<(), CorvoError> {
    set_status(db, id, ResponseStatus::Failed).await
}

async fn set_status(db: &Database, id: i64, status: ResponseStatus) -> Result<(), CorvoError> {
    let status = status.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE pending_responses SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, status, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a single pending response by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<PendingResponse>, CorvoError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM pending_responses WHERE id = ?1"
            ))?;
            let mut rows = stmt.query_map(params![id], row_to_response)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count pending responses (status command).
pub async fn pending_count(db: &Database) -> Result<i64, CorvoError> {
    db.connection()
        .call(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM pending_responses WHERE status = 'pending'",
                [],
                |row| row.get(0),
            )?;
            Ok(n)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
