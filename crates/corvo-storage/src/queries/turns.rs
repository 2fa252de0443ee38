// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation history operations. The turn log is append-only.

use corvo_core::types::now_rfc3339;
use corvo_core::CorvoError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{ConversationTurn, TurnRole};

/// Append a turn to a chat's history. Returns the turn id.
pub async fn append(
    db: &Database,
    chat_id: &str,
    role: TurnRole,
    content: &str,
    attachment_refs: &[String],
) -> Result<i64, CorvoError> {
    let chat_id = chat_id.to_string();
    let content = content.to_string();
    let role = role.to_string();
    let refs = serde_json::to_string(attachment_refs)
        .map_err(|e| CorvoError::Internal(format!("failed to encode attachment refs: {e}")))?;
    let created_at = now_rfc3339();

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO turns (chat_id, role, content, attachment_refs, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![chat_id, role, content, refs, created_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch the most recent `limit` turns for a chat, oldest first.
pub async fn recent(
    db: &Database,
    chat_id: &str,
    limit: usize,
) -> Result<Vec<ConversationTurn>, CorvoError> {
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, role, content, attachment_refs, created_at
                 FROM turns WHERE chat_id = ?1
                 ORDER BY id DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![chat_id, limit as i64], |row| {
                Ok(ConversationTurn {
                    id: row.get(0)?,
                    chat_id: row.get(1)?,
                    role: super::parse_enum(2, row.get::<_, String>(2)?)?,
                    content: row.get(3)?,
                    attachment_refs: super::parse_string_list(4, row.get::<_, String>(4)?)?,
                    created_at: row.get(5)?,
                })
            })?;
            let mut turns = Vec::new();
            for row in rows {
                turns.push(row?);
            }
            // Query is newest-first for the LIMIT; callers want oldest-first.
            turns.reverse();
            Ok(turns)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
