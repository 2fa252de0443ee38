// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled trigger operations.
//!
//! Triggers fire at most once per calendar day (in the scheduler's
//! timezone); firing is recorded via `last_run_at`. Triggers are never
//! auto-deleted.

use corvo_core::types::now_rfc3339;
use corvo_core::CorvoError;
use rusqlite::params;

use crate::database::Database;
use crate::models::ScheduledTrigger;

fn row_to_trigger(row: &rusqlite::Row<'_>) -> Result<ScheduledTrigger, rusqlite::Error> {
    Ok(ScheduledTrigger {
        id: row.get(0)?,
        message: row.get(1)?,
        time_of_day: row.get(2)?,
        is_active: row.get(3)?,
        last_run_at: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const SELECT_COLUMNS: &str =
    "id, message, time_of_day, is_active, last_run_at, created_at, updated_at";

/// Validate an `HH:MM` wall-clock time string.
pub fn is_valid_time_of_day(value: &str) -> bool {
    let Some((h, m)) = value.split_once(':') else {
        return false;
    };
    if h.len() != 2 || m.len() != 2 {
        return false;
    }
    matches!(h.parse::<u8>(), Ok(0..=23)) && matches!(m.parse::<u8>(), Ok(0..=59))
}

/// Create a new active trigger. Returns the trigger id.
///
/// The time is validated at this boundary; malformed values never reach the
/// scheduler.
pub async fn create(db: &Database, message: &str, time_of_day: &str) -> Result<i64, CorvoError> {
    if !is_valid_time_of_day(time_of_day) {
        return Err(CorvoError::Data(format!(
            "invalid trigger time `{time_of_day}`, expected HH:MM"
        )));
    }

    let message = message.to_string();
    let time_of_day = time_of_day.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO scheduled_triggers (message, time_of_day, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![message, time_of_day, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch all active triggers.
pub async fn list_active(db: &Database) -> Result<Vec<ScheduledTrigger>, CorvoError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM scheduled_triggers
                 WHERE is_active = 1 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map([], row_to_trigger)?;
            let mut triggers = Vec::new();
            for row in rows {
                triggers.push(row?);
            }
            Ok(triggers)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Record that a trigger fired at `fired_at`.
pub async fn mark_fired(db: &Database, id: i64, fired_at: &str) -> Result<(), CorvoError> {
    let fired_at = fired_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE scheduled_triggers SET last_run_at = ?2, updated_at = ?2 WHERE id = ?1",
                params![id, fired_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Enable or disable a trigger.
pub async fn set_active(db: &Database, id: i64, active: bool) -> Result<(), CorvoError> {
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE scheduled_triggers SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, active, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a single trigger by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<ScheduledTrigger>, CorvoError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM scheduled_triggers WHERE id = ?1"
            ))?;
            let mut rows = stmt.query_map(params![id], row_to_trigger)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count active triggers (status command).
pub async fn active_count(db: &Database) -> Result<i64, CorvoError> {
    db.connection()
        .call(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM scheduled_triggers WHERE is_active = 1",
                [],
                |row| row.get(0),
            )?;
            Ok(n)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
