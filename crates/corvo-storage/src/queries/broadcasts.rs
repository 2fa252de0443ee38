// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast job operations.
//!
//! Jobs move `pending -> processing -> completed | failed`; the terminal
//! states are never left and a job is never retried automatically.
//! Operator re-submission (a new job) is the retry mechanism.

use corvo_core::types::now_rfc3339;
use corvo_core::CorvoError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{BroadcastJob, JobStatus};

fn row_to_job(row: &rusqlite::Row<'_>) -> Result<BroadcastJob, rusqlite::Error> {
    Ok(BroadcastJob {
        id: row.get(0)?,
        message: row.get(1)?,
        status: super::parse_enum(2, row.get::<_, String>(2)?)?,
        sent_count: row.get(3)?,
        failed_count: row.get(4)?,
        failed_recipients: super::parse_string_list(5, row.get::<_, String>(5)?)?,
        error: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

const SELECT_COLUMNS: &str = "id, message, status, sent_count, failed_count,
     failed_recipients, error, created_at, updated_at";

/// Create a new pending broadcast job. Returns the job id.
pub async fn create(db: &Database, message: &str) -> Result<i64, CorvoError> {
    let message = message.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO broadcast_jobs (message, created_at, updated_at)
                 VALUES (?1, ?2, ?2)",
                params![message, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Atomically claim the oldest pending job, marking it `processing`.
///
/// Returns `None` when no pending job exists. At most one job is claimed
/// per call, which serializes broadcast processing.
pub async fn claim_next_pending(db: &Database) -> Result<Option<BroadcastJob>, CorvoError> {
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let result = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM broadcast_jobs
                     WHERE status = 'pending'
                     ORDER BY id ASC
                     LIMIT 1"
                ))?;
                stmt.query_row([], row_to_job)
            };

            match result {
                Ok(job) => {
                    tx.execute(
                        "UPDATE broadcast_jobs SET status = 'processing', updated_at = ?2
                         WHERE id = ?1",
                        params![job.id, now],
                    )?;
                    tx.commit()?;
                    Ok(Some(BroadcastJob {
                        status: JobStatus::Processing,
                        ..job
                    }))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    tx.commit()?;
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a job completed with its final counts and failure log.
pub async fn complete(
    db: &Database,
    id: i64,
    sent_count: i64,
    failed_count: i64,
    failed_recipients: &[String],
) -> Result<(), CorvoError> {
    let failed = serde_json::to_string(failed_recipients)
        .map_err(|e| CorvoError::Internal(format!("failed to encode failed recipients: {e}")))?;
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE broadcast_jobs
                 SET status = 'completed', sent_count = ?2, failed_count = ?3,
                     failed_recipients = ?4, updated_at = ?5
                 WHERE id = ?1",
                params![id, sent_count, failed_count, failed, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a job failed with the error recorded.
pub async fn fail(db: &Database, id: i64, error: &str) -> Result<(), CorvoError> {
    let error = error.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE broadcast_jobs SET status = 'failed', error = ?2, updated_at = ?3
                 WHERE id = ?1",
                params![id, error, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a single job by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<BroadcastJob>, CorvoError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM broadcast_jobs WHERE id = ?1"
            ))?;
            let mut rows = stmt.query_map(params![id], row_to_job)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fail `processing` jobs not updated since `older_than` (startup crash
/// recovery). Returns the number of jobs marked.
///
/// Interrupted jobs are failed rather than requeued: resuming could
/// double-send to recipients already reached before the crash.
pub async fn fail_stale_processing(db: &Database, older_than: &str) -> Result<usize, CorvoError> {
    let older_than = older_than.to_string();
    let now = now_rfc3339();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE broadcast_jobs
                 SET status = 'failed', error = 'interrupted', updated_at = ?2
                 WHERE status = 'processing' AND updated_at < ?1",
                params![older_than, now],
            )?;
            Ok(n)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Per-status job counts (status command).
pub async fn status_counts(db: &Database) -> Result<Vec<(JobStatus, i64)>, CorvoError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM broadcast_jobs GROUP BY status ORDER BY status",
            )?;
            let rows = stmt.query_map([], |row| {
                let status = super::parse_enum(0, row.get::<_, String>(0)?)?;
                Ok((status, row.get::<_, i64>(1)?))
            })?;
            let mut counts = Vec::new();
            for row in rows {
                counts.push(row?);
            }
            Ok(counts)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
