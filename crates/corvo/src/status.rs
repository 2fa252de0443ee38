// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `corvo status` command implementation.
//!
//! Reads queue, job, and trigger counts straight from the store so an
//! operator can inspect delivery state whether or not the daemon is
//! running.

use corvo_config::model::CorvoConfig;
use corvo_core::types::JobStatus;
use corvo_core::CorvoError;
use corvo_storage::{queries, Database};
use serde_json::json;

/// Snapshot of delivery state, printed by `corvo status`.
#[derive(Debug)]
pub struct StatusSnapshot {
    pub pending_responses: i64,
    pub job_counts: Vec<(JobStatus, i64)>,
    pub active_triggers: i64,
    pub subscribers: usize,
}

/// Collect the status snapshot from an open database.
pub async fn collect_snapshot(db: &Database) -> Result<StatusSnapshot, CorvoError> {
    Ok(StatusSnapshot {
        pending_responses: queries::responses::pending_count(db).await?,
        job_counts: queries::broadcasts::status_counts(db).await?,
        active_triggers: queries::triggers::active_count(db).await?,
        subscribers: queries::subscribers::list(db).await?.len(),
    })
}

/// Run the `corvo status` command.
pub async fn run_status(config: &CorvoConfig, json: bool) -> Result<(), CorvoError> {
    let db = Database::open_with_options(&config.storage.database_path, config.storage.wal_mode)
        .await?;
    let snapshot = collect_snapshot(&db).await?;
    db.close().await?;

    if json {
        let jobs: serde_json::Map<String, serde_json::Value> = snapshot
            .job_counts
            .iter()
            .map(|(status, n)| (status.to_string(), json!(n)))
            .collect();
        let out = json!({
            "pending_responses": snapshot.pending_responses,
            "broadcast_jobs": jobs,
            "active_triggers": snapshot.active_triggers,
            "subscribers": snapshot.subscribers,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!();
        println!("  corvo status");
        println!("  {}", "-".repeat(35));
        println!("    Pending responses: {}", snapshot.pending_responses);
        if snapshot.job_counts.is_empty() {
            println!("    Broadcast jobs:    none");
        } else {
            let jobs = snapshot
                .job_counts
                .iter()
                .map(|(status, n)| format!("{n} {status}"))
                .collect::<Vec<_>>()
                .join(", ");
            println!("    Broadcast jobs:    {jobs}");
        }
        println!("    Active triggers:   {}", snapshot.active_triggers);
        println!("    Subscribers:       {}", snapshot.subscribers);
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn snapshot_reflects_store_contents() {
        let db = Database::open_in_memory().await.unwrap();

        queries::responses::schedule(&db, "c1", "m", None, "2026-08-06T09:00:00.000Z")
            .await
            .unwrap();
        queries::broadcasts::create(&db, "msg").await.unwrap();
        queries::triggers::create(&db, "daily", "09:00").await.unwrap();
        queries::subscribers::add(&db, "c1", "2026-01-01T00:00:00.000Z", None)
            .await
            .unwrap();

        let snapshot = collect_snapshot(&db).await.unwrap();
        assert_eq!(snapshot.pending_responses, 1);
        assert_eq!(snapshot.job_counts, vec![(JobStatus::Pending, 1)]);
        assert_eq!(snapshot.active_triggers, 1);
        assert_eq!(snapshot.subscribers, 1);
    }

    #[tokio::test]
    async fn snapshot_of_empty_store_is_zeroed() {
        let db = Database::open_in_memory().await.unwrap();
        let snapshot = collect_snapshot(&db).await.unwrap();
        assert_eq!(snapshot.pending_responses, 0);
        assert!(snapshot.job_counts.is_empty());
        assert_eq!(snapshot.active_triggers, 0);
        assert_eq!(snapshot.subscribers, 0);
    }
}
