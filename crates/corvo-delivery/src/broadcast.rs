// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast worker: processes bulk-send jobs against the current
//! subscriber set.
//!
//! At most one pending job is processed per poll, which serializes bulk
//! sends. Recipients are resolved once at job start from the subscription
//! validity windows; sends run sequentially with a fixed pause between them
//! to respect platform rate limits. Per-recipient failures are recorded and
//! the job completes; only a recipient-resolution failure fails the job.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use corvo_config::model::BroadcastConfig;
use corvo_core::types::{to_rfc3339, OutboundMessage};
use corvo_core::{ChannelAdapter, CorvoError};
use corvo_storage::{queries, Database};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polls for pending broadcast jobs and runs them one at a time.
pub struct BroadcastWorker {
    db: Database,
    channel: Arc<dyn ChannelAdapter + Send + Sync>,
    config: BroadcastConfig,
}

impl BroadcastWorker {
    pub fn new(
        db: Database,
        channel: Arc<dyn ChannelAdapter + Send + Sync>,
        config: BroadcastConfig,
    ) -> Self {
        Self {
            db,
            channel,
            config,
        }
    }

    /// Fail `processing` jobs left behind by a crash (startup recovery).
    ///
    /// Interrupted jobs are not resumed: recipients reached before the crash
    /// cannot be distinguished from those not yet reached, so resumption
    /// could double-send. Returns the number of jobs marked failed.
    pub async fn recover_stale(&self, now: DateTime<Utc>) -> Result<usize, CorvoError> {
        let cutoff =
            to_rfc3339(now - chrono::Duration::seconds(self.config.stale_after_secs as i64));
        let n = queries::broadcasts::fail_stale_processing(&self.db, &cutoff).await?;
        if n > 0 {
            warn!(count = n, "marked interrupted broadcast jobs as failed");
        }
        Ok(n)
    }

    /// Runs the poll loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.poll_interval_secs));
        // Skip the first immediate tick.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.poll_once(Utc::now()).await {
                        warn!(error = %e, "broadcast poll failed");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("broadcast worker shutting down");
                    break;
                }
            }
        }
    }

    /// One poll pass at the given instant. Processes at most one job.
    /// Returns the processed job id, if any. Exposed for deterministic tests.
    pub async fn poll_once(&self, now: DateTime<Utc>) -> Result<Option<i64>, CorvoError> {
        let Some(job) = queries::broadcasts::claim_next_pending(&self.db).await? else {
            return Ok(None);
        };

        info!(job_id = job.id, "broadcast job started");

        let recipients = match queries::subscribers::active_at(&self.db, &to_rfc3339(now)).await {
            Ok(recipients) => recipients,
            Err(e) => {
                // Resolution failure fails the whole job; the send loop is skipped.
                queries::broadcasts::fail(&self.db, job.id, &e.to_string()).await?;
                warn!(job_id = job.id, error = %e, "broadcast failed: could not resolve recipients");
                return Ok(Some(job.id));
            }
        };

        let send_delay = Duration::from_millis(self.config.send_delay_ms);
        let send_timeout = Duration::from_secs(self.config.send_timeout_secs);
        let mut sent_count = 0i64;
        let mut failed_count = 0i64;
        let mut failed_recipients = Vec::new();

        for (i, chat_id) in recipients.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(send_delay).await;
            }

            let msg = OutboundMessage {
                chat_id: chat_id.clone(),
                content: job.message.clone(),
                reply_to: None,
                parse_mode: None,
            };

            match tokio::time::timeout(send_timeout, self.channel.send(msg)).await {
                Ok(Ok(_)) => {
                    sent_count += 1;
                    debug!(job_id = job.id, chat_id = chat_id.as_str(), "broadcast delivered");
                }
                Ok(Err(e)) => {
                    failed_count += 1;
                    failed_recipients.push(chat_id.clone());
                    warn!(job_id = job.id, chat_id = chat_id.as_str(), error = %e, "broadcast send failed");
                }
                Err(_) => {
                    failed_count += 1;
                    failed_recipients.push(chat_id.clone());
                    warn!(job_id = job.id, chat_id = chat_id.as_str(), "broadcast send timed out");
                }
            }
        }

        queries::broadcasts::complete(&self.db, job.id, sent_count, failed_count, &failed_recipients)
            .await?;
        info!(
            job_id = job.id,
            sent = sent_count,
            failed = failed_count,
            "broadcast job completed"
        );

        Ok(Some(job.id))
    }
}

#[cfg(test)]
mod tests {
    use corvo_core::types::JobStatus;
    use corvo_test_utils::MockChannel;

    use super::*;

    async fn setup() -> (BroadcastWorker, Database, Arc<MockChannel>) {
        let db = Database::open_in_memory().await.unwrap();
        let channel = Arc::new(MockChannel::new());
        let config = BroadcastConfig {
            send_delay_ms: 1,
            ..BroadcastConfig::default()
        };
        let worker = BroadcastWorker::new(db.clone(), channel.clone(), config);
        (worker, db, channel)
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    async fn add_subscriber(db: &Database, chat_id: &str) {
        queries::subscribers::add(db, chat_id, "2026-01-01T00:00:00.000Z", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn job_reaches_every_active_subscriber() {
        let (worker, db, channel) = setup().await;
        for chat in ["c1", "c2", "c3"] {
            add_subscriber(&db, chat).await;
        }
        let id = queries::broadcasts::create(&db, "big news").await.unwrap();

        let processed = worker.poll_once(at("2026-08-06T12:00:00.000Z")).await.unwrap();
        assert_eq!(processed, Some(id));

        let sent = channel.sent_messages().await;
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|m| m.content == "big news"));

        let job = queries::broadcasts::get(&db, id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.sent_count, 3);
        assert_eq!(job.failed_count, 0);
    }

    #[tokio::test]
    async fn counts_add_up_with_partial_failures() {
        let (worker, db, channel) = setup().await;
        for chat in ["c1", "c2", "c3"] {
            add_subscriber(&db, chat).await;
        }
        // First send fails, the rest succeed.
        channel.fail_next_sends(1).await;
        let id = queries::broadcasts::create(&db, "msg").await.unwrap();

        worker.poll_once(at("2026-08-06T12:00:00.000Z")).await.unwrap();

        let job = queries::broadcasts::get(&db, id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.sent_count, 2);
        assert_eq!(job.failed_count, 1);
        assert_eq!(job.failed_recipients, vec!["c1".to_string()]);
        // sent + failed equals the resolved recipient set.
        assert_eq!(job.sent_count + job.failed_count, 3);
    }

    #[tokio::test]
    async fn expired_subscribers_are_excluded() {
        let (worker, db, channel) = setup().await;
        add_subscriber(&db, "active").await;
        queries::subscribers::add(
            &db,
            "expired",
            "2026-01-01T00:00:00.000Z",
            Some("2026-02-01T00:00:00.000Z"),
        )
        .await
        .unwrap();
        let id = queries::broadcasts::create(&db, "msg").await.unwrap();

        worker.poll_once(at("2026-08-06T12:00:00.000Z")).await.unwrap();

        let sent = channel.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, "active");

        let job = queries::broadcasts::get(&db, id).await.unwrap().unwrap();
        assert_eq!(job.sent_count, 1);
    }

    #[tokio::test]
    async fn at_most_one_job_per_poll() {
        let (worker, db, channel) = setup().await;
        add_subscriber(&db, "c1").await;

        let first = queries::broadcasts::create(&db, "one").await.unwrap();
        let second = queries::broadcasts::create(&db, "two").await.unwrap();

        assert_eq!(
            worker.poll_once(at("2026-08-06T12:00:00.000Z")).await.unwrap(),
            Some(first)
        );
        assert_eq!(channel.sent_count().await, 1);
        assert_eq!(
            queries::broadcasts::get(&db, second).await.unwrap().unwrap().status,
            JobStatus::Pending
        );

        assert_eq!(
            worker.poll_once(at("2026-08-06T12:00:30.000Z")).await.unwrap(),
            Some(second)
        );
        assert_eq!(channel.sent_count().await, 2);
    }

    #[tokio::test]
    async fn completed_jobs_are_never_reprocessed() {
        let (worker, db, channel) = setup().await;
        add_subscriber(&db, "c1").await;
        queries::broadcasts::create(&db, "once").await.unwrap();

        worker.poll_once(at("2026-08-06T12:00:00.000Z")).await.unwrap();
        let again = worker.poll_once(at("2026-08-06T12:00:30.000Z")).await.unwrap();

        assert_eq!(again, None);
        assert_eq!(channel.sent_count().await, 1);
    }

    #[tokio::test]
    async fn empty_recipient_set_completes_with_zero_counts() {
        let (worker, db, _channel) = setup().await;
        let id = queries::broadcasts::create(&db, "to nobody").await.unwrap();

        worker.poll_once(at("2026-08-06T12:00:00.000Z")).await.unwrap();

        let job = queries::broadcasts::get(&db, id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.sent_count, 0);
        assert_eq!(job.failed_count, 0);
    }

    #[tokio::test]
    async fn recover_stale_fails_only_old_processing_jobs() {
        let (worker, db, _channel) = setup().await;

        let id = queries::broadcasts::create(&db, "stuck").await.unwrap();
        queries::broadcasts::claim_next_pending(&db).await.unwrap();

        // The job was just claimed: a recovery pass "now" sees it as fresh.
        let n = worker.recover_stale(Utc::now()).await.unwrap();
        assert_eq!(n, 0);

        // A recovery pass far in the future sees it as stale.
        let n = worker.recover_stale(at("2036-01-01T00:00:00.000Z")).await.unwrap();
        assert_eq!(n, 1);

        let job = queries::broadcasts::get(&db, id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("interrupted"));
    }
}
