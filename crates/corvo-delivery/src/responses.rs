// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response queue worker: delivers pre-scheduled outbound messages with
//! typing-indicator simulation.
//!
//! Each poll fetches pending rows due within the lookahead window. An item
//! inside the typing lead gets exactly one typing indicator (guarded by the
//! persisted `typing_sent` flag); an item at or past its scheduled time is
//! sent and transitions to a terminal state either way. The two-phase
//! typing-then-send design makes automated replies feel human without the
//! caller scheduling two jobs.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use corvo_config::model::DeliveryConfig;
use corvo_core::types::{to_rfc3339, MessageId, OutboundMessage, PendingResponse};
use corvo_core::{ChannelAdapter, CorvoError};
use corvo_storage::{queries, Database};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polls the pending-response queue and performs due deliveries.
pub struct ResponseQueueWorker {
    db: Database,
    channel: Arc<dyn ChannelAdapter + Send + Sync>,
    config: DeliveryConfig,
}

impl ResponseQueueWorker {
    pub fn new(
        db: Database,
        channel: Arc<dyn ChannelAdapter + Send + Sync>,
        config: DeliveryConfig,
    ) -> Self {
        Self {
            db,
            channel,
            config,
        }
    }

    /// Runs the poll loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        // Skip the first immediate tick.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.poll_once(Utc::now()).await {
                        warn!(error = %e, "response queue poll failed");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("response queue worker shutting down");
                    break;
                }
            }
        }
    }

    /// One poll pass at the given instant. Exposed for deterministic tests.
    pub async fn poll_once(&self, now: DateTime<Utc>) -> Result<(), CorvoError> {
        let due_by = to_rfc3339(now + chrono::Duration::seconds(self.config.lookahead_secs as i64));
        let items = queries::responses::list_due(&self.db, &due_by).await?;

        for item in items {
            if let Err(e) = self.process_item(&item, now).await {
                warn!(error = %e, id = item.id, "failed to process pending response");
            }
        }

        Ok(())
    }

    async fn process_item(
        &self,
        item: &PendingResponse,
        now: DateTime<Utc>,
    ) -> Result<(), CorvoError> {
        let scheduled_for = match DateTime::parse_from_rfc3339(&item.scheduled_for) {
            Ok(t) => t.with_timezone(&Utc),
            Err(e) => {
                // Unparseable schedule cannot ever become due; retire the row.
                queries::responses::mark_failed(&self.db, item.id).await?;
                return Err(CorvoError::Data(format!(
                    "pending response {} has malformed scheduled_for: {e}",
                    item.id
                )));
            }
        };

        let diff = scheduled_for - now;

        if diff <= chrono::Duration::zero() {
            self.deliver(item).await?;
        } else if diff <= chrono::Duration::seconds(self.config.typing_lead_secs as i64)
            && !item.typing_sent
        {
            // One typing indicator per item. The flag is set even when the
            // indicator fails so the item can never receive a second one.
            if let Err(e) = self.channel.send_typing(&item.chat_id).await {
                warn!(error = %e, id = item.id, "failed to send typing indicator");
            }
            queries::responses::mark_typing_sent(&self.db, item.id).await?;
            debug!(id = item.id, "typing indicator emitted ahead of send");
        }

        Ok(())
    }

    /// Send the message and transition the row to a terminal state.
    async fn deliver(&self, item: &PendingResponse) -> Result<(), CorvoError> {
        let msg = OutboundMessage {
            chat_id: item.chat_id.clone(),
            content: item.message.clone(),
            reply_to: item.reply_to_message_id.clone().map(MessageId),
            parse_mode: None,
        };

        let timeout = Duration::from_secs(self.config.send_timeout_secs);
        let result = tokio::time::timeout(timeout, self.channel.send(msg)).await;

        match result {
            Ok(Ok(_)) => {
                queries::responses::mark_sent(&self.db, item.id).await?;
                info!(id = item.id, chat_id = item.chat_id.as_str(), "scheduled response sent");
            }
            Ok(Err(e)) => {
                queries::responses::mark_failed(&self.db, item.id).await?;
                warn!(error = %e, id = item.id, "scheduled response failed, not retried");
            }
            Err(_) => {
                queries::responses::mark_failed(&self.db, item.id).await?;
                warn!(id = item.id, "scheduled response timed out, not retried");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use corvo_core::types::ResponseStatus;
    use corvo_test_utils::MockChannel;

    use super::*;

    async fn setup() -> (ResponseQueueWorker, Database, Arc<MockChannel>) {
        let db = Database::open_in_memory().await.unwrap();
        let channel = Arc::new(MockChannel::new());
        let worker = ResponseQueueWorker::new(db.clone(), channel.clone(), DeliveryConfig::default());
        (worker, db, channel)
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[tokio::test]
    async fn due_item_is_sent_on_the_next_poll() {
        let (worker, db, channel) = setup().await;

        let id = queries::responses::schedule(
            &db,
            "chat-1",
            "good morning",
            Some("msg-4"),
            "2026-08-06T09:00:00.000Z",
        )
        .await
        .unwrap();

        worker.poll_once(at("2026-08-06T09:00:00.500Z")).await.unwrap();

        let sent = channel.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].content, "good morning");
        assert_eq!(sent[0].reply_to.as_ref().map(|m| m.0.as_str()), Some("msg-4"));

        let item = queries::responses::get(&db, id).await.unwrap().unwrap();
        assert_eq!(item.status, ResponseStatus::Sent);
    }

    #[tokio::test]
    async fn overdue_item_never_stays_pending() {
        let (worker, db, channel) = setup().await;

        // Scheduled far in the past (e.g. across a restart).
        let id = queries::responses::schedule(&db, "c", "stale", None, "2026-08-05T00:00:00.000Z")
            .await
            .unwrap();

        worker.poll_once(at("2026-08-06T12:00:00.000Z")).await.unwrap();

        assert_eq!(channel.sent_count().await, 1);
        let item = queries::responses::get(&db, id).await.unwrap().unwrap();
        assert_eq!(item.status, ResponseStatus::Sent);
    }

    #[tokio::test]
    async fn send_failure_is_terminal() {
        let (worker, db, channel) = setup().await;
        channel.fail_next_sends(1).await;

        let id = queries::responses::schedule(&db, "c", "m", None, "2026-08-06T09:00:00.000Z")
            .await
            .unwrap();

        worker.poll_once(at("2026-08-06T09:00:01.000Z")).await.unwrap();
        let item = queries::responses::get(&db, id).await.unwrap().unwrap();
        assert_eq!(item.status, ResponseStatus::Failed);

        // A later poll must not retry it.
        worker.poll_once(at("2026-08-06T09:00:02.000Z")).await.unwrap();
        assert_eq!(channel.sent_count().await, 0);
    }

    #[tokio::test]
    async fn typing_indicator_fires_inside_the_lead_window() {
        let (worker, db, channel) = setup().await;

        let id = queries::responses::schedule(&db, "chat-1", "m", None, "2026-08-06T09:00:10.000Z")
            .await
            .unwrap();

        // 2 seconds ahead of send time: inside the 3s lead.
        worker.poll_once(at("2026-08-06T09:00:08.000Z")).await.unwrap();

        assert_eq!(channel.typing_indicators().await, vec!["chat-1"]);
        assert_eq!(channel.sent_count().await, 0);
        let item = queries::responses::get(&db, id).await.unwrap().unwrap();
        assert!(item.typing_sent);
        assert_eq!(item.status, ResponseStatus::Pending);
    }

    #[tokio::test]
    async fn typing_indicator_is_emitted_exactly_once() {
        let (worker, db, channel) = setup().await;

        queries::responses::schedule(&db, "chat-1", "m", None, "2026-08-06T09:00:10.000Z")
            .await
            .unwrap();

        // Several polls observe the item inside the lead window.
        worker.poll_once(at("2026-08-06T09:00:07.500Z")).await.unwrap();
        worker.poll_once(at("2026-08-06T09:00:08.500Z")).await.unwrap();
        worker.poll_once(at("2026-08-06T09:00:09.500Z")).await.unwrap();

        assert_eq!(channel.typing_indicators().await.len(), 1);

        // And the send still happens on time.
        worker.poll_once(at("2026-08-06T09:00:10.100Z")).await.unwrap();
        assert_eq!(channel.sent_count().await, 1);
        assert_eq!(channel.typing_indicators().await.len(), 1);
    }

    #[tokio::test]
    async fn item_outside_the_lead_window_is_untouched() {
        let (worker, db, channel) = setup().await;

        let id = queries::responses::schedule(&db, "c", "m", None, "2026-08-06T09:00:04.500Z")
            .await
            .unwrap();

        // Visible through the 5s lookahead, but 4.5s out: beyond the typing lead.
        worker.poll_once(at("2026-08-06T09:00:00.000Z")).await.unwrap();

        assert!(channel.typing_indicators().await.is_empty());
        assert_eq!(channel.sent_count().await, 0);
        let item = queries::responses::get(&db, id).await.unwrap().unwrap();
        assert!(!item.typing_sent);
        assert_eq!(item.status, ResponseStatus::Pending);
    }

    #[tokio::test]
    async fn malformed_schedule_is_retired_not_resent() {
        let (worker, db, channel) = setup().await;

        // Malformed, but lexicographically before the bound so the poll sees it.
        let id = queries::responses::schedule(&db, "c", "m", None, "1999-broken-timestamp")
            .await
            .unwrap();

        worker.poll_once(at("2026-08-06T09:00:00.000Z")).await.unwrap();

        assert_eq!(channel.sent_count().await, 0);
        let item = queries::responses::get(&db, id).await.unwrap().unwrap();
        assert_eq!(item.status, ResponseStatus::Failed);
    }

    #[tokio::test]
    async fn one_failing_item_does_not_block_others() {
        let (worker, db, channel) = setup().await;
        channel.fail_next_sends(1).await;

        let a = queries::responses::schedule(&db, "c1", "first", None, "2026-08-06T09:00:00.000Z")
            .await
            .unwrap();
        let b = queries::responses::schedule(&db, "c2", "second", None, "2026-08-06T09:00:00.500Z")
            .await
            .unwrap();

        worker.poll_once(at("2026-08-06T09:00:01.000Z")).await.unwrap();

        assert_eq!(
            queries::responses::get(&db, a).await.unwrap().unwrap().status,
            ResponseStatus::Failed
        );
        assert_eq!(
            queries::responses::get(&db, b).await.unwrap().unwrap().status,
            ResponseStatus::Sent
        );
        assert_eq!(channel.sent_count().await, 1);
    }
}
