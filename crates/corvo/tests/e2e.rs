// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete Corvo pipeline.
//!
//! Each test creates an isolated TestHarness with temp SQLite and mock
//! adapters. Inbound tests run under paused tokio time so debounce windows
//! elapse instantly; worker tests drive `poll_once` with explicit
//! timestamps.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use corvo_core::types::{GeneratedReply, JobStatus, MediaItem, MediaKind, ResponseStatus, TurnRole};
use corvo_delivery::{BroadcastWorker, ResponseQueueWorker, TriggerScheduler};
use corvo_storage::queries;
use corvo_test_utils::TestHarness;

fn channel_for(harness: &TestHarness) -> Arc<dyn corvo_core::ChannelAdapter + Send + Sync> {
    harness.channel.clone()
}

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

// ---- Inbound aggregation scenarios ----

#[tokio::test(start_paused = true)]
async fn rapid_fragments_get_one_reply_with_joined_content() {
    let harness = TestHarness::builder()
        .with_replies(vec!["doing great, thanks!".to_string()])
        .build()
        .await
        .unwrap();
    let cancel = harness.spawn_agent_loop();

    // "hi" (3 chars) then "how are you" (11 chars) one second apart.
    harness.send_text("chat-1", "m1", "hi").await;
    tokio::time::sleep(Duration::from_millis(1000)).await;
    harness.send_text("chat-1", "m2", "how are you").await;

    // Single flush ~3.5s after the second fragment.
    tokio::time::sleep(Duration::from_millis(3600)).await;
    let sent = harness.wait_until_sent(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].content, "doing great, thanks!");
    assert_eq!(sent[0].chat_id, "chat-1");
    // The reply addresses the latest fragment.
    assert_eq!(sent[0].reply_to.as_ref().map(|m| m.0.as_str()), Some("m2"));

    // One generation call saw the joined utterance.
    let requests = harness.responder.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].history.last().unwrap().content,
        "hi\nhow are you"
    );

    // History: the joined user turn plus the assistant reply.
    let turns = harness.wait_until_turns("chat-1", 2).await;
    assert_eq!(turns[0].role, TurnRole::User);
    assert_eq!(turns[0].content, "hi\nhow are you");
    assert_eq!(turns[1].role, TurnRole::Assistant);

    cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn quiet_gap_produces_two_independent_replies() {
    let harness = TestHarness::builder()
        .with_replies(vec!["first reply".to_string(), "second reply".to_string()])
        .build()
        .await
        .unwrap();
    let cancel = harness.spawn_agent_loop();

    harness.send_text("chat-1", "m1", "first thought").await;
    tokio::time::sleep(Duration::from_millis(3600)).await;
    harness.wait_until_sent(1).await;

    harness.send_text("chat-1", "m2", "second thought").await;
    tokio::time::sleep(Duration::from_millis(3600)).await;
    let sent = harness.wait_until_sent(2).await;

    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].content, "first reply");
    assert_eq!(sent[1].content, "second reply");

    cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn album_burst_dispatches_once_with_expanded_attachments() {
    let harness = TestHarness::builder()
        .with_replies(vec!["nice album".to_string()])
        .build()
        .await
        .unwrap();
    let cancel = harness.spawn_agent_loop();

    harness
        .send_media(
            "chat-1",
            "m1",
            MediaItem {
                kind: MediaKind::Photo,
                file_id: "p1".into(),
                caption: Some("holiday".into()),
                file_name: None,
                page_count: None,
            },
        )
        .await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    harness
        .send_media(
            "chat-1",
            "m2",
            MediaItem {
                kind: MediaKind::Document,
                file_id: "d1".into(),
                caption: None,
                file_name: Some("itinerary.pdf".into()),
                page_count: Some(2),
            },
        )
        .await;

    tokio::time::sleep(Duration::from_millis(3600)).await;
    let sent = harness.wait_until_sent(1).await;
    assert_eq!(sent.len(), 1);

    let requests = harness.responder.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].attachments, vec!["p1", "d1#page=1", "d1#page=2"]);

    cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn typing_signal_holds_back_the_flush() {
    let harness = TestHarness::builder()
        .with_replies(vec!["patience rewarded".to_string()])
        .build()
        .await
        .unwrap();
    let cancel = harness.spawn_agent_loop();

    // Long message: 1.5s debounce.
    harness
        .send_text(
            "chat-1",
            "m1",
            "this message is comfortably longer than fifty characters in total",
        )
        .await;
    tokio::time::sleep(Duration::from_millis(1000)).await;
    harness.send_typing("chat-1").await;

    // Past the original deadline nothing is sent yet.
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(harness.channel.sent_count().await, 0);

    tokio::time::sleep(Duration::from_millis(1600)).await;
    let sent = harness.wait_until_sent(1).await;
    assert_eq!(sent.len(), 1);

    cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn faq_match_answers_without_generation() {
    let harness = TestHarness::builder()
        .with_faq_entries(vec![(
            "opening hours".to_string(),
            "We are open 9-17, Monday to Friday.".to_string(),
        )])
        .build()
        .await
        .unwrap();
    let cancel = harness.spawn_agent_loop();

    harness
        .send_text("chat-1", "m1", "hey, what are your opening hours today?")
        .await;
    tokio::time::sleep(Duration::from_millis(3700)).await;

    let sent = harness.wait_until_sent(1).await;
    assert!(sent[0].content.contains("9-17"));
    assert!(harness.responder.requests().await.is_empty());

    cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn reaction_only_reply_reacts_and_records_sentinel() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .responder
        .add_reply(GeneratedReply {
            text: None,
            reaction: Some("👍".into()),
        })
        .await;
    let cancel = harness.spawn_agent_loop();

    harness.send_text("chat-1", "m1", "thanks a lot!").await;
    tokio::time::sleep(Duration::from_millis(3700)).await;

    let turns = harness.wait_until_turns("chat-1", 2).await;
    assert_eq!(turns[1].content, "[reaction sent]");
    assert_eq!(
        harness.channel.reactions().await,
        vec![("chat-1".to_string(), "m1".to_string(), "👍".to_string())]
    );
    assert_eq!(harness.channel.sent_count().await, 0);

    cancel.cancel();
}

// ---- Delivery worker scenarios ----

#[tokio::test]
async fn scheduled_response_gets_typing_then_send() {
    let harness = TestHarness::builder().build().await.unwrap();
    let worker = ResponseQueueWorker::new(
        harness.db.clone(),
        channel_for(&harness),
        harness.config.delivery.clone(),
    );

    let id = queries::responses::schedule(
        &harness.db,
        "chat-9",
        "your order is ready",
        None,
        "2026-08-06T09:00:10.000Z",
    )
    .await
    .unwrap();

    // Polls approaching the send time: one typing indicator, then the send.
    worker.poll_once(at("2026-08-06T09:00:08.000Z")).await.unwrap();
    worker.poll_once(at("2026-08-06T09:00:09.000Z")).await.unwrap();
    worker.poll_once(at("2026-08-06T09:00:10.200Z")).await.unwrap();

    assert_eq!(harness.channel.typing_indicators().await, vec!["chat-9"]);
    let sent = harness.channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].content, "your order is ready");

    let item = queries::responses::get(&harness.db, id).await.unwrap().unwrap();
    assert_eq!(item.status, ResponseStatus::Sent);
}

#[tokio::test]
async fn daily_trigger_creates_a_broadcast_that_reaches_subscribers() {
    let harness = TestHarness::builder().build().await.unwrap();
    let db = harness.db.clone();

    // A trigger that fired yesterday at 08:00.
    let trigger_id = queries::triggers::create(&db, "daily special: borscht", "08:00")
        .await
        .unwrap();
    queries::triggers::mark_fired(&db, trigger_id, "2026-08-05T08:00:02.000Z")
        .await
        .unwrap();

    // Three active subscribers; the second send will fail.
    for chat in ["sub-1", "sub-2", "sub-3"] {
        queries::subscribers::add(&db, chat, "2026-01-01T00:00:00.000Z", None)
            .await
            .unwrap();
    }

    let scheduler = TriggerScheduler::new(db.clone(), harness.config.scheduler.clone()).unwrap();
    let broadcast_worker = BroadcastWorker::new(
        db.clone(),
        channel_for(&harness),
        harness.config.broadcast.clone(),
    );

    // Today at 08:00 the trigger fires exactly once.
    assert_eq!(scheduler.poll_once(at("2026-08-06T08:00:12.000Z")).await.unwrap(), 1);
    assert_eq!(scheduler.poll_once(at("2026-08-06T08:00:55.000Z")).await.unwrap(), 0);

    let trigger = queries::triggers::get(&db, trigger_id).await.unwrap().unwrap();
    assert_eq!(
        trigger.last_run_at.as_deref(),
        Some("2026-08-06T08:00:12.000Z")
    );

    // The broadcast worker picks the job up and records per-recipient outcome.
    harness.channel.fail_next_sends(1).await;
    let job_id = broadcast_worker
        .poll_once(at("2026-08-06T08:00:30.000Z"))
        .await
        .unwrap()
        .expect("one pending job");

    let job = queries::broadcasts::get(&db, job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.message, "daily special: borscht");
    assert_eq!(job.sent_count, 2);
    assert_eq!(job.failed_count, 1);
    assert_eq!(job.failed_recipients, vec!["sub-1".to_string()]);
    assert_eq!(job.sent_count + job.failed_count, 3);
}

#[tokio::test]
async fn outgoing_messages_enter_history_without_aggregation() {
    let harness = TestHarness::builder().build().await.unwrap();
    let cancel = harness.spawn_agent_loop();

    harness
        .channel
        .inject_event(corvo_core::types::InboundEvent::Message(
            corvo_core::types::InboundMessage {
                id: "out-1".into(),
                chat_id: "chat-1".into(),
                sender_id: "me".into(),
                private: true,
                outgoing: true,
                content: corvo_core::types::MessageContent::Text(
                    "manual reply from the operator".into(),
                ),
                timestamp: corvo_core::types::now_rfc3339(),
            },
        ))
        .await;

    let turns = harness.wait_until_turns("chat-1", 1).await;
    assert_eq!(turns[0].role, TurnRole::Assistant);
    assert_eq!(turns[0].content, "manual reply from the operator");
    // Nothing was aggregated or replied to.
    assert_eq!(harness.channel.sent_count().await, 0);
    assert!(harness.responder.requests().await.is_empty());

    cancel.cancel();
}
