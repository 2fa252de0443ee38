// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat debounced text aggregation.
//!
//! Consecutive text messages from one chat are coalesced into a single
//! logical utterance. Each new fragment resets the buffer's timer to the
//! length-driven delay; a typing-start event re-arms it to a fixed
//! extension. When the timer fires the buffer is removed and the joined
//! content is handed to the dispatcher.
//!
//! The buffer registry is owned by the aggregator and guarded by one mutex;
//! same-chat operations are linearized by that lock, and a bumped epoch
//! invalidates any timer that was already past its sleep when re-armed, so
//! every buffer flushes exactly once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use corvo_config::model::AggregatorConfig;
use corvo_core::types::{Aggregate, MessageId};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::delay::reply_delay;

struct TextBuffer {
    content: String,
    reply_to: MessageId,
    epoch: u64,
    deadline: Instant,
    timer: JoinHandle<()>,
}

/// Debounce registry for inbound text, keyed by chat id.
///
/// At most one live buffer exists per chat; the buffer is destroyed on
/// flush. Flushed aggregates are delivered through the sink channel.
pub struct TextAggregator {
    buffers: Arc<Mutex<HashMap<String, TextBuffer>>>,
    config: AggregatorConfig,
    sink: mpsc::Sender<Aggregate>,
}

impl TextAggregator {
    /// Create an aggregator that delivers flushed aggregates into `sink`.
    pub fn new(config: AggregatorConfig, sink: mpsc::Sender<Aggregate>) -> Self {
        Self {
            buffers: Arc::new(Mutex::new(HashMap::new())),
            config,
            sink,
        }
    }

    /// Feed one inbound text fragment into the chat's buffer.
    ///
    /// Creates the buffer if absent; otherwise appends with a newline,
    /// updates the reply-to reference to the latest message, and resets the
    /// timer to the delay computed from this fragment.
    pub async fn push(&self, chat_id: &str, text: &str, message_id: MessageId) {
        let delay = reply_delay(text, &self.config);
        let mut buffers = self.buffers.lock().await;

        match buffers.get_mut(chat_id) {
            Some(buffer) => {
                buffer.timer.abort();
                buffer.content.push('\n');
                buffer.content.push_str(text);
                buffer.reply_to = message_id;
                buffer.epoch += 1;
                buffer.deadline = Instant::now() + delay;
                buffer.timer = self.arm(chat_id.to_string(), buffer.epoch, delay);
                debug!(chat_id, len = buffer.content.len(), "text buffer extended");
            }
            None => {
                let deadline = Instant::now() + delay;
                let timer = self.arm(chat_id.to_string(), 0, delay);
                buffers.insert(
                    chat_id.to_string(),
                    TextBuffer {
                        content: text.to_string(),
                        reply_to: message_id,
                        epoch: 0,
                        deadline,
                        timer,
                    },
                );
                debug!(chat_id, "text buffer started");
            }
        }
    }

    /// Handle a typing-start signal for a chat.
    ///
    /// Re-arms an existing buffer to the fixed typing extension, but never
    /// shortens the current time-to-flush. Does nothing when no buffer is
    /// pending.
    pub async fn notify_typing(&self, chat_id: &str) {
        let extension = Duration::from_millis(self.config.typing_extension_ms);
        let mut buffers = self.buffers.lock().await;

        if let Some(buffer) = buffers.get_mut(chat_id) {
            let new_deadline = Instant::now() + extension;
            if new_deadline <= buffer.deadline {
                return;
            }
            buffer.timer.abort();
            buffer.epoch += 1;
            buffer.deadline = new_deadline;
            buffer.timer = self.arm(chat_id.to_string(), buffer.epoch, extension);
            debug!(chat_id, "text buffer extended by typing signal");
        }
    }

    /// Number of chats with a pending buffer.
    pub async fn pending_count(&self) -> usize {
        self.buffers.lock().await.len()
    }

    /// Spawn the flush timer for (chat, epoch).
    ///
    /// The task re-checks the epoch under the registry lock before removing
    /// the buffer: an aborted-but-already-sleeping timer can never flush a
    /// buffer that was re-armed after it.
    fn arm(&self, chat_id: String, epoch: u64, delay: Duration) -> JoinHandle<()> {
        let buffers = Arc::clone(&self.buffers);
        let sink = self.sink.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let flushed = {
                let mut buffers = buffers.lock().await;
                match buffers.get(&chat_id) {
                    Some(buffer) if buffer.epoch == epoch => buffers.remove(&chat_id),
                    _ => None,
                }
            };

            if let Some(buffer) = flushed {
                let aggregate = Aggregate::Text {
                    chat_id,
                    content: buffer.content,
                    reply_to: buffer.reply_to,
                };
                if sink.send(aggregate).await.is_err() {
                    debug!("aggregate sink closed, dropping flush");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (TextAggregator, mpsc::Receiver<Aggregate>) {
        let (tx, rx) = mpsc::channel(16);
        (TextAggregator::new(AggregatorConfig::default(), tx), rx)
    }

    fn text_of(aggregate: Aggregate) -> (String, String, String) {
        match aggregate {
            Aggregate::Text {
                chat_id,
                content,
                reply_to,
            } => (chat_id, content, reply_to.0),
            other => panic!("expected text aggregate, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_messages_coalesce_into_one_flush() {
        let (agg, mut rx) = setup();

        // "hi" (3.5s delay), then 1s later "how are you" (resets to 3.5s).
        agg.push("c1", "hi", MessageId("1".into())).await;
        tokio::time::advance(Duration::from_millis(1000)).await;
        agg.push("c1", "how are you", MessageId("2".into())).await;

        // Flush lands ~3.5s after the second message.
        tokio::time::advance(Duration::from_millis(3600)).await;
        let (chat_id, content, reply_to) = text_of(rx.recv().await.unwrap());
        assert_eq!(chat_id, "c1");
        assert_eq!(content, "hi\nhow are you");
        assert_eq!(reply_to, "2", "reply-to must track the latest message");

        // Exactly one flush.
        assert!(rx.try_recv().is_err());
        assert_eq!(agg.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn messages_separated_by_quiet_periods_flush_independently() {
        let (agg, mut rx) = setup();

        agg.push("c1", "first thought", MessageId("1".into())).await;
        tokio::time::advance(Duration::from_millis(3600)).await;
        let (_, content, _) = text_of(rx.recv().await.unwrap());
        assert_eq!(content, "first thought");

        agg.push("c1", "second thought", MessageId("2".into())).await;
        tokio::time::advance(Duration::from_millis(3600)).await;
        let (_, content, _) = text_of(rx.recv().await.unwrap());
        assert_eq!(content, "second thought");
    }

    #[tokio::test(start_paused = true)]
    async fn many_rapid_fragments_join_in_arrival_order() {
        let (agg, mut rx) = setup();

        for (i, fragment) in ["a", "b", "c", "d"].iter().enumerate() {
            agg.push("c1", fragment, MessageId(i.to_string())).await;
            tokio::time::advance(Duration::from_millis(200)).await;
        }

        tokio::time::advance(Duration::from_millis(3600)).await;
        let (_, content, reply_to) = text_of(rx.recv().await.unwrap());
        assert_eq!(content, "a\nb\nc\nd");
        assert_eq!(reply_to, "3");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn typing_signal_extends_a_nearly_expired_buffer() {
        let (agg, mut rx) = setup();

        // Long text: 1.5s delay.
        let long = "this is a fairly long message well past fifty characters total";
        agg.push("c1", long, MessageId("1".into())).await;

        tokio::time::advance(Duration::from_millis(1000)).await;
        agg.notify_typing("c1").await; // deadline moves to t=3.5s

        // Past the original deadline: still buffered.
        tokio::time::advance(Duration::from_millis(1000)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(agg.pending_count().await, 1);

        tokio::time::advance(Duration::from_millis(1600)).await;
        let (_, content, _) = text_of(rx.recv().await.unwrap());
        assert_eq!(content, long);
    }

    #[tokio::test(start_paused = true)]
    async fn typing_signal_never_shortens_the_deadline() {
        let (agg, mut rx) = setup();

        // Short text: 3.5s deadline. The 2.5s typing extension would land
        // earlier and must be ignored.
        agg.push("c1", "hey", MessageId("1".into())).await;
        tokio::time::advance(Duration::from_millis(100)).await;
        agg.notify_typing("c1").await;

        tokio::time::advance(Duration::from_millis(3000)).await;
        assert!(rx.try_recv().is_err(), "flush must not happen before the original deadline");

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn typing_signal_never_creates_a_buffer() {
        let (agg, mut rx) = setup();

        agg.notify_typing("c1").await;
        tokio::time::advance(Duration::from_secs(10)).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(agg.pending_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn chats_are_aggregated_independently() {
        let (agg, mut rx) = setup();

        agg.push("c1", "hello from one", MessageId("1".into())).await;
        agg.push("c2", "hello from two", MessageId("2".into())).await;
        assert_eq!(agg.pending_count().await, 2);

        tokio::time::advance(Duration::from_millis(3600)).await;
        let first = text_of(rx.recv().await.unwrap());
        let second = text_of(rx.recv().await.unwrap());

        let mut chats = vec![first.0, second.0];
        chats.sort();
        assert_eq!(chats, vec!["c1".to_string(), "c2".to_string()]);
        assert!(rx.try_recv().is_err());
    }
}
