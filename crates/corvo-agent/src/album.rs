// SPDX-FileCopyrightText: 2026 Corvo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat media album aggregation.
//!
//! Messaging platforms deliver multi-photo albums as a rapid burst of
//! separate events. Items arriving within the album window are collected
//! into one ordered aggregate; the window is fixed rather than
//! content-driven. Same registry-and-epoch design as the text aggregator.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use corvo_config::model::AggregatorConfig;
use corvo_core::types::{Aggregate, MediaItem, MessageId};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

struct AlbumBuffer {
    items: Vec<MediaItem>,
    reply_to: MessageId,
    epoch: u64,
    timer: JoinHandle<()>,
}

/// Debounce registry for inbound media, keyed by chat id.
pub struct MediaAggregator {
    buffers: Arc<Mutex<HashMap<String, AlbumBuffer>>>,
    window: Duration,
    sink: mpsc::Sender<Aggregate>,
}

impl MediaAggregator {
    /// Create an aggregator that delivers flushed albums into `sink`.
    pub fn new(config: AggregatorConfig, sink: mpsc::Sender<Aggregate>) -> Self {
        Self {
            buffers: Arc::new(Mutex::new(HashMap::new())),
            window: Duration::from_millis(config.album_window_ms),
            sink,
        }
    }

    /// Feed one inbound media item into the chat's album buffer.
    ///
    /// Creates the buffer if absent; otherwise appends the item, updates the
    /// reply-to reference, and resets the window timer.
    pub async fn push(&self, chat_id: &str, item: MediaItem, message_id: MessageId) {
        let mut buffers = self.buffers.lock().await;

        match buffers.get_mut(chat_id) {
            Some(buffer) => {
                buffer.timer.abort();
                buffer.items.push(item);
                buffer.reply_to = message_id;
                buffer.epoch += 1;
                buffer.timer = self.arm(chat_id.to_string(), buffer.epoch);
                debug!(chat_id, items = buffer.items.len(), "album buffer extended");
            }
            None => {
                let timer = self.arm(chat_id.to_string(), 0);
                buffers.insert(
                    chat_id.to_string(),
                    AlbumBuffer {
                        items: vec![item],
                        reply_to: message_id,
                        epoch: 0,
                        timer,
                    },
                );
                debug!(chat_id, "album buffer started");
            }
        }
    }

    /// Number of chats with a pending album buffer.
    pub async fn pending_count(&self) -> usize {
        self.buffers.lock().await.len()
    }

    fn arm(&self, chat_id: String, epoch: u64) -> JoinHandle<()> {
        let buffers = Arc::clone(&self.buffers);
        let sink = self.sink.clone();
        let window = self.window;

        tokio::spawn(async move {
            tokio::time::sleep(window).await;

            let flushed = {
                let mut buffers = buffers.lock().await;
                match buffers.get(&chat_id) {
                    Some(buffer) if buffer.epoch == epoch => buffers.remove(&chat_id),
                    _ => None,
                }
            };

            if let Some(buffer) = flushed {
                // Guard against a stray zero-item flush.
                if buffer.items.is_empty() {
                    debug!(chat_id, "empty album buffer discarded");
                    return;
                }
                let aggregate = Aggregate::Album {
                    chat_id,
                    items: buffer.items,
                    reply_to: buffer.reply_to,
                };
                if sink.send(aggregate).await.is_err() {
                    debug!("aggregate sink closed, dropping album flush");
                }
            }
        })
    }
}
