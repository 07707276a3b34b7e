// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat serialized dispatch.
//!
//! Each chat gets a worker task fed by its own queue, so events of one chat
//! are handled strictly in arrival order while different chats proceed
//! independently. A worker that sits idle closes its queue, drains what is
//! left and exits; the next event for that chat starts a fresh worker that
//! waits for its predecessor before handling anything.
//!
//! Per-chat queues are unbounded: the receive loop never waits on a chat
//! whose worker is stuck in a slow analysis call.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use todobridge_core::error::BridgeError;
use todobridge_core::types::{ChatId, InboundEvent};
use todobridge_core::ChannelAdapter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bridge::Bridge;

/// Upper bound on waiting for workers at shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

struct Worker {
    tx: mpsc::UnboundedSender<InboundEvent>,
    handle: JoinHandle<()>,
}

pub struct Dispatcher {
    bridge: Arc<Bridge>,
    channel: Arc<dyn ChannelAdapter>,
    allowed_chats: HashSet<ChatId>,
    idle_timeout: Duration,
    workers: HashMap<ChatId, Worker>,
}

impl Dispatcher {
    /// `allowed_chats` empty means every chat is served.
    pub fn new(
        bridge: Arc<Bridge>,
        channel: Arc<dyn ChannelAdapter>,
        allowed_chats: impl IntoIterator<Item = ChatId>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            bridge,
            channel,
            allowed_chats: allowed_chats.into_iter().collect(),
            idle_timeout,
            workers: HashMap::new(),
        }
    }

    pub fn is_allowed(&self, chat_id: ChatId) -> bool {
        self.allowed_chats.is_empty() || self.allowed_chats.contains(&chat_id)
    }

    /// Receives events until `cancel` fires or the channel closes, then
    /// waits for in-flight work.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), BridgeError> {
        info!(allowed_chats = self.allowed_chats.len(), "dispatcher running");
        let channel = self.channel.clone();

        loop {
            tokio::select! {
                event = channel.receive() => {
                    match event {
                        Ok(event) => self.dispatch(event),
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                            if e.to_string().contains("closed") {
                                break;
                            }
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping dispatcher");
                    break;
                }
            }
        }

        self.drain().await;
        info!("dispatcher stopped");
        Ok(())
    }

    /// Hands an event to its chat's worker, starting one if needed.
    pub fn dispatch(&mut self, event: InboundEvent) {
        let chat_id = event.chat_id();
        if !self.is_allowed(chat_id) {
            debug!(chat_id = %chat_id, "dropping event from chat outside the allow-list");
            return;
        }

        let mut event = event;
        if let Some(worker) = self.workers.get(&chat_id) {
            match worker.tx.send(event) {
                Ok(()) => return,
                // The worker went idle and closed its queue.
                Err(mpsc::error::SendError(returned)) => event = returned,
            }
        } else {
            self.workers.retain(|_, w| !w.handle.is_finished());
        }

        let previous = self.workers.remove(&chat_id).map(|w| w.handle);
        let worker = self.spawn_worker(chat_id, previous);
        if worker.tx.send(event).is_err() {
            warn!(chat_id = %chat_id, "fresh worker rejected event");
        }
        self.workers.insert(chat_id, worker);
    }

    fn spawn_worker(&self, chat_id: ChatId, previous: Option<JoinHandle<()>>) -> Worker {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bridge = self.bridge.clone();
        let idle = self.idle_timeout;

        let handle = tokio::spawn(async move {
            if let Some(previous) = previous
                && let Err(e) = previous.await
            {
                warn!(chat_id = %chat_id, error = %e, "previous chat worker ended abnormally");
            }
            debug!(chat_id = %chat_id, "chat worker started");

            loop {
                match tokio::time::timeout(idle, rx.recv()).await {
                    Ok(Some(event)) => bridge.handle_event(event).await,
                    Ok(None) => break,
                    Err(_) => {
                        rx.close();
                        while let Some(event) = rx.recv().await {
                            bridge.handle_event(event).await;
                        }
                        break;
                    }
                }
            }
            debug!(chat_id = %chat_id, "chat worker exited");
        });

        Worker { tx, handle }
    }

    pub fn active_workers(&self) -> usize {
        self.workers.values().filter(|w| !w.handle.is_finished()).count()
    }

    /// Closes every queue and waits for the workers to finish.
    async fn drain(&mut self) {
        let handles: Vec<JoinHandle<()>> = self
            .workers
            .drain()
            .map(|(_, worker)| worker.handle)
            .collect();
        if handles.is_empty() {
            info!("no chat workers to drain");
            return;
        }

        info!(count = handles.len(), "waiting for chat workers to finish");
        match tokio::time::timeout(DRAIN_TIMEOUT, futures::future::join_all(handles)).await {
            Ok(_) => info!("all chat workers drained"),
            Err(_) => warn!("timeout reached, some chat workers interrupted"),
        }
    }
}
