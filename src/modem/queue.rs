//! Queue store actor.
//!
//! A single task owns the backlog; everything else talks to it through
//! [`QueueCommand`]s, so `Put`, `Fetch` and `Check` never interleave.
//!
//! * Bounded backlog, oldest entry evicted on overflow (counted + logged).
//! * A `Fetch` on an empty backlog parks its reply channel; the next `Put` is
//!   handed straight to it without touching the backlog.
//! * `Check` reports whether anything is queued and never waits.

use std::collections::VecDeque;
use std::future::Future;

use log::{debug, warn};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use super::{DispatchError, Message};

pub enum QueueCommand {
    Put(Message),
    Fetch(oneshot::Sender<QueueResponse>),
    Check(oneshot::Sender<QueueResponse>),
    Snapshot(oneshot::Sender<QueueStats>),
    Shutdown(oneshot::Sender<()>),
}

#[derive(Debug)]
pub struct QueueResponse {
    pub found: bool,
    pub message: Option<Message>,
}

impl QueueResponse {
    fn found(message: Message) -> Self {
        Self {
            found: true,
            message: Some(message),
        }
    }

    fn status(found: bool) -> Self {
        Self {
            found,
            message: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub queued: usize,
    pub accepted: u64,
    /// Puts delivered directly to a parked fetcher.
    pub handed_off: u64,
    pub dropped_overflow: u64,
}

#[derive(Clone, Debug)]
pub struct QueueHandle {
    tx: mpsc::UnboundedSender<QueueCommand>,
}

impl QueueHandle {
    pub fn put(&self, message: Message) -> Result<(), DispatchError> {
        self.tx
            .send(QueueCommand::Put(message))
            .map_err(|_| DispatchError::Closed)
    }

    /// Request the next message. The command is sent before this returns, so
    /// anything submitted afterwards is ordered behind it; the returned future
    /// resolves once a message is available, or `None` if the store stops.
    pub fn fetch(&self) -> impl Future<Output = Option<Message>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        let sent = self.tx.send(QueueCommand::Fetch(tx)).is_ok();
        async move {
            if !sent {
                return None;
            }
            rx.await.ok().and_then(|resp| resp.message)
        }
    }

    /// True when at least one message is waiting in the backlog.
    pub async fn check(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(QueueCommand::Check(tx)).is_err() {
            return false;
        }
        rx.await.map(|resp| resp.found).unwrap_or(false)
    }

    pub async fn snapshot(&self) -> Option<QueueStats> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(QueueCommand::Snapshot(tx)).is_ok() {
            rx.await.ok()
        } else {
            None
        }
    }

    /// Stop the store and wait until it has released its command channel.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(QueueCommand::Shutdown(tx)).is_ok() {
            let _ = rx.await;
        }
        self.tx.closed().await;
    }
}

struct QueueStore {
    capacity: usize,
    backlog: VecDeque<Message>,
    /// Reply channel of a parked `Fetch`; `Some` is the "someone is waiting" flag.
    waiting: Option<oneshot::Sender<QueueResponse>>,
    stats: QueueStats,
}

impl QueueStore {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            backlog: VecDeque::with_capacity(capacity + 1),
            waiting: None,
            stats: QueueStats::default(),
        }
    }

    fn put(&mut self, message: Message) {
        self.stats.accepted += 1;
        let message = match self.waiting.take() {
            Some(waiter) => match waiter.send(QueueResponse::found(message)) {
                Ok(()) => {
                    self.stats.handed_off += 1;
                    debug!("queue: handed message directly to waiting dispatcher");
                    return;
                }
                // Fetcher went away; keep the message rather than lose it.
                Err(returned) => match returned.message {
                    Some(m) => m,
                    None => return,
                },
            },
            None => message,
        };

        self.backlog.push_back(message);
        if self.backlog.len() > self.capacity {
            if let Some(dropped) = self.backlog.pop_front() {
                self.stats.dropped_overflow += 1;
                warn!(
                    "queue: dropping message {} from send queue (capacity={})",
                    dropped.id(),
                    self.capacity
                );
            }
        }
    }

    fn fetch(&mut self, reply: oneshot::Sender<QueueResponse>) {
        match self.backlog.pop_front() {
            Some(message) => {
                if let Err(returned) = reply.send(QueueResponse::found(message)) {
                    if let Some(m) = returned.message {
                        self.backlog.push_front(m);
                    }
                }
            }
            None => {
                if self.waiting.is_some() {
                    warn!("queue: second fetch while one is already waiting; replacing it");
                }
                self.waiting = Some(reply);
            }
        }
    }

    fn check(&self, reply: oneshot::Sender<QueueResponse>) {
        let _ = reply.send(QueueResponse::status(!self.backlog.is_empty()));
    }

    fn snapshot(&self) -> QueueStats {
        QueueStats {
            queued: self.backlog.len(),
            ..self.stats.clone()
        }
    }
}

/// Spawn the queue store actor with the given backlog bound (0 is treated as 1).
pub fn start_queue(capacity: usize) -> QueueHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<QueueCommand>();
    let handle = QueueHandle { tx };

    tokio::spawn(async move {
        let mut store = QueueStore::new(capacity);
        while let Some(cmd) = rx.recv().await {
            match cmd {
                QueueCommand::Put(message) => store.put(message),
                QueueCommand::Fetch(reply) => store.fetch(reply),
                QueueCommand::Check(reply) => store.check(reply),
                QueueCommand::Snapshot(reply) => {
                    let _ = reply.send(store.snapshot());
                }
                QueueCommand::Shutdown(done) => {
                    store.waiting = None;
                    if !store.backlog.is_empty() {
                        warn!(
                            "queue: shutting down with {} undelivered message(s)",
                            store.backlog.len()
                        );
                    }
                    let _ = done.send(());
                    break;
                }
            }
        }
        debug!("queue store terminated");
    });

    handle
}
