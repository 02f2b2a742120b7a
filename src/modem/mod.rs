//! # Modem Dispatch Core
//!
//! Serializes any number of concurrent send requests onto one half-duplex
//! serial modem. Three tasks cooperate purely by message passing:
//!
//! ```text
//!  submitters ──Put──▶ ┌──────────────┐ ◀──Fetch/Check── ┌───────────────┐ ──send_one──▶ Transport
//!  (any number)        │ Queue Store  │ ───Response────▶ │ Dispatch Loop │
//!                      └──────────────┘                  └───────────────┘
//! ```
//!
//! - [`queue`] owns the bounded backlog (drop-oldest on overflow) and hands a
//!   message straight to an idle dispatcher when one is parked on `Fetch`.
//! - [`dispatch`] runs one message at a time through the retry loop and is the
//!   only code that touches the transport.
//! - [`transport`] is the seam to the serial/AT session.
//!
//! There is no global instance: [`start_modem`] builds everything once and
//! returns a cloneable [`Modem`] handle to pass to whatever needs to submit.
//!
//! ```rust,no_run
//! use smsmodem::modem::{start_modem, Message, ModemSettings};
//! use smsmodem::modem::transport::LoopbackTransport;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let modem = start_modem(ModemSettings::default(), LoopbackTransport::default()).await?;
//!     modem.submit(Message::to(&["+447700900123"], "Disk almost full"))?;
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod queue;
pub mod transport;

pub use dispatch::{DeliveryReport, DispatchSettings, Dispatcher, Outcome};
pub use queue::{QueueHandle, QueueStats};
pub use transport::{Transport, TransportError};

use crate::metrics::{DeliveryMetrics, MetricsSnapshot};
use crate::pdu::Address;
use log::info;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Default backlog bound when none is configured.
pub const DEFAULT_QUEUE_SIZE: usize = 5;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The queue store has stopped; nothing can be submitted.
    #[error("modem dispatcher is not running")]
    Closed,

    /// The transport could not be brought up at startup.
    #[error("transport initialization failed: {0}")]
    TransportInit(#[source] TransportError),
}

/// An outbound text with its recipients. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    id: Uuid,
    recipients: Vec<Address>,
    text: String,
}

impl Message {
    pub fn new(recipients: Vec<Address>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipients,
            text: text.into(),
        }
    }

    /// Convenience constructor parsing each number with [`Address::parse`].
    pub fn to(numbers: &[&str], text: impl Into<String>) -> Self {
        Self::new(numbers.iter().map(|n| Address::parse(n)).collect(), text)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn recipients(&self) -> &[Address] {
        &self.recipients
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Everything needed to wire up the queue and dispatcher.
#[derive(Debug, Clone)]
pub struct ModemSettings {
    pub queue_size: usize,
    pub dispatch: DispatchSettings,
}

impl Default for ModemSettings {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
            dispatch: DispatchSettings::default(),
        }
    }
}

/// Submission handle. Cheap to clone; every clone feeds the same queue.
#[derive(Clone, Debug)]
pub struct Modem {
    queue: QueueHandle,
    metrics: Arc<DeliveryMetrics>,
}

impl Modem {
    /// Accept a message for delivery. Returns as soon as the queue store has
    /// it; overflow silently evicts the oldest queued message instead of
    /// failing here.
    pub fn submit(&self, message: Message) -> Result<(), DispatchError> {
        self.queue.put(message)
    }

    pub async fn queue_stats(&self) -> Option<QueueStats> {
        self.queue.snapshot().await
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stop the queue store. The dispatcher finishes the message it is on,
    /// then exits when its next fetch finds the queue closed.
    pub async fn shutdown(&self) {
        self.queue.shutdown().await;
    }
}

/// Initialize `transport`, spawn the queue store and dispatch loop, and return
/// the submission handle. A transport init failure is the only fatal error.
pub async fn start_modem<T>(settings: ModemSettings, transport: T) -> Result<Modem, DispatchError>
where
    T: Transport + 'static,
{
    start(settings, transport, None).await
}

/// Like [`start_modem`], additionally publishing a [`DeliveryReport`] for
/// every message the dispatcher finishes with.
pub async fn start_modem_with_reports<T>(
    settings: ModemSettings,
    transport: T,
) -> Result<(Modem, mpsc::UnboundedReceiver<DeliveryReport>), DispatchError>
where
    T: Transport + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let modem = start(settings, transport, Some(tx)).await?;
    Ok((modem, rx))
}

async fn start<T>(
    settings: ModemSettings,
    mut transport: T,
    reports: Option<mpsc::UnboundedSender<DeliveryReport>>,
) -> Result<Modem, DispatchError>
where
    T: Transport + 'static,
{
    transport.init().await.map_err(DispatchError::TransportInit)?;

    let queue = queue::start_queue(settings.queue_size);
    let metrics = Arc::new(DeliveryMetrics::new());
    let dispatcher = Dispatcher::new(
        queue.clone(),
        transport,
        settings.dispatch.clone(),
        metrics.clone(),
        reports,
    );
    tokio::spawn(dispatcher.run());
    info!(
        "modem dispatcher started (queue_size={} attempts={} cooldown={:?})",
        settings.queue_size, settings.dispatch.max_attempts, settings.dispatch.cooldown
    );

    Ok(Modem { queue, metrics })
}
