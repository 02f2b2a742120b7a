//! Dispatch loop and per-message send loop.
//!
//! The dispatcher is the only owner of the transport: it fetches one message,
//! runs it to completion, then fetches the next. Within a message every
//! pending recipient is tried once per attempt; between attempts the loop
//! cools down and asks the queue whether newer work is waiting, and if so
//! gives up on the stragglers instead of holding the line.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::queue::QueueHandle;
use super::transport::{Transport, TransportError};
use super::Message;
use crate::logutil::escape_log;
use crate::metrics::DeliveryMetrics;
use crate::pdu::Address;

pub const DEFAULT_ATTEMPTS: u32 = 5;
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Attempts per recipient, always at least one.
    pub max_attempts: u32,
    /// Pause between attempts; zero retries back to back.
    pub cooldown: Duration,
    /// Upper bound on a single `send_one`; expiry counts as a failed attempt.
    pub send_timeout: Option<Duration>,
}

impl DispatchSettings {
    /// `max_attempts <= 0` still makes one attempt.
    pub fn new(max_attempts: i64, cooldown: Duration, send_timeout: Option<Duration>) -> Self {
        Self {
            max_attempts: max_attempts.clamp(1, u32::MAX as i64) as u32,
            cooldown,
            send_timeout,
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_ATTEMPTS,
            cooldown: DEFAULT_COOLDOWN,
            send_timeout: None,
        }
    }
}

/// How the send loop finished with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every recipient accepted the message (or there were none).
    Delivered,
    /// At least one recipient ran out of attempts.
    Exhausted,
    /// Newer work was waiting, so remaining recipients were skipped.
    Preempted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub message_id: Uuid,
    pub outcome: Outcome,
    pub delivered: Vec<Address>,
    pub failed: Vec<Address>,
    pub skipped: Vec<Address>,
    /// Attempt rounds started.
    pub attempts: u32,
    /// Cooldown pauses taken between rounds.
    pub cooldowns: u32,
}

pub struct Dispatcher<T> {
    queue: QueueHandle,
    transport: T,
    settings: DispatchSettings,
    metrics: Arc<DeliveryMetrics>,
    reports: Option<mpsc::UnboundedSender<DeliveryReport>>,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(
        queue: QueueHandle,
        transport: T,
        settings: DispatchSettings,
        metrics: Arc<DeliveryMetrics>,
        reports: Option<mpsc::UnboundedSender<DeliveryReport>>,
    ) -> Self {
        Self {
            queue,
            transport,
            settings,
            metrics,
            reports,
        }
    }

    /// Fetch and send until the queue store shuts down.
    pub async fn run(mut self) {
        info!("Starting modem dispatch loop");
        while let Some(message) = self.queue.fetch().await {
            let report = self.send_message(message).await;
            self.metrics.inc_messages();
            debug!(
                "message {} finished: {:?} (delivered={} failed={} skipped={} attempts={})",
                report.message_id,
                report.outcome,
                report.delivered.len(),
                report.failed.len(),
                report.skipped.len(),
                report.attempts
            );
            if let Some(tx) = &self.reports {
                let _ = tx.send(report);
            }
        }
        debug!("dispatch loop terminated");
    }

    /// Deliver one message to all of its recipients.
    pub async fn send_message(&mut self, message: Message) -> DeliveryReport {
        let max = self.settings.max_attempts;
        let text = message.text();
        let mut seen = HashSet::new();
        let mut pending: Vec<Address> = message
            .recipients()
            .iter()
            .filter(|a| seen.insert((*a).clone()))
            .cloned()
            .collect();

        let mut report = DeliveryReport {
            message_id: message.id(),
            outcome: Outcome::Delivered,
            delivered: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            attempts: 0,
            cooldowns: 0,
        };
        if pending.is_empty() {
            debug!("message {} has no recipients", message.id());
            return report;
        }
        debug!(
            "message {} text=\"{}\"",
            message.id(),
            escape_log(text)
        );

        for attempt in 1..=max {
            report.attempts = attempt;
            for recipient in std::mem::take(&mut pending) {
                info!("Sending SMS to {} (attempt {}/{})", recipient, attempt, max);
                match self.send_one(&recipient, text).await {
                    Ok(()) => {
                        info!("Sent SMS to {} (attempt {}/{})", recipient, attempt, max);
                        self.metrics.inc_sent();
                        report.delivered.push(recipient);
                    }
                    Err(e) if attempt == max => {
                        warn!("Unable to send SMS to {}: {}", recipient, e);
                        self.metrics.inc_failed();
                        report.failed.push(recipient);
                    }
                    Err(e) => {
                        warn!(
                            "Failed to send SMS to {}: {} (attempt {}/{})",
                            recipient, e, attempt, max
                        );
                        self.metrics.inc_retries();
                        pending.push(recipient);
                    }
                }
            }

            if pending.is_empty() || attempt == max {
                break;
            }

            if !self.settings.cooldown.is_zero() {
                tokio::time::sleep(self.settings.cooldown).await;
            }
            report.cooldowns += 1;

            // Another queued message gets precedence over further attempts on
            // this one: we're falling behind.
            if self.queue.check().await {
                info!(
                    "Skipping further attempts for message {} ({} recipient(s)), continue with another message",
                    message.id(),
                    pending.len()
                );
                self.metrics.inc_preempted();
                report.skipped = std::mem::take(&mut pending);
                report.outcome = Outcome::Preempted;
                return report;
            }
        }

        if !report.failed.is_empty() {
            report.outcome = Outcome::Exhausted;
        }
        report
    }

    async fn send_one(&mut self, recipient: &Address, text: &str) -> Result<(), TransportError> {
        match self.settings.send_timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.send_one(recipient, text))
                .await
                .unwrap_or(Err(TransportError::Timeout(limit))),
            None => self.transport.send_one(recipient, text).await,
        }
    }
}
