//! Transport seam between the dispatcher and the serial/AT session.
//!
//! The dispatcher only ever needs "send this text to this one recipient" and
//! treats every error as retryable. Implementations own the device; since only
//! the dispatch task holds one, there is never more than one send in flight.
//!
//! [`LoopbackTransport`] stands in for a real modem: it marshals the addresses
//! exactly as a PDU-mode session would, logs the send, and can be told to fail.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logutil::escape_log;
use crate::pdu::{to_hex, Address, CodecError, SmscAddress};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("modem rejected message: {0}")]
    Rejected(String),

    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    #[error("address encoding failed: {0}")]
    Codec(#[from] CodecError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport not ready: {0}")]
    Init(String),
}

#[async_trait]
pub trait Transport: Send {
    /// Bring the device up. Called once before the dispatch loop starts.
    async fn init(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Transmit `text` to a single recipient, blocking for the whole exchange.
    async fn send_one(&mut self, recipient: &Address, text: &str) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn init(&mut self) -> Result<(), TransportError> {
        (**self).init().await
    }

    async fn send_one(&mut self, recipient: &Address, text: &str) -> Result<(), TransportError> {
        (**self).send_one(recipient, text).await
    }
}

/// How the session submits messages to the modem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendMode {
    /// Binary PDU mode; addresses go through the semioctet codec.
    #[default]
    Pdu,
    /// Plain text mode; the number is passed as a string.
    Text,
}

/// Diagnostic detail for each send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceLevel {
    #[default]
    Off,
    /// Log every send with a text preview.
    Verbose,
    /// Additionally dump the marshalled address bytes in hex.
    Hex,
}

/// A transport that sends nowhere.
#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    pub mode: SendMode,
    pub smsc: SmscAddress,
    pub trace: TraceLevel,
    /// Probability in `[0, 1]` that a send is rejected.
    pub fail_rate: f64,
    /// Simulated time on air per send.
    pub latency: Duration,
    /// Sends slower than this fail with [`TransportError::Timeout`].
    pub timeout: Duration,
    pub(crate) sent: u64,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self {
            mode: SendMode::Pdu,
            smsc: SmscAddress::default(),
            trace: TraceLevel::Off,
            fail_rate: 0.0,
            latency: Duration::ZERO,
            timeout: Duration::from_secs(5),
            sent: 0,
        }
    }
}

impl LoopbackTransport {
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Hex dump line for `header`, present only at [`TraceLevel::Hex`].
    fn hex_trace(&self, header: &[u8]) -> Option<String> {
        (self.trace == TraceLevel::Hex).then(|| format!("w: {}", to_hex(header)))
    }

    /// Address header as it would lead a PDU-mode submission: SMSC, then
    /// the destination.
    pub fn address_header(&self, recipient: &Address) -> Result<Vec<u8>, CodecError> {
        let mut header = self.smsc.marshal_binary()?;
        header.extend(recipient.marshal_binary()?);
        Ok(header)
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn init(&mut self) -> Result<(), TransportError> {
        if self.mode == SendMode::Pdu {
            self.smsc.marshal_binary().map_err(|e| {
                TransportError::Init(format!("invalid service center {}: {}", self.smsc, e))
            })?;
        }
        if !(0.0..=1.0).contains(&self.fail_rate) {
            return Err(TransportError::Init(format!(
                "fail rate {} outside [0, 1]",
                self.fail_rate
            )));
        }
        debug!(
            "loopback transport ready (mode={:?} smsc={})",
            self.mode, self.smsc
        );
        Ok(())
    }

    async fn send_one(&mut self, recipient: &Address, text: &str) -> Result<(), TransportError> {
        if self.mode == SendMode::Pdu {
            let header = self.address_header(recipient)?;
            if let Some(line) = self.hex_trace(&header) {
                info!("{}", line);
            }
        }
        if self.trace != TraceLevel::Off {
            info!("loopback: to={} text=\"{}\"", recipient, escape_log(text));
        }

        if self.latency > self.timeout {
            tokio::time::sleep(self.timeout).await;
            return Err(TransportError::Timeout(self.timeout));
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let rejected = self.fail_rate > 0.0 && rand::thread_rng().gen_bool(self.fail_rate);
        if rejected {
            return Err(TransportError::Rejected("simulated failure".to_string()));
        }
        self.sent += 1;
        Ok(())
    }
}
