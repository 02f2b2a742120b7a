//! # smsmodem - serialized SMS dispatch over a single cellular modem
//!
//! A modem is a half-duplex serial device: it can only carry one submission at
//! a time, yet alerts arrive from many places at once. This crate funnels all
//! of them through one queue and one dispatcher, retrying failed recipients
//! with a cooldown and yielding to fresher messages when it falls behind.
//!
//! ## Features
//!
//! - **Single-writer dispatch**: only the dispatch task ever touches the transport.
//! - **Bounded backlog**: oldest message dropped on overflow, never an error to callers.
//! - **Idle handoff**: a message arriving at an idle dispatcher skips the queue entirely.
//! - **Retry with yield**: per-recipient attempts, cooldown between rounds, early exit when newer work waits.
//! - **Address codec**: byte-exact semioctet marshalling for recipient and service-center layouts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smsmodem::config::Config;
//! use smsmodem::modem::{start_modem, Message};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let transport = config.modem.loopback_transport();
//!     let modem = start_modem(config.modem_settings(), transport).await?;
//!
//!     modem.submit(Message::to(&["+447700900123"], "Backup finished"))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`modem`] - queue store, dispatch/send loop, transport seam
//! - [`pdu`] - semioctet address codec
//! - [`config`] - TOML configuration
//! - [`metrics`] - delivery counters
//! - [`logutil`] - single-line log escaping
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Submitters    │ ← any number of tasks holding a Modem handle
//! └─────────────────┘
//!          │ Put
//! ┌─────────────────┐
//! │   Queue Store   │ ← bounded backlog actor
//! └─────────────────┘
//!          │ Fetch / Check
//! ┌─────────────────┐
//! │  Dispatch Loop  │ ← retries, cooldown, preemption
//! └─────────────────┘
//!          │ send_one
//! ┌─────────────────┐
//! │    Transport    │ ← serial/AT session
//! └─────────────────┘
//! ```

pub mod config;
pub mod logutil;
pub mod metrics;
pub mod modem;
pub mod pdu;
