//! # Configuration Management Module
//!
//! Startup settings for the modem session, the dispatcher and logging, read
//! once from a TOML file and turned into the typed settings each component
//! consumes.
//!
//! ## Configuration Structure
//!
//! - [`ModemConfig`] - device, submission mode, service center, diagnostics
//! - [`DispatchConfig`] - queue bound, attempts, cooldown
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Configuration File Format
//!
//! ```toml
//! [modem]
//! device = "/dev/ttyUSB0"
//! mode = "pdu"
//! baud_rate = 115200
//! timeout_secs = 5
//! smsc = ""
//!
//! [dispatch]
//! queue_size = 5
//! attempts = 5
//! cooldown_secs = 1.0
//!
//! [logging]
//! level = "info"
//! file = "smsmodem.log"
//! ```
//!
//! Zero values for `baud_rate`, `timeout_secs`, `queue_size` and `attempts`
//! mean "use the default", so a half-filled file still yields a working setup.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

use crate::modem::dispatch::{DispatchSettings, DEFAULT_ATTEMPTS, DEFAULT_COOLDOWN};
use crate::modem::transport::{LoopbackTransport, SendMode, TraceLevel};
use crate::modem::{ModemSettings, DEFAULT_QUEUE_SIZE};
use crate::pdu::{Address, SmscAddress};

pub const DEFAULT_BAUD_RATE: u32 = 115200;
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub modem: ModemConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModemConfig {
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default)]
    pub mode: SendMode,
    #[serde(default)]
    pub baud_rate: u32,
    #[serde(default)]
    pub timeout_secs: u64,
    /// Service center number; empty uses the one stored on the SIM.
    #[serde(default)]
    pub smsc: String,
    /// Log every send.
    #[serde(default)]
    pub verbose: bool,
    /// Log marshalled bytes in hex (implies verbose).
    #[serde(default)]
    pub hex: bool,
}

fn default_device() -> String {
    "/dev/ttyUSB0".to_string()
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            mode: SendMode::Pdu,
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            smsc: String::new(),
            verbose: false,
            hex: false,
        }
    }
}

impl ModemConfig {
    pub fn baud_rate(&self) -> u32 {
        if self.baud_rate == 0 {
            DEFAULT_BAUD_RATE
        } else {
            self.baud_rate
        }
    }

    pub fn timeout(&self) -> Duration {
        if self.timeout_secs == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.timeout_secs)
        }
    }

    pub fn smsc(&self) -> SmscAddress {
        SmscAddress(Address::parse(&self.smsc))
    }

    pub fn trace_level(&self) -> TraceLevel {
        if self.hex {
            TraceLevel::Hex
        } else if self.verbose {
            TraceLevel::Verbose
        } else {
            TraceLevel::Off
        }
    }

    /// A loopback transport carrying this session's settings.
    pub fn loopback_transport(&self) -> LoopbackTransport {
        LoopbackTransport {
            mode: self.mode,
            smsc: self.smsc(),
            trace: self.trace_level(),
            timeout: self.timeout(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum queued messages before the oldest is dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_size: Option<usize>,
    /// Attempts per recipient. Negative values still make one attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<i64>,
    /// Pause between attempts, fractional seconds allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_secs: Option<f32>,
    /// Bound on a single send; unset or 0 waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_timeout_secs: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_size: Some(DEFAULT_QUEUE_SIZE),
            attempts: Some(DEFAULT_ATTEMPTS as i64),
            cooldown_secs: Some(DEFAULT_COOLDOWN.as_secs_f32()),
            send_timeout_secs: None,
        }
    }
}

impl DispatchConfig {
    pub fn queue_size(&self) -> usize {
        match self.queue_size {
            Some(n) if n > 0 => n,
            _ => DEFAULT_QUEUE_SIZE,
        }
    }

    pub fn attempts(&self) -> i64 {
        match self.attempts {
            Some(n) if n != 0 => n,
            _ => DEFAULT_ATTEMPTS as i64,
        }
    }

    pub fn cooldown(&self) -> Duration {
        match self.cooldown_secs {
            None => DEFAULT_COOLDOWN,
            Some(s) if s.is_finite() && s > 0.0 => Duration::from_secs_f32(s),
            Some(_) => Duration::ZERO,
        }
    }

    pub fn send_timeout(&self) -> Option<Duration> {
        self.send_timeout_secs
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
    }

    pub fn settings(&self) -> DispatchSettings {
        DispatchSettings::new(self.attempts(), self.cooldown(), self.send_timeout())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("smsmodem.log".to_string()),
        }
    }
}

impl LoggingConfig {
    /// Configured level, falling back to `info` when unparseable.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn modem_settings(&self) -> ModemSettings {
        ModemSettings {
            queue_size: self.dispatch.queue_size(),
            dispatch: self.dispatch.settings(),
        }
    }
}
