//! Binary entrypoint for the smsmodem CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `status` - print the resolved configuration
//! - `send --to <number>... <text>` - push one message through the dispatcher (loopback transport)
//! - `encode-address [--smsc] [--toa <byte>] <digits>` - print the wire bytes of an address
//! - `decode-address [--smsc] <hex>` - parse wire bytes back into an address
//!
//! See the library crate docs for module-level details: `smsmodem::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use smsmodem::config::Config;
use smsmodem::modem::{start_modem_with_reports, Message};
use smsmodem::pdu::{self, Address, SmscAddress, TypeOfAddress};

#[derive(Parser)]
#[command(name = "smsmodem")]
#[command(about = "Serialized SMS dispatch over a single cellular modem")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Show the resolved configuration
    Status,
    /// Send one message through the dispatcher using the loopback transport
    Send {
        /// Recipient number; repeat for several
        #[arg(short, long = "to", required = true)]
        to: Vec<String>,
        /// Probability (0-1) that each simulated send fails
        #[arg(long, default_value_t = 0.0)]
        fail_rate: f64,
        /// Message text
        text: String,
    },
    /// Encode an address into its wire bytes
    EncodeAddress {
        /// Use the service-center layout
        #[arg(long)]
        smsc: bool,
        /// Type-of-address byte (e.g. 0x91); derived from a leading '+' when omitted
        #[arg(long)]
        toa: Option<String>,
        digits: String,
    },
    /// Decode wire bytes (hex) into an address
    DecodeAddress {
        /// Use the service-center layout
        #[arg(long)]
        smsc: bool,
        hex: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            info!("Writing default configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Status => {
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            let settings = config.modem_settings();
            let payload = serde_json::json!({
                "device": config.modem.device,
                "mode": config.modem.mode,
                "baud_rate": config.modem.baud_rate(),
                "timeout_secs": config.modem.timeout().as_secs(),
                "smsc": config.modem.smsc().to_string(),
                "queue_size": settings.queue_size,
                "attempts": settings.dispatch.max_attempts,
                "cooldown_secs": settings.dispatch.cooldown.as_secs_f32(),
                "send_timeout_secs": settings.dispatch.send_timeout.map(|d| d.as_secs()),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Commands::Send {
            to,
            fail_rate,
            text,
        } => {
            let config = match pre_config {
                Some(c) => c,
                None => {
                    warn!("No usable config at {}; using defaults", cli.config);
                    Config::default()
                }
            };
            let mut transport = config.modem.loopback_transport();
            transport.fail_rate = fail_rate;

            let (modem, mut reports) =
                start_modem_with_reports(config.modem_settings(), transport).await?;
            let numbers: Vec<&str> = to.iter().map(String::as_str).collect();
            let message = Message::to(&numbers, text);
            let id = message.id();
            modem.submit(message)?;
            info!("Submitted message {}", id);

            let report = reports
                .recv()
                .await
                .ok_or_else(|| anyhow!("dispatcher stopped before reporting"))?;
            let payload = serde_json::json!({
                "report": report,
                "metrics": modem.metrics(),
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
            modem.shutdown().await;
        }
        Commands::EncodeAddress { smsc, toa, digits } => {
            let mut address = Address::parse(&digits);
            if let Some(raw) = toa {
                address = Address::new(address.digits(), TypeOfAddress(parse_byte(&raw)?));
            }
            let bytes = if smsc {
                SmscAddress(address).marshal_binary()?
            } else {
                address.marshal_binary()?
            };
            println!("{}", pdu::to_hex(&bytes));
        }
        Commands::DecodeAddress { smsc, hex } => {
            let bytes = pdu::from_hex(&hex).ok_or_else(|| anyhow!("invalid hex: {}", hex))?;
            let (address, used) = if smsc {
                let (a, n) = SmscAddress::unmarshal_binary(&bytes)?;
                (a.0, n)
            } else {
                Address::unmarshal_binary(&bytes)?
            };
            let payload = serde_json::json!({
                "address": address.to_string(),
                "digits": address.digits(),
                "toa": format!("0x{:02X}", address.toa().0),
                "bytes_consumed": used,
            });
            println!("{}", payload);
        }
    }

    Ok(())
}

fn parse_byte(raw: &str) -> Result<u8> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => raw.parse::<u8>(),
    };
    parsed.map_err(|e| anyhow!("invalid type-of-address {}: {}", raw, e))
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    match log_file {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Echo to the console only when attached to a terminal
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
