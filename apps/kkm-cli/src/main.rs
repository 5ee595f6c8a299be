//! # kkm
//!
//! Command-line front end for the KKM gateway client.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          kkm <command>                                  │
//! │                                                                         │
//! │  kkm.toml + KKM_* env + --host/--secret/--serial                       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  prepare(kind) ──► config defaults ──► --details JSON ──► perform × N  │
//! │                  (operator, customer)                      │            │
//! │                                                            ▼            │
//! │                                           pretty JSON or summary line  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use kkm_client::prelude::*;
use kkm_client::{
    ClientError, ClientResult, DevOp, DeviceOperation, Envelope, KkmConfig, ServerOperation, SrvOp,
};

// =============================================================================
// Arguments
// =============================================================================

/// kkm - Client for the KKM fiscal register gateway
#[derive(Parser)]
#[command(name = "kkm", version, about)]
struct Cli {
    /// Config file (defaults to the platform config dir's kkm.toml)
    #[arg(short, long, env = "KKM_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Gateway host, overrides config
    #[arg(long, global = true)]
    host: Option<String>,

    /// Shared secret, overrides config
    #[arg(long, global = true)]
    secret: Option<String>,

    /// Device serial number, overrides config
    #[arg(long, global = true)]
    serial: Option<String>,

    /// Verify the gateway's TLS certificate
    #[arg(long, global = true)]
    verify_tls: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run an operation on the configured device
    Device(SendArgs),
    /// Run a gateway-level operation
    Server(SendArgs),
    /// Search for a device on a connection and register it
    Learn {
        /// Connection string, e.g. "com,4" or "tcpip,10.0.0.5"
        conn_params: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct SendArgs {
    /// Operation kind, e.g. "status", "sell", "report-x", "ping"
    kind: String,

    /// Bulk details as a JSON object
    #[arg(short, long)]
    details: Option<String>,

    /// Pin the idempotency key instead of generating one
    #[arg(short, long)]
    key: Option<String>,

    /// Skip operator and customer defaults from config
    #[arg(long)]
    no_defaults: bool,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct OutputArgs {
    /// Send the same request N times (mutating requests reuse one key)
    #[arg(long, default_value = "1")]
    repeat: u32,

    /// Print the one-line summary instead of the full envelope
    #[arg(short, long)]
    summary: bool,
}

// =============================================================================
// Prepared Operations
// =============================================================================

/// Common surface of device and server dispatch.
trait Prepared {
    fn method_path(&self) -> String;
    fn is_get(&self) -> bool;
    fn set_key(&mut self, key: Option<&str>);
    fn merge(&mut self, details: &Map<String, Value>, ignore_unknown: bool) -> ClientResult<()>;
    fn send(&self) -> ClientResult<Envelope>;
}

macro_rules! impl_prepared {
    ($($ty:ty),*) => {
        $(
            impl Prepared for $ty {
                fn method_path(&self) -> String {
                    <$ty>::method_path(self)
                }

                fn is_get(&self) -> bool {
                    <$ty>::is_get(self)
                }

                fn set_key(&mut self, key: Option<&str>) {
                    self.set_idempotency_key(key);
                }

                fn merge(
                    &mut self,
                    details: &Map<String, Value>,
                    ignore_unknown: bool,
                ) -> ClientResult<()> {
                    self.set_details(details, ignore_unknown)?;
                    Ok(())
                }

                fn send(&self) -> ClientResult<Envelope> {
                    self.perform()
                }
            }
        )*
    };
}

impl_prepared!(DeviceOperation, ServerOperation);

// =============================================================================
// Entry Point
// =============================================================================

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "info",
        1 => "kkm_client=debug,info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    match &cli.command {
        Command::Device(args) => {
            let kind: DevOp = args.kind.parse()?;
            let mut op = config.device()?.prepare(kind);
            prepare(&mut op, &config, args)?;
            run(&op, &args.output)
        }
        Command::Server(args) => {
            let kind: SrvOp = args.kind.parse()?;
            let mut op = config.server()?.prepare(kind);
            prepare(&mut op, &config, args)?;
            run(&op, &args.output)
        }
        Command::Learn {
            conn_params,
            output,
        } => {
            let mut learn = config.server()?.learn();
            learn.set_conn_params(conn_params).set_idempotency_key(None);
            for _ in 0..output.repeat.max(1) {
                print_envelope(&learn.perform()?, output.summary)?;
            }
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> ClientResult<KkmConfig> {
    let mut config = KkmConfig::read(cli.config.clone())?;

    if let Some(host) = &cli.host {
        config.connection.host = host.clone();
    }
    if let Some(secret) = &cli.secret {
        config.connection.secret = secret.clone();
    }
    if let Some(serial) = &cli.serial {
        config.connection.serial = serial.clone();
    }
    if cli.verify_tls {
        config.transport.verify_tls = true;
    }

    config.validate()?;
    Ok(config)
}

/// Config defaults first, then the caller's own JSON on top.
fn prepare(op: &mut impl Prepared, config: &KkmConfig, args: &SendArgs) -> ClientResult<()> {
    if !args.no_defaults {
        op.merge(&config.operation_defaults()?, true)?;
    }

    if let Some(raw) = &args.details {
        op.merge(&parse_details(raw)?, false)?;
    }

    // Mutating requests get one key for every repeat.
    if args.key.is_some() || !op.is_get() {
        op.set_key(args.key.as_deref());
    }

    debug!(path = %op.method_path(), "Operation prepared");
    Ok(())
}

fn run(op: &impl Prepared, output: &OutputArgs) -> Result<(), Box<dyn Error>> {
    let repeat = output.repeat.max(1);
    for round in 1..=repeat {
        let envelope = op.send()?;
        if repeat > 1 {
            info!(round, of = repeat, status = envelope.http_status(), "Request sent");
        }
        print_envelope(&envelope, output.summary)?;
    }
    Ok(())
}

fn parse_details(raw: &str) -> ClientResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(ClientError::SerializationFailed(
            "--details must be a JSON object".into(),
        )),
    }
}

fn print_envelope(envelope: &Envelope, summary: bool) -> Result<(), Box<dyn Error>> {
    if summary {
        println!("{}", envelope);
    } else {
        println!("{}", serde_json::to_string_pretty(envelope)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_details() {
        let map = parse_details(r#"{"cashSum": 100.5}"#).unwrap();
        assert_eq!(map.get("cashSum"), Some(&Value::from(100.5)));

        assert!(parse_details("[1, 2]").unwrap_err().is_validation_error());
        assert!(parse_details("{oops").unwrap_err().is_validation_error());
    }

    #[test]
    fn test_cli_shape() {
        let cli = Cli::try_parse_from([
            "kkm",
            "device",
            "sell",
            "--details",
            "{}",
            "--repeat",
            "3",
            "--serial",
            "11111111111111",
        ])
        .unwrap();

        assert_eq!(cli.serial.as_deref(), Some("11111111111111"));
        match cli.command {
            Command::Device(args) => {
                assert_eq!(args.kind, "sell");
                assert_eq!(args.output.repeat, 3);
                assert!(!args.output.summary);
            }
            _ => panic!("expected device command"),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
