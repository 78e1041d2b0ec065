//! Restraint ledger command-line binary
//!
//! - `invoke <FUNCTION> [ARGS]...` runs one invocation and prints its payload
//! - `serve` reads JSON lines `{"fcn": "...", "args": [...]}` from stdin and
//!   answers each with one JSON response line on stdout
//!
//! Logs go to stderr so stdout only carries payloads.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use restraint_ledger::{
    actor::spawn_ledger_actor,
    dispatch::{dispatch, Response, Status},
    Config, Ledger,
};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Restrained value-transfer ledger
#[derive(Parser, Debug)]
#[command(name = "restraint-ledger", version, propagate_version = true)]
struct Cli {
    /// Configuration file (TOML). Environment variables apply when omitted.
    #[arg(long, short = 'c', env = "RESTRAINT_LEDGER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the RocksDB data directory
    #[arg(long, short = 'd', global = true)]
    data_dir: Option<PathBuf>,

    /// Print Prometheus metrics to stderr on exit
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single invocation
    Invoke {
        /// Function name, e.g. `transfer`
        function: String,
        /// Positional arguments (negative amounts are passed through)
        #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
        args: Vec<String>,
    },
    /// Serve JSON-line invocations from stdin
    Serve,
}

#[derive(Debug, Deserialize)]
struct Request {
    fcn: String,
    #[serde(default)]
    args: Vec<String>,
}

#[derive(Debug, Serialize)]
struct WireResponse {
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

impl From<Response> for WireResponse {
    fn from(response: Response) -> Self {
        Self {
            status: response.status,
            payload: response
                .payload
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
            message: response.message,
            kind: response.error_kind,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        data_dir = %config.data_dir.display(),
        "Starting restraint ledger"
    );

    let ledger = Ledger::open(&config)
        .with_context(|| format!("failed to open ledger at {}", config.data_dir.display()))?;

    let metrics = ledger.metrics().clone();

    let result = match cli.command {
        Command::Invoke { function, args } => {
            let response = dispatch(&ledger, &function, &args);
            if response.is_ok() {
                if let Some(payload) = &response.payload {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(payload)?;
                    writeln!(stdout)?;
                }
                Ok(())
            } else {
                Err(anyhow::anyhow!("{} failed: {}", function, response.message))
            }
        }
        Command::Serve => serve(ledger, config.mailbox_capacity).await,
    };

    if cli.metrics {
        let text = metrics.encode().context("failed to encode metrics")?;
        std::io::stderr().write_all(text.as_bytes())?;
    }

    result
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::from_env()?,
    };

    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }

    Ok(config)
}

async fn serve(ledger: Ledger, mailbox_capacity: usize) -> Result<()> {
    let handle = spawn_ledger_actor(ledger, mailbox_capacity);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    tracing::info!("Serving invocations from stdin");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let wire: WireResponse = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle.invoke(&request.fcn, &request.args).await?.into(),
            Err(e) => WireResponse {
                status: Status::Error,
                payload: None,
                message: format!("malformed request: {}", e),
                kind: Some("InvalidArgument"),
            },
        };

        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer(&mut stdout, &wire)?;
        writeln!(stdout)?;
        stdout.flush()?;
    }

    handle.shutdown().await?;
    tracing::info!("Shutting down restraint ledger");
    Ok(())
}
