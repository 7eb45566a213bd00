use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bridge_traits::AddressFamily;
use clap::Parser;
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use resolve_bridge::{desktop_controller, BridgeConfig, Response};
use serde_json::json;
use tracing::{info, warn};

/// Reads `start` / `fetch` commands from stdin, one per line, and prints
/// each result on stdout. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "resolve-bridge", version, about = "Synchronous start/fetch host for the async resolver")]
struct Cli {
    /// Nameserver to query instead of the system's (repeatable)
    #[arg(long = "nameserver", value_name = "ADDR:PORT")]
    nameservers: Vec<SocketAddr>,

    /// Per-query timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Name resolved by a bare `start`
    #[arg(long)]
    target: Option<String>,

    /// Address family for a bare `start` (inet or inet6)
    #[arg(long)]
    family: Option<AddressFamily>,

    /// Hosts file to consult instead of /etc/hosts
    #[arg(long, value_name = "PATH", conflicts_with = "no_hosts")]
    hosts_file: Option<PathBuf>,

    /// Skip the hosts file entirely
    #[arg(long)]
    no_hosts: bool,

    #[arg(long, default_value = "info")]
    log_level: LogLevel,

    /// pretty, compact or json
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Print one JSON object per result instead of plain text
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn bridge_config(&self) -> Result<BridgeConfig> {
        let mut builder = BridgeConfig::builder().use_hosts_file(!self.no_hosts);
        if !self.nameservers.is_empty() {
            builder = builder.nameservers(self.nameservers.clone());
        }
        if let Some(ms) = self.timeout_ms {
            builder = builder.query_timeout(Duration::from_millis(ms));
        }
        if let Some(target) = &self.target {
            builder = builder.default_target(target.clone());
        }
        if let Some(family) = self.family {
            builder = builder.default_family(family);
        }
        if let Some(path) = &self.hosts_file {
            builder = builder.hosts_file(path.clone());
        }
        builder.build().context("invalid bridge configuration")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(
        LoggingConfig::default()
            .with_format(cli.log_format.unwrap_or_default())
            .with_level(cli.log_level),
    )?;

    let config = cli.bridge_config()?;
    info!(default_query = %config.default_query, "resolve bridge ready");
    let controller = desktop_controller(config);

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read command")?;
        if line.trim().is_empty() {
            continue;
        }

        match controller.dispatch(&line) {
            Ok(response) => write_response(&mut stdout, &response, cli.json)?,
            Err(err) => {
                warn!(command = %line.trim(), error = %err, "command failed");
                if cli.json {
                    writeln!(stdout, "{}", json!({ "error": err.to_string() }))?;
                } else {
                    writeln!(stdout, "error: {}", err)?;
                }
            }
        }
        stdout.flush()?;
    }

    controller.shutdown();
    Ok(())
}

fn write_response(out: &mut impl Write, response: &Response, as_json: bool) -> io::Result<()> {
    if !as_json {
        return writeln!(out, "{}", response);
    }

    let value = match response {
        Response::Started { run } => json!({ "started": run }),
        Response::Snapshot(snapshot) => json!({
            "run": snapshot.run,
            "status": snapshot.status.code(),
            "ready": snapshot.ready,
            "ip": snapshot.address().unwrap_or_default(),
        }),
    };
    writeln!(out, "{}", value)
}
