//! Host commands.
//!
//! Hosts talk to the bridge with two words: `start` (also accepted as
//! `init`) and `fetch`. `start` optionally takes the name to resolve and an
//! address family:
//!
//! ```text
//! start
//! start example.com
//! start example.com inet6
//! fetch
//! ```

use bridge_traits::{AddressFamily, HostQuery};
use std::fmt;
use std::str::FromStr;

use crate::controller::BridgeController;
use crate::error::{BridgeError, Result};
use crate::slot::Snapshot;

/// A parsed host command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Spawn a worker; `None` resolves the configured default query
    Start(Option<HostQuery>),
    /// Read the slot
    Fetch,
}

impl FromStr for Command {
    type Err = BridgeError;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| BridgeError::UnknownCommand("(empty)".to_string()))?;
        let args: Vec<&str> = words.collect();

        match verb {
            "start" | "init" => parse_start(&args),
            "fetch" if args.is_empty() => Ok(Command::Fetch),
            "fetch" => Err(BridgeError::InvalidCommand(format!(
                "fetch takes no arguments, got {}",
                args.len()
            ))),
            other => Err(BridgeError::UnknownCommand(other.to_string())),
        }
    }
}

fn parse_start(args: &[&str]) -> Result<Command> {
    match args {
        [] => Ok(Command::Start(None)),
        [name] => Ok(Command::Start(Some(HostQuery::new(
            *name,
            AddressFamily::default(),
        )))),
        [name, family] => {
            let family = family
                .parse::<AddressFamily>()
                .map_err(|err| BridgeError::InvalidCommand(err.to_string()))?;
            Ok(Command::Start(Some(HostQuery::new(*name, family))))
        }
        _ => Err(BridgeError::InvalidCommand(
            "usage: start [<name> [inet|inet6]]".to_string(),
        )),
    }
}

/// What a successfully executed command hands back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Started { run: u64 },
    Snapshot(Snapshot),
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Started { run } => write!(f, "started run {}", run),
            Response::Snapshot(snapshot) => write!(
                f,
                "status: {}\nip: {}",
                snapshot.status.code(),
                snapshot.address().unwrap_or_default()
            ),
        }
    }
}

impl BridgeController {
    /// Run a parsed command.
    pub fn execute(&self, command: Command) -> Result<Response> {
        match command {
            Command::Start(query) => self.start(query).map(|run| Response::Started { run }),
            Command::Fetch => Ok(Response::Snapshot(self.fetch())),
        }
    }

    /// Parse and run one line of host input.
    pub fn dispatch(&self, line: &str) -> Result<Response> {
        self.execute(line.parse()?)
    }
}
