//! # Core Configuration Module
//!
//! Provides configuration management for the resolve bridge.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `BridgeConfig`. Validation happens in [`BridgeConfigBuilder::build`] so a
//! bad setting fails at startup with an actionable message instead of
//! surfacing later as a confusing worker failure.
//!
//! ## Settings
//!
//! - Default query (target name and address family) used when `start` is
//!   called without arguments
//! - Nameserver override (otherwise the resolver library uses the system's)
//! - Per-query timeout
//! - Hosts file toggle and path override
//! - Worker thread name
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::BridgeConfig;
//! use std::time::Duration;
//!
//! let config = BridgeConfig::builder()
//!     .default_target("example.com")
//!     .query_timeout(Duration::from_secs(2))
//!     .build()
//!     .expect("valid configuration");
//!
//! assert_eq!(config.default_query.name, "example.com");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::BridgeConfig;
//!
//! // Empty targets are rejected up front.
//! let config = BridgeConfig::builder()
//!     .default_target("")
//!     .build()
//!     .expect("Should fail - empty target");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{AddressFamily, HostQuery};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Target resolved when the host does not supply one.
pub const DEFAULT_TARGET: &str = "google.com";

/// Name given to the worker thread.
pub const DEFAULT_WORKER_THREAD_NAME: &str = "resolver-worker";

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);
const MIN_QUERY_TIMEOUT: Duration = Duration::from_millis(1);
const MAX_QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for the bridge and the resolver library it drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Query submitted by `start` when the host passes none
    pub default_query: HostQuery,

    /// Nameservers to use instead of the system configuration
    pub nameservers: Option<Vec<SocketAddr>>,

    /// How long a single query may stay unanswered
    pub query_timeout: Duration,

    /// Consult the hosts file before the network
    pub use_hosts_file: bool,

    /// Hosts file to read instead of the system default
    pub hosts_file: Option<PathBuf>,

    /// Name given to worker threads
    pub worker_thread_name: String,
}

impl BridgeConfig {
    /// Create a new configuration builder.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_query: HostQuery::new(DEFAULT_TARGET, AddressFamily::Inet),
            nameservers: None,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            use_hosts_file: true,
            hosts_file: None,
            worker_thread_name: DEFAULT_WORKER_THREAD_NAME.to_string(),
        }
    }
}

/// Builder for [`BridgeConfig`].
#[derive(Debug, Default)]
pub struct BridgeConfigBuilder {
    default_target: Option<String>,
    default_family: Option<AddressFamily>,
    nameservers: Option<Vec<SocketAddr>>,
    query_timeout: Option<Duration>,
    use_hosts_file: Option<bool>,
    hosts_file: Option<PathBuf>,
    worker_thread_name: Option<String>,
}

impl BridgeConfigBuilder {
    /// Set the target resolved by a bare `start`.
    pub fn default_target(mut self, target: impl Into<String>) -> Self {
        self.default_target = Some(target.into());
        self
    }

    /// Set the address family of the default query.
    pub fn default_family(mut self, family: AddressFamily) -> Self {
        self.default_family = Some(family);
        self
    }

    /// Use these nameservers instead of the system's.
    pub fn nameservers(mut self, nameservers: Vec<SocketAddr>) -> Self {
        self.nameservers = Some(nameservers);
        self
    }

    /// Add one nameserver to the override list.
    pub fn nameserver(mut self, nameserver: SocketAddr) -> Self {
        self.nameservers
            .get_or_insert_with(Vec::new)
            .push(nameserver);
        self
    }

    /// Set the per-query timeout.
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Enable or disable hosts file lookups.
    pub fn use_hosts_file(mut self, enabled: bool) -> Self {
        self.use_hosts_file = Some(enabled);
        self
    }

    /// Read this hosts file instead of the system default.
    pub fn hosts_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.hosts_file = Some(path.into());
        self
    }

    /// Set the worker thread name.
    pub fn worker_thread_name(mut self, name: impl Into<String>) -> Self {
        self.worker_thread_name = Some(name.into());
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when:
    /// - the default target is empty or contains whitespace
    /// - an explicit nameserver list is empty
    /// - the query timeout is outside 1 ms ..= 60 s
    /// - the worker thread name is empty or contains a NUL byte
    pub fn build(self) -> Result<BridgeConfig> {
        let defaults = BridgeConfig::default();

        let target = self
            .default_target
            .unwrap_or(defaults.default_query.name);
        if target.is_empty() || target.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!(
                "Default target '{}' must be a non-empty name without whitespace",
                target
            )));
        }

        if let Some(servers) = &self.nameservers {
            if servers.is_empty() {
                return Err(Error::Config(
                    "Nameserver override is empty. Omit it to use the system resolver \
                     configuration."
                        .to_string(),
                ));
            }
        }

        let query_timeout = self.query_timeout.unwrap_or(defaults.query_timeout);
        if !(MIN_QUERY_TIMEOUT..=MAX_QUERY_TIMEOUT).contains(&query_timeout) {
            return Err(Error::Config(format!(
                "Query timeout {:?} is outside the supported range {:?}..={:?}",
                query_timeout, MIN_QUERY_TIMEOUT, MAX_QUERY_TIMEOUT
            )));
        }

        let worker_thread_name = self
            .worker_thread_name
            .unwrap_or(defaults.worker_thread_name);
        if worker_thread_name.is_empty() || worker_thread_name.contains('\0') {
            return Err(Error::Config(
                "Worker thread name must be non-empty and contain no NUL bytes".to_string(),
            ));
        }

        Ok(BridgeConfig {
            default_query: HostQuery::new(
                target,
                self.default_family
                    .unwrap_or(defaults.default_query.family),
            ),
            nameservers: self.nameservers,
            query_timeout,
            use_hosts_file: self.use_hosts_file.unwrap_or(defaults.use_hosts_file),
            hosts_file: self.hosts_file,
            worker_thread_name,
        })
    }
}
