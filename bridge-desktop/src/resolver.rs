//! Desktop resolver library.

use bridge_traits::{
    error::{BridgeError, Result},
    ResolverChannel, ResolverLibrary,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::channel::UdpChannel;
use crate::system::{self, DEFAULT_HOSTS_FILE, DEFAULT_RESOLV_CONF};

/// Default per-query timeout.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings shared by every channel of a [`SystemResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Configured nameservers. Only the first entry is queried; there is no
    /// failover to the others.
    pub nameservers: Vec<SocketAddr>,
    /// How long a query may stay unanswered
    pub query_timeout: Duration,
    /// Hosts file consulted before the network, `None` to skip it
    pub hosts_file: Option<PathBuf>,
}

impl ResolverOptions {
    /// Options read from the system configuration files.
    pub fn system() -> Self {
        Self {
            nameservers: system::load_nameservers(Path::new(DEFAULT_RESOLV_CONF)),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            hosts_file: Some(PathBuf::from(DEFAULT_HOSTS_FILE)),
        }
    }

    pub fn with_nameservers(mut self, nameservers: Vec<SocketAddr>) -> Self {
        self.nameservers = nameservers;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_hosts_file(mut self, path: Option<PathBuf>) -> Self {
        self.hosts_file = path;
        self
    }
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self::system()
    }
}

/// Stub resolver that talks DNS over UDP to the configured nameservers.
///
/// Initialization is reference counted: every `init` must be matched by a
/// `cleanup`, and channels can only be created while at least one `init` is
/// outstanding.
#[derive(Debug)]
pub struct SystemResolver {
    options: Arc<ResolverOptions>,
    init_count: AtomicUsize,
}

impl SystemResolver {
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            options: Arc::new(options),
            init_count: AtomicUsize::new(0),
        }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn is_initialized(&self) -> bool {
        self.init_count.load(Ordering::Acquire) > 0
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new(ResolverOptions::system())
    }
}

impl ResolverLibrary for SystemResolver {
    fn init(&self) -> Result<()> {
        if self.options.nameservers.is_empty() && self.options.hosts_file.is_none() {
            return Err(BridgeError::InvalidQuery(
                "no nameservers and no hosts file configured".to_string(),
            ));
        }
        let previous = self.init_count.fetch_add(1, Ordering::AcqRel);
        debug!(count = previous + 1, "resolver library initialized");
        Ok(())
    }

    fn cleanup(&self) {
        let result = self
            .init_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            });
        match result {
            Ok(previous) => debug!(count = previous - 1, "resolver library cleaned up"),
            Err(_) => warn!("resolver library cleanup without matching init"),
        }
    }

    fn create_channel(&self) -> Result<Box<dyn ResolverChannel>> {
        if !self.is_initialized() {
            return Err(BridgeError::NotInitialized);
        }
        Ok(Box::new(UdpChannel::new(Arc::clone(&self.options))))
    }
}
