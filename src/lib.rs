//! Workspace facade crate.
//!
//! Re-exports the bridge crates under one name and, with the default
//! `desktop-shims` feature, wires the desktop resolver to a
//! [`BridgeConfig`]. Host applications can depend on `resolve-bridge` alone
//! instead of pulling each workspace crate individually.

pub use bridge_traits as traits;
pub use core_bridge as bridge;
pub use core_runtime as runtime;

pub use core_bridge::{BridgeController, BridgeError, Command, Response, Snapshot, Status};
pub use core_runtime::config::BridgeConfig;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop as desktop;

/// Desktop resolver configured from `config`.
///
/// Nameservers fall back to the system configuration when `config` has no
/// override; the hosts file is skipped when `use_hosts_file` is off.
#[cfg(feature = "desktop-shims")]
pub fn desktop_library(config: &BridgeConfig) -> std::sync::Arc<bridge_desktop::SystemResolver> {
    use bridge_desktop::{system::DEFAULT_HOSTS_FILE, ResolverOptions, SystemResolver};
    use std::path::PathBuf;

    let mut options = ResolverOptions::system().with_query_timeout(config.query_timeout);
    if let Some(nameservers) = &config.nameservers {
        options = options.with_nameservers(nameservers.clone());
    }
    let hosts_file = config.use_hosts_file.then(|| {
        config
            .hosts_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HOSTS_FILE))
    });

    std::sync::Arc::new(SystemResolver::new(options.with_hosts_file(hosts_file)))
}

/// Controller over the desktop resolver.
#[cfg(feature = "desktop-shims")]
pub fn desktop_controller(config: BridgeConfig) -> BridgeController {
    BridgeController::new(desktop_library(&config), config)
}
