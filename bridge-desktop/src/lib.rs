//! # Desktop Bridge Implementations
//!
//! Default resolver library for desktop platforms (Linux, macOS and other
//! Unix systems).
//!
//! ## Overview
//!
//! [`SystemResolver`] implements the `ResolverLibrary` contract from
//! `bridge-traits` as a small stub resolver:
//! - IP literals and `/etc/hosts` entries are answered immediately
//! - Everything else is sent as a recursive A/AAAA query over UDP to the
//!   first nameserver from `/etc/resolv.conf` (or the configured override)
//! - Sockets are non-blocking and exposed to the caller's `poll(2)` loop;
//!   the library never blocks on its own
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ResolverOptions, SystemResolver};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let options = ResolverOptions::system().with_query_timeout(Duration::from_secs(2));
//! let library = Arc::new(SystemResolver::new(options));
//! // Hand `library` to the bridge controller.
//! ```

mod channel;
mod resolver;
pub mod system;
pub mod wire;

pub use channel::UdpChannel;
pub use resolver::{ResolverOptions, SystemResolver, DEFAULT_QUERY_TIMEOUT};
pub use system::HostsFile;
