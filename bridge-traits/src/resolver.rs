//! Resolver Library Abstraction
//!
//! The contract a callback-driven asynchronous resolver must satisfy to be
//! driven by the bridge worker.
//!
//! A library is split in two halves, mirroring how stub resolvers are
//! usually built:
//!
//! - [`ResolverLibrary`] owns process-wide setup and teardown and hands out
//!   channels.
//! - [`ResolverChannel`] groups in-flight queries. It never does blocking
//!   I/O itself: the caller asks it which descriptors it is waiting on
//!   ([`interest`](ResolverChannel::interest)) and for how long
//!   ([`timeout`](ResolverChannel::timeout)), waits on its own, and then
//!   hands readiness back through [`process`](ResolverChannel::process),
//!   which is where completion callbacks run.
//!
//! Dropping a channel destroys it. Queries still pending at that point must
//! complete with [`ResolveCode::Destruction`](crate::query::ResolveCode).
//!
//! # Example
//!
//! ```ignore
//! use bridge_traits::resolver::{LibraryGuard, ResolverLibrary};
//!
//! fn drive(library: Arc<dyn ResolverLibrary>, query: HostQuery) -> Result<()> {
//!     let _guard = LibraryGuard::acquire(library.clone())?;
//!     let mut channel = library.create_channel()?;
//!     channel.submit(&query, Box::new(|outcome| println!("{:?}", outcome)))?;
//!     while !channel.interest().is_empty() {
//!         let ready = wait_somehow(&channel.interest(), channel.timeout());
//!         channel.process(&ready);
//!     }
//!     Ok(())
//! }
//! ```

use std::os::fd::RawFd;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::query::{HostQuery, QueryOutcome};

/// Callback invoked exactly once when a submitted query finishes.
pub type CompletionCallback = Box<dyn FnOnce(QueryOutcome) + Send + 'static>;

/// One descriptor the channel is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interest {
    pub fd: RawFd,
    pub readable: bool,
    pub writable: bool,
}

impl Interest {
    pub fn readable(fd: RawFd) -> Self {
        Self {
            fd,
            readable: true,
            writable: false,
        }
    }

    pub fn writable(fd: RawFd) -> Self {
        Self {
            fd,
            readable: false,
            writable: true,
        }
    }
}

/// Descriptors a channel needs watched before it can make progress.
///
/// An empty set means the channel has no pending work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterestSet {
    entries: Vec<Interest>,
}

impl InterestSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interest: Interest) {
        self.entries.push(interest);
    }

    /// Number of descriptors being watched.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interest> {
        self.entries.iter()
    }
}

impl FromIterator<Interest> for InterestSet {
    fn from_iter<I: IntoIterator<Item = Interest>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Descriptors reported ready by a multiplexing wait.
///
/// Empty when the wait ended because the timeout elapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadySet {
    readable: Vec<RawFd>,
    writable: Vec<RawFd>,
}

impl ReadySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_readable(&mut self, fd: RawFd) {
        self.readable.push(fd);
    }

    pub fn mark_writable(&mut self, fd: RawFd) {
        self.writable.push(fd);
    }

    pub fn is_readable(&self, fd: RawFd) -> bool {
        self.readable.contains(&fd)
    }

    pub fn is_writable(&self, fd: RawFd) -> bool {
        self.writable.contains(&fd)
    }

    /// `true` when nothing became ready (the wait timed out).
    pub fn is_empty(&self) -> bool {
        self.readable.is_empty() && self.writable.is_empty()
    }
}

/// Process-wide half of a resolver library.
///
/// `init` and `cleanup` must be called in pairs; prefer [`LibraryGuard`],
/// which guarantees the pairing.
pub trait ResolverLibrary: Send + Sync {
    /// Set up process-wide resources.
    fn init(&self) -> Result<()>;

    /// Release what the matching `init` set up.
    fn cleanup(&self);

    /// Create a fresh channel. Channels are never shared between workers.
    fn create_channel(&self) -> Result<Box<dyn ResolverChannel>>;
}

/// A group of in-flight queries driven by an external event loop.
pub trait ResolverChannel: Send {
    /// Register a query.
    ///
    /// When this returns `Ok`, `callback` will be invoked exactly once,
    /// either from a later [`process`](Self::process) call, from this call
    /// itself when the answer is known immediately, or when the channel is
    /// dropped. When it returns `Err`, `callback` is never invoked.
    fn submit(&mut self, query: &HostQuery, callback: CompletionCallback) -> Result<()>;

    /// Descriptors to wait on. Empty when nothing is pending.
    fn interest(&self) -> InterestSet;

    /// Longest the caller should wait before calling [`process`](Self::process)
    /// again. `None` means wait for readiness with no deadline.
    fn timeout(&self) -> Option<Duration>;

    /// Handle readiness and expired deadlines, running any due callbacks.
    fn process(&mut self, ready: &ReadySet);
}

/// Keeps a library initialized for as long as it lives.
pub struct LibraryGuard {
    library: Arc<dyn ResolverLibrary>,
}

impl LibraryGuard {
    /// Initialize `library`, returning a guard that cleans it up on drop.
    pub fn acquire(library: Arc<dyn ResolverLibrary>) -> Result<Self> {
        library.init()?;
        Ok(Self { library })
    }

    pub fn library(&self) -> &Arc<dyn ResolverLibrary> {
        &self.library
    }
}

impl Drop for LibraryGuard {
    fn drop(&mut self) {
        self.library.cleanup();
    }
}

impl std::fmt::Debug for LibraryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryGuard").finish_non_exhaustive()
    }
}
