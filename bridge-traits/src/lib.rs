//! # Host Bridge Traits
//!
//! The contract between the resolve bridge and the asynchronous resolver
//! library it drives.
//!
//! ## Overview
//!
//! The bridge core never talks to a concrete resolver. It depends on the
//! traits in this crate, and each host ships (or injects) an implementation:
//!
//! | Host     | Implementation Crate | Notes |
//! |----------|---------------------|-------|
//! | Desktop  | `bridge-desktop`    | UDP stub resolver, Unix `poll(2)` descriptors |
//! | Tests    | in-crate fakes      | Socket-pair backed scripted libraries |
//!
//! ## Traits
//!
//! - [`ResolverLibrary`](resolver::ResolverLibrary) - Process-wide init/cleanup and channel factory
//! - [`ResolverChannel`](resolver::ResolverChannel) - Submit, interest, timeout, process
//!
//! ## Error Handling
//!
//! Library calls return [`BridgeError`](error::BridgeError). Outcomes of the
//! queries themselves are not errors: they travel to the completion callback
//! as a [`ResolveCode`](query::ResolveCode).
//!
//! ## Thread Safety
//!
//! Libraries are `Send + Sync` so one instance can be shared by the
//! controller and successive workers. Channels are only `Send`: a channel
//! moves into a worker thread and stays there.

pub mod error;
pub mod query;
pub mod resolver;

pub use error::BridgeError;

pub use query::{AddressFamily, HostQuery, QueryOutcome, ResolveCode};
pub use resolver::{
    CompletionCallback, Interest, InterestSet, LibraryGuard, ReadySet, ResolverChannel,
    ResolverLibrary,
};
