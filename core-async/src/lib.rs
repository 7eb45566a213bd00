//! Runtime facade for the resolve bridge.
//!
//! The bridge itself is thread based: the worker drives a callback-style
//! resolver from a plain blocking thread. The few places that need async
//! primitives (the result slot's watch channel and the opt-in blocking wait
//! for completion) go through this crate so that no other crate in the
//! workspace depends on Tokio directly.
//!
//! # Modules
//!
//! - `runtime`: Drive a future to completion from synchronous code
//! - `sync`: Single-slot watch channel used for publishing results
//! - `time`: Durations, instants and future timeouts
//!
//! # Examples
//!
//! ```rust
//! use core_async::runtime::block_on;
//! use core_async::sync::watch;
//! use core_async::time::{timeout, Duration};
//!
//! let (tx, mut rx) = watch::channel(0u32);
//! tx.send_replace(7);
//!
//! let seen = block_on(async {
//!     timeout(Duration::from_millis(50), rx.wait_for(|v| *v == 7))
//!         .await
//!         .map(|waited| waited.map(|guard| *guard))
//! })
//! .unwrap();
//! assert_eq!(seen.ok().and_then(|r| r.ok()), Some(7));
//! ```

pub mod runtime;
pub mod sync;
pub mod time;

pub use time::{Duration, Instant};
