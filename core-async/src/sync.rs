//! Synchronization primitives.
//!
//! The resolve bridge publishes results through a single-slot channel with
//! one writer and many readers. Tokio's `watch` channel has exactly that
//! shape: every value is replaced as a whole under its internal lock, so a
//! reader can never observe half of one value and half of another.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::watch;
//!
//! let (tx, rx) = watch::channel((false, 0u64));
//! tx.send_replace((true, 1));
//! assert_eq!(*rx.borrow(), (true, 1));
//! ```

pub use tokio::sync::watch;
