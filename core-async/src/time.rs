//! Time-related abstractions.
//!
//! Re-exports `tokio::time` for future timeouts alongside the standard
//! library's clock types.
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{timeout, Duration};
//!
//! # async fn example() {
//! let result = timeout(Duration::from_millis(10), async { 42 }).await;
//! assert_eq!(result.ok(), Some(42));
//! # }
//! ```

pub use tokio::time::{sleep, timeout, Timeout};

pub use std::time::{Duration, Instant};

pub use tokio::time::error::Elapsed;
