//! Runtime utilities that abstract over the underlying async executor.
//!
//! We wrap Tokio's runtime primitives so that downstream crates never need to
//! depend on Tokio directly.

use std::io;

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a lightweight current-thread
/// runtime.
///
/// Intended for synchronous callers (the bridge controller's blocking wait).
/// Must not be called from inside another Tokio runtime.
///
/// # Errors
///
/// Returns the I/O error raised while building the runtime.
pub fn block_on<F>(future: F) -> io::Result<F::Output>
where
    F: std::future::Future,
{
    let runtime = Builder::new_current_thread().enable_time().build()?;
    Ok(runtime.block_on(future))
}

/// Returns `true` when the calling thread is already inside a Tokio runtime.
///
/// [`block_on`] panics in that situation, so callers check first.
pub fn in_runtime() -> bool {
    Handle::try_current().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_on_returns_output() {
        let value = block_on(async { 21 * 2 }).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_not_in_runtime_on_plain_thread() {
        assert!(!in_runtime());
    }

    #[tokio::test]
    async fn test_in_runtime_inside_tokio() {
        assert!(in_runtime());
    }
}
