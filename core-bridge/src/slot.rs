//! Result slot shared between the worker and synchronous callers.
//!
//! The slot stores the whole `(run, status, payload, ready)` record as one
//! value inside a watch channel. Writers replace the record wholesale and
//! readers clone it under the channel's lock, so a reader sees either the
//! record before a write or the record after it, never a mix.

use bridge_traits::ResolveCode;
use core_async::{runtime, sync::watch, time};
use std::fmt;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Outcome recorded in the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing has been published for the current run yet
    Unresolved,
    /// The resolver library could not be initialized or gave no channel
    LibraryInitFailed,
    /// The library refused the request
    SubmissionFailed,
    /// The library completed the request with this code
    Completed(ResolveCode),
}

impl Status {
    pub const UNRESOLVED_CODE: i32 = -1;
    pub const LIBRARY_INIT_FAILED_CODE: i32 = -2;
    pub const SUBMISSION_FAILED_CODE: i32 = -3;

    /// Numeric code reported to hosts. Bridge-level statuses are negative so
    /// they never collide with library codes.
    pub fn code(self) -> i32 {
        match self {
            Status::Unresolved => Self::UNRESOLVED_CODE,
            Status::LibraryInitFailed => Self::LIBRARY_INIT_FAILED_CODE,
            Status::SubmissionFailed => Self::SUBMISSION_FAILED_CODE,
            Status::Completed(code) => code.code(),
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Status::Completed(ResolveCode::Success))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Unresolved => write!(f, "unresolved ({})", self.code()),
            Status::LibraryInitFailed => {
                write!(f, "resolver library initialization failed ({})", self.code())
            }
            Status::SubmissionFailed => write!(f, "request submission failed ({})", self.code()),
            Status::Completed(code) => write!(f, "{}", code),
        }
    }
}

/// Point-in-time copy of the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Worker run this record belongs to; 0 before the first start
    pub run: u64,
    pub status: Status,
    /// Resolved address; `None` unless `ready` and successful
    pub payload: Option<String>,
    pub ready: bool,
}

impl Snapshot {
    fn unresolved(run: u64) -> Self {
        Self {
            run,
            status: Status::Unresolved,
            payload: None,
            ready: false,
        }
    }

    /// The resolved address, only when the run finished successfully.
    pub fn address(&self) -> Option<&str> {
        if self.ready && self.status.is_success() {
            self.payload.as_deref()
        } else {
            None
        }
    }
}

/// Synchronized holder of the current run's outcome.
pub struct ResultSlot {
    tx: watch::Sender<Snapshot>,
}

impl ResultSlot {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::unresolved(0));
        Self { tx }
    }

    /// Atomic copy of the current record.
    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Start a new run: back to the sentinel, tagged with `run`.
    pub(crate) fn reset(&self, run: u64) {
        self.tx.send_replace(Snapshot::unresolved(run));
    }

    /// Record the final outcome of `run`.
    ///
    /// Returns `false` without writing when `run` is not the current run or
    /// the run already has a final outcome.
    pub(crate) fn publish(&self, run: u64, status: Status, payload: Option<String>) -> bool {
        self.tx.send_if_modified(|current| {
            if current.run != run || current.ready {
                return false;
            }
            *current = Snapshot {
                run,
                status,
                payload: if status.is_success() { payload } else { None },
                ready: true,
            };
            true
        })
    }

    /// Receiver notified on every reset and publish.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Block the calling thread until the current run is ready or `timeout`
    /// elapses. Returns `None` on timeout.
    ///
    /// # Errors
    ///
    /// Fails with [`BridgeError::WaitUnavailable`] when called from inside an
    /// async runtime.
    pub fn wait_ready(&self, timeout: Duration) -> Result<Option<Snapshot>> {
        if runtime::in_runtime() {
            return Err(BridgeError::WaitUnavailable(
                "called from inside an async runtime".to_string(),
            ));
        }

        let mut rx = self.subscribe();
        let waited = runtime::block_on(async move {
            time::timeout(timeout, async {
                rx.wait_for(|snapshot| snapshot.ready)
                    .await
                    .map(|guard| Snapshot::clone(&guard))
            })
            .await
        })
        .map_err(|err| BridgeError::WaitUnavailable(err.to_string()))?;

        Ok(waited.ok().and_then(|received| received.ok()))
    }
}

impl Default for ResultSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResultSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSlot")
            .field("current", &*self.tx.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_initial_snapshot_is_sentinel() {
        let slot = ResultSlot::new();
        let snapshot = slot.snapshot();
        assert_eq!(snapshot.run, 0);
        assert_eq!(snapshot.status, Status::Unresolved);
        assert_eq!(snapshot.status.code(), -1);
        assert!(!snapshot.ready);
        assert_eq!(snapshot.address(), None);
    }

    #[test]
    fn test_publish_then_reset() {
        let slot = ResultSlot::new();
        slot.reset(1);
        assert!(slot.publish(
            1,
            Status::Completed(ResolveCode::Success),
            Some("1.2.3.4".to_string())
        ));

        let snapshot = slot.snapshot();
        assert!(snapshot.ready);
        assert_eq!(snapshot.address(), Some("1.2.3.4"));

        slot.reset(2);
        let snapshot = slot.snapshot();
        assert_eq!(snapshot.run, 2);
        assert!(!snapshot.ready);
        assert_eq!(snapshot.payload, None);
    }

    #[test]
    fn test_single_write_per_run() {
        let slot = ResultSlot::new();
        slot.reset(1);
        assert!(slot.publish(1, Status::Completed(ResolveCode::NotFound), None));
        assert!(!slot.publish(
            1,
            Status::Completed(ResolveCode::Success),
            Some("9.9.9.9".to_string())
        ));
        assert_eq!(
            slot.snapshot().status,
            Status::Completed(ResolveCode::NotFound)
        );
    }

    #[test]
    fn test_stale_run_is_discarded() {
        let slot = ResultSlot::new();
        slot.reset(2);
        assert!(!slot.publish(
            1,
            Status::Completed(ResolveCode::Success),
            Some("1.1.1.1".to_string())
        ));
        assert_eq!(slot.snapshot().status, Status::Unresolved);
    }

    #[test]
    fn test_failure_never_carries_payload() {
        let slot = ResultSlot::new();
        slot.reset(1);
        slot.publish(
            1,
            Status::Completed(ResolveCode::ServFail),
            Some("leftover".to_string()),
        );
        assert_eq!(slot.snapshot().payload, None);
    }

    #[test]
    fn test_status_codes_are_distinct() {
        assert_eq!(Status::LibraryInitFailed.code(), -2);
        assert_eq!(Status::SubmissionFailed.code(), -3);
        assert_eq!(Status::Completed(ResolveCode::Success).code(), 0);
        assert_eq!(Status::Completed(ResolveCode::Timeout).code(), 12);
    }

    #[test]
    fn test_wait_ready_times_out() {
        let slot = ResultSlot::new();
        slot.reset(1);
        let waited = slot.wait_ready(Duration::from_millis(20)).unwrap();
        assert_eq!(waited, None);
    }

    #[test]
    fn test_wait_ready_sees_publish_from_other_thread() {
        let slot = Arc::new(ResultSlot::new());
        slot.reset(1);

        let writer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                slot.publish(
                    1,
                    Status::Completed(ResolveCode::Success),
                    Some("5.6.7.8".to_string()),
                );
            })
        };

        let snapshot = slot
            .wait_ready(Duration::from_secs(5))
            .unwrap()
            .expect("publish observed");
        assert_eq!(snapshot.address(), Some("5.6.7.8"));
        writer.join().unwrap();
    }

    #[tokio::test]
    async fn test_wait_ready_refused_inside_runtime() {
        let slot = ResultSlot::new();
        assert!(matches!(
            slot.wait_ready(Duration::from_millis(1)),
            Err(BridgeError::WaitUnavailable(_))
        ));
    }
}
