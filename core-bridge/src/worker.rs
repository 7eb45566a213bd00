//! Worker lifecycle.
//!
//! One worker serves one run: initialize the library, open a channel,
//! submit the query, drain the event loop, then tear everything down in
//! reverse order. Failures before the query is accepted are written to the
//! slot directly because no completion callback will ever fire for them.

use bridge_traits::{HostQuery, LibraryGuard, ResolverLibrary};
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, info_span, warn};

use crate::event_loop::{self, LoopStats};
use crate::handler::completion_handler;
use crate::slot::{ResultSlot, Status};

/// Where the controller's worker is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// No worker has been started
    Idle,
    /// A worker thread is alive
    Running,
    /// The last worker thread has exited
    Completed,
}

/// Why a worker stopped before its event loop drained.
#[derive(Error, Debug)]
pub enum WorkerFailure {
    #[error("resolver library initialization failed: {0}")]
    LibraryInit(#[source] bridge_traits::BridgeError),

    #[error("request submission failed: {0}")]
    Submission(#[source] bridge_traits::BridgeError),

    #[error("event loop failed: {0}")]
    EventLoop(#[source] io::Error),
}

impl WorkerFailure {
    /// Status the worker records for this failure, if any.
    ///
    /// Event loop failures record nothing: dropping the channel completes
    /// the pending query with `Destruction` instead.
    pub fn status(&self) -> Option<Status> {
        match self {
            WorkerFailure::LibraryInit(_) => Some(Status::LibraryInitFailed),
            WorkerFailure::Submission(_) => Some(Status::SubmissionFailed),
            WorkerFailure::EventLoop(_) => None,
        }
    }
}

/// Everything a worker thread needs for one run.
pub struct Worker {
    run: u64,
    query: HostQuery,
    library: Arc<dyn ResolverLibrary>,
    slot: Arc<ResultSlot>,
}

impl Worker {
    pub fn new(
        run: u64,
        query: HostQuery,
        library: Arc<dyn ResolverLibrary>,
        slot: Arc<ResultSlot>,
    ) -> Self {
        Self {
            run,
            query,
            library,
            slot,
        }
    }

    /// Run to completion on the current thread.
    pub fn run(self) {
        let span = info_span!(
            "worker",
            run = self.run,
            target = %self.query.name,
            family = %self.query.family
        );
        let _entered = span.enter();

        info!("worker started");
        match self.drive() {
            Ok(stats) => info!(
                iterations = stats.iterations,
                timeouts = stats.timeouts,
                "worker finished"
            ),
            Err(failure) => self.record(failure),
        }
    }

    fn drive(&self) -> Result<LoopStats, WorkerFailure> {
        let guard =
            LibraryGuard::acquire(Arc::clone(&self.library)).map_err(WorkerFailure::LibraryInit)?;
        let mut channel = guard
            .library()
            .create_channel()
            .map_err(WorkerFailure::LibraryInit)?;

        channel
            .submit(
                &self.query,
                completion_handler(Arc::clone(&self.slot), self.run),
            )
            .map_err(WorkerFailure::Submission)?;

        let drained = event_loop::run_until_idle(channel.as_mut());

        // Channel before library: destroying the channel may still run a
        // callback that needs the library alive.
        drop(channel);
        drop(guard);

        drained.map_err(WorkerFailure::EventLoop)
    }

    fn record(&self, failure: WorkerFailure) {
        match failure.status() {
            Some(status) => {
                error!(error = %failure, "worker failed");
                if !self.slot.publish(self.run, status, None) {
                    warn!("slot already settled, failure not recorded");
                }
            }
            None => error!(error = %failure, "worker stopped early"),
        }
    }
}
