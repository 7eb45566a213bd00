//! Bridge controller: the synchronous `start` / `fetch` surface.

use bridge_traits::{HostQuery, ResolverLibrary};
use core_runtime::config::BridgeConfig;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{BridgeError, Result};
use crate::slot::{ResultSlot, Snapshot, Status};
use crate::worker::{Worker, WorkerState};

#[derive(Default)]
struct ControllerState {
    next_run: u64,
    current_run: u64,
    handle: Option<JoinHandle<()>>,
    /// A `shutdown` took the handle and is joining it outside the lock
    joining: bool,
}

/// Owns the result slot and at most one live worker thread.
///
/// `start` and `fetch` may be called from any thread. Neither waits for the
/// worker, not even while another thread is inside
/// [`shutdown`](Self::shutdown). Only [`wait_ready`](Self::wait_ready) and
/// `shutdown` block.
pub struct BridgeController {
    library: Arc<dyn ResolverLibrary>,
    config: BridgeConfig,
    slot: Arc<ResultSlot>,
    state: Mutex<ControllerState>,
}

impl BridgeController {
    pub fn new(library: Arc<dyn ResolverLibrary>, config: BridgeConfig) -> Self {
        Self {
            library,
            config,
            slot: Arc::new(ResultSlot::new()),
            state: Mutex::new(ControllerState::default()),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Spawn a worker resolving `query`, or the configured default query.
    ///
    /// Returns the new run id as soon as the thread is spawned.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::AlreadyRunning`] while the previous worker is alive.
    ///   The slot is left untouched.
    /// - [`BridgeError::Spawn`] when the thread cannot be created. The slot
    ///   then reports [`Status::SubmissionFailed`] for the new run.
    pub fn start(&self, query: Option<HostQuery>) -> Result<u64> {
        let mut state = self.state.lock();

        if state.joining {
            debug!(run = state.current_run, "start rejected, worker being joined");
            return Err(BridgeError::AlreadyRunning {
                run: state.current_run,
            });
        }
        if let Some(handle) = &state.handle {
            if !handle.is_finished() {
                debug!(run = state.current_run, "start rejected, worker still running");
                return Err(BridgeError::AlreadyRunning {
                    run: state.current_run,
                });
            }
        }
        if let Some(handle) = state.handle.take() {
            reap(handle, state.current_run);
        }

        state.next_run += 1;
        let run = state.next_run;
        state.current_run = run;

        let query = query.unwrap_or_else(|| self.config.default_query.clone());
        // Reset before spawning so a fast worker's write is never overwritten.
        self.slot.reset(run);

        let worker = Worker::new(
            run,
            query.clone(),
            Arc::clone(&self.library),
            Arc::clone(&self.slot),
        );
        let spawned = thread::Builder::new()
            .name(self.config.worker_thread_name.clone())
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                state.handle = Some(handle);
                info!(run, query = %query, "worker spawned");
                Ok(run)
            }
            Err(err) => {
                error!(run, error = %err, "failed to spawn worker thread");
                self.slot.publish(run, Status::SubmissionFailed, None);
                Err(BridgeError::Spawn(err))
            }
        }
    }

    /// Current contents of the slot. Never blocks on the worker.
    pub fn fetch(&self) -> Snapshot {
        self.slot.snapshot()
    }

    pub fn state(&self) -> WorkerState {
        let state = self.state.lock();
        match &state.handle {
            _ if state.joining => WorkerState::Running,
            Some(handle) if !handle.is_finished() => WorkerState::Running,
            _ if state.next_run == 0 => WorkerState::Idle,
            _ => WorkerState::Completed,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == WorkerState::Running
    }

    /// Block until the current run has an outcome or `timeout` elapses.
    ///
    /// Returns `None` on timeout. Must not be called from inside an async
    /// runtime.
    pub fn wait_ready(&self, timeout: Duration) -> Result<Option<Snapshot>> {
        self.slot.wait_ready(timeout)
    }

    /// Join the worker thread, if any.
    ///
    /// Blocks until the worker's event loop drains. The lock is released
    /// during the join; `start` calls made meanwhile fail with
    /// [`BridgeError::AlreadyRunning`].
    pub fn shutdown(&self) {
        let (handle, run) = {
            let mut state = self.state.lock();
            let Some(handle) = state.handle.take() else {
                return;
            };
            state.joining = true;
            (handle, state.current_run)
        };

        debug!(run, "joining worker");
        reap(handle, run);
        self.state.lock().joining = false;
    }

    pub fn slot(&self) -> &Arc<ResultSlot> {
        &self.slot
    }
}

fn reap(handle: JoinHandle<()>, run: u64) {
    if handle.join().is_err() {
        warn!(run, "worker thread panicked");
    }
}

impl Drop for BridgeController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for BridgeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeController")
            .field("state", &self.state())
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}
