//! # Resolve Bridge Core
//!
//! Lets synchronous, stateless callers drive a callback-based asynchronous
//! resolver.
//!
//! ## Overview
//!
//! A host calls `start` to spawn a worker thread and `fetch`, at any later
//! point and from any thread, to read the outcome:
//!
//! - [`slot`] - Result slot holding status, payload and readiness as one value
//! - [`handler`] - Completion callback that writes the slot
//! - [`event_loop`] - `poll(2)` loop driving a resolver channel until idle
//! - [`worker`] - One run: init, submit, drain, teardown
//! - [`controller`] - `start` / `fetch`, single worker in flight
//! - [`command`] - Host command parsing and responses
//!
//! ## Usage
//!
//! ```ignore
//! use core_bridge::BridgeController;
//!
//! let controller = BridgeController::new(library, config);
//! controller.start(None)?;
//! // ... later, possibly from another thread
//! let snapshot = controller.fetch();
//! if let Some(address) = snapshot.address() {
//!     println!("{address}");
//! }
//! ```

pub mod command;
pub mod controller;
pub mod error;
pub mod event_loop;
pub mod handler;
pub mod slot;
pub mod worker;

pub use command::{Command, Response};
pub use controller::BridgeController;
pub use error::{BridgeError, Result};
pub use event_loop::LoopStats;
pub use slot::{ResultSlot, Snapshot, Status};
pub use worker::{WorkerFailure, WorkerState};
