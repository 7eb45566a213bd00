//! Completion handler handed to the resolver library.

use bridge_traits::{CompletionCallback, QueryOutcome, ResolveCode};
use std::sync::Arc;
use tracing::{info, warn};

use crate::slot::{ResultSlot, Status};

/// Build the callback for `run`. The library invokes it on the worker thread
/// when the submitted query finishes.
pub fn completion_handler(slot: Arc<ResultSlot>, run: u64) -> CompletionCallback {
    Box::new(move |outcome: QueryOutcome| {
        let (status, payload) = settle(&outcome);

        if status.is_success() {
            info!(
                run,
                address = payload.as_deref().unwrap_or_default(),
                timeouts = outcome.timeouts,
                "query resolved"
            );
        } else {
            warn!(run, status = %status, timeouts = outcome.timeouts, "query failed");
        }

        if !slot.publish(run, status, payload) {
            warn!(run, "discarding completion for a run that is no longer current");
        }
    })
}

/// Map a library outcome to the status and payload recorded in the slot.
///
/// A successful answer without any address counts as [`ResolveCode::NoData`].
pub fn settle(outcome: &QueryOutcome) -> (Status, Option<String>) {
    if !outcome.code.is_success() {
        return (Status::Completed(outcome.code), None);
    }

    match outcome.first_address() {
        Some(address) => (
            Status::Completed(ResolveCode::Success),
            Some(address.to_string()),
        ),
        None => (Status::Completed(ResolveCode::NoData), None),
    }
}
