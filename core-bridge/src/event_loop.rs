//! Event loop runner.
//!
//! Drives a [`ResolverChannel`] until it reports no pending work: ask for
//! the descriptors it waits on and its timeout, block in `poll(2)`, then
//! hand the ready set back so the channel can run its callbacks.

use bridge_traits::{InterestSet, ReadySet, ResolverChannel};
use std::io;
use std::time::Duration;
use tracing::{debug, trace};

/// Counters collected while a loop ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Number of `process` calls
    pub iterations: u64,
    /// Iterations whose wait ended on the timeout rather than readiness
    pub timeouts: u64,
}

/// Run `channel` until its interest set is empty.
///
/// # Errors
///
/// Returns the `poll(2)` error when waiting fails for any reason other than
/// an interrupted system call. The channel is left as it was; the caller
/// decides whether to drop it.
pub fn run_until_idle(channel: &mut dyn ResolverChannel) -> io::Result<LoopStats> {
    let mut stats = LoopStats::default();

    loop {
        let interest = channel.interest();
        if interest.count() == 0 {
            debug!(
                iterations = stats.iterations,
                timeouts = stats.timeouts,
                "event loop drained"
            );
            return Ok(stats);
        }

        let timeout = channel.timeout();
        trace!(descriptors = interest.count(), ?timeout, "waiting for readiness");

        let ready = wait_ready(&interest, timeout)?;
        if ready.is_empty() {
            stats.timeouts += 1;
        }

        channel.process(&ready);
        stats.iterations += 1;
        debug!(iteration = stats.iterations, timed_out = ready.is_empty(), "processed events");
    }
}

/// Block until a descriptor in `interest` is ready or `timeout` elapses.
///
/// `None` waits with no deadline. An empty [`ReadySet`] means the wait
/// timed out. Interrupted waits are retried with the same timeout.
pub fn wait_ready(interest: &InterestSet, timeout: Option<Duration>) -> io::Result<ReadySet> {
    let mut fds: Vec<libc::pollfd> = interest
        .iter()
        .map(|entry| {
            let mut events = 0;
            if entry.readable {
                events |= libc::POLLIN;
            }
            if entry.writable {
                events |= libc::POLLOUT;
            }
            libc::pollfd {
                fd: entry.fd,
                events,
                revents: 0,
            }
        })
        .collect();

    let timeout_ms = poll_timeout(timeout);

    loop {
        // SAFETY: `fds` is a live, exclusively borrowed buffer of exactly
        // `fds.len()` initialized `pollfd` entries for the whole call.
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
        if rc >= 0 {
            break;
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
        trace!("poll interrupted, retrying");
    }

    let mut ready = ReadySet::new();
    let failed = libc::POLLERR | libc::POLLHUP | libc::POLLNVAL;
    for entry in &fds {
        if entry.revents & (libc::POLLIN | failed) != 0 && entry.events & libc::POLLIN != 0 {
            ready.mark_readable(entry.fd);
        }
        if entry.revents & (libc::POLLOUT | failed) != 0 && entry.events & libc::POLLOUT != 0 {
            ready.mark_writable(entry.fd);
        }
    }
    Ok(ready)
}

/// Convert a channel timeout into `poll(2)` milliseconds, rounding up so a
/// sub-millisecond deadline does not turn into a busy loop.
fn poll_timeout(timeout: Option<Duration>) -> libc::c_int {
    match timeout {
        None => -1,
        Some(duration) => {
            let millis = duration.as_nanos().div_ceil(1_000_000);
            libc::c_int::try_from(millis).unwrap_or(libc::c_int::MAX)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{
        CompletionCallback, HostQuery, Interest, QueryOutcome, ResolveCode,
    };
    use std::io::{Read, Write};
    use std::os::fd::AsRawFd;
    use std::os::unix::net::UnixStream;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Channel whose single query completes when a byte arrives on `reader`.
    struct PipeChannel {
        reader: UnixStream,
        callback: Option<CompletionCallback>,
        interest_calls: Arc<AtomicUsize>,
    }

    impl ResolverChannel for PipeChannel {
        fn submit(
            &mut self,
            _query: &HostQuery,
            callback: CompletionCallback,
        ) -> bridge_traits::error::Result<()> {
            self.callback = Some(callback);
            Ok(())
        }

        fn interest(&self) -> InterestSet {
            self.interest_calls.fetch_add(1, Ordering::SeqCst);
            if self.callback.is_some() {
                std::iter::once(Interest::readable(self.reader.as_raw_fd())).collect()
            } else {
                InterestSet::new()
            }
        }

        fn timeout(&self) -> Option<Duration> {
            Some(Duration::from_secs(5))
        }

        fn process(&mut self, ready: &ReadySet) {
            if ready.is_readable(self.reader.as_raw_fd()) {
                let mut byte = [0u8; 1];
                self.reader.read_exact(&mut byte).unwrap();
                if let Some(callback) = self.callback.take() {
                    callback(QueryOutcome::failure(ResolveCode::NotFound));
                }
            }
        }
    }

    #[test]
    fn test_poll_timeout_rounds_up() {
        assert_eq!(poll_timeout(None), -1);
        assert_eq!(poll_timeout(Some(Duration::ZERO)), 0);
        assert_eq!(poll_timeout(Some(Duration::from_micros(1))), 1);
        assert_eq!(poll_timeout(Some(Duration::from_millis(1500))), 1500);
        assert_eq!(
            poll_timeout(Some(Duration::from_secs(u64::MAX))),
            libc::c_int::MAX
        );
    }

    #[test]
    fn test_wait_ready_times_out_with_empty_set() {
        let (reader, _writer) = UnixStream::pair().unwrap();
        let interest: InterestSet =
            std::iter::once(Interest::readable(reader.as_raw_fd())).collect();
        let ready = wait_ready(&interest, Some(Duration::from_millis(10))).unwrap();
        assert!(ready.is_empty());
    }

    #[test]
    fn test_wait_ready_reports_readable_and_writable() {
        let (reader, mut writer) = UnixStream::pair().unwrap();
        writer.write_all(b"x").unwrap();

        let mut interest = InterestSet::new();
        interest.push(Interest::readable(reader.as_raw_fd()));
        interest.push(Interest::writable(writer.as_raw_fd()));

        let ready = wait_ready(&interest, None).unwrap();
        assert!(ready.is_readable(reader.as_raw_fd()));
        assert!(ready.is_writable(writer.as_raw_fd()));
        assert!(!ready.is_writable(reader.as_raw_fd()));
    }

    #[test]
    fn test_idle_channel_exits_without_iterating() {
        let (reader, _writer) = UnixStream::pair().unwrap();
        let interest_calls = Arc::new(AtomicUsize::new(0));
        let mut channel = PipeChannel {
            reader,
            callback: None,
            interest_calls: Arc::clone(&interest_calls),
        };

        let stats = run_until_idle(&mut channel).unwrap();
        assert_eq!(stats, LoopStats::default());
        assert_eq!(interest_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_loop_stops_one_check_after_callback() {
        let (reader, mut writer) = UnixStream::pair().unwrap();
        let interest_calls = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));

        let mut channel = PipeChannel {
            reader,
            callback: None,
            interest_calls: Arc::clone(&interest_calls),
        };
        let seen = Arc::clone(&completed);
        channel
            .submit(
                &HostQuery::new("example.com", Default::default()),
                Box::new(move |_| {
                    seen.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        writer.write_all(b"x").unwrap();
        let stats = run_until_idle(&mut channel).unwrap();

        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert_eq!(stats.iterations, 1);
        assert_eq!(stats.timeouts, 0);
        // One check before the callback, one after it.
        assert_eq!(interest_calls.load(Ordering::SeqCst), 2);
    }
}
