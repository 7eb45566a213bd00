//! Scripted resolver library for bridge tests.
//!
//! Each channel watches one end of a Unix socket pair. The query completes
//! when a byte arrives on it: immediately after submit by default, or when
//! the test calls [`FakeLibrary::release`] for a gated library.

#![allow(dead_code)]

use bridge_traits::{
    error::Result, BridgeError, CompletionCallback, HostQuery, Interest, InterestSet,
    QueryOutcome, ReadySet, ResolveCode, ResolverChannel, ResolverLibrary,
};
use parking_lot::Mutex;
use std::io::{Read, Write};
use std::net::IpAddr;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
pub struct Counters {
    pub inits: AtomicUsize,
    pub cleanups: AtomicUsize,
    pub interest_calls: AtomicUsize,
    pub process_calls: AtomicUsize,
    pub callbacks: AtomicUsize,
}

struct Shared {
    outcome: Mutex<QueryOutcome>,
    gated: bool,
    fail_init: AtomicBool,
    fail_submit: AtomicBool,
    flood: AtomicUsize,
    gate: Mutex<Option<UnixStream>>,
    queries: Mutex<Vec<HostQuery>>,
    events: Mutex<Vec<&'static str>>,
    counters: Counters,
}

pub struct FakeLibrary {
    shared: Arc<Shared>,
}

impl FakeLibrary {
    /// Completes every query on the first event loop iteration.
    pub fn answering(address: &str) -> Arc<Self> {
        Self::build(address, false)
    }

    /// Holds every query until [`release`](Self::release) is called.
    pub fn gated(address: &str) -> Arc<Self> {
        Self::build(address, true)
    }

    fn build(address: &str, gated: bool) -> Arc<Self> {
        let address: IpAddr = address.parse().expect("test address");
        Arc::new(Self {
            shared: Arc::new(Shared {
                outcome: Mutex::new(QueryOutcome::success(vec![address])),
                gated,
                fail_init: AtomicBool::new(false),
                fail_submit: AtomicBool::new(false),
                flood: AtomicUsize::new(0),
                gate: Mutex::new(None),
                queries: Mutex::new(Vec::new()),
                events: Mutex::new(Vec::new()),
                counters: Counters::default(),
            }),
        })
    }

    pub fn set_outcome(&self, outcome: QueryOutcome) {
        *self.shared.outcome.lock() = outcome;
    }

    pub fn fail_init(&self, fail: bool) {
        self.shared.fail_init.store(fail, Ordering::SeqCst);
    }

    pub fn fail_submit(&self, fail: bool) {
        self.shared.fail_submit.store(fail, Ordering::SeqCst);
    }

    /// Report `count` descriptors of interest while a query is pending,
    /// more than `poll(2)` accepts once `count` exceeds `RLIMIT_NOFILE`.
    pub fn flood_interest(&self, count: usize) {
        self.shared.flood.store(count, Ordering::SeqCst);
    }

    /// Let the pending query of the current channel complete.
    pub fn release(&self) {
        // The worker may not have created its channel yet.
        for _ in 0..500 {
            if let Some(writer) = self.shared.gate.lock().as_mut() {
                writer.write_all(b"!").expect("gate write");
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("no channel to release");
    }

    pub fn counters(&self) -> &Counters {
        &self.shared.counters
    }

    pub fn queries(&self) -> Vec<HostQuery> {
        self.shared.queries.lock().clone()
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.shared.events.lock().clone()
    }
}

impl ResolverLibrary for FakeLibrary {
    fn init(&self) -> Result<()> {
        if self.shared.fail_init.load(Ordering::SeqCst) {
            return Err(BridgeError::NotInitialized);
        }
        self.shared.counters.inits.fetch_add(1, Ordering::SeqCst);
        self.shared.events.lock().push("init");
        Ok(())
    }

    fn cleanup(&self) {
        self.shared.counters.cleanups.fetch_add(1, Ordering::SeqCst);
        self.shared.events.lock().push("cleanup");
    }

    fn create_channel(&self) -> Result<Box<dyn ResolverChannel>> {
        let (reader, writer) = UnixStream::pair()?;
        *self.shared.gate.lock() = Some(writer);
        self.shared.events.lock().push("create_channel");
        Ok(Box::new(FakeChannel {
            shared: Arc::clone(&self.shared),
            reader,
            callback: None,
        }))
    }
}

struct FakeChannel {
    shared: Arc<Shared>,
    reader: UnixStream,
    callback: Option<CompletionCallback>,
}

impl FakeChannel {
    fn complete(&mut self, outcome: QueryOutcome) {
        if let Some(callback) = self.callback.take() {
            self.shared.counters.callbacks.fetch_add(1, Ordering::SeqCst);
            callback(outcome);
        }
    }
}

impl ResolverChannel for FakeChannel {
    fn submit(&mut self, query: &HostQuery, callback: CompletionCallback) -> Result<()> {
        if self.shared.fail_submit.load(Ordering::SeqCst) {
            return Err(BridgeError::InvalidQuery("submission refused".to_string()));
        }
        self.shared.queries.lock().push(query.clone());
        self.shared.events.lock().push("submit");
        self.callback = Some(callback);

        if !self.shared.gated {
            if let Some(writer) = self.shared.gate.lock().as_mut() {
                writer.write_all(b"!")?;
            }
        }
        Ok(())
    }

    fn interest(&self) -> InterestSet {
        self.shared
            .counters
            .interest_calls
            .fetch_add(1, Ordering::SeqCst);
        let flood = self.shared.flood.load(Ordering::SeqCst);
        if self.callback.is_some() && flood > 0 {
            (0..flood)
                .map(|_| Interest::readable(self.reader.as_raw_fd()))
                .collect()
        } else if self.callback.is_some() {
            std::iter::once(Interest::readable(self.reader.as_raw_fd())).collect()
        } else {
            InterestSet::new()
        }
    }

    fn timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(10))
    }

    fn process(&mut self, ready: &ReadySet) {
        self.shared
            .counters
            .process_calls
            .fetch_add(1, Ordering::SeqCst);

        if ready.is_readable(self.reader.as_raw_fd()) {
            let mut byte = [0u8; 1];
            if self.reader.read_exact(&mut byte).is_ok() {
                let outcome = self.shared.outcome.lock().clone();
                self.complete(outcome);
            }
        } else if ready.is_empty() {
            self.complete(QueryOutcome::failure(ResolveCode::Timeout).with_timeouts(1));
        }
    }
}

impl Drop for FakeChannel {
    fn drop(&mut self) {
        self.complete(QueryOutcome::failure(ResolveCode::Destruction));
        self.shared.gate.lock().take();
        self.shared.events.lock().push("destroy_channel");
    }
}
