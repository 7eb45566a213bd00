//! UDP query channel.

use bridge_traits::{
    error::{BridgeError, Result},
    AddressFamily, CompletionCallback, HostQuery, Interest, InterestSet, QueryOutcome, ReadySet,
    ResolveCode, ResolverChannel,
};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::os::fd::AsRawFd;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::resolver::ResolverOptions;
use crate::system::HostsFile;
use crate::wire;

/// Largest datagram we accept (EDNS-sized).
const MAX_DATAGRAM: usize = 4096;

/// Channel created by [`SystemResolver`](crate::SystemResolver).
pub struct UdpChannel {
    options: Arc<ResolverOptions>,
    pending: Vec<PendingQuery>,
}

struct PendingQuery {
    id: u16,
    name: String,
    family: AddressFamily,
    socket: UdpSocket,
    deadline: Instant,
    callback: Option<CompletionCallback>,
}

impl PendingQuery {
    fn complete(&mut self, outcome: QueryOutcome) {
        if let Some(callback) = self.callback.take() {
            debug!(name = %self.name, code = %outcome.code, "query completed");
            callback(outcome);
        }
    }

    /// Drain the socket. Returns the outcome once an answer for this query
    /// has arrived.
    fn receive(&mut self) -> Option<QueryOutcome> {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            match self.socket.recv(&mut buf) {
                Ok(len) => match wire::decode_response(&buf[..len]) {
                    Ok(response) if response.id == self.id => {
                        return Some(outcome_from_response(&response, self.family));
                    }
                    Ok(response) => {
                        trace!(expected = self.id, got = response.id, "ignoring unrelated datagram");
                    }
                    Err(err) => {
                        debug!(name = %self.name, error = %err, "ignoring malformed datagram");
                    }
                },
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return None,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(name = %self.name, error = %err, "nameserver unreachable");
                    return Some(QueryOutcome::failure(ResolveCode::ConnRefused));
                }
            }
        }
    }
}

fn outcome_from_response(response: &wire::Response, family: AddressFamily) -> QueryOutcome {
    let code = ResolveCode::from_rcode(response.rcode);
    if !code.is_success() {
        return QueryOutcome::failure(code);
    }

    let addresses = response.addresses_for(family);
    if !addresses.is_empty() {
        QueryOutcome::success(addresses)
    } else if response.truncated {
        QueryOutcome::failure(ResolveCode::BadResp)
    } else {
        QueryOutcome::failure(ResolveCode::NoData)
    }
}

impl UdpChannel {
    pub fn new(options: Arc<ResolverOptions>) -> Self {
        Self {
            options,
            pending: Vec::new(),
        }
    }

    /// Number of queries still waiting for an answer.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Answer from local sources (address literals, hosts file) if possible.
    fn answer_locally(&self, query: &HostQuery) -> Option<QueryOutcome> {
        if let Ok(addr) = query.name.parse::<IpAddr>() {
            return Some(if query.family.matches(&addr) {
                QueryOutcome::success(vec![addr])
            } else {
                QueryOutcome::failure(ResolveCode::NotFound)
            });
        }

        let path = self.options.hosts_file.as_deref()?;
        match HostsFile::load(path) {
            Ok(hosts) => {
                let addresses = hosts.lookup(&query.name, query.family);
                (!addresses.is_empty()).then(|| QueryOutcome::success(addresses))
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "hosts file unreadable");
                None
            }
        }
    }

    /// Send `query` to the first configured nameserver.
    fn send_query(&self, query: &HostQuery) -> Result<(u16, UdpSocket)> {
        let server = *self.options.nameservers.first().ok_or_else(|| {
            BridgeError::InvalidQuery("no nameservers configured".to_string())
        })?;

        let local: SocketAddr = match server {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local)?;
        socket.connect(server)?;
        socket.set_nonblocking(true)?;

        let id: u16 = rand::random();
        let packet = wire::encode_query(id, &query.name, query.family)?;
        socket.send(&packet)?;
        debug!(name = %query.name, %server, id, "query sent");
        Ok((id, socket))
    }
}

impl ResolverChannel for UdpChannel {
    fn submit(&mut self, query: &HostQuery, callback: CompletionCallback) -> Result<()> {
        if let Err(code) = wire::validate_name(&query.name) {
            callback(QueryOutcome::failure(code));
            return Ok(());
        }

        if let Some(outcome) = self.answer_locally(query) {
            debug!(name = %query.name, code = %outcome.code, "answered locally");
            callback(outcome);
            return Ok(());
        }

        let (id, socket) = self.send_query(query)?;
        self.pending.push(PendingQuery {
            id,
            name: query.name.clone(),
            family: query.family,
            socket,
            deadline: Instant::now() + self.options.query_timeout,
            callback: Some(callback),
        });
        Ok(())
    }

    fn interest(&self) -> InterestSet {
        self.pending
            .iter()
            .map(|query| Interest::readable(query.socket.as_raw_fd()))
            .collect()
    }

    fn timeout(&self) -> Option<Duration> {
        let now = Instant::now();
        self.pending
            .iter()
            .map(|query| query.deadline.saturating_duration_since(now))
            .min()
    }

    fn process(&mut self, ready: &ReadySet) {
        let now = Instant::now();
        let mut still_pending = Vec::with_capacity(self.pending.len());

        for mut query in std::mem::take(&mut self.pending) {
            if ready.is_readable(query.socket.as_raw_fd()) {
                if let Some(outcome) = query.receive() {
                    query.complete(outcome);
                    continue;
                }
            }
            if now >= query.deadline {
                query.complete(QueryOutcome::failure(ResolveCode::Timeout).with_timeouts(1));
                continue;
            }
            still_pending.push(query);
        }

        self.pending = still_pending;
    }
}

impl Drop for UdpChannel {
    fn drop(&mut self) {
        for query in &mut self.pending {
            query.complete(QueryOutcome::failure(ResolveCode::Destruction));
        }
    }
}
