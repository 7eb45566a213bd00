//! Query and Outcome Types
//!
//! Describes one host lookup request and the outcome a resolver library
//! reports back through the completion callback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::BridgeError;

/// Address family of the records a query asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4 (`A` records)
    #[default]
    Inet,
    /// IPv6 (`AAAA` records)
    Inet6,
}

impl AddressFamily {
    /// Whether `addr` belongs to this family.
    pub fn matches(&self, addr: &IpAddr) -> bool {
        matches!(
            (self, addr),
            (AddressFamily::Inet, IpAddr::V4(_)) | (AddressFamily::Inet6, IpAddr::V6(_))
        )
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Inet => f.write_str("inet"),
            AddressFamily::Inet6 => f.write_str("inet6"),
        }
    }
}

impl FromStr for AddressFamily {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inet" | "ipv4" | "4" => Ok(AddressFamily::Inet),
            "inet6" | "ipv6" | "6" => Ok(AddressFamily::Inet6),
            other => Err(BridgeError::InvalidQuery(format!(
                "unknown address family '{other}'"
            ))),
        }
    }
}

/// A single host-name lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostQuery {
    pub name: String,
    pub family: AddressFamily,
}

impl HostQuery {
    pub fn new(name: impl Into<String>, family: AddressFamily) -> Self {
        Self {
            name: name.into(),
            family,
        }
    }
}

impl fmt::Display for HostQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.family)
    }
}

/// Status codes reported by a resolver library.
///
/// Discriminants follow the numbering used by common stub resolvers so a
/// host printing raw codes stays compatible with existing tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum ResolveCode {
    Success = 0,
    NoData = 1,
    FormErr = 2,
    ServFail = 3,
    NotFound = 4,
    NotImp = 5,
    Refused = 6,
    BadQuery = 7,
    BadName = 8,
    BadFamily = 9,
    BadResp = 10,
    ConnRefused = 11,
    Timeout = 12,
    Eof = 13,
    File = 14,
    NoMem = 15,
    Destruction = 16,
    NotInitialized = 21,
    Cancelled = 24,
}

impl ResolveCode {
    /// Numeric code as reported to hosts.
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ResolveCode::Success
    }

    /// Map a DNS response code (RFC 1035 `RCODE`) to a resolve code.
    pub fn from_rcode(rcode: u8) -> Self {
        match rcode {
            0 => ResolveCode::Success,
            1 => ResolveCode::FormErr,
            2 => ResolveCode::ServFail,
            3 => ResolveCode::NotFound,
            4 => ResolveCode::NotImp,
            5 => ResolveCode::Refused,
            _ => ResolveCode::BadResp,
        }
    }

    fn description(self) -> &'static str {
        match self {
            ResolveCode::Success => "successful completion",
            ResolveCode::NoData => "no data for the requested family",
            ResolveCode::FormErr => "server reported a malformed query",
            ResolveCode::ServFail => "server failure",
            ResolveCode::NotFound => "domain name not found",
            ResolveCode::NotImp => "server does not implement the operation",
            ResolveCode::Refused => "server refused the query",
            ResolveCode::BadQuery => "malformed query",
            ResolveCode::BadName => "malformed domain name",
            ResolveCode::BadFamily => "unsupported address family",
            ResolveCode::BadResp => "malformed response",
            ResolveCode::ConnRefused => "could not contact the nameserver",
            ResolveCode::Timeout => "timed out",
            ResolveCode::Eof => "end of file",
            ResolveCode::File => "error reading file",
            ResolveCode::NoMem => "out of memory",
            ResolveCode::Destruction => "channel destroyed with the query pending",
            ResolveCode::NotInitialized => "library not initialized",
            ResolveCode::Cancelled => "query cancelled",
        }
    }
}

impl fmt::Display for ResolveCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}

/// Outcome delivered to a completion callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    pub code: ResolveCode,
    /// Number of timeouts that occurred while the query was outstanding
    pub timeouts: u32,
    /// Resolved addresses, in answer order; empty on failure
    pub addresses: Vec<IpAddr>,
}

impl QueryOutcome {
    pub fn success(addresses: Vec<IpAddr>) -> Self {
        Self {
            code: ResolveCode::Success,
            timeouts: 0,
            addresses,
        }
    }

    pub fn failure(code: ResolveCode) -> Self {
        Self {
            code,
            timeouts: 0,
            addresses: Vec::new(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: u32) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// First resolved address, if any.
    pub fn first_address(&self) -> Option<IpAddr> {
        self.addresses.first().copied()
    }
}
