//! DNS wire format (RFC 1035) for single-question A/AAAA lookups.
//!
//! Only what a stub resolver needs: building a recursive query, reading the
//! address records out of a response, and building a response (used by
//! local test nameservers).

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{AddressFamily, ResolveCode};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

pub const TYPE_A: u16 = 1;
pub const TYPE_CNAME: u16 = 5;
pub const TYPE_AAAA: u16 = 28;
pub const CLASS_IN: u16 = 1;

const HEADER_LEN: usize = 12;
const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;
const MAX_POINTER_HOPS: usize = 16;

const FLAG_QR: u16 = 0x8000;
const FLAG_TC: u16 = 0x0200;
const FLAG_RD: u16 = 0x0100;
const FLAG_RA: u16 = 0x0080;

/// Record type asked for by `family`.
pub fn record_type(family: AddressFamily) -> u16 {
    match family {
        AddressFamily::Inet => TYPE_A,
        AddressFamily::Inet6 => TYPE_AAAA,
    }
}

/// Check that `name` can be encoded as a query name.
pub fn validate_name(name: &str) -> std::result::Result<(), ResolveCode> {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    if trimmed.is_empty() || trimmed.len() > MAX_NAME_LEN {
        return Err(ResolveCode::BadName);
    }
    let labels_ok = trimmed
        .split('.')
        .all(|label| !label.is_empty() && label.len() <= MAX_LABEL_LEN && label.is_ascii());
    if labels_ok {
        Ok(())
    } else {
        Err(ResolveCode::BadName)
    }
}

/// Build a recursive query for `name`.
pub fn encode_query(id: u16, name: &str, family: AddressFamily) -> Result<Bytes> {
    validate_name(name)
        .map_err(|_| BridgeError::InvalidQuery(format!("cannot encode name '{name}'")))?;

    let mut buf = BytesMut::with_capacity(HEADER_LEN + name.len() + 6);
    buf.put_u16(id);
    buf.put_u16(FLAG_RD);
    buf.put_u16(1); // QDCOUNT
    buf.put_u16(0); // ANCOUNT
    buf.put_u16(0); // NSCOUNT
    buf.put_u16(0); // ARCOUNT
    put_name(&mut buf, name);
    buf.put_u16(record_type(family));
    buf.put_u16(CLASS_IN);
    Ok(buf.freeze())
}

/// Build a response to `query` carrying `addresses` as answers.
///
/// The question section is echoed back and every answer points at it with a
/// compression pointer, the way real servers do.
pub fn encode_response(query: &[u8], rcode: u8, addresses: &[IpAddr]) -> Result<Bytes> {
    if query.len() < HEADER_LEN {
        return Err(BridgeError::Protocol("query shorter than header".to_string()));
    }
    let mut header = &query[..HEADER_LEN];
    let id = header.get_u16();

    let mut question = &query[HEADER_LEN..];
    let before = question.remaining();
    skip_name(query, &mut question)?;
    ensure(&question, 4)?;
    question.advance(4);
    let question_len = before - question.remaining();

    let mut buf = BytesMut::with_capacity(query.len() + addresses.len() * 28);
    buf.put_u16(id);
    buf.put_u16(FLAG_QR | FLAG_RD | FLAG_RA | u16::from(rcode & 0x0f));
    buf.put_u16(1);
    buf.put_u16(addresses.len() as u16);
    buf.put_u16(0);
    buf.put_u16(0);
    buf.put_slice(&query[HEADER_LEN..HEADER_LEN + question_len]);

    for addr in addresses {
        buf.put_u16(0xc000 | HEADER_LEN as u16);
        match addr {
            IpAddr::V4(v4) => {
                buf.put_u16(TYPE_A);
                buf.put_u16(CLASS_IN);
                buf.put_u32(300);
                buf.put_u16(4);
                buf.put_slice(&v4.octets());
            }
            IpAddr::V6(v6) => {
                buf.put_u16(TYPE_AAAA);
                buf.put_u16(CLASS_IN);
                buf.put_u32(300);
                buf.put_u16(16);
                buf.put_slice(&v6.octets());
            }
        }
    }
    Ok(buf.freeze())
}

/// Parsed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub id: u16,
    pub rcode: u8,
    pub truncated: bool,
    /// A and AAAA records from the answer section, in order
    pub addresses: Vec<IpAddr>,
}

impl Response {
    /// Addresses of the requested family.
    pub fn addresses_for(&self, family: AddressFamily) -> Vec<IpAddr> {
        self.addresses
            .iter()
            .copied()
            .filter(|addr| family.matches(addr))
            .collect()
    }
}

/// Read the header and answer records of a response packet.
pub fn decode_response(packet: &[u8]) -> Result<Response> {
    let mut buf = packet;
    ensure(&buf, HEADER_LEN)?;
    let id = buf.get_u16();
    let flags = buf.get_u16();
    let qdcount = buf.get_u16();
    let ancount = buf.get_u16();
    buf.advance(4);

    if flags & FLAG_QR == 0 {
        return Err(BridgeError::Protocol("packet is not a response".to_string()));
    }

    for _ in 0..qdcount {
        skip_name(packet, &mut buf)?;
        ensure(&buf, 4)?;
        buf.advance(4);
    }

    let mut addresses = Vec::new();
    for _ in 0..ancount {
        skip_name(packet, &mut buf)?;
        ensure(&buf, 10)?;
        let rtype = buf.get_u16();
        let class = buf.get_u16();
        buf.advance(4); // TTL
        let rdlength = usize::from(buf.get_u16());
        ensure(&buf, rdlength)?;

        match (rtype, class, rdlength) {
            (TYPE_A, CLASS_IN, 4) => {
                addresses.push(IpAddr::V4(Ipv4Addr::from(buf.get_u32())));
            }
            (TYPE_AAAA, CLASS_IN, 16) => {
                addresses.push(IpAddr::V6(Ipv6Addr::from(buf.get_u128())));
            }
            _ => buf.advance(rdlength),
        }
    }

    Ok(Response {
        id,
        rcode: (flags & 0x000f) as u8,
        truncated: flags & FLAG_TC != 0,
        addresses,
    })
}

fn put_name(buf: &mut BytesMut, name: &str) {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    for label in trimmed.split('.') {
        buf.put_u8(label.len() as u8);
        buf.put_slice(label.as_bytes());
    }
    buf.put_u8(0);
}

/// Advance `buf` past an encoded name, following compression pointers
/// against `packet` only to validate them.
fn skip_name(packet: &[u8], buf: &mut &[u8]) -> Result<()> {
    loop {
        ensure(buf, 1)?;
        let len = buf.get_u8();
        match len {
            0 => return Ok(()),
            l if l & 0xc0 == 0xc0 => {
                ensure(buf, 1)?;
                let offset = usize::from(u16::from(l & 0x3f) << 8 | u16::from(buf.get_u8()));
                return check_pointer(packet, offset);
            }
            l if l & 0xc0 != 0 => {
                return Err(BridgeError::Protocol(format!("bad label type {l:#x}")));
            }
            l => {
                ensure(buf, usize::from(l))?;
                buf.advance(usize::from(l));
            }
        }
    }
}

fn check_pointer(packet: &[u8], mut offset: usize) -> Result<()> {
    for _ in 0..MAX_POINTER_HOPS {
        let Some(&len) = packet.get(offset) else {
            return Err(BridgeError::Protocol("name pointer out of range".to_string()));
        };
        match len {
            0 => return Ok(()),
            l if l & 0xc0 == 0xc0 => {
                let Some(&low) = packet.get(offset + 1) else {
                    return Err(BridgeError::Protocol("truncated name pointer".to_string()));
                };
                offset = usize::from(u16::from(l & 0x3f) << 8 | u16::from(low));
            }
            l if l & 0xc0 != 0 => {
                return Err(BridgeError::Protocol(format!("bad label type {l:#x}")));
            }
            l => offset += usize::from(l) + 1,
        }
    }
    Err(BridgeError::Protocol("name pointer loop".to_string()))
}

fn ensure(buf: &[u8], needed: usize) -> Result<()> {
    if buf.len() < needed {
        Err(BridgeError::Protocol("truncated packet".to_string()))
    } else {
        Ok(())
    }
}
