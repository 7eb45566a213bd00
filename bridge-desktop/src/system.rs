//! System resolver configuration: `/etc/resolv.conf` and `/etc/hosts`.

use bridge_traits::AddressFamily;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_RESOLV_CONF: &str = "/etc/resolv.conf";
pub const DEFAULT_HOSTS_FILE: &str = "/etc/hosts";
pub const DNS_PORT: u16 = 53;

/// Nameserver used when the system configuration names none.
pub fn fallback_nameserver() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DNS_PORT)
}

/// Extract `nameserver` entries from resolv.conf contents.
pub fn parse_resolv_conf(contents: &str) -> Vec<SocketAddr> {
    contents
        .lines()
        .map(strip_comment)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some("nameserver"), Some(addr)) => {
                    // Drop an IPv6 zone suffix such as `%eth0`.
                    let addr = addr.split('%').next().unwrap_or(addr);
                    addr.parse::<IpAddr>()
                        .ok()
                        .map(|ip| SocketAddr::new(ip, DNS_PORT))
                }
                _ => None,
            }
        })
        .collect()
}

/// Nameservers from the resolv.conf at `path`, or the fallback when the file
/// is missing or lists none.
pub fn load_nameservers(path: &Path) -> Vec<SocketAddr> {
    let servers = match std::fs::read_to_string(path) {
        Ok(contents) => parse_resolv_conf(&contents),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "resolv.conf unavailable");
            Vec::new()
        }
    };

    if servers.is_empty() {
        vec![fallback_nameserver()]
    } else {
        servers
    }
}

/// Static host table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostsFile {
    entries: Vec<(IpAddr, Vec<String>)>,
}

impl HostsFile {
    pub fn parse(contents: &str) -> Self {
        let entries = contents
            .lines()
            .map(strip_comment)
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let addr = fields.next()?.parse::<IpAddr>().ok()?;
                let names: Vec<String> = fields.map(|name| name.to_ascii_lowercase()).collect();
                if names.is_empty() {
                    None
                } else {
                    Some((addr, names))
                }
            })
            .collect();
        Self { entries }
    }

    /// Load the hosts file at `path`. A missing file is an empty table.
    pub fn load(path: &Path) -> io::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Self::parse(&contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err),
        }
    }

    /// Addresses of `family` listed for `name`, in file order.
    pub fn lookup(&self, name: &str, family: AddressFamily) -> Vec<IpAddr> {
        let wanted = name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase();
        self.entries
            .iter()
            .filter(|(addr, names)| family.matches(addr) && names.iter().any(|n| *n == wanted))
            .map(|(addr, _)| *addr)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn strip_comment(line: &str) -> &str {
    line.split(['#', ';']).next().unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolv_conf() {
        let contents = "\
# generated
search example.com
nameserver 10.0.0.2
nameserver fe80::1%eth0 ; link local
nameserver not-an-ip
options ndots:2
";
        let servers = parse_resolv_conf(contents);
        assert_eq!(
            servers,
            vec![
                "10.0.0.2:53".parse::<SocketAddr>().unwrap(),
                "[fe80::1]:53".parse::<SocketAddr>().unwrap(),
            ]
        );
    }

    #[test]
    fn test_load_nameservers_falls_back() {
        let servers = load_nameservers(Path::new("/nonexistent/resolv.conf"));
        assert_eq!(servers, vec![fallback_nameserver()]);
    }

    #[test]
    fn test_hosts_lookup() {
        let hosts = HostsFile::parse(
            "\
127.0.0.1   localhost
::1         localhost ip6-localhost
192.168.1.10 NAS.lan nas # storage box
bogus line
",
        );

        assert_eq!(
            hosts.lookup("localhost", AddressFamily::Inet),
            vec!["127.0.0.1".parse::<IpAddr>().unwrap()]
        );
        assert_eq!(
            hosts.lookup("localhost", AddressFamily::Inet6),
            vec!["::1".parse::<IpAddr>().unwrap()]
        );
        assert_eq!(
            hosts.lookup("nas.lan.", AddressFamily::Inet),
            vec!["192.168.1.10".parse::<IpAddr>().unwrap()]
        );
        assert!(hosts.lookup("example.com", AddressFamily::Inet).is_empty());
    }

    #[test]
    fn test_missing_hosts_file_is_empty() {
        let hosts = HostsFile::load(Path::new("/nonexistent/hosts")).unwrap();
        assert!(hosts.is_empty());
    }
}
