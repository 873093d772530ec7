//! DNS-based connection configuration: concurrent SRV discovery with
//! priority/weight ordering, happy-eyeballs A/AAAA resolution, and the
//! resulting TCP stream.

#[cfg(feature = "dns")]
use futures::{future::select_ok, FutureExt};
#[cfg(feature = "dns")]
use hickory_resolver::{
    config::LookupIpStrategy, name_server::TokioConnectionProvider, IntoName, TokioAsyncResolver,
};
#[cfg(feature = "dns")]
use log::{debug, warn};
use std::net::SocketAddr;
use tokio::net::TcpStream;

use crate::Error;

/// Which transport a resolved SRV candidate implies.
#[cfg(feature = "dns")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFlavor {
    /// Resolved via `_xmpps-client._tcp`: connect then negotiate TLS
    /// directly (XEP-0368), no STARTTLS round-trip.
    DirectTls,
    /// Resolved via `_xmpp-client._tcp`: connect in the clear, then
    /// `<starttls/>`.
    StartTls,
}

/// A single resolved connection candidate, ready to dial.
#[cfg(feature = "dns")]
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Target hostname (ASCII) to resolve to an address and connect to.
    pub target: String,
    /// Port to connect on.
    pub port: u16,
    /// Transport implied by the SRV name this candidate came from.
    pub flavor: TransportFlavor,
    priority: u16,
    weight: u16,
}

/// StartTLS XMPP server connection configuration
#[derive(Clone, Debug)]
pub enum DnsConfig {
    /// Use SRV record to find server host
    #[cfg(feature = "dns")]
    UseSrv {
        /// Hostname to resolve
        host: String,
        /// TXT field eg. _xmpp-client._tcp
        srv: String,
        /// When SRV resolution fails what port to use
        fallback_port: u16,
    },

    /// Manually define server host and port
    #[allow(unused)]
    #[cfg(feature = "dns")]
    NoSrv {
        /// Server host name
        host: String,
        /// Server port
        port: u16,
    },

    /// Manually define IP: port (TODO: socket)
    #[allow(unused)]
    Addr {
        /// IP:port
        addr: String,
    },

    /// Bypass discovery entirely and dial this host:port directly,
    /// as if it were the sole, highest-priority SRV candidate.
    #[cfg(feature = "dns")]
    OverridePeer {
        /// Host or IP literal to connect to.
        host: String,
        /// Port to connect to.
        port: u16,
    },
}

impl std::fmt::Display for DnsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "dns")]
            Self::UseSrv { host, .. } => write!(f, "{}", host),
            #[cfg(feature = "dns")]
            Self::NoSrv { host, port } => write!(f, "{}:{}", host, port),
            Self::Addr { addr } => write!(f, "{}", addr),
            #[cfg(feature = "dns")]
            Self::OverridePeer { host, port } => write!(f, "{}:{} (override)", host, port),
        }
    }
}

impl DnsConfig {
    /// Constructor for DnsConfig::UseSrv variant
    #[cfg(feature = "dns")]
    pub fn srv(host: &str, srv: &str, fallback_port: u16) -> Self {
        Self::UseSrv {
            host: host.to_string(),
            srv: srv.to_string(),
            fallback_port,
        }
    }

    /// Constructor for the default SRV resolution strategy for clients
    #[cfg(feature = "dns")]
    pub fn srv_default_client(host: &str) -> Self {
        Self::UseSrv {
            host: host.to_string(),
            srv: "_xmpp-client._tcp".to_string(),
            fallback_port: 5222,
        }
    }

    /// Constructor for DnsConfig::NoSrv variant
    #[cfg(feature = "dns")]
    pub fn no_srv(host: &str, port: u16) -> Self {
        Self::NoSrv {
            host: host.to_string(),
            port,
        }
    }

    /// Constructor for DnsConfig::Addr variant
    pub fn addr(addr: &str) -> Self {
        Self::Addr {
            addr: addr.to_string(),
        }
    }

    /// Constructor for DnsConfig::OverridePeer variant, which skips SRV/A/AAAA
    /// discovery and dials `host:port` directly.
    #[cfg(feature = "dns")]
    pub fn override_peer(host: &str, port: u16) -> Self {
        Self::OverridePeer {
            host: host.to_string(),
            port,
        }
    }

    /// Try resolve the DnsConfig to a TcpStream
    pub async fn resolve(&self) -> Result<TcpStream, Error> {
        match self {
            #[cfg(feature = "dns")]
            Self::UseSrv {
                host,
                srv,
                fallback_port,
            } => Self::resolve_srv(host, srv, *fallback_port).await,
            #[cfg(feature = "dns")]
            Self::NoSrv { host, port } => Self::resolve_no_srv(host, *port).await,
            Self::Addr { addr } => {
                // TODO: Unix domain socket
                let addr: SocketAddr = addr.parse()?;
                return Ok(TcpStream::connect(&SocketAddr::new(addr.ip(), addr.port())).await?);
            }
            #[cfg(feature = "dns")]
            Self::OverridePeer { host, port } => Self::resolve_no_srv(host, *port).await,
        }
    }

    #[cfg(feature = "dns")]
    async fn resolve_srv(host: &str, srv: &str, fallback_port: u16) -> Result<TcpStream, Error> {
        let ascii_domain = idna::domain_to_ascii(&host)?;

        // Bare-IP literal target: a single direct-only candidate, no
        // discovery at all.
        if let Ok(ip) = ascii_domain.parse() {
            debug!("Attempting connection to {ip}:{fallback_port}");
            return Ok(TcpStream::connect(&SocketAddr::new(ip, fallback_port)).await?);
        }

        let direct_srv = format!("_xmpps-client._tcp.{}.", ascii_domain);
        let starttls_srv = format!("{}.{}.", srv, ascii_domain);

        let (direct, starttls) = futures::join!(
            lookup_srv_with_retry(&direct_srv, TransportFlavor::DirectTls),
            lookup_srv_with_retry(&starttls_srv, TransportFlavor::StartTls),
        );

        let mut candidates = Vec::new();
        match direct {
            Ok(mut c) => candidates.append(&mut c),
            Err(e) => warn!("SRV lookup of {direct_srv} failed: {e}"),
        }
        match starttls {
            Ok(mut c) => candidates.append(&mut c),
            Err(e) => warn!("SRV lookup of {starttls_srv} failed: {e}"),
        }

        if candidates.is_empty() {
            // Both SRV queries failed outright: fall back to the bare
            // hostname, as RFC 6120 §3.2.1 prescribes.
            debug!("Attempting connection to {host}:{fallback_port}");
            return Self::resolve_no_srv(host, fallback_port).await;
        }

        sort_candidates(&mut candidates);

        for candidate in &candidates {
            debug!(
                "Attempting connection to {} {}:{} ({:?})",
                host, candidate.target, candidate.port, candidate.flavor
            );
            if let Ok(stream) = Self::resolve_no_srv(&candidate.target, candidate.port).await {
                return Ok(stream);
            }
        }
        Err(Error::Disconnected)
    }

    #[cfg(feature = "dns")]
    async fn resolve_no_srv(host: &str, port: u16) -> Result<TcpStream, Error> {
        let ascii_domain = idna::domain_to_ascii(&host)?;

        if let Ok(ip) = ascii_domain.parse() {
            return Ok(TcpStream::connect(&SocketAddr::new(ip, port)).await?);
        }

        let ips = lookup_ip_with_retry(&ascii_domain).await?;

        // Happy Eyeballs: connect to all records in parallel, return the
        // first to succeed
        select_ok(
            ips.into_iter()
                .map(|ip| TcpStream::connect(SocketAddr::new(ip, port)).boxed()),
        )
        .await
        .map(|(result, _)| result)
        .map_err(|_| Error::Disconnected)
    }
}

/// Builds a resolver from system config, retrying once (with a freshly
/// re-read system config) if the first attempt at building or looking up
/// times out. Subsequent timeouts propagate.
#[cfg(feature = "dns")]
async fn lookup_ip_with_retry(
    ascii_domain: &str,
) -> Result<hickory_resolver::lookup_ip::LookupIp, Error> {
    for attempt in 0..2 {
        let (config, mut options) = hickory_resolver::system_conf::read_system_conf()?;
        options.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        let resolver = TokioAsyncResolver::new(config, options, TokioConnectionProvider::default());
        match resolver.lookup_ip(ascii_domain).await {
            Ok(ips) => return Ok(ips),
            Err(e) if attempt == 0 => {
                warn!("DNS lookup of {ascii_domain} timed out, retrying once: {e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
    unreachable!()
}

/// Same retry-once behaviour as [`lookup_ip_with_retry`], for SRV records,
/// converting the raw [`SRV`] records into flavor-tagged [`Candidate`]s.
#[cfg(feature = "dns")]
async fn lookup_srv_with_retry(
    srv_name: &str,
    flavor: TransportFlavor,
) -> Result<Vec<Candidate>, Error> {
    let name = srv_name.into_name()?;
    for attempt in 0..2 {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()?;
        match resolver.srv_lookup(name.clone()).await {
            Ok(lookup) => {
                return Ok(lookup
                    .iter()
                    .map(|srv| Candidate {
                        target: srv.target().to_ascii(),
                        port: srv.port(),
                        flavor,
                        priority: srv.priority(),
                        weight: srv.weight(),
                    })
                    .collect())
            }
            Err(e) if attempt == 0 => {
                warn!("SRV lookup of {srv_name} timed out, retrying once: {e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
    unreachable!()
}

/// Sorts SRV candidates by priority ascending (RFC 2782): within a priority
/// tier, candidates are ordered by a weighted random draw so that weight-0
/// entries are tried last and heavier entries are preferred probabilistically
/// rather than deterministically.
#[cfg(feature = "dns")]
fn sort_candidates(candidates: &mut Vec<Candidate>) {
    use rand::Rng;

    candidates.sort_by_key(|c| c.priority);

    let mut start = 0;
    while start < candidates.len() {
        let priority = candidates[start].priority;
        let mut end = start;
        while end < candidates.len() && candidates[end].priority == priority {
            end += 1;
        }
        let tier = &mut candidates[start..end];
        let mut rng = rand::thread_rng();
        for i in 0..tier.len() {
            let total_weight: u32 = tier[i..].iter().map(|c| c.weight as u32 + 1).sum();
            let mut pick = rng.gen_range(0..total_weight);
            let mut chosen = i;
            for (j, c) in tier[i..].iter().enumerate() {
                let w = c.weight as u32 + 1;
                if pick < w {
                    chosen = i + j;
                    break;
                }
                pick -= w;
            }
            tier.swap(i, chosen);
        }
        start = end;
    }
}
