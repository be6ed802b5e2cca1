use std::io::{self, Read, Write};
use std::net::{IpAddr, SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use native_tls::{HandshakeError, TlsConnector, TlsStream};
use tracing::debug;
use trust_dns_resolver::config::LookupIpStrategy;
use trust_dns_resolver::{Resolver, system_conf};

use crate::LOG_TARGET;

/// A bidirectional byte stream carrying one SMTP session.
pub trait SmtpStream: Read + Write + Send {}

impl<T: Read + Write + Send> SmtpStream for T {}

/// Capability to open a byte stream to `host:port`.
///
/// `timeout` bounds the whole connect (name resolution included) and every
/// later read or write. Dropping the returned stream closes the connection.
pub trait Transport: Send + Sync {
    fn connect(&self, host: &str, port: u16, timeout: Duration)
    -> io::Result<Box<dyn SmtpStream>>;
}

/// Plain TCP, wrapped in TLS right away for implicit-TLS ports.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    implicit_tls_ports: Vec<u16>,
    accept_invalid_certs: bool,
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self {
            implicit_tls_ports: vec![465],
            accept_invalid_certs: false,
        }
    }
}

impl TcpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ports on which the TLS handshake happens before the SMTP greeting.
    pub fn with_implicit_tls_ports(mut self, ports: impl Into<Vec<u16>>) -> Self {
        self.implicit_tls_ports = ports.into();
        self
    }

    /// Skip certificate checks on implicit-TLS ports. Many MX hosts present
    /// certificates that do not match their name.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    fn wrap_tls(&self, host: &str, stream: TcpStream) -> io::Result<TlsStream<TcpStream>> {
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(io::Error::other)?;
        match connector.connect(host, stream) {
            Ok(tls) => Ok(tls),
            Err(HandshakeError::Failure(err)) => Err(io::Error::other(err)),
            Err(HandshakeError::WouldBlock(_)) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "TLS handshake timed out",
            )),
        }
    }
}

impl Transport for TcpTransport {
    fn connect(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> io::Result<Box<dyn SmtpStream>> {
        let deadline = Instant::now() + timeout;
        let addrs = resolve_addrs(host, port, timeout)?;
        let (stream, addr) = connect_before(&addrs, deadline)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        debug!(target: LOG_TARGET, host, port, %addr, "connected");
        if self.implicit_tls_ports.contains(&port) {
            return Ok(Box::new(self.wrap_tls(host, stream)?));
        }
        Ok(Box::new(stream))
    }
}

/// Tries `addrs` in order, all attempts sharing the time left until
/// `deadline`.
fn connect_before(addrs: &[SocketAddr], deadline: Instant) -> io::Result<(TcpStream, SocketAddr)> {
    let mut last_err = None;
    for addr in addrs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            last_err = Some(io::Error::new(io::ErrorKind::TimedOut, "connect timed out"));
            break;
        }
        match TcpStream::connect_timeout(addr, remaining) {
            Ok(stream) => return Ok((stream, *addr)),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            "no socket address available",
        )
    }))
}

/// A/AAAA lookup bounded by `timeout`. IP literals skip DNS.
fn resolve_addrs(host: &str, port: u16, timeout: Duration) -> io::Result<Vec<SocketAddr>> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }
    let (config, mut opts) = system_conf::read_system_conf()?;
    opts.timeout = timeout;
    opts.attempts = 1;
    opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
    let resolver = Resolver::new(config, opts)?;
    let lookup = resolver.lookup_ip(host).map_err(io::Error::other)?;
    Ok(lookup.iter().map(|ip| SocketAddr::new(ip, port)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;
    use std::net::TcpListener;
    use std::thread;

    fn greeting_server(payload: &'static [u8]) -> (u16, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let handle = thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let _ = stream.write_all(payload);
            }
        });
        (port, handle)
    }

    #[test]
    fn plain_connection_reads_greeting() {
        let (port, handle) = greeting_server(b"220 local ESMTP\r\n");
        let stream = TcpTransport::new()
            .connect("127.0.0.1", port, Duration::from_secs(2))
            .expect("connect");
        let mut line = String::new();
        io::BufReader::new(stream)
            .read_line(&mut line)
            .expect("read");
        assert_eq!(line, "220 local ESMTP\r\n");
        handle.join().expect("server thread");
    }

    #[test]
    fn closed_port_is_an_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let result = TcpTransport::new().connect("127.0.0.1", port, Duration::from_millis(500));
        assert!(result.is_err());
    }

    #[test]
    fn unreachable_addresses_share_one_deadline() {
        // TEST-NET-1 is never routed
        let addrs: Vec<SocketAddr> = (1..=4)
            .map(|i| SocketAddr::from(([192, 0, 2, i], 25)))
            .collect();
        let timeout = Duration::from_millis(300);
        let started = Instant::now();
        let result = connect_before(&addrs, started + timeout);
        assert!(result.is_err());
        assert!(started.elapsed() < timeout * 2, "{:?}", started.elapsed());
    }

    #[test]
    fn ip_literals_skip_dns() {
        let addrs = resolve_addrs("127.0.0.1", 587, Duration::from_millis(1)).expect("literal");
        assert_eq!(addrs, [SocketAddr::from(([127, 0, 0, 1], 587))]);
    }

    #[test]
    fn implicit_tls_port_rejects_plaintext_server() {
        let (port, handle) = greeting_server(b"220 not tls\r\n");
        let result = TcpTransport::new()
            .with_implicit_tls_ports([port])
            .accept_invalid_certs(true)
            .connect("127.0.0.1", port, Duration::from_secs(2));
        assert!(result.is_err());
        handle.join().expect("server thread");
    }
}
