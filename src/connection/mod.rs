//! Connection layer
//!
//! This module turns a display name into a connected byte stream to an X server,
//! over a local Unix domain socket or over TCP.

use crate::error::{AuthError, Error, TransportError};
use crate::protocol::X_TCP_PORT;
use std::fmt;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Directory holding the local X server sockets
pub const X11_UNIX_DIR: &str = "/tmp/.X11-unix";

/// How to reach the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Local,
    Network,
}

/// Parsed display name: `[host][/unix]:display[.screen]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    /// Host part with any `/unix` suffix removed (empty for the local host)
    pub hostname: String,
    pub display: u32,
    pub screen: u32,
    pub transport: TransportKind,
}

impl ConnectionTarget {
    pub fn parse(name: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidTarget(name.to_string());

        let (host, rest) = name.rsplit_once(':').ok_or_else(invalid)?;
        let (display, screen) = match rest.split_once('.') {
            Some((display, screen)) => (display, Some(screen)),
            None => (rest, None),
        };

        let display = display.parse::<u32>().map_err(|_| invalid())?;
        let screen = match screen {
            Some(screen) => screen.parse::<u32>().map_err(|_| invalid())?,
            None => 0,
        };

        let (hostname, transport) = match host.strip_suffix("/unix") {
            Some(host) => (host, TransportKind::Local),
            None if host.is_empty() || host == "unix" => (host, TransportKind::Local),
            None => (host, TransportKind::Network),
        };

        let target = ConnectionTarget {
            hostname: hostname.to_string(),
            display,
            screen,
            transport,
        };
        if target.transport == TransportKind::Network && target.port().is_none() {
            return Err(invalid());
        }
        Ok(target)
    }

    /// Host name used to look up authorization entries
    pub fn credential_hostname(&self) -> Result<String, AuthError> {
        if self.hostname.is_empty() || self.hostname == "unix" {
            local_hostname().map_err(AuthError::Hostname)
        } else {
            Ok(self.hostname.clone())
        }
    }

    /// Path of the filesystem socket for a local display
    pub fn socket_path(&self) -> String {
        format!("{}/X{}", X11_UNIX_DIR, self.display)
    }

    /// TCP port of the display, `None` when it falls past 65535
    pub fn port(&self) -> Option<u16> {
        u16::try_from(self.display).ok()?.checked_add(X_TCP_PORT)
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.transport == TransportKind::Local
            && !self.hostname.is_empty()
            && self.hostname != "unix"
        {
            write!(f, "{}/unix", self.hostname)?;
        } else {
            write!(f, "{}", self.hostname)?;
        }
        write!(f, ":{}.{}", self.display, self.screen)
    }
}

#[cfg(unix)]
fn local_hostname() -> io::Result<String> {
    let name = nix::unistd::gethostname().map_err(io::Error::from)?;
    name.into_string()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "host name is not UTF-8"))
}

#[cfg(not(unix))]
fn local_hostname() -> io::Result<String> {
    std::env::var("COMPUTERNAME").or_else(|_| Ok("localhost".to_string()))
}

/// Connection type
#[derive(Debug)]
pub enum Connection {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Read for Connection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Connection::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Connection::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Connection::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Connection::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Connection::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Connection::Unix(stream) => stream.flush(),
        }
    }
}

/// Open a connection to the display named by `target`
pub fn resolve(target: &ConnectionTarget) -> Result<Connection, TransportError> {
    match target.transport {
        #[cfg(unix)]
        TransportKind::Local => connect_local(target),
        #[cfg(not(unix))]
        TransportKind::Local => connect_tcp("localhost", tcp_port(target, "localhost")?),
        TransportKind::Network => connect_tcp(&target.hostname, tcp_port(target, &target.hostname)?),
    }
}

fn tcp_port(target: &ConnectionTarget, host: &str) -> Result<u16, TransportError> {
    target.port().ok_or_else(|| TransportError::ResolutionFailed {
        host: host.to_string(),
        reason: format!("display {} is beyond the TCP port range", target.display),
    })
}

#[cfg(unix)]
fn connect_local(target: &ConnectionTarget) -> Result<Connection, TransportError> {
    let path = target.socket_path();
    log::debug!("Connecting to local socket {}", path);

    match UnixStream::connect(&path) {
        Ok(stream) => Ok(Connection::Unix(stream)),
        Err(err) => connect_local_fallback(&path, err),
    }
}

#[cfg(target_os = "linux")]
fn connect_local_fallback(path: &str, err: io::Error) -> Result<Connection, TransportError> {
    log::debug!("{}: {}, trying abstract socket", path, err);
    connect_abstract(path).map(Connection::Unix)
}

#[cfg(all(unix, not(target_os = "linux")))]
fn connect_local_fallback(path: &str, err: io::Error) -> Result<Connection, TransportError> {
    Err(TransportError::ConnectFailed {
        address: path.to_string(),
        source: err,
    })
}

/// Connect to the abstract-namespace socket Linux X servers also listen on
#[cfg(target_os = "linux")]
fn connect_abstract(path: &str) -> Result<UnixStream, TransportError> {
    use nix::sys::socket::{connect, socket, AddressFamily, SockFlag, SockType, UnixAddr};
    use std::os::fd::AsRawFd;

    let failed = |source: io::Error| TransportError::ConnectFailed {
        address: format!("@{}", path),
        source,
    };

    let fd = socket(
        AddressFamily::Unix,
        SockType::Stream,
        SockFlag::SOCK_CLOEXEC,
        None,
    )
    .map_err(|e| failed(e.into()))?;

    let addr = UnixAddr::new_abstract(path.as_bytes()).map_err(|e| failed(e.into()))?;
    connect(fd.as_raw_fd(), &addr).map_err(|e| failed(e.into()))?;

    Ok(UnixStream::from(fd))
}

fn connect_tcp(host: &str, port: u16) -> Result<Connection, TransportError> {
    let candidates: Vec<_> = (host, port)
        .to_socket_addrs()
        .map_err(|e| TransportError::ResolutionFailed {
            host: host.to_string(),
            reason: e.to_string(),
        })?
        .collect();

    if candidates.is_empty() {
        return Err(TransportError::ResolutionFailed {
            host: host.to_string(),
            reason: "no addresses found".to_string(),
        });
    }

    let mut last_error = None;
    for addr in candidates {
        log::debug!("Connecting to {}", addr);
        match TcpStream::connect(addr) {
            Ok(stream) => {
                if let Err(e) = stream.set_nodelay(true) {
                    log::debug!("Failed to set TCP_NODELAY: {}", e);
                }
                return Ok(Connection::Tcp(stream));
            }
            Err(e) => {
                log::debug!("Connection to {} failed: {}", addr, e);
                last_error = Some((addr, e));
            }
        }
    }

    match last_error {
        Some((addr, source)) => Err(TransportError::ConnectFailed {
            address: addr.to_string(),
            source,
        }),
        None => Err(TransportError::ResolutionFailed {
            host: host.to_string(),
            reason: "no addresses found".to_string(),
        }),
    }
}
