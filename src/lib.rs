/// x11info - X server information printer
///
/// This library connects to an X server as a read-only client, decodes the
/// connection setup data and queries the server's extensions and their
/// versions. Nothing is drawn and no server state is changed.

pub mod protocol;
pub mod connection;
pub mod security;
pub mod session;
pub mod extensions;
pub mod probe;
pub mod report;
pub mod config;
pub mod error;

pub use connection::{Connection, ConnectionTarget};
pub use error::{Error, Result};
pub use probe::{probe, ProbeReport};
pub use session::Session;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
