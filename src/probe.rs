//! One diagnostic run against a display
//!
//! Credential lookup, connection, handshake, then the read-only queries that
//! fill a [`ProbeReport`]. Anything after the handshake is best effort.

use crate::connection::ConnectionTarget;
use crate::error::{Error, Result, TransportError};
use crate::extensions::{self, ExtensionRecord, BIG_REQUESTS};
use crate::protocol::SetupInfo;
use crate::security::CredentialSource;
use crate::session::Session;
use std::io::{Read, Write};

/// Everything learned about a display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub target: ConnectionTarget,
    pub setup: SetupInfo,
    /// Largest request the server accepts, in bytes
    pub max_request_length: usize,
    /// `None` when the font path could not be queried
    pub font_paths: Option<Vec<String>>,
    /// Every advertised extension; `None` when the list could not be queried
    pub extensions: Option<Vec<ExtensionRecord>>,
}

/// Look up the credential, connect with `connect` and inspect the display
///
/// No connection is attempted when no credential matches the target.
pub fn probe<S, C, F>(target: &ConnectionTarget, credentials: &C, connect: F) -> Result<ProbeReport>
where
    S: Read + Write,
    C: CredentialSource + ?Sized,
    F: FnOnce(&ConnectionTarget) -> std::result::Result<S, TransportError>,
{
    let hostname = target.credential_hostname()?;
    let credential = credentials
        .lookup(&hostname, target.display)?
        .ok_or_else(|| Error::CredentialUnavailable {
            hostname: hostname.clone(),
            display: target.display,
        })?;

    let stream = connect(target)?;
    let session = Session::handshake(stream, credential)?;
    Ok(inspect(session, target))
}

/// Run the post-handshake queries and close the session
pub fn inspect<S: Read + Write>(mut session: Session<S>, target: &ConnectionTarget) -> ProbeReport {
    let roots = session.setup().num_roots();
    if target.screen as usize >= roots {
        log::warn!(
            "Screen {} requested but the display has {} screen(s)",
            target.screen,
            roots
        );
    }

    let max_request_length = max_request_length(&mut session);

    let font_paths = match extensions::font_paths(&mut session) {
        Ok(paths) => Some(paths),
        Err(e) => {
            log::error!("Failed to get X font search paths: {}", e);
            None
        }
    };

    let extensions = match extensions::list_extensions(&mut session) {
        Ok(names) => Some(extensions::describe_extensions(&mut session, names)),
        Err(e) => {
            log::error!("Failed to query supported X extensions: {}", e);
            None
        }
    };

    let setup = session.close();

    ProbeReport {
        target: target.clone(),
        setup,
        max_request_length,
        font_paths,
        extensions,
    }
}

/// Maximum request length in bytes, raised by BIG-REQUESTS when available
fn max_request_length<S: Read + Write>(session: &mut Session<S>) -> usize {
    let from_setup = 4 * session.setup().maximum_request_length as usize;

    let opcode = extensions::resolve_opcode(session, BIG_REQUESTS);
    if opcode == 0 {
        return from_setup;
    }

    match extensions::query_version(session, BIG_REQUESTS, opcode) {
        Ok(outcome) => outcome
            .max_request_length
            .map(|units| 4 * units as usize)
            .unwrap_or(from_setup),
        Err(e) => {
            log::warn!("BigReqEnable failed: {}", e);
            from_setup
        }
    }
}
