//! Extension directory
//!
//! Core requests that discover what the server supports: QueryExtension to
//! resolve an extension's major opcode, ListExtensions to enumerate names and
//! GetFontPath for the font search path.

pub mod dialect;

pub use dialect::*;

use crate::error::QueryError;
use crate::protocol::*;
use crate::session::Session;
use std::io::{Read, Write};

pub const BIG_REQUESTS: &str = "BIG-REQUESTS";

/// Name under which an extension's opcode and version are queried
///
/// The NVIDIA driver advertises NV-GLX without a documented version request;
/// it is answered through GLX.
pub fn canonical_name(name: &str) -> &str {
    match name {
        "NV-GLX" => "GLX",
        other => other,
    }
}

pub fn query_extension<S: Read + Write>(
    session: &mut Session<S>,
    name: &str,
) -> Result<QueryExtensionReply, QueryError> {
    let request = session.encoder().encode_query_extension(name);
    let reply = session.round_trip(&request)?;
    let mut reader = WireReader::new(&reply, session.byte_order());
    Ok(QueryExtensionReply::decode(&mut reader)?)
}

/// Major opcode of `name`, or 0 if the server lacks it or the query fails
pub fn resolve_opcode<S: Read + Write>(session: &mut Session<S>, name: &str) -> u8 {
    match query_extension(session, name) {
        Ok(reply) => reply.opcode(),
        Err(e) => {
            log::warn!("Failed to query extension {}: {}", name, e);
            0
        }
    }
}

pub fn list_extensions<S: Read + Write>(session: &mut Session<S>) -> Result<Vec<String>, QueryError> {
    let request = session.encoder().encode_list_extensions();
    let reply = session.round_trip(&request)?;
    let mut reader = WireReader::new(&reply, session.byte_order());
    Ok(ListExtensionsReply::decode(&mut reader)?.names)
}

pub fn font_paths<S: Read + Write>(session: &mut Session<S>) -> Result<Vec<String>, QueryError> {
    let request = session.encoder().encode_get_font_path();
    let reply = session.round_trip(&request)?;
    let mut reader = WireReader::new(&reply, session.byte_order());
    Ok(GetFontPathReply::decode(&mut reader)?.paths)
}

/// An extension advertised by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRecord {
    pub name: String,
    /// 0 when the opcode could not be resolved
    pub opcode: u8,
    pub version: Option<ExtensionVersion>,
}

/// Resolve the opcode and version of every advertised extension, sorted by name
///
/// Failures are per extension and leave gaps in the records.
pub fn describe_extensions<S: Read + Write>(
    session: &mut Session<S>,
    mut names: Vec<String>,
) -> Vec<ExtensionRecord> {
    names.sort();

    names
        .into_iter()
        .map(|name| {
            let query_name = canonical_name(&name);
            let opcode = resolve_opcode(session, query_name);
            let version = if opcode == 0 {
                None
            } else {
                match query_version(session, query_name, opcode) {
                    Ok(outcome) => Some(outcome.version),
                    Err(QueryError::UnknownDialect(_)) => {
                        log::debug!("No version query known for {}", name);
                        None
                    }
                    Err(e) => {
                        log::warn!("Failed to query {} version: {}", name, e);
                        None
                    }
                }
            };

            ExtensionRecord {
                name,
                opcode,
                version,
            }
        })
        .collect()
}
