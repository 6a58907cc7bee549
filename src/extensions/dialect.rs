//! Extension version queries
//!
//! Extensions disagree on how their version is queried. Some take no
//! arguments, others expect the client to propose a version; fields are 8, 16
//! or 32 bits wide; a few use a minor opcode other than 0 or a layout of their
//! own. [`VersionDialect`] describes one such shape and [`DIALECTS`] maps
//! extension names to their shape. A single executor, [`query_version`], runs
//! any of them.

use crate::error::QueryError;
use crate::protocol::*;
use crate::session::Session;
use std::fmt;
use std::io::{Read, Write};

/// Minor opcode of BigReqEnable
pub const BIG_REQUESTS_ENABLE: u8 = 0;

/// Width of the version fields in a request or reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    W8,
    W16,
    W32,
}

impl FieldWidth {
    /// Bytes occupied by the major/minor pair
    pub fn pair_size(self) -> usize {
        match self {
            FieldWidth::W8 => 2,
            FieldWidth::W16 => 4,
            FieldWidth::W32 => 8,
        }
    }
}

/// Wire shape of an extension's version query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionDialect {
    /// Minor opcode 0, no request body, version fields of `width` in the reply
    NoParam { width: FieldWidth },
    /// The request proposes a version; the reply answers with its own
    Param {
        request: FieldWidth,
        reply: FieldWidth,
        minor_opcode: u8,
    },
    /// XTEST: 8-bit major in the reply header, 16-bit minor
    XTest,
    /// BIG-REQUESTS has no version query; BigReqEnable is sent instead
    BigRequests,
    Unknown,
}

impl VersionDialect {
    const fn param(width: FieldWidth, minor_opcode: u8) -> Self {
        VersionDialect::Param {
            request: width,
            reply: width,
            minor_opcode,
        }
    }

    /// Build the query request for an extension with major opcode `opcode`
    pub fn encode_request(&self, encoder: &RequestEncoder, opcode: u8) -> Option<Vec<u8>> {
        let mut writer = encoder.writer(12);

        match *self {
            VersionDialect::NoParam { .. } => {
                writer.u8(opcode).u8(0).u16(1);
            }
            VersionDialect::BigRequests => {
                writer.u8(opcode).u8(BIG_REQUESTS_ENABLE).u16(1);
            }
            VersionDialect::Param {
                request,
                minor_opcode,
                ..
            } => {
                let length = 1 + padded_len(request.pair_size()) / 4;
                writer.u8(opcode).u8(minor_opcode).u16(length as u16);
                // Propose the highest version the field can express
                match request {
                    FieldWidth::W8 => writer.u8(u8::MAX).u8(u8::MAX).u16(0),
                    FieldWidth::W16 => writer.u16(u16::MAX).u16(u16::MAX),
                    FieldWidth::W32 => writer.u32(u32::MAX).u32(u32::MAX),
                };
            }
            VersionDialect::XTest => {
                writer
                    .u8(opcode)
                    .u8(0)
                    .u16(2)
                    .u8(u8::MAX)
                    .u8(0)
                    .u16(u16::MAX);
            }
            VersionDialect::Unknown => return None,
        }

        Some(writer.finish())
    }

    /// Decode a complete reply to this dialect's request
    pub fn decode_reply(&self, reply: &[u8], byte_order: ByteOrder) -> Result<QueryOutcome, QueryError> {
        let mut reader = WireReader::new(reply, byte_order);
        let header = ReplyHeader::decode(&mut reader)?;
        if !header.is_reply() {
            return Err(QueryError::UnexpectedStatus(header.status));
        }

        match *self {
            VersionDialect::NoParam { width } | VersionDialect::Param { reply: width, .. } => {
                let version = read_version(&mut reader, width)?;
                Ok(QueryOutcome::version(version))
            }
            VersionDialect::XTest => {
                let minor = reader.u16()?;
                Ok(QueryOutcome::version(ExtensionVersion::new(
                    header.data as u32,
                    minor as u32,
                )))
            }
            VersionDialect::BigRequests => {
                let max_request_length = reader.u32()?;
                Ok(QueryOutcome {
                    version: ExtensionVersion::new(2, 0),
                    max_request_length: Some(max_request_length),
                })
            }
            VersionDialect::Unknown => Err(QueryError::UnknownDialect(String::new())),
        }
    }
}

fn read_version(reader: &mut WireReader<'_>, width: FieldWidth) -> Result<ExtensionVersion, DecodeError> {
    let (major, minor) = match width {
        FieldWidth::W8 => (reader.u8()? as u32, reader.u8()? as u32),
        FieldWidth::W16 => (reader.u16()? as u32, reader.u16()? as u32),
        FieldWidth::W32 => (reader.u32()?, reader.u32()?),
    };
    Ok(ExtensionVersion::new(major, minor))
}

/// Extension version as reported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionVersion {
    pub major: u32,
    pub minor: u32,
}

impl ExtensionVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        ExtensionVersion { major, minor }
    }
}

impl fmt::Display for ExtensionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

/// Result of a successful version query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOutcome {
    pub version: ExtensionVersion,
    /// Maximum request length in 4-byte units (BIG-REQUESTS only)
    pub max_request_length: Option<u32>,
}

impl QueryOutcome {
    fn version(version: ExtensionVersion) -> Self {
        QueryOutcome {
            version,
            max_request_length: None,
        }
    }
}

const NO_PARAM_16: VersionDialect = VersionDialect::NoParam {
    width: FieldWidth::W16,
};
const NO_PARAM_32: VersionDialect = VersionDialect::NoParam {
    width: FieldWidth::W32,
};
const PARAM_8: VersionDialect = VersionDialect::param(FieldWidth::W8, 0);
const PARAM_16: VersionDialect = VersionDialect::param(FieldWidth::W16, 0);
const PARAM_32: VersionDialect = VersionDialect::param(FieldWidth::W32, 0);
const PARAM_8_REPLY_16: VersionDialect = VersionDialect::Param {
    request: FieldWidth::W8,
    reply: FieldWidth::W16,
    minor_opcode: 0,
};

/// Known extensions and the shape of their version query
pub static DIALECTS: &[(&str, VersionDialect)] = &[
    ("Apple-DRI", NO_PARAM_16),
    ("Apple-WM", NO_PARAM_16),
    ("BIG-REQUESTS", VersionDialect::BigRequests),
    ("Composite", PARAM_32),
    ("DAMAGE", PARAM_32),
    ("DOUBLE-BUFFER", PARAM_8),
    ("DPMS", PARAM_16),
    ("DMX", NO_PARAM_32),
    ("DRI2", PARAM_32),
    ("DRI3", PARAM_32),
    ("Extended-Visual-Information", NO_PARAM_16),
    ("FontCache", NO_PARAM_16),
    ("GLX", VersionDialect::param(FieldWidth::W32, 7)),
    ("Generic Event Extension", PARAM_16),
    ("LBX", NO_PARAM_16),
    ("LGE", NO_PARAM_32),
    ("MIT-SCREEN-SAVER", PARAM_8_REPLY_16),
    ("MIT-SHM", NO_PARAM_16),
    ("NV-CONTROL", NO_PARAM_16),
    ("Present", PARAM_32),
    ("RANDR", PARAM_32),
    ("RECORD", PARAM_16),
    ("RENDER", PARAM_32),
    ("SECURITY", PARAM_16),
    ("SELinux", PARAM_8_REPLY_16),
    ("SGI-GLX", VersionDialect::param(FieldWidth::W32, 7)),
    ("SHAPE", NO_PARAM_16),
    ("SYNC", PARAM_8),
    ("TOG-CUP", PARAM_16),
    ("Windows-WM", NO_PARAM_16),
    ("X-Resource", PARAM_8),
    ("XC-APPGROUP", PARAM_16),
    ("XC-MISC", PARAM_16),
    ("XC-VidModeExtension", NO_PARAM_16),
    ("XCALIBRATE", PARAM_32),
    ("XFIXES", PARAM_32),
    ("XFree86-Bigfont", NO_PARAM_16),
    ("XFree86-DGA", NO_PARAM_16),
    ("XFree86-DRI", NO_PARAM_16),
    ("XFree86-Misc", NO_PARAM_16),
    ("XFree86-Rush", NO_PARAM_16),
    ("XFree86-VidModeExtension", NO_PARAM_16),
    ("XINERAMA", PARAM_8),
    ("XInputExtension", VersionDialect::param(FieldWidth::W16, 47)),
    ("XKEYBOARD", PARAM_16),
    ("XpExtension", NO_PARAM_16),
    ("XTEST", VersionDialect::XTest),
    ("XVideo", NO_PARAM_16),
    ("XVideo-MotionCompensation", NO_PARAM_32),
];

/// Version query shape for an extension name
pub fn dialect_for(name: &str) -> VersionDialect {
    DIALECTS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, dialect)| *dialect)
        .unwrap_or(VersionDialect::Unknown)
}

/// Query the version of extension `name`, whose major opcode is `opcode`
pub fn query_version<S: Read + Write>(
    session: &mut Session<S>,
    name: &str,
    opcode: u8,
) -> Result<QueryOutcome, QueryError> {
    let dialect = dialect_for(name);
    let request = dialect
        .encode_request(session.encoder(), opcode)
        .ok_or_else(|| QueryError::UnknownDialect(name.to_string()))?;

    let reply = session.round_trip(&request)?;
    let outcome = dialect.decode_reply(&reply, session.byte_order())?;
    log::debug!("{} (opcode {}): {}", name, opcode, outcome.version);
    Ok(outcome)
}
