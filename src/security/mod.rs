//! Authorization data
//!
//! This module finds the credential a client presents during connection setup.
//! Credentials come from an Xauthority file: a sequence of records, each made of
//! a big-endian u16 address family followed by four byte strings (address,
//! display number, protocol name, protocol data), each prefixed by a big-endian
//! u16 length.
//!
//! Secret bytes are held in [`Zeroizing`] buffers and never printed.

use crate::error::AuthError;
use crate::protocol::{ByteOrder, DecodeError, WireReader};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Address families used in Xauthority records
pub mod family {
    pub const INTERNET: u16 = 0;
    pub const DECNET: u16 = 1;
    pub const CHAOS: u16 = 2;
    pub const SERVER_INTERPRETED: u16 = 5;
    pub const INTERNET6: u16 = 6;
    pub const LOCAL: u16 = 256;
    /// Matches any address
    pub const WILD: u16 = 65535;
}

/// Authorization protocol name and data sent in the setup request
#[derive(Clone, Default)]
pub struct Credential {
    pub name: Vec<u8>,
    pub data: Zeroizing<Vec<u8>>,
}

impl Credential {
    pub fn new(name: impl Into<Vec<u8>>, data: Vec<u8>) -> Self {
        Credential {
            name: name.into(),
            data: Zeroizing::new(data),
        }
    }

    pub fn protocol_name(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.protocol_name())
            .field("data", &format_args!("<{} bytes redacted>", self.data.len()))
            .finish()
    }
}

/// One record of an Xauthority file
pub struct XauthEntry {
    pub family: u16,
    pub address: Vec<u8>,
    pub number: Vec<u8>,
    pub name: Vec<u8>,
    pub data: Zeroizing<Vec<u8>>,
}

impl XauthEntry {
    fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        let family = reader.u16()?;
        let address = reader.counted_bytes()?.to_vec();
        let number = reader.counted_bytes()?.to_vec();
        let name = reader.counted_bytes()?.to_vec();
        let data = Zeroizing::new(reader.counted_bytes()?.to_vec());

        Ok(XauthEntry {
            family,
            address,
            number,
            name,
            data,
        })
    }

    /// Display number this record applies to, if it is a valid number
    pub fn display(&self) -> Option<u32> {
        std::str::from_utf8(&self.number).ok()?.parse().ok()
    }

    pub fn matches(&self, hostname: &str, display: u32) -> bool {
        let address_matches = self.family == family::WILD || self.address == hostname.as_bytes();
        address_matches && self.display() == Some(display)
    }

    fn credential(&self) -> Credential {
        Credential {
            name: self.name.clone(),
            data: self.data.clone(),
        }
    }
}

impl fmt::Debug for XauthEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XauthEntry")
            .field("family", &self.family)
            .field("address", &String::from_utf8_lossy(&self.address))
            .field("number", &String::from_utf8_lossy(&self.number))
            .field("name", &String::from_utf8_lossy(&self.name))
            .finish_non_exhaustive()
    }
}

/// Parse every complete record of an Xauthority file
///
/// A truncated trailing record ends parsing; the records before it are kept.
pub fn parse_entries(bytes: &[u8]) -> Vec<XauthEntry> {
    let mut reader = WireReader::new(bytes, ByteOrder::MSBFirst);
    let mut entries = Vec::new();

    while reader.remaining() > 0 {
        match XauthEntry::decode(&mut reader) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                log::warn!("Ignoring malformed Xauthority record: {}", e);
                break;
            }
        }
    }

    entries
}

/// First credential in `bytes` matching the host and display
pub fn find_credential(bytes: &[u8], hostname: &str, display: u32) -> Option<Credential> {
    parse_entries(bytes)
        .iter()
        .find(|entry| entry.matches(hostname, display))
        .map(XauthEntry::credential)
}

/// Anything that can produce a credential for a display
pub trait CredentialSource {
    fn lookup(&self, hostname: &str, display: u32) -> Result<Option<Credential>, AuthError>;
}

/// Credentials read from an Xauthority file on disk
#[derive(Debug, Clone)]
pub struct XauthorityFile {
    path: PathBuf,
}

impl XauthorityFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        XauthorityFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialSource for XauthorityFile {
    fn lookup(&self, hostname: &str, display: u32) -> Result<Option<Credential>, AuthError> {
        log::debug!("Reading authorization data from {}", self.path.display());
        let bytes = Zeroizing::new(std::fs::read(&self.path).map_err(|source| AuthError::Read {
            path: self.path.clone(),
            source,
        })?);

        let credential = find_credential(&bytes, hostname, display);
        if let Some(credential) = &credential {
            log::debug!(
                "Using {} for {}:{}",
                credential.protocol_name(),
                hostname,
                display
            );
        }
        Ok(credential)
    }
}
