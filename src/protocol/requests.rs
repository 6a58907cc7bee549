//! X11 protocol requests
//!
//! Core request opcodes used by the client and the replies they produce.
//! Every reply starts with the same 32-byte block; its length field counts
//! additional 4-byte units that follow the block.

use super::errors::*;
use super::parser::WireReader;

/// Core request opcodes issued by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestOpcode {
    GetFontPath = 52,
    QueryExtension = 98,
    ListExtensions = 99,
}

/// First byte of a server packet
pub mod reply_status {
    pub const ERROR: u8 = 0;
    pub const REPLY: u8 = 1;
}

/// Size of the fixed part of every reply, error and event
pub const REPLY_SIZE: usize = 32;

/// The generic reply envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyHeader {
    pub status: u8,
    /// Reply-specific byte (e.g. a count or a version field)
    pub data: u8,
    pub sequence: u16,
    /// Additional data length in 4-byte units
    pub length: u32,
}

impl ReplyHeader {
    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        Ok(ReplyHeader {
            status: reader.u8()?,
            data: reader.u8()?,
            sequence: reader.u16()?,
            length: reader.u32()?,
        })
    }

    pub fn is_reply(&self) -> bool {
        self.status == reply_status::REPLY
    }

    /// Number of bytes that follow the 32-byte block
    pub fn additional_len(&self) -> usize {
        self.length as usize * 4
    }
}

/// QueryExtension reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryExtensionReply {
    pub present: bool,
    pub major_opcode: u8,
    pub first_event: u8,
    pub first_error: u8,
}

impl QueryExtensionReply {
    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        let _header = ReplyHeader::decode(reader)?;
        let present = reader.bool()?;
        let major_opcode = reader.u8()?;
        let first_event = reader.u8()?;
        let first_error = reader.u8()?;
        reader.skip(20)?;

        Ok(QueryExtensionReply {
            present,
            major_opcode,
            first_event,
            first_error,
        })
    }

    /// Major opcode, or 0 when the server does not have the extension
    pub fn opcode(&self) -> u8 {
        if self.present {
            self.major_opcode
        } else {
            0
        }
    }
}

/// ListExtensions reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListExtensionsReply {
    pub names: Vec<String>,
}

impl ListExtensionsReply {
    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        let header = ReplyHeader::decode(reader)?;
        reader.skip(24)?;
        let names = reader.list(header.data as usize, |r| r.pascal_string())?;
        Ok(ListExtensionsReply { names })
    }
}

/// GetFontPath reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetFontPathReply {
    pub paths: Vec<String>,
}

impl GetFontPathReply {
    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        let _header = ReplyHeader::decode(reader)?;
        let num_strings = reader.u16()?;
        reader.skip(22)?;
        let paths = reader.list(num_strings as usize, |r| r.pascal_string())?;
        Ok(GetFontPathReply { paths })
    }
}
