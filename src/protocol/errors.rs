//! X11 protocol error codes and decode errors

use super::parser::WireReader;
use std::fmt;
use thiserror::Error;

/// X11 error codes as defined in the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    Request = 1,
    Value = 2,
    Window = 3,
    Pixmap = 4,
    Atom = 5,
    Cursor = 6,
    Font = 7,
    Match = 8,
    Drawable = 9,
    Access = 10,
    Alloc = 11,
    Colormap = 12,
    GContext = 13,
    IDChoice = 14,
    Name = 15,
    Length = 16,
    Implementation = 17,
}

impl ErrorCode {
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            1 => Some(ErrorCode::Request),
            2 => Some(ErrorCode::Value),
            3 => Some(ErrorCode::Window),
            4 => Some(ErrorCode::Pixmap),
            5 => Some(ErrorCode::Atom),
            6 => Some(ErrorCode::Cursor),
            7 => Some(ErrorCode::Font),
            8 => Some(ErrorCode::Match),
            9 => Some(ErrorCode::Drawable),
            10 => Some(ErrorCode::Access),
            11 => Some(ErrorCode::Alloc),
            12 => Some(ErrorCode::Colormap),
            13 => Some(ErrorCode::GContext),
            14 => Some(ErrorCode::IDChoice),
            15 => Some(ErrorCode::Name),
            16 => Some(ErrorCode::Length),
            17 => Some(ErrorCode::Implementation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Request => "Request: bad request code",
            ErrorCode::Value => "Value: integer parameter out of range",
            ErrorCode::Window => "Window: invalid Window parameter",
            ErrorCode::Pixmap => "Pixmap: invalid Pixmap parameter",
            ErrorCode::Atom => "Atom: invalid Atom parameter",
            ErrorCode::Cursor => "Cursor: invalid Cursor parameter",
            ErrorCode::Font => "Font: invalid Font parameter",
            ErrorCode::Match => "Match: parameter mismatch",
            ErrorCode::Drawable => "Drawable: invalid Drawable parameter",
            ErrorCode::Access => "Access: attempt to access private resource",
            ErrorCode::Alloc => "Alloc: insufficient resources",
            ErrorCode::Colormap => "Colormap: invalid Colormap parameter",
            ErrorCode::GContext => "GContext: invalid GC parameter",
            ErrorCode::IDChoice => "IDChoice: invalid resource ID for this connection",
            ErrorCode::Name => "Name: font or color name doesn't exist",
            ErrorCode::Length => "Length: request length incorrect",
            ErrorCode::Implementation => "Implementation: server implementation error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// X11 error packet received in place of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X11Error {
    /// Raw error code; extensions define codes above the core range
    pub code: u8,
    pub sequence: u16,
    pub bad_value: u32,
    pub minor_opcode: u16,
    pub major_opcode: u8,
}

impl X11Error {
    /// Decode an error packet (status byte 0) from its 32 bytes
    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        let _status = reader.u8()?;
        let code = reader.u8()?;
        let sequence = reader.u16()?;
        let bad_value = reader.u32()?;
        let minor_opcode = reader.u16()?;
        let major_opcode = reader.u8()?;
        reader.skip(21)?;

        Ok(X11Error {
            code,
            sequence,
            bad_value,
            minor_opcode,
            major_opcode,
        })
    }

    /// Core error code, if this is one of the protocol's own codes
    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_u8(self.code)
    }
}

impl fmt::Display for X11Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_code() {
            Some(code) => write!(f, "X11 Error: {}", code)?,
            None => write!(f, "X11 Error: extension error {}", self.code)?,
        }
        write!(
            f,
            " (sequence: {}, value: 0x{:08x}, major: {}, minor: {})",
            self.sequence, self.bad_value, self.major_opcode, self.minor_opcode
        )
    }
}

/// Failure to decode a structure from a received buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A read would have run past the end of the buffer
    #[error("truncated data: needed {wanted} bytes at offset {offset}, only {available} left")]
    Truncated {
        offset: usize,
        wanted: usize,
        available: usize,
    },
}
