//! X11 request encoder
//!
//! This module encodes client requests to the wire protocol.

use super::*;
use byteorder::{BigEndian, ByteOrder as Endian, LittleEndian};
use zeroize::Zeroizing;

/// Growable output buffer that writes integers in a fixed byte order
#[derive(Debug, Clone)]
pub struct WireWriter {
    buf: Vec<u8>,
    byte_order: ByteOrder,
}

impl WireWriter {
    pub fn new(byte_order: ByteOrder) -> Self {
        WireWriter {
            buf: Vec::new(),
            byte_order,
        }
    }

    pub fn with_capacity(byte_order: ByteOrder, capacity: usize) -> Self {
        WireWriter {
            buf: Vec::with_capacity(capacity),
            byte_order,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.u8(if value { 1 } else { 0 })
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        let mut bytes = [0u8; 2];
        match self.byte_order {
            ByteOrder::LSBFirst => LittleEndian::write_u16(&mut bytes, value),
            ByteOrder::MSBFirst => BigEndian::write_u16(&mut bytes, value),
        }
        self.buf.extend_from_slice(&bytes);
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        let mut bytes = [0u8; 4];
        match self.byte_order {
            ByteOrder::LSBFirst => LittleEndian::write_u32(&mut bytes, value),
            ByteOrder::MSBFirst => BigEndian::write_u32(&mut bytes, value),
        }
        self.buf.extend_from_slice(&bytes);
        self
    }

    pub fn zeros(&mut self, n: usize) -> &mut Self {
        self.buf.resize(self.buf.len() + n, 0);
        self
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    /// Append `data` followed by zero padding up to a 4-byte boundary
    pub fn bytes_padded(&mut self, data: &[u8]) -> &mut Self {
        self.bytes(data).zeros(pad(data.len()))
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Request encoder
#[derive(Debug, Clone)]
pub struct RequestEncoder {
    byte_order: ByteOrder,
}

impl RequestEncoder {
    pub fn new(byte_order: ByteOrder) -> Self {
        RequestEncoder { byte_order }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn writer(&self, capacity: usize) -> WireWriter {
        WireWriter::with_capacity(self.byte_order, capacity)
    }

    /// Encode the connection setup request
    ///
    /// The returned buffer holds the authorization data and is wiped on drop.
    pub fn encode_setup_request(
        &self,
        auth_protocol_name: &[u8],
        auth_protocol_data: &[u8],
    ) -> Zeroizing<Vec<u8>> {
        let total = SetupRequest::HEADER_SIZE
            + padded_len(auth_protocol_name.len())
            + padded_len(auth_protocol_data.len());
        let mut writer = self.writer(total);

        writer
            .u8(self.byte_order.marker())
            .u8(0) // unused
            .u16(PROTOCOL_MAJOR_VERSION)
            .u16(PROTOCOL_MINOR_VERSION)
            .u16(auth_protocol_name.len() as u16)
            .u16(auth_protocol_data.len() as u16)
            .u16(0) // unused
            .bytes_padded(auth_protocol_name)
            .bytes_padded(auth_protocol_data);

        Zeroizing::new(writer.finish())
    }

    /// Encode QueryExtension request
    pub fn encode_query_extension(&self, name: &str) -> Vec<u8> {
        let name = name.as_bytes();
        let length = 2 + padded_len(name.len()) / 4;
        let mut writer = self.writer(length * 4);

        writer
            .u8(RequestOpcode::QueryExtension as u8)
            .u8(0) // unused
            .u16(length as u16)
            .u16(name.len() as u16)
            .u16(0) // unused
            .bytes_padded(name);

        writer.finish()
    }

    /// Encode ListExtensions request
    pub fn encode_list_extensions(&self) -> Vec<u8> {
        self.encode_no_argument(RequestOpcode::ListExtensions)
    }

    /// Encode GetFontPath request
    pub fn encode_get_font_path(&self) -> Vec<u8> {
        self.encode_no_argument(RequestOpcode::GetFontPath)
    }

    fn encode_no_argument(&self, opcode: RequestOpcode) -> Vec<u8> {
        let mut writer = self.writer(4);
        writer.u8(opcode as u8).u8(0).u16(1);
        writer.finish()
    }
}
