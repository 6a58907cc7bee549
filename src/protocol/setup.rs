//! X11 connection setup protocol
//!
//! This module holds the wire structures of the initial connection handshake
//! and the decoder for the setup payload a server sends on success.
//!
//! The payload is nested and self-describing: a fixed header carries the
//! vendor length and the format/screen counts, each screen carries its depth
//! count and each depth its visual count. Decoding is a single forward pass
//! through a [`WireReader`]; every list is sized by the count read from its
//! enclosing structure.

use super::*;

/// Connection setup request from client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupRequest {
    pub byte_order: ByteOrder,
    pub protocol_major_version: u16,
    pub protocol_minor_version: u16,
    pub authorization_protocol_name: Vec<u8>,
    pub authorization_protocol_data: Vec<u8>,
}

impl SetupRequest {
    /// Fixed part: byte order, unused, major, minor, name len, data len, unused
    pub const HEADER_SIZE: usize = 12;

    /// Decode a setup request as a server would see it
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let byte_order = match bytes.first() {
            Some(b'B') => ByteOrder::MSBFirst,
            _ => ByteOrder::LSBFirst,
        };
        let mut reader = WireReader::new(bytes, byte_order);
        reader.skip(2)?;
        let protocol_major_version = reader.u16()?;
        let protocol_minor_version = reader.u16()?;
        let auth_proto_name_len = reader.u16()? as usize;
        let auth_proto_data_len = reader.u16()? as usize;
        reader.skip(2)?;

        let authorization_protocol_name = reader.bytes(auth_proto_name_len)?.to_vec();
        reader.skip(pad(auth_proto_name_len))?;
        let authorization_protocol_data = reader.bytes(auth_proto_data_len)?.to_vec();
        reader.skip(pad(auth_proto_data_len))?;

        Ok(SetupRequest {
            byte_order,
            protocol_major_version,
            protocol_minor_version,
            authorization_protocol_name,
            authorization_protocol_data,
        })
    }
}

/// Setup response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStatus {
    Failed = 0,
    Success = 1,
    Authenticate = 2,
}

impl SetupStatus {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(SetupStatus::Failed),
            1 => Some(SetupStatus::Success),
            2 => Some(SetupStatus::Authenticate),
            _ => None,
        }
    }
}

/// Fixed 8-byte header that precedes every setup response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupResponseHeader {
    pub status: u8,
    /// Length of the reason string (Failed responses only)
    pub reason_length: u8,
    pub protocol_major_version: u16,
    pub protocol_minor_version: u16,
    /// Additional data length in 4-byte units
    pub additional_data_length: u16,
}

impl SetupResponseHeader {
    pub const SIZE: usize = 8;

    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        Ok(SetupResponseHeader {
            status: reader.u8()?,
            reason_length: reader.u8()?,
            protocol_major_version: reader.u16()?,
            protocol_minor_version: reader.u16()?,
            additional_data_length: reader.u16()?,
        })
    }

    pub fn additional_len(&self) -> usize {
        self.additional_data_length as usize * 4
    }
}

/// Format information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub depth: u8,
    pub bits_per_pixel: u8,
    pub scanline_pad: u8,
}

impl Format {
    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        let depth = reader.u8()?;
        let bits_per_pixel = reader.u8()?;
        let scanline_pad = reader.u8()?;
        reader.skip(5)?;
        Ok(Format {
            depth,
            bits_per_pixel,
            scanline_pad,
        })
    }

    pub fn encode(&self, writer: &mut WireWriter) {
        writer
            .u8(self.depth)
            .u8(self.bits_per_pixel)
            .u8(self.scanline_pad)
            .zeros(5);
    }
}

/// Visual type information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualType {
    pub visual_id: VisualID,
    pub class: u8,
    pub bits_per_rgb_value: u8,
    pub colormap_entries: u16,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
}

impl VisualType {
    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        let visual_id = VisualID::new(reader.u32()?);
        let class = reader.u8()?;
        let bits_per_rgb_value = reader.u8()?;
        let colormap_entries = reader.u16()?;
        let red_mask = reader.u32()?;
        let green_mask = reader.u32()?;
        let blue_mask = reader.u32()?;
        reader.skip(4)?;

        Ok(VisualType {
            visual_id,
            class,
            bits_per_rgb_value,
            colormap_entries,
            red_mask,
            green_mask,
            blue_mask,
        })
    }

    pub fn visual_class(&self) -> Option<VisualClass> {
        VisualClass::from_u8(self.class)
    }

    pub fn encode(&self, writer: &mut WireWriter) {
        writer
            .u32(self.visual_id.get())
            .u8(self.class)
            .u8(self.bits_per_rgb_value)
            .u16(self.colormap_entries)
            .u32(self.red_mask)
            .u32(self.green_mask)
            .u32(self.blue_mask)
            .zeros(4);
    }
}

/// Depth information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Depth {
    pub depth: u8,
    pub visuals: Vec<VisualType>,
}

impl Depth {
    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        let depth = reader.u8()?;
        reader.skip(1)?;
        let num_visuals = reader.u16()? as usize;
        reader.skip(4)?;
        let visuals = reader.list(num_visuals, VisualType::decode)?;
        Ok(Depth { depth, visuals })
    }

    pub fn num_visuals(&self) -> usize {
        self.visuals.len()
    }

    pub fn encode(&self, writer: &mut WireWriter) {
        writer
            .u8(self.depth)
            .u8(0)
            .u16(self.visuals.len() as u16)
            .zeros(4);

        for visual in &self.visuals {
            visual.encode(writer);
        }
    }
}

/// Screen information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub root: Window,
    pub default_colormap: Colormap,
    pub white_pixel: u32,
    pub black_pixel: u32,
    pub current_input_masks: u32,
    pub width_in_pixels: u16,
    pub height_in_pixels: u16,
    pub width_in_millimeters: u16,
    pub height_in_millimeters: u16,
    pub min_installed_maps: u16,
    pub max_installed_maps: u16,
    pub root_visual: VisualID,
    pub backing_stores: BackingStores,
    pub save_unders: bool,
    pub root_depth: u8,
    pub allowed_depths: Vec<Depth>,
}

impl Screen {
    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        let root = Window::new(reader.u32()?);
        let default_colormap = Colormap::new(reader.u32()?);
        let white_pixel = reader.u32()?;
        let black_pixel = reader.u32()?;
        let current_input_masks = reader.u32()?;
        let width_in_pixels = reader.u16()?;
        let height_in_pixels = reader.u16()?;
        let width_in_millimeters = reader.u16()?;
        let height_in_millimeters = reader.u16()?;
        let min_installed_maps = reader.u16()?;
        let max_installed_maps = reader.u16()?;
        let root_visual = VisualID::new(reader.u32()?);
        let backing_stores = BackingStores::from_u8(reader.u8()?);
        let save_unders = reader.bool()?;
        let root_depth = reader.u8()?;
        let num_allowed_depths = reader.u8()? as usize;
        let allowed_depths = reader.list(num_allowed_depths, Depth::decode)?;

        Ok(Screen {
            root,
            default_colormap,
            white_pixel,
            black_pixel,
            current_input_masks,
            width_in_pixels,
            height_in_pixels,
            width_in_millimeters,
            height_in_millimeters,
            min_installed_maps,
            max_installed_maps,
            root_visual,
            backing_stores,
            save_unders,
            root_depth,
            allowed_depths,
        })
    }

    pub fn num_allowed_depths(&self) -> usize {
        self.allowed_depths.len()
    }

    /// Whether the root window currently selects `mask` (see [`event_mask`])
    pub fn selects(&self, mask: u32) -> bool {
        self.current_input_masks & mask != 0
    }

    pub fn encode(&self, writer: &mut WireWriter) {
        writer
            .u32(self.root.id().get())
            .u32(self.default_colormap.id().get())
            .u32(self.white_pixel)
            .u32(self.black_pixel)
            .u32(self.current_input_masks)
            .u16(self.width_in_pixels)
            .u16(self.height_in_pixels)
            .u16(self.width_in_millimeters)
            .u16(self.height_in_millimeters)
            .u16(self.min_installed_maps)
            .u16(self.max_installed_maps)
            .u32(self.root_visual.get())
            .u8(self.backing_stores as u8)
            .bool(self.save_unders)
            .u8(self.root_depth)
            .u8(self.allowed_depths.len() as u8);

        for depth in &self.allowed_depths {
            depth.encode(writer);
        }
    }
}

/// Release number as packed by the server: `major * 10^7 + minor * 10^5 + patch * 10^3 + build`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseNumber {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub build: u32,
}

impl ReleaseNumber {
    pub fn unpack(release: u32) -> Self {
        ReleaseNumber {
            major: release / 10_000_000,
            minor: (release / 100_000) % 100,
            patch: (release / 1000) % 100,
            build: release % 1000,
        }
    }
}

impl std::fmt::Display for ReleaseNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.build != 0 {
            write!(f, ".{}", self.build)?;
        }
        Ok(())
    }
}

/// Decoded setup payload of a successful connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupInfo {
    pub protocol_major_version: u16,
    pub protocol_minor_version: u16,
    pub release_number: u32,
    pub resource_id_base: u32,
    pub resource_id_mask: u32,
    pub motion_buffer_size: u32,
    /// In 4-byte units; BIG-REQUESTS may raise the effective limit
    pub maximum_request_length: u16,
    pub image_byte_order: ByteOrder,
    pub bitmap_format_bit_order: ByteOrder,
    pub bitmap_format_scanline_unit: u8,
    pub bitmap_format_scanline_pad: u8,
    pub min_keycode: u8,
    pub max_keycode: u8,
    pub vendor: String,
    pub pixmap_formats: Vec<Format>,
    pub roots: Vec<Screen>,
}

impl SetupInfo {
    /// Decode the additional data of a Success setup response
    ///
    /// The protocol version comes from the response header and is passed in.
    pub fn decode(
        payload: &[u8],
        byte_order: ByteOrder,
        protocol_major_version: u16,
        protocol_minor_version: u16,
    ) -> Result<Self, DecodeError> {
        let mut reader = WireReader::new(payload, byte_order);
        let setup = Self::read_from(&mut reader, protocol_major_version, protocol_minor_version)?;

        if reader.remaining() != 0 {
            log::debug!(
                "Setup payload has {} trailing bytes after {} screens",
                reader.remaining(),
                setup.roots.len()
            );
        }
        Ok(setup)
    }

    /// Read one setup payload, leaving `reader` just past the last screen
    pub fn read_from(
        reader: &mut WireReader<'_>,
        protocol_major_version: u16,
        protocol_minor_version: u16,
    ) -> Result<Self, DecodeError> {
        let release_number = reader.u32()?;
        let resource_id_base = reader.u32()?;
        let resource_id_mask = reader.u32()?;
        let motion_buffer_size = reader.u32()?;
        let vendor_len = reader.u16()? as usize;
        let maximum_request_length = reader.u16()?;
        let num_roots = reader.u8()? as usize;
        let num_pixmap_formats = reader.u8()? as usize;
        let image_byte_order = ByteOrder::from_u8(reader.u8()?);
        let bitmap_format_bit_order = ByteOrder::from_u8(reader.u8()?);
        let bitmap_format_scanline_unit = reader.u8()?;
        let bitmap_format_scanline_pad = reader.u8()?;
        let min_keycode = reader.u8()?;
        let max_keycode = reader.u8()?;
        reader.skip(4)?;

        let vendor = String::from_utf8_lossy(reader.bytes(vendor_len)?).into_owned();
        reader.skip(pad(vendor_len))?;

        let pixmap_formats = reader.list(num_pixmap_formats, Format::decode)?;
        let roots = reader.list(num_roots, Screen::decode)?;

        Ok(SetupInfo {
            protocol_major_version,
            protocol_minor_version,
            release_number,
            resource_id_base,
            resource_id_mask,
            motion_buffer_size,
            maximum_request_length,
            image_byte_order,
            bitmap_format_bit_order,
            bitmap_format_scanline_unit,
            bitmap_format_scanline_pad,
            min_keycode,
            max_keycode,
            vendor,
            pixmap_formats,
            roots,
        })
    }

    pub fn num_pixmap_formats(&self) -> usize {
        self.pixmap_formats.len()
    }

    pub fn num_roots(&self) -> usize {
        self.roots.len()
    }

    pub fn release(&self) -> ReleaseNumber {
        ReleaseNumber::unpack(self.release_number)
    }

    /// Encode the payload exactly as a server sends it after the response header
    pub fn encode_payload(&self, byte_order: ByteOrder) -> Vec<u8> {
        let mut writer = WireWriter::new(byte_order);

        writer
            .u32(self.release_number)
            .u32(self.resource_id_base)
            .u32(self.resource_id_mask)
            .u32(self.motion_buffer_size)
            .u16(self.vendor.len() as u16)
            .u16(self.maximum_request_length)
            .u8(self.roots.len() as u8)
            .u8(self.pixmap_formats.len() as u8)
            .u8(self.image_byte_order as u8)
            .u8(self.bitmap_format_bit_order as u8)
            .u8(self.bitmap_format_scanline_unit)
            .u8(self.bitmap_format_scanline_pad)
            .u8(self.min_keycode)
            .u8(self.max_keycode)
            .zeros(4)
            .bytes_padded(self.vendor.as_bytes());

        for format in &self.pixmap_formats {
            format.encode(&mut writer);
        }

        for screen in &self.roots {
            screen.encode(&mut writer);
        }

        writer.finish()
    }

    /// Encode a complete Success response (header followed by payload)
    pub fn encode_response(&self, byte_order: ByteOrder) -> Vec<u8> {
        let payload = self.encode_payload(byte_order);
        let mut writer = WireWriter::with_capacity(byte_order, 8 + payload.len());

        writer
            .u8(SetupStatus::Success as u8)
            .u8(0) // unused
            .u16(self.protocol_major_version)
            .u16(self.protocol_minor_version)
            .u16((payload.len() / 4) as u16)
            .bytes(&payload);

        writer.finish()
    }
}

/// Setup failed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupFailed {
    pub protocol_major_version: u16,
    pub protocol_minor_version: u16,
    pub reason: String,
}

impl SetupFailed {
    pub fn encode(&self, byte_order: ByteOrder) -> Vec<u8> {
        let mut writer = WireWriter::new(byte_order);

        writer
            .u8(SetupStatus::Failed as u8)
            .u8(self.reason.len() as u8)
            .u16(self.protocol_major_version)
            .u16(self.protocol_minor_version)
            .u16((padded_len(self.reason.len()) / 4) as u16)
            .bytes_padded(self.reason.as_bytes());

        writer.finish()
    }
}
