//! Mock X server for integration tests
//!
//! Runs on one end of a Unix socket pair in its own thread and answers the
//! connection handshake plus the handful of requests the client issues.

#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::thread::{self, JoinHandle};

use x11info::protocol::*;

/// An extension the mock server advertises
#[derive(Debug, Clone)]
pub struct MockExtension {
    pub name: String,
    pub opcode: u8,
    pub major: u32,
    pub minor: u32,
    /// Answer version queries with an error packet instead of a reply
    pub fail_version_query: bool,
}

impl MockExtension {
    pub fn new(name: &str, opcode: u8, major: u32, minor: u32) -> Self {
        MockExtension {
            name: name.to_string(),
            opcode,
            major,
            minor,
            fail_version_query: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_version_query = true;
        self
    }
}

/// What the mock server saw during a session
#[derive(Debug, Default)]
pub struct ServerLog {
    pub setup_request: Option<SetupRequest>,
    /// Every request after the handshake, as received
    pub requests: Vec<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct MockServer {
    pub setup: SetupInfo,
    pub extensions: Vec<MockExtension>,
    /// Extensions QueryExtension knows about but ListExtensions omits
    pub hidden_extensions: Vec<MockExtension>,
    pub font_paths: Vec<String>,
    /// BigReqEnable answer, in 4-byte units
    pub big_requests_max: u32,
    /// Answer the first request with a reply declaring this many 4-byte
    /// units of additional data, then hang up
    pub inflated_reply_length: Option<u32>,
    /// Refuse the connection with this reason
    pub reject: Option<String>,
}

impl MockServer {
    pub fn new(setup: SetupInfo) -> Self {
        MockServer {
            setup,
            extensions: Vec::new(),
            hidden_extensions: Vec::new(),
            font_paths: vec![
                "/usr/share/fonts/X11/misc".to_string(),
                "built-ins".to_string(),
            ],
            big_requests_max: 0x0040_0000,
            inflated_reply_length: None,
            reject: None,
        }
    }

    pub fn with_extension(mut self, extension: MockExtension) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Start serving; returns the client end of the connection
    pub fn spawn(self) -> (UnixStream, JoinHandle<ServerLog>) {
        let (client, server) = UnixStream::pair().expect("socket pair");
        let handle = thread::spawn(move || {
            let mut log = ServerLog::default();
            // The client hanging up ends the session
            let _ = self.serve(server, &mut log);
            log
        });
        (client, handle)
    }

    fn serve(&self, mut stream: UnixStream, log: &mut ServerLog) -> io::Result<()> {
        let mut header = [0u8; SetupRequest::HEADER_SIZE];
        stream.read_exact(&mut header)?;
        let byte_order = if header[0] == b'B' {
            ByteOrder::MSBFirst
        } else {
            ByteOrder::LSBFirst
        };
        let mut reader = WireReader::new(&header[6..10], byte_order);
        let name_len = reader.u16().unwrap_or(0) as usize;
        let data_len = reader.u16().unwrap_or(0) as usize;

        let mut request = header.to_vec();
        request.resize(
            SetupRequest::HEADER_SIZE + padded_len(name_len) + padded_len(data_len),
            0,
        );
        stream.read_exact(&mut request[SetupRequest::HEADER_SIZE..])?;
        log.setup_request = SetupRequest::decode(&request).ok();

        if let Some(reason) = &self.reject {
            let failed = SetupFailed {
                protocol_major_version: 11,
                protocol_minor_version: 0,
                reason: reason.clone(),
            };
            stream.write_all(&failed.encode(byte_order))?;
            return Ok(());
        }

        stream.write_all(&self.setup.encode_response(byte_order))?;

        let mut sequence: u16 = 0;
        loop {
            let mut head = [0u8; 4];
            stream.read_exact(&mut head)?;
            let length = WireReader::new(&head[2..4], byte_order).u16().unwrap_or(0) as usize;
            let mut request = head.to_vec();
            request.resize((length * 4).max(4), 0);
            stream.read_exact(&mut request[4..])?;
            sequence = sequence.wrapping_add(1);

            let mut reply = self.answer(&request, sequence, byte_order);
            log.requests.push(request);
            if let Some(length) = self.inflated_reply_length {
                let mut field = WireWriter::new(byte_order);
                field.u32(length);
                reply[4..8].copy_from_slice(&field.finish());
                stream.write_all(&reply)?;
                return Ok(());
            }
            stream.write_all(&reply)?;
        }
    }

    fn answer(&self, request: &[u8], sequence: u16, byte_order: ByteOrder) -> Vec<u8> {
        match request[0] {
            op if op == RequestOpcode::QueryExtension as u8 => {
                let mut reader = WireReader::new(&request[4..], byte_order);
                let len = reader.u16().unwrap_or(0) as usize;
                let name = String::from_utf8_lossy(&request[8..8 + len]).into_owned();
                let found = self.find_by_name(&name);
                encode_query_extension_reply(sequence, found.map(|e| e.opcode), byte_order)
            }
            op if op == RequestOpcode::ListExtensions as u8 => {
                let names: Vec<&str> = self.extensions.iter().map(|e| e.name.as_str()).collect();
                encode_string_list_reply(sequence, &names, true, byte_order)
            }
            op if op == RequestOpcode::GetFontPath as u8 => {
                let paths: Vec<&str> = self.font_paths.iter().map(|p| p.as_str()).collect();
                encode_string_list_reply(sequence, &paths, false, byte_order)
            }
            opcode => self
                .find_by_opcode(opcode)
                .filter(|extension| !extension.fail_version_query)
                .and_then(|extension| {
                    encode_version_reply(sequence, extension, self.big_requests_max, byte_order)
                })
                .unwrap_or_else(|| encode_error(sequence, opcode, request[1], byte_order)),
        }
    }

    fn find_by_name(&self, name: &str) -> Option<&MockExtension> {
        self.extensions
            .iter()
            .chain(&self.hidden_extensions)
            .find(|e| e.name == name)
    }

    fn find_by_opcode(&self, opcode: u8) -> Option<&MockExtension> {
        self.extensions
            .iter()
            .chain(&self.hidden_extensions)
            .find(|e| e.opcode == opcode)
    }
}

fn reply_header(writer: &mut WireWriter, data: u8, sequence: u16, additional: usize) {
    writer
        .u8(reply_status::REPLY)
        .u8(data)
        .u16(sequence)
        .u32((additional / 4) as u32);
}

fn finish_32(mut writer: WireWriter) -> Vec<u8> {
    let used = writer.len();
    writer.zeros(REPLY_SIZE - used);
    writer.finish()
}

pub fn encode_query_extension_reply(sequence: u16, opcode: Option<u8>, byte_order: ByteOrder) -> Vec<u8> {
    let mut writer = WireWriter::new(byte_order);
    reply_header(&mut writer, 0, sequence, 0);
    writer
        .bool(opcode.is_some())
        .u8(opcode.unwrap_or(0))
        .u8(0) // first event
        .u8(0); // first error
    finish_32(writer)
}

pub fn encode_string_list_reply(
    sequence: u16,
    strings: &[&str],
    count_in_header: bool,
    byte_order: ByteOrder,
) -> Vec<u8> {
    let mut data = WireWriter::new(byte_order);
    for s in strings {
        data.u8(s.len() as u8).bytes(s.as_bytes());
    }
    let padding = pad(data.len());
    data.zeros(padding);
    let data = data.finish();

    let mut writer = WireWriter::new(byte_order);
    if count_in_header {
        reply_header(&mut writer, strings.len() as u8, sequence, data.len());
        writer.zeros(24);
    } else {
        reply_header(&mut writer, 0, sequence, data.len());
        writer.u16(strings.len() as u16).zeros(22);
    }
    writer.bytes(&data);
    writer.finish()
}

/// Body of a version query request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proposal {
    /// No body, request length 1
    Empty,
    /// Two u8 fields and two bytes of padding
    Pair8,
    Pair16,
    Pair32,
    /// u8 major, one byte of padding, u16 minor
    XTest,
}

/// Where the version sits in a 32-byte reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyLayout {
    /// u8 major and minor at offsets 8 and 9
    Pair8,
    /// u16 major and minor at offsets 8 and 10
    Pair16,
    /// u32 major and minor at offsets 8 and 12
    Pair32,
    /// Major in byte 1, u16 minor at offset 8
    XTest,
    /// u32 maximum request length at offset 8
    BigRequests,
}

/// How a real server expects one extension's version to be queried
#[derive(Debug, Clone, Copy)]
pub struct VersionQuery {
    pub name: &'static str,
    pub minor_opcode: u8,
    pub proposal: Proposal,
    pub reply: ReplyLayout,
}

const fn query(name: &'static str, minor_opcode: u8, proposal: Proposal, reply: ReplyLayout) -> VersionQuery {
    VersionQuery {
        name,
        minor_opcode,
        proposal,
        reply,
    }
}

/// Version queries of known extensions, written out from their protocol docs
pub const VERSION_QUERIES: &[VersionQuery] = &[
    query("Apple-DRI", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("Apple-WM", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("Extended-Visual-Information", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("FontCache", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("LBX", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("MIT-SHM", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("NV-CONTROL", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("SHAPE", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("Windows-WM", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("XC-VidModeExtension", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("XFree86-Bigfont", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("XFree86-DGA", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("XFree86-DRI", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("XFree86-Misc", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("XFree86-Rush", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("XFree86-VidModeExtension", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("XpExtension", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("XVideo", 0, Proposal::Empty, ReplyLayout::Pair16),
    query("DMX", 0, Proposal::Empty, ReplyLayout::Pair32),
    query("LGE", 0, Proposal::Empty, ReplyLayout::Pair32),
    query("XVideo-MotionCompensation", 0, Proposal::Empty, ReplyLayout::Pair32),
    query("DOUBLE-BUFFER", 0, Proposal::Pair8, ReplyLayout::Pair8),
    query("SYNC", 0, Proposal::Pair8, ReplyLayout::Pair8),
    query("X-Resource", 0, Proposal::Pair8, ReplyLayout::Pair8),
    query("XINERAMA", 0, Proposal::Pair8, ReplyLayout::Pair8),
    query("DPMS", 0, Proposal::Pair16, ReplyLayout::Pair16),
    query("Generic Event Extension", 0, Proposal::Pair16, ReplyLayout::Pair16),
    query("RECORD", 0, Proposal::Pair16, ReplyLayout::Pair16),
    query("SECURITY", 0, Proposal::Pair16, ReplyLayout::Pair16),
    query("TOG-CUP", 0, Proposal::Pair16, ReplyLayout::Pair16),
    query("XC-APPGROUP", 0, Proposal::Pair16, ReplyLayout::Pair16),
    query("XC-MISC", 0, Proposal::Pair16, ReplyLayout::Pair16),
    query("XKEYBOARD", 0, Proposal::Pair16, ReplyLayout::Pair16),
    query("XInputExtension", 47, Proposal::Pair16, ReplyLayout::Pair16),
    query("Composite", 0, Proposal::Pair32, ReplyLayout::Pair32),
    query("DAMAGE", 0, Proposal::Pair32, ReplyLayout::Pair32),
    query("DRI2", 0, Proposal::Pair32, ReplyLayout::Pair32),
    query("DRI3", 0, Proposal::Pair32, ReplyLayout::Pair32),
    query("Present", 0, Proposal::Pair32, ReplyLayout::Pair32),
    query("RANDR", 0, Proposal::Pair32, ReplyLayout::Pair32),
    query("RENDER", 0, Proposal::Pair32, ReplyLayout::Pair32),
    query("XCALIBRATE", 0, Proposal::Pair32, ReplyLayout::Pair32),
    query("XFIXES", 0, Proposal::Pair32, ReplyLayout::Pair32),
    query("GLX", 7, Proposal::Pair32, ReplyLayout::Pair32),
    query("SGI-GLX", 7, Proposal::Pair32, ReplyLayout::Pair32),
    query("MIT-SCREEN-SAVER", 0, Proposal::Pair8, ReplyLayout::Pair16),
    query("SELinux", 0, Proposal::Pair8, ReplyLayout::Pair16),
    query("XTEST", 0, Proposal::XTest, ReplyLayout::XTest),
    query("BIG-REQUESTS", 0, Proposal::Empty, ReplyLayout::BigRequests),
];

pub fn version_query(name: &str) -> Option<&'static VersionQuery> {
    VERSION_QUERIES.iter().find(|q| q.name == name)
}

/// Version reply laid out the way the extension's server side answers
pub fn encode_version_reply(
    sequence: u16,
    extension: &MockExtension,
    big_requests_max: u32,
    byte_order: ByteOrder,
) -> Option<Vec<u8>> {
    let layout = version_query(&extension.name)?.reply;
    let mut writer = WireWriter::new(byte_order);

    match layout {
        ReplyLayout::XTest => {
            reply_header(&mut writer, extension.major as u8, sequence, 0);
            writer.u16(extension.minor as u16);
        }
        ReplyLayout::BigRequests => {
            reply_header(&mut writer, 0, sequence, 0);
            writer.u32(big_requests_max);
        }
        ReplyLayout::Pair8 => {
            reply_header(&mut writer, 0, sequence, 0);
            writer.u8(extension.major as u8).u8(extension.minor as u8);
        }
        ReplyLayout::Pair16 => {
            reply_header(&mut writer, 0, sequence, 0);
            writer.u16(extension.major as u16).u16(extension.minor as u16);
        }
        ReplyLayout::Pair32 => {
            reply_header(&mut writer, 0, sequence, 0);
            writer.u32(extension.major).u32(extension.minor);
        }
    }
    Some(finish_32(writer))
}

/// The request a client must send to query `query`'s version
pub fn expected_version_request(query: &VersionQuery, opcode: u8, byte_order: ByteOrder) -> Vec<u8> {
    let mut writer = WireWriter::new(byte_order);
    let length = match query.proposal {
        Proposal::Empty => 1,
        Proposal::Pair32 => 3,
        _ => 2,
    };
    writer.u8(opcode).u8(query.minor_opcode).u16(length);
    match query.proposal {
        Proposal::Empty => {}
        Proposal::Pair8 => {
            writer.bytes(&[0xff, 0xff, 0, 0]);
        }
        Proposal::Pair16 => {
            writer.bytes(&[0xff; 4]);
        }
        Proposal::Pair32 => {
            writer.bytes(&[0xff; 8]);
        }
        Proposal::XTest => {
            writer.bytes(&[0xff, 0, 0xff, 0xff]);
        }
    }
    writer.finish()
}

pub fn encode_error(sequence: u16, major_opcode: u8, minor_opcode: u8, byte_order: ByteOrder) -> Vec<u8> {
    let mut writer = WireWriter::new(byte_order);
    writer
        .u8(reply_status::ERROR)
        .u8(1) // BadRequest
        .u16(sequence)
        .u32(0)
        .u16(minor_opcode as u16)
        .u8(major_opcode);
    finish_32(writer)
}

/// A setup with one 24-bit TrueColor screen
pub fn truecolor_setup() -> SetupInfo {
    SetupInfo {
        protocol_major_version: 11,
        protocol_minor_version: 0,
        release_number: 12_101_011,
        resource_id_base: 0x0060_0000,
        resource_id_mask: 0x001f_ffff,
        motion_buffer_size: 256,
        maximum_request_length: 65535,
        image_byte_order: ByteOrder::LSBFirst,
        bitmap_format_bit_order: ByteOrder::LSBFirst,
        bitmap_format_scanline_unit: 32,
        bitmap_format_scanline_pad: 32,
        min_keycode: 8,
        max_keycode: 255,
        vendor: "The X.Org Foundation".to_string(),
        pixmap_formats: vec![Format {
            depth: 24,
            bits_per_pixel: 32,
            scanline_pad: 32,
        }],
        roots: vec![Screen {
            root: Window::new(0x1e3),
            default_colormap: Colormap::new(0x20),
            white_pixel: 0x00ff_ffff,
            black_pixel: 0,
            current_input_masks: event_mask::KEY_PRESS | event_mask::STRUCTURE_NOTIFY,
            width_in_pixels: 2560,
            height_in_pixels: 1440,
            width_in_millimeters: 677,
            height_in_millimeters: 381,
            min_installed_maps: 1,
            max_installed_maps: 1,
            root_visual: VisualID::new(0x21),
            backing_stores: BackingStores::WhenMapped,
            save_unders: false,
            root_depth: 24,
            allowed_depths: vec![Depth {
                depth: 24,
                visuals: vec![VisualType {
                    visual_id: VisualID::new(0x21),
                    class: VisualClass::TrueColor as u8,
                    bits_per_rgb_value: 8,
                    colormap_entries: 256,
                    red_mask: 0xff_0000,
                    green_mask: 0x00_ff00,
                    blue_mask: 0x00_00ff,
                }],
            }],
        }],
    }
}

/// Stream wrapper that moves at most `chunk` bytes per call and reports an
/// interruption before every transfer
pub struct Choppy<S> {
    inner: S,
    chunk: usize,
    interrupt_next: bool,
}

impl<S> Choppy<S> {
    pub fn new(inner: S, chunk: usize) -> Self {
        Choppy {
            inner,
            chunk,
            interrupt_next: true,
        }
    }

    fn interrupted(&mut self) -> bool {
        self.interrupt_next = !self.interrupt_next;
        !self.interrupt_next
    }
}

impl<S: Read> Read for Choppy<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.interrupted() {
            return Err(io::ErrorKind::Interrupted.into());
        }
        let n = buf.len().min(self.chunk);
        self.inner.read(&mut buf[..n])
    }
}

impl<S: Write> Write for Choppy<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.interrupted() {
            return Err(io::ErrorKind::Interrupted.into());
        }
        let n = buf.len().min(self.chunk);
        self.inner.write(&buf[..n])
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
