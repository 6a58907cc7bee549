//! Core X11 protocol types
//!
//! These types represent the data types carried by the setup payload.
//! They are kept minimal and close to the wire protocol.

use std::fmt;

/// X11 resource ID - used for windows, colormaps, etc.
/// In X11, all objects are identified by 29-bit IDs.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct XID(pub u32);

impl XID {
    pub fn new(id: u32) -> Self {
        XID(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for XID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Window ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window(pub XID);

impl Window {
    pub fn new(id: u32) -> Self {
        Window(XID::new(id))
    }

    pub fn id(&self) -> XID {
        self.0
    }
}

/// Colormap ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Colormap(pub XID);

impl Colormap {
    pub fn new(id: u32) -> Self {
        Colormap(XID::new(id))
    }

    pub fn id(&self) -> XID {
        self.0
    }
}

/// Visual ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualID(pub u32);

impl VisualID {
    pub fn new(id: u32) -> Self {
        VisualID(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for VisualID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LSBFirst = 0,
    MSBFirst = 1,
}

impl ByteOrder {
    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LSBFirst
        } else {
            ByteOrder::MSBFirst
        }
    }

    /// Byte-order marker sent as the first byte of the setup request
    pub fn marker(&self) -> u8 {
        match self {
            ByteOrder::LSBFirst => b'l',
            ByteOrder::MSBFirst => b'B',
        }
    }

    /// Image byte order / bitmap bit order as encoded in the setup payload
    pub fn from_u8(value: u8) -> Self {
        if value == 0 {
            ByteOrder::LSBFirst
        } else {
            ByteOrder::MSBFirst
        }
    }
}

/// Backing store support advertised by a screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingStores {
    Never = 0,
    WhenMapped = 1,
    Always = 2,
}

impl BackingStores {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => BackingStores::Never,
            1 => BackingStores::WhenMapped,
            _ => BackingStores::Always,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackingStores::Never => "never",
            BackingStores::WhenMapped => "when mapped",
            BackingStores::Always => "always",
        }
    }
}

/// Visual class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualClass {
    StaticGray = 0,
    GrayScale = 1,
    StaticColor = 2,
    PseudoColor = 3,
    TrueColor = 4,
    DirectColor = 5,
}

impl VisualClass {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(VisualClass::StaticGray),
            1 => Some(VisualClass::GrayScale),
            2 => Some(VisualClass::StaticColor),
            3 => Some(VisualClass::PseudoColor),
            4 => Some(VisualClass::TrueColor),
            5 => Some(VisualClass::DirectColor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualClass::StaticGray => "StaticGray",
            VisualClass::GrayScale => "GrayScale",
            VisualClass::StaticColor => "StaticColor",
            VisualClass::PseudoColor => "PseudoColor",
            VisualClass::TrueColor => "TrueColor",
            VisualClass::DirectColor => "DirectColor",
        }
    }
}

/// Event masks
pub mod event_mask {
    pub const KEY_PRESS: u32 = 1 << 0;
    pub const KEY_RELEASE: u32 = 1 << 1;
    pub const BUTTON_PRESS: u32 = 1 << 2;
    pub const BUTTON_RELEASE: u32 = 1 << 3;
    pub const ENTER_WINDOW: u32 = 1 << 4;
    pub const LEAVE_WINDOW: u32 = 1 << 5;
    pub const POINTER_MOTION: u32 = 1 << 6;
    pub const POINTER_MOTION_HINT: u32 = 1 << 7;
    pub const BUTTON1_MOTION: u32 = 1 << 8;
    pub const BUTTON2_MOTION: u32 = 1 << 9;
    pub const BUTTON3_MOTION: u32 = 1 << 10;
    pub const BUTTON4_MOTION: u32 = 1 << 11;
    pub const BUTTON5_MOTION: u32 = 1 << 12;
    pub const BUTTON_MOTION: u32 = 1 << 13;
    pub const KEYMAP_STATE: u32 = 1 << 14;
    pub const EXPOSURE: u32 = 1 << 15;
    pub const VISIBILITY_CHANGE: u32 = 1 << 16;
    pub const STRUCTURE_NOTIFY: u32 = 1 << 17;
    pub const RESIZE_REDIRECT: u32 = 1 << 18;
    pub const SUBSTRUCTURE_NOTIFY: u32 = 1 << 19;
    pub const SUBSTRUCTURE_REDIRECT: u32 = 1 << 20;
    pub const FOCUS_CHANGE: u32 = 1 << 21;
    pub const PROPERTY_CHANGE: u32 = 1 << 22;
    pub const COLORMAP_CHANGE: u32 = 1 << 23;
    pub const OWNER_GRAB_BUTTON: u32 = 1 << 24;

    /// Human-readable name for every defined event mask bit, in bit order
    pub const NAMES: [(&str, u32); 25] = [
        ("Key press", KEY_PRESS),
        ("Key release", KEY_RELEASE),
        ("Button press", BUTTON_PRESS),
        ("Button release", BUTTON_RELEASE),
        ("Enter window", ENTER_WINDOW),
        ("Leave window", LEAVE_WINDOW),
        ("Pointer motion", POINTER_MOTION),
        ("Pointer motion hint", POINTER_MOTION_HINT),
        ("Button 1 motion", BUTTON1_MOTION),
        ("Button 2 motion", BUTTON2_MOTION),
        ("Button 3 motion", BUTTON3_MOTION),
        ("Button 4 motion", BUTTON4_MOTION),
        ("Button 5 motion", BUTTON5_MOTION),
        ("Button motion", BUTTON_MOTION),
        ("Keymap state", KEYMAP_STATE),
        ("Exposure", EXPOSURE),
        ("Visibility change", VISIBILITY_CHANGE),
        ("Structure notify", STRUCTURE_NOTIFY),
        ("Resize redirect", RESIZE_REDIRECT),
        ("Substructure notify", SUBSTRUCTURE_NOTIFY),
        ("Substructure redirect", SUBSTRUCTURE_REDIRECT),
        ("Focus change", FOCUS_CHANGE),
        ("Property change", PROPERTY_CHANGE),
        ("Colormap change", COLORMAP_CHANGE),
        ("Owner grab button", OWNER_GRAB_BUTTON),
    ];
}
