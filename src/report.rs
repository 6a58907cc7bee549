//! Text rendering of a [`ProbeReport`]

use crate::probe::ProbeReport;
use crate::protocol::{event_mask, ByteOrder, Screen, VisualType};
use std::io::{self, Write};

/// Column at which values start, counting indentation
const VALUE_COLUMN: usize = 45;

/// Write `name` padded with dots up to the value column, then `value`
fn field<W: Write>(
    out: &mut W,
    indent: usize,
    name: &str,
    value: impl std::fmt::Display,
) -> io::Result<()> {
    let width = VALUE_COLUMN - indent;
    writeln!(out, "{:indent$}{:.<width$} {}", "", name, value, indent = indent, width = width)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub fn write_report<W: Write>(out: &mut W, report: &ProbeReport) -> io::Result<()> {
    let setup = &report.setup;

    writeln!(out, "x11info - X server information printer")?;
    writeln!(out)?;

    field(out, 0, "Display", &report.target)?;
    field(out, 0, "Vendor", &setup.vendor)?;
    field(
        out,
        0,
        "Version",
        format_args!(
            "{}.{}",
            setup.protocol_major_version, setup.protocol_minor_version
        ),
    )?;
    field(out, 0, "Release number", setup.release())?;
    writeln!(out)?;

    field(out, 0, "Resource ID base", format_args!("0x{:08x}", setup.resource_id_base))?;
    field(out, 0, "Resource ID mask", format_args!("0x{:08x}", setup.resource_id_mask))?;
    field(out, 0, "Motion buffer size", setup.motion_buffer_size)?;
    field(
        out,
        0,
        "Maximum request length",
        format_args!("{} bytes", report.max_request_length),
    )?;
    field(
        out,
        0,
        "Image byte order",
        match setup.image_byte_order {
            ByteOrder::LSBFirst => "little endian",
            ByteOrder::MSBFirst => "big endian",
        },
    )?;
    field(
        out,
        0,
        "Bitmap format bit order",
        match setup.bitmap_format_bit_order {
            ByteOrder::LSBFirst => "least significant first",
            ByteOrder::MSBFirst => "most significant first",
        },
    )?;
    field(out, 0, "Bitmap format scanline unit", setup.bitmap_format_scanline_unit)?;
    field(out, 0, "Bitmap format scanline pad", setup.bitmap_format_scanline_pad)?;
    field(out, 0, "Max keycode", setup.max_keycode)?;
    field(out, 0, "Min keycode", setup.min_keycode)?;
    field(out, 0, "Number of pixmap formats", setup.num_pixmap_formats())?;
    field(out, 0, "Number of screens", setup.num_roots())?;

    writeln!(out, "\nPixmap formats:")?;
    for format in &setup.pixmap_formats {
        writeln!(
            out,
            "  * depth = {:2}, bits per pixel = {:2}, scanline pad = {}",
            format.depth, format.bits_per_pixel, format.scanline_pad
        )?;
    }

    writeln!(out, "\nScreens:")?;
    for (i, screen) in setup.roots.iter().enumerate() {
        write_screen(out, i, screen)?;
    }

    if let Some(paths) = &report.font_paths {
        writeln!(out, "\nFont search paths:")?;
        for path in paths {
            writeln!(out, "  * {}", path)?;
        }
    }

    if let Some(extensions) = &report.extensions {
        writeln!(out, "\nSupported extensions: {}", extensions.len())?;
        for extension in extensions.iter().filter(|e| e.opcode != 0) {
            match &extension.version {
                Some(version) => field(out, 2, &format!("* {}", extension.name), version)?,
                None => field(out, 2, &format!("* {}", extension.name), "unknown version")?,
            }
        }
    }

    Ok(())
}

fn write_screen<W: Write>(out: &mut W, index: usize, screen: &Screen) -> io::Result<()> {
    writeln!(out, "  Screen #{}", index)?;

    field(out, 4, "Root", screen.root.id())?;
    field(out, 4, "Default colormap", screen.default_colormap.id())?;
    field(out, 4, "White pixel", format_args!("0x{:08x}", screen.white_pixel))?;
    field(out, 4, "Black pixel", format_args!("0x{:08x}", screen.black_pixel))?;
    field(
        out,
        4,
        "Current input mask",
        format_args!("0x{:08x}", screen.current_input_masks),
    )?;
    for (name, mask) in event_mask::NAMES {
        field(out, 6, name, yes_no(screen.selects(mask)))?;
    }

    field(
        out,
        4,
        "Size",
        format_args!(
            "{}x{} pixels ({}x{} mm)",
            screen.width_in_pixels,
            screen.height_in_pixels,
            screen.width_in_millimeters,
            screen.height_in_millimeters
        ),
    )?;
    field(
        out,
        4,
        "Installed maps",
        format_args!(
            "min = {}, max = {}",
            screen.min_installed_maps, screen.max_installed_maps
        ),
    )?;
    field(out, 4, "Root visual id", screen.root_visual)?;
    field(out, 4, "Backing stores", screen.backing_stores.as_str())?;
    field(out, 4, "Save unders", yes_no(screen.save_unders))?;
    field(out, 4, "Root depth", screen.root_depth)?;
    field(out, 4, "Number of allowed depths", screen.num_allowed_depths())?;

    writeln!(out, "    Allowed depths:")?;
    for depth in &screen.allowed_depths {
        writeln!(
            out,
            "      * depth = {:2}, number of visuals: {}",
            depth.depth,
            depth.num_visuals()
        )?;
        for visual in &depth.visuals {
            write_visual(out, visual)?;
        }
    }

    Ok(())
}

fn write_visual<W: Write>(out: &mut W, visual: &VisualType) -> io::Result<()> {
    let class = visual
        .visual_class()
        .map(|class| class.as_str().to_string())
        .unwrap_or_else(|| format!("class {}", visual.class));

    writeln!(
        out,
        "        - {} {}, {} bits per RGB, {} colormap entries, \
         masks 0x{:06x}/0x{:06x}/0x{:06x}",
        visual.visual_id,
        class,
        visual.bits_per_rgb_value,
        visual.colormap_entries,
        visual.red_mask,
        visual.green_mask,
        visual.blue_mask
    )
}
