//! VIC-II bitmap addressing and the two base composers.
//!
//! The bitmap plane is stored in character-row order: each 8x8 cell is eight
//! consecutive bytes, forty cells make one 320-byte character row. Video RAM
//! and colour RAM hold one entry per cell.

use std::borrow::Cow;

use crate::surface::IndexImage;

/// Bytes in one character row of a 320 pixel wide bitmap.
pub const ROW_BYTES: usize = 40 * 8;

/// Distance between two video RAM banks in an FLI memory map.
pub const BANK_STRIDE: usize = 0x400;

/// Leftmost columns hidden by the FLI bug.
pub const FLI_BUG_COLUMNS: usize = 24;

/// Index forced into the FLI bug area when no colour is supplied.
pub const FLI_BUG_INDEX: u8 = 0xf;

#[inline]
pub fn bitmap_offset(x: usize, y: usize) -> usize {
    bitmap_offset_in(x, y, ROW_BYTES)
}

#[inline]
pub fn bitmap_offset_in(x: usize, y: usize, row_bytes: usize) -> usize {
    (x & !7) + (y & 7) + (y >> 3) * row_bytes
}

/// Video/colour RAM cell that owns the given bitmap byte.
#[inline]
pub fn screen_offset(bitmap_offset: usize) -> usize {
    bitmap_offset >> 3
}

/// One bit per pixel, most significant bit leftmost.
#[inline]
pub fn hires_bit(byte: u8, x: usize) -> u8 {
    (byte >> (7 - (x & 7))) & 0x1
}

/// Two bits per pixel pair; both pixels of a pair share the pattern.
#[inline]
pub fn multicolor_pattern(byte: u8, x: usize) -> u8 {
    (byte >> (6 - (x & 6))) & 0x3
}

/// Bounds-checked read; bytes past the end of a plane read as zero.
#[inline]
pub fn peek(data: &[u8], offset: usize) -> u8 {
    data.get(offset).copied().unwrap_or(0)
}

/// Plane starting at `offset`, empty when the offset lies past the end.
#[inline]
pub fn plane(memory: &[u8], offset: usize) -> &[u8] {
    memory.get(offset..).unwrap_or(&[])
}

/// Which video RAM bank a scanline reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banking {
    /// One bank for the whole picture.
    Fixed,
    /// FLI: a new bank on every scanline of a cell row.
    EveryLine,
    /// UFLI: a new bank every second scanline.
    EveryTwoLines,
    /// Two banks alternating every four scanlines.
    EveryFourLines,
}

impl Banking {
    #[inline]
    pub fn bank(self, y: usize) -> usize {
        match self {
            Banking::Fixed => 0,
            Banking::EveryLine => y & 7,
            Banking::EveryTwoLines => (y & 7) >> 1,
            Banking::EveryFourLines => (y >> 2) & 1,
        }
    }

    #[inline]
    pub fn offset(self, y: usize) -> usize {
        self.bank(y) * BANK_STRIDE
    }
}

/// Source of the `00` bit pattern in multicolor mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Background<'a> {
    Black,
    Color(u8),
    PerLine(Cow<'a, [u8]>),
}

impl Background<'_> {
    #[inline]
    fn index(&self, y: usize) -> u8 {
        match self {
            Background::Black => 0,
            Background::Color(color) => color & 0xf,
            Background::PerLine(lines) => peek(lines, y) & 0xf,
        }
    }
}

/// Source of the `11` bit pattern in multicolor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRam<'a> {
    Plane(&'a [u8]),
    Fill(u8),
}

/// FLI bug emulation for the leftmost [`FLI_BUG_COLUMNS`] pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FliBug<'a> {
    /// Per-scanline colours shown for the `11` pattern (high nibble).
    pub opcode_colors: Option<&'a [u8]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticolorPlanes<'a> {
    pub bitmap: &'a [u8],
    pub video_ram: &'a [u8],
    pub color_ram: ColorRam<'a>,
    pub background: Background<'a>,
    pub banking: Banking,
    /// Colour RAM follows the video RAM bank switching.
    pub bank_color_ram: bool,
    pub fli_bug: Option<FliBug<'a>>,
}

pub fn compose_multicolor(planes: &MulticolorPlanes<'_>, image: &mut IndexImage) {
    for y in 0..image.height() {
        let bank = planes.banking.offset(y);
        let color_bank = if planes.bank_color_ram { bank } else { 0 };

        for x in 0..image.width() {
            let bitmap_offset = bitmap_offset(x, y);
            let screen_offset = screen_offset(bitmap_offset);
            let pattern = multicolor_pattern(peek(planes.bitmap, bitmap_offset), x);
            let in_bug = planes.fli_bug.is_some() && x < FLI_BUG_COLUMNS;

            let index = match pattern {
                0 => planes.background.index(y),
                1 if in_bug => FLI_BUG_INDEX,
                1 => peek(planes.video_ram, screen_offset + bank) >> 4,
                2 if in_bug => FLI_BUG_INDEX,
                2 => peek(planes.video_ram, screen_offset + bank) & 0xf,
                _ if in_bug => match planes.fli_bug.and_then(|bug| bug.opcode_colors) {
                    Some(colors) => (peek(colors, y) >> 4) & 0xf,
                    None => FLI_BUG_INDEX,
                },
                _ => match planes.color_ram {
                    ColorRam::Plane(ram) => peek(ram, screen_offset + color_bank) & 0xf,
                    ColorRam::Fill(color) => color & 0xf,
                },
            };

            image.set(x, y, index);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiresPlanes<'a> {
    pub bitmap: &'a [u8],
    pub video_ram: &'a [u8],
    pub banking: Banking,
    /// Index shown in the FLI bug area; `None` disables the emulation.
    pub fli_bug: Option<u8>,
}

pub fn compose_hires(planes: &HiresPlanes<'_>, image: &mut IndexImage) {
    for y in 0..image.height() {
        let bank = planes.banking.offset(y);

        for x in 0..image.width() {
            let index = match planes.fli_bug {
                Some(bug) if x < FLI_BUG_COLUMNS => bug,
                _ => {
                    let bitmap_offset = bitmap_offset(x, y);
                    let screen = peek(planes.video_ram, screen_offset(bitmap_offset) + bank);
                    if hires_bit(peek(planes.bitmap, bitmap_offset), x) == 0 {
                        screen & 0xf
                    } else {
                        screen >> 4
                    }
                }
            };

            image.set(x, y, index);
        }
    }
}
