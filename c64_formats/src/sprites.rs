//! Composers that mix hardware sprites into the bitmap: the Y-expanded
//! overlay of FLI-Profi, the multiplexed sprite layers of the SHF editors and
//! the expanded sprite underlay of the UFLI family.

use crate::bitplane::{
    BANK_STRIDE, FLI_BUG_COLUMNS, bitmap_offset, hires_bit, multicolor_pattern, peek,
    screen_offset,
};
use crate::surface::IndexImage;

/// Bytes per sprite block.
const SPRITE_BYTES: usize = 64;
/// Bytes per sprite line.
const SPRITE_ROW: usize = 3;
/// Scanlines in one unexpanded sprite.
const SPRITE_HEIGHT: usize = 21;
/// Scanlines in one Y-expanded sprite.
const EXPANDED_HEIGHT: usize = SPRITE_HEIGHT * 2;
/// Sprite pointers sit at the end of every video RAM bank.
const POINTER_TABLE: usize = 0x3f8;

/// Multicolor sprites covering the FLI bug columns.
#[derive(Debug, Clone, Copy)]
pub struct BugColumnSprites<'a> {
    /// Sprite blocks, two VIC banks 0x140 bytes apart.
    pub sprites: &'a [u8],
    /// Per-scanline colour for the `01` pattern.
    pub line_colors: &'a [u8],
    /// Shared colour for the `10` pattern.
    pub color1: u8,
    /// Shared colour for the `11` pattern.
    pub color2: u8,
}

/// Paint Y-expanded multicolor sprites over the leftmost 24 columns. The
/// VIC bank alternates in a 1-2-2-1 pattern every two scanlines.
pub fn overlay_bug_columns(sprites: &BugColumnSprites<'_>, image: &mut IndexImage) {
    let width = image.width().min(FLI_BUG_COLUMNS);

    for y in 0..image.height() {
        let number = y / EXPANDED_HEIGHT;
        let line = (y % EXPANDED_HEIGHT) >> 1;
        let bank = ((y + 1) >> 1) & 1;
        let base = line * SPRITE_ROW + number * SPRITE_BYTES + bank * 0x140;

        for x in 0..width {
            let byte = peek(sprites.sprites, base + (x % 24) / 8);
            let index = match multicolor_pattern(byte, x) {
                1 => peek(sprites.line_colors, y),
                2 => sprites.color1,
                3 => sprites.color2,
                _ => 0,
            } & 0xf;

            if index != 0 {
                image.set(x, y, index);
            }
        }
    }
}

/// One multiplexed sprite layer of the SHF editors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteLayer {
    /// Sprite number shown over the first 24 pixel column.
    pub first_sprite: usize,
    /// Added to the scanline before picking the pointer bank.
    pub bank_shift: usize,
    pub color: u8,
}

/// Hires FLI window with multiplexed sprites on top. `memory` holds eight
/// video RAM banks at 0x400 intervals, and sprite pointers index 64 byte
/// blocks within it.
#[derive(Debug, Clone, Copy)]
pub struct SpriteHiresPlanes<'a> {
    pub memory: &'a [u8],
    pub bitmap: &'a [u8],
    /// Position of the window inside the 320x200 bitmap.
    pub x_shift: usize,
    pub y_shift: usize,
    /// Layers in priority order; the first set bit wins.
    pub layers: &'a [SpriteLayer],
}

pub fn compose_sprite_hires(planes: &SpriteHiresPlanes<'_>, image: &mut IndexImage) {
    for y in 0..image.height() {
        let row = y + planes.y_shift;
        let video_bank = (row & 7) * BANK_STRIDE;
        let sprite_line = (y % SPRITE_HEIGHT) * SPRITE_ROW;

        for x in 0..image.width() {
            let offset = bitmap_offset(x + planes.x_shift, row);
            let screen = peek(planes.memory, screen_offset(offset) + video_bank);
            let mut index = if hires_bit(peek(planes.bitmap, offset), x) == 0 {
                screen & 0xf
            } else {
                screen >> 4
            };

            let sprite = x / 24;
            let column = (x % 24) / 8;
            let hit = planes.layers.iter().find(|layer| {
                let bank = ((y + layer.bank_shift) & 7) * BANK_STRIDE;
                let pointer = peek(planes.memory, bank + POINTER_TABLE + layer.first_sprite + sprite);
                let byte = peek(
                    planes.memory,
                    pointer as usize * SPRITE_BYTES + sprite_line + column,
                );
                hires_bit(byte, x) != 0
            });
            if let Some(layer) = hit {
                index = layer.color;
            }

            image.set(x, y, index);
        }
    }
}

/// Where an underlay sprite takes its colour from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteColors<'a> {
    Single(u8),
    /// UFLI 2: one colour per sprite column, stored from the third entry.
    PerColumn(&'a [u8]),
}

impl SpriteColors<'_> {
    fn for_column(self, column: usize) -> u8 {
        match self {
            SpriteColors::Single(color) => color,
            SpriteColors::PerColumn(colors) => peek(colors, column + 2),
        }
    }
}

/// Hires UFLI bitmap with X- and Y-expanded sprites beneath the `0` pixels.
#[derive(Debug, Clone, Copy)]
pub struct UnderlayPlanes<'a> {
    pub bitmap: &'a [u8],
    pub video_ram: &'a [u8],
    pub sprites: &'a [u8],
    pub sprite_colors: SpriteColors<'a>,
    /// Colour of the 24 hidden pixels on the left.
    pub left_border: u8,
    /// Colour of the last eight pixels, if they are hidden as well.
    pub right_border: Option<u8>,
}

pub fn compose_underlay(planes: &UnderlayPlanes<'_>, image: &mut IndexImage) {
    const RIGHT_EDGE: usize = 312;

    for y in 0..image.height() {
        let video_bank = ((y & 7) >> 1) * BANK_STRIDE;
        // sprites start one line above the picture and multiplex every 40 lines
        let sprite_line = ((y + 1) % EXPANDED_HEIGHT) >> 1;
        let vic_bank = (y >> 1) & 1;

        for x in 0..image.width() {
            if x < FLI_BUG_COLUMNS {
                image.set(x, y, planes.left_border);
                continue;
            }
            if let Some(border) = planes.right_border.filter(|_| x >= RIGHT_EDGE) {
                image.set(x, y, border);
                continue;
            }

            let offset = bitmap_offset(x, y);
            let screen = peek(planes.video_ram, screen_offset(offset) + video_bank);

            let index = if hires_bit(peek(planes.bitmap, offset), x) == 0 {
                let sx = x - FLI_BUG_COLUMNS;
                let column = sx / 48;
                let number = column + (y / 40) * 6;
                let block = sprite_line * SPRITE_ROW
                    + (number % 6) * SPRITE_BYTES
                    + vic_bank * 0x180
                    + (number / 6) * 0x300;
                let byte = peek(planes.sprites, block + (sx % 48) / 16);

                if hires_bit(byte, sx >> 1) != 0 {
                    planes.sprite_colors.for_column(column)
                } else {
                    screen & 0xf
                }
            } else {
                screen >> 4
            };

            image.set(x, y, index);
        }
    }
}
