//! Interlace blending. Two index images are resolved through the palette and
//! mixed per pixel in RGB space.

use serde::Serialize;

use crate::palette::Palette;
use crate::surface::{Color, IndexImage, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// `(a >> 1) + (b >> 1)` per channel.
    HalfAndHalf,
    /// Like `HalfAndHalf`, but the second frame is shifted one pixel right;
    /// the first pixel of each row only receives half of the first frame.
    Shifted,
    /// Even pixels from the first frame, odd pixels from the second.
    Alternate,
}

#[inline]
fn half_sum(a: Color, b: Color) -> Color {
    Color::from_rgb(
        (a.r() >> 1) + (b.r() >> 1),
        (a.g() >> 1) + (b.g() >> 1),
        (a.b() >> 1) + (b.b() >> 1),
    )
}

#[inline]
fn half(a: Color) -> Color {
    Color::from_rgb(a.r() >> 1, a.g() >> 1, a.b() >> 1)
}

/// Blend two equally sized index images into the top-left corner of `dest`.
pub fn blend(
    palette: &Palette,
    first: &IndexImage,
    second: &IndexImage,
    mode: BlendMode,
    dest: &mut Surface,
) {
    debug_assert_eq!(first.width(), second.width());
    debug_assert_eq!(first.height(), second.height());
    let width = first.width();

    for y in 0..first.height() {
        for x in 0..width {
            let a = palette.color(first.get(x, y));
            let color = match mode {
                BlendMode::HalfAndHalf => half_sum(a, palette.color(second.get(x, y))),
                BlendMode::Shifted if x == 0 => half(a),
                BlendMode::Shifted => half_sum(a, palette.color(second.get(x - 1, y))),
                BlendMode::Alternate => {
                    if (x + y * width) & 1 == 0 {
                        a
                    } else {
                        palette.color(second.get(x, y))
                    }
                }
            };
            dest.set_pixel(x, y, color);
        }
    }
}
