use crate::surface::{Color, IndexImage, Surface};

/// Fixed 16-entry colour table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette(pub [Color; 16]);

/// The VIC-II palette every C64 format resolves through.
pub const C64_PALETTE: Palette = Palette([
    Color(0xFF000000),
    Color(0xFFFFFFFF),
    Color(0xFF68372B),
    Color(0xFF70A4B2),
    Color(0xFF6F3D86),
    Color(0xFF588D43),
    Color(0xFF352879),
    Color(0xFFB8C76F),
    Color(0xFF6F4F25),
    Color(0xFF433900),
    Color(0xFF9A6759),
    Color(0xFF444444),
    Color(0xFF6C6C6C),
    Color(0xFF9AD284),
    Color(0xFF6C5EB5),
    Color(0xFF959595),
]);

impl Palette {
    #[inline]
    pub fn color(&self, index: u8) -> Color {
        self.0[(index & 0xf) as usize]
    }

    /// Write `palette[index]` for every pixel of `image` into the top-left
    /// corner of `dest`. The destination must be at least as large as the
    /// image.
    pub fn resolve(&self, image: &IndexImage, dest: &mut Surface) {
        debug_assert!(dest.fits(image.width(), image.height()));
        for (y, row) in image.rows().enumerate().take(image.height()) {
            for (x, &index) in row.iter().enumerate() {
                dest.set_pixel(x, y, self.color(index));
            }
        }
    }
}
