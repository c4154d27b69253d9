//! Pixel containers shared by every decoder: the 4-bit [`IndexImage`] that
//! composers write into and the RGBA [`Surface`] handed back to callers.

use serde::Serialize;

/// 32-bit colour packed as `0xAARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Color(pub u32);

impl Color {
    pub const TRANSPARENT: Color = Color(0);

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Color(0xFF00_0000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    #[inline]
    pub fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub fn b(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [self.r(), self.g(), self.b(), self.a()]
    }
}

/// Pixel layout reported in image headers. Every C64 decoder produces
/// 8-bit-per-channel colour with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Rgba8888,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8888 => 4,
        }
    }
}

/// Width x height grid of palette indices, one byte per pixel, low nibble only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexImage {
    width: usize,
    height: usize,
    indices: Vec<u8>,
}

impl IndexImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            indices: vec![0; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.indices[x + y * self.width]
    }

    /// Store an index; values are masked to 4 bits.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, index: u8) {
        self.indices[x + y * self.width] = index & 0xf;
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.indices.chunks_exact(self.width.max(1))
    }
}

/// Caller-owned RGBA destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: usize,
    height: usize,
    format: PixelFormat,
    pixels: Vec<Color>,
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgba8888,
            pixels: vec![Color::TRANSPARENT; width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Color {
        self.pixels[x + y * self.width]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        self.pixels[x + y * self.width] = color;
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn fits(&self, width: usize, height: usize) -> bool {
        self.width >= width && self.height >= height
    }

    /// Copy `source` into the top-left corner, clipped to this surface.
    pub fn blit(&mut self, source: &Surface) {
        let width = self.width.min(source.width);
        let height = self.height.min(source.height);
        for y in 0..height {
            let src = &source.pixels[y * source.width..y * source.width + width];
            let dst_start = y * self.width;
            self.pixels[dst_start..dst_start + width].copy_from_slice(src);
        }
    }

    /// Flatten to tightly packed RGBA8 bytes, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.pixels.len() * PixelFormat::Rgba8888.bytes_per_pixel());
        for color in &self.pixels {
            rgba.extend_from_slice(&color.to_rgba8());
        }
        rgba
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_channels_unpack_from_argb() {
        let color = Color(0xFF68372B);
        assert_eq!(color.to_rgba8(), [0x68, 0x37, 0x2B, 0xFF]);
        assert_eq!(Color::from_rgb(0x68, 0x37, 0x2B), color);
    }

    #[test]
    fn rgba8_export_is_tightly_packed() {
        let mut surface = Surface::new(3, 2);
        surface.set_pixel(2, 1, Color(0xFF68372B));
        let rgba = surface.to_rgba8();
        assert_eq!(rgba.len(), 3 * 2 * PixelFormat::Rgba8888.bytes_per_pixel());
        assert_eq!(&rgba[20..], &[0x68, 0x37, 0x2B, 0xFF]);
    }

    #[test]
    fn index_image_masks_to_nibble() {
        let mut image = IndexImage::new(2, 2);
        image.set(1, 1, 0xfa);
        assert_eq!(image.get(1, 1), 0x0a);
        assert_eq!(image.indices(), &[0, 0, 0, 0x0a]);
    }

    #[test]
    fn blit_clips_to_destination() {
        let mut source = Surface::new(3, 3);
        for y in 0..3 {
            for x in 0..3 {
                source.set_pixel(x, y, Color((y * 3 + x) as u32));
            }
        }

        let mut dest = Surface::new(2, 4);
        dest.blit(&source);
        assert_eq!(dest.pixel(0, 0), Color(0));
        assert_eq!(dest.pixel(1, 2), Color(7));
        assert_eq!(dest.pixel(1, 3), Color::TRANSPARENT);
    }
}
