use serde::Serialize;

use crate::adapters;
use crate::error::{C64Error, Result};
use crate::format::Format;
use crate::palette::{C64_PALETTE, Palette};
use crate::sniff::{Recognition, sniff};
use crate::surface::{PixelFormat, Surface};

/// Image properties known before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageHeader {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub source: Format,
    pub compressed: bool,
}

/// Decode-time knobs. `level`, `depth` and `face` select a sub-image in
/// container formats; every C64 picture has exactly one, so only zero is
/// meaningful here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    pub level: u32,
    pub depth: u32,
    pub face: u32,
    /// Report truncated or overrunning compressed streams as errors
    /// instead of decoding whatever was unpacked.
    pub strict: bool,
    pub palette: Palette,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            level: 0,
            depth: 0,
            face: 0,
            strict: false,
            palette: C64_PALETTE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecodeStatus {
    /// The destination was large enough to be written in place.
    pub direct: bool,
}

pub trait ImageDecoder {
    fn header(&self) -> ImageHeader;

    /// Decode into `dest`. A destination smaller than the image receives the
    /// top-left part of it.
    fn decode(&self, dest: &mut Surface, options: &DecodeOptions) -> Result<DecodeStatus>;
}

/// Decoder for one C64 paint program format over a borrowed file image.
#[derive(Debug, Clone)]
pub struct C64Decoder<'a> {
    format: Format,
    bytes: &'a [u8],
    recognition: Recognition,
}

impl<'a> C64Decoder<'a> {
    pub fn new(format: Format, bytes: &'a [u8]) -> Self {
        let recognition = sniff(format, bytes);
        if !recognition.is_recognized() {
            log::debug!("{}: {} byte file not recognised", format, bytes.len());
        }
        Self {
            format,
            bytes,
            recognition,
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn recognition(&self) -> &Recognition {
        &self.recognition
    }

    /// Decode into a freshly allocated surface of the image's own size.
    pub fn decode_surface(&self, options: &DecodeOptions) -> Result<Surface> {
        let header = self.header();
        let mut surface = Surface::new(header.width, header.height);
        self.decode(&mut surface, options)?;
        Ok(surface)
    }
}

impl ImageDecoder for C64Decoder<'_> {
    fn header(&self) -> ImageHeader {
        let (width, height, compressed) = match self.recognition.layout() {
            Some(layout) => (layout.width, layout.height, layout.packing.is_some()),
            None => (0, 0, false),
        };
        ImageHeader {
            width,
            height,
            format: PixelFormat::Rgba8888,
            source: self.format,
            compressed,
        }
    }

    fn decode(&self, dest: &mut Surface, options: &DecodeOptions) -> Result<DecodeStatus> {
        let layout = self
            .recognition
            .layout()
            .ok_or(C64Error::UnrecognizedFormat {
                format: self.format,
            })?;

        let memory = adapters::unpack(layout, self.bytes, options.strict)?;

        if dest.fits(layout.width, layout.height) {
            adapters::render(layout, &memory, &options.palette, dest);
            return Ok(DecodeStatus { direct: true });
        }

        let mut temp = Surface::new(layout.width, layout.height);
        adapters::render(layout, &memory, &options.palette, &mut temp);
        dest.blit(&temp);
        Ok(DecodeStatus { direct: false })
    }
}
