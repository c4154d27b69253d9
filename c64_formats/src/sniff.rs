//! Header sniffing. Each format is recognised by its 16-bit load address and
//! either the exact file size or a short signature.

use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::depack::Depacker;
use crate::format::Format;

const STANDARD_WIDTH: usize = 320;
const STANDARD_HEIGHT: usize = 200;

/// How the payload of a packed file expands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Packing {
    pub depacker: Depacker,
    /// Size of the zero-initialised scratch buffer the payload expands into.
    pub unpacked_len: usize,
    /// Leading part of the scratch buffer the depacker fills.
    pub window: usize,
}

impl Packing {
    fn new(depacker: Depacker, unpacked_len: usize) -> Self {
        Self {
            depacker,
            unpacked_len,
            window: unpacked_len,
        }
    }
}

/// Everything learned from a successful sniff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub format: Format,
    pub load_address: u16,
    pub width: usize,
    pub height: usize,
    /// File bytes holding the raw memory image or the packed stream.
    pub payload: Range<usize>,
    pub packing: Option<Packing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "layout", rename_all = "snake_case")]
pub enum Recognition {
    Recognized(Layout),
    Unrecognized,
}

impl Recognition {
    pub fn layout(&self) -> Option<&Layout> {
        match self {
            Recognition::Recognized(layout) => Some(layout),
            Recognition::Unrecognized => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, Recognition::Recognized(_))
    }
}

pub fn load_address(bytes: &[u8]) -> Option<u16> {
    (bytes.len() >= 2).then(|| LittleEndian::read_u16(bytes))
}

fn has_signature(bytes: &[u8], offset: usize, signature: &[u8]) -> bool {
    bytes.get(offset..offset + signature.len()) == Some(signature)
}

struct Sniffer<'a> {
    format: Format,
    bytes: &'a [u8],
    load: u16,
}

impl Sniffer<'_> {
    fn raw(&self, width: usize, height: usize) -> Layout {
        Layout {
            format: self.format,
            load_address: self.load,
            width,
            height,
            payload: 2..self.bytes.len(),
            packing: None,
        }
    }

    fn packed(&self, payload_start: usize, packing: Packing, width: usize, height: usize) -> Layout {
        Layout {
            format: self.format,
            load_address: self.load,
            width,
            height,
            payload: payload_start.min(self.bytes.len())..self.bytes.len(),
            packing: Some(packing),
        }
    }

    fn exact(&self, load: u16, size: usize) -> bool {
        self.load == load && self.bytes.len() == size
    }

    fn standard_raw(&self, load: u16, size: usize) -> Option<Layout> {
        self.exact(load, size)
            .then(|| self.raw(STANDARD_WIDTH, STANDARD_HEIGHT))
    }

    /// Raw file of an exact size, or `keyword` + escape byte + RLE stream.
    fn raw_or_keyword_rle(&self, load: u16, size: usize, keyword: &[u8], unpacked_len: usize) -> Option<Layout> {
        if self.exact(load, size) {
            return Some(self.raw(STANDARD_WIDTH, STANDARD_HEIGHT));
        }
        if self.load != load || !has_signature(self.bytes, 2, keyword) {
            return None;
        }
        let escape_at = 2 + keyword.len();
        let escape = *self.bytes.get(escape_at)?;
        Some(self.packed(
            escape_at + 1,
            Packing::new(Depacker::escape(escape), unpacked_len),
            STANDARD_WIDTH,
            STANDARD_HEIGHT,
        ))
    }

    /// Raw file of an exact size, or `packed_load` + escape byte + RLE stream.
    fn raw_or_escape_rle(
        &self,
        load: u16,
        size: usize,
        packed_load: u16,
        unpacked_len: usize,
        width: usize,
        height: usize,
    ) -> Option<Layout> {
        if self.exact(load, size) {
            return Some(self.raw(width, height));
        }
        if self.load != packed_load {
            return None;
        }
        let escape = *self.bytes.get(2)?;
        Some(self.packed(3, Packing::new(Depacker::escape(escape), unpacked_len), width, height))
    }
}

/// Decide whether `bytes` is a file of the given format.
pub fn sniff(format: Format, bytes: &[u8]) -> Recognition {
    let layout = match load_address(bytes) {
        Some(load) => sniff_layout(&Sniffer { format, bytes, load }),
        None => None,
    };

    match layout {
        Some(layout) => {
            log::debug!(
                "recognised {} ({}x{}, load ${:04x}, {})",
                format,
                layout.width,
                layout.height,
                layout.load_address,
                if layout.packing.is_some() { "packed" } else { "raw" }
            );
            Recognition::Recognized(layout)
        }
        None => Recognition::Unrecognized,
    }
}

fn sniff_layout(s: &Sniffer<'_>) -> Option<Layout> {
    let bytes = s.bytes;

    match s.format {
        Format::AdvancedArtStudio => s.standard_raw(0x2000, 10018),
        Format::AfliEditor => s.standard_raw(0x4000, 16385),
        Format::ArtStudio => s.standard_raw(0x2000, 9009),
        Format::Artist64 => s.standard_raw(0x4000, 10242),
        Format::BlazingPaddles => s.standard_raw(0xa000, 10242),
        Format::CduPaint => s.standard_raw(0x7eef, 10277),
        Format::DolphinEd => s.standard_raw(0x5800, 10242),
        Format::Doodle => s.standard_raw(0x1c00, 9218),
        Format::FacePainter => s.standard_raw(0x4000, 10004),
        Format::FliDesigner => s.standard_raw(0x3c00, 17409),
        Format::FliProfi => s.standard_raw(0x3780, 18370),
        Format::HcbEditor => s.standard_raw(0x5000, 12148),
        Format::HiresFliDesigner => s.standard_raw(0x4000, 16386),
        Format::KoalaPainter => s.standard_raw(0x6000, 10003),
        Format::PaintMagic => s.standard_raw(0x3f8e, 9332),
        Format::RunPaint => s.standard_raw(0x6000, 10006),
        Format::SaracenPaint => s.standard_raw(0x7800, 10018),
        Format::Vidcom64 => s.standard_raw(0x5800, 10050),
        Format::ShfXl => s.exact(0x4000, 15362).then(|| s.raw(144, 168)),

        Format::AmicaPaint => {
            // Packed stream ends with the escape byte and a zero terminator.
            let n = bytes.len();
            (n >= 3 && bytes[n - 1] == 0x00 && bytes[n - 2] == 0xc2).then(|| Layout {
                payload: 2..n - 1,
                ..s.packed(2, Packing::new(Depacker::escape(0xc2), 10513), STANDARD_WIDTH, STANDARD_HEIGHT)
            })
        }
        Format::Drazlace => s.raw_or_keyword_rle(0x5800, 18242, b"DRAZLACE! 1.0", 18240),
        Format::Drazpaint => s.raw_or_keyword_rle(0x5800, 10051, b"DRAZPAINT 2.0", 10049),
        Format::EciGraphicEditor => {
            s.raw_or_escape_rle(0x4000, 32770, 0x4000, 32768, STANDARD_WIDTH, STANDARD_HEIGHT)
        }
        Format::UfliEditor => {
            s.raw_or_escape_rle(0x4000, 16194, 0x8000, 16192, STANDARD_WIDTH, STANDARD_HEIGHT)
        }
        Format::ShfEditor => s.raw_or_escape_rle(0x4000, 15874, 0xa000, 15872, 96, 167),

        Format::Funpaint2 => {
            if s.load != 0x3ff0 || bytes.len() <= 16 || !has_signature(bytes, 2, b"FUNPAINT (MT) ") {
                return None;
            }
            let compressed = *bytes.get(16)? != 0;
            let escape = *bytes.get(17)?;
            if compressed {
                Some(s.packed(
                    18,
                    Packing::new(Depacker::funpaint(escape), 33678),
                    STANDARD_WIDTH,
                    STANDARD_HEIGHT,
                ))
            } else {
                (bytes.len() == 33694).then(|| Layout {
                    payload: 18..bytes.len(),
                    ..s.raw(STANDARD_WIDTH, STANDARD_HEIGHT)
                })
            }
        }
        Format::Gunpaint => (s.exact(0x4000, 33603) && has_signature(bytes, 0x3ea, b"GUNPAINT (JZ)   "))
            .then(|| s.raw(STANDARD_WIDTH, STANDARD_HEIGHT)),
        Format::HiresManager => {
            if s.exact(0x4000, 16385) {
                (bytes[2] == 0xff).then(|| s.raw(STANDARD_WIDTH, 192))
            } else if s.load == 0x4000 {
                let packing = Packing {
                    window: 0x3ff2,
                    ..Packing::new(Depacker::hires_manager(), 16383)
                };
                Some(s.packed(2, packing, STANDARD_WIDTH, 192))
            } else {
                None
            }
        }
        Format::PixelPerfect => {
            if s.exact(0x3c00, 33602) {
                return Some(s.raw(STANDARD_WIDTH, STANDARD_HEIGHT));
            }
            if s.load != 0x3bfc || !has_signature(bytes, 2, &[0x10, 0x10, 0x10]) {
                return None;
            }
            let escape = *bytes.get(5)?;
            Some(s.packed(
                6,
                Packing::new(Depacker::pixel_perfect(escape), 33600),
                STANDARD_WIDTH,
                STANDARD_HEIGHT,
            ))
        }
        Format::TruePaint => {
            if s.exact(0x9c00, 19434) {
                Some(s.raw(STANDARD_WIDTH, STANDARD_HEIGHT))
            } else if s.load == 0x0801 && has_signature(bytes, 7, b"2059") {
                Some(s.packed(
                    2,
                    Packing::new(Depacker::true_paint(), 19432),
                    STANDARD_WIDTH,
                    STANDARD_HEIGHT,
                ))
            } else {
                None
            }
        }
        Format::UifliEditor => {
            if s.load != 0x4000 {
                return None;
            }
            let escape = *bytes.get(2)?;
            Some(s.packed(
                3,
                Packing::new(Depacker::uifli(escape), 32897),
                STANDARD_WIDTH,
                STANDARD_HEIGHT,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(load: u16, size: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; size];
        bytes[..2].copy_from_slice(&load.to_le_bytes());
        bytes
    }

    #[test]
    fn exact_size_match_is_required() {
        assert!(sniff(Format::AdvancedArtStudio, &file(0x2000, 10018)).is_recognized());
        assert!(!sniff(Format::AdvancedArtStudio, &file(0x2000, 10017)).is_recognized());
        assert!(!sniff(Format::AdvancedArtStudio, &file(0x2001, 10018)).is_recognized());
        assert!(!sniff(Format::AdvancedArtStudio, &[0x00]).is_recognized());
    }

    #[test]
    fn same_size_different_load_address() {
        let saracen = file(0x7800, 10018);
        assert!(sniff(Format::SaracenPaint, &saracen).is_recognized());
        assert!(!sniff(Format::AdvancedArtStudio, &saracen).is_recognized());
    }

    #[test]
    fn keyword_formats_pick_up_escape_byte() {
        let mut bytes = file(0x5800, 40);
        bytes[2..15].copy_from_slice(b"DRAZPAINT 2.0");
        bytes[15] = 0xfe;
        let layout = sniff(Format::Drazpaint, &bytes).layout().cloned().unwrap();
        assert_eq!(layout.payload, 16..40);
        let packing = layout.packing.unwrap();
        assert_eq!(packing.depacker, Depacker::escape(0xfe));
        assert_eq!(packing.unpacked_len, 10049);

        bytes[2..15].copy_from_slice(b"DRAZLACE! 1.0");
        assert!(!sniff(Format::Drazpaint, &bytes).is_recognized());
        assert!(sniff(Format::Drazlace, &bytes).is_recognized());
    }

    #[test]
    fn amica_is_recognised_by_its_trailer() {
        let mut bytes = file(0x4000, 100);
        assert!(!sniff(Format::AmicaPaint, &bytes).is_recognized());
        bytes[98] = 0xc2;
        let layout = sniff(Format::AmicaPaint, &bytes).layout().cloned().unwrap();
        assert_eq!(layout.payload, 2..99);
    }

    #[test]
    fn hires_manager_raw_needs_marker_byte() {
        let mut bytes = file(0x4000, 16385);
        let packed = sniff(Format::HiresManager, &bytes);
        assert!(!packed.is_recognized());
        bytes[2] = 0xff;
        let layout = sniff(Format::HiresManager, &bytes).layout().cloned().unwrap();
        assert_eq!((layout.width, layout.height), (320, 192));
        assert!(layout.packing.is_none());

        let layout = sniff(Format::HiresManager, &file(0x4000, 4000)).layout().cloned().unwrap();
        let packing = layout.packing.unwrap();
        assert_eq!(packing.window, 0x3ff2);
    }

    #[test]
    fn funpaint_uncompressed_requires_full_size() {
        let mut bytes = file(0x3ff0, 33694);
        bytes[2..16].copy_from_slice(b"FUNPAINT (MT) ");
        let layout = sniff(Format::Funpaint2, &bytes).layout().cloned().unwrap();
        assert_eq!(layout.payload, 18..33694);
        assert!(layout.packing.is_none());

        bytes.truncate(1000);
        assert!(!sniff(Format::Funpaint2, &bytes).is_recognized());
        bytes[16] = 1;
        bytes[17] = 0x9a;
        let packing = sniff(Format::Funpaint2, &bytes).layout().unwrap().packing.unwrap();
        assert_eq!(packing.depacker, Depacker::funpaint(0x9a));
    }

    #[test]
    fn gunpaint_checks_embedded_name() {
        let mut bytes = file(0x4000, 33603);
        assert!(!sniff(Format::Gunpaint, &bytes).is_recognized());
        bytes[0x3ea..0x3fa].copy_from_slice(b"GUNPAINT (JZ)   ");
        assert!(sniff(Format::Gunpaint, &bytes).is_recognized());
    }

    #[test]
    fn true_paint_basic_stub_signature() {
        let mut bytes = file(0x0801, 600);
        bytes[7..11].copy_from_slice(b"2059");
        let layout = sniff(Format::TruePaint, &bytes).layout().cloned().unwrap();
        assert_eq!(layout.packing.unwrap().depacker, Depacker::true_paint());
    }
}
