//! Per-format memory maps and the glue that turns a recognised file into
//! pixels: unpack the payload if needed, run the composer the format asks
//! for, resolve through the palette.

use std::borrow::Cow;

use crate::bitplane::{
    Background, Banking, ColorRam, FliBug, HiresPlanes, MulticolorPlanes, compose_hires,
    compose_multicolor, peek, plane,
};
use crate::error::{C64Error, Result};
use crate::format::Format;
use crate::interlace::{BlendMode, blend};
use crate::palette::Palette;
use crate::sniff::Layout;
use crate::sprites::{
    BugColumnSprites, SpriteColors, SpriteHiresPlanes, SpriteLayer, UnderlayPlanes,
    compose_sprite_hires, compose_underlay, overlay_bug_columns,
};
use crate::surface::{IndexImage, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorRamMap {
    Plane(usize),
    /// Every cell uses the single byte stored at this offset.
    FillByte(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackgroundMap {
    Black,
    Byte(usize),
    /// Per-scanline table stitched from `(offset, count)` runs; the last
    /// entry repeats down to the bottom of the picture.
    Lines(&'static [(usize, usize)]),
    /// One entry per four scanlines.
    QuarterLines(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FliBugMap {
    Off,
    Plain,
    /// Per-scanline `11` colours stored at this offset.
    OpcodeTable(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MulticolorMap {
    bitmap: usize,
    video_ram: usize,
    color_ram: ColorRamMap,
    background: BackgroundMap,
    banking: Banking,
    bank_color_ram: bool,
    fli_bug: FliBugMap,
}

impl MulticolorMap {
    const fn plain(bitmap: usize, video_ram: usize, color_ram: usize, background: usize) -> Self {
        MulticolorMap {
            bitmap,
            video_ram,
            color_ram: ColorRamMap::Plane(color_ram),
            background: BackgroundMap::Byte(background),
            banking: Banking::Fixed,
            bank_color_ram: false,
            fli_bug: FliBugMap::Off,
        }
    }

    const fn fli(
        bitmap: usize,
        video_ram: usize,
        color_ram: usize,
        background: BackgroundMap,
        fli_bug: FliBugMap,
    ) -> Self {
        MulticolorMap {
            bitmap,
            video_ram,
            color_ram: ColorRamMap::Plane(color_ram),
            background,
            banking: Banking::EveryLine,
            bank_color_ram: false,
            fli_bug,
        }
    }

    /// Same colour and background sources, different bitmap and video RAM.
    const fn frame(self, bitmap: usize, video_ram: usize) -> Self {
        MulticolorMap {
            bitmap,
            video_ram,
            ..self
        }
    }

    fn planes<'a>(&self, memory: &'a [u8], height: usize) -> MulticolorPlanes<'a> {
        let color_ram = match self.color_ram {
            ColorRamMap::Plane(offset) => ColorRam::Plane(plane(memory, offset)),
            ColorRamMap::FillByte(offset) => ColorRam::Fill(peek(memory, offset)),
        };
        let background = match self.background {
            BackgroundMap::Black => Background::Black,
            BackgroundMap::Byte(offset) => Background::Color(peek(memory, offset)),
            BackgroundMap::Lines(runs) => Background::PerLine(Cow::Owned(stitch_lines(memory, runs, height))),
            BackgroundMap::QuarterLines(offset) => Background::PerLine(Cow::Owned(
                (0..height).map(|y| peek(memory, offset + (y >> 2))).collect(),
            )),
        };
        let fli_bug = match self.fli_bug {
            FliBugMap::Off => None,
            FliBugMap::Plain => Some(FliBug { opcode_colors: None }),
            FliBugMap::OpcodeTable(offset) => Some(FliBug {
                opcode_colors: Some(plane(memory, offset)),
            }),
        };

        MulticolorPlanes {
            bitmap: plane(memory, self.bitmap),
            video_ram: plane(memory, self.video_ram),
            color_ram,
            background,
            banking: self.banking,
            bank_color_ram: self.bank_color_ram,
            fli_bug,
        }
    }
}

fn stitch_lines(memory: &[u8], runs: &[(usize, usize)], height: usize) -> Vec<u8> {
    let mut lines: Vec<u8> = runs
        .iter()
        .flat_map(|&(offset, count)| (offset..offset + count).map(|at| peek(memory, at)))
        .take(height)
        .collect();
    let last = lines.last().copied().unwrap_or(0);
    lines.resize(height, last);
    lines
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HiresMap {
    bitmap: usize,
    video_ram: usize,
    fli: bool,
}

impl HiresMap {
    const fn plain(bitmap: usize, video_ram: usize) -> Self {
        HiresMap {
            bitmap,
            video_ram,
            fli: false,
        }
    }

    const fn fli(bitmap: usize, video_ram: usize) -> Self {
        HiresMap {
            bitmap,
            video_ram,
            fli: true,
        }
    }

    fn planes<'a>(&self, memory: &'a [u8]) -> HiresPlanes<'a> {
        HiresPlanes {
            bitmap: plane(memory, self.bitmap),
            video_ram: plane(memory, self.video_ram),
            banking: if self.fli { Banking::EveryLine } else { Banking::Fixed },
            // the hires FLI editors all leave the hidden columns black
            fli_bug: self.fli.then_some(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interlace<M> {
    first: M,
    second: M,
    blend: BlendMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    Multicolor(MulticolorMap),
    Hires(HiresMap),
    MulticolorInterlace(Interlace<MulticolorMap>),
    HiresInterlace(Interlace<HiresMap>),
    /// Multicolor FLI with a sprite overlay over the FLI bug.
    FliProfi(MulticolorMap),
    ShfEditor,
    ShfXl,
    Ufli,
    Uifli,
}

const FUNPAINT_LINES: &[(usize, usize)] = &[(0x3f48, 100), (0x8328, 100)];
const GUNPAINT_LINES: &[(usize, usize)] = &[(0x3f4f, 177), (0x47e8, 20)];

fn multicolor_interlace(first: MulticolorMap, bitmap: usize, video_ram: usize) -> Plan {
    Plan::MulticolorInterlace(Interlace {
        first,
        second: first.frame(bitmap, video_ram),
        blend: BlendMode::Alternate,
    })
}

fn plan(format: Format) -> Plan {
    use BackgroundMap::{Black, Byte, Lines, QuarterLines};

    match format {
        Format::AdvancedArtStudio => Plan::Multicolor(MulticolorMap::plain(0, 0x1f40, 0x2338, 0x2329)),
        Format::AmicaPaint => Plan::Multicolor(MulticolorMap {
            background: Black,
            ..MulticolorMap::plain(0, 0x1f40, 0x2328, 0x2710)
        }),
        Format::Artist64 => Plan::Multicolor(MulticolorMap::plain(0, 0x2000, 0x2400, 0x27ff)),
        Format::BlazingPaddles => Plan::Multicolor(MulticolorMap::plain(0, 0x2000, 0x2400, 0x1f80)),
        Format::CduPaint => Plan::Multicolor(MulticolorMap::plain(0x111, 0x2051, 0x2439, 0x2821)),
        Format::DolphinEd => Plan::Multicolor(MulticolorMap::plain(0x800, 0x400, 0, 0x7e8)),
        Format::Drazpaint => Plan::Multicolor(MulticolorMap {
            background: Black,
            ..MulticolorMap::plain(0x800, 0x400, 0, 0x2740)
        }),
        Format::FacePainter => Plan::Multicolor(MulticolorMap::plain(0, 0x1f40, 0x2328, 0x2712)),
        Format::KoalaPainter => Plan::Multicolor(MulticolorMap {
            background: Black,
            ..MulticolorMap::plain(0, 0x1f40, 0x2328, 0x2710)
        }),
        Format::RunPaint => Plan::Multicolor(MulticolorMap::plain(0, 0x1f40, 0x2328, 0x2710)),
        Format::SaracenPaint => Plan::Multicolor(MulticolorMap::plain(0x400, 0, 0x2400, 0x3f0)),
        Format::Vidcom64 => Plan::Multicolor(MulticolorMap::plain(0x800, 0x400, 0, 0x7e9)),
        Format::PaintMagic => Plan::Multicolor(MulticolorMap {
            color_ram: ColorRamMap::FillByte(0x1fb5),
            ..MulticolorMap::plain(0x72, 0x2072, 0, 0x1fb2)
        }),
        Format::FliDesigner => Plan::Multicolor(MulticolorMap::fli(
            0x2400,
            0x400,
            0,
            Black,
            FliBugMap::OpcodeTable(0),
        )),
        Format::HcbEditor => Plan::Multicolor(MulticolorMap {
            background: QuarterLines(0x2f40),
            banking: Banking::EveryFourLines,
            bank_color_ram: true,
            fli_bug: FliBugMap::Plain,
            ..MulticolorMap::plain(0x1000, 0x800, 0, 0)
        }),
        Format::FliProfi => Plan::FliProfi(MulticolorMap::fli(
            0x2880,
            0x880,
            0x480,
            Black,
            FliBugMap::OpcodeTable(0x380),
        )),

        Format::ArtStudio => Plan::Hires(HiresMap::plain(0, 0x1f40)),
        Format::Doodle => Plan::Hires(HiresMap::plain(0x400, 0)),
        Format::AfliEditor => Plan::Hires(HiresMap::fli(0x2000, 0)),
        Format::HiresFliDesigner => Plan::Hires(HiresMap::fli(0, 0x2000)),
        Format::HiresManager => Plan::Hires(HiresMap::fli(0x140, 0x2028)),

        Format::Drazlace => {
            multicolor_interlace(MulticolorMap::plain(0x800, 0x400, 0, 0x2740), 0x2800, 0x400)
        }
        Format::Funpaint2 => multicolor_interlace(
            MulticolorMap::fli(0x2000, 0, 0x4000, Lines(FUNPAINT_LINES), FliBugMap::Plain),
            0x63e8,
            0x43e8,
        ),
        Format::Gunpaint => multicolor_interlace(
            MulticolorMap::fli(0x2000, 0, 0x4000, Lines(GUNPAINT_LINES), FliBugMap::Plain),
            0x6400,
            0x4400,
        ),
        Format::PixelPerfect => multicolor_interlace(
            MulticolorMap::fli(0x2400, 0x400, 0, Byte(0x437f), FliBugMap::Plain),
            0x6400,
            0x4400,
        ),
        Format::TruePaint => {
            multicolor_interlace(MulticolorMap::plain(0x400, 0, 0x4800, 0x3e8), 0x2400, 0x4400)
        }
        Format::EciGraphicEditor => Plan::HiresInterlace(Interlace {
            first: HiresMap::fli(0, 0x2000),
            second: HiresMap::fli(0x4000, 0x6000),
            blend: BlendMode::HalfAndHalf,
        }),

        Format::ShfEditor => Plan::ShfEditor,
        Format::ShfXl => Plan::ShfXl,
        Format::UfliEditor => Plan::Ufli,
        Format::UifliEditor => Plan::Uifli,
    }
}

/// Return the memory image the composers read: the payload itself for raw
/// files, a zero-initialised scratch buffer holding the depacked stream for
/// packed ones.
pub(crate) fn unpack<'a>(layout: &Layout, bytes: &'a [u8], strict: bool) -> Result<Cow<'a, [u8]>> {
    let payload = bytes.get(layout.payload.clone()).unwrap_or(&[]);
    let Some(packing) = layout.packing else {
        return Ok(Cow::Borrowed(payload));
    };

    let mut scratch = vec![0u8; packing.unpacked_len];
    let window = packing.window.min(scratch.len());
    let outcome = packing.depacker.depack(payload, &mut scratch[..window]);
    log::debug!(
        "{}: depacked {} of {} bytes from {} input bytes",
        layout.format,
        outcome.written,
        window,
        outcome.consumed
    );

    if outcome.overrun {
        let reason = format!("run does not fit after {} bytes", outcome.written);
        if strict {
            return Err(C64Error::Corrupt {
                format: layout.format,
                reason,
            });
        }
        log::warn!("{}: {}, keeping partial image", layout.format, reason);
    } else if !outcome.complete {
        if strict {
            return Err(C64Error::Truncated {
                format: layout.format,
                expected: window,
                produced: outcome.written,
            });
        }
        log::warn!(
            "{}: stream ended after {} of {} bytes, keeping partial image",
            layout.format,
            outcome.written,
            window
        );
    }

    Ok(Cow::Owned(scratch))
}

/// Compose the unpacked memory image into `dest`, which must be at least
/// `layout.width` x `layout.height`.
pub(crate) fn render(layout: &Layout, memory: &[u8], palette: &Palette, dest: &mut Surface) {
    let (width, height) = (layout.width, layout.height);
    let mut image = IndexImage::new(width, height);

    match plan(layout.format) {
        Plan::Multicolor(map) => compose_multicolor(&map.planes(memory, height), &mut image),
        Plan::Hires(map) => compose_hires(&map.planes(memory), &mut image),
        Plan::FliProfi(map) => {
            compose_multicolor(&map.planes(memory, height), &mut image);
            let sprites = BugColumnSprites {
                sprites: memory,
                line_colors: plane(memory, 0x280),
                color1: peek(memory, 0x448),
                color2: peek(memory, 0x449),
            };
            overlay_bug_columns(&sprites, &mut image);
        }
        Plan::ShfEditor => {
            let layers = [
                SpriteLayer {
                    first_sprite: 4,
                    bank_shift: 0,
                    color: peek(memory, 0x3e9),
                },
                SpriteLayer {
                    first_sprite: 0,
                    bank_shift: 0,
                    color: peek(memory, 0x3e8),
                },
            ];
            let planes = SpriteHiresPlanes {
                memory,
                bitmap: plane(memory, 0x2000),
                x_shift: 112,
                y_shift: 1,
                layers: &layers,
            };
            compose_sprite_hires(&planes, &mut image);
        }
        Plan::ShfXl => {
            let layers = [SpriteLayer {
                first_sprite: 1,
                bank_shift: 7,
                color: peek(memory, 0x3e9),
            }];
            let planes = SpriteHiresPlanes {
                memory,
                bitmap: plane(memory, 0x2000),
                x_shift: 88,
                y_shift: 0,
                layers: &layers,
            };
            compose_sprite_hires(&planes, &mut image);
        }
        Plan::Ufli => {
            let background = peek(memory, 0xff1);
            let sprite_colors = if peek(memory, 0xfef) != 0 {
                SpriteColors::PerColumn(plane(memory, 0xff0))
            } else {
                SpriteColors::Single(peek(memory, 0xff0))
            };
            let planes = UnderlayPlanes {
                bitmap: plane(memory, 0x2000),
                video_ram: plane(memory, 0x1000),
                sprites: memory,
                sprite_colors,
                left_border: background,
                right_border: Some(background),
            };
            compose_underlay(&planes, &mut image);
        }

        Plan::MulticolorInterlace(frames) => {
            let mut second = IndexImage::new(width, height);
            compose_multicolor(&frames.first.planes(memory, height), &mut image);
            compose_multicolor(&frames.second.planes(memory, height), &mut second);
            return blend(palette, &image, &second, frames.blend, dest);
        }
        Plan::HiresInterlace(frames) => {
            let mut second = IndexImage::new(width, height);
            compose_hires(&frames.first.planes(memory), &mut image);
            compose_hires(&frames.second.planes(memory), &mut second);
            return blend(palette, &image, &second, frames.blend, dest);
        }
        Plan::Uifli => {
            let mut second = IndexImage::new(width, height);
            for (bank, target) in [(0, &mut image), (0x4000, &mut second)] {
                let color = peek(memory, bank + 0xff0);
                let planes = UnderlayPlanes {
                    bitmap: plane(memory, bank + 0x2000),
                    video_ram: plane(memory, bank),
                    sprites: plane(memory, bank + 0x1000),
                    sprite_colors: SpriteColors::Single(color),
                    left_border: color,
                    right_border: None,
                };
                compose_underlay(&planes, target);
            }
            return blend(palette, &image, &second, BlendMode::HalfAndHalf, dest);
        }
    }

    palette.resolve(&image, dest);
}
