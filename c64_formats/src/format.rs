use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::C64Error;

/// Every supported paint-program save format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    AdvancedArtStudio,
    AfliEditor,
    AmicaPaint,
    ArtStudio,
    Artist64,
    BlazingPaddles,
    CduPaint,
    DolphinEd,
    Doodle,
    Drazlace,
    Drazpaint,
    EciGraphicEditor,
    FacePainter,
    FliDesigner,
    FliProfi,
    Funpaint2,
    Gunpaint,
    HcbEditor,
    HiresFliDesigner,
    HiresManager,
    KoalaPainter,
    PaintMagic,
    PixelPerfect,
    RunPaint,
    SaracenPaint,
    ShfEditor,
    ShfXl,
    TruePaint,
    UfliEditor,
    UifliEditor,
    Vidcom64,
}

impl Format {
    pub const ALL: [Format; 31] = [
        Format::AdvancedArtStudio,
        Format::AfliEditor,
        Format::AmicaPaint,
        Format::ArtStudio,
        Format::Artist64,
        Format::BlazingPaddles,
        Format::CduPaint,
        Format::DolphinEd,
        Format::Doodle,
        Format::Drazlace,
        Format::Drazpaint,
        Format::EciGraphicEditor,
        Format::FacePainter,
        Format::FliDesigner,
        Format::FliProfi,
        Format::Funpaint2,
        Format::Gunpaint,
        Format::HcbEditor,
        Format::HiresFliDesigner,
        Format::HiresManager,
        Format::KoalaPainter,
        Format::PaintMagic,
        Format::PixelPerfect,
        Format::RunPaint,
        Format::SaracenPaint,
        Format::ShfEditor,
        Format::ShfXl,
        Format::TruePaint,
        Format::UfliEditor,
        Format::UifliEditor,
        Format::Vidcom64,
    ];

    /// Human readable program name.
    pub fn title(self) -> &'static str {
        match self {
            Format::AdvancedArtStudio => "Advanced Art Studio",
            Format::AfliEditor => "AFLI-editor v2.0",
            Format::AmicaPaint => "Amica Paint",
            Format::ArtStudio => "Art Studio",
            Format::Artist64 => "Artist 64",
            Format::BlazingPaddles => "Blazing Paddles",
            Format::CduPaint => "CDU-Paint",
            Format::DolphinEd => "Dolphin Ed",
            Format::Doodle => "Doodle",
            Format::Drazlace => "Drazlace",
            Format::Drazpaint => "Drazpaint",
            Format::EciGraphicEditor => "ECI Graphic Editor v1.0",
            Format::FacePainter => "Face Painter",
            Format::FliDesigner => "FLI Designer 1.1 & 2.0",
            Format::FliProfi => "FLI-Profi",
            Format::Funpaint2 => "Funpaint 2",
            Format::Gunpaint => "Gunpaint",
            Format::HcbEditor => "HCB-Editor v0.05",
            Format::HiresFliDesigner => "Hires FLI Designer",
            Format::HiresManager => "Hires Manager",
            Format::KoalaPainter => "Koala Painter",
            Format::PaintMagic => "Paint Magic",
            Format::PixelPerfect => "Pixel Perfect",
            Format::RunPaint => "Run Paint",
            Format::SaracenPaint => "Saracen Paint",
            Format::ShfEditor => "SHF-Editor v1.0",
            Format::ShfXl => "SHF-XL v1.0",
            Format::TruePaint => "True Paint",
            Format::UfliEditor => "UFLI-Editor v1.0 & v2.0",
            Format::UifliEditor => "UIFLI Editor v1.0",
            Format::Vidcom64 => "Vidcom 64",
        }
    }

    /// File extensions the format is registered under, lower case.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Format::AdvancedArtStudio => &["mpic"],
            Format::AfliEditor => &["afl", "afli"],
            Format::AmicaPaint => &["ami"],
            Format::ArtStudio => &["art", "ocp"],
            Format::Artist64 => &["a64"],
            Format::BlazingPaddles => &["blp", "bpi", "pi"],
            Format::CduPaint => &["cdu"],
            Format::DolphinEd => &["dol"],
            Format::Doodle => &["dd"],
            Format::Drazlace => &["drl", "dlp"],
            Format::Drazpaint => &["drz", "dp64", "drp", "dp"],
            Format::EciGraphicEditor => &["eci"],
            Format::FacePainter => &["fpt", "fcp"],
            Format::FliDesigner => &["fd2"],
            Format::FliProfi => &["fpr"],
            Format::Funpaint2 => &["fun", "fp2"],
            Format::Gunpaint => &["gun", "ifl"],
            Format::HcbEditor => &["hcb"],
            Format::HiresFliDesigner => &["hfc"],
            Format::HiresManager => &["him"],
            Format::KoalaPainter => &["koa", "kla"],
            Format::PaintMagic => &["pmg"],
            Format::PixelPerfect => &["pp", "ppp"],
            Format::RunPaint => &["rpm"],
            Format::SaracenPaint => &["sar"],
            Format::ShfEditor => &["unp", "shfli"],
            Format::ShfXl => &["shx", "shfxl"],
            Format::TruePaint => &["mci", "mcp"],
            Format::UfliEditor => &["ufup", "ufli"],
            Format::UifliEditor => &["uifli"],
            Format::Vidcom64 => &["vid"],
        }
    }

    pub fn from_extension(extension: &str) -> Option<Format> {
        Format::ALL.into_iter().find(|format| {
            format
                .extensions()
                .iter()
                .any(|ext| ext.eq_ignore_ascii_case(extension))
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Format {
    type Err = C64Error;

    /// Accepts a registered extension or the snake_case variant name.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if let Some(format) = Format::from_extension(name) {
            return Ok(format);
        }
        Format::ALL
            .into_iter()
            .find(|format| {
                serde_json::to_value(format)
                    .ok()
                    .and_then(|value| value.as_str().map(|s| s.eq_ignore_ascii_case(name)))
                    .unwrap_or(false)
            })
            .ok_or_else(|| C64Error::UnknownFormat(name.to_string()))
    }
}
