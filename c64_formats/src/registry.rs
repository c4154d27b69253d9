use std::collections::BTreeMap;
use std::path::Path;

use crate::decoder::{C64Decoder, ImageDecoder};
use crate::error::{C64Error, Result};
use crate::format::Format;

/// Builds a decoder over a borrowed file image.
pub type DecoderFactory = for<'a> fn(&'a [u8]) -> Box<dyn ImageDecoder + 'a>;

/// Maps lower-case file extensions to decoder factories.
#[derive(Debug, Clone, Default)]
pub struct DecoderRegistry {
    factories: BTreeMap<String, DecoderFactory>,
}

fn boxed(format: Format, bytes: &[u8]) -> Box<dyn ImageDecoder + '_> {
    Box::new(C64Decoder::new(format, bytes))
}

macro_rules! format_factory {
    ($($variant:ident),* $(,)?) => {
        /// Factory that builds a [`C64Decoder`] for `format`.
        pub fn format_factory(format: Format) -> DecoderFactory {
            match format {
                $(Format::$variant => |bytes| boxed(Format::$variant, bytes),)*
            }
        }
    };
}

format_factory!(
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
);

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every C64 format under each of its extensions.
    pub fn with_c64_formats() -> Self {
        let mut registry = Self::new();
        for format in Format::ALL {
            for extension in format.extensions() {
                registry.register(format_factory(format), extension);
            }
        }
        log::debug!("registered {} extensions", registry.factories.len());
        registry
    }

    /// Associate `extension` with `factory`, replacing any earlier entry.
    pub fn register(&mut self, factory: DecoderFactory, extension: &str) {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        if self.factories.insert(extension.clone(), factory).is_some() {
            log::warn!("decoder for '.{extension}' replaced");
        }
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.factories
            .contains_key(&extension.trim_start_matches('.').to_ascii_lowercase())
    }

    pub fn decoder<'a>(&self, extension: &str, bytes: &'a [u8]) -> Result<Box<dyn ImageDecoder + 'a>> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        let factory = self
            .factories
            .get(&extension)
            .ok_or(C64Error::UnknownExtension(extension))?;
        Ok(factory(bytes))
    }

    pub fn decoder_for_path<'a>(
        &self,
        path: &Path,
        bytes: &'a [u8],
    ) -> Result<Box<dyn ImageDecoder + 'a>> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        self.decoder(extension, bytes)
    }
}
