mod adapters;
pub mod bitplane;
pub mod decoder;
pub mod depack;
pub mod error;
pub mod file;
pub mod format;
pub mod interlace;
pub mod palette;
pub mod registry;
pub mod sniff;
pub mod sprites;
pub mod surface;

pub use decoder::{C64Decoder, DecodeOptions, DecodeStatus, ImageDecoder, ImageHeader};
pub use depack::{DepackOutcome, Depacker};
pub use error::{C64Error, Result};
pub use file::C64File;
pub use format::Format;
pub use interlace::BlendMode;
pub use palette::{C64_PALETTE, Palette};
pub use registry::{DecoderFactory, DecoderRegistry};
pub use sniff::{Layout, Recognition, sniff};
pub use surface::{Color, IndexImage, PixelFormat, Surface};
