use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};

use crate::decoder::{C64Decoder, DecodeOptions};
use crate::error::{C64Error, Result};
use crate::format::Format;
use crate::surface::Surface;

/// A memory-mapped picture file together with the format it is decoded as.
#[derive(Debug)]
pub struct C64File {
    path: PathBuf,
    mmap: Mmap,
    format: Format,
}

impl C64File {
    /// Open `path` and pick the format from its extension.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let format = Format::from_extension(extension)
            .ok_or_else(|| C64Error::UnknownExtension(extension.to_ascii_lowercase()))?;
        Self::open_as(path, format)
    }

    /// Open `path` as `format` regardless of its extension.
    pub fn open_as<P: AsRef<Path>>(path: P, format: Format) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let io_error = |source| C64Error::Io {
            path: path.clone(),
            source,
        };
        let file = File::open(&path).map_err(io_error)?;
        let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(io_error)?;
        log::debug!("mapped {} ({} bytes) as {}", path.display(), mmap.len(), format);

        Ok(C64File { path, mmap, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub fn decoder(&self) -> C64Decoder<'_> {
        C64Decoder::new(self.format, &self.mmap)
    }

    pub fn decode(&self, options: &DecodeOptions) -> Result<Surface> {
        self.decoder().decode_surface(options)
    }
}
