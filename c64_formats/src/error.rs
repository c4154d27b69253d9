use std::path::PathBuf;

use thiserror::Error;

use crate::format::Format;

/// Error conditions returned by the decoders.
#[derive(Debug, Error)]
pub enum C64Error {
    #[error("{format} header not recognised")]
    UnrecognizedFormat { format: Format },
    #[error("{format} payload truncated: expected {expected} unpacked bytes but produced {produced}")]
    Truncated {
        format: Format,
        expected: usize,
        produced: usize,
    },
    #[error("{format} payload corrupt: {reason}")]
    Corrupt { format: Format, reason: String },
    #[error("no decoder registered for extension '{0}'")]
    UnknownExtension(String),
    #[error("no format named '{0}'")]
    UnknownFormat(String),
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, C64Error>;
