use std::collections::BTreeMap;
use std::path::PathBuf;

use c64_formats::{Format, Surface};
use serde::Serialize;

#[derive(Debug, Default, Serialize)]
pub struct SurveyReport {
    pub root: PathBuf,
    pub formats: BTreeMap<Format, FormatSummary>,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct FormatSummary {
    pub files: usize,
    pub decoded: usize,
    pub unrecognized: usize,
    pub failed: usize,
    pub compressed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub format: Format,
    pub size: usize,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Decoded(ImageStats),
    Unrecognized,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageStats {
    pub width: usize,
    pub height: usize,
    pub compressed: bool,
    /// Pixel count per colour, keyed `#rrggbb`.
    pub colors: BTreeMap<String, usize>,
}

impl ImageStats {
    pub fn from_surface(surface: &Surface, compressed: bool) -> Self {
        let mut colors = BTreeMap::new();
        for color in surface.pixels() {
            let key = format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b());
            *colors.entry(key).or_insert(0) += 1;
        }
        Self {
            width: surface.width(),
            height: surface.height(),
            compressed,
            colors,
        }
    }
}

impl SurveyReport {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    pub fn record(&mut self, entry: FileEntry) {
        let summary = self.formats.entry(entry.format).or_default();
        summary.files += 1;
        match &entry.outcome {
            Outcome::Decoded(stats) => {
                summary.decoded += 1;
                if stats.compressed {
                    summary.compressed += 1;
                }
            }
            Outcome::Unrecognized => summary.unrecognized += 1,
            Outcome::Failed { .. } => summary.failed += 1,
        }
        self.files.push(entry);
    }

    pub fn total_decoded(&self) -> usize {
        self.formats.values().map(|summary| summary.decoded).sum()
    }
}
