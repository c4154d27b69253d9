//! Walk a directory of C64 pictures, decode every file with a registered
//! extension and write a JSON survey of what decoded and what did not.

mod report;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use c64_formats::{C64Error, C64File, DecodeOptions, DecoderRegistry, ImageDecoder};
use clap::Parser;
use walkdir::WalkDir;

use crate::report::{FileEntry, ImageStats, Outcome, SurveyReport};

#[derive(Parser, Debug)]
#[command(about = "Survey a directory tree of C64 picture files", version)]
struct Args {
    /// Directory to scan recursively
    #[arg(long, value_name = "DIR")]
    root: PathBuf,

    /// Write the report here instead of stdout
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Count truncated compressed files as failures
    #[arg(long)]
    strict: bool,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let options = DecodeOptions {
        strict: args.strict,
        ..DecodeOptions::default()
    };
    let report = survey(&args.root, &options)?;
    log::info!(
        "{} of {} files decoded",
        report.total_decoded(),
        report.files.len()
    );

    match args.output.as_ref() {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
            }
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            write_report(BufWriter::new(file), &report, args.pretty)?;
        }
        None => write_report(io::stdout().lock(), &report, args.pretty)?,
    }

    Ok(())
}

fn write_report<W: Write>(mut writer: W, report: &SurveyReport, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, report)?;
    } else {
        serde_json::to_writer(&mut writer, report)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn survey(root: &Path, options: &DecodeOptions) -> Result<SurveyReport> {
    let registry = DecoderRegistry::with_c64_formats();
    let mut report = SurveyReport::new(root.to_path_buf());

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|res| res.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| registry.supports(ext))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    for path in paths {
        let file = match C64File::open(&path) {
            Ok(file) => file,
            Err(err) => {
                log::warn!("skipping {}: {err}", path.display());
                continue;
            }
        };
        report.record(survey_file(&file, options));
    }

    Ok(report)
}

fn survey_file(file: &C64File, options: &DecodeOptions) -> FileEntry {
    let decoder = file.decoder();
    let outcome = match decoder.decode_surface(options) {
        Ok(surface) => Outcome::Decoded(ImageStats::from_surface(&surface, decoder.header().compressed)),
        Err(C64Error::UnrecognizedFormat { .. }) => Outcome::Unrecognized,
        Err(err) => Outcome::Failed {
            reason: err.to_string(),
        },
    };

    FileEntry {
        path: file.path().to_path_buf(),
        format: file.format(),
        size: file.bytes().len(),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c64_formats::Format;

    #[test]
    fn survey_walks_and_classifies_files() {
        let dir = tempfile::tempdir().unwrap();

        let mut koala = vec![0u8; 10003];
        koala[..2].copy_from_slice(&[0x00, 0x60]);
        fs::write(dir.path().join("good.koa"), &koala).unwrap();
        fs::write(dir.path().join("short.koa"), [0x00, 0x60, 0x01]).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/notes.txt"), b"hello").unwrap();

        let report = survey(dir.path(), &DecodeOptions::default()).unwrap();
        assert_eq!(report.files.len(), 2);
        let koala = &report.formats[&Format::KoalaPainter];
        assert_eq!(koala.files, 2);
        assert_eq!(koala.decoded, 1);
        assert_eq!(koala.unrecognized, 1);
    }
}
