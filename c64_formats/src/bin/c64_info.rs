//! Sniff C64 picture files and print what was recognised as JSON.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use c64_formats::{C64File, Format, ImageDecoder, ImageHeader, Layout};
use clap::Parser;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "Report format and dimensions of C64 picture files", version)]
struct Args {
    /// Files to inspect
    #[arg(value_name = "PATH", required = true)]
    files: Vec<PathBuf>,

    /// Treat every file as this format (extension or snake_case name)
    #[arg(long, value_name = "FORMAT")]
    format: Option<Format>,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[derive(Debug, Serialize)]
struct FileReport {
    path: PathBuf,
    size: usize,
    recognized: bool,
    header: ImageHeader,
    #[serde(skip_serializing_if = "Option::is_none")]
    layout: Option<Layout>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut reports = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let file = match args.format {
            Some(format) => C64File::open_as(path, format),
            None => C64File::open(path),
        }
        .with_context(|| format!("opening {}", path.display()))?;

        let decoder = file.decoder();
        let layout = decoder.recognition().layout().cloned();
        reports.push(FileReport {
            path: path.clone(),
            size: file.bytes().len(),
            recognized: layout.is_some(),
            header: decoder.header(),
            layout,
        });
    }

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    if args.pretty {
        serde_json::to_writer_pretty(&mut writer, &reports)?;
    } else {
        serde_json::to_writer(&mut writer, &reports)?;
    }
    writeln!(writer)?;

    Ok(())
}
