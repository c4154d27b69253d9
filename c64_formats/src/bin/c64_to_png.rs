use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use c64_formats::{C64File, DecodeOptions, Format, Surface};
use clap::Parser;
use image::{ColorType, ImageEncoder, codecs::png::PngEncoder};

#[derive(Parser, Debug)]
#[command(about = "Decode a C64 picture file into an RGBA PNG", version)]
struct Args {
    /// Picture file to decode
    #[arg(long)]
    input: PathBuf,

    /// Destination PNG (defaults to the input path with a .png extension)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Decode as this format instead of guessing from the extension
    #[arg(long, value_name = "FORMAT")]
    format: Option<Format>,

    /// Fail on truncated or corrupt compressed data instead of writing a
    /// partial image
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let file = match args.format {
        Some(format) => C64File::open_as(&args.input, format),
        None => C64File::open(&args.input),
    }
    .with_context(|| format!("opening {}", args.input.display()))?;

    let options = DecodeOptions {
        strict: args.strict,
        ..DecodeOptions::default()
    };
    let surface = file
        .decode(&options)
        .with_context(|| format!("decoding {} as {}", args.input.display(), file.format()))?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("png"));
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    write_png(&output, &surface)?;

    log::info!("{} decoded as {}", args.input.display(), file.format());
    println!(
        "wrote {}x{} image to {}",
        surface.width(),
        surface.height(),
        output.display()
    );
    Ok(())
}

fn write_png(path: &Path, surface: &Surface) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let encoder = PngEncoder::new(file);
    encoder
        .write_image(
            &surface.to_rgba8(),
            surface.width() as u32,
            surface.height() as u32,
            ColorType::Rgba8.into(),
        )
        .with_context(|| format!("writing PNG to {}", path.display()))?;
    Ok(())
}
