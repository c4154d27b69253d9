use std::fs;
use std::process::Command;

use anyhow::{Context, Result};
use c64_formats::{C64Error, C64File, DecodeOptions, Format, ImageDecoder};
use tempfile::tempdir;

fn koala_bytes() -> Vec<u8> {
    let mut bytes = vec![0u8; 10003];
    bytes[..2].copy_from_slice(&[0x00, 0x60]);
    // top-left cell: pattern 01 takes the video RAM high nibble
    bytes[2] = 0x55;
    bytes[2 + 0x1f40] = 0xe0;
    // stored background byte, which Koala Painter files do not show
    bytes[2 + 0x2710] = 0x06;
    bytes
}

#[test]
fn open_picks_format_from_extension() -> Result<()> {
    let dir = tempdir().context("creating temporary directory")?;
    let path = dir.path().join("PICTURE.KLA");
    fs::write(&path, koala_bytes())?;

    let file = C64File::open(&path)?;
    assert_eq!(file.format(), Format::KoalaPainter);
    assert_eq!(file.bytes().len(), 10003);
    assert_eq!(file.decoder().header().width, 320);

    let surface = file.decode(&DecodeOptions::default())?;
    assert_eq!(surface.pixel(0, 0), c64_formats::C64_PALETTE.color(0xe));
    assert_eq!(surface.pixel(160, 100), c64_formats::C64_PALETTE.color(0));
    Ok(())
}

#[test]
fn open_as_ignores_the_extension() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("picture.bin");
    fs::write(&path, koala_bytes())?;

    assert!(matches!(
        C64File::open(&path),
        Err(C64Error::UnknownExtension(ext)) if ext == "bin"
    ));
    let file = C64File::open_as(&path, Format::RunPaint)?;
    // right load address, wrong size for Run Paint
    assert!(!file.decoder().recognition().is_recognized());
    Ok(())
}

#[test]
fn missing_file_reports_its_path() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("absent.koa");
    match C64File::open(&path) {
        Err(C64Error::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected an I/O error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn cli_tools_convert_and_describe() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("koala.koa");
    let output = dir.path().join("out").join("koala.png");
    fs::write(&input, koala_bytes())?;

    let status = Command::new(env!("CARGO_BIN_EXE_c64_to_png"))
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .status()
        .context("running c64_to_png")?;
    assert!(status.success(), "c64_to_png exited with {status:?}");

    let png = image::open(&output)?.to_rgba8();
    assert_eq!(png.dimensions(), (320, 200));
    assert_eq!(png.get_pixel(0, 0).0, [0x6C, 0x5E, 0xB5, 0xFF]);

    let info = Command::new(env!("CARGO_BIN_EXE_c64_info"))
        .arg(&input)
        .output()
        .context("running c64_info")?;
    assert!(info.status.success());
    let report: serde_json::Value = serde_json::from_slice(&info.stdout)?;
    assert_eq!(report[0]["recognized"], true);
    assert_eq!(report[0]["header"]["source"], "koala_painter");
    assert_eq!(report[0]["header"]["width"], 320);
    Ok(())
}
