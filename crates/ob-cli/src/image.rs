//! # Image Subcommands
//!
//! `detect`, `bake` and `unbake` over files on disk.
//!
//! ```bash
//! badge detect badge.png
//! badge bake badge.svg credential.json -o baked.svg
//! badge unbake baked.svg > credential.json
//! ```

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use ob_bake::{BakeOptions, ImageFormat, UnbakeOptions};

use crate::{read_credential, read_file};

/// Arguments for `detect`.
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Image file to inspect.
    pub file: PathBuf,
}

/// Arguments for `bake`.
#[derive(Args, Debug)]
pub struct BakeArgs {
    /// PNG or SVG image.
    pub image: PathBuf,

    /// Credential JSON file.
    pub credential: PathBuf,

    /// Where to write the baked image.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Skip detection and treat the image as `png` or `svg`.
    #[arg(long)]
    pub format: Option<ImageFormat>,
}

/// Arguments for `unbake`.
#[derive(Args, Debug)]
pub struct UnbakeArgs {
    /// Baked PNG or SVG image.
    pub image: PathBuf,

    /// Skip detection and treat the image as `png` or `svg`.
    #[arg(long)]
    pub format: Option<ImageFormat>,
}

/// Print the detected format. Exit code 1 when unsupported.
pub fn run_detect(args: &DetectArgs, out: &mut impl Write) -> Result<u8> {
    let bytes = read_file(&args.file)?;
    match ob_bake::detect(&bytes) {
        Some(format) => {
            writeln!(out, "{format}")?;
            Ok(0)
        }
        None => {
            writeln!(out, "unsupported")?;
            Ok(1)
        }
    }
}

/// Bake the credential into the image and write the result.
pub fn run_bake(args: &BakeArgs, out: &mut impl Write) -> Result<u8> {
    let image = read_file(&args.image)?;
    let credential = read_credential(&args.credential)?;

    let baked = ob_bake::bake(&image, &credential, &BakeOptions { format: args.format })
        .with_context(|| format!("failed to bake {}", args.image.display()))?;
    std::fs::write(&args.output, baked.data())
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    tracing::info!(format = %baked.format(), size = baked.size(), "baked");
    writeln!(
        out,
        "baked {} ({}, {} bytes) -> {}",
        args.image.display(),
        baked.mime_type(),
        baked.size(),
        args.output.display()
    )?;
    Ok(0)
}

/// Print the embedded credential (or hosted URL). Exit code 1 when the
/// image carries none.
pub fn run_unbake(args: &UnbakeArgs, out: &mut impl Write) -> Result<u8> {
    let image = read_file(&args.image)?;
    let result = ob_bake::unbake(&image, &UnbakeOptions { format: args.format })
        .with_context(|| format!("failed to unbake {}", args.image.display()))?;

    if !result.found {
        tracing::warn!(image = %args.image.display(), "no embedded credential");
        return Ok(1);
    }
    if let Some(credential) = &result.credential {
        writeln!(out, "{}", serde_json::to_string_pretty(credential)?)?;
    } else if let Some(url) = &result.hosted_url {
        writeln!(out, "{url}")?;
    }
    Ok(0)
}
