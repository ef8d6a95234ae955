//! # badge CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ob_cli::credential::{
    run_canonicalize, run_sign, run_verify, CanonicalizeArgs, SignArgs, VerifyArgs,
};
use ob_cli::image::{run_bake, run_detect, run_unbake, BakeArgs, DetectArgs, UnbakeArgs};

/// Open Badges baking and verification toolkit.
///
/// Embeds credentials in PNG and SVG badges, extracts them again, and signs
/// and verifies their proofs.
#[derive(Parser, Debug)]
#[command(name = "badge", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report whether a file is a PNG or SVG.
    Detect(DetectArgs),

    /// Embed a credential in an image.
    Bake(BakeArgs),

    /// Extract the credential from a baked image.
    Unbake(UnbakeArgs),

    /// Add an Ed25519 proof to a credential.
    Sign(SignArgs),

    /// Verify a credential's proof against a public key.
    Verify(VerifyArgs),

    /// Print the canonical signing input of a document.
    Canonicalize(CanonicalizeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = std::io::stdout().lock();
    let result = match &cli.command {
        Commands::Detect(args) => run_detect(args, &mut stdout),
        Commands::Bake(args) => run_bake(args, &mut stdout),
        Commands::Unbake(args) => run_unbake(args, &mut stdout),
        Commands::Sign(args) => run_sign(args, &mut stdout),
        Commands::Verify(args) => run_verify(args, &mut stdout),
        Commands::Canonicalize(args) => run_canonicalize(args, &mut stdout),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
