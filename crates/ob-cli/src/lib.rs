//! # ob-cli: Open Badges Command-Line Interface
//!
//! ## Subcommands
//!
//! - `detect`: report whether a file is a PNG or SVG badge
//! - `bake` / `unbake`: embed or extract a credential
//! - `sign`: add an Ed25519 proof to a credential
//! - `verify`: check a credential's proof against a PEM public key
//! - `canonicalize`: print the canonical signing input
//!
//! Handlers return the process exit code and write their output to the
//! writer they are given. Argument parsing stays in `main.rs`.

pub mod credential;
pub mod image;

use std::path::Path;

use anyhow::{Context, Result};

/// Read a whole file, naming it in the error.
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Read and parse a JSON credential file.
pub(crate) fn read_credential(path: &Path) -> Result<ob_vc::Credential> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    ob_vc::Credential::from_json_str(&text).with_context(|| format!("{} is not a credential", path.display()))
}
