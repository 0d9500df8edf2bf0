//! CLI command handlers.

pub mod chat;
pub mod config;
pub mod providers;
pub mod review;
pub mod ticket;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// Resolves text given inline or through `--file` (`-` reads stdin).
///
/// Neither given yields an empty string; the command's own validation
/// reports it.
pub fn read_input(inline: Option<String>, file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path == Path::new("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("read stdin")?;
            Ok(text)
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display())),
        None => Ok(inline.unwrap_or_default()),
    }
}
