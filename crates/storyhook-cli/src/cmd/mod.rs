pub mod install;
pub mod resolve;
pub mod serve;
pub mod settings;
pub mod tick;

use anyhow::{Context, Result};

/// Read all of stdin as UTF-8.
pub fn read_stdin() -> Result<String> {
    std::io::read_to_string(std::io::stdin()).context("failed to read stdin")
}
