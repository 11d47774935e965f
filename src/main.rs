//! cumulus: deployment front-end
//!
//! Parses program and command arguments, merges params files, verifies cloud
//! state and runs the requested command.

use anyhow::Result;

fn main() -> Result<()> {
    cumulus::cli::run()
}
