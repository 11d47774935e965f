//! cumulus: deployment front-end
//!
//! Merges operator params files, bootstraps cloud credentials, verifies the
//! remote state bucket and dispatches to a named command.

pub mod cli;
pub mod cloud;
pub mod config;
pub mod error;
