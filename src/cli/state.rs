//! State command implementation

use anyhow::Result;
use clap::Args;

use super::context::RunContext;
use super::registry::Execute;
use super::utils::emit;
use crate::cloud::{load_program_state, state_dir};
use crate::error::DomainError;

#[derive(Args, Debug)]
pub struct StateArgs {}

impl Execute for StateArgs {
    fn execute(&self, ctx: &RunContext) -> Result<()> {
        let state = load_program_state()?.unwrap_or_default();
        let Some(bucket) = state.state_bucket() else {
            let location =
                state_dir().map(|dir| dir.display().to_string()).unwrap_or_else(|| "<unset>".into());
            return Err(DomainError::new(format!(
                "Not provisioned yet - no state bucket recorded in {location}"
            ))
            .into());
        };

        emit(ctx.options.output_format, bucket, || {
            format!("State bucket: {}\nRegion: {}", bucket.name, bucket.region)
        })
    }
}
