//! Status command implementation

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::context::RunContext;
use super::registry::Execute;
use super::utils::emit;

#[derive(Args, Debug)]
pub struct StatusArgs {}

#[derive(Serialize)]
struct BucketStatus<'a> {
    name: &'a str,
    recorded_region: &'a str,
    live_region: String,
    consistent: bool,
}

impl Execute for StatusArgs {
    fn execute(&self, ctx: &RunContext) -> Result<()> {
        let bucket = ctx.state_bucket()?;
        let live_region = ctx.cloud()?.bucket_region(bucket)?;

        let status = BucketStatus {
            name: &bucket.name,
            recorded_region: &bucket.region,
            consistent: live_region == bucket.region,
            live_region,
        };

        emit(ctx.options.output_format, &status, || {
            format!(
                "State bucket: {}\nRecorded region: {}\nLive region: {}",
                status.name, status.recorded_region, status.live_region
            )
        })
    }
}
