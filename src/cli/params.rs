//! Params command implementation

use anyhow::Result;
use clap::Args;

use super::args::OutputFormat;
use super::context::RunContext;
use super::registry::Execute;
use super::utils::lookup_path;
use crate::error::DomainError;

#[derive(Args, Debug)]
pub struct ParamsArgs {
    /// Only print the value at this dotted path (e.g. network.cidr)
    #[arg(long, value_name = "DOTTED.PATH")]
    pub path: Option<String>,
}

impl Execute for ParamsArgs {
    fn execute(&self, ctx: &RunContext) -> Result<()> {
        let node = match &self.path {
            Some(path) => lookup_path(&ctx.params, path)
                .ok_or_else(|| DomainError::new(format!("No params value at '{path}'")))?,
            None => &ctx.params,
        };

        match ctx.options.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(node)?),
            OutputFormat::Text => print!("{}", serde_yaml::to_string(node)?),
        }
        Ok(())
    }
}
