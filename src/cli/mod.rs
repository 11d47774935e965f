//! Command-line interface for cumulus
//!
//! Runs the pipeline: parse arguments, load params, bootstrap cloud
//! credentials, dispatch the command. Every user-facing problem ends with a
//! printed diagnostic and exit status 0; scripts around this tool rely on that.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod args;
pub mod context;
pub mod dispatch;
pub mod registry;

mod params;
mod state;
mod status;
mod utils;

use args::{parse_command_arguments, parse_command_line, ProgramOptions, Usage};
use context::RunContext;
use dispatch::{dispatch, report, startup_failure};
use registry::{CommandDescriptor, Registry};

use crate::cloud::{bootstrap, load_program_state, AwsProvider, TerminalPrompt};
use crate::config::load_params;
use crate::error::UsageError;

pub fn run() -> Result<()> {
    let tokens: Vec<String> = std::env::args().skip(1).collect();
    run_with(&tokens, &Registry::builtin())
}

pub fn run_with(tokens: &[String], registry: &Registry) -> Result<()> {
    let usage = Usage::program(registry);

    let command_line = match parse_command_line(tokens, registry) {
        Ok(command_line) => command_line,
        Err(err) => {
            usage.show(Some(&err.to_string()));
            return Ok(());
        }
    };
    let options = command_line.options;

    init_tracing(&options);
    if options.debug {
        enable_backtraces();
    }

    if options.help {
        usage.show(None);
        return Ok(());
    }

    if options.version {
        println!("cumulus {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let Some(descriptor) = command_line.command_name.as_deref().and_then(|name| registry.get(name))
    else {
        usage.show(Some(&UsageError::MissingCommand.to_string()));
        return Ok(());
    };

    let command_usage = Usage::command(descriptor);
    let invocation = match parse_command_arguments(descriptor, &command_line.command_args) {
        Ok(invocation) => invocation,
        Err(err) => {
            command_usage.show(Some(&err.to_string()));
            return Ok(());
        }
    };

    if invocation.help {
        command_usage.show(None);
        return Ok(());
    }

    let debug = options.debug;
    match prepare(options, descriptor) {
        Ok(ctx) => {
            dispatch(descriptor, &invocation, &ctx, &command_usage);
        }
        Err(err) => report(&startup_failure(&err), &usage, debug),
    }

    Ok(())
}

/// Load params and, unless the command opts out, bootstrap cloud access.
fn prepare(options: ProgramOptions, descriptor: &CommandDescriptor) -> Result<RunContext> {
    let params = load_params(&options.params)?;
    tracing::debug!("Loaded {} params file(s)", options.params.len());

    if descriptor.skip_aws {
        return Ok(RunContext::new(options, params));
    }

    let provider = AwsProvider::new(options.profile.as_deref())?;
    let state = bootstrap(&provider, &TerminalPrompt, load_program_state)?;

    Ok(RunContext::new(options, params).with_cloud(Box::new(provider), state))
}

/// Errors created from here on carry a backtrace in their `{:?}` report.
fn enable_backtraces() {
    if std::env::var_os("RUST_LIB_BACKTRACE").is_none() {
        std::env::set_var("RUST_LIB_BACKTRACE", "1");
    }
}

fn init_tracing(options: &ProgramOptions) {
    // RUST_LOG always applies; --verbose opens our own debug output and
    // --debug opens everything, cloud SDK included.
    let mut filter = EnvFilter::from_default_env().add_directive(Level::WARN.into());
    if options.debug {
        filter = filter.add_directive(Level::DEBUG.into());
    } else if options.verbose {
        if let Ok(directive) = "cumulus=debug".parse() {
            filter = filter.add_directive(directive);
        }
    }
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
