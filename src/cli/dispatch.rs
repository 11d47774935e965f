//! Command dispatch and failure classification.
//!
//! This is the only place failures are rendered. Everything below it returns
//! errors and leaves presentation to [`report`].

use std::any::Any;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};

use super::args::{CommandInvocation, Usage};
use super::context::RunContext;
use super::registry::CommandDescriptor;
use crate::cloud::CloudError;
use crate::error::DomainError;

const NON_STRING_PANIC: &str = "command panicked with a non-string payload";

pub const CREDENTIALS_FAILURE: &str =
    "Failed to set cloud credentials - check the selected profile or the AWS_* environment variables";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Expected termination; the message is printed as-is.
    Domain(String),
    /// Fault with a short message and a full report for `--debug`.
    Generic { message: String, detail: String },
    /// Something that was never an error value.
    Unexpected(String),
}

pub fn classify(err: &anyhow::Error) -> Failure {
    if let Some(domain) = err.downcast_ref::<DomainError>() {
        return Failure::Domain(domain.to_string());
    }

    let credentials_failure = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<CloudError>())
        .any(|cloud| cloud.code() == "CredentialsError");

    if credentials_failure {
        return Failure::Generic {
            message: CREDENTIALS_FAILURE.to_string(),
            detail: format!("{CREDENTIALS_FAILURE}\n\n{err:?}"),
        };
    }

    startup_failure(err)
}

/// Failure raised before a command runs: no rewriting, message or full report.
pub fn startup_failure(err: &anyhow::Error) -> Failure {
    Failure::Generic { message: format!("{err:#}"), detail: format!("{err:?}") }
}

/// Classify a panic payload raised by a command.
pub fn classify_panic(payload: Box<dyn Any + Send>) -> Failure {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());

    match message {
        Some(message) => Failure::Generic { detail: format!("panicked: {message}"), message },
        None => Failure::Unexpected(NON_STRING_PANIC.to_string()),
    }
}

pub fn report(failure: &Failure, usage: &Usage, debug: bool) {
    let _ = report_to(failure, usage, debug, &mut io::stdout().lock(), &mut io::stderr().lock());
}

/// Domain messages go to `out`; everything else goes through usage on `err`.
pub fn report_to(
    failure: &Failure,
    usage: &Usage,
    debug: bool,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<()> {
    match failure {
        Failure::Domain(message) => writeln!(out, "{message}"),
        Failure::Unexpected(value) => {
            usage.show_to(err, Some(&format!("Unexpected error object: {value}")))
        }
        Failure::Generic { message, detail } => {
            usage.show_to(err, Some(if debug { detail } else { message }))
        }
    }
}

/// Build the command from its parsed options and run it.
///
/// Returns the classified failure, if any, after it has been reported.
pub fn dispatch(
    descriptor: &CommandDescriptor,
    invocation: &CommandInvocation,
    ctx: &RunContext,
    usage: &Usage,
) -> Option<Failure> {
    tracing::debug!("Dispatching command '{}'", invocation.name);

    let failure = run_command(descriptor, invocation, ctx)?;
    report(&failure, usage, ctx.options.debug);
    Some(failure)
}

fn run_command(
    descriptor: &CommandDescriptor,
    invocation: &CommandInvocation,
    ctx: &RunContext,
) -> Option<Failure> {
    let command = match (descriptor.build)(&invocation.matches) {
        Ok(command) => command,
        Err(err) => return Some(classify(&anyhow::Error::new(err))),
    };

    // The classifier renders panics; keep the default hook quiet meanwhile.
    let previous_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| command.execute(ctx)));
    panic::set_hook(previous_hook);

    match outcome {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(classify(&err)),
        Err(payload) => Some(classify_panic(payload)),
    }
}
