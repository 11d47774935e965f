//! Program and command argument parsing.
//!
//! The invocation is split at the first token naming a registered command:
//! everything before it is parsed as program options, everything after it
//! belongs to the command and is parsed against that command's own schema.

use clap::{Arg, ArgAction, ArgMatches, CommandFactory, Parser};
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

use super::registry::{CommandDescriptor, Registry};
use crate::error::UsageError;

const PROGRAM_USAGE: &str = "cumulus [common_options] command [command_options]";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(UsageError::InvalidOutputFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

// Common options accepted before the command name.
#[derive(Parser, Debug)]
#[command(name = "cumulus", no_binary_name = true, override_usage = PROGRAM_USAGE)]
#[command(disable_help_flag = true, disable_version_flag = true)]
#[command(next_help_heading = "Common options")]
struct ProgramArgs {
    /// Set which aws profile to use for credentials
    #[arg(long, value_name = "ARG")]
    profile: Option<String>,

    /// Yml params file passed in to your deployment definition (repeatable)
    #[arg(long, value_name = "ARG", action = ArgAction::Append)]
    params: Vec<PathBuf>,

    /// Print more stuff
    #[arg(short, long)]
    verbose: bool,

    /// Print everything, including cloud SDK traffic
    #[arg(short, long)]
    debug: bool,

    /// Output format (json or text)
    #[arg(short = 'f', long, value_name = "ARG", default_value = "text")]
    output_format: String,

    /// Display current version
    #[arg(long)]
    version: bool,

    /// Display help
    #[arg(short, long)]
    help: bool,

    /// Tokens that are neither options nor a known command
    #[arg(hide = true)]
    leftover: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramOptions {
    pub profile: Option<String>,
    pub params: Vec<PathBuf>,
    pub verbose: bool,
    pub debug: bool,
    pub output_format: OutputFormat,
    pub version: bool,
    pub help: bool,
}

/// Result of parsing the whole invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub options: ProgramOptions,
    pub command_name: Option<String>,
    pub command_args: Vec<String>,
}

/// A command's arguments parsed against its schema.
#[derive(Debug)]
pub struct CommandInvocation {
    pub name: String,
    pub matches: ArgMatches,
    pub help: bool,
}

/// Rendered usage text, printed to stderr with an optional error before it.
#[derive(Debug, Clone)]
pub struct Usage {
    text: String,
}

impl Usage {
    pub fn program(registry: &Registry) -> Self {
        let mut command = ProgramArgs::command().after_help(command_listing(registry));
        Self { text: command.render_help().to_string() }
    }

    pub fn command(descriptor: &CommandDescriptor) -> Self {
        let mut command = command_schema(descriptor);
        Self { text: command.render_help().to_string() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn show(&self, error: Option<&str>) {
        let _ = self.show_to(&mut io::stderr().lock(), error);
    }

    pub fn show_to(&self, out: &mut impl Write, error: Option<&str>) -> io::Result<()> {
        if let Some(error) = error {
            writeln!(out, "{error}")?;
        }
        writeln!(out, "{}", self.text)
    }
}

fn command_listing(registry: &Registry) -> String {
    // Pad "name:" so descriptions line up for names up to seven characters.
    const NAME_COLUMN: usize = 8;
    let lines: Vec<String> = registry
        .iter()
        .map(|command| {
            let label = format!("{}:", command.name);
            format!("  {label:<NAME_COLUMN$} {}", command.description)
        })
        .collect();
    format!("Commands:\n{}", lines.join("\n"))
}

/// Index of the first token that names a registered command.
pub fn find_command_index(tokens: &[String], registry: &Registry) -> Option<usize> {
    tokens.iter().position(|token| registry.contains(token))
}

/// Split the invocation and parse the program options.
pub fn parse_command_line(tokens: &[String], registry: &Registry) -> Result<CommandLine, UsageError> {
    let (program_tokens, mut command_name, command_args) = match find_command_index(tokens, registry) {
        Some(index) => (&tokens[..index], Some(tokens[index].clone()), tokens[index + 1..].to_vec()),
        None => (tokens, None, Vec::new()),
    };

    let parsed = ProgramArgs::try_parse_from(program_tokens)
        .map_err(|e| UsageError::InvalidOptions(e.render().to_string().trim_end().to_string()))?;

    // Garbage left over after option parsing is reported as an unknown command.
    if let Some(first) = parsed.leftover.first() {
        command_name = Some(first.clone());
    }

    let output_format: OutputFormat = parsed.output_format.parse()?;

    if let Some(name) = &command_name {
        if !registry.contains(name) {
            return Err(UsageError::UnknownCommand(name.clone()));
        }
    }

    let options = ProgramOptions {
        profile: parsed.profile,
        params: parsed.params,
        verbose: parsed.verbose || parsed.debug,
        debug: parsed.debug,
        output_format,
        version: parsed.version,
        help: parsed.help,
    };

    Ok(CommandLine { options, command_name, command_args })
}

fn command_schema(descriptor: &CommandDescriptor) -> clap::Command {
    let base = clap::Command::new(descriptor.name)
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .about(descriptor.description)
        .override_usage(format!("cumulus {} {}", descriptor.name, descriptor.usage))
        .arg(
            Arg::new("help")
                .short('h')
                .long("help")
                .action(ArgAction::SetTrue)
                .help("Display help"),
        );
    (descriptor.schema)(base)
}

/// Parse a command's own arguments against its schema plus `-h/--help`.
pub fn parse_command_arguments(
    descriptor: &CommandDescriptor,
    args: &[String],
) -> Result<CommandInvocation, UsageError> {
    let matches = command_schema(descriptor)
        .try_get_matches_from(args)
        .map_err(|e| UsageError::InvalidOptions(e.render().to_string().trim_end().to_string()))?;
    let help = matches.get_flag("help");

    Ok(CommandInvocation { name: descriptor.name.to_string(), matches, help })
}
