//! Command registry: an ordered table of command descriptors.

use anyhow::Result;
use clap::{ArgMatches, Args, FromArgMatches};

use super::context::RunContext;
use super::{params, state, status};

/// A constructed command, ready to run against the run context.
pub trait Execute {
    fn execute(&self, ctx: &RunContext) -> Result<()>;
}

pub struct CommandDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    /// Command runs without cloud credentials or state verification.
    pub skip_aws: bool,
    /// Adds the command's options to a base clap command.
    pub schema: fn(clap::Command) -> clap::Command,
    /// Builds the command from its parsed options.
    pub build: fn(&ArgMatches) -> Result<Box<dyn Execute>, clap::Error>,
}

impl CommandDescriptor {
    pub fn of<A>(name: &'static str, description: &'static str, usage: &'static str, skip_aws: bool) -> Self
    where
        A: Args + FromArgMatches + Execute + 'static,
    {
        Self { name, description, usage, skip_aws, schema: A::augment_args, build: build_command::<A> }
    }
}

fn build_command<A>(matches: &ArgMatches) -> Result<Box<dyn Execute>, clap::Error>
where
    A: FromArgMatches + Execute + 'static,
{
    Ok(Box::new(A::from_arg_matches(matches)?))
}

pub struct Registry {
    commands: Vec<CommandDescriptor>,
}

impl Registry {
    pub fn new(commands: Vec<CommandDescriptor>) -> Self {
        Self { commands }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            CommandDescriptor::of::<params::ParamsArgs>(
                "params",
                "Print the merged params document",
                "[--path=DOTTED.PATH]",
                true,
            ),
            CommandDescriptor::of::<state::StateArgs>(
                "state",
                "Print the recorded state bucket",
                "",
                true,
            ),
            CommandDescriptor::of::<status::StatusArgs>(
                "status",
                "Check the state bucket against the cloud",
                "",
                false,
            ),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.iter().find(|command| command.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.iter()
    }
}
