//! Static command descriptors and lookup.

use std::path::Path;

use anyhow::Result;
use clap::{Arg, ArgMatches};

use crate::cli::{find, rm, sync, user};
use crate::config::Config;
use crate::exit::ExitCoordinator;

/// Name of the positional that collects everything after the local flags.
const REST: &str = "args";

/// Everything an entry point may touch besides its own arguments.
pub struct Context<'a> {
    /// Effective configuration for this run (after `-u`).
    pub config: &'a Config,
    pub work_dir: &'a Path,
    pub exit: &'a ExitCoordinator,
}

/// Local flags and remaining arguments of one invocation.
pub struct Invocation {
    pub flags: ArgMatches,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn flag(&self, id: &str) -> bool {
        self.flags.get_flag(id)
    }
}

pub type RunFn = fn(&Context<'_>, &CommandDescriptor, &Invocation) -> Result<()>;

/// Immutable metadata for one subcommand.
pub struct CommandDescriptor {
    /// `name [flags] [args]`; the name is the text before the first space.
    pub usage_line: &'static str,
    /// One line, shown in `dm help`.
    pub short: &'static str,
    /// Shown in `dm help <name>`.
    pub long: &'static str,
    pub flags: fn() -> Vec<Arg>,
    /// `None` for help-only topics.
    pub run: Option<RunFn>,
}

impl CommandDescriptor {
    pub fn name(&self) -> &'static str {
        match self.usage_line.find(' ') {
            Some(i) => &self.usage_line[..i],
            None => self.usage_line,
        }
    }

    pub fn is_runnable(&self) -> bool {
        self.run.is_some()
    }

    /// Parse the arguments following the command name.
    ///
    /// Flags are only recognized before the first positional argument;
    /// everything from there on is returned untouched in
    /// [`Invocation::args`].
    pub fn parse_flags(&self, args: &[String]) -> Result<Invocation, clap::Error> {
        let mut matches = clap::Command::new(self.name())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .args((self.flags)())
            .arg(Arg::new(REST).num_args(0..).trailing_var_arg(true))
            .try_get_matches_from(args)?;

        let rest = matches
            .remove_many::<String>(REST)
            .map(|values| values.collect())
            .unwrap_or_default();
        Ok(Invocation {
            flags: matches,
            args: rest,
        })
    }
}

/// For commands without local flags.
pub fn no_flags() -> Vec<Arg> {
    Vec::new()
}

/// Ordered set of commands. Order only affects help listing.
pub struct Registry {
    commands: Vec<&'static CommandDescriptor>,
}

impl Registry {
    pub fn new(commands: Vec<&'static CommandDescriptor>) -> Self {
        debug_assert!(
            {
                let mut names: Vec<_> = commands.iter().map(|c| c.name()).collect();
                names.sort_unstable();
                names.windows(2).all(|w| w[0] != w[1])
            },
            "command names must be unique"
        );
        Self { commands }
    }

    pub fn builtin() -> Self {
        Self::new(vec![&user::COMMAND, &sync::COMMAND, &find::COMMAND, &rm::COMMAND])
    }

    /// Exact, case-sensitive lookup over every descriptor, runnable or not.
    pub fn find_by_name(&self, name: &str) -> Option<&'static CommandDescriptor> {
        self.commands.iter().copied().find(|c| c.name() == name)
    }

    /// Lookup used for dispatch: help-only topics never match.
    pub fn find_runnable(&self, name: &str) -> Option<(&'static CommandDescriptor, RunFn)> {
        self.commands
            .iter()
            .copied()
            .filter(|c| c.name() == name)
            .find_map(|c| c.run.map(|run| (c, run)))
    }

    pub fn list_runnable(&self) -> impl Iterator<Item = &'static CommandDescriptor> + '_ {
        self.commands.iter().copied().filter(|c| c.is_runnable())
    }
}
