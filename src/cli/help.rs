//! Usage and help text.
//!
//! Each rendered artifact is a plain function returning a `String`; printing
//! and exit codes are decided by the callers.

use std::fmt::Write;

use crate::cli::registry::{CommandDescriptor, Registry};
use crate::error::DmError;

const NAME_WIDTH: usize = 11;

/// Shown when no command is given at all.
pub fn render_short_usage() -> String {
    "dm is a command line tool for Dailymile.com\n\n  usage: dm command [args]\n".to_string()
}

/// Top-level usage: every runnable command in registry order.
pub fn render_usage(registry: &Registry) -> String {
    let mut out = String::from(
        "dm is a command line tool for DailyMile.com.\n\
         \n\
         Usage:\n\
         \n\
         \x20       dm [-u user name] command [arguments]\n\
         \n\
         The commands are:\n",
    );
    for cmd in registry.list_runnable() {
        let _ = write!(out, "\n    {:<width$} {}", cmd.name(), cmd.short, width = NAME_WIDTH);
    }
    out.push_str("\n\nUse \"dm help [topic]\" for more information about that topic.\n\n");
    out
}

/// `dm help <name>`: the usage line for runnable commands, then the long text.
pub fn render_command_help(cmd: &CommandDescriptor) -> String {
    let mut out = String::new();
    if cmd.is_runnable() {
        let _ = write!(out, "usage: dm {}\n\n", cmd.usage_line);
    }
    out.push_str(cmd.long.trim());
    out.push('\n');
    out
}

/// Printed on stderr when a command's local flags do not parse.
pub fn render_command_usage(cmd: &CommandDescriptor) -> String {
    format!("usage: dm {}\n\n{}\n", cmd.usage_line, cmd.long.trim())
}

/// Handle `dm help [topic]`.
pub fn run(registry: &Registry, args: &[String]) -> Result<(), DmError> {
    match args {
        [] => {
            print!("{}", render_usage(registry));
            Ok(())
        }
        [topic] => match registry.find_by_name(topic) {
            Some(cmd) => {
                print!("{}", render_command_help(cmd));
                Ok(())
            }
            None => Err(DmError::Usage(format!(
                "Unknown help topic `{}`.  Run 'dm help'.\n",
                topic
            ))),
        },
        _ => Err(DmError::Usage(
            "usage: dm help command\n\nToo many arguments given.\n".to_string(),
        )),
    }
}
