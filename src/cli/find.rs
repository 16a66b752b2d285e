use anyhow::{Context as _, Result};
use clap::{Arg, ArgAction};
use regex::Regex;

use crate::cli::registry::{CommandDescriptor, Context, Invocation};
use crate::store::{Entry, EntryStore};

pub static COMMAND: CommandDescriptor = CommandDescriptor {
    usage_line: "find [-l] [pattern]",
    short: "search cached entries",
    long: r#"
Find prints the id and message of every cached entry of the current
user whose message matches the regular expression pattern. Without a
pattern every entry is printed.

The -l flag prints each matching entry in full, as JSON.
"#,
    flags,
    run: Some(run),
};

fn flags() -> Vec<Arg> {
    vec![Arg::new("long")
        .short('l')
        .action(ArgAction::SetTrue)
        .help("Print matching entries as JSON")]
}

fn run(ctx: &Context<'_>, cmd: &CommandDescriptor, inv: &Invocation) -> Result<()> {
    let pattern = match inv.args.as_slice() {
        [] => None,
        [p] => Some(Regex::new(p).with_context(|| format!("invalid pattern {:?}", p))?),
        _ => anyhow::bail!("too many arguments; usage: dm {}", cmd.usage_line),
    };

    let store = EntryStore::open(ctx.work_dir, &ctx.config.user)?;
    let matches = matching(store.list()?, pattern.as_ref());
    tracing::debug!(count = matches.len(), "find matched entries");

    for entry in &matches {
        if inv.flag("long") {
            println!("{}", serde_json::to_string_pretty(entry)?);
        } else {
            println!("{}\t{}", entry.id, entry.message.as_deref().unwrap_or(""));
        }
    }
    Ok(())
}

fn matching(entries: Vec<Entry>, pattern: Option<&Regex>) -> Vec<Entry> {
    let Some(re) = pattern else {
        return entries;
    };
    entries
        .into_iter()
        .filter(|e| e.message.as_deref().is_some_and(|m| re.is_match(m)))
        .collect()
}
