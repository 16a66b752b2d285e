use anyhow::Result;
use clap::{Arg, ArgAction};

use crate::cli::registry::{CommandDescriptor, Context, Invocation};
use crate::exit;
use crate::output;
use crate::store::EntryStore;

pub static COMMAND: CommandDescriptor = CommandDescriptor {
    usage_line: "rm [-n] id...",
    short: "remove entries from the cache",
    long: r#"
Rm removes the entries with the given ids from the current user's
local entry cache.

Every id is attempted. Ids that are not numbers or not cached are
reported, and dm exits with status 1 once the others are removed.

The -n flag prints what would be removed without removing anything.
"#,
    flags,
    run: Some(run),
};

fn flags() -> Vec<Arg> {
    vec![Arg::new("dry-run")
        .short('n')
        .action(ArgAction::SetTrue)
        .help("Only print what would be removed")]
}

fn run(ctx: &Context<'_>, cmd: &CommandDescriptor, inv: &Invocation) -> Result<()> {
    if inv.args.is_empty() {
        eprintln!("usage: dm {}", cmd.usage_line);
        ctx.exit.raise(exit::USAGE);
        return Ok(());
    }

    let store = EntryStore::open(ctx.work_dir, &ctx.config.user)?;
    let dry_run = inv.flag("dry-run");
    if !dry_run {
        let index_store = store.clone();
        ctx.exit.at_exit(move || index_store.write_index());
    }

    for arg in &inv.args {
        let Ok(id) = arg.parse::<u64>() else {
            ctx.exit.fail(&anyhow::anyhow!("{:?} is not an entry id", arg));
            continue;
        };

        if dry_run {
            match store.get(id) {
                Ok(Some(_)) => output::info(&format!("would remove entry {}", id)),
                Ok(None) => ctx.exit.fail(&anyhow::anyhow!("no cached entry {}", id)),
                Err(e) => ctx.exit.fail(&e),
            }
            continue;
        }

        match store.remove(id) {
            Ok(true) => output::success(&format!("Removed entry {}", id)),
            Ok(false) => ctx.exit.fail(&anyhow::anyhow!("no cached entry {}", id)),
            Err(e) => ctx.exit.fail(&e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::exit::ExitCoordinator;
    use crate::store::Entry;
    use tempfile::TempDir;

    fn invoke(ctx: &Context<'_>, args: &[&str]) -> Result<()> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let inv = COMMAND.parse_flags(&args).unwrap();
        run(ctx, &COMMAND, &inv)
    }

    fn seed(work_dir: &std::path::Path, ids: &[u64]) -> EntryStore {
        let store = EntryStore::open(work_dir, "alice").unwrap();
        for id in ids {
            let entry: Entry = serde_json::from_value(serde_json::json!({ "id": id })).unwrap();
            store.put(&entry).unwrap();
        }
        store
    }

    #[test]
    fn bad_ids_do_not_stop_the_rest() {
        let tmp = TempDir::new().unwrap();
        let store = seed(tmp.path(), &[1, 2, 3]);
        let exit = ExitCoordinator::new();
        let config = Config {
            user: "alice".into(),
        };
        let ctx = Context {
            config: &config,
            work_dir: tmp.path(),
            exit: &exit,
        };

        invoke(&ctx, &["1", "nope", "9", "3"]).unwrap();

        assert_eq!(store.ids().unwrap(), vec![2]);
        assert_eq!(exit.status(), exit::FAILURE);
        assert_eq!(exit.run_cleanups(), exit::FAILURE);
        assert_eq!(
            std::fs::read_to_string(store.dir().join("index.json")).unwrap(),
            "[2]"
        );
    }

    #[test]
    fn dry_run_keeps_entries() {
        let tmp = TempDir::new().unwrap();
        let store = seed(tmp.path(), &[5]);
        let exit = ExitCoordinator::new();
        let config = Config {
            user: "alice".into(),
        };
        let ctx = Context {
            config: &config,
            work_dir: tmp.path(),
            exit: &exit,
        };

        invoke(&ctx, &["-n", "5"]).unwrap();
        assert_eq!(store.ids().unwrap(), vec![5]);
        assert_eq!(exit.run_cleanups(), exit::SUCCESS);
        assert!(!store.dir().join("index.json").exists());
    }

    #[test]
    fn no_ids_is_a_usage_status() {
        let tmp = TempDir::new().unwrap();
        let exit = ExitCoordinator::new();
        let config = Config {
            user: "alice".into(),
        };
        let ctx = Context {
            config: &config,
            work_dir: tmp.path(),
            exit: &exit,
        };

        invoke(&ctx, &[]).unwrap();
        assert_eq!(exit.status(), exit::USAGE);
    }
}
