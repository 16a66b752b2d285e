use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context as _, Result};
use clap::{Arg, ArgAction};

use crate::cli::registry::{CommandDescriptor, Context, Invocation};
use crate::exit::ExitCoordinator;
use crate::output;
use crate::store::{Entry, EntryStore, Export};

pub static COMMAND: CommandDescriptor = CommandDescriptor {
    usage_line: "sync [-r] file",
    short: "import entries from an exported stream",
    long: r#"
Sync copies the entries in file, a JSON export of a DailyMile stream,
into the current user's local entry cache. The export may be a list of
entries or an object with an "entries" list.

An entry that cannot be written is reported and the rest are still
imported; dm then exits with status 1.

The -r flag also removes cached entries that are not in the export.
"#,
    flags,
    run: Some(run),
};

fn flags() -> Vec<Arg> {
    vec![Arg::new("replace")
        .short('r')
        .action(ArgAction::SetTrue)
        .help("Remove cached entries missing from the export")]
}

fn run(ctx: &Context<'_>, cmd: &CommandDescriptor, inv: &Invocation) -> Result<()> {
    let [file] = inv.args.as_slice() else {
        anyhow::bail!("expected one export file; usage: dm {}", cmd.usage_line);
    };

    let entries = read_export(Path::new(file))?;
    if entries.is_empty() {
        output::warning(&format!("{} contains no entries", file));
    }
    let store = EntryStore::open(ctx.work_dir, &ctx.config.user)?;
    let index_store = store.clone();
    ctx.exit.at_exit(move || index_store.write_index());

    let mut imported = 0usize;
    for entry in &entries {
        match store.put(entry) {
            Ok(()) => imported += 1,
            Err(e) => ctx.exit.fail(&e),
        }
    }

    let mut removed = 0usize;
    if inv.flag("replace") {
        let keep: BTreeSet<u64> = entries.iter().map(|e| e.id).collect();
        removed = prune(&store, &keep, &store.ids()?, ctx.exit);
    }

    tracing::info!(imported, removed, user = %ctx.config.user, "sync finished");
    output::success(&format!(
        "Imported {} of {} entries for {}",
        imported,
        entries.len(),
        ctx.config.user
    ));
    if removed > 0 {
        output::info(&format!("Removed {} stale entries", removed));
    }
    Ok(())
}

/// Remove every id in `ids` that is not in `keep`. Returns how many entries
/// were actually deleted; ids that are already gone are not counted.
fn prune(
    store: &EntryStore,
    keep: &BTreeSet<u64>,
    ids: &[u64],
    exit: &ExitCoordinator,
) -> usize {
    let mut removed = 0;
    for &id in ids.iter().filter(|id| !keep.contains(*id)) {
        match store.remove(id) {
            Ok(true) => removed += 1,
            Ok(false) => tracing::debug!(id, "entry already gone"),
            Err(e) => exit.fail(&e),
        }
    }
    removed
}

fn read_export(path: &Path) -> Result<Vec<Entry>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let export: Export = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a stream export", path.display()))?;
    Ok(export.into_entries())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::exit;
    use tempfile::TempDir;

    fn invoke(ctx: &Context<'_>, args: &[&str]) -> Result<()> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let inv = COMMAND.parse_flags(&args).unwrap();
        run(ctx, &COMMAND, &inv)
    }

    #[test]
    fn imports_and_replaces() {
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

        let first = tmp.path().join("first.json");
        std::fs::write(&first, r#"[{"id": 1, "message": "a"}, {"id": 2}]"#).unwrap();
        invoke(&ctx, &[first.to_str().unwrap()]).unwrap();

        let second = tmp.path().join("second.json");
        std::fs::write(&second, r#"{"entries": [{"id": 2}, {"id": 3}]}"#).unwrap();
        invoke(&ctx, &["-r", second.to_str().unwrap()]).unwrap();

        let store = EntryStore::open(tmp.path(), "alice").unwrap();
        assert_eq!(store.ids().unwrap(), vec![2, 3]);

        assert_eq!(exit.run_cleanups(), exit::SUCCESS);
        let index = std::fs::read_to_string(store.dir().join("index.json")).unwrap();
        assert_eq!(index, "[2,3]");
    }

    #[test]
    fn prune_counts_only_entries_it_deleted() {
        let tmp = TempDir::new().unwrap();
        let exit = ExitCoordinator::new();
        let store = EntryStore::open(tmp.path(), "alice").unwrap();
        let e: Entry = serde_json::from_str(r#"{"id": 5}"#).unwrap();
        store.put(&e).unwrap();

        let keep = BTreeSet::from([1]);
        assert_eq!(prune(&store, &keep, &[1, 5, 9], &exit), 1);
        assert_eq!(prune(&store, &keep, &[5, 9], &exit), 0);
        assert!(store.ids().unwrap().is_empty());
        assert_eq!(exit.status(), exit::SUCCESS);
    }

    #[test]
    fn bad_export_is_an_error() {
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

        let bad = tmp.path().join("bad.json");
        std::fs::write(&bad, r#"{"id": 1}"#).unwrap();
        assert!(invoke(&ctx, &[bad.to_str().unwrap()]).is_err());
        assert!(invoke(&ctx, &[]).is_err());
    }
}
