use anyhow::Result;

use crate::cli::registry::{no_flags, CommandDescriptor, Context, Invocation};
use crate::config::{self, Config};
use crate::output;
use crate::paths;
use crate::store::EntryStore;

pub static COMMAND: CommandDescriptor = CommandDescriptor {
    usage_line: "user [user name]",
    short: "show or set the default user",
    long: r#"
User prints the user this run acts as.

Given a user name, it saves that name as the default user in
~/.dailymile_cli/config and creates the user's entry cache. The
'-u' flag only changes the user for a single run; 'user' makes the
change permanent.

Before any user is configured, combine the two:

        dm -u <user name> user <user name>
"#,
    flags: no_flags,
    run: Some(run),
};

fn run(ctx: &Context<'_>, cmd: &CommandDescriptor, inv: &Invocation) -> Result<()> {
    match inv.args.as_slice() {
        [] => {
            println!("{}", ctx.config.user);
            Ok(())
        }
        [name] => set_user(ctx, name),
        _ => anyhow::bail!("too many arguments; usage: dm {}", cmd.usage_line),
    }
}

fn set_user(ctx: &Context<'_>, name: &str) -> Result<()> {
    paths::validate_user(name)?;

    let store = EntryStore::open(ctx.work_dir, name)?;
    tracing::debug!(dir = %store.dir().display(), "entry cache ready");
    let updated = Config {
        user: name.to_string(),
    };
    config::save(&paths::config_path(ctx.work_dir), &updated)?;
    output::success(&format!("Default user set to {}", name));
    Ok(())
}
