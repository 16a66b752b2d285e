pub mod find;
pub mod help;
pub mod registry;
pub mod rm;
pub mod sync;
pub mod user;

use std::ffi::OsString;
use std::path::Path;

use clap::Parser;

use crate::config::{self, Config};
use crate::error::DmError;
use crate::exit::{self, ExitCoordinator};
use crate::paths;
use registry::{Context, Registry};

/// Global options. Everything from the first non-flag token on is left in
/// `args` for dispatch.
#[derive(Parser, Debug)]
#[command(
    name = "dm",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Act as this user for this run only
    #[arg(short = 'u', value_name = "user name")]
    pub user: Option<String>,

    #[arg(trailing_var_arg = true)]
    pub args: Vec<String>,
}

/// Route one process invocation.
///
/// `Ok` means the caller should finish normally through the
/// [`ExitCoordinator`]; `Err` is an early abort that skips cleanups.
pub fn run<I, T>(argv: I, registry: &Registry, exit: &ExitCoordinator) -> Result<(), DmError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(argv).map_err(|e| {
        let reason = e.to_string();
        let reason = reason.lines().next().unwrap_or_default();
        DmError::Usage(format!("{}\n{}", reason, help::render_short_usage()))
    })?;

    let Some((name, rest)) = cli.args.split_first() else {
        return Err(DmError::Usage(help::render_short_usage()));
    };

    if name == "help" {
        return help::run(registry, rest);
    }

    let work_dir = paths::work_dir()?;
    let config = bootstrap(&work_dir, cli.user)?;
    tracing::debug!(user = %config.user, "effective configuration");

    let ctx = Context {
        config: &config,
        work_dir: &work_dir,
        exit,
    };
    dispatch(registry, &ctx, name, rest)
}

/// Make sure the working directory and config exist, then apply the `-u`
/// override. The override is never written back.
pub fn bootstrap(work_dir: &Path, user: Option<String>) -> Result<Config, DmError> {
    paths::ensure_dir(work_dir)?;
    let config = config::load_or_seed(&paths::config_path(work_dir))?.with_override(user);
    if !config.has_user() {
        return Err(DmError::NoUser);
    }
    paths::validate_user(&config.user)?;
    Ok(config)
}

/// Run the command called `name` with the arguments that follow it.
pub fn dispatch(
    registry: &Registry,
    ctx: &Context<'_>,
    name: &str,
    args: &[String],
) -> Result<(), DmError> {
    let Some((cmd, run)) = registry.find_runnable(name) else {
        eprintln!("dm: unknown subcommand {:?}", name);
        ctx.exit.raise(exit::USAGE);
        return Ok(());
    };

    let invocation = cmd.parse_flags(args).map_err(|e| {
        tracing::debug!(command = cmd.name(), error = %e, "local flags rejected");
        DmError::Usage(help::render_command_usage(cmd))
    })?;

    tracing::info!(command = cmd.name(), args = ?invocation.args, "dispatching");
    if let Err(e) = run(ctx, cmd, &invocation) {
        ctx.exit.fail(&e);
    }
    Ok(())
}
