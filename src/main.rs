mod cli;
mod config;
mod error;
mod exit;
mod output;
mod paths;
mod store;

use cli::registry::Registry;
use error::DmError;
use exit::ExitCoordinator;

fn main() {
    init_tracing();

    let registry = Registry::builtin();
    let coordinator = ExitCoordinator::new();

    match cli::run(std::env::args_os(), &registry, &coordinator) {
        Ok(()) => coordinator.finish(),
        Err(e) => abort(e),
    }
}

/// Early exit that skips registered cleanups.
fn abort(err: DmError) -> ! {
    match &err {
        DmError::Usage(msg) => eprint!("{}", msg),
        _ => {
            tracing::debug!(error = ?err, "aborting");
            output::error(&format!("{:#}", err));
        }
    }
    std::process::exit(err.exit_code())
}

/// Log to stderr, filtered by `DM_LOG` (default: warn).
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("DM_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
