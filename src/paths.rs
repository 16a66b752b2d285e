//! Locations of the tool's private files.
//!
//! Nothing here is cached: every call re-reads the environment or re-stats
//! the filesystem, so calling these repeatedly is safe.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const WORK_DIR_NAME: &str = ".dailymile_cli";
const CONFIG_FILE_NAME: &str = "config";

/// Return the working directory, `~/.dailymile_cli`.
pub fn work_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory — is $HOME set?")?;
    Ok(work_dir_in(&home))
}

pub fn work_dir_in(home: &Path) -> PathBuf {
    home.join(WORK_DIR_NAME)
}

pub fn config_path(work_dir: &Path) -> PathBuf {
    work_dir.join(CONFIG_FILE_NAME)
}

/// Per-identity data directory inside the working directory.
pub fn user_dir(work_dir: &Path, user: &str) -> Result<PathBuf> {
    validate_user(user)?;
    Ok(work_dir.join(user))
}

/// A user name must name exactly one entry directly inside the working
/// directory, and not the config file.
pub fn validate_user(user: &str) -> Result<()> {
    let path_like = user.contains('/') || user.contains(std::path::MAIN_SEPARATOR);
    if user.is_empty() || path_like || user == "." || user == ".." || user == CONFIG_FILE_NAME {
        anyhow::bail!("invalid user name {:?}", user);
    }
    Ok(())
}

/// Create `path` and its parents with owner-only permissions unless it is
/// already a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => anyhow::bail!("{} exists and is not a directory", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("failed to stat {}", path.display()));
        }
    }

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    tracing::debug!(path = %path.display(), "created directory");
    Ok(())
}
