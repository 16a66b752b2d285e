pub mod schema;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

pub use schema::Config;

/// Read the config file at `path`.
///
/// Returns `Ok(None)` when the file does not exist so the caller can seed a
/// default; every other read or parse failure is an error.
pub fn load(path: &Path) -> Result<Option<Config>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    let config: Config = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(config))
}

/// Write `config` to `path` with owner-only permissions.
///
/// The file is truncated and rewritten in place, not replaced atomically: a
/// crash mid-write can leave it corrupt, and the next start will then refuse
/// to load it.
pub fn save(path: &Path, config: &Config) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"   ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    config
        .serialize(&mut ser)
        .context("failed to serialize config")?;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(&buf)
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::debug!(path = %path.display(), "saved config");
    Ok(())
}

/// Startup policy: load the config, or persist and return the default when
/// there is none yet.
pub fn load_or_seed(path: &Path) -> Result<Config> {
    if let Some(config) = load(path)? {
        return Ok(config);
    }
    tracing::info!(path = %path.display(), "no config found, writing default");
    let config = Config::default();
    save(path, &config)?;
    Ok(config)
}
