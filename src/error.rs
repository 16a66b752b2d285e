use thiserror::Error;

use crate::exit;

/// Errors that end the run before the normal exit path.
///
/// Neither variant runs registered cleanups: `main` reports the error and
/// exits with [`DmError::exit_code`] directly.
#[derive(Error, Debug)]
pub enum DmError {
    /// Malformed invocation. The message is printed verbatim to stderr.
    #[error("{0}")]
    Usage(String),

    #[error("No user set.  Either use the 'dm user <user name>' command or\nthe '-u <user name>' command line argument.")]
    NoUser,

    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

impl DmError {
    pub fn exit_code(&self) -> i32 {
        match self {
            DmError::Usage(_) => exit::USAGE,
            DmError::NoUser | DmError::Fatal(_) => exit::FAILURE,
        }
    }
}
