//! Aggregated exit status and deferred cleanup.
//!
//! Every component that can fail softly gets a reference to the
//! [`ExitCoordinator`] and raises the status instead of exiting. The process
//! terminates in exactly one place on the normal path: [`ExitCoordinator::finish`].

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use crate::output;

/// Successful termination.
pub const SUCCESS: i32 = 0;

/// A command reported a recoverable failure.
pub const FAILURE: i32 = 1;

/// Command line usage error.
pub const USAGE: i32 = 2;

type Cleanup = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

pub struct ExitCoordinator {
    status: AtomicI32,
    cleanups: Mutex<Vec<Cleanup>>,
}

impl ExitCoordinator {
    pub fn new() -> Self {
        Self {
            status: AtomicI32::new(SUCCESS),
            cleanups: Mutex::new(Vec::new()),
        }
    }

    /// Raise the tracked status to at least `code`. Never lowers it.
    pub fn raise(&self, code: i32) {
        let previous = self.status.fetch_max(code, Ordering::SeqCst);
        if code > previous {
            tracing::debug!(from = previous, to = code, "exit status raised");
        }
    }

    pub fn status(&self) -> i32 {
        self.status.load(Ordering::SeqCst)
    }

    /// Report a soft failure and keep going.
    pub fn fail(&self, err: &anyhow::Error) {
        tracing::debug!(error = ?err, "soft failure");
        output::error(&format!("{:#}", err));
        self.raise(FAILURE);
    }

    /// Register an action to run right before the process exits.
    pub fn at_exit<F>(&self, action: F)
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.lock_cleanups().push(Box::new(action));
    }

    /// Run every registered cleanup in registration order and return the
    /// final status.
    ///
    /// The list is drained, so a second call runs nothing. Cleanups registered
    /// by a running cleanup run after the current batch. A failing cleanup
    /// does not stop the ones after it; it is reported and raises the status
    /// to [`FAILURE`].
    pub fn run_cleanups(&self) -> i32 {
        loop {
            // The guard must be released before running, since an action may
            // call `at_exit`.
            let actions = std::mem::take(&mut *self.lock_cleanups());
            if actions.is_empty() {
                break;
            }
            tracing::debug!(count = actions.len(), "running cleanups");
            for action in actions {
                if let Err(e) = action() {
                    self.fail(&e.context("cleanup failed"));
                }
            }
        }
        self.status()
    }

    pub fn finish(self) -> ! {
        let code = self.run_cleanups();
        std::process::exit(code)
    }

    fn lock_cleanups(&self) -> std::sync::MutexGuard<'_, Vec<Cleanup>> {
        // A panic while holding the lock leaves the Vec itself intact.
        self.cleanups
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ExitCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
