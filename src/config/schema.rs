use serde::{Deserialize, Serialize};

/// Persisted settings, stored at `~/.dailymile_cli/config`.
///
/// The field is serialized as `User` so files written by earlier releases keep
/// loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "User", default)]
    pub user: String,
}

impl Config {
    /// Apply the `-u` override for this run. An empty override is ignored.
    pub fn with_override(mut self, user: Option<String>) -> Self {
        if let Some(user) = user.filter(|u| !u.is_empty()) {
            self.user = user;
        }
        self
    }

    pub fn has_user(&self) -> bool {
        !self.user.is_empty()
    }
}
