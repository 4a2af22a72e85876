//! Traversal progress reported to observers.

use serde::Serialize;

/// Progress of the current resolution session.
///
/// `current` counts terminal transitions since the session started; `total`
/// is `current` plus everything still queued or running. Both return to zero
/// when the session goes idle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    /// Depth of the most recently started fetch.
    pub level: usize,
    /// Name of the most recently started fetch.
    pub current_package: Option<String>,
}

impl Progress {
    /// Returns true when no session is running.
    pub fn is_idle(&self) -> bool {
        self.total == 0
    }
}
