//! Filesystem changes reported by the watch backend.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One changed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl Change {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Split a notify event into one change per path.
    pub fn from_event(event: notify::Event) -> impl Iterator<Item = Self> {
        let kind = ChangeKind::from(event.kind);
        event.paths.into_iter().map(move |path| Self::new(kind, path))
    }
}

/// Kind of change. Only [`ChangeKind::Added`] leads to a dispatch, once the
/// file has stopped changing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A path appeared, either created or moved in.
    Added,

    /// Content or metadata changed.
    Modified,

    /// A path disappeared, either removed or moved out.
    Deleted,

    /// Access or unknown event.
    Other,
}

impl From<notify::EventKind> for ChangeKind {
    fn from(kind: notify::EventKind) -> Self {
        use notify::event::{ModifyKind, RenameMode};

        match kind {
            notify::EventKind::Create(_) => Self::Added,
            notify::EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Self::Deleted,
            // Backends that cannot tell both ends of a rename apart report
            // `Any`; the collector checks the path still exists.
            notify::EventKind::Modify(ModifyKind::Name(_)) => Self::Added,
            notify::EventKind::Modify(_) => Self::Modified,
            notify::EventKind::Remove(_) => Self::Deleted,
            _ => Self::Other,
        }
    }
}
