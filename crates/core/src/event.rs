//! Raw filesystem change events

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of change reported for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    /// Path was created
    Create,
    /// Path was removed
    Remove,
    /// File contents changed
    Modify,
    /// Path was renamed (either side of the move)
    Rename,
    /// Permissions or other metadata changed
    Chmod,
}

impl Op {
    /// Lowercase name used in logs and JSON output
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Create => "create",
            Op::Remove => "remove",
            Op::Modify => "modify",
            Op::Rename => "rename",
            Op::Chmod => "chmod",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Create => write!(f, "CREATE"),
            Op::Remove => write!(f, "REMOVE"),
            Op::Modify => write!(f, "MODIFY"),
            Op::Rename => write!(f, "RENAME"),
            Op::Chmod => write!(f, "CHMOD"),
        }
    }
}

/// A single change reported by the event source
///
/// Paths are absolute as delivered by the platform primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub op: Op,
    pub path: PathBuf,
}

impl RawEvent {
    pub fn new(op: Op, path: impl Into<PathBuf>) -> Self {
        Self {
            op,
            path: path.into(),
        }
    }

    /// Whether the event path has the given extension
    pub fn has_extension(&self, ext: &str) -> bool {
        extension_matches(&self.path, ext)
    }
}

impl fmt::Display for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.path.display())
    }
}

/// Compare a path's extension against `ext`
///
/// Accepts `"md"` and `".md"` alike; comparison ignores ASCII case so
/// `logo.PNG` matches `png`.
pub(crate) fn extension_matches(path: &Path, ext: &str) -> bool {
    let wanted = ext.strip_prefix('.').unwrap_or(ext);
    if wanted.is_empty() {
        return false;
    }

    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_matching() {
        let event = RawEvent::new(Op::Create, "/tmp/site/img/logo.PNG");

        assert!(event.has_extension("png"));
        assert!(event.has_extension(".png"));
        assert!(!event.has_extension("jpg"));
        assert!(!event.has_extension(""));
        assert!(!event.has_extension("."));
    }

    #[test]
    fn test_no_extension() {
        let event = RawEvent::new(Op::Modify, "/tmp/site/Makefile");
        assert!(!event.has_extension("Makefile"));

        let dotfile = RawEvent::new(Op::Modify, "/tmp/site/.env");
        assert!(!dotfile.has_extension("env"));
    }

    #[test]
    fn test_display() {
        let event = RawEvent::new(Op::Remove, "/tmp/a");
        assert_eq!(event.to_string(), "REMOVE /tmp/a");
        assert_eq!(Op::Chmod.as_str(), "chmod");
    }

    #[test]
    fn test_serde_uses_snake_case_ops() {
        let event = RawEvent::new(Op::Rename, "/tmp/a");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"op\":\"rename\""));
    }
}
