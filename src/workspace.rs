//! Workspace identifiers and the snapshot the status label is rendered from.

use std::fmt;

/// An opaque workspace name as printed by the window manager.
///
/// Equality is exact string match.  No numeric ordering is assumed: `"10"`
/// may well be listed before `"2"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkspaceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for WorkspaceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The focused workspace is not among the listed workspaces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("focused workspace {focused} is not in {all:?}")]
pub struct MalformedSnapshot {
    pub all: Vec<WorkspaceId>,
    pub focused: WorkspaceId,
}

/// All workspaces in display order plus the one that has focus.
///
/// Constructed via [`WorkspaceSnapshot::new`], which guarantees that
/// `focused` is an element of `all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSnapshot {
    all: Vec<WorkspaceId>,
    focused: WorkspaceId,
}

impl WorkspaceSnapshot {
    pub fn new(all: Vec<WorkspaceId>, focused: WorkspaceId) -> Result<Self, MalformedSnapshot> {
        if all.contains(&focused) {
            Ok(Self { all, focused })
        } else {
            Err(MalformedSnapshot { all, focused })
        }
    }

    /// Every workspace, in the order the window manager listed them.
    pub fn all_workspaces(&self) -> &[WorkspaceId] {
        &self.all
    }

    pub fn focused(&self) -> &WorkspaceId {
        &self.focused
    }
}
