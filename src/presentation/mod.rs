//! Turning workspace state into the text shown in the status bar.
//!
//! A label is one glyph per workspace, in the order the window manager
//! lists them, wrapped in brackets: `[○●○]` means three workspaces with the
//! second one focused.
//!
//! Concrete [`PresentationSink`](crate::traits::PresentationSink)s live in
//! submodules.

pub mod stdout;

use crate::config::LabelConfig;
use crate::workspace::WorkspaceSnapshot;

/// Which error indicator to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisplayKind {
    /// No `aerospace` binary was found at any candidate path.
    ToolNotFound,
    /// Any other failure: non-zero exit, missing or malformed output.
    Generic,
}

/// Render `snapshot` with the configured glyphs.
pub fn render_label(snapshot: &WorkspaceSnapshot, labels: &LabelConfig) -> String {
    let glyphs: String = snapshot
        .all_workspaces()
        .iter()
        .map(|w| {
            if w == snapshot.focused() {
                labels.focused.as_str()
            } else {
                labels.unfocused.as_str()
            }
        })
        .collect();
    format!("[{}]", glyphs)
}

/// The fixed string shown for an error indicator.
pub fn error_label(kind: ErrorDisplayKind, labels: &LabelConfig) -> &str {
    match kind {
        ErrorDisplayKind::ToolNotFound => &labels.not_found,
        ErrorDisplayKind::Generic => &labels.error,
    }
}
