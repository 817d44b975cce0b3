//! [`PresentationSink`] that prints one label per line.
//!
//! This is the format text status bars consume from a long-running script
//! (sketchybar, SwiftBar streaming plugins, i3bar/waybar custom modules):
//! every line replaces the previously shown one.

use super::{error_label, ErrorDisplayKind};
use crate::config::LabelConfig;
use crate::traits::PresentationSink;
use log::warn;
use std::io::Write;

/// Writes each rendered label as a line to `out` and flushes immediately.
pub struct LineSink<W: Write> {
    out: W,
    labels: LabelConfig,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W, labels: LabelConfig) -> Self {
        Self { out, labels }
    }

    /// Print the configured loading text.  Called once at startup, before
    /// the first fetch completes.
    pub fn show_loading(&mut self) {
        let loading = self.labels.loading.clone();
        self.write_line(&loading);
    }

    /// Consume the sink and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            warn!("failed to write label: {}", e);
        }
    }
}

impl<W: Write> PresentationSink for LineSink<W> {
    fn render(&mut self, label: &str) {
        self.write_line(label);
    }

    fn render_error(&mut self, kind: ErrorDisplayKind) {
        let text = error_label(kind, &self.labels).to_string();
        self.write_line(&text);
    }
}
