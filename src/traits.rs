//! Core traits that decouple the refresh coordinator from subprocesses,
//! the display, and the transports that deliver trigger events.
//!
//! Every concrete backend (the `aerospace` CLI, a stdout status line, a
//! Unix-socket listener, a test harness, …) implements one of these traits.
//! The [`Coordinator`](crate::coordinator::Coordinator) only depends on
//! these abstractions.

use crate::aerospace::AerospaceError;
use crate::cancel::CancelToken;
use crate::coordinator::Event;
use crate::presentation::ErrorDisplayKind;
use crate::runner::CommandError;
use crate::workspace::WorkspaceSnapshot;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

/// Runs an external program to completion within a deadline.
///
/// Implemented by [`CommandRunner`](crate::runner::CommandRunner); tests
/// substitute a scripted runner.
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args` and return its trimmed, non-empty stdout
    /// lines.
    fn run(
        &self,
        program: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Vec<String>, CommandError>;
}

/// Something that can produce a [`WorkspaceSnapshot`].
///
/// Fetches run on worker threads, so implementations must be
/// `Send + Sync`.  A fetch must check `token` at its checkpoints and
/// return [`AerospaceError::Cancelled`] once it is set.
pub trait WorkspaceSource: Send + Sync {
    fn fetch_snapshot(&self, token: &CancelToken) -> Result<WorkspaceSnapshot, AerospaceError>;
}

/// The display the coordinator pushes its results to.
///
/// Only ever called from the coordinator's thread.
pub trait PresentationSink {
    /// Show a rendered workspace label such as `[○●○]`.
    fn render(&mut self, label: &str);

    /// Show an error indicator instead of a label.
    fn render_error(&mut self, kind: ErrorDisplayKind);
}

/// A source of refresh triggers and user commands.
///
/// Implementations listen on some transport (a Unix socket, a timer, …) and
/// forward what they receive into the coordinator's queue.
///
/// # Contract
///
/// * [`run`](TriggerSource::run) **blocks** until the source is exhausted,
///   the queue is closed, or an unrecoverable error occurs.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait TriggerSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming event into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, TriggerReason};

    #[derive(Debug, thiserror::Error)]
    #[error("mock error")]
    struct MockError;

    /// A test double that emits a fixed sequence of commands.
    struct MockSource {
        commands: Vec<Command>,
    }

    impl TriggerSource for MockSource {
        type Error = MockError;

        fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), MockError> {
            for cmd in self.commands.drain(..) {
                let _ = sink.send(Event::Command(cmd));
            }
            Ok(())
        }
    }

    #[test]
    fn mock_source_emits_commands() {
        let mut src = MockSource {
            commands: vec![Command::Trigger(TriggerReason::AppSwitch), Command::Quit],
        };
        let (tx, rx) = mpsc::channel();
        src.run(tx).unwrap();
        let events: Vec<Event> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            Event::Command(Command::Trigger(TriggerReason::AppSwitch))
        ));
        assert!(matches!(events[1], Event::Command(Command::Quit)));
    }

    /// A sink that records what it was asked to show.
    #[derive(Default)]
    struct RecordingSink {
        shown: Vec<String>,
    }

    impl PresentationSink for RecordingSink {
        fn render(&mut self, label: &str) {
            self.shown.push(label.to_string());
        }

        fn render_error(&mut self, kind: ErrorDisplayKind) {
            self.shown.push(format!("{:?}", kind));
        }
    }

    #[test]
    fn sink_is_object_safe() {
        let mut sink = RecordingSink::default();
        {
            let dyn_sink: &mut dyn PresentationSink = &mut sink;
            dyn_sink.render("[●]");
            dyn_sink.render_error(ErrorDisplayKind::ToolNotFound);
        }
        assert_eq!(sink.shown, vec!["[●]", "ToolNotFound"]);
    }
}
