//! [`WorkspaceSource`] implementation backed by the `aerospace` CLI.
//!
//! A snapshot takes two queries:
//!
//! | Query                              | Output                         |
//! |------------------------------------|--------------------------------|
//! | `aerospace list-workspaces --all`  | one workspace name per line    |
//! | `aerospace list-workspaces --focused` | the focused workspace name  |
//!
//! The binary is looked up once, at construction, in a fixed list of
//! candidate paths.  `$PATH` is never searched.

use crate::cancel::CancelToken;
use crate::config::AerospaceConfig;
use crate::runner::{CommandError, CommandRunner};
use crate::traits::{ProcessRunner, WorkspaceSource};
use crate::workspace::{WorkspaceId, WorkspaceSnapshot};
use log::{debug, info, warn};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const LIST_ALL: &[&str] = &["list-workspaces", "--all"];
const LIST_FOCUSED: &[&str] = &["list-workspaces", "--focused"];

/// Errors that can occur while fetching a workspace snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AerospaceError {
    /// No candidate path holds an executable `aerospace` binary.
    #[error("aerospace binary not found")]
    BinaryNotFound,
    /// The subprocess could not be run or exited non-zero.
    #[error("aerospace command failed: {0}")]
    CommandFailed(String),
    /// The workspace list was empty.
    #[error("aerospace printed no workspaces")]
    NoOutput,
    /// The output did not describe a consistent snapshot.
    #[error("could not parse aerospace output")]
    ParseError,
    /// A query exceeded its time bound.
    #[error("aerospace query timed out")]
    Timeout,
    /// A newer fetch superseded this one.
    #[error("fetch cancelled")]
    Cancelled,
}

impl From<CommandError> for AerospaceError {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::Timeout(_) => AerospaceError::Timeout,
            CommandError::Spawn(msg) | CommandError::Failed(msg) => {
                AerospaceError::CommandFailed(msg)
            }
        }
    }
}

/// AeroSpace-backed workspace source.
///
/// Generic over the [`ProcessRunner`] so tests can script the CLI's
/// answers.  The resolved binary path is immutable after construction and
/// can be shared with worker threads freely.
pub struct AerospaceClient<R: ProcessRunner = CommandRunner> {
    binary: Option<PathBuf>,
    runner: R,
    timeout: Duration,
}

impl AerospaceClient<CommandRunner> {
    /// Resolve the binary from `config.candidate_paths` and build a client
    /// that runs it with `config.search_path` as its only environment.
    pub fn new(config: &AerospaceConfig) -> Self {
        Self::with_runner(config, CommandRunner::new(config.search_path.clone()))
    }
}

impl<R: ProcessRunner> AerospaceClient<R> {
    pub fn with_runner(config: &AerospaceConfig, runner: R) -> Self {
        let binary = resolve_binary(&config.candidate_paths);
        match &binary {
            Some(path) => info!("found aerospace at {}", path.display()),
            None => warn!("aerospace not found in {:?}", config.candidate_paths),
        }
        Self {
            binary,
            runner,
            timeout: config.timeout(),
        }
    }

    /// The resolved binary, if any.
    pub fn binary(&self) -> Option<&Path> {
        self.binary.as_deref()
    }

    fn query(&self, binary: &Path, args: &[&str]) -> Result<Vec<String>, AerospaceError> {
        Ok(self.runner.run(binary, args, self.timeout)?)
    }
}

/// Bail out with [`AerospaceError::Cancelled`] once `token` is set.
fn checkpoint(token: &CancelToken) -> Result<(), AerospaceError> {
    if token.is_cancelled() {
        Err(AerospaceError::Cancelled)
    } else {
        Ok(())
    }
}

impl<R: ProcessRunner> WorkspaceSource for AerospaceClient<R> {
    fn fetch_snapshot(&self, token: &CancelToken) -> Result<WorkspaceSnapshot, AerospaceError> {
        let binary = self.binary.as_deref().ok_or(AerospaceError::BinaryNotFound)?;

        checkpoint(token)?;
        let all = self.query(binary, LIST_ALL)?;

        checkpoint(token)?;
        if all.is_empty() {
            return Err(AerospaceError::NoOutput);
        }
        let focused = self.query(binary, LIST_FOCUSED)?;

        checkpoint(token)?;
        // More than one focused line is tolerated; the first one wins.
        let focused = focused.into_iter().next().ok_or(AerospaceError::ParseError)?;

        let all = all.into_iter().map(WorkspaceId::from).collect();
        WorkspaceSnapshot::new(all, focused.into()).map_err(|e| {
            debug!("{}", e);
            AerospaceError::ParseError
        })
    }
}

/// Return the first candidate that is a regular file with an executable
/// bit set.
pub fn resolve_binary(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| is_executable(p)).cloned()
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Monotonic counter to generate unique temp paths per test.
    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_path(name: &str) -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("aerobar-test-{}-{}-{}", std::process::id(), id, name))
    }

    /// A runner that answers from a script and records every call.
    #[derive(Default)]
    struct ScriptedRunner {
        answers: Mutex<VecDeque<Result<Vec<String>, CommandError>>>,
        calls: Mutex<Vec<Vec<String>>>,
        /// Cancelled right after the first call returns, to simulate a
        /// newer fetch arriving mid-way.
        cancel_after_first: Option<CancelToken>,
    }

    impl ScriptedRunner {
        fn new(answers: Vec<Result<Vec<&str>, CommandError>>) -> Self {
            Self {
                answers: Mutex::new(
                    answers
                        .into_iter()
                        .map(|a| a.map(|lines| lines.into_iter().map(String::from).collect()))
                        .collect(),
                ),
                ..Self::default()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl ProcessRunner for ScriptedRunner {
        fn run(
            &self,
            _program: &Path,
            args: &[&str],
            _timeout: Duration,
        ) -> Result<Vec<String>, CommandError> {
            self.calls
                .lock()
                .unwrap()
                .push(args.iter().map(|a| a.to_string()).collect());
            if let Some(token) = &self.cancel_after_first {
                token.cancel();
            }
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CommandError::Failed("script exhausted".into())))
        }
    }

    /// A config whose only candidate is `/bin/sh`, which exists and is
    /// executable everywhere the tests run.
    fn config_with_binary() -> AerospaceConfig {
        AerospaceConfig {
            candidate_paths: vec![PathBuf::from("/bin/sh")],
            ..AerospaceConfig::default()
        }
    }

    fn client(answers: Vec<Result<Vec<&str>, CommandError>>) -> AerospaceClient<ScriptedRunner> {
        AerospaceClient::with_runner(&config_with_binary(), ScriptedRunner::new(answers))
    }

    #[test]
    fn builds_snapshot_from_both_queries() {
        let c = client(vec![Ok(vec!["1", "2", "3"]), Ok(vec!["2"])]);
        let s = c.fetch_snapshot(&CancelToken::new()).unwrap();
        assert_eq!(s.focused().as_str(), "2");
        assert_eq!(s.all_workspaces().len(), 3);
        let calls = c.runner.calls.lock().unwrap();
        assert_eq!(calls[0], vec!["list-workspaces", "--all"]);
        assert_eq!(calls[1], vec!["list-workspaces", "--focused"]);
    }

    #[test]
    fn empty_focused_output_is_parse_error() {
        let c = client(vec![Ok(vec!["a", "b"]), Ok(vec![])]);
        assert_eq!(
            c.fetch_snapshot(&CancelToken::new()),
            Err(AerospaceError::ParseError)
        );
    }

    #[test]
    fn multiple_focused_lines_use_the_first() {
        let c = client(vec![Ok(vec!["a", "b"]), Ok(vec!["b", "a"])]);
        let s = c.fetch_snapshot(&CancelToken::new()).unwrap();
        assert_eq!(s.focused().as_str(), "b");
    }

    #[test]
    fn focused_not_listed_is_parse_error() {
        let c = client(vec![Ok(vec!["a", "b"]), Ok(vec!["z"])]);
        assert_eq!(
            c.fetch_snapshot(&CancelToken::new()),
            Err(AerospaceError::ParseError)
        );
    }

    #[test]
    fn empty_workspace_list_is_no_output() {
        let c = client(vec![Ok(vec![]), Ok(vec!["a"])]);
        assert_eq!(c.fetch_snapshot(&CancelToken::new()), Err(AerospaceError::NoOutput));
    }

    #[test]
    fn runner_errors_are_retagged() {
        let c = client(vec![Err(CommandError::Timeout(Duration::from_secs(2)))]);
        assert_eq!(c.fetch_snapshot(&CancelToken::new()), Err(AerospaceError::Timeout));
        assert_eq!(c.runner.call_count(), 1);

        let c = client(vec![Ok(vec!["a"]), Err(CommandError::Failed("exit 1".into()))]);
        assert_eq!(
            c.fetch_snapshot(&CancelToken::new()),
            Err(AerospaceError::CommandFailed("exit 1".into()))
        );

        let c = client(vec![Err(CommandError::Spawn("denied".into()))]);
        assert_eq!(
            c.fetch_snapshot(&CancelToken::new()),
            Err(AerospaceError::CommandFailed("denied".into()))
        );
    }

    #[test]
    fn cancelled_before_start_runs_nothing() {
        let c = client(vec![Ok(vec!["a"]), Ok(vec!["a"])]);
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(c.fetch_snapshot(&token), Err(AerospaceError::Cancelled));
        assert_eq!(c.runner.call_count(), 0);
    }

    #[test]
    fn cancelled_between_queries_skips_the_second() {
        let token = CancelToken::new();
        let runner = ScriptedRunner {
            cancel_after_first: Some(token.clone()),
            ..ScriptedRunner::new(vec![Ok(vec!["a"]), Ok(vec!["a"])])
        };
        let c = AerospaceClient::with_runner(&config_with_binary(), runner);
        assert_eq!(c.fetch_snapshot(&token), Err(AerospaceError::Cancelled));
        assert_eq!(c.runner.call_count(), 1);
    }

    #[test]
    fn missing_binary_never_spawns() {
        let config = AerospaceConfig {
            candidate_paths: vec![tmp_path("absent")],
            ..AerospaceConfig::default()
        };
        let c = AerospaceClient::with_runner(&config, ScriptedRunner::new(vec![Ok(vec!["a"])]));
        assert!(c.binary().is_none());
        for _ in 0..3 {
            assert_eq!(
                c.fetch_snapshot(&CancelToken::new()),
                Err(AerospaceError::BinaryNotFound)
            );
        }
        assert_eq!(c.runner.call_count(), 0);
    }

    #[test]
    fn resolution_skips_missing_and_non_executable() {
        let missing = tmp_path("missing");
        let plain = tmp_path("plain");
        std::fs::write(&plain, b"not a program").unwrap();
        std::fs::set_permissions(&plain, std::fs::Permissions::from_mode(0o644)).unwrap();

        let candidates = vec![missing, plain.clone(), PathBuf::from("/bin/sh")];
        assert_eq!(resolve_binary(&candidates), Some(PathBuf::from("/bin/sh")));

        let _ = std::fs::remove_file(&plain);
    }

    #[test]
    fn resolution_skips_directories() {
        let candidates = vec![std::env::temp_dir()];
        assert_eq!(resolve_binary(&candidates), None);
    }

    #[test]
    fn first_match_wins() {
        let candidates = vec![PathBuf::from("/bin/sh"), PathBuf::from("/bin/cat")];
        assert_eq!(resolve_binary(&candidates), Some(PathBuf::from("/bin/sh")));
    }
}
