//! Bounded execution of external query commands.
//!
//! [`CommandRunner`] spawns a program with a cleared environment (only
//! `PATH` is set), polls it until it exits or a wall-clock deadline passes,
//! and returns the non-empty, trimmed lines it printed on stdout.  A child
//! that outlives the deadline is killed and reaped.
//!
//! There are no retries here.  Re-querying is the coordinator's job.

use crate::traits::ProcessRunner;
use log::{debug, warn};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How often a running child is checked for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors produced while running an external command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The process could not be started.
    #[error("failed to execute: {0}")]
    Spawn(String),
    /// The process exited with a non-zero status.
    #[error("command failed: {0}")]
    Failed(String),
    /// The process did not exit before the deadline and was killed.
    #[error("command timed out after {0:?}")]
    Timeout(Duration),
}

/// Runs commands with a minimal, explicit environment.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    search_path: String,
}

impl CommandRunner {
    /// Create a runner whose children see `PATH=search_path` and nothing
    /// else.
    pub fn new(search_path: impl Into<String>) -> Self {
        Self {
            search_path: search_path.into(),
        }
    }

    fn spawn(&self, program: &Path, args: &[&str]) -> Result<Child, CommandError> {
        Command::new(program)
            .args(args)
            .env_clear()
            .env("PATH", &self.search_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommandError::Spawn(format!("{}: {}", program.display(), e)))
    }
}

impl ProcessRunner for CommandRunner {
    fn run(
        &self,
        program: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Vec<String>, CommandError> {
        let mut child = self.spawn(program, args)?;
        debug!("spawned {} {:?} (pid {})", program.display(), args, child.id());

        // Drain both pipes concurrently so a chatty child cannot block on a
        // full pipe while we are polling it.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if started.elapsed() >= timeout {
                        warn!("{} timed out after {:?}, killing", program.display(), timeout);
                        let _ = child.kill();
                        let _ = child.wait();
                        // The reader threads finish on their own once the
                        // pipes close; joining them could block if the
                        // child leaked its descriptors to a grandchild.
                        return Err(CommandError::Timeout(timeout));
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(CommandError::Failed(format!("wait failed: {}", e)));
                }
            }
        };

        let stdout = collect(stdout);
        if !status.success() {
            let stderr = collect(stderr);
            let stderr = stderr.trim();
            let description = if stderr.is_empty() {
                format!("{} exited with {}", program.display(), status)
            } else {
                format!("{} exited with {}: {}", program.display(), status, stderr)
            };
            return Err(CommandError::Failed(description));
        }

        Ok(split_lines(&stdout))
    }
}

/// Read a pipe to its end on a helper thread.
fn drain<R>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>>
where
    R: Read + Send + 'static,
{
    let mut pipe = pipe?;
    thread::Builder::new()
        .name("aerobar-pipe".into())
        .spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
        .ok()
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Split output into trimmed, non-empty lines.
pub fn split_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
