//! Unix-socket [`TriggerSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`Command`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`:
//!
//! ```json
//! {"Trigger":"space-change"}
//! {"Trigger":"AppSwitch"}
//! "Refresh"
//! "Quit"
//! ```
//!
//! A typical producer is AeroSpace's own hook:
//!
//! ```toml
//! exec-on-workspace-change = ["/bin/sh", "-c", "aerobar notify space-change"]
//! ```

use crate::command::Command;
use crate::coordinator::Event;
use crate::traits::TriggerSource;
use log::{debug, error, info};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// A [`TriggerSource`] that listens on a Unix stream socket for
/// JSON-encoded commands.
///
/// Each accepted connection can send multiple newline-delimited commands.
/// When the connection closes, the listener waits for the next one.
pub struct UnixSocketListener {
    path: PathBuf,
}

/// Errors produced by the Unix socket transport.
#[derive(Debug, thiserror::Error)]
pub enum UnixSocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UnixSocketListener {
    /// Create a new listener bound to `path`.
    ///
    /// The socket file is created when [`run`](TriggerSource::run) is
    /// called.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl TriggerSource for UnixSocketListener {
    type Error = UnixSocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** until the coordinator's queue is closed.
    /// Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error> {
        // Remove stale socket if present.
        let _ = std::fs::remove_file(&self.path);

        let listener = UnixListener::bind(&self.path)?;
        info!("listening on {}", self.path.display());

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    debug!("client connected");
                    let reader = BufReader::new(stream);
                    for line in reader.lines() {
                        match line {
                            Ok(ref text) if text.trim().is_empty() => continue,
                            Ok(text) => match serde_json::from_str::<Command>(&text) {
                                Ok(cmd) => {
                                    debug!("received {:?}", cmd);
                                    if sink.send(Event::Command(cmd)).is_err() {
                                        info!("queue closed, shutting down listener");
                                        let _ = std::fs::remove_file(&self.path);
                                        return Ok(());
                                    }
                                }
                                Err(e) => error!("bad command: {} ({})", text, e),
                            },
                            Err(e) => {
                                error!("read error: {}", e);
                                break;
                            }
                        }
                    }
                    debug!("client disconnected");
                }
                Err(e) => error!("accept error: {}", e),
            }
        }
        Ok(())
    }
}

/// Send a single command to a running daemon listening on `path`.
pub fn send_command(path: &Path, cmd: &Command) -> Result<(), UnixSocketError> {
    let mut stream = UnixStream::connect(path)?;
    let line = serde_json::to_string(cmd)?;
    writeln!(stream, "{}", line)?;
    stream.flush()?;
    Ok(())
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::TriggerReason;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Monotonic counter to generate unique socket paths per test.
    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    /// Helper: create a unique temporary socket path for each test.
    fn tmp_socket_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("aerobar-test-{}-{}.sock", std::process::id(), id))
    }

    fn spawn_listener(path: &Path) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel();
        let path = path.to_path_buf();
        std::thread::spawn(move || {
            let mut listener = UnixSocketListener::new(&path);
            let _ = listener.run(tx);
        });
        // Give the listener a moment to bind.
        std::thread::sleep(Duration::from_millis(150));
        rx
    }

    fn commands(rx: &mpsc::Receiver<Event>) -> Vec<Command> {
        std::thread::sleep(Duration::from_millis(150));
        rx.try_iter()
            .filter_map(|e| match e {
                Event::Command(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn forwards_commands_from_socket() {
        let path = tmp_socket_path();
        let rx = spawn_listener(&path);

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, r#"{{"Trigger":"space-change"}}"#).unwrap();
            writeln!(stream).unwrap();
            writeln!(stream, r#""Refresh""#).unwrap();
            writeln!(stream, r#""Quit""#).unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }

        assert_eq!(
            commands(&rx),
            vec![
                Command::Trigger(TriggerReason::SpaceChange),
                Command::Refresh,
                Command::Quit,
            ]
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_json_does_not_crash() {
        let path = tmp_socket_path();
        let rx = spawn_listener(&path);

        {
            let mut stream = UnixStream::connect(&path).expect("connect");
            writeln!(stream, "not json at all").unwrap();
            writeln!(stream, r#"{{"Trigger":"teleport"}}"#).unwrap();
            writeln!(stream, r#"{{"Trigger":"AppSwitch"}}"#).unwrap();
            stream.shutdown(std::net::Shutdown::Write).unwrap();
        }

        assert_eq!(commands(&rx), vec![Command::Trigger(TriggerReason::AppSwitch)]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn send_command_reaches_listener() {
        let path = tmp_socket_path();
        let rx = spawn_listener(&path);

        send_command(&path, &Command::Trigger(TriggerReason::WindowChange)).unwrap();
        send_command(&path, &Command::Refresh).unwrap();

        assert_eq!(
            commands(&rx),
            vec![Command::Trigger(TriggerReason::WindowChange), Command::Refresh]
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn send_without_daemon_fails() {
        let path = tmp_socket_path();
        assert!(send_command(&path, &Command::Quit).is_err());
    }
}
