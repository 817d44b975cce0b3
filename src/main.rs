//! Entry point for the **aerobar** daemon.
//!
//! `aerobar` runs the daemon: trigger sources are spawned on background
//! threads and the refresh coordinator processes events on the main thread,
//! printing one status label per line to stdout.
//!
//! `aerobar notify <reason|refresh|quit>` sends one command to a running
//! daemon and exits.

use aerobar::aerospace::AerospaceClient;
use aerobar::backup::BackupTimer;
use aerobar::command::Command;
use aerobar::config::Config;
use aerobar::coordinator::{Coordinator, Event};
use aerobar::ipc::listener::{send_command, UnixSocketListener};
use aerobar::presentation::stdout::LineSink;
use aerobar::traits::TriggerSource;
use log::{error, info};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Duration;

/// Default socket path for the command listener.
fn default_socket_path() -> PathBuf {
    let runtime = std::env::var("XDG_RUNTIME_DIR")
        .or_else(|_| std::env::var("TMPDIR"))
        .unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(runtime).join("aerobar.sock")
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/aerobar`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("aerobar")
}

/// Try to load the config from `$XDG_CONFIG_HOME/aerobar/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

fn socket_path(config: &Config) -> PathBuf {
    config.socket_path.clone().unwrap_or_else(default_socket_path)
}

//  Main

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => run_daemon(),
        Some("notify") => run_notify(args.get(1).map(String::as_str)),
        Some(other) => {
            error!("unknown argument: {}", other);
            eprintln!("usage: aerobar [notify <reason|refresh|quit>]");
            std::process::exit(2);
        }
    }
}

/// Normal daemon mode.
fn run_daemon() {
    let config = load_config();

    let client = AerospaceClient::new(&config.aerospace);

    let mut sink = LineSink::new(std::io::stdout(), config.labels.clone());
    sink.show_loading();

    let (tx, rx) = mpsc::channel::<Event>();
    spawn_trigger_sources(tx.clone(), &config);

    let coordinator = Coordinator::new(
        Arc::new(client),
        sink,
        config.refresh.clone(),
        config.labels.clone(),
        tx,
    )
    .with_shutdown_grace(config.aerospace.timeout() + Duration::from_millis(500));
    info!("aerobar running");
    coordinator.run(rx);
    let _ = std::fs::remove_file(socket_path(&config));
    info!("aerobar exiting");
}

/// Send one command to a running daemon.
fn run_notify(word: Option<&str>) {
    let Some(word) = word else {
        eprintln!("usage: aerobar notify <reason|refresh|quit>");
        std::process::exit(2);
    };
    let cmd: Command = match word.parse() {
        Ok(cmd) => cmd,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    let config = load_config();
    let path = socket_path(&config);
    if let Err(e) = send_command(&path, &cmd) {
        error!("failed to reach aerobar at {}: {}", path.display(), e);
        std::process::exit(1);
    }
}

//  Helpers

fn spawn_trigger_sources(tx: mpsc::Sender<Event>, config: &Config) {
    {
        let tx = tx.clone();
        let path = socket_path(config);
        std::thread::spawn(move || {
            let mut source = UnixSocketListener::new(&path);
            if let Err(e) = source.run(tx) {
                error!("socket listener error: {}", e);
            }
        });
    }

    {
        let interval = config.refresh.backup_interval();
        std::thread::spawn(move || {
            let mut timer = BackupTimer::new(interval);
            let _ = timer.run(tx);
        });
    }
}
