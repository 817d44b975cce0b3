//! Commands and types used throughout aerobar.
//!
//! This module defines the vocabulary that all components share:
//! [`Command`] describes every request an external tool can send to the
//! daemon, and [`TriggerReason`] / [`RefreshTrigger`] describe *why* a
//! workspace refresh was requested.
//!
//! Trigger names are parsed permissively: `"space-change"`, `"SpaceChange"`
//! and `"space_change"` all name the same reason.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Why a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TriggerReason {
    /// Another application was activated.
    AppSwitch,
    /// The active space changed (Mission Control, AeroSpace workspace hook).
    SpaceChange,
    /// Focus moved between windows.  High-frequency, low-signal.
    WindowChange,
    /// The periodic safety-net timer.
    BackupTimer,
    /// The user asked for a refresh.
    ManualRefresh,
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerReason::AppSwitch => write!(f, "app-switch"),
            TriggerReason::SpaceChange => write!(f, "space-change"),
            TriggerReason::WindowChange => write!(f, "window-change"),
            TriggerReason::BackupTimer => write!(f, "backup-timer"),
            TriggerReason::ManualRefresh => write!(f, "manual-refresh"),
        }
    }
}

/// Normalise a user-supplied name: lowercase, no whitespace, `-` or `_`.
fn normalize(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Parse a trigger reason (case-insensitive; accepts "app-switch", "AppSwitch", "app_switch").
fn parse_reason(s: &str) -> Option<TriggerReason> {
    match normalize(s).as_str() {
        "appswitch" => Some(TriggerReason::AppSwitch),
        "spacechange" | "workspacechange" => Some(TriggerReason::SpaceChange),
        "windowchange" => Some(TriggerReason::WindowChange),
        "backuptimer" | "backup" => Some(TriggerReason::BackupTimer),
        "manualrefresh" | "refresh" => Some(TriggerReason::ManualRefresh),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for TriggerReason {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_reason(&s).ok_or_else(|| DeError::custom(format!("invalid trigger reason: {:?}", s)))
    }
}

/// A request to re-query workspace state after `requested_delay`.
///
/// Triggers are transient: they are created when an event arrives and
/// consumed by the [`Coordinator`](crate::coordinator::Coordinator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTrigger {
    pub reason: TriggerReason,
    pub requested_delay: Duration,
}

impl RefreshTrigger {
    pub fn new(reason: TriggerReason, requested_delay: Duration) -> Self {
        Self {
            reason,
            requested_delay,
        }
    }
}

/// Every request an external tool can send to the daemon.
///
/// Commands are produced by [`TriggerSource`](crate::traits::TriggerSource)
/// implementations and consumed by the [`Coordinator`](crate::coordinator::Coordinator).
///
/// # Wire format
///
/// ```json
/// {"Trigger":"space-change"}
/// "Refresh"
/// "Quit"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Something happened that may have changed the workspace state.
    Trigger(TriggerReason),

    /// Shorthand for `Trigger(ManualRefresh)`, the "Force Refresh" action.
    Refresh,

    /// Cancel all pending work and stop the daemon.
    Quit,
}

impl Command {
    /// The trigger reason this command carries, if any.
    pub fn trigger_reason(&self) -> Option<TriggerReason> {
        match self {
            Command::Trigger(reason) => Some(*reason),
            Command::Refresh => Some(TriggerReason::ManualRefresh),
            Command::Quit => None,
        }
    }
}

/// Error returned when a command-line word names no known command.
#[derive(Debug, thiserror::Error)]
#[error("unknown command: {0:?}")]
pub struct ParseCommandError(String);

impl FromStr for Command {
    type Err = ParseCommandError;

    /// Parse the argument of `aerobar notify <word>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "quit" => Ok(Command::Quit),
            "refresh" | "manualrefresh" => Ok(Command::Refresh),
            _ => parse_reason(s)
                .map(Command::Trigger)
                .ok_or_else(|| ParseCommandError(s.to_string())),
        }
    }
}
