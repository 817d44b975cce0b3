//! **aerobar**: a compact workspace status indicator for AeroSpace.
//!
//! The daemon shows every AeroSpace workspace as one glyph, the focused one
//! filled: `[○●○]`.  It re-queries the `aerospace` CLI whenever something
//! hints that the workspace state changed, and on a slow backup timer.
//!
//! # Architecture
//!
//! The crate is organised around the [`coordinator::Coordinator`], which
//! debounces triggers, allows at most one fetch in flight, discards
//! superseded results and only redraws when the state actually changed.
//! It depends on three traits:
//!
//! * [`traits::WorkspaceSource`]: produces snapshots; implemented by
//!   [`aerospace::AerospaceClient`] on top of [`runner::CommandRunner`].
//! * [`traits::PresentationSink`]: shows labels; implemented by
//!   [`presentation::stdout::LineSink`].
//! * [`traits::TriggerSource`]: delivers triggers; implemented by
//!   [`ipc::listener::UnixSocketListener`] and [`backup::BackupTimer`].

pub mod aerospace;
pub mod backup;
pub mod cancel;
pub mod command;
pub mod config;
pub mod coordinator;
pub mod ipc;
pub mod presentation;
pub mod runner;
pub mod traits;
pub mod workspace;
