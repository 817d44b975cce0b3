//! AeroSpace-specific implementations.
//!
//! This module provides the concrete
//! [`WorkspaceSource`](crate::traits::WorkspaceSource) backed by the
//! `aerospace` command-line tool.
//!
//! Nothing outside this module should reference AeroSpace directly.

pub mod client;

pub use client::{AerospaceClient, AerospaceError};
