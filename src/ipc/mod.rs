//! IPC over a Unix socket.
//!
//! External tools (AeroSpace hooks, key-bind helpers, scripts) connect to
//! the socket and send newline-delimited JSON commands.

pub mod listener;
