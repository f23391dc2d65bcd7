//! # perforce-tools
//!
//! Command-line tools for working with a Perforce Helix Core server.
//!
//! ## Overview
//!
//! Operators save named connection profiles once and then use them to list
//! depots and streams or to sync a stream into a local directory. Syncs go
//! through a single-use client workspace that is created right before the
//! transfer and always deleted afterwards, so nothing is left configured on
//! the server.
//!
//! ## Architecture
//!
//! - Configuration and profiles ([`config`], [`profile`])
//! - Server access ([`p4`])
//! - The ephemeral-workspace sync ([`sync`], [`error`])
//! - Command handlers and output ([`handlers`], [`pattern`], [`logger`])

/// Platform-agnostic configuration directory management.
///
/// Locates the config directory following platform conventions (XDG on
/// Linux, Application Support on macOS, AppData on Windows).
pub mod config;

/// Error taxonomy of a sync run and its exit codes.
pub mod error;

/// Command handler functions, one per subcommand.
pub mod handlers;

/// Logging configuration and utilities.
///
/// Console logging via `RUST_LOG`, plus a persistent per-run summary log in
/// the config directory with size-based rotation.
pub mod logger;

/// Perforce server sessions.
///
/// Defines the [`p4::Session`] and [`p4::ConnectionProvider`] traits and the
/// implementation that drives the `p4` command-line client.
pub mod p4;

/// Regex name filters for the listing commands.
pub mod pattern;

/// Named connection profiles stored as TOML.
pub mod profile;

/// Syncing a stream into a local directory through an ephemeral workspace.
///
/// Prepares the target directory, creates a uniquely named client
/// workspace, transfers files, and deletes the workspace on every exit path.
pub mod sync;
