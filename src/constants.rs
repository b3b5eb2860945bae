// src/constants.rs

//! Crate-wide constants.

/// Crate version, as published.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate authors.
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

/// Crate license identifier.
pub const LICENSE: &str = env!("CARGO_PKG_LICENSE");

/// Members whose name starts with this prefix are never subcommands.
pub const DUNDER_PREFIX: &str = "__";

/// Environment variable naming a TOML settings file.
pub const ENV_CONFIG: &str = "ARGDECO_CONFIG";

/// Environment variable overriding `Settings::precedence`.
pub const ENV_PRECEDENCE: &str = "ARGDECO_PRECEDENCE";

/// Environment variable overriding `Settings::usage_stream`.
pub const ENV_USAGE_STREAM: &str = "ARGDECO_USAGE_STREAM";

/// Program name used when neither the command nor the process provides one.
pub const FALLBACK_PROG: &str = "cli";
