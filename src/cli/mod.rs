// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Command-line interface: argument parsing, console logging and the
//! `extract` and `render` commands.

/// CLI arguments.
pub mod args;

/// Detect-and-render command.
pub mod extract;

/// Console logging macros.
pub mod logging;

/// Re-render command.
pub mod render;
