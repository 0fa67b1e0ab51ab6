//! acuctl CLI library
//!
//! Argument parsing, output rendering and command handlers for the `acuctl`
//! binary. Kept as a library so integration tests can drive the handlers.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
