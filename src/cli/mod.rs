//! Command-line interface support
//!
//! Argument handling and command implementations for `staged-import-cli`.

pub mod commands;
pub mod error;
