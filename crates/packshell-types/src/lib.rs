//! Foundation types for packshell.
//!
//! Shared by the terminal and app crates: the error taxonomy and the
//! TOML-backed shell configuration.

pub mod config;
pub mod error;
