//! CLI command handlers

pub mod commands;

pub use commands::{load_objects, print_diagnostics, push, read, sheets, OutputFormat, PushArgs, ReadArgs, ReadMode};
