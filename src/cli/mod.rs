//! CLI layer for the trip planner.
//!
//! Provides the command-line interface using clap, with commands for
//! one-shot planning, interactive chat, serving over HTTP, and writing
//! prompt templates.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, ModelArgs};
