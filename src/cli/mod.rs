//! CLI layer for kb-agent.
//!
//! Provides the command-line interface using clap, with commands for
//! asking questions, searching the knowledge base, serving the runtime and
//! managing the system prompt.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, PromptCommands};
