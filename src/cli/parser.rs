//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// kb-agent: answers questions from an Amazon Bedrock knowledge base.
///
/// Searches the knowledge base with the `kb_search` tool and streams a
/// cited answer.
#[derive(Parser, Debug)]
#[command(name = "kb-agent")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Knowledge base to search.
    #[arg(long, env = "STRANDS_KNOWLEDGE_BASE_ID", global = true)]
    pub knowledge_base_id: Option<String>,

    /// AWS region for the knowledge base and the model.
    #[arg(long, env = "AWS_REGION", global = true)]
    pub region: Option<String>,

    /// Directory containing prompt template files.
    #[arg(long, env = "KB_AGENT_PROMPT_DIR", global = true)]
    pub prompt_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question and stream the cited answer.
    ///
    /// The answer's citation markers are checked against its references
    /// section once the stream ends.
    #[command(after_help = r#"Examples:
  kb-agent ask "太陽光発電の仕組みについて教えて"
  kb-agent ask "What is an inverter?" --model anthropic.claude-3-5-sonnet-20241022-v2:0
  kb-agent ask "..." --raw | jq -c '.event'
  kb-agent --format json ask "..." | jq '.citations'
"#)]
    Ask {
        /// The question.
        prompt: String,

        /// Bedrock model identifier.
        #[arg(short, long)]
        model: Option<String>,

        /// Print each model event as a JSON line instead of text.
        #[arg(long)]
        raw: bool,
    },

    /// Search the knowledge base without invoking a model.
    #[command(after_help = r#"Examples:
  kb-agent search "solar panel efficiency"
  kb-agent search "inverter" -k 10
  kb-agent --format json search "battery" | jq '.results[].uri'
"#)]
    Search {
        /// Search query text.
        query: String,

        /// Maximum number of results (1-100).
        #[arg(short = 'k', long)]
        top_k: Option<i64>,
    },

    /// Serve the invocation runtime over HTTP.
    #[cfg(feature = "server")]
    #[command(after_help = r#"Examples:
  kb-agent serve                          # 0.0.0.0:8080
  kb-agent serve --host 127.0.0.1 --port 9000
  curl -N localhost:8080/invocations -d '{"prompt":"..."}'
"#)]
    Serve {
        /// Host address to bind to.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on.
        #[arg(short, long, default_value_t = crate::server::DEFAULT_PORT)]
        port: u16,
    },

    /// System prompt operations (show, init).
    #[command(subcommand)]
    Prompt(PromptCommands),
}

/// System prompt subcommands.
#[derive(Subcommand, Debug)]
pub enum PromptCommands {
    /// Print the system prompt currently in effect.
    Show,

    /// Write the default system prompt to a directory for editing.
    ///
    /// Existing files are not overwritten.
    #[command(after_help = r#"Examples:
  kb-agent prompt init                    # ~/.config/kb-agent/prompts
  kb-agent prompt init ./prompts
"#)]
    Init {
        /// Target directory.
        dir: Option<PathBuf>,
    },
}
