//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

// Allow certain patterns that improve readability in CLI output formatting
#![allow(clippy::format_push_string)]

use std::io::Write as IoWrite;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use futures_util::StreamExt;
use serde_json::json;
use tracing::warn;

use crate::agent::citation::CitationAudit;
use crate::agent::config::AgentConfig;
use crate::agent::events::{AgentEvent, AgentSummary};
use crate::agent::orchestrator::Orchestrator;
use crate::agent::prompt::PromptSet;
use crate::cli::output::{OutputFormat, format_audit, format_search};
use crate::cli::parser::{Cli, Commands, PromptCommands};
use crate::retrieval::{
    BedrockClientFactory, KnowledgeBaseSearch, LazyRetrievalClient, RetrievalQuery,
};

/// Characters of chunk text shown per search result.
const SEARCH_PREVIEW_LEN: usize = 160;

/// Executes the CLI command.
///
/// Streaming commands write to stdout as they go; the returned string is
/// printed after them.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub async fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Ask { prompt, model, raw } => {
            cmd_ask(cli, prompt, model.as_deref(), *raw, format).await
        }
        Commands::Search { query, top_k } => cmd_search(cli, query, *top_k, format).await,
        #[cfg(feature = "server")]
        Commands::Serve { host, port } => cmd_serve(cli, host, *port).await,
        Commands::Prompt(sub) => match sub {
            PromptCommands::Show => cmd_prompt_show(cli, format),
            PromptCommands::Init { dir } => cmd_prompt_init(dir.as_deref(), format),
        },
    }
}

/// Builds the agent configuration: CLI flags → environment → defaults.
fn agent_config(cli: &Cli) -> Result<AgentConfig> {
    let mut builder = AgentConfig::builder();
    if let Some(id) = &cli.knowledge_base_id {
        builder = builder.knowledge_base_id(id);
    }
    if let Some(region) = &cli.region {
        builder = builder.region(region);
    }
    if let Some(dir) = &cli.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    builder
        .from_env()
        .build()
        .context("Agent configuration error")
}

async fn cmd_ask(
    cli: &Cli,
    prompt: &str,
    model: Option<&str>,
    raw: bool,
    format: OutputFormat,
) -> Result<String> {
    let config = agent_config(cli)?;
    let orchestrator = Orchestrator::from_config(config)
        .await
        .context("Provider creation failed")?;
    let model_id = model.unwrap_or_else(|| orchestrator.default_model_id());

    let mut events = orchestrator.run(prompt, model_id);
    let mut answer = String::new();
    let mut summary: Option<AgentSummary> = None;
    let mut stdout = std::io::stdout();

    while let Some(item) = events.next().await {
        match item? {
            AgentEvent::Event(event) => {
                if raw {
                    writeln!(stdout, "{}", AgentEvent::Event(event.clone()).to_json())?;
                }
                if let Some(text) = event.text() {
                    answer.push_str(text);
                    if !raw && format == OutputFormat::Text {
                        write!(stdout, "{text}")?;
                        stdout.flush()?;
                    }
                }
            }
            AgentEvent::ToolResult(result) => {
                tracing::debug!(call_id = %result.tool_call_id, is_error = result.is_error, "tool result");
            }
            AgentEvent::Result(done) => summary = Some(done),
        }
    }

    let audit = CitationAudit::of(&answer);
    if !audit.is_consistent() {
        warn!(
            unresolved = ?audit.unresolved,
            ordered = audit.ordered,
            "answer citations are inconsistent"
        );
    }

    match format {
        OutputFormat::Json if !raw => {
            let output = json!({
                "model": model_id,
                "answer": answer,
                "citations": audit,
                "summary": summary,
            });
            Ok(serde_json::to_string_pretty(&output)? + "\n")
        }
        _ if raw => Ok(String::new()),
        _ => {
            let mut output = String::from("\n");
            if cli.verbose {
                output.push_str(&format_audit(&audit));
                if let Some(s) = summary {
                    output.push_str(&format!(
                        "Model calls: {} | Tool calls: {} | Tokens: {} in / {} out\n",
                        s.model_calls, s.tool_calls, s.usage.input_tokens, s.usage.output_tokens
                    ));
                }
            }
            Ok(output)
        }
    }
}

async fn cmd_search(
    cli: &Cli,
    query: &str,
    top_k: Option<i64>,
    format: OutputFormat,
) -> Result<String> {
    let config = agent_config(cli)?;
    let client = Arc::new(LazyRetrievalClient::new(
        Arc::new(BedrockClientFactory),
        config.region.clone(),
    ));
    let search = KnowledgeBaseSearch::new(
        config.knowledge_base_id.clone(),
        config.default_max_results,
        client,
    );

    let response = search.search(&RetrievalQuery::new(query, top_k)).await;

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&response)? + "\n"),
        OutputFormat::Text => {
            if let Some(error) = response.error.as_deref().filter(|_| !response.success) {
                bail!("Search failed: {error}");
            }
            Ok(format_search(&response, SEARCH_PREVIEW_LEN))
        }
    }
}

#[cfg(feature = "server")]
async fn cmd_serve(cli: &Cli, host: &str, port: u16) -> Result<String> {
    use crate::entrypoint::Entrypoint;

    let config = agent_config(cli)?;
    if config.knowledge_base_id.is_none() {
        warn!("STRANDS_KNOWLEDGE_BASE_ID is not set; kb_search will report a configuration error");
    }
    let orchestrator = Orchestrator::from_config(config)
        .await
        .context("Provider creation failed")?;
    crate::server::serve_http(Entrypoint::new(Arc::new(orchestrator)), host, port).await?;
    Ok(String::new())
}

fn cmd_prompt_show(cli: &Cli, format: OutputFormat) -> Result<String> {
    let prompts = PromptSet::load(cli.prompt_dir.as_deref());
    match format {
        OutputFormat::Text => Ok(prompts.system),
        OutputFormat::Json => {
            Ok(serde_json::to_string_pretty(&json!({ "system": prompts.system }))? + "\n")
        }
    }
}

fn cmd_prompt_init(dir: Option<&std::path::Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(std::path::PathBuf::from)
        .or_else(PromptSet::default_dir)
        .context("Could not determine home directory for default prompt path")?;

    let written = PromptSet::write_defaults(&target_dir).context("Failed to write prompt templates")?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                Ok(format!(
                    "Prompt template already exists in: {}\n",
                    target_dir.display()
                ))
            } else {
                let mut output = format!(
                    "Wrote {} prompt template(s) to: {}\n",
                    written.len(),
                    target_dir.display()
                );
                for path in &written {
                    output.push_str(&format!(
                        "  {}\n",
                        path.file_name()
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown")
                    ));
                }
                output.push_str("\nEdit this file to customize the agent's system prompt.\n");
                Ok(output)
            }
        }
        OutputFormat::Json => {
            let json = json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(serde_json::to_string_pretty(&json)? + "\n")
        }
    }
}
