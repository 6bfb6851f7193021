//! glreview CLI - GitLab merge request review tools over MCP.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use glreview_core::{Config, GitBranchDetector, Settings};
use glreview_gitlab::GitLabClient;
use glreview_mcp::handlers::{
    GET_BRANCH_COMMENTS, GET_CURRENT_BRANCH, GET_MERGE_REQUEST_COMMENTS, GET_MERGE_REQUEST_INFO,
};
use glreview_mcp::{McpServer, ToolHandler};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glreview")]
#[command(author, version, about = "glreview - GitLab review comments for AI assistants", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server on stdin/stdout (default)
    Serve,

    /// Print the current Git branch
    Branch,

    /// Show merge requests opened from the current branch
    Info,

    /// Show review comments of a merge request, grouped by file and line
    Comments {
        /// Merge request IID
        iid: u64,
    },

    /// List review comments of every merge request from the current branch
    Discover,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Get a configuration value (e.g. gitlab.url)
    Get {
        /// Config key
        key: String,
    },

    /// Set a configuration value (e.g. gitlab.project_id 123)
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },

    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr: stdout carries the MCP protocol.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let handler = build_handler()?;
            McpServer::new(handler).run().await?;
        }
        Commands::Branch => run_tool(GET_CURRENT_BRANCH, None).await?,
        Commands::Info => run_tool(GET_MERGE_REQUEST_INFO, None).await?,
        Commands::Comments { iid } => {
            run_tool(
                GET_MERGE_REQUEST_COMMENTS,
                Some(json!({ "mergeRequestIID": iid })),
            )
            .await?
        }
        Commands::Discover => run_tool(GET_BRANCH_COMMENTS, None).await?,
        Commands::Config { command } => handle_config(command)?,
    }

    Ok(())
}

/// Wire the tool handler from config file and environment.
fn build_handler() -> anyhow::Result<ToolHandler> {
    let config = Config::load()?;
    let settings = Settings::from_env(&config)?;
    tracing::debug!(?settings, "Using settings");

    let client = GitLabClient::with_base_url(settings.base_url, settings.token);
    Ok(ToolHandler::new(
        Arc::new(client),
        Arc::new(GitBranchDetector::new()),
        settings.project_id,
    ))
}

/// Run one tool and print its text items. Tool errors exit with status 1.
async fn run_tool(name: &str, arguments: Option<serde_json::Value>) -> anyhow::Result<()> {
    let handler = build_handler()?;
    let result = handler.execute(name, arguments).await;

    if result.is_error() {
        for text in result.text_items() {
            eprintln!("{}", text);
        }
        std::process::exit(1);
    }

    for text in result.text_items() {
        println!("{}", text);
    }
    Ok(())
}

fn handle_config(command: ConfigCommands) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = Config::load()?;
            println!("[gitlab]");
            println!("url = {}", config.gitlab.url);
            println!(
                "project_id = {}",
                config.gitlab.project_id.as_deref().unwrap_or("(not set)")
            );
            let token = match std::env::var(glreview_core::config::TOKEN_ENV) {
                Ok(v) if !v.is_empty() => "(set)",
                _ => "(not set)",
            };
            println!("token = {} via {}", token, glreview_core::config::TOKEN_ENV);
        }
        ConfigCommands::Get { key } => {
            let config = Config::load()?;
            match config.get(&key)? {
                Some(value) => println!("{}", value),
                None => println!("(not set)"),
            }
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config
                .save()
                .with_context(|| format!("Failed to save {}", key))?;
            println!("Set {} = {}", key, value);
        }
        ConfigCommands::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }

    Ok(())
}
