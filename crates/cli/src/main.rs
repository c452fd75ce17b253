//! OpenCursor CLI: the main entry point.
//!
//! Commands:
//! - `agent`      : Run a task autonomously, or start the task REPL
//! - `interactive`: Plan one step and approve each proposed tool call
//! - `tools`      : List the built-in tools
//! - `config`     : Show the effective configuration or write the default file

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

use commands::Overrides;

#[derive(Parser)]
#[command(
    name = "opencursor",
    about = "OpenCursor: an autonomous coding agent for the terminal",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Model to use (overrides config and OPENCURSOR_MODEL)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Backend URL, e.g. http://localhost:11434
    #[arg(long, global = true)]
    host: Option<String>,

    /// Backend kind: ollama, openai, openrouter, vllm, llamacpp, ...
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Workspace root for the file tools (defaults to the current directory)
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// Maximum model turns per autonomous task
    #[arg(long, global = true)]
    max_iterations: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task autonomously; without --query, read tasks from stdin
    Agent {
        /// The task to run
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Plan the next step of a task and approve each tool call
    Interactive {
        /// The task to plan
        #[arg(short, long)]
        query: String,
    },

    /// List the built-in tools and their parameters
    Tools,

    /// Show the effective configuration
    Config {
        /// Write the default config file instead
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries answers only.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let overrides = Overrides {
        model: cli.model,
        host: cli.host,
        provider: cli.provider,
        workspace: cli.workspace,
        max_iterations: cli.max_iterations,
    };

    let result = match cli.command {
        Commands::Agent { query } => commands::agent::run(&overrides, query).await,
        Commands::Interactive { query } => commands::interactive::run(&overrides, &query).await,
        Commands::Tools => commands::tools::run(&overrides),
        Commands::Config { init } => commands::config_cmd::run(&overrides, init),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
