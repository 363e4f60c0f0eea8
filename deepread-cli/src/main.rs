//! DeepRead CLI: terminal research assistant.
//!
//! Search the web, open results in a reader view, and synthesize a report
//! from the collected articles. Runs one-shot subcommands or an interactive
//! shell.

mod commands;
mod markdown;
mod repl;

use clap::Parser;
use deepread_core::types::ReportMode;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// DeepRead: search, read, and synthesize research reports
#[derive(Parser, Debug)]
#[command(name = "deepread", version, about, long_about = None)]
struct Cli {
    /// Generation model to use (overrides config)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Workspace directory (holds .deepread/config.toml)
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Subcommand (starts the interactive shell if omitted)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Search the web for a topic
    Search {
        /// Search query
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        /// Show at most this many results
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Fetch a page through the reader service
    Read {
        /// Page URL
        url: String,
        /// Print the document as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fetch the given URLs and generate a report from them
    Analyze {
        /// Report topic
        topic: String,
        /// URLs to fetch
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Search a topic, fetch the top results, and generate a report
    Research {
        /// Research topic
        topic: String,
        /// Number of top results to fetch (default from config)
        #[arg(short = 'n', long)]
        count: Option<usize>,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Interactive research shell
    Shell,
    /// Manage the generation API key
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options shared by commands that produce a report.
#[derive(clap::Args, Debug)]
struct ReportArgs {
    /// Report structure: long_form or sections
    #[arg(long, value_parser = parse_mode)]
    mode: Option<ReportMode>,
    /// Write the report to a file (.json for JSON, anything else for Markdown)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Print the report as JSON instead of rendering it
    #[arg(long)]
    json: bool,
}

#[derive(clap::Subcommand, Debug)]
enum AuthAction {
    /// Store the generation API key in the OS credential store
    Set {
        /// Read the key from this argument instead of prompting
        #[arg(long)]
        key: Option<String>,
    },
    /// Show where the generation API key comes from
    Status,
    /// Remove the stored generation API key
    Clear,
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create a default configuration file in the workspace
    Init,
    /// Show the current configuration
    Show,
}

fn parse_mode(s: &str) -> Result<ReportMode, String> {
    s.parse()
}

/// Options every command needs to load configuration.
pub(crate) struct GlobalOptions {
    pub workspace: PathBuf,
    pub config_file: Option<PathBuf>,
    pub model: Option<String>,
    pub quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "deepread", "deepread")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "deepread.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("deepread_core=debug,deepread=debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let options = GlobalOptions {
        workspace,
        config_file: cli.config,
        model: cli.model,
        quiet: cli.quiet,
    };

    commands::handle_command(cli.command.unwrap_or(Commands::Shell), &options).await
}
