//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use coderead_core::config::{self, Theme};
use coderead_core::prompts::AnalysisMode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

mod commands;

/// Environment variable holding the log filter (`tracing` `EnvFilter` syntax).
const LOG_ENV: &str = "CODEREAD_LOG";

#[derive(Parser)]
#[command(name = "coderead")]
#[command(version)]
#[command(about = "Explain, test and convert code with Gemini")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that calls the model.
#[derive(clap::Args, Debug, Clone, Default)]
struct AnalyzeArgs {
    /// Code file to analyze ("-" or omitted reads stdin)
    #[arg(value_name = "FILE", conflicts_with = "image")]
    file: Option<String>,

    /// Analyze an image of code instead of text
    #[arg(long, value_name = "PATH")]
    image: Option<String>,

    /// Override the model from config
    #[arg(short, long)]
    model: Option<String>,

    /// Write the page to this HTML file, rewritten on every chunk
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Page theme (light, dark)
    #[arg(long, value_parser = parse_theme)]
    theme: Option<Theme>,

    /// Copy the N-th code block (1-based) of the answer to the clipboard
    #[arg(long, value_name = "N")]
    copy_code: Option<usize>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Explain code as a story: logic, plot twists and a better draft
    Explain(AnalyzeArgs),
    /// Generate unit tests for code
    Tests(AnalyzeArgs),
    /// Convert code to another language
    Convert {
        /// Target language (e.g. Python, Go, Rust)
        #[arg(long = "to", value_name = "LANG")]
        target: String,

        #[command(flatten)]
        args: AnalyzeArgs,
    },
    /// Render a markdown file to HTML without calling the model
    Render {
        /// Markdown file ("-" reads stdin)
        #[arg(value_name = "MARKDOWN_FILE", default_value = "-")]
        input: String,

        /// Write the page to this HTML file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Page theme (light, dark)
        #[arg(long, value_parser = parse_theme)]
        theme: Option<Theme>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Save the default page theme
    Theme {
        #[arg(value_parser = parse_theme)]
        theme: Theme,
    },
}

fn parse_theme(raw: &str) -> std::result::Result<Theme, String> {
    raw.parse::<Theme>().map_err(|e| e.to_string())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = match init_logging() {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("warning: file logging disabled: {err:#}");
            None
        }
    };

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

/// Sends `tracing` output to a daily rolling file under `$CODEREAD_HOME/logs`.
///
/// stdout carries rendered pages, so nothing is logged to the terminal.
fn init_logging() -> Result<WorkerGuard> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("coderead")
        .filename_suffix("log")
        .build(config::paths::logs_dir())
        .context("create log file appender")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("install tracing subscriber")?;

    Ok(guard)
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = config::Config::load().context("load config")?;

    match cli.command {
        Commands::Explain(args) => {
            commands::analyze::run(AnalysisMode::Explain, &args, &config).await
        }
        Commands::Tests(args) => commands::analyze::run(AnalysisMode::Tests, &args, &config).await,
        Commands::Convert { target, args } => {
            commands::analyze::run(AnalysisMode::Convert { target }, &args, &config).await
        }
        Commands::Render {
            input,
            output,
            theme,
        } => commands::render::run(&input, output.as_deref(), theme.unwrap_or(config.theme)),
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Theme { theme } => commands::config::theme(theme),
        },
    }
}
