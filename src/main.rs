// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use app_controller::Controller;

mod app_config;
mod app_controller;
mod chunker;
mod errors;
mod providers;
mod summarization;
mod token_budget;
mod transcript_processor;

/// CLI Wrapper for CuePolicy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliCuePolicy {
    DocumentOrder,
    SortByStart,
    Reject,
}

impl From<CliCuePolicy> for transcript_processor::CuePolicy {
    fn from(cli_policy: CliCuePolicy) -> Self {
        match cli_policy {
            CliCuePolicy::DocumentOrder => transcript_processor::CuePolicy::DocumentOrder,
            CliCuePolicy::SortByStart => transcript_processor::CuePolicy::SortByStart,
            CliCuePolicy::Reject => transcript_processor::CuePolicy::Reject,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize a transcript file using an AI provider (default command)
    Summarize(SummarizeArgs),

    /// Generate shell completions for yatsai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct SummarizeArgs {
    /// Input transcript file (.vtt/.srt) or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Model name to use for summarization
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama endpoint URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Maximum concurrent inference requests
    #[arg(short = 'j', long)]
    max_concurrent: Option<usize>,

    /// Write the summary to this file instead of only stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep going when a chunk exhausts its retries, producing a partial summary
    #[arg(long)]
    allow_partial: bool,

    /// How to handle cues whose start times regress
    #[arg(long, value_enum)]
    cue_policy: Option<CliCuePolicy>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// yatsai - Yet Another Transcript Summarizer with AI
///
/// Summarizes subtitle/transcript files that exceed a model's context
/// window by chunking them, summarizing each chunk, and recursively
/// reducing the summaries into one.
#[derive(Parser, Debug)]
#[command(name = "yatsai")]
#[command(author = "yatsai Team")]
#[command(version = "1.0.0")]
#[command(about = "AI-powered transcript summarization tool")]
#[command(long_about = "yatsai parses WebVTT/SRT transcripts and produces a single coherent summary using an Ollama model, however long the input.

EXAMPLES:
    yatsai talk.vtt                        # Summarize using default config
    yatsai -m llama3 talk.vtt              # Use a specific model
    yatsai -j 5 talk.vtt                   # Allow 5 concurrent requests
    yatsai -o talk.summary.txt talk.vtt    # Also write the summary to a file
    yatsai --cue-policy reject talk.vtt    # Fail on out-of-order cues
    yatsai /talks/                         # Summarize every transcript in a directory
    yatsai completions bash > yatsai.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different config file with --config-path. If the config file doesn't
    exist, a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input transcript file (.vtt/.srt) or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Model name to use for summarization
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama endpoint URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Maximum concurrent inference requests
    #[arg(short = 'j', long)]
    max_concurrent: Option<usize>,

    /// Write the summary to this file instead of only stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep going when a chunk exhausts its retries, producing a partial summary
    #[arg(long)]
    allow_partial: bool,

    /// How to handle cues whose start times regress
    #[arg(long, value_enum)]
    cue_policy: Option<CliCuePolicy>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "yatsai", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Summarize(args)) => run_summarize(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

            let summarize_args = SummarizeArgs {
                input_path,
                model: cli.model,
                endpoint: cli.endpoint,
                max_concurrent: cli.max_concurrent,
                output: cli.output,
                allow_partial: cli.allow_partial,
                cue_policy: cli.cue_policy,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_summarize(summarize_args).await
        }
    }
}

async fn run_summarize(options: SummarizeArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        apply_log_level(&cmd_log_level.clone().into());
    }

    // Load or create configuration
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        // Create default configuration if not exists
        warn!(
            "Config file not found at '{}', creating default config.",
            config_path
        );

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)?;
        std::fs::write(config_path, config_json)?;

        config
    };

    // Override config with CLI options if provided
    if let Some(model) = &options.model {
        config.provider.model = model.clone();
    }
    if let Some(endpoint) = &options.endpoint {
        config.provider.endpoint = endpoint.clone();
    }
    if let Some(max_concurrent) = options.max_concurrent {
        config.provider.max_concurrent_requests = max_concurrent;
    }
    if options.allow_partial {
        config.summarization.allow_partial = true;
    }
    if let Some(policy) = &options.cue_policy {
        config.summarization.cue_policy = policy.clone().into();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    // Validate the configuration after loading and overriding
    config.validate()?;

    // If log level was not set via command line, apply it from config now
    if options.log_level.is_none() {
        apply_log_level(&config.log_level);
    }

    // Create controller
    let controller = Controller::with_config(config)?;

    // A dead backend is worth knowing about before chunking starts
    controller.verify_backend().await?;

    let result = if options.input_path.is_file() {
        controller.run(options.input_path.clone(), options.output.clone()).await
    } else if options.input_path.is_dir() {
        controller.run_folder(options.input_path.clone()).await
    } else {
        Err(anyhow!("Input path does not exist: {:?}", options.input_path))
    };

    // Typed failures map to distinct exit codes so callers can tell
    // bad input from a flaky backend
    if let Err(error) = result {
        let code = if let Some(summarize_error) = error.downcast_ref::<errors::SummarizeError>() {
            Some(app_controller::exit_code_for(summarize_error))
        } else if error.downcast_ref::<errors::TranscriptError>().is_some()
            || error.downcast_ref::<errors::ConfigError>().is_some()
        {
            Some(2)
        } else {
            None
        };

        if let Some(code) = code {
            log::error!("{}", error);
            std::process::exit(code);
        }
        return Err(error);
    }

    Ok(())
}

/// Apply a configured log level to the global logger
fn apply_log_level(level: &app_config::LogLevel) {
    let filter = match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    };
    log::set_max_level(filter);
}
