//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the final status report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Status summary, task table and generated components
    Full,
    /// Status summary only
    Summary,
    /// JSON status report
    Json,
}

/// CLI arguments for appforge
#[derive(Parser, Debug)]
#[command(name = "appforge")]
#[command(author, version, about = "Multi-model application generation pipeline")]
#[command(long_about = r#"
appforge turns a natural-language description of an application into
requirements, an architecture, components, tests and deployment settings by
routing each phase to the best-suited models and merging their answers.

Phases:
  analysis -> design -> components (frontend/backend/database)
  -> security/testing/optimization -> quality assurance -> deployment

Configuration files are loaded from (in priority order):
1. APPFORGE_* environment variables (e.g. APPFORGE_DISPATCH__TOP_K=3)
2. --config <path>      Explicit config file
3. ./appforge.toml      Project-level config
4. ~/.config/appforge/config.toml   Global config

Example:
  appforge "A recipe sharing site with comments"
  appforge -t react -t rust --strategy consensus "Team task tracker"
  appforge -o json --fail codex=3 "Inventory dashboard"
"#)]
pub struct Cli {
    /// Description of the application to generate
    pub prompt: Option<String>,

    /// Technology to use (can be specified multiple times)
    #[arg(short, long = "tech", value_name = "TECH")]
    pub tech: Vec<String>,

    /// Kind of project to generate
    #[arg(long, value_name = "TYPE", default_value = "web_app")]
    pub project_type: String,

    /// Identifier recorded as the request owner
    #[arg(long, value_name = "ID", default_value = "cli")]
    pub user: String,

    /// Aggregation strategy (overrides config)
    #[arg(short, long, value_name = "STRATEGY")]
    pub strategy: Option<String>,

    /// Models invoked per task (overrides config)
    #[arg(short = 'k', long, value_name = "N")]
    pub top_k: Option<usize>,

    /// Script provider failures for the offline gateway, as MODEL=COUNT
    #[arg(long, value_name = "MODEL=COUNT")]
    pub fail: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "full")]
    pub output: OutputFormat,

    /// Print token usage and cost per model after the run
    #[arg(long)]
    pub usage: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Parse `--fail` entries into (model id, count) pairs
    pub fn scripted_failures(&self) -> Result<Vec<(String, u32)>, String> {
        self.fail
            .iter()
            .map(|entry| {
                let (model, count) = entry
                    .split_once('=')
                    .ok_or_else(|| format!("expected MODEL=COUNT, got '{}'", entry))?;
                let count = count
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| format!("invalid failure count in '{}'", entry))?;
                Ok((model.trim().to_string(), count))
            })
            .collect()
    }
}
