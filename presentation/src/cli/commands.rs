//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for analysis results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable coloured text
    Text,
    /// The full result as JSON
    Json,
}

/// CLI arguments for justice-aid
#[derive(Parser, Debug)]
#[command(name = "justice-aid")]
#[command(author, version, about = "Identify IPC sections for a case description using AI backends")]
#[command(long_about = r#"
justice-aid sends a case description to an AI backend and reports which
sections of the Indian Penal Code apply and why.

Backends: a local Ollama server, the Hugging Face Inference API, and Google
Gemini. In auto mode the backend is chosen from deployment signals: in
production the remote backend is used (when its credential is present) with
Ollama as fallback; in development Ollama is used alone.

Configuration files are loaded from (in priority order):
1. JUSTICE_* environment variables (e.g. JUSTICE_ANALYSIS__MODE=gemini)
2. --config <path>                        Explicit config file
3. ./justice-aid.toml                     Project-level config
4. ~/.config/justice-aid/config.toml      Global config

Example:
  justice-aid analyze "A driver hit a pedestrian who later died in hospital"
  justice-aid analyze --output json "Someone broke into my house and stole jewellery"
  justice-aid health
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Also write diagnostic logs to a daily rolling file in this directory
    #[arg(long, value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Append one JSON line per analysis outcome to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub analysis_log: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a case description
    Analyze {
        /// The case description (10 to 5000 characters)
        description: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Check the health of the configured backends
    Health {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which backends were selected and why
    Info {
        /// Print the service info as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration file locations and the effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze_defaults_to_text() {
        let cli =
            Cli::try_parse_from(["justice-aid", "analyze", "Someone stole my bicycle"]).unwrap();
        match cli.command {
            Command::Analyze {
                description,
                output,
            } => {
                assert_eq!(description, "Someone stole my bicycle");
                assert_eq!(output, OutputFormat::Text);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "justice-aid",
            "analyze",
            "--output",
            "json",
            "-vv",
            "--analysis-log",
            "out.jsonl",
            "Someone stole my bicycle",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.analysis_log, Some(PathBuf::from("out.jsonl")));
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["justice-aid"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
