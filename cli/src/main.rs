//! CLI entrypoint for justice-aid
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use justice_application::{AnalysisProgressNotifier, NoAnalysisProgress};
use justice_domain::AnalysisRequest;
use justice_infrastructure::{
    Assembly, ConfigLoader, FileConfig, JsonlAnalysisLogger, build_orchestrator, probe_signals,
    process_env,
};
use justice_presentation::{
    Cli, Command, ConsoleFormatter, OutputFormat, ProgressReporter, SimpleProgress,
};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const REDACTED: &str = "********";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(cli.verbose, cli.log_dir.as_deref())?;

    info!("Starting justice-aid");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    if let Command::Config = cli.command {
        print_config(&config, cli.config.as_deref())?;
        return Ok(ExitCode::SUCCESS);
    }

    // === Dependency Injection ===
    let signals = probe_signals(config.analysis.debug, &process_env);
    let Assembly {
        mut orchestrator,
        selection,
        ..
    } = build_orchestrator(&config, signals, &process_env)?;

    if let Some(path) = &cli.analysis_log {
        match JsonlAnalysisLogger::new(path) {
            Some(logger) => {
                info!("Analysis log: {}", logger.path().display());
                orchestrator = orchestrator.with_logger(Arc::new(logger));
            }
            None => warn!("Analysis logging disabled: cannot open {}", path.display()),
        }
    }

    match cli.command {
        Command::Analyze {
            description,
            output,
        } => {
            let request = AnalysisRequest::new(description)?;

            let cancel = CancellationToken::new();
            {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        cancel.cancel();
                    }
                });
            }

            let reporter;
            let progress: &dyn AnalysisProgressNotifier = if cli.quiet {
                &NoAnalysisProgress
            } else if cli.verbose > 0 {
                &SimpleProgress
            } else {
                reporter = ProgressReporter::new();
                &reporter
            };

            let result = orchestrator
                .analyze_case_with_cancel(&request, progress, &cancel)
                .await;

            let rendered = match output {
                OutputFormat::Text => ConsoleFormatter::format(&result),
                OutputFormat::Json => ConsoleFormatter::format_json(&result),
            };
            println!("{}", rendered);

            Ok(if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Health { json } => {
            let report = orchestrator.health_check().await;
            if json {
                println!("{}", ConsoleFormatter::format_json(&report));
            } else {
                println!("{}", ConsoleFormatter::format_health(&report));
            }
            Ok(if report.any_healthy() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Info { json } => {
            let info = orchestrator.service_info();
            if json {
                println!("{}", ConsoleFormatter::format_json(&info));
            } else {
                println!("{}", ConsoleFormatter::format_service_info(&info));
                println!("Selection: {}", selection.reason);
                if let Some(warning) = &selection.warning {
                    println!("Warning: {}", warning);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Config => Ok(ExitCode::SUCCESS),
    }
}

/// Initialize logging based on verbosity level, optionally teeing into a
/// daily rolling file under `log_dir`.
fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "justice-aid.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Print config file locations, validation issues and the effective
/// configuration with credentials redacted.
fn print_config(config: &FileConfig, explicit: Option<&Path>) -> Result<()> {
    println!("Configuration sources (in priority order):");
    println!("  [env  ] JUSTICE_* environment variables");
    for (label, found) in ConfigLoader::config_sources(explicit) {
        match found {
            Some(path) => println!("  [FOUND] {:<8} {}", format!("{}:", label), path.display()),
            None => println!("  [     ] {}", label),
        }
    }
    println!("  [     ] Default: built-in defaults");

    let issues = config.validate();
    if !issues.is_empty() {
        println!("\nIssues:");
        for issue in &issues {
            println!("  - {}", issue);
        }
    }

    let mut shown = config.clone();
    for provider in [
        &mut shown.providers.ollama,
        &mut shown.providers.huggingface,
        &mut shown.providers.gemini,
    ] {
        if provider.api_key.is_some() {
            provider.api_key = Some(REDACTED.to_string());
        }
    }
    println!(
        "\nEffective configuration:\n{}",
        toml::to_string_pretty(&shown).context("Cannot render configuration")?
    );
    Ok(())
}
