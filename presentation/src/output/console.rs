//! Console output formatter for analysis results

use colored::Colorize;
use justice_application::{BackendHealth, HealthReport, ServiceInfo};
use justice_domain::AnalysisResult;

/// Formats analysis results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format an analysis result as coloured text
    pub fn format(result: &AnalysisResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("IPC Analysis"));
        output.push('\n');

        if result.success {
            output.push_str(&format!(
                "{} {} ({} ms)\n",
                "Service:".cyan().bold(),
                result.service_used,
                result.response_time_ms
            ));
            if let Some(model) = &result.model_used {
                output.push_str(&format!("{} {}\n", "Model:".cyan().bold(), model));
            }
            if let Some(reason) = &result.fallback_reason {
                output.push_str(&format!(
                    "{} {}\n",
                    "Fallback used, primary failed:".yellow().bold(),
                    reason
                ));
            }
        } else {
            output.push_str(&format!(
                "{} {}\n",
                "Analysis failed:".red().bold(),
                result.error.as_deref().unwrap_or("Unknown error")
            ));
        }

        output.push_str(&Self::section_header("Sections Applied"));
        for section in &result.sections {
            let number = if result.success {
                format!("Section {}", section.section_number).yellow().bold()
            } else {
                section.section_number.red().bold()
            };
            output.push_str(&format!("\n{}  {}\n", number, section.description));
            if !section.reason.is_empty() {
                output.push_str(&format!("  {} {}\n", "Why:".dimmed(), section.reason));
            }
        }

        output.push_str(&Self::section_header("Explanation"));
        output.push_str(&format!("\n{}\n", result.explanation));

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json<T: serde::Serialize>(value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format a health report
    pub fn format_health(report: &HealthReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Backend Health"));
        output.push('\n');
        output.push_str(&format!(
            "{} {} ({})\n",
            "Environment:".cyan().bold(),
            report.environment,
            report.mode
        ));

        output.push_str(&Self::section_header("Primary"));
        output.push_str(&Self::health_line(&report.primary));

        if !report.fallbacks.is_empty() {
            output.push_str(&Self::section_header("Fallback"));
            for health in &report.fallbacks {
                output.push_str(&Self::health_line(health));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    fn health_line(health: &BackendHealth) -> String {
        let mut line = if health.is_healthy() {
            format!(
                "{} {} {}\n",
                "v".green(),
                health.service.to_string().bold(),
                health.model.as_deref().unwrap_or("").dimmed()
            )
        } else {
            format!(
                "{} {} {}\n",
                "x".red(),
                health.service.to_string().bold(),
                health.error.as_deref().unwrap_or("unhealthy").red()
            )
        };
        for (key, value) in &health.details {
            line.push_str(&format!("    {}: {}\n", key.dimmed(), value));
        }
        line
    }

    /// Format the service wiring
    pub fn format_service_info(info: &ServiceInfo) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Service Configuration"));
        output.push('\n');
        output.push_str(&format!(
            "{} {} ({})\n",
            "Primary:".cyan().bold(),
            info.primary_service,
            info.primary_model
        ));
        match (&info.fallback_service, &info.fallback_model) {
            (Some(service), Some(model)) => output.push_str(&format!(
                "{} {} ({})\n",
                "Fallback:".cyan().bold(),
                service,
                model
            )),
            _ => output.push_str(&format!("{} {}\n", "Fallback:".cyan().bold(), "none".dimmed())),
        }
        output.push_str(&format!(
            "{} {}\n{} {}\n{} {}\n",
            "Environment:".cyan().bold(),
            info.environment,
            "Mode:".cyan().bold(),
            info.mode,
            "Debug:".cyan().bold(),
            info.debug_mode
        ));

        output.push_str(&Self::section_header("Services"));
        for (name, available) in &info.services_available {
            let mark = if *available { "v".green() } else { "-".dimmed() };
            output.push_str(&format!("{} {}\n", mark, name));
        }

        output.push_str(&Self::footer());
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
