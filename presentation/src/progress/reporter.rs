//! Progress reporting for analysis execution

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use justice_application::{AnalysisPhase, AnalysisProgressNotifier};
use justice_domain::BackendId;
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress with a spinner while backends are being called
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn backend_name(backend: Option<BackendId>) -> String {
        backend.map(|b| b.to_string()).unwrap_or_default()
    }

    fn start(&self, prefix: &str, message: String) {
        let Ok(mut slot) = self.spinner.lock() else {
            return;
        };
        let spinner = slot.get_or_insert_with(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        spinner.set_prefix(prefix.to_string());
        spinner.set_message(message);
    }

    fn finish(&self, message: String) {
        if let Ok(mut slot) = self.spinner.lock()
            && let Some(pb) = slot.take()
        {
            pb.finish_with_message(message);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisProgressNotifier for ProgressReporter {
    fn on_phase(&self, phase: AnalysisPhase, backend: Option<BackendId>) {
        match phase {
            AnalysisPhase::Idle => {}
            AnalysisPhase::CallingPrimary => self.start(
                "Analyzing",
                format!("asking {}...", Self::backend_name(backend)),
            ),
            AnalysisPhase::CallingFallback => self.start(
                "Fallback",
                format!("primary failed, asking {}...", Self::backend_name(backend)),
            ),
            AnalysisPhase::Success => self.finish(format!(
                "{} answered by {}",
                "done".green(),
                Self::backend_name(backend)
            )),
            AnalysisPhase::Failed => self.finish(format!("{}", "no backend could answer".red())),
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl AnalysisProgressNotifier for SimpleProgress {
    fn on_phase(&self, phase: AnalysisPhase, backend: Option<BackendId>) {
        let backend = ProgressReporter::backend_name(backend);
        match phase {
            AnalysisPhase::Idle => {}
            AnalysisPhase::CallingPrimary => {
                eprintln!("{} Calling {}", "->".cyan(), backend.bold())
            }
            AnalysisPhase::CallingFallback => {
                eprintln!("{} Falling back to {}", "->".yellow(), backend.bold())
            }
            AnalysisPhase::Success => eprintln!("  {} {}", "v".green(), backend),
            AnalysisPhase::Failed => eprintln!("  {} all backends failed", "x".red()),
        }
    }
}
