//! Progress reporting for generation runs

use appforge_application::ports::progress::ProgressNotifier;
use appforge_domain::{AgentRole, PhaseStep};
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports progress with an overall bar plus one bar per phase
pub struct ProgressReporter {
    multi: MultiProgress,
    overall: ProgressBar,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(100));
        overall.set_style(Self::overall_style());
        overall.set_prefix("appforge");

        Self {
            multi,
            overall,
            phase_bar: Mutex::new(None),
        }
    }

    fn overall_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("  {spinner:.green} {prefix:.bold} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    fn phase_display_name(step: PhaseStep) -> String {
        format!("Phase {}: {}", step.index() + 1, step.label())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_phase_start(&self, step: PhaseStep, progress: u8, total_tasks: usize) {
        self.overall.set_position(u64::from(progress));
        self.overall.set_message(step.label().to_string());

        let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
        pb.set_style(Self::phase_style());
        pb.set_prefix(Self::phase_display_name(step));
        pb.set_message("Starting...");

        if let Ok(mut slot) = self.phase_bar.lock() {
            *slot = Some(pb);
        }
    }

    fn on_task_complete(&self, _step: PhaseStep, role: AgentRole, success: bool) {
        if let Ok(slot) = self.phase_bar.lock()
            && let Some(pb) = slot.as_ref()
        {
            let status = if success {
                format!("{} {}", "v".green(), role)
            } else {
                format!("{} {}", "x".red(), role)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_phase_complete(&self, _step: PhaseStep, confidence: f64) {
        if let Ok(mut slot) = self.phase_bar.lock()
            && let Some(pb) = slot.take()
        {
            pb.finish_with_message(format!(
                "{} (confidence {:.2})",
                "done".green(),
                confidence
            ));
        }
    }

    fn on_finished(&self, success: bool, message: &str) {
        if let Ok(mut slot) = self.phase_bar.lock()
            && let Some(pb) = slot.take()
        {
            pb.abandon();
        }
        if success {
            self.overall.set_position(100);
            self.overall
                .finish_with_message(format!("{}", "completed".green().bold()));
        } else {
            self.overall
                .abandon_with_message(format!("{} {}", "failed:".red().bold(), message));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_phase_start(&self, step: PhaseStep, progress: u8, total_tasks: usize) {
        println!(
            "{} {} [{}%] ({} tasks)",
            "->".cyan(),
            ProgressReporter::phase_display_name(step).bold(),
            progress,
            total_tasks
        );
    }

    fn on_task_complete(&self, _step: PhaseStep, role: AgentRole, success: bool) {
        if success {
            println!("  {} {}", "v".green(), role);
        } else {
            println!("  {} {} (failed)", "x".red(), role);
        }
    }

    fn on_phase_complete(&self, _step: PhaseStep, confidence: f64) {
        println!("  {} confidence {:.2}", "=".dimmed(), confidence);
    }

    fn on_finished(&self, success: bool, message: &str) {
        if success {
            println!("{} {}", "Completed:".green().bold(), message);
        } else {
            println!("{} {}", "Failed:".red().bold(), message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display_name() {
        assert_eq!(
            ProgressReporter::phase_display_name(PhaseStep::Analysis),
            "Phase 1: Analyzing requirements"
        );
        assert_eq!(
            ProgressReporter::phase_display_name(PhaseStep::Completion),
            "Phase 9: Generation completed"
        );
    }

    #[test]
    fn test_reporter_tolerates_any_callback_order() {
        let reporter = ProgressReporter::new();
        reporter.on_task_complete(PhaseStep::Design, AgentRole::ArchitectureDesigner, true);
        reporter.on_phase_complete(PhaseStep::Design, 1.0);
        reporter.on_phase_start(PhaseStep::ComponentGeneration, 40, 3);
        reporter.on_task_complete(
            PhaseStep::ComponentGeneration,
            AgentRole::FrontendDeveloper,
            false,
        );
        reporter.on_finished(false, "Generation failed: every model call failed");
        assert!(reporter.phase_bar.lock().unwrap().is_none());
    }
}
