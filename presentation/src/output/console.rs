//! Console output formatter for generation reports

use crate::output::formatter::OutputFormatter;
use appforge_domain::{
    GeneratedComponent, GenerationStatus, GenerationStatusReport, Model, TaskStatus,
};
use colored::{ColoredString, Colorize};
use serde_json::Value;

/// One row of the usage table
#[derive(Debug, Clone, PartialEq)]
pub struct UsageLine {
    pub model: Model,
    pub calls: u32,
    pub tokens: u64,
    pub cost: f64,
}

/// Formats generation reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete report
    pub fn format(report: &GenerationStatusReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Generation Report"));
        output.push('\n');
        output.push_str(&Self::summary_lines(report));

        if !report.tasks.is_empty() {
            output.push_str(&Self::section_header("Agent Tasks"));
            for task in &report.tasks {
                let models = task
                    .models
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let duration = task
                    .duration()
                    .map(|d| format!(" {:.1}s", d.num_milliseconds() as f64 / 1000.0))
                    .unwrap_or_default();

                output.push_str(&format!(
                    "  {} {:<24} {}{}\n",
                    Self::task_marker(task.status),
                    task.role.display_name(),
                    models.dimmed(),
                    duration
                ));
                if let Some(error) = &task.error {
                    output.push_str(&format!("      {}\n", error.red()));
                }
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(report: &GenerationStatusReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the status summary only
    pub fn format_summary(report: &GenerationStatusReport) -> String {
        format!(
            "{}\n\n{}",
            "=== appforge ===".cyan().bold(),
            Self::summary_lines(report)
        )
    }

    /// List generated components with their files (or a preview of the content)
    pub fn format_components(components: &[GeneratedComponent]) -> String {
        if components.is_empty() {
            return String::new();
        }

        let mut output = Self::section_header("Generated Components");
        for component in components {
            output.push_str(&format!(
                "\n{} {}\n",
                format!("── {} ──", component.kind).yellow().bold(),
                format!("confidence {:.2}", component.confidence).dimmed()
            ));
            if !component.contributors.is_empty() {
                output.push_str(&format!(
                    "  {} {}\n",
                    "by".dimmed(),
                    component.contributors.join(", ")
                ));
            }
            output.push_str(&Self::indent(&Self::preview(&component.content), "  "));
            output.push('\n');
        }
        output
    }

    /// Token usage and cost per model
    pub fn format_usage(lines: &[UsageLine]) -> String {
        let mut output = Self::section_header("Usage");
        if lines.is_empty() {
            output.push_str("  no provider calls\n");
            return output;
        }

        let mut total_tokens = 0u64;
        let mut total_cost = 0.0;
        for line in lines {
            output.push_str(&format!(
                "  {:<10} {:>4} calls {:>9} tokens  ${:.4}\n",
                line.model.as_str(),
                line.calls,
                line.tokens,
                line.cost
            ));
            total_tokens += line.tokens;
            total_cost += line.cost;
        }
        output.push_str(&format!(
            "  {:<10} {:>16} tokens  ${:.4}\n",
            "total".bold(),
            total_tokens,
            total_cost
        ));
        output
    }

    fn summary_lines(report: &GenerationStatusReport) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {}\n",
            "Request:".cyan().bold(),
            report.request_id
        ));
        output.push_str(&format!(
            "{} {} ({}%)\n",
            "Status:".cyan().bold(),
            Self::status_label(report.status),
            report.progress
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Step:".cyan().bold(),
            report.current_step
        ));
        output.push_str(&format!(
            "{} {} generated, {} tasks\n",
            "Components:".cyan().bold(),
            report.components_generated,
            report.total_components
        ));
        if let Some(eta) = report.estimated_time_remaining
            && !report.status.is_terminal()
        {
            output.push_str(&format!("{} ~{}s\n", "Remaining:".cyan().bold(), eta));
        }
        if let Some(error) = &report.error {
            output.push_str(&format!("{} {}\n", "Error:".red().bold(), error));
        }
        output
    }

    fn status_label(status: GenerationStatus) -> ColoredString {
        match status {
            GenerationStatus::Completed => status.as_str().green().bold(),
            GenerationStatus::Failed => status.as_str().red().bold(),
            _ => status.as_str().yellow(),
        }
    }

    fn task_marker(status: TaskStatus) -> ColoredString {
        match status {
            TaskStatus::Completed => "v".green(),
            TaskStatus::Failed => "x".red(),
            TaskStatus::Running => ">".yellow(),
            TaskStatus::Pending => "-".dimmed(),
        }
    }

    fn preview(content: &Value) -> String {
        match content {
            Value::Object(map) if !map.is_empty() => map
                .keys()
                .map(|k| format!("- {}", k))
                .collect::<Vec<_>>()
                .join("\n"),
            Value::String(s) => s.lines().take(5).collect::<Vec<_>>().join("\n"),
            other => other.to_string(),
        }
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

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, report: &GenerationStatusReport) -> String {
        Self::format(report)
    }

    fn format_json(&self, report: &GenerationStatusReport) -> String {
        Self::format_json(report)
    }

    fn format_summary(&self, report: &GenerationStatusReport) -> String {
        Self::format_summary(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_domain::{
        AgentRole, AgentTask, ComponentKind, GenerationRequest, PhaseCheckpoints, PhaseStep,
    };
    use chrono::Utc;
    use serde_json::json;

    fn report() -> GenerationStatusReport {
        let now = Utc::now();
        let mut request =
            GenerationRequest::new_at("u", "todo app", vec![], "web_app", now).unwrap();
        request
            .advance(
                PhaseStep::Design,
                PhaseCheckpoints::default().for_step(PhaseStep::Design),
                now,
            )
            .unwrap();

        let mut task = AgentTask::new(AgentRole::BackendDeveloper, "api", json!({}))
            .with_models(vec![Model::Codex]);
        task.fail("every model call failed", now);
        request.push_task(task);
        request.status_report(now)
    }

    #[test]
    fn test_format_contains_summary_and_tasks() {
        let output = ConsoleFormatter::format(&report());
        assert!(output.contains("Generation Report"));
        assert!(output.contains("designing"));
        assert!(output.contains("Backend Developer"));
        assert!(output.contains("codex"));
        assert!(output.contains("every model call failed"));
    }

    #[test]
    fn test_format_json_is_parseable() {
        let json = ConsoleFormatter::format_json(&report());
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "designing");
        assert_eq!(value["progress"], 20);
        assert_eq!(value["tasks"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_format_components_lists_files() {
        let components = vec![GeneratedComponent {
            kind: ComponentKind::Backend,
            content: json!({"src/main.rs": "fn main() {}", "src/lib.rs": ""}),
            contributors: vec!["codex".to_string()],
            confidence: 1.0,
        }];
        let output = ConsoleFormatter::format_components(&components);
        assert!(output.contains("backend"));
        assert!(output.contains("- src/main.rs"));
        assert!(ConsoleFormatter::format_components(&[]).is_empty());
    }

    #[test]
    fn test_format_usage_totals() {
        let output = ConsoleFormatter::format_usage(&[
            UsageLine {
                model: Model::Claude,
                calls: 2,
                tokens: 300,
                cost: 0.01,
            },
            UsageLine {
                model: Model::Codex,
                calls: 1,
                tokens: 200,
                cost: 0.02,
            },
        ]);
        assert!(output.contains("claude"));
        assert!(output.contains("500"));
        assert!(output.contains("$0.0300"));
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
