//! Output formatter trait

use appforge_domain::GenerationStatusReport;

/// Trait for formatting generation status reports
pub trait OutputFormatter {
    /// Format the complete report, including the task table
    fn format(&self, report: &GenerationStatusReport) -> String;

    /// Format as JSON
    fn format_json(&self, report: &GenerationStatusReport) -> String;

    /// Format the status summary only
    fn format_summary(&self, report: &GenerationStatusReport) -> String;
}
