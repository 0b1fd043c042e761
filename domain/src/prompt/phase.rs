//! Role prompts for the generation pipeline

use crate::agent::AgentRole;
use crate::aggregation::ResponseType;
use crate::generation::{GenerationRequest, PhaseStep};
use serde_json::Value;

/// Maximum characters of one prior-phase output carried into a prompt
const CONTEXT_CLIP: usize = 4_000;

/// Clip `s` to at most `max_chars` characters, marking the cut with `...`
pub fn clip(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Templates for the prompts sent to each role
pub struct PhasePromptTemplate;

impl PhasePromptTemplate {
    /// Phases whose output is shown to `role`
    pub fn context_steps(role: AgentRole) -> &'static [PhaseStep] {
        match role {
            AgentRole::RequirementsAnalyst | AgentRole::Generalist => &[],
            AgentRole::ArchitectureDesigner => &[PhaseStep::Analysis],
            AgentRole::FrontendDeveloper
            | AgentRole::BackendDeveloper
            | AgentRole::DatabaseDesigner => &[PhaseStep::Analysis, PhaseStep::Design],
            AgentRole::SecuritySpecialist
            | AgentRole::TestingEngineer
            | AgentRole::PerformanceOptimizer => &[PhaseStep::Design],
            AgentRole::QualityAssurance => &[
                PhaseStep::Analysis,
                PhaseStep::Security,
                PhaseStep::Testing,
                PhaseStep::Optimization,
            ],
            AgentRole::DeploymentEngineer => &[PhaseStep::Design, PhaseStep::QualityAssurance],
        }
    }

    /// Whether generated components are included in the prompt for `role`
    fn sees_components(role: AgentRole) -> bool {
        matches!(
            role,
            AgentRole::SecuritySpecialist
                | AgentRole::TestingEngineer
                | AgentRole::PerformanceOptimizer
                | AgentRole::QualityAssurance
                | AgentRole::DeploymentEngineer
        )
    }

    fn objective(role: AgentRole) -> &'static str {
        match role {
            AgentRole::RequirementsAnalyst => {
                "Extract functional and non-functional requirements, user stories and constraints"
            }
            AgentRole::ArchitectureDesigner => {
                "Design the system architecture: components, data flow, APIs and technology choices"
            }
            AgentRole::FrontendDeveloper => "Generate the frontend components",
            AgentRole::BackendDeveloper => "Generate the backend services and API handlers",
            AgentRole::DatabaseDesigner => "Generate the database schema and migrations",
            AgentRole::SecuritySpecialist => {
                "Review the generated components for vulnerabilities and propose hardening"
            }
            AgentRole::TestingEngineer => "Write automated tests for the generated components",
            AgentRole::PerformanceOptimizer => {
                "Identify performance bottlenecks and propose code optimizations"
            }
            AgentRole::QualityAssurance => {
                "Assess overall quality and list remaining defects before release"
            }
            AgentRole::DeploymentEngineer => {
                "Produce the deployment configuration: build steps, environment and hosting"
            }
            AgentRole::Generalist => "Answer the request",
        }
    }

    /// System prompt for `role`
    pub fn system(role: AgentRole) -> String {
        let format_hint = if role.expected_response_type() == ResponseType::Code {
            "Respond with code only. When producing several files, respond with a JSON object mapping file paths to file contents."
        } else {
            "Respond in concise prose or a JSON object when the answer is structured."
        };

        format!(
            "You are the {} of a software generation team.\n{}.\n{}",
            role.display_name(),
            Self::objective(role),
            format_hint
        )
    }

    /// Short description used to select models for `role`.
    ///
    /// Mixes the user's prompt with the role's capability terms so both the
    /// request and the kind of work drive the capability match.
    pub fn task_description(role: AgentRole, request: &GenerationRequest) -> String {
        format!(
            "{} {} {}",
            Self::objective(role),
            request.prompt(),
            role.capability_hint()
        )
    }

    /// User prompt for `role`, including prior phase context
    pub fn user(role: AgentRole, request: &GenerationRequest) -> String {
        let mut prompt = format!(
            "## Request\n\n{}\n\n## Project\n\n- Type: {}\n- Tech stack: {}\n",
            request.prompt(),
            if request.project_type().is_empty() {
                "unspecified"
            } else {
                request.project_type()
            },
            if request.tech_stack().is_empty() {
                "unspecified".to_string()
            } else {
                request.tech_stack().join(", ")
            }
        );

        for step in Self::context_steps(role) {
            if let Some(output) = request.output(*step) {
                prompt.push_str(&format!(
                    "\n## {} output\n\n{}\n",
                    step.label(),
                    clip(&render(output), CONTEXT_CLIP)
                ));
            }
        }

        if Self::sees_components(role) && !request.components().is_empty() {
            prompt.push_str("\n## Generated components\n");
            for component in request.components() {
                prompt.push_str(&format!(
                    "\n### {}\n\n{}\n",
                    component.kind,
                    clip(&render(&component.content), CONTEXT_CLIP)
                ));
            }
        }

        prompt.push_str(&format!("\n## Task\n\n{}.\n", Self::objective(role)));
        prompt
    }
}
