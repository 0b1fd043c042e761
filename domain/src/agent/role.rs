//! Agent role value object

use crate::aggregation::ResponseType;
use serde::{Deserialize, Serialize};

/// Role a model plays for one task in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    RequirementsAnalyst,
    ArchitectureDesigner,
    FrontendDeveloper,
    BackendDeveloper,
    DatabaseDesigner,
    SecuritySpecialist,
    TestingEngineer,
    PerformanceOptimizer,
    DeploymentEngineer,
    QualityAssurance,
    /// Ad-hoc generation outside the fixed pipeline
    Generalist,
}

impl AgentRole {
    pub const ALL: [AgentRole; 11] = [
        AgentRole::RequirementsAnalyst,
        AgentRole::ArchitectureDesigner,
        AgentRole::FrontendDeveloper,
        AgentRole::BackendDeveloper,
        AgentRole::DatabaseDesigner,
        AgentRole::SecuritySpecialist,
        AgentRole::TestingEngineer,
        AgentRole::PerformanceOptimizer,
        AgentRole::DeploymentEngineer,
        AgentRole::QualityAssurance,
        AgentRole::Generalist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::RequirementsAnalyst => "requirements_analyst",
            AgentRole::ArchitectureDesigner => "architecture_designer",
            AgentRole::FrontendDeveloper => "frontend_developer",
            AgentRole::BackendDeveloper => "backend_developer",
            AgentRole::DatabaseDesigner => "database_designer",
            AgentRole::SecuritySpecialist => "security_specialist",
            AgentRole::TestingEngineer => "testing_engineer",
            AgentRole::PerformanceOptimizer => "performance_optimizer",
            AgentRole::DeploymentEngineer => "deployment_engineer",
            AgentRole::QualityAssurance => "quality_assurance",
            AgentRole::Generalist => "generalist",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentRole::RequirementsAnalyst => "Requirements Analyst",
            AgentRole::ArchitectureDesigner => "Architecture Designer",
            AgentRole::FrontendDeveloper => "Frontend Developer",
            AgentRole::BackendDeveloper => "Backend Developer",
            AgentRole::DatabaseDesigner => "Database Designer",
            AgentRole::SecuritySpecialist => "Security Specialist",
            AgentRole::TestingEngineer => "Testing Engineer",
            AgentRole::PerformanceOptimizer => "Performance Optimizer",
            AgentRole::DeploymentEngineer => "Deployment Engineer",
            AgentRole::QualityAssurance => "Quality Assurance",
            AgentRole::Generalist => "Generalist",
        }
    }

    /// Importance weight used when merging responses.
    ///
    /// Security and QA outrank everything else; plain generation is lowest.
    pub fn importance(&self) -> f64 {
        match self {
            AgentRole::SecuritySpecialist => 1.3,
            AgentRole::ArchitectureDesigner | AgentRole::QualityAssurance => 1.2,
            AgentRole::TestingEngineer => 1.1,
            _ => 1.0,
        }
    }

    /// Capability terms appended to the task description for model selection
    pub fn capability_hint(&self) -> &'static str {
        match self {
            AgentRole::RequirementsAnalyst => "analysis research natural_language",
            AgentRole::ArchitectureDesigner => "complex_reasoning analysis long_context",
            AgentRole::FrontendDeveloper => "code_generation creativity",
            AgentRole::BackendDeveloper => "code_generation complex_reasoning",
            AgentRole::DatabaseDesigner => "code_generation analysis",
            AgentRole::SecuritySpecialist => "analysis debugging complex_reasoning",
            AgentRole::TestingEngineer => "code_generation debugging",
            AgentRole::PerformanceOptimizer => "optimization code_generation",
            AgentRole::DeploymentEngineer => "general_understanding code_generation",
            AgentRole::QualityAssurance => "analysis debugging",
            AgentRole::Generalist => "general_understanding",
        }
    }

    /// Response type a plain-text answer from this role is tagged with
    pub fn expected_response_type(&self) -> ResponseType {
        match self {
            AgentRole::FrontendDeveloper
            | AgentRole::BackendDeveloper
            | AgentRole::DatabaseDesigner
            | AgentRole::TestingEngineer
            | AgentRole::PerformanceOptimizer => ResponseType::Code,
            _ => ResponseType::Text,
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
