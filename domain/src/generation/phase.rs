//! Pipeline phase table and progress checkpoints

use super::value_objects::GenerationStatus;
use crate::agent::AgentRole;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// One ordered step of the generation pipeline.
///
/// Several steps share a [`GenerationStatus`]: security hardening still
/// reports `generating`, QA still reports `optimizing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStep {
    Analysis,
    Design,
    ComponentGeneration,
    Security,
    Testing,
    Optimization,
    QualityAssurance,
    DeploymentPrep,
    Completion,
}

impl PhaseStep {
    pub const ALL: [PhaseStep; 9] = [
        PhaseStep::Analysis,
        PhaseStep::Design,
        PhaseStep::ComponentGeneration,
        PhaseStep::Security,
        PhaseStep::Testing,
        PhaseStep::Optimization,
        PhaseStep::QualityAssurance,
        PhaseStep::DeploymentPrep,
        PhaseStep::Completion,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStep::Analysis => "analysis",
            PhaseStep::Design => "design",
            PhaseStep::ComponentGeneration => "component_generation",
            PhaseStep::Security => "security",
            PhaseStep::Testing => "testing",
            PhaseStep::Optimization => "optimization",
            PhaseStep::QualityAssurance => "quality_assurance",
            PhaseStep::DeploymentPrep => "deployment_prep",
            PhaseStep::Completion => "completion",
        }
    }

    /// Human label shown as `current_step`
    pub fn label(&self) -> &'static str {
        match self {
            PhaseStep::Analysis => "Analyzing requirements",
            PhaseStep::Design => "Designing architecture",
            PhaseStep::ComponentGeneration => "Generating components",
            PhaseStep::Security => "Implementing security",
            PhaseStep::Testing => "Running tests",
            PhaseStep::Optimization => "Optimizing performance",
            PhaseStep::QualityAssurance => "Quality assurance",
            PhaseStep::DeploymentPrep => "Preparing deployment",
            PhaseStep::Completion => "Generation completed",
        }
    }

    pub fn status(&self) -> GenerationStatus {
        match self {
            PhaseStep::Analysis => GenerationStatus::Analyzing,
            PhaseStep::Design => GenerationStatus::Designing,
            PhaseStep::ComponentGeneration | PhaseStep::Security => GenerationStatus::Generating,
            PhaseStep::Testing => GenerationStatus::Testing,
            PhaseStep::Optimization | PhaseStep::QualityAssurance => GenerationStatus::Optimizing,
            PhaseStep::DeploymentPrep => GenerationStatus::Deploying,
            PhaseStep::Completion => GenerationStatus::Completed,
        }
    }

    /// Agent roles that run during this step
    pub fn roles(&self) -> &'static [AgentRole] {
        match self {
            PhaseStep::Analysis => &[AgentRole::RequirementsAnalyst],
            PhaseStep::Design => &[AgentRole::ArchitectureDesigner],
            PhaseStep::ComponentGeneration => &[
                AgentRole::FrontendDeveloper,
                AgentRole::BackendDeveloper,
                AgentRole::DatabaseDesigner,
            ],
            PhaseStep::Security => &[AgentRole::SecuritySpecialist],
            PhaseStep::Testing => &[AgentRole::TestingEngineer],
            PhaseStep::Optimization => &[AgentRole::PerformanceOptimizer],
            PhaseStep::QualityAssurance => &[AgentRole::QualityAssurance],
            PhaseStep::DeploymentPrep => &[AgentRole::DeploymentEngineer],
            PhaseStep::Completion => &[],
        }
    }

    pub fn next(&self) -> Option<PhaseStep> {
        PhaseStep::ALL.get(self.index() + 1).copied()
    }
}

impl std::fmt::Display for PhaseStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Progress value reached on entering each [`PhaseStep`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct PhaseCheckpoints([u8; 9]);

impl Default for PhaseCheckpoints {
    fn default() -> Self {
        Self([10, 20, 40, 60, 70, 80, 90, 95, 100])
    }
}

impl PhaseCheckpoints {
    /// Checkpoints must be strictly increasing, at most 100, and end at 100.
    pub fn new(values: [u8; 9]) -> Result<Self, DomainError> {
        if values.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DomainError::InvalidConfig(format!(
                "checkpoints must be strictly increasing: {:?}",
                values
            )));
        }
        if values[8] != 100 {
            return Err(DomainError::InvalidConfig(format!(
                "final checkpoint must be 100, got {}",
                values[8]
            )));
        }
        Ok(Self(values))
    }

    pub fn for_step(&self, step: PhaseStep) -> u8 {
        self.0[step.index()]
    }

    pub fn values(&self) -> [u8; 9] {
        self.0
    }
}

impl TryFrom<Vec<u8>> for PhaseCheckpoints {
    type Error = DomainError;

    fn try_from(values: Vec<u8>) -> Result<Self, Self::Error> {
        let count = values.len();
        let array: [u8; 9] = values.try_into().map_err(|_| {
            DomainError::InvalidConfig(format!("expected 9 checkpoints, got {}", count))
        })?;
        Self::new(array)
    }
}

impl From<PhaseCheckpoints> for Vec<u8> {
    fn from(checkpoints: PhaseCheckpoints) -> Self {
        checkpoints.0.to_vec()
    }
}
