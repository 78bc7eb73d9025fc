//! Bootstrap stages and run outcomes.

use std::fmt;

use crate::error::Error;

/// Ordered stages of a bootstrap run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    CheckingPrereqs,
    PreparingInference,
    TearingDown,
    Deploying,
    WaitingForPods,
    WaitingForJob,
    ExtractingCredentials,
    WritingEnvironment,
    Done,
}

impl Stage {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Stage::CheckingPrereqs => "prereqs",
            Stage::PreparingInference => "inference",
            Stage::TearingDown => "teardown",
            Stage::Deploying => "deploy",
            Stage::WaitingForPods => "pods",
            Stage::WaitingForJob => "job",
            Stage::ExtractingCredentials => "credentials",
            Stage::WritingEnvironment => "environment",
            Stage::Done => "done",
        }
    }

    /// Stage that follows this one, `None` after `Done`.
    #[must_use]
    pub const fn next(self) -> Option<Stage> {
        match self {
            Stage::CheckingPrereqs => Some(Stage::PreparingInference),
            Stage::PreparingInference => Some(Stage::TearingDown),
            Stage::TearingDown => Some(Stage::Deploying),
            Stage::Deploying => Some(Stage::WaitingForPods),
            Stage::WaitingForPods => Some(Stage::WaitingForJob),
            Stage::WaitingForJob => Some(Stage::ExtractingCredentials),
            Stage::ExtractingCredentials => Some(Stage::WritingEnvironment),
            Stage::WritingEnvironment => Some(Stage::Done),
            Stage::Done => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A non-fatal problem recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub stage: Stage,
    pub message: String,
}

/// Terminal failure of a run: the stage it stopped in and why.
#[derive(Debug, thiserror::Error)]
#[error("bootstrap failed during {stage}: {cause}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub cause: Error,
}
