//! Progress reporting port for bootstrap runs.
//!
//! The driver announces every stage transition and every degradation
//! through this trait; the CLI renders them for the operator.

use tracing::{info, warn};

use crate::domain::{Stage, Warning};

/// Receives stage-labeled progress events from a bootstrap run.
pub trait ProgressReporter: Send + Sync {
    /// A stage is about to run.
    fn stage_started(&self, stage: Stage);

    /// A stage finished, with or without warnings.
    fn stage_finished(&self, stage: Stage);

    /// A stage was skipped by request.
    fn stage_skipped(&self, stage: Stage, reason: &str);

    /// A non-fatal problem was recorded.
    fn warning(&self, warning: &Warning);
}

/// Reporter that only logs.
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn stage_started(&self, stage: Stage) {
        info!(stage = %stage, "Stage started");
    }

    fn stage_finished(&self, stage: Stage) {
        info!(stage = %stage, "Stage finished");
    }

    fn stage_skipped(&self, stage: Stage, reason: &str) {
        info!(stage = %stage, reason, "Stage skipped");
    }

    fn warning(&self, warning: &Warning) {
        warn!(stage = %warning.stage, message = %warning.message, "Degraded");
    }
}
