//! Terminal rendering of bootstrap progress.

use indicatif::ProgressBar;
use parking_lot::Mutex;

use super::output;
use crate::domain::{Stage, Warning};
use crate::port::ProgressReporter;

struct Running {
    stage: Stage,
    pb: ProgressBar,
    warned: bool,
    skipped: Option<String>,
}

/// One spinner per running stage, finished with ✓ or ⚠.
#[derive(Default)]
pub struct SpinnerReporter {
    current: Mutex<Option<Running>>,
}

impl SpinnerReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop whatever spinner is running, marking it failed.
    pub fn abort(&self, message: &str) {
        if let Some(running) = self.current.lock().take() {
            output::spinner_fail(&running.pb, message);
        }
    }
}

fn describe(stage: Stage) -> &'static str {
    match stage {
        Stage::CheckingPrereqs => "Checking required tools",
        Stage::PreparingInference => "Preparing inference runtime",
        Stage::TearingDown => "Removing previous release",
        Stage::Deploying => "Deploying release",
        Stage::WaitingForPods => "Waiting for search service",
        Stage::WaitingForJob => "Waiting for key job",
        Stage::ExtractingCredentials => "Extracting API keys",
        Stage::WritingEnvironment => "Writing environment bundle",
        Stage::Done => "Done",
    }
}

impl ProgressReporter for SpinnerReporter {
    fn stage_started(&self, stage: Stage) {
        *self.current.lock() = Some(Running {
            stage,
            pb: output::spinner(describe(stage)),
            warned: false,
            skipped: None,
        });
    }

    fn stage_finished(&self, stage: Stage) {
        let Some(running) = self.current.lock().take() else {
            return;
        };
        debug_assert_eq!(running.stage, stage);
        let label = describe(stage);
        match (&running.skipped, running.warned) {
            (Some(reason), _) => {
                let message = format!("{label} {}", output::muted(format!("(skipped: {reason})")));
                output::spinner_success(&running.pb, &message);
            }
            (None, true) => output::spinner_warn(&running.pb, label),
            (None, false) => output::spinner_success(&running.pb, label),
        }
    }

    fn stage_skipped(&self, _stage: Stage, reason: &str) {
        if let Some(running) = self.current.lock().as_mut() {
            running.skipped = Some(reason.to_string());
        }
    }

    fn warning(&self, warning: &Warning) {
        let mut current = self.current.lock();
        if let Some(running) = current.as_mut() {
            running.warned = true;
            running.pb.suspend(|| output::warning(&warning.message));
        } else {
            output::warning(&warning.message);
        }
    }
}
