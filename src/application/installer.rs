//! Local inference runtime installer.
//!
//! Makes sure the runtime binary exists, a server is listening on the
//! configured port, and the required models are present. The server is
//! started detached: the bootstrap never owns or joins it, it only polls the
//! health endpoint.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::poll::{wait_until, Readiness};
use crate::domain::{DeploymentTarget, ServiceEndpoint};
use crate::error::{Error, Result};
use crate::port::{HostSystem, InferenceService};

/// Outcome of [`LocalServiceInstaller::ensure_installed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    AlreadyInstalled,
    Installed,
}

/// Outcome of [`LocalServiceInstaller::ensure_running`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    AlreadyRunning,
    Started(Readiness),
}

/// Outcome of [`LocalServiceInstaller::ensure_model_pulled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOutcome {
    Present,
    Pulled,
}

pub struct LocalServiceInstaller {
    host: Arc<dyn HostSystem>,
    inference: Arc<dyn InferenceService>,
}

impl LocalServiceInstaller {
    #[must_use]
    pub fn new(host: Arc<dyn HostSystem>, inference: Arc<dyn InferenceService>) -> Self {
        Self { host, inference }
    }

    /// Install `binary` with `installer` unless it is already on `PATH`.
    ///
    /// # Errors
    ///
    /// [`Error::PrereqMissing`] when the installer's own program is missing,
    /// [`Error::Install`] when the install command fails or the binary is
    /// still missing afterwards.
    pub async fn ensure_installed(&self, binary: &str, installer: &[String]) -> Result<InstallOutcome> {
        if self.host.has_executable(binary) {
            debug!(binary, "Already installed");
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let Some(package_manager) = installer.first() else {
            return Err(Error::PrereqMissing {
                tool: binary.to_string(),
                hint: "no install command configured".to_string(),
            });
        };
        if !self.host.has_executable(package_manager) {
            return Err(Error::PrereqMissing {
                tool: package_manager.clone(),
                hint: format!("needed to install {binary}"),
            });
        }

        info!(binary, command = %installer.join(" "), "Installing");
        self.host.run(installer).await.map_err(|e| Error::Install {
            binary: binary.to_string(),
            reason: e.to_string(),
        })?;

        if !self.host.has_executable(binary) {
            return Err(Error::Install {
                binary: binary.to_string(),
                reason: "install command succeeded but binary is not on PATH".to_string(),
            });
        }
        Ok(InstallOutcome::Installed)
    }

    /// Start the server unless something already listens on the target port.
    ///
    /// The server's bind address is passed as `<BINARY>_HOST=127.0.0.1:<port>`
    /// in its environment (`OLLAMA_HOST` for the default runtime).
    ///
    /// # Errors
    ///
    /// [`Error::Command`] if the process cannot be spawned, or
    /// [`Error::ReadinessTimeout`] if the health endpoint never answers.
    pub async fn ensure_running(
        &self,
        target: &DeploymentTarget,
        start_command: &[String],
    ) -> Result<RunOutcome> {
        if self.host.port_open(target.port()).await {
            info!(service = target.name(), port = target.port(), "Already running");
            return Ok(RunOutcome::AlreadyRunning);
        }

        let env = vec![(
            format!("{}_HOST", target.name().to_ascii_uppercase()),
            format!("127.0.0.1:{}", target.port()),
        )];
        info!(service = target.name(), command = %start_command.join(" "), "Starting in background");
        self.host.spawn_detached(start_command, &env)?;

        let endpoint = ServiceEndpoint::local(target.port());
        let readiness = self.wait_healthy(target, &endpoint).await;
        match readiness {
            Readiness::Ready { .. } => Ok(RunOutcome::Started(readiness)),
            Readiness::TimedOut { elapsed, .. } => Err(Error::ReadinessTimeout {
                what: format!("{} health at {}", target.name(), endpoint.join(target.health_path())),
                waited: elapsed,
            }),
        }
    }

    /// Poll the target's health endpoint with its own interval and timeout.
    pub async fn wait_healthy(&self, target: &DeploymentTarget, endpoint: &ServiceEndpoint) -> Readiness {
        let inference = Arc::clone(&self.inference);
        wait_until(
            || {
                let inference = Arc::clone(&inference);
                let endpoint = endpoint.clone();
                async move { inference.is_healthy(&endpoint).await }
            },
            target.poll_interval(),
            target.readiness_timeout(),
        )
        .await
    }

    /// Pull `model` unless it is already listed.
    ///
    /// # Errors
    ///
    /// [`Error::ModelPull`] when listing or pulling fails; a partially
    /// pulled model is never accepted.
    pub async fn ensure_model_pulled(&self, port: u16, model: &str) -> Result<ModelOutcome> {
        let endpoint = ServiceEndpoint::local(port);
        let models = self
            .inference
            .list_models(&endpoint)
            .await
            .map_err(|e| Error::ModelPull {
                model: model.to_string(),
                reason: format!("cannot list models: {e}"),
            })?;

        if models.iter().any(|m| model_matches(m, model)) {
            debug!(model, "Model present");
            return Ok(ModelOutcome::Present);
        }

        info!(model, "Pulling model");
        self.inference
            .pull_model(&endpoint, model)
            .await
            .map_err(|e| match e {
                Error::ModelPull { .. } => e,
                other => Error::ModelPull {
                    model: model.to_string(),
                    reason: other.to_string(),
                },
            })?;
        Ok(ModelOutcome::Pulled)
    }
}

/// `listed` names `wanted`, with `:latest` implied when no tag is given.
fn model_matches(listed: &str, wanted: &str) -> bool {
    if listed == wanted {
        return true;
    }
    !wanted.contains(':') && listed.strip_suffix(":latest") == Some(wanted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::testkit::fakes::{FakeHost, FakeInference};

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| (*p).to_string()).collect()
    }

    fn target() -> DeploymentTarget {
        DeploymentTarget::host("ollama", 11435)
            .with_health_path("/api/tags")
            .with_readiness(Duration::from_secs(2), Duration::from_millis(100))
    }

    #[test]
    fn model_name_matching() {
        assert!(model_matches("llama3.2", "llama3.2"));
        assert!(model_matches("llama3.2:latest", "llama3.2"));
        assert!(!model_matches("llama3.2:1b", "llama3.2"));
        assert!(!model_matches("llama3.2:latest", "llama3.2:1b"));
        assert!(!model_matches("llama3", "llama3.2"));
    }

    #[tokio::test]
    async fn installed_binary_is_left_alone() {
        let host = Arc::new(FakeHost::with_executables(&["ollama"]));
        let installer = LocalServiceInstaller::new(host.clone(), Arc::new(FakeInference::new()));
        let outcome = installer
            .ensure_installed("ollama", &argv(&["brew", "install", "ollama"]))
            .await
            .unwrap();
        assert_eq!(outcome, InstallOutcome::AlreadyInstalled);
        assert!(host.ran().is_empty());
    }

    #[tokio::test]
    async fn missing_package_manager_is_a_prereq_error() {
        let host = Arc::new(FakeHost::new());
        let installer = LocalServiceInstaller::new(host, Arc::new(FakeInference::new()));
        let err = installer
            .ensure_installed("ollama", &argv(&["brew", "install", "ollama"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PrereqMissing { ref tool, .. } if tool == "brew"));
    }

    #[tokio::test]
    async fn failing_install_command_is_fatal() {
        let host = Arc::new(FakeHost::with_executables(&["brew"]));
        host.fail_command("brew");
        let installer = LocalServiceInstaller::new(host, Arc::new(FakeInference::new()));
        let err = installer
            .ensure_installed("ollama", &argv(&["brew", "install", "ollama"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Install { .. }));
    }

    #[tokio::test]
    async fn open_port_means_already_running() {
        let host = Arc::new(FakeHost::new());
        host.open_port(11435);
        let installer = LocalServiceInstaller::new(host.clone(), Arc::new(FakeInference::new()));
        let outcome = installer
            .ensure_running(&target(), &argv(&["ollama", "serve"]))
            .await
            .unwrap();
        assert_eq!(outcome, RunOutcome::AlreadyRunning);
        assert!(host.spawned().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn starts_and_waits_for_health() {
        let host = Arc::new(FakeHost::new());
        let installer = LocalServiceInstaller::new(host.clone(), Arc::new(FakeInference::new()));
        let outcome = installer
            .ensure_running(&target(), &argv(&["ollama", "serve"]))
            .await
            .unwrap();
        assert!(matches!(outcome, RunOutcome::Started(r) if r.is_ready()));
        assert_eq!(host.spawned(), vec![argv(&["ollama", "serve"])]);
    }

    #[tokio::test(start_paused = true)]
    async fn unhealthy_server_times_out() {
        let inference = Arc::new(FakeInference::new());
        inference.set_healthy(false);
        let installer = LocalServiceInstaller::new(Arc::new(FakeHost::new()), inference);
        let err = installer
            .ensure_running(&target(), &argv(&["ollama", "serve"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ReadinessTimeout { .. }));
    }

    #[tokio::test]
    async fn listed_model_is_not_pulled() {
        let inference = Arc::new(FakeInference::with_models(&["llama3.2:latest"]));
        let installer = LocalServiceInstaller::new(Arc::new(FakeHost::new()), inference.clone());
        let outcome = installer.ensure_model_pulled(11435, "llama3.2").await.unwrap();
        assert_eq!(outcome, ModelOutcome::Present);
        assert!(inference.pulls().is_empty());
    }

    #[tokio::test]
    async fn missing_model_is_pulled() {
        let inference = Arc::new(FakeInference::new());
        let installer = LocalServiceInstaller::new(Arc::new(FakeHost::new()), inference.clone());
        let outcome = installer.ensure_model_pulled(11435, "all-minilm").await.unwrap();
        assert_eq!(outcome, ModelOutcome::Pulled);
        assert_eq!(inference.pulls(), vec!["all-minilm".to_string()]);
    }

    #[tokio::test]
    async fn failed_pull_is_fatal() {
        let inference = Arc::new(FakeInference::new());
        inference.fail_pull("disk full");
        let installer = LocalServiceInstaller::new(Arc::new(FakeHost::new()), inference);
        let err = installer.ensure_model_pulled(11435, "llama3.2").await.unwrap_err();
        assert!(matches!(err, Error::ModelPull { ref reason, .. } if reason == "disk full"));
    }
}
