//! Bootstrap driver: the top-level provisioning state machine.
//!
//! A run walks [`Stage`] from `CheckingPrereqs` to `Done`. Components below
//! the driver return typed errors; the driver alone decides whether an error
//! stops the run or degrades it, using the fixed table in [`disposition`].
//! Degradations are recorded as [`Warning`]s and the run continues, so an
//! operator gets a bundle (possibly with empty keys) whenever the cluster
//! is at all usable.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::application::credentials::{CredentialExtractor, Extraction, ExtractionPath, KeySources};
use crate::application::environment;
use crate::application::installer::LocalServiceInstaller;
use crate::application::poll::{wait_until, Readiness};
use crate::domain::{
    CredentialSet, DeploymentTarget, EnvironmentBundle, ServiceEndpoint, Stage, StageFailure,
    Warning,
};
use crate::error::{Error, Result};
use crate::port::{
    ClusterControl, HostSystem, InferenceService, Override, ProgressReporter, SearchService,
    StrayResources,
};

/// How the local inference runtime is provisioned.
#[derive(Debug, Clone)]
pub struct InferencePlan {
    pub target: DeploymentTarget,
    pub install_command: Vec<String>,
    pub start_command: Vec<String>,
    pub models: Vec<String>,
}

/// Everything a run needs to know, resolved from configuration up front.
#[derive(Debug, Clone)]
pub struct BootstrapPlan {
    pub required_tools: Vec<String>,
    pub release: String,
    pub chart: String,
    pub overrides: Vec<Override>,
    /// Applied before the release, in order.
    pub manifests: Vec<String>,
    pub stray: StrayResources,
    pub search: DeploymentTarget,
    pub job: String,
    pub job_timeout: Duration,
    pub job_poll_interval: Duration,
    pub keys: KeySources,
    /// `None` when the runtime is managed elsewhere.
    pub inference: Option<InferencePlan>,
    pub inference_endpoint: ServiceEndpoint,
    pub model: String,
    pub embedding_model: String,
    pub bundle_path: PathBuf,
    /// Dev-mode key file; `None` outside dev mode.
    pub local_key_path: Option<PathBuf>,
    pub skip_teardown: bool,
}

impl BootstrapPlan {
    /// Write the bundle for `search` and `credentials` to
    /// [`bundle_path`](Self::bundle_path). In dev mode the keys also go to the
    /// local key file.
    ///
    /// # Errors
    ///
    /// Returns the first write failure. A failed bundle write skips the key
    /// file.
    pub fn write_bundle(
        &self,
        search: &ServiceEndpoint,
        credentials: &CredentialSet,
    ) -> Result<EnvironmentBundle> {
        let bundle = EnvironmentBundle::new(
            search,
            credentials,
            &self.inference_endpoint,
            &self.model,
            &self.embedding_model,
        );
        environment::write(&bundle, &self.bundle_path)?;

        if let Some(path) = &self.local_key_path {
            environment::write(&EnvironmentBundle::credentials_only(credentials), path)?;
            debug!(path = %path.display(), "Dev-mode key file written");
        }
        Ok(bundle)
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub bundle: EnvironmentBundle,
    pub bundle_path: PathBuf,
    pub credentials_path: Option<ExtractionPath>,
    pub warnings: Vec<Warning>,
}

impl BootstrapReport {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Whether an error stops the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Fatal,
    Degrade,
}

/// The fixed error policy.
///
/// | stage                  | error                         | disposition |
/// |------------------------|-------------------------------|-------------|
/// | TearingDown            | any                           | degrade     |
/// | ExtractingCredentials  | any                           | degrade     |
/// | any                    | ReadinessTimeout              | degrade     |
/// | any                    | MissingMasterKey / Incomplete | degrade     |
/// | any                    | anything else                 | fatal       |
#[must_use]
pub fn disposition(stage: Stage, error: &Error) -> Disposition {
    match (stage, error) {
        (Stage::TearingDown | Stage::ExtractingCredentials, _) => Disposition::Degrade,
        (_, Error::ReadinessTimeout { .. } | Error::Credential(_)) => Disposition::Degrade,
        _ => Disposition::Fatal,
    }
}

/// Values produced by one stage and consumed by later ones.
#[derive(Debug, Default)]
struct RunState {
    warnings: Vec<Warning>,
    search_endpoint: Option<ServiceEndpoint>,
    credentials: CredentialSet,
    credentials_path: Option<ExtractionPath>,
}

pub struct BootstrapDriver {
    cluster: Arc<dyn ClusterControl>,
    search: Arc<dyn SearchService>,
    host: Arc<dyn HostSystem>,
    installer: LocalServiceInstaller,
    reporter: Arc<dyn ProgressReporter>,
    plan: BootstrapPlan,
}

impl BootstrapDriver {
    #[must_use]
    pub fn new(
        cluster: Arc<dyn ClusterControl>,
        search: Arc<dyn SearchService>,
        inference: Arc<dyn InferenceService>,
        host: Arc<dyn HostSystem>,
        reporter: Arc<dyn ProgressReporter>,
        plan: BootstrapPlan,
    ) -> Self {
        let installer = LocalServiceInstaller::new(Arc::clone(&host), inference);
        Self {
            cluster,
            search,
            host,
            installer,
            reporter,
            plan,
        }
    }

    #[must_use]
    pub fn plan(&self) -> &BootstrapPlan {
        &self.plan
    }

    /// Run every stage in order.
    ///
    /// # Errors
    ///
    /// Returns the stage and cause of the first fatal error.
    pub async fn run(&self) -> std::result::Result<BootstrapReport, StageFailure> {
        let mut state = RunState::default();
        let mut stage = Stage::CheckingPrereqs;

        while stage != Stage::WritingEnvironment {
            self.reporter.stage_started(stage);
            self.execute(stage, &mut state).await?;
            self.reporter.stage_finished(stage);
            stage = stage.next().unwrap_or(Stage::WritingEnvironment);
        }

        self.reporter.stage_started(stage);
        let bundle = self.write_environment(&mut state).await?;
        self.reporter.stage_finished(stage);

        info!(
            path = %self.plan.bundle_path.display(),
            warnings = state.warnings.len(),
            "Bootstrap complete"
        );

        Ok(BootstrapReport {
            bundle,
            bundle_path: self.plan.bundle_path.clone(),
            credentials_path: state.credentials_path,
            warnings: state.warnings,
        })
    }

    /// Remove the release and its stray resources without deploying.
    ///
    /// # Errors
    ///
    /// Unlike the teardown stage of [`run`](Self::run), control-plane errors
    /// are returned to the caller.
    pub async fn teardown(&self) -> Result<()> {
        self.cluster
            .teardown(&self.plan.release, &self.plan.stray)
            .await
    }

    async fn execute(
        &self,
        stage: Stage,
        state: &mut RunState,
    ) -> std::result::Result<(), StageFailure> {
        match stage {
            Stage::CheckingPrereqs => self.check_prereqs(),
            Stage::PreparingInference => self.prepare_inference(state).await,
            Stage::TearingDown => self.tear_down(state).await,
            Stage::Deploying => self.deploy(state).await,
            Stage::WaitingForPods => self.wait_for_pods(state).await,
            Stage::WaitingForJob => self.wait_for_job(state).await,
            Stage::ExtractingCredentials => self.extract_credentials(state).await,
            // The bundle stage runs last, directly from `run`.
            Stage::WritingEnvironment | Stage::Done => Ok(()),
        }
    }

    /// Apply [`disposition`] to a stage result.
    ///
    /// `Ok(None)` means the error was recorded as a warning.
    fn settle<T>(
        &self,
        stage: Stage,
        result: Result<T>,
        state: &mut RunState,
    ) -> std::result::Result<Option<T>, StageFailure> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(cause) => match disposition(stage, &cause) {
                Disposition::Fatal => Err(StageFailure { stage, cause }),
                Disposition::Degrade => {
                    warn!(stage = %stage, error = %cause, "Continuing degraded");
                    self.record_warning(stage, cause.to_string(), state);
                    Ok(None)
                }
            },
        }
    }

    fn record_warning(&self, stage: Stage, message: String, state: &mut RunState) {
        let warning = Warning { stage, message };
        self.reporter.warning(&warning);
        state.warnings.push(warning);
    }

    fn check_prereqs(&self) -> std::result::Result<(), StageFailure> {
        for tool in &self.plan.required_tools {
            if !self.host.has_executable(tool) {
                return Err(StageFailure {
                    stage: Stage::CheckingPrereqs,
                    cause: Error::PrereqMissing {
                        tool: tool.clone(),
                        hint: "install it and make sure it is on PATH".to_string(),
                    },
                });
            }
            debug!(tool = %tool, "Found");
        }
        Ok(())
    }

    async fn prepare_inference(&self, state: &mut RunState) -> std::result::Result<(), StageFailure> {
        let stage = Stage::PreparingInference;
        let Some(plan) = &self.plan.inference else {
            self.reporter
                .stage_skipped(stage, "local inference runtime not managed");
            return Ok(());
        };

        let binary = plan.target.name();
        let result = self
            .installer
            .ensure_installed(binary, &plan.install_command)
            .await;
        self.settle(stage, result, state)?;

        let result = self
            .installer
            .ensure_running(&plan.target, &plan.start_command)
            .await;
        if self.settle(stage, result, state)?.is_none() {
            let message = format!("model pulls skipped: {}", plan.models.join(", "));
            warn!(models = ?plan.models, "Runtime unhealthy, model pulls skipped");
            self.record_warning(stage, message, state);
            return Ok(());
        }

        for model in &plan.models {
            let result = self
                .installer
                .ensure_model_pulled(plan.target.port(), model)
                .await;
            self.settle(stage, result, state)?;
        }
        Ok(())
    }

    async fn tear_down(&self, state: &mut RunState) -> std::result::Result<(), StageFailure> {
        if self.plan.skip_teardown {
            self.reporter
                .stage_skipped(Stage::TearingDown, "keeping existing release");
            return Ok(());
        }
        let result = self.teardown().await;
        self.settle(Stage::TearingDown, result, state).map(|_| ())
    }

    async fn deploy(&self, state: &mut RunState) -> std::result::Result<(), StageFailure> {
        let stage = Stage::Deploying;
        for manifest in &self.plan.manifests {
            let result = self.cluster.apply_manifest(manifest).await;
            self.settle(stage, result, state)?;
        }
        let result = self
            .cluster
            .deploy(&self.plan.release, &self.plan.chart, &self.plan.overrides)
            .await;
        self.settle(stage, result, state).map(|_| ())
    }

    async fn wait_for_pods(&self, state: &mut RunState) -> std::result::Result<(), StageFailure> {
        let stage = Stage::WaitingForPods;
        let target = &self.plan.search;

        if let Some(selector) = target.selector() {
            let cluster = Arc::clone(&self.cluster);
            let readiness = wait_until(
                || {
                    let cluster = Arc::clone(&cluster);
                    let selector = selector.to_string();
                    async move {
                        cluster.pods_ready(&selector).await.unwrap_or_else(|e| {
                            debug!(error = %e, "Pod status unavailable");
                            false
                        })
                    }
                },
                target.poll_interval(),
                target.readiness_timeout(),
            )
            .await;
            let result = readiness_result(readiness, || format!("pods for '{selector}'"));
            self.settle(stage, result, state)?;
        }

        let service = target.service().unwrap_or(target.name());
        let endpoint = self
            .settle(stage, self.cluster.service_endpoint(service).await, state)?
            .unwrap_or_else(|| ServiceEndpoint::local(target.port()));
        info!(service, endpoint = %endpoint, "Endpoint resolved");

        let search = Arc::clone(&self.search);
        let readiness = wait_until(
            || {
                let search = Arc::clone(&search);
                let endpoint = endpoint.clone();
                async move { search.is_healthy(&endpoint).await }
            },
            target.poll_interval(),
            target.readiness_timeout(),
        )
        .await;
        let result = readiness_result(readiness, || {
            format!("{} health at {}", target.name(), endpoint.join(target.health_path()))
        });
        self.settle(stage, result, state)?;

        state.search_endpoint = Some(endpoint);
        Ok(())
    }

    async fn wait_for_job(&self, state: &mut RunState) -> std::result::Result<(), StageFailure> {
        let job = &self.plan.job;
        let cluster = Arc::clone(&self.cluster);
        let readiness = wait_until(
            || {
                let cluster = Arc::clone(&cluster);
                let job = job.clone();
                async move {
                    cluster.job_complete(&job).await.unwrap_or_else(|e| {
                        debug!(error = %e, "Job status unavailable");
                        false
                    })
                }
            },
            self.plan.job_poll_interval,
            self.plan.job_timeout,
        )
        .await;
        let result = readiness_result(readiness, || format!("job '{job}'"));
        self.settle(Stage::WaitingForJob, result, state)?;

        match self.cluster.job_logs(job).await {
            Ok(logs) => debug!(job = %job, logs = %logs.trim(), "Key job logs"),
            Err(e) => debug!(job = %job, error = %e, "Key job logs unavailable"),
        }
        Ok(())
    }

    async fn extract_credentials(&self, state: &mut RunState) -> std::result::Result<(), StageFailure> {
        let stage = Stage::ExtractingCredentials;
        let extractor = CredentialExtractor::new(
            Arc::clone(&self.cluster),
            Arc::clone(&self.search),
            self.plan.keys.clone(),
        );

        let Some(extraction) = self.settle(stage, extractor.extract().await, state)? else {
            return Ok(());
        };
        match extraction {
            Extraction::Complete { credentials, path } => {
                state.credentials = credentials;
                state.credentials_path = Some(path);
            }
            Extraction::Failed { cause, partial } => {
                state.credentials = partial;
                self.settle::<()>(stage, Err(cause.into()), state)?;
            }
        }
        Ok(())
    }

    async fn write_environment(
        &self,
        state: &mut RunState,
    ) -> std::result::Result<EnvironmentBundle, StageFailure> {
        let stage = Stage::WritingEnvironment;
        let search_endpoint = match state.search_endpoint.clone() {
            Some(endpoint) => endpoint,
            None => {
                let service = self.plan.search.service().unwrap_or(self.plan.search.name());
                let result = self.cluster.service_endpoint(service).await;
                self.settle(stage, result, state)?
                    .unwrap_or_else(|| ServiceEndpoint::local(self.plan.search.port()))
            }
        };

        let bundle = self
            .plan
            .write_bundle(&search_endpoint, &state.credentials)
            .map_err(|cause| StageFailure { stage, cause })?;

        let empty = bundle.empty_keys();
        if !empty.is_empty() {
            warn!(keys = ?empty, "Bundle written with empty values");
        }
        Ok(bundle)
    }
}

fn readiness_result(readiness: Readiness, what: impl FnOnce() -> String) -> Result<()> {
    match readiness {
        Readiness::Ready { attempts, elapsed } => {
            debug!(attempts, elapsed_ms = elapsed.as_millis() as u64, "Ready");
            Ok(())
        }
        Readiness::TimedOut { elapsed, .. } => Err(Error::ReadinessTimeout {
            what: what(),
            waited: elapsed,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApiKey, BundleKey};
    use crate::error::CredentialError;
    use crate::infrastructure::bootstrap::RunOptions;
    use crate::testkit::config::fast;
    use crate::testkit::harness::Harness;

    #[test]
    fn policy_table() {
        let timeout = Error::ReadinessTimeout {
            what: "pods".into(),
            waited: Duration::from_secs(1),
        };
        let deploy = Error::Deploy {
            release: "r".into(),
            reason: "x".into(),
        };
        let encoding = Error::ValueEncoding {
            key: "K".into(),
            reason: "newline".into(),
        };
        let credential = Error::Credential(CredentialError::IncompleteCredentials {
            missing: vec!["search key"],
        });
        let prereq = Error::PrereqMissing {
            tool: "helm".into(),
            hint: String::new(),
        };

        assert_eq!(disposition(Stage::WaitingForPods, &timeout), Disposition::Degrade);
        assert_eq!(disposition(Stage::WaitingForJob, &timeout), Disposition::Degrade);
        assert_eq!(disposition(Stage::TearingDown, &deploy), Disposition::Degrade);
        assert_eq!(disposition(Stage::Deploying, &deploy), Disposition::Fatal);
        assert_eq!(disposition(Stage::WritingEnvironment, &encoding), Disposition::Fatal);
        assert_eq!(
            disposition(Stage::ExtractingCredentials, &credential),
            Disposition::Degrade
        );
        assert_eq!(disposition(Stage::CheckingPrereqs, &prereq), Disposition::Fatal);
    }

    #[tokio::test(start_paused = true)]
    async fn secret_keys_complete_the_run_without_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast(dir.path());
        let harness = Harness::new().with_secret_keys("search-abc", "admin-def");

        let report = harness
            .driver(&config, RunOptions::default())
            .run()
            .await
            .unwrap();

        assert!(!report.is_degraded());
        assert_eq!(report.credentials_path, Some(ExtractionPath::Secret));
        assert_eq!(report.bundle.get(BundleKey::SearchKey), Some("search-abc"));
        assert_eq!(report.bundle.get(BundleKey::AdminKey), Some("admin-def"));
        assert_eq!(harness.search.key_listing_calls(), 0);
        assert_eq!(
            harness.reporter.finished(),
            vec!["prereqs", "inference", "teardown", "deploy", "pods", "job", "credentials", "environment"]
        );

        let written = environment::read(&config.bundle.path).unwrap();
        assert_eq!(written[1], ("MEILI_SEARCH_KEY".into(), "search-abc".into()));
        let reported: Vec<(String, String)> = report
            .bundle
            .entries()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.clone()))
            .collect();
        assert_eq!(written, reported);
        let keys = environment::read(&config.bundle.local_key_path).unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pods_never_ready_warns_and_waits_for_job() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new().with_secret_keys("s", "a");
        harness.cluster.set_pods_ready(false);

        let report = harness
            .driver(&fast(dir.path()), RunOptions::default())
            .run()
            .await
            .unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].stage, Stage::WaitingForPods);
        assert!(harness.cluster.calls_to("job") > 0);
        assert!(harness.cluster.calls_to("pods") > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_master_key_writes_bundle_with_empty_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast(dir.path());
        let harness = Harness::new();

        let report = harness
            .driver(&config, RunOptions::default())
            .run()
            .await
            .unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].stage, Stage::ExtractingCredentials);
        assert!(report.warnings[0].message.contains("master key"));
        assert_eq!(report.bundle.get(BundleKey::SearchKey), Some(""));
        assert_eq!(report.bundle.get(BundleKey::AdminKey), Some(""));
        assert!(config.bundle.path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn direct_query_fills_keys_when_secret_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new().with_master_key("dev-key");
        harness.search.set_keys(vec![
            ApiKey {
                name: Some("Default Search API Key".into()),
                key: "abc".into(),
            },
            ApiKey {
                name: Some("Default Admin API Key".into()),
                key: "def".into(),
            },
        ]);

        let report = harness
            .driver(&fast(dir.path()), RunOptions::default())
            .run()
            .await
            .unwrap();

        assert!(!report.is_degraded());
        assert_eq!(report.credentials_path, Some(ExtractionPath::DirectQuery));
        assert_eq!(report.bundle.get(BundleKey::SearchKey), Some("abc"));
        assert_eq!(harness.search.last_bearer().as_deref(), Some("dev-key"));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_helm_stops_before_touching_the_cluster() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new();
        let mut config = fast(dir.path());
        config.cluster.helm = "helm3".into();

        let failure = harness
            .driver(&config, RunOptions::default())
            .run()
            .await
            .unwrap_err();

        assert_eq!(failure.stage, Stage::CheckingPrereqs);
        assert!(matches!(failure.cause, Error::PrereqMissing { ref tool, .. } if tool == "helm3"));
        assert!(harness.cluster.calls().is_empty());
        assert!(!config.bundle.path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn deploy_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new();
        harness.cluster.fail_deploy("chart not found");

        let failure = harness
            .driver(&fast(dir.path()), RunOptions::default())
            .run()
            .await
            .unwrap_err();

        assert_eq!(failure.stage, Stage::Deploying);
        assert_eq!(harness.cluster.calls_to("pods"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn configured_master_key_is_applied_before_deploy() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fast(dir.path());
        config.keys.master_key = Some("dev-key".into());
        let harness = Harness::new().with_secret_keys("s", "a");

        harness
            .driver(&config, RunOptions::default())
            .run()
            .await
            .unwrap();

        let calls = harness.cluster.calls();
        let apply = calls.iter().position(|c| c.starts_with("apply:")).unwrap();
        let deploy = calls.iter().position(|c| c.starts_with("deploy:")).unwrap();
        assert!(apply < deploy);
        assert!(calls[apply].contains("dev-key"));
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_failure_only_warns() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new().with_secret_keys("s", "a");
        harness.cluster.fail_teardown("cluster unreachable");

        let report = harness
            .driver(&fast(dir.path()), RunOptions::default())
            .run()
            .await
            .unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].stage, Stage::TearingDown);
        assert_eq!(harness.cluster.calls_to("deploy"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn keep_existing_skips_teardown() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new().with_secret_keys("s", "a");

        harness
            .driver(
                &fast(dir.path()),
                RunOptions {
                    keep_existing: true,
                    skip_inference: false,
                },
            )
            .run()
            .await
            .unwrap();

        assert_eq!(harness.cluster.calls_to("teardown"), 0);
        assert!(harness.reporter.events().contains(&"skipped:teardown".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn install_that_leaves_binary_missing_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fast(dir.path());
        config.inference.install_command = vec!["brew".into(), "install".into(), "ollama".into()];
        let harness = Harness::new().with_secret_keys("s", "a");
        let harness = Harness {
            host: Arc::new(crate::testkit::fakes::FakeHost::with_executables(&[
                "kubectl", "helm", "brew",
            ])),
            inference: Arc::new(crate::testkit::fakes::FakeInference::new()),
            ..harness
        };

        let failure = harness
            .driver(&config, RunOptions::default())
            .run()
            .await
            .unwrap_err();

        // brew ran but the fake host never puts ollama on PATH.
        assert_eq!(failure.stage, Stage::PreparingInference);
        assert!(matches!(failure.cause, Error::Install { .. }));
        assert_eq!(harness.host.ran().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn runtime_pulls_missing_models() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new().with_secret_keys("s", "a");
        let harness = Harness {
            inference: Arc::new(crate::testkit::fakes::FakeInference::new()),
            ..harness
        };

        harness
            .driver(&fast(dir.path()), RunOptions::default())
            .run()
            .await
            .unwrap();

        assert_eq!(harness.inference.pulls(), vec!["llama3.2", "all-minilm"]);
        assert_eq!(harness.host.spawned().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unhealthy_runtime_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new().with_secret_keys("s", "a");
        harness.inference.set_healthy(false);

        let report = harness
            .driver(&fast(dir.path()), RunOptions::default())
            .run()
            .await
            .unwrap();

        assert_eq!(report.warnings.len(), 2);
        assert!(report
            .warnings
            .iter()
            .all(|w| w.stage == Stage::PreparingInference));
        assert!(report.warnings[1].message.contains("llama3.2"));
        assert!(harness.inference.pulls().is_empty());
        assert!(report.bundle_path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_runtime_skips_model_pulls() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new().with_secret_keys("s", "a");
        harness.inference.set_healthy(false);
        harness.inference.fail_pull("should not be called");

        let report = harness
            .driver(&fast(dir.path()), RunOptions::default())
            .run()
            .await
            .unwrap();

        assert!(report.is_degraded());
        assert!(harness.inference.pulls().is_empty());
        assert_eq!(
            harness.reporter.finished(),
            vec![
                "prereqs",
                "inference",
                "teardown",
                "deploy",
                "pods",
                "job",
                "credentials",
                "environment"
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn skip_inference_leaves_host_alone() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new().with_secret_keys("s", "a");

        let report = harness
            .driver(
                &fast(dir.path()),
                RunOptions {
                    keep_existing: false,
                    skip_inference: true,
                },
            )
            .run()
            .await
            .unwrap();

        assert!(harness.host.spawned().is_empty());
        assert!(harness.reporter.events().contains(&"skipped:inference".to_string()));
        assert_eq!(report.bundle.get(BundleKey::InferenceUrl), Some("http://localhost:11435"));
    }

    #[tokio::test(start_paused = true)]
    async fn multiline_key_is_a_fatal_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = fast(dir.path());
        let harness = Harness::new().with_secret_keys("bad\nkey", "a");

        let failure = harness
            .driver(&config, RunOptions::default())
            .run()
            .await
            .unwrap_err();

        assert_eq!(failure.stage, Stage::WritingEnvironment);
        assert!(matches!(failure.cause, Error::ValueEncoding { .. }));
        assert!(!config.bundle.path.exists());
    }
}
