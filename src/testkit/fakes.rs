//! In-memory port implementations for testing.
//!
//! - [`FakeCluster`] - secrets, pod/job readiness and deploy results held in
//!   memory; records every control-plane call.
//! - [`FakeSearch`] - scripted key listing and health.
//! - [`FakeInference`] - model list and pull outcome.
//! - [`FakeHost`] - executables on `PATH`, command results, a port that
//!   opens once the service is spawned.
//! - [`RecordingReporter`] - remembers progress events in order.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{ApiKey, MasterKey, ServiceEndpoint, Stage, Warning};
use crate::error::{Error, Result};
use crate::port::{
    ClusterControl, HostSystem, InferenceService, Override, ProgressReporter, SearchService,
    StrayResources,
};

// ---------------------------------------------------------------------------
// FakeCluster
// ---------------------------------------------------------------------------

/// A control plane that lives in a few hash maps.
pub struct FakeCluster {
    secrets: Mutex<HashMap<(String, String), String>>,
    job_output: Mutex<HashMap<(String, String), String>>,
    endpoints: Mutex<HashMap<String, ServiceEndpoint>>,
    pods_ready: AtomicBool,
    job_complete: AtomicBool,
    deploy_error: Mutex<Option<String>>,
    teardown_error: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self {
            secrets: Mutex::new(HashMap::new()),
            job_output: Mutex::new(HashMap::new()),
            endpoints: Mutex::new(HashMap::new()),
            pods_ready: AtomicBool::new(true),
            job_complete: AtomicBool::new(true),
            deploy_error: Mutex::new(None),
            teardown_error: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_secret(&self, secret: &str, field: &str, value: &str) {
        self.secrets
            .lock()
            .insert((secret.to_string(), field.to_string()), value.to_string());
    }

    /// Secret field written by the key job once a deploy succeeds.
    pub fn set_job_output(&self, secret: &str, field: &str, value: &str) {
        self.job_output
            .lock()
            .insert((secret.to_string(), field.to_string()), value.to_string());
    }

    pub fn set_endpoint(&self, service: &str, endpoint: ServiceEndpoint) {
        self.endpoints.lock().insert(service.to_string(), endpoint);
    }

    pub fn set_pods_ready(&self, ready: bool) {
        self.pods_ready.store(ready, Ordering::SeqCst);
    }

    pub fn set_job_complete(&self, complete: bool) {
        self.job_complete.store(complete, Ordering::SeqCst);
    }

    pub fn fail_deploy(&self, reason: &str) {
        *self.deploy_error.lock() = Some(reason.to_string());
    }

    pub fn fail_teardown(&self, reason: &str) {
        *self.teardown_error.lock() = Some(reason.to_string());
    }

    /// Every call made so far, as `operation:argument` strings.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Calls whose operation equals `operation`.
    pub fn calls_to(&self, operation: &str) -> usize {
        let prefix = format!("{operation}:");
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    fn record(&self, operation: &str, argument: &str) {
        self.calls.lock().push(format!("{operation}:{argument}"));
    }
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterControl for FakeCluster {
    async fn teardown(&self, release: &str, stray: &StrayResources) -> Result<()> {
        self.record("teardown", release);
        if let Some(reason) = self.teardown_error.lock().clone() {
            return Err(Error::Command {
                command: "helm uninstall".to_string(),
                reason,
            });
        }
        let mut secrets = self.secrets.lock();
        secrets.retain(|(name, _), _| !stray.secrets.contains(name));
        Ok(())
    }

    async fn deploy(&self, release: &str, _chart: &str, overrides: &[Override]) -> Result<()> {
        let rendered: Vec<String> = overrides
            .iter()
            .map(|o| format!("{}={}", o.key, o.value))
            .collect();
        self.record("deploy", &format!("{release} {}", rendered.join(",")));
        if let Some(reason) = self.deploy_error.lock().clone() {
            return Err(Error::Deploy {
                release: release.to_string(),
                reason,
            });
        }
        let output = self.job_output.lock().clone();
        self.secrets.lock().extend(output);
        Ok(())
    }

    async fn apply_manifest(&self, manifest: &str) -> Result<()> {
        self.record("apply", manifest);
        Ok(())
    }

    async fn service_endpoint(&self, service: &str) -> Result<ServiceEndpoint> {
        self.record("endpoint", service);
        Ok(self
            .endpoints
            .lock()
            .get(service)
            .cloned()
            .unwrap_or_else(|| ServiceEndpoint::new("localhost", 30700)))
    }

    async fn secret_field(&self, secret: &str, field: &str) -> Result<String> {
        self.record("secret", &format!("{secret}/{field}"));
        Ok(self
            .secrets
            .lock()
            .get(&(secret.to_string(), field.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn pods_ready(&self, selector: &str) -> Result<bool> {
        self.record("pods", selector);
        Ok(self.pods_ready.load(Ordering::SeqCst))
    }

    async fn job_complete(&self, job: &str) -> Result<bool> {
        self.record("job", job);
        Ok(self.job_complete.load(Ordering::SeqCst))
    }

    async fn job_logs(&self, job: &str) -> Result<String> {
        self.record("logs", job);
        Ok(format!("keys extracted by {job}"))
    }
}

// ---------------------------------------------------------------------------
// FakeSearch
// ---------------------------------------------------------------------------

/// Search API with a scripted key listing.
pub struct FakeSearch {
    keys: Mutex<Vec<ApiKey>>,
    failure: Mutex<Option<String>>,
    healthy: AtomicBool,
    key_listing_calls: AtomicU32,
    last_bearer: Mutex<Option<String>>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self {
            keys: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            healthy: AtomicBool::new(true),
            key_listing_calls: AtomicU32::new(0),
            last_bearer: Mutex::new(None),
        }
    }

    pub fn set_keys(&self, keys: Vec<ApiKey>) {
        *self.keys.lock() = keys;
    }

    pub fn fail_key_listing(&self, reason: &str) {
        *self.failure.lock() = Some(reason.to_string());
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn key_listing_calls(&self) -> u32 {
        self.key_listing_calls.load(Ordering::SeqCst)
    }

    /// Master key presented on the most recent key listing.
    pub fn last_bearer(&self) -> Option<String> {
        self.last_bearer.lock().clone()
    }
}

impl Default for FakeSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchService for FakeSearch {
    async fn is_healthy(&self, _endpoint: &ServiceEndpoint) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    async fn list_keys(
        &self,
        _endpoint: &ServiceEndpoint,
        master: &MasterKey,
    ) -> Result<Vec<ApiKey>> {
        self.key_listing_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_bearer.lock() = Some(master.expose().to_string());
        if let Some(reason) = self.failure.lock().clone() {
            return Err(Error::Parse(reason));
        }
        Ok(self.keys.lock().clone())
    }
}

// ---------------------------------------------------------------------------
// FakeInference
// ---------------------------------------------------------------------------

/// Inference API with an in-memory model list.
pub struct FakeInference {
    models: Mutex<Vec<String>>,
    pull_error: Mutex<Option<String>>,
    pulls: Mutex<Vec<String>>,
    healthy: AtomicBool,
}

impl FakeInference {
    pub fn new() -> Self {
        Self {
            models: Mutex::new(Vec::new()),
            pull_error: Mutex::new(None),
            pulls: Mutex::new(Vec::new()),
            healthy: AtomicBool::new(true),
        }
    }

    pub fn with_models(models: &[&str]) -> Self {
        let fake = Self::new();
        *fake.models.lock() = models.iter().map(|m| (*m).to_string()).collect();
        fake
    }

    pub fn fail_pull(&self, reason: &str) {
        *self.pull_error.lock() = Some(reason.to_string());
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn pulls(&self) -> Vec<String> {
        self.pulls.lock().clone()
    }

    /// An unhealthy runtime refuses every API call, like a dead server.
    fn reachable(&self) -> Result<()> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))
        }
    }
}

impl Default for FakeInference {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceService for FakeInference {
    async fn is_healthy(&self, _endpoint: &ServiceEndpoint) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    async fn list_models(&self, _endpoint: &ServiceEndpoint) -> Result<Vec<String>> {
        self.reachable()?;
        Ok(self.models.lock().clone())
    }

    async fn pull_model(&self, _endpoint: &ServiceEndpoint, model: &str) -> Result<()> {
        self.reachable()?;
        self.pulls.lock().push(model.to_string());
        if let Some(reason) = self.pull_error.lock().clone() {
            return Err(Error::ModelPull {
                model: model.to_string(),
                reason,
            });
        }
        self.models.lock().push(format!("{model}:latest"));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeHost
// ---------------------------------------------------------------------------

/// A host whose `PATH` and listening ports are plain sets.
pub struct FakeHost {
    executables: Mutex<HashSet<String>>,
    failing_commands: Mutex<HashSet<String>>,
    ran: Mutex<Vec<Vec<String>>>,
    spawned: Mutex<Vec<Vec<String>>>,
    open_ports: Mutex<HashSet<u16>>,
    spawn_opens: Mutex<Option<u16>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            executables: Mutex::new(HashSet::new()),
            failing_commands: Mutex::new(HashSet::new()),
            ran: Mutex::new(Vec::new()),
            spawned: Mutex::new(Vec::new()),
            open_ports: Mutex::new(HashSet::new()),
            spawn_opens: Mutex::new(None),
        }
    }

    /// Host with the given executables on `PATH`.
    pub fn with_executables(names: &[&str]) -> Self {
        let host = Self::new();
        for name in names {
            host.add_executable(name);
        }
        host
    }

    pub fn add_executable(&self, name: &str) {
        self.executables.lock().insert(name.to_string());
    }

    /// Commands whose first argument is `program` exit non-zero.
    pub fn fail_command(&self, program: &str) {
        self.failing_commands.lock().insert(program.to_string());
    }

    pub fn open_port(&self, port: u16) {
        self.open_ports.lock().insert(port);
    }

    /// Spawning any process opens `port`.
    pub fn spawn_opens_port(&self, port: u16) {
        *self.spawn_opens.lock() = Some(port);
    }

    pub fn ran(&self) -> Vec<Vec<String>> {
        self.ran.lock().clone()
    }

    pub fn spawned(&self) -> Vec<Vec<String>> {
        self.spawned.lock().clone()
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostSystem for FakeHost {
    fn has_executable(&self, binary: &str) -> bool {
        self.executables.lock().contains(binary)
    }

    async fn run(&self, argv: &[String]) -> Result<()> {
        self.ran.lock().push(argv.to_vec());
        let program = argv.first().cloned().unwrap_or_default();
        if self.failing_commands.lock().contains(&program) {
            return Err(Error::Command {
                command: argv.join(" "),
                reason: "exit status: 1".to_string(),
            });
        }
        Ok(())
    }

    fn spawn_detached(&self, argv: &[String], _env: &[(String, String)]) -> Result<()> {
        self.spawned.lock().push(argv.to_vec());
        if let Some(port) = *self.spawn_opens.lock() {
            self.open_ports.lock().insert(port);
        }
        Ok(())
    }

    async fn port_open(&self, port: u16) -> bool {
        self.open_ports.lock().contains(&port)
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Progress events as `event:stage` strings, warnings kept whole.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<String>>,
    warnings: Mutex<Vec<Warning>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.warnings.lock().clone()
    }

    /// Stages that finished, in order.
    pub fn finished(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| e.strip_prefix("finished:").map(str::to_string))
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn stage_started(&self, stage: Stage) {
        self.events.lock().push(format!("started:{stage}"));
    }

    fn stage_finished(&self, stage: Stage) {
        self.events.lock().push(format!("finished:{stage}"));
    }

    fn stage_skipped(&self, stage: Stage, _reason: &str) {
        self.events.lock().push(format!("skipped:{stage}"));
    }

    fn warning(&self, warning: &Warning) {
        self.events.lock().push(format!("warning:{}", warning.stage));
        self.warnings.lock().push(warning.clone());
    }
}
