//! Cluster control through the `kubectl` and `helm` binaries.
//!
//! Every call shells out with the configured namespace and optional kube
//! context. Reads use `-o json` and are parsed into the small subsets of the
//! Kubernetes object model declared below; `--ignore-not-found` turns absent
//! objects into empty output, which the parsers treat as "nothing there".

use std::process::Stdio;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::domain::ServiceEndpoint;
use crate::error::{Error, Result};
use crate::port::outbound::cluster::{ClusterControl, Override, StrayResources};

/// `kubectl`/`helm` backed [`ClusterControl`].
#[derive(Debug, Clone)]
pub struct KubeCli {
    kubectl: String,
    helm: String,
    namespace: String,
    context: Option<String>,
    node_host: String,
}

impl KubeCli {
    #[must_use]
    pub fn new(
        kubectl: impl Into<String>,
        helm: impl Into<String>,
        namespace: impl Into<String>,
        context: Option<String>,
        node_host: impl Into<String>,
    ) -> Self {
        Self {
            kubectl: kubectl.into(),
            helm: helm.into(),
            namespace: namespace.into(),
            context,
            node_host: node_host.into(),
        }
    }

    /// Arguments for a `kubectl` call, scoped to the namespace and context.
    fn kubectl_args(&self, args: &[&str]) -> Vec<String> {
        let mut argv: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        argv.push("--namespace".to_string());
        argv.push(self.namespace.clone());
        if let Some(context) = &self.context {
            argv.push("--context".to_string());
            argv.push(context.clone());
        }
        argv
    }

    /// Arguments for a `helm` call, scoped to the namespace and context.
    fn helm_args(&self, args: &[&str]) -> Vec<String> {
        let mut argv: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        argv.push("--namespace".to_string());
        argv.push(self.namespace.clone());
        if let Some(context) = &self.context {
            argv.push("--kube-context".to_string());
            argv.push(context.clone());
        }
        argv
    }

    async fn kubectl(&self, args: &[&str]) -> Result<String> {
        run(&self.kubectl, &self.kubectl_args(args), None).await
    }

    async fn helm(&self, args: &[&str]) -> Result<String> {
        run(&self.helm, &self.helm_args(args), None).await
    }
}

/// Run `program` to completion and return its stdout.
///
/// A non-zero exit becomes [`Error::Command`] carrying stderr.
async fn run(program: &str, args: &[String], stdin: Option<&str>) -> Result<String> {
    let rendered = format!("{program} {}", args.join(" "));
    debug!(command = %rendered, "Running");

    let mut command = Command::new(program);
    command
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|e| Error::Command {
        command: rendered.clone(),
        reason: e.to_string(),
    })?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(input.as_bytes()).await?;
        drop(pipe);
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(Error::Command {
            command: rendered,
            reason: if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            },
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl ClusterControl for KubeCli {
    async fn teardown(&self, release: &str, stray: &StrayResources) -> Result<()> {
        info!(release, "Removing release");
        let mut first_error: Option<Error> = None;
        let mut keep = |result: Result<String>, what: &str| {
            if let Err(e) = result {
                warn!(resource = what, error = %e, "Teardown step failed");
                first_error.get_or_insert(e);
            }
        };

        keep(
            self.helm(&["uninstall", release, "--ignore-not-found", "--wait"])
                .await,
            release,
        );
        for job in &stray.jobs {
            keep(
                self.kubectl(&["delete", "job", job, "--ignore-not-found"])
                    .await,
                job,
            );
        }
        for secret in &stray.secrets {
            keep(
                self.kubectl(&["delete", "secret", secret, "--ignore-not-found"])
                    .await,
                secret,
            );
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn deploy(&self, release: &str, chart: &str, overrides: &[Override]) -> Result<()> {
        let sets: Vec<String> = overrides
            .iter()
            .map(|o| format!("{}={}", o.key, o.value))
            .collect();
        let mut args = vec!["upgrade", "--install", release, chart];
        for set in &sets {
            args.push("--set");
            args.push(set);
        }
        info!(release, chart, overrides = sets.len(), "Deploying release");
        self.helm(&args).await.map_err(|e| Error::Deploy {
            release: release.to_string(),
            reason: match e {
                Error::Command { reason, .. } => reason,
                other => other.to_string(),
            },
        })?;
        Ok(())
    }

    async fn apply_manifest(&self, manifest: &str) -> Result<()> {
        run(
            &self.kubectl,
            &self.kubectl_args(&["apply", "-f", "-"]),
            Some(manifest),
        )
        .await?;
        Ok(())
    }

    async fn service_endpoint(&self, service: &str) -> Result<ServiceEndpoint> {
        let json = self.kubectl(&["get", "service", service, "-o", "json"]).await?;
        parse_service_endpoint(&json, &self.node_host)
    }

    async fn secret_field(&self, secret: &str, field: &str) -> Result<String> {
        let json = self
            .kubectl(&["get", "secret", secret, "--ignore-not-found", "-o", "json"])
            .await?;
        parse_secret_field(&json, field)
    }

    async fn pods_ready(&self, selector: &str) -> Result<bool> {
        let json = self
            .kubectl(&["get", "pods", "--selector", selector, "-o", "json"])
            .await?;
        parse_pods_ready(&json)
    }

    async fn job_complete(&self, job: &str) -> Result<bool> {
        let json = self
            .kubectl(&["get", "job", job, "--ignore-not-found", "-o", "json"])
            .await?;
        parse_job_complete(&json)
    }

    async fn job_logs(&self, job: &str) -> Result<String> {
        let target = format!("job/{job}");
        self.kubectl(&["logs", &target, "--tail", "200"]).await
    }
}

// ---------------------------------------------------------------------------
// Object model subsets
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Service {
    spec: ServiceSpec,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceSpec {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(rename = "clusterIP", default)]
    cluster_ip: String,
    #[serde(default)]
    ports: Vec<ServicePort>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServicePort {
    port: u16,
    #[serde(default)]
    node_port: Option<u16>,
}

#[derive(Deserialize)]
struct Secret {
    #[serde(default)]
    data: std::collections::BTreeMap<String, String>,
}

#[derive(Deserialize, Default)]
struct Condition {
    #[serde(rename = "type")]
    kind: String,
    status: String,
}

#[derive(Deserialize, Default)]
struct Status {
    #[serde(default)]
    conditions: Vec<Condition>,
}

impl Status {
    fn has(&self, kind: &str) -> bool {
        self.conditions
            .iter()
            .any(|c| c.kind == kind && c.status == "True")
    }
}

#[derive(Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<Pod>,
}

#[derive(Deserialize)]
struct Pod {
    #[serde(default)]
    status: Status,
}

#[derive(Deserialize)]
struct Job {
    #[serde(default)]
    status: Status,
}

/// Map a service to the address reachable from this host.
///
/// `NodePort` services resolve to `node_host:nodePort`; any other type to
/// `clusterIP:port`. The first declared port is used.
///
/// # Errors
///
/// Returns an error for malformed JSON or a service without ports.
pub fn parse_service_endpoint(json: &str, node_host: &str) -> Result<ServiceEndpoint> {
    let service: Service = serde_json::from_str(json)?;
    let port = service
        .spec
        .ports
        .first()
        .ok_or_else(|| Error::Parse("service declares no ports".to_string()))?;

    if service.spec.kind == "NodePort" {
        let node_port = port
            .node_port
            .ok_or_else(|| Error::Parse("NodePort service without nodePort".to_string()))?;
        return Ok(ServiceEndpoint::new(node_host, node_port));
    }
    if service.spec.cluster_ip.is_empty() || service.spec.cluster_ip == "None" {
        return Err(Error::Parse("service has no cluster IP".to_string()));
    }
    Ok(ServiceEndpoint::new(&service.spec.cluster_ip, port.port))
}

/// Decode one field of a secret, trimming surrounding whitespace. Missing
/// secret or field is `""`.
///
/// # Errors
///
/// Returns an error for malformed JSON, invalid base64 or non-UTF-8 content.
pub fn parse_secret_field(json: &str, field: &str) -> Result<String> {
    if json.trim().is_empty() {
        return Ok(String::new());
    }
    let secret: Secret = serde_json::from_str(json)?;
    let Some(encoded) = secret.data.get(field) else {
        return Ok(String::new());
    };
    let bytes = STANDARD.decode(encoded.trim())?;
    let value =
        String::from_utf8(bytes).map_err(|e| Error::Parse(format!("secret field {field}: {e}")))?;
    Ok(value.trim().to_string())
}

/// At least one pod matched and every matched pod is `Ready`.
///
/// # Errors
///
/// Returns an error for malformed JSON.
pub fn parse_pods_ready(json: &str) -> Result<bool> {
    let pods: PodList = serde_json::from_str(json)?;
    Ok(!pods.items.is_empty() && pods.items.iter().all(|p| p.status.has("Ready")))
}

/// The job reports `Complete`. A missing job is not complete.
///
/// # Errors
///
/// Returns an error for malformed JSON.
pub fn parse_job_complete(json: &str) -> Result<bool> {
    if json.trim().is_empty() {
        return Ok(false);
    }
    let job: Job = serde_json::from_str(json)?;
    Ok(job.status.has("Complete"))
}
