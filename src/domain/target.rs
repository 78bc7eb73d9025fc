//! Deployment targets and the endpoints they resolve to.

use std::fmt;
use std::time::Duration;

/// Where a target runs and how its readiness is observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetLocation {
    /// Pods in the cluster matched by `selector`, exposed by `service`.
    Cluster { selector: String, service: String },
    /// A process on the machine running the bootstrap.
    Host,
}

/// A named service the bootstrap brings up.
///
/// Targets are declared in configuration and never change during a run.
#[derive(Debug, Clone)]
pub struct DeploymentTarget {
    name: String,
    location: TargetLocation,
    port: u16,
    health_path: String,
    readiness_timeout: Duration,
    poll_interval: Duration,
}

impl DeploymentTarget {
    /// Create a target backed by cluster pods.
    #[must_use]
    pub fn cluster(
        name: impl Into<String>,
        selector: impl Into<String>,
        service: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            location: TargetLocation::Cluster {
                selector: selector.into(),
                service: service.into(),
            },
            port,
            health_path: "/health".to_string(),
            readiness_timeout: Duration::from_secs(180),
            poll_interval: Duration::from_secs(5),
        }
    }

    /// Create a target backed by a local process.
    #[must_use]
    pub fn host(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            location: TargetLocation::Host,
            port,
            health_path: "/".to_string(),
            readiness_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
        }
    }

    #[must_use]
    pub fn with_health_path(mut self, path: impl Into<String>) -> Self {
        self.health_path = path.into();
        self
    }

    #[must_use]
    pub fn with_readiness(mut self, timeout: Duration, interval: Duration) -> Self {
        self.readiness_timeout = timeout;
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn location(&self) -> &TargetLocation {
        &self.location
    }

    /// Label selector for cluster targets, `None` for host targets.
    #[must_use]
    pub fn selector(&self) -> Option<&str> {
        match &self.location {
            TargetLocation::Cluster { selector, .. } => Some(selector),
            TargetLocation::Host => None,
        }
    }

    /// Service name for cluster targets, `None` for host targets.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        match &self.location {
            TargetLocation::Cluster { service, .. } => Some(service),
            TargetLocation::Host => None,
        }
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn health_path(&self) -> &str {
        &self.health_path
    }

    #[must_use]
    pub fn readiness_timeout(&self) -> Duration {
        self.readiness_timeout
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

/// A resolved `{host, port}` pair.
///
/// Only valid for the run that resolved it; node ports change across
/// re-deploys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceEndpoint {
    host: String,
    port: u16,
}

impl ServiceEndpoint {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Endpoint on the loopback interface.
    #[must_use]
    pub fn local(port: u16) -> Self {
        Self::new("localhost", port)
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// URL for `path` on this endpoint. `path` may omit the leading slash.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.url(), path)
    }
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
