//! Search service and key extraction configuration.

use serde::Deserialize;

/// Where the search service runs and how to tell it is ready.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Target name used in logs.
    pub name: String,

    /// Kubernetes service exposing the API.
    pub service: String,

    /// Label selector matching the service's pods.
    pub selector: String,

    /// Container port of the API. Defaults to 7700.
    pub port: u16,

    /// Health endpoint path. Defaults to "/health".
    pub health_path: String,

    /// How long to wait for pods and health. Defaults to 180 seconds.
    pub readiness_timeout_secs: u64,

    /// Delay between readiness checks. Defaults to 5 seconds.
    pub poll_interval_secs: u64,

    /// Per-request HTTP timeout. Defaults to 10 seconds.
    pub request_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            name: "meilisearch".to_string(),
            service: "meilisearch".to_string(),
            selector: "app.kubernetes.io/name=meilisearch".to_string(),
            port: 7700,
            health_path: "/health".to_string(),
            readiness_timeout_secs: 180,
            poll_interval_secs: 5,
            request_timeout_secs: 10,
        }
    }
}

/// Where the API keys live and how to recover them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Secret written by the key job.
    pub secret: String,

    /// Field holding the search key.
    pub search_field: String,

    /// Field holding the admin key.
    pub admin_field: String,

    /// Secret holding the master key.
    pub master_secret: String,

    /// Field holding the master key.
    pub master_field: String,

    /// Job that derives the API keys and writes `secret`.
    pub job: String,

    /// How long to wait for the job. Defaults to 300 seconds.
    pub job_timeout_secs: u64,

    /// Delay between job checks. Defaults to 5 seconds.
    pub job_poll_interval_secs: u64,

    /// Name of the search key in the key listing.
    pub search_key_name: String,

    /// Name of the admin key in the key listing.
    pub admin_key_name: String,

    /// Master key to seed into `master_secret` before deploying.
    ///
    /// Unset means the secret is managed elsewhere (by the chart or by hand).
    pub master_key: Option<String>,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            secret: "meilisearch-api-keys".to_string(),
            search_field: "MEILI_SEARCH_KEY".to_string(),
            admin_field: "MEILI_ADMIN_KEY".to_string(),
            master_secret: "meilisearch-master-key".to_string(),
            master_field: "MEILI_MASTER_KEY".to_string(),
            job: "meilisearch-key-extractor".to_string(),
            job_timeout_secs: 300,
            job_poll_interval_secs: 5,
            search_key_name: "Default Search API Key".to_string(),
            admin_key_name: "Default Admin API Key".to_string(),
            master_key: None,
        }
    }
}
