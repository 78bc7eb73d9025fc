//! Search-service credential extraction.
//!
//! Two paths lead to the key pair:
//!
//! 1. The key job writes both keys to a secret. Reading that secret is
//!    preferred and needs nothing but control-plane access.
//! 2. When the secret is missing or incomplete, the keys are listed from the
//!    search API directly, authenticated with the master key from a second
//!    secret.
//!
//! The extractor only reads, so running it repeatedly against the same
//! cluster state yields the same result.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{ApiKey, CredentialSet, MasterKey};
use crate::error::{CredentialError, Result};
use crate::port::{ClusterControl, SearchService};

/// Secret names, field names and key names the extractor reads.
#[derive(Debug, Clone)]
pub struct KeySources {
    pub secret: String,
    pub search_field: String,
    pub admin_field: String,
    pub master_secret: String,
    pub master_field: String,
    pub service: String,
    pub search_key_name: String,
    pub admin_key_name: String,
}

/// Which path produced a complete set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    Secret,
    DirectQuery,
}

/// States of one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionState {
    Init,
    AwaitingSecret,
    AwaitingDirectQuery { from_secret: CredentialSet },
    Complete {
        credentials: CredentialSet,
        path: ExtractionPath,
    },
    Failed {
        cause: CredentialError,
        partial: CredentialSet,
    },
}

/// Final result of [`CredentialExtractor::extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Complete {
        credentials: CredentialSet,
        path: ExtractionPath,
    },
    Failed {
        cause: CredentialError,
        partial: CredentialSet,
    },
}

impl Extraction {
    /// The recovered keys, complete or not.
    #[must_use]
    pub fn into_credentials(self) -> CredentialSet {
        match self {
            Extraction::Complete { credentials, .. } => credentials,
            Extraction::Failed { partial, .. } => partial,
        }
    }
}

/// Drives [`ExtractionState`] from `Init` to a terminal state.
pub struct CredentialExtractor {
    cluster: Arc<dyn ClusterControl>,
    search: Arc<dyn SearchService>,
    sources: KeySources,
}

impl CredentialExtractor {
    #[must_use]
    pub fn new(
        cluster: Arc<dyn ClusterControl>,
        search: Arc<dyn SearchService>,
        sources: KeySources,
    ) -> Self {
        Self {
            cluster,
            search,
            sources,
        }
    }

    /// Run the state machine to completion.
    ///
    /// # Errors
    ///
    /// Returns an error only when the control plane itself fails (a
    /// `kubectl` invocation error). Missing or partial keys are reported as
    /// [`Extraction::Failed`].
    pub async fn extract(&self) -> Result<Extraction> {
        let mut state = ExtractionState::Init;
        loop {
            state = match self.advance(state).await? {
                ExtractionState::Complete { credentials, path } => {
                    return Ok(Extraction::Complete { credentials, path });
                }
                ExtractionState::Failed { cause, partial } => {
                    return Ok(Extraction::Failed { cause, partial });
                }
                next => next,
            };
        }
    }

    /// Perform one transition.
    ///
    /// # Errors
    ///
    /// Propagates control-plane failures.
    pub async fn advance(&self, state: ExtractionState) -> Result<ExtractionState> {
        match state {
            ExtractionState::Init => Ok(ExtractionState::AwaitingSecret),
            ExtractionState::AwaitingSecret => self.read_secret().await,
            ExtractionState::AwaitingDirectQuery { from_secret } => {
                self.query_directly(from_secret).await
            }
            terminal => Ok(terminal),
        }
    }

    async fn read_secret(&self) -> Result<ExtractionState> {
        let s = &self.sources;
        let search_key = self.cluster.secret_field(&s.secret, &s.search_field).await?;
        let admin_key = self.cluster.secret_field(&s.secret, &s.admin_field).await?;
        let credentials = CredentialSet::new(search_key, admin_key);

        if credentials.is_complete() {
            info!(secret = %s.secret, "API keys read from secret");
            return Ok(ExtractionState::Complete {
                credentials,
                path: ExtractionPath::Secret,
            });
        }

        debug!(
            secret = %s.secret,
            missing = ?credentials.missing(),
            "Secret incomplete, falling back to direct key query"
        );
        Ok(ExtractionState::AwaitingDirectQuery {
            from_secret: credentials,
        })
    }

    async fn query_directly(&self, from_secret: CredentialSet) -> Result<ExtractionState> {
        let s = &self.sources;
        let raw = self
            .cluster
            .secret_field(&s.master_secret, &s.master_field)
            .await?;
        let Some(master) = MasterKey::new(raw) else {
            warn!(secret = %s.master_secret, "Master key not available");
            return Ok(ExtractionState::Failed {
                cause: CredentialError::MissingMasterKey {
                    secret: s.master_secret.clone(),
                    field: s.master_field.clone(),
                },
                partial: from_secret,
            });
        };

        let endpoint = self.cluster.service_endpoint(&s.service).await?;
        let keys = match self.search.list_keys(&endpoint, &master).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Key listing failed");
                return Ok(ExtractionState::Failed {
                    cause: CredentialError::KeyQuery(e.to_string()),
                    partial: from_secret,
                });
            }
        };

        let queried = CredentialSet::new(
            key_named(&keys, &s.search_key_name),
            key_named(&keys, &s.admin_key_name),
        );
        let credentials = from_secret.merge(queried);

        if credentials.is_complete() {
            info!(endpoint = %endpoint, "API keys read from key listing");
            Ok(ExtractionState::Complete {
                credentials,
                path: ExtractionPath::DirectQuery,
            })
        } else {
            Ok(ExtractionState::Failed {
                cause: CredentialError::IncompleteCredentials {
                    missing: credentials.missing(),
                },
                partial: credentials,
            })
        }
    }
}

/// Key whose name matches exactly, or an empty string.
fn key_named(keys: &[ApiKey], name: &str) -> String {
    keys.iter()
        .find(|k| k.name.as_deref() == Some(name))
        .map(|k| k.key.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SEARCH_KEY_FIELD;
    use crate::testkit::fakes::{FakeCluster, FakeSearch};

    fn sources() -> KeySources {
        KeySources {
            secret: "meilisearch-api-keys".into(),
            search_field: "MEILI_SEARCH_KEY".into(),
            admin_field: "MEILI_ADMIN_KEY".into(),
            master_secret: "meilisearch-master-key".into(),
            master_field: "MEILI_MASTER_KEY".into(),
            service: "meilisearch".into(),
            search_key_name: "Default Search API Key".into(),
            admin_key_name: "Default Admin API Key".into(),
        }
    }

    fn extractor(cluster: &Arc<FakeCluster>, search: &Arc<FakeSearch>) -> CredentialExtractor {
        CredentialExtractor::new(cluster.clone(), search.clone(), sources())
    }

    #[tokio::test]
    async fn init_moves_to_awaiting_secret() {
        let cluster = Arc::new(FakeCluster::new());
        let search = Arc::new(FakeSearch::new());
        let next = extractor(&cluster, &search)
            .advance(ExtractionState::Init)
            .await
            .unwrap();
        assert_eq!(next, ExtractionState::AwaitingSecret);
    }

    #[tokio::test]
    async fn partial_secret_moves_to_direct_query() {
        let cluster = Arc::new(FakeCluster::new());
        cluster.set_secret("meilisearch-api-keys", "MEILI_SEARCH_KEY", "s");
        let search = Arc::new(FakeSearch::new());

        let next = extractor(&cluster, &search)
            .advance(ExtractionState::AwaitingSecret)
            .await
            .unwrap();
        assert_eq!(
            next,
            ExtractionState::AwaitingDirectQuery {
                from_secret: CredentialSet::new("s", "")
            }
        );
    }

    #[tokio::test]
    async fn query_keeps_secret_values_and_fills_gaps() {
        let cluster = Arc::new(FakeCluster::new());
        cluster.set_secret("meilisearch-api-keys", "MEILI_SEARCH_KEY", "from-secret");
        cluster.set_secret("meilisearch-master-key", "MEILI_MASTER_KEY", "dev-key");
        let search = Arc::new(FakeSearch::new());
        search.set_keys(vec![
            ApiKey {
                name: Some("Default Search API Key".into()),
                key: "from-api".into(),
            },
            ApiKey {
                name: Some("Default Admin API Key".into()),
                key: "admin".into(),
            },
        ]);

        let result = extractor(&cluster, &search).extract().await.unwrap();
        assert_eq!(
            result,
            Extraction::Complete {
                credentials: CredentialSet::new("from-secret", "admin"),
                path: ExtractionPath::DirectQuery,
            }
        );
    }

    #[tokio::test]
    async fn unnamed_and_mismatched_keys_are_ignored() {
        let cluster = Arc::new(FakeCluster::new());
        cluster.set_secret("meilisearch-master-key", "MEILI_MASTER_KEY", "dev-key");
        let search = Arc::new(FakeSearch::new());
        search.set_keys(vec![
            ApiKey {
                name: None,
                key: "anonymous".into(),
            },
            ApiKey {
                name: Some("default search api key".into()),
                key: "wrong-case".into(),
            },
            ApiKey {
                name: Some("Default Admin API Key".into()),
                key: "admin".into(),
            },
        ]);

        let result = extractor(&cluster, &search).extract().await.unwrap();
        match result {
            Extraction::Failed { cause, partial } => {
                assert_eq!(
                    cause,
                    CredentialError::IncompleteCredentials {
                        missing: vec![SEARCH_KEY_FIELD]
                    }
                );
                assert_eq!(partial, CredentialSet::new("", "admin"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn key_listing_error_is_a_failed_extraction() {
        let cluster = Arc::new(FakeCluster::new());
        cluster.set_secret("meilisearch-master-key", "MEILI_MASTER_KEY", "dev-key");
        let search = Arc::new(FakeSearch::new());
        search.fail_key_listing("401 Unauthorized");

        let result = extractor(&cluster, &search).extract().await.unwrap();
        assert!(matches!(
            result,
            Extraction::Failed {
                cause: CredentialError::KeyQuery(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn terminal_states_do_not_advance() {
        let cluster = Arc::new(FakeCluster::new());
        let search = Arc::new(FakeSearch::new());
        let done = ExtractionState::Complete {
            credentials: CredentialSet::new("a", "b"),
            path: ExtractionPath::Secret,
        };
        let next = extractor(&cluster, &search)
            .advance(done.clone())
            .await
            .unwrap();
        assert_eq!(next, done);
        assert_eq!(search.key_listing_calls(), 0);
    }
}
