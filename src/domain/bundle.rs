//! The environment bundle handed to downstream applications.

use std::fmt;

use super::credential::CredentialSet;
use super::target::ServiceEndpoint;

/// The fixed set of variables a bundle carries, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleKey {
    SearchUrl,
    SearchKey,
    AdminKey,
    InferenceUrl,
    ModelName,
    EmbeddingModel,
}

impl BundleKey {
    pub const ALL: [BundleKey; 6] = [
        BundleKey::SearchUrl,
        BundleKey::SearchKey,
        BundleKey::AdminKey,
        BundleKey::InferenceUrl,
        BundleKey::ModelName,
        BundleKey::EmbeddingModel,
    ];

    /// Variable name as written to the file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BundleKey::SearchUrl => "MEILI_HOST",
            BundleKey::SearchKey => "MEILI_SEARCH_KEY",
            BundleKey::AdminKey => "MEILI_ADMIN_KEY",
            BundleKey::InferenceUrl => "OLLAMA_HOST",
            BundleKey::ModelName => "MODEL_NAME",
            BundleKey::EmbeddingModel => "EMBEDDING_MODEL",
        }
    }

    /// Key for a variable name, if it is one of ours.
    #[must_use]
    pub fn from_name(name: &str) -> Option<BundleKey> {
        BundleKey::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// True for keys whose values must not be echoed to a terminal.
    #[must_use]
    pub const fn is_secret(self) -> bool {
        matches!(self, BundleKey::SearchKey | BundleKey::AdminKey)
    }
}

impl fmt::Display for BundleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered `KEY=value` pairs resolved by one bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentBundle {
    entries: Vec<(BundleKey, String)>,
}

impl EnvironmentBundle {
    /// Assemble a bundle from the values a run resolved.
    #[must_use]
    pub fn new(
        search: &ServiceEndpoint,
        credentials: &CredentialSet,
        inference: &ServiceEndpoint,
        model: &str,
        embedding_model: &str,
    ) -> Self {
        Self {
            entries: vec![
                (BundleKey::SearchUrl, search.url()),
                (BundleKey::SearchKey, credentials.search_key().to_string()),
                (BundleKey::AdminKey, credentials.admin_key().to_string()),
                (BundleKey::InferenceUrl, inference.url()),
                (BundleKey::ModelName, model.to_string()),
                (BundleKey::EmbeddingModel, embedding_model.to_string()),
            ],
        }
    }

    /// Bundle carrying only the two credential keys.
    ///
    /// This is the shape of the dev-mode key file the chat app reads.
    #[must_use]
    pub fn credentials_only(credentials: &CredentialSet) -> Self {
        Self {
            entries: vec![
                (BundleKey::SearchKey, credentials.search_key().to_string()),
                (BundleKey::AdminKey, credentials.admin_key().to_string()),
            ],
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[(BundleKey, String)] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, key: BundleKey) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Keys present in this bundle whose value is empty.
    #[must_use]
    pub fn empty_keys(&self) -> Vec<BundleKey> {
        self.entries
            .iter()
            .filter(|(_, v)| v.is_empty())
            .map(|(k, _)| *k)
            .collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.empty_keys().is_empty()
    }
}
