//! Search-service credentials.

use std::fmt;

/// Field label for the search key, used in diagnostics.
pub const SEARCH_KEY_FIELD: &str = "search key";
/// Field label for the admin key, used in diagnostics.
pub const ADMIN_KEY_FIELD: &str = "admin key";

/// The pair of operational keys handed to downstream applications.
///
/// A set is complete only when both keys are non-empty. Keys are stored
/// without surrounding whitespace.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    search_key: String,
    admin_key: String,
}

impl CredentialSet {
    #[must_use]
    pub fn new(search_key: impl Into<String>, admin_key: impl Into<String>) -> Self {
        Self {
            search_key: trimmed(search_key.into()),
            admin_key: trimmed(admin_key.into()),
        }
    }

    #[must_use]
    pub fn search_key(&self) -> &str {
        &self.search_key
    }

    #[must_use]
    pub fn admin_key(&self) -> &str {
        &self.admin_key
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Labels of the empty fields, in a stable order.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.search_key.is_empty() {
            missing.push(SEARCH_KEY_FIELD);
        }
        if self.admin_key.is_empty() {
            missing.push(ADMIN_KEY_FIELD);
        }
        missing
    }

    /// Fill empty fields from `other`, keeping values already present.
    #[must_use]
    pub fn merge(self, other: CredentialSet) -> Self {
        Self {
            search_key: if self.search_key.is_empty() {
                other.search_key
            } else {
                self.search_key
            },
            admin_key: if self.admin_key.is_empty() {
                other.admin_key
            } else {
                self.admin_key
            },
        }
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("search_key", &mask(&self.search_key))
            .field("admin_key", &mask(&self.admin_key))
            .finish()
    }
}

/// High-privilege key used only to list operational keys.
///
/// Never written to the bundle. `Debug` and `Display` do not reveal it.
#[derive(Clone, PartialEq, Eq)]
pub struct MasterKey(String);

impl MasterKey {
    /// Wrap a trimmed raw value, returning `None` when it is blank.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = trimmed(value.into());
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(****)")
    }
}

/// A named key returned by the search service's key listing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ApiKey {
    #[serde(default)]
    pub name: Option<String>,
    pub key: String,
}

/// Mask a secret for display: first four characters, then asterisks.
#[must_use]
pub fn mask(value: &str) -> String {
    if value.is_empty() {
        return "<empty>".to_string();
    }
    if value.chars().count() <= 8 {
        return "****".to_string();
    }
    let visible: String = value.chars().take(4).collect();
    format!("{visible}****")
}

fn trimmed(value: String) -> String {
    if value.trim().len() == value.len() {
        value
    } else {
        value.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_only_when_both_present() {
        assert!(CredentialSet::new("a", "b").is_complete());
        assert!(!CredentialSet::new("a", "").is_complete());
        assert!(!CredentialSet::default().is_complete());
    }

    #[test]
    fn missing_lists_empty_fields_in_order() {
        assert_eq!(
            CredentialSet::default().missing(),
            vec![SEARCH_KEY_FIELD, ADMIN_KEY_FIELD]
        );
        assert_eq!(CredentialSet::new("", "x").missing(), vec![SEARCH_KEY_FIELD]);
    }

    #[test]
    fn merge_keeps_existing_values() {
        let merged = CredentialSet::new("keep", "").merge(CredentialSet::new("other", "admin"));
        assert_eq!(merged.search_key(), "keep");
        assert_eq!(merged.admin_key(), "admin");
    }

    #[test]
    fn debug_output_masks_keys() {
        let set = CredentialSet::new("abcdefghijkl", "");
        let rendered = format!("{set:?}");
        assert!(!rendered.contains("abcdefghijkl"));
        assert!(rendered.contains("abcd****"));
        assert!(rendered.contains("<empty>"));
    }

    #[test]
    fn blank_master_key_is_rejected() {
        assert!(MasterKey::new("  ").is_none());
        let key = MasterKey::new("dev-key").unwrap();
        assert_eq!(key.expose(), "dev-key");
        assert_eq!(format!("{key:?}"), "MasterKey(****)");
    }

    #[test]
    fn surrounding_whitespace_is_dropped() {
        let set = CredentialSet::new("search-key\n", " admin-key\r\n");
        assert_eq!(set.search_key(), "search-key");
        assert_eq!(set.admin_key(), "admin-key");
        assert!(!CredentialSet::new("\n", "a").is_complete());
        assert_eq!(MasterKey::new("dev-key\n").unwrap().expose(), "dev-key");
    }
}
