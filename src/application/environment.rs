//! Environment bundle persistence.
//!
//! Bundles are written as `KEY=value` lines. The whole file is rendered in
//! memory and validated first, then written to a sibling temp file, synced
//! and renamed over the destination, so readers see either the old bundle
//! or the new one and never a partial file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tracing::debug;

use crate::domain::EnvironmentBundle;
use crate::error::{Error, Result};

/// Characters that would split or truncate a `KEY=value` record.
const FORBIDDEN: [(char, &str); 3] = [
    ('\n', "contains a newline"),
    ('\r', "contains a carriage return"),
    ('\0', "contains a NUL byte"),
];

/// Render a bundle as file content.
///
/// # Errors
///
/// Returns [`Error::ValueEncoding`] for the first value that cannot be
/// represented on a single line.
pub fn render(bundle: &EnvironmentBundle) -> Result<String> {
    let mut out = format!(
        "# generated by stackup at {}\n",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    for (key, value) in bundle.entries() {
        if let Some((_, reason)) = FORBIDDEN.iter().find(|(c, _)| value.contains(*c)) {
            return Err(Error::ValueEncoding {
                key: key.as_str().to_string(),
                reason: (*reason).to_string(),
            });
        }
        out.push_str(key.as_str());
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    Ok(out)
}

/// Write `bundle` to `path`, replacing any existing file atomically.
///
/// Creates the parent directory if it doesn't exist.
///
/// # Errors
///
/// Returns [`Error::ValueEncoding`] before touching the filesystem when a
/// value is not representable, or an I/O error if writing fails. On I/O
/// failure the temp file is removed and `path` is left as it was.
pub fn write(bundle: &EnvironmentBundle, path: &Path) -> Result<()> {
    let content = render(bundle)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_path_for(path);
    let mut file = fs::File::create(&temp_path)?;

    let cleanup_and_err = |e| {
        let _ = fs::remove_file(&temp_path);
        e
    };

    file.write_all(content.as_bytes()).map_err(cleanup_and_err)?;
    file.sync_all().map_err(cleanup_and_err)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(cleanup_and_err)?;
    debug!(path = %path.display(), entries = bundle.entries().len(), "Bundle written");

    Ok(())
}

/// Read a bundle file back into ordered `(key, value)` pairs.
///
/// Blank lines and `#` comments are skipped; each record is split on its
/// first `=`.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or [`Error::Parse`] for
/// a line without `=`.
pub fn read(path: &Path) -> Result<Vec<(String, String)>> {
    let content = fs::read_to_string(path)?;
    parse(&content)
}

/// Parse bundle content. See [`read`].
///
/// # Errors
///
/// Returns [`Error::Parse`] for a non-comment line without `=`.
pub fn parse(content: &str) -> Result<Vec<(String, String)>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(index, line)| {
            line.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| Error::Parse(format!("line {}: expected KEY=value", index + 1)))
        })
        .collect()
}

/// Sibling temp file used while writing `path`.
#[must_use]
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BundleKey, CredentialSet, ServiceEndpoint};

    fn bundle(search_key: &str) -> EnvironmentBundle {
        EnvironmentBundle::new(
            &ServiceEndpoint::new("localhost", 30700),
            &CredentialSet::new(search_key, "admin=with=equals"),
            &ServiceEndpoint::local(11435),
            "llama3.2",
            "all-minilm",
        )
    }

    #[test]
    fn render_writes_header_and_records_in_order() {
        let content = render(&bundle("search")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[0].starts_with("# generated by stackup at "));
        assert_eq!(lines[1], "MEILI_HOST=http://localhost:30700");
        assert_eq!(lines[2], "MEILI_SEARCH_KEY=search");
        assert_eq!(lines[3], "MEILI_ADMIN_KEY=admin=with=equals");
        assert_eq!(lines[4], "OLLAMA_HOST=http://localhost:11435");
        assert_eq!(lines[5], "MODEL_NAME=llama3.2");
        assert_eq!(lines[6], "EMBEDDING_MODEL=all-minilm");
    }

    #[test]
    fn newline_in_value_is_rejected() {
        let err = render(&bundle("bad\nvalue")).unwrap_err();
        match err {
            Error::ValueEncoding { key, reason } => {
                assert_eq!(key, BundleKey::SearchKey.as_str());
                assert!(reason.contains("newline"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_splits_on_first_equals_and_skips_comments() {
        let pairs = parse("# header\n\nA=1\nB=x=y\n").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "x=y".to_string())
            ]
        );
    }

    #[test]
    fn parse_rejects_line_without_separator() {
        let err = parse("A=1\nnonsense\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn temp_path_is_a_sibling() {
        let temp = temp_path_for(Path::new("/srv/app/.env"));
        assert_eq!(temp, PathBuf::from("/srv/app/.env.tmp"));
    }
}
