use std::fs;

use stackup::application::environment;
use stackup::domain::{BundleKey, CredentialSet, EnvironmentBundle, ServiceEndpoint};
use stackup::error::Error;

fn bundle(search_key: &str, admin_key: &str) -> EnvironmentBundle {
    EnvironmentBundle::new(
        &ServiceEndpoint::new("localhost", 30700),
        &CredentialSet::new(search_key, admin_key),
        &ServiceEndpoint::local(11434),
        "llama3.2",
        "all-minilm",
    )
}

#[test]
fn written_bundle_reads_back_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");

    environment::write(&bundle("s=with=equals", "admin"), &path).unwrap();

    let pairs = environment::read(&path).unwrap();
    assert_eq!(pairs.len(), BundleKey::ALL.len());
    assert_eq!(pairs[0], ("MEILI_HOST".into(), "http://localhost:30700".into()));
    assert_eq!(pairs[1], ("MEILI_SEARCH_KEY".into(), "s=with=equals".into()));
    assert_eq!(pairs[3], ("OLLAMA_HOST".into(), "http://localhost:11434".into()));
}

#[test]
fn header_comment_is_ignored_on_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    environment::write(&bundle("s", "a"), &path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("# generated by stackup"));
    assert!(environment::read(&path)
        .unwrap()
        .iter()
        .all(|(k, _)| !k.starts_with('#')));
}

#[test]
fn rewrite_replaces_previous_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    environment::write(&bundle("old", "old"), &path).unwrap();
    environment::write(&bundle("new", "new"), &path).unwrap();

    let pairs = environment::read(&path).unwrap();
    assert!(pairs.iter().any(|(k, v)| k == "MEILI_SEARCH_KEY" && v == "new"));
    assert!(!pairs.iter().any(|(_, v)| v == "old"));
}

#[test]
fn unencodable_value_leaves_existing_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    environment::write(&bundle("good", "good"), &path).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    let err = environment::write(&bundle("bad\nkey", "good"), &path).unwrap_err();

    assert!(matches!(err, Error::ValueEncoding { ref key, .. } if key == "MEILI_SEARCH_KEY"));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name() != ".env")
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
}

#[test]
fn failed_rename_removes_temp_file_and_keeps_destination() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    fs::create_dir(&path).unwrap();
    fs::write(path.join("previous"), "MEILI_HOST=http://old:7700\n").unwrap();

    let err = environment::write(&bundle("s", "a"), &path).unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert!(!environment::temp_path_for(&path).exists());
    assert!(path.is_dir());
    assert_eq!(
        fs::read_to_string(path.join("previous")).unwrap(),
        "MEILI_HOST=http://old:7700\n"
    );
}

#[test]
fn missing_parent_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app").join("config").join(".env");
    environment::write(&bundle("s", "a"), &path).unwrap();
    assert!(path.exists());
}

#[test]
fn empty_credentials_are_written_as_empty_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    environment::write(&bundle("", ""), &path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("\nMEILI_SEARCH_KEY=\n"));
    assert!(content.contains("\nMEILI_ADMIN_KEY=\n"));
}

#[test]
fn line_without_separator_is_rejected() {
    let err = environment::parse("MEILI_HOST=http://x\nnot a record\n").unwrap_err();
    assert!(err.to_string().contains("line 2"));
}
