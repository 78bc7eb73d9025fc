//! The machine the bootstrap runs on.

use std::env;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::port::outbound::host::HostSystem;

/// How long a port check waits for the TCP handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// [`HostSystem`] backed by the real `PATH`, processes and sockets.
#[derive(Debug, Clone, Default)]
pub struct ProcessHost;

impl ProcessHost {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn split(argv: &[String]) -> Result<(&String, &[String])> {
    argv.split_first().ok_or_else(|| Error::Command {
        command: String::new(),
        reason: "empty command line".to_string(),
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[async_trait]
impl HostSystem for ProcessHost {
    fn has_executable(&self, binary: &str) -> bool {
        if binary.contains(std::path::MAIN_SEPARATOR) {
            return is_executable(Path::new(binary));
        }
        let Some(paths) = env::var_os("PATH") else {
            return false;
        };
        env::split_paths(&paths).any(|dir| is_executable(&dir.join(binary)))
    }

    async fn run(&self, argv: &[String]) -> Result<()> {
        let (program, args) = split(argv)?;
        let rendered = argv.join(" ");
        debug!(command = %rendered, "Running");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::Command {
                command: rendered.clone(),
                reason: e.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(Error::Command {
            command: rendered,
            reason: if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            },
        })
    }

    fn spawn_detached(&self, argv: &[String], env: &[(String, String)]) -> Result<()> {
        let (program, args) = split(argv)?;
        let child = std::process::Command::new(program)
            .args(args)
            .envs(env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Command {
                command: argv.join(" "),
                reason: e.to_string(),
            })?;
        info!(pid = child.id(), command = %argv.join(" "), "Spawned background process");
        // Dropping the handle neither kills nor waits on the child.
        drop(child);
        Ok(())
    }

    async fn port_open(&self, port: u16) -> bool {
        matches!(
            tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(("127.0.0.1", port))).await,
            Ok(Ok(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| (*p).to_string()).collect()
    }

    #[test]
    fn unknown_binary_is_not_found() {
        assert!(!ProcessHost::new().has_executable("stackup-no-such-binary-7f3a"));
    }

    #[cfg(unix)]
    #[test]
    fn shell_is_found_on_path() {
        assert!(ProcessHost::new().has_executable("sh"));
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let err = ProcessHost::new().run(&[]).await.unwrap_err();
        assert!(matches!(err, Error::Command { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_reports_stderr() {
        let err = ProcessHost::new()
            .run(&argv(&["sh", "-c", "echo boom >&2; exit 3"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn listening_port_is_open() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(ProcessHost::new().port_open(port).await);
        drop(listener);
    }
}
