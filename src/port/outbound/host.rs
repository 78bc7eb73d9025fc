//! Local host port: executables, processes and sockets on this machine.

use async_trait::async_trait;

use crate::error::Result;

/// Side effects on the machine running the bootstrap.
#[async_trait]
pub trait HostSystem: Send + Sync {
    /// True when `binary` resolves on `PATH`.
    fn has_executable(&self, binary: &str) -> bool;

    /// Run a command to completion, failing on a non-zero exit.
    async fn run(&self, argv: &[String]) -> Result<()>;

    /// Start a command in the background without waiting for it.
    ///
    /// The child is not owned by the caller and outlives the process.
    fn spawn_detached(&self, argv: &[String], env: &[(String, String)]) -> Result<()>;

    /// True when something accepts TCP connections on `127.0.0.1:port`.
    async fn port_open(&self, port: u16) -> bool;
}
