//! Provisioner error definitions.

use std::process::ExitStatus;

use support::{fs::FileSystemError, net::NetError};

use crate::settings::SettingsError;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionerError {
    #[error(transparent)]
    FileSystem(#[from] FileSystemError),
    #[error("Installer download failed: {0}")]
    Download(#[from] NetError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{command}' failed with {status}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        /// Captured stderr, empty when the command ran on the terminal.
        stderr: String,
    },
    #[error("Instance count must be at least 1, got {0}")]
    InvalidCount(u32),
    #[error("Instance number {0} doesn't map to a valid port (port base {1})")]
    PortOutOfRange(u32, u16),
    #[error("No instance number left after {0}")]
    NumberExhausted(u32),
    #[error("Can't build PATH for {0}: {1}")]
    InvalidPath(String, std::env::JoinPathsError),
    #[error("Provisioning of instance {number} failed after {} completed instance(s): {source}", .completed.len())]
    Aborted {
        number: u32,
        completed: Vec<u32>,
        #[source]
        source: Box<ProvisionerError>,
    },
}

impl ProvisionerError {
    /// Exit code the process should end with: the failing command's own code when a command
    /// failed, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProvisionerError::CommandFailed { status, .. } => match status.code() {
                Some(0) | None => 1,
                Some(code) => code,
            },
            ProvisionerError::Aborted { source, .. } => source.exit_code(),
            _ => 1,
        }
    }
}
