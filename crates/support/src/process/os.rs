use std::{
    io,
    process::{ExitStatus, Output, Stdio},
};

use async_trait::async_trait;
use tracing::trace;

use crate::process::{Command, ProcessManager};

#[derive(Debug, Default, Clone)]
pub struct OsProcessManager;

impl OsProcessManager {
    fn create_base_command(command: Command) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(command.get_program());

        if !command.get_args().is_empty() {
            cmd.args(command.get_args());
        }

        if !command.get_envs().is_empty() {
            cmd.envs(command.get_envs().iter().map(|(k, v)| (k, v)));
        }

        if let Some(dir) = command.get_current_dir() {
            cmd.current_dir(dir);
        }

        cmd
    }
}

#[async_trait]
impl ProcessManager for OsProcessManager {
    async fn output(&self, command: Command) -> io::Result<Output> {
        trace!("running (captured): {command}");
        let mut base_command = OsProcessManager::create_base_command(command);
        base_command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        base_command.output().await
    }

    async fn status(&self, command: Command) -> io::Result<ExitStatus> {
        trace!("running: {command}");
        let mut base_command = OsProcessManager::create_base_command(command);

        base_command.status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn output_should_capture_stdout_and_exit_status() {
        let pm = OsProcessManager;

        let output = pm
            .output(
                Command::new("sh")
                    .args(["-c", "echo \"Node ID: $NODE\"; exit 3"])
                    .env("NODE", "0x1"),
            )
            .await
            .unwrap();

        assert_eq!(output.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&output.stdout), "Node ID: 0x1\n");
    }

    #[tokio::test]
    async fn output_should_run_in_current_dir() {
        let pm = OsProcessManager;

        let output = pm
            .output(Command::new("pwd").current_dir("/tmp"))
            .await
            .unwrap();

        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).trim().ends_with("tmp"));
    }

    #[tokio::test]
    async fn status_should_bubble_up_spawn_errors() {
        let pm = OsProcessManager;

        let err = pm
            .status(Command::new("/nonexistent/bin/gaianet"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
