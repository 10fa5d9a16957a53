use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use support::{
    constants::NODE_CLI_NAME,
    process::{Command, ProcessManager},
};
use tracing::{debug, trace};

use crate::errors::ProvisionerError;

/// Invocation context of the `gaianet` CLI installed in one instance directory.
///
/// Every command runs `<base>/bin/gaianet` with `PATH` set to `<base>/bin` followed by the
/// inherited `PATH`; the environment of the current process is left untouched.
#[derive(Debug, Clone)]
pub struct NodeCli<'a, PM> {
    process_manager: &'a PM,
    base: PathBuf,
    binary: PathBuf,
    path_env: OsString,
}

impl<'a, PM> NodeCli<'a, PM>
where
    PM: ProcessManager + Send + Sync,
{
    pub fn new(
        process_manager: &'a PM,
        base: impl AsRef<Path>,
        inherited_path: Option<&OsString>,
    ) -> Result<Self, ProvisionerError> {
        let base = base.as_ref().to_path_buf();
        let bin_dir = base.join("bin");
        let binary = bin_dir.join(NODE_CLI_NAME);

        let mut paths = vec![bin_dir];
        if let Some(inherited) = inherited_path {
            paths.extend(std::env::split_paths(inherited));
        }
        let path_env = std::env::join_paths(paths)
            .map_err(|e| ProvisionerError::InvalidPath(base.to_string_lossy().to_string(), e))?;

        Ok(Self {
            process_manager,
            base,
            binary,
            path_env,
        })
    }

    /// `gaianet init --base <base> [--config <url>]`
    pub async fn init(&self, config_url: Option<&str>) -> Result<(), ProvisionerError> {
        let mut args = vec!["init".to_string()];
        args.extend(self.base_args());
        if let Some(url) = config_url {
            args.extend(["--config".to_string(), url.to_string()]);
        }

        self.run(args).await
    }

    /// `gaianet config --base <base> --port <port>`
    pub async fn set_port(&self, port: u16) -> Result<(), ProvisionerError> {
        let mut args = vec!["config".to_string()];
        args.extend(self.base_args());
        args.extend(["--port".to_string(), port.to_string()]);

        self.run(args).await
    }

    pub async fn start(&self) -> Result<(), ProvisionerError> {
        self.run(self.subcommand("start")).await
    }

    pub async fn stop(&self) -> Result<(), ProvisionerError> {
        self.run(self.subcommand("stop")).await
    }

    /// Captured stdout of `gaianet info --base <base>`, as the raw bytes the CLI wrote.
    pub async fn info(&self) -> Result<Vec<u8>, ProvisionerError> {
        let command = self.command(self.subcommand("info"));
        let line = command.to_string();
        debug!("running '{line}'");

        let output = self
            .process_manager
            .output(command)
            .await
            .map_err(|source| ProvisionerError::Spawn {
                command: line.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProvisionerError::CommandFailed {
                command: line,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        trace!("info output: {}", String::from_utf8_lossy(&output.stdout));
        Ok(output.stdout)
    }

    fn base_args(&self) -> [String; 2] {
        ["--base".to_string(), self.base.to_string_lossy().to_string()]
    }

    fn subcommand(&self, name: &str) -> Vec<String> {
        let mut args = vec![name.to_string()];
        args.extend(self.base_args());
        args
    }

    fn command(&self, args: Vec<String>) -> Command {
        Command::new(&self.binary)
            .args(args)
            .env("PATH", &self.path_env)
    }

    async fn run(&self, args: Vec<String>) -> Result<(), ProvisionerError> {
        let command = self.command(args);
        let line = command.to_string();
        debug!("running '{line}'");

        let status = self
            .process_manager
            .status(command)
            .await
            .map_err(|source| ProvisionerError::Spawn {
                command: line.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ProvisionerError::CommandFailed {
                command: line,
                status,
                stderr: String::new(),
            });
        }

        Ok(())
    }
}
