use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use support::{
    fs::FileSystem,
    net::Fetcher,
    process::{Command, ProcessManager},
};
use tracing::{debug, info};

use crate::errors::ProvisionerError;

/// File name the vendor installer is saved under, inside the instance directory.
pub const INSTALL_SCRIPT_NAME: &str = "install.sh";

/// Fetches the vendor install script and runs it against an instance directory.
#[derive(Debug, Clone)]
pub struct Installer<'a, FS, F, PM> {
    filesystem: &'a FS,
    fetcher: &'a F,
    process_manager: &'a PM,
    script_url: &'a str,
}

impl<'a, FS, F, PM> Installer<'a, FS, F, PM>
where
    FS: FileSystem + Send + Sync,
    F: Fetcher + Send + Sync,
    PM: ProcessManager + Send + Sync,
{
    pub fn new(
        filesystem: &'a FS,
        fetcher: &'a F,
        process_manager: &'a PM,
        script_url: &'a str,
    ) -> Self {
        Self {
            filesystem,
            fetcher,
            process_manager,
            script_url,
        }
    }

    /// Run `bash <base>/install.sh --base <base>`, returns the path of the saved script.
    ///
    /// `base` must already exist. The script is expected to leave the node CLI under
    /// `<base>/bin`.
    pub async fn install(&self, base: &Path) -> Result<PathBuf, ProvisionerError> {
        debug!("downloading installer from {}", self.script_url);
        let script = self.fetcher.fetch(self.script_url).await?;
        let script_path = base.join(INSTALL_SCRIPT_NAME);
        self.filesystem.write(&script_path, script).await?;

        info!("installing node into {}", base.display());
        let command = Command::new("bash")
            .args([script_path.as_os_str(), OsStr::new("--base"), base.as_os_str()])
            .current_dir(base);
        let line = command.to_string();

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

        Ok(script_path)
    }
}

#[cfg(test)]
mod tests {
    use support::{
        fs::in_memory::InMemoryFileSystem, net::FakeFetcher, process::fake::FakeProcessManager,
    };

    use super::*;

    const URL: &str = "https://installer.test/install.sh";

    #[tokio::test]
    async fn install_should_save_and_run_the_script_against_base() {
        let fs = InMemoryFileSystem::with_dirs(["/home/op/gaia-node-101"]);
        let fetcher = FakeFetcher::new().with(URL, "#!/bin/bash\necho install\n");
        let pm = FakeProcessManager::default();
        let base = Path::new("/home/op/gaia-node-101");

        let script = Installer::new(&fs, &fetcher, &pm, URL)
            .install(base)
            .await
            .unwrap();

        assert_eq!(script, PathBuf::from("/home/op/gaia-node-101/install.sh"));
        assert_eq!(
            fs.read(&script).await.unwrap(),
            b"#!/bin/bash\necho install\n"
        );
        let invocation = &pm.invocations()[0];
        assert_eq!(
            invocation.line(),
            "bash /home/op/gaia-node-101/install.sh --base /home/op/gaia-node-101"
        );
        assert_eq!(invocation.current_dir.as_deref(), Some(base));
        assert_eq!(fetcher.requests(), vec![URL.to_string()]);
    }

    #[tokio::test]
    async fn install_should_not_run_anything_when_download_fails() {
        let fs = InMemoryFileSystem::with_dirs(["/home/op/gaia-node-101"]);
        let fetcher = FakeFetcher::new();
        let pm = FakeProcessManager::default();

        let err = Installer::new(&fs, &fetcher, &pm, URL)
            .install(Path::new("/home/op/gaia-node-101"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionerError::Download(_)));
        assert_eq!(pm.count(), 0);
    }

    #[tokio::test]
    async fn install_should_fail_when_script_fails() {
        let fs = InMemoryFileSystem::with_dirs(["/home/op/gaia-node-101"]);
        let fetcher = FakeFetcher::new().with(URL, "exit 1");
        let pm = FakeProcessManager::default();
        pm.fail_when(1, |inv| inv.program_name() == "bash");

        let err = Installer::new(&fs, &fetcher, &pm, URL)
            .install(Path::new("/home/op/gaia-node-101"))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert!(matches!(err, ProvisionerError::CommandFailed { .. }));
    }
}
