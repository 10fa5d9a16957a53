//! Operations over every instance already present on the host.

use std::ffi::OsString;

use lazy_static::lazy_static;
use regex::Regex;
use support::{
    constants::{THIS_IS_A_BUG, VALID_REGEX},
    fs::FileSystem,
    process::ProcessManager,
};
use tracing::{info, warn};

use crate::{
    allocator, errors::ProvisionerError, identity::NodeIdentity, instance::Instance,
    node_cli::NodeCli, settings::Settings,
};

lazy_static! {
    static ref INFO_FILE_RE: Regex = Regex::new(r"^node_info_(\d+)\.txt$")
        .unwrap_or_else(|_| panic!("{VALID_REGEX} {THIS_IS_A_BUG}"));
}

/// The host the instances live on: its settings, filesystem and process manager.
#[derive(Debug, Clone)]
pub struct Host<FS, PM> {
    pub(crate) settings: Settings,
    pub(crate) filesystem: FS,
    pub(crate) process_manager: PM,
    /// `PATH` the node CLIs are run with, after their own `bin` directory.
    pub(crate) inherited_path: Option<OsString>,
}

impl<FS, PM> Host<FS, PM>
where
    FS: FileSystem + Send + Sync,
    PM: ProcessManager + Send + Sync,
{
    /// Host inheriting the `PATH` of the current process.
    pub fn new(settings: Settings, filesystem: FS, process_manager: PM) -> Self {
        Self {
            settings,
            filesystem,
            process_manager,
            inherited_path: std::env::var_os("PATH"),
        }
    }

    pub fn with_inherited_path(self, inherited_path: Option<OsString>) -> Self {
        Self {
            inherited_path,
            ..self
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn node_cli(&self, instance: &Instance) -> Result<NodeCli<'_, PM>, ProvisionerError> {
        NodeCli::new(
            &self.process_manager,
            instance.directory(),
            self.inherited_path.as_ref(),
        )
    }

    /// Existing instances, by ascending number.
    pub async fn instances(&self) -> Result<Vec<Instance>, ProvisionerError> {
        allocator::existing_numbers(&self.filesystem, &self.settings)
            .await?
            .into_iter()
            .map(|number| Instance::new(number, &self.settings))
            .collect()
    }

    /// `gaianet start` on every existing instance, stopping at the first failure.
    pub async fn start_all(&self) -> Result<Vec<u32>, ProvisionerError> {
        let mut started = vec![];
        for instance in self.instances().await? {
            info!("starting instance {}", instance.number());
            self.node_cli(&instance)?.start().await?;
            started.push(instance.number());
        }

        Ok(started)
    }

    /// `gaianet stop` on every existing instance, stopping at the first failure.
    pub async fn stop_all(&self) -> Result<Vec<u32>, ProvisionerError> {
        let mut stopped = vec![];
        for instance in self.instances().await? {
            info!("stopping instance {}", instance.number());
            self.node_cli(&instance)?.stop().await?;
            stopped.push(instance.number());
        }

        Ok(stopped)
    }

    /// Identities recorded in the info directory, by ascending instance number.
    pub async fn identities(&self) -> Result<Vec<NodeIdentity>, ProvisionerError> {
        let info_dir = self.settings.info_dir();
        if !self.filesystem.exists(&info_dir).await {
            return Ok(vec![]);
        }

        let mut numbers = self
            .filesystem
            .list_dir(&info_dir)
            .await?
            .into_iter()
            .filter(|entry| !entry.is_dir)
            .filter_map(|entry| {
                INFO_FILE_RE
                    .captures(&entry.name)
                    .and_then(|caps| caps[1].parse::<u32>().ok())
            })
            .collect::<Vec<_>>();
        numbers.sort_unstable();

        let mut identities = vec![];
        for number in numbers {
            let content = self
                .filesystem
                .read(self.settings.info_file(number))
                .await?;
            let identity = NodeIdentity::parse(number, &String::from_utf8_lossy(&content));
            if !identity.is_complete() {
                warn!("info file of instance {number} is missing an ID");
            }
            identities.push(identity);
        }

        Ok(identities)
    }
}
