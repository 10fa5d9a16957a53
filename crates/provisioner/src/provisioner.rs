use std::path::PathBuf;

use support::{fs::FileSystem, net::Fetcher, process::ProcessManager};
use tracing::{error, info};

use crate::{
    allocator,
    errors::ProvisionerError,
    fleet::Host,
    identity::NodeIdentity,
    installer::Installer,
    instance::Instance,
    model::ModelChoice,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedInstance {
    pub instance: Instance,
    pub info_file: PathBuf,
    pub identity: NodeIdentity,
}

/// Outcome of a run where every requested instance was provisioned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub instances: Vec<ProvisionedInstance>,
}

/// Provisions new instances on a [`Host`], one after the other.
pub struct Provisioner<FS, PM, F> {
    host: Host<FS, PM>,
    fetcher: F,
}

impl<FS, PM, F> Provisioner<FS, PM, F>
where
    FS: FileSystem + Send + Sync,
    PM: ProcessManager + Send + Sync,
    F: Fetcher + Send + Sync,
{
    pub fn new(host: Host<FS, PM>, fetcher: F) -> Self {
        Self { host, fetcher }
    }

    /// Instances the next run of `count` would create, nothing is touched.
    pub async fn plan(&self, count: u32) -> Result<Vec<Instance>, ProvisionerError> {
        allocator::plan(&self.host.filesystem, &self.host.settings, count).await
    }

    /// Provision `count` new instances, all initialized with `model`.
    ///
    /// Stops at the first failing step. Instances completed before it are left installed and
    /// running; nothing is attempted for the following ones.
    pub async fn provision(
        &self,
        model: &ModelChoice,
        count: u32,
    ) -> Result<ProvisionReport, ProvisionerError> {
        let instances = self.plan(count).await?;
        if let (Some(first), Some(last)) = (instances.first(), instances.last()) {
            info!(
                "provisioning {count} instance(s) with {model}: numbers {}..={}, ports {}..={}",
                first.number(),
                last.number(),
                first.port(),
                last.port()
            );
        }

        self.host
            .filesystem
            .create_dir_all(self.host.settings.info_dir())
            .await?;

        let mut report = ProvisionReport::default();
        for instance in instances {
            let number = instance.number();
            match self.provision_instance(instance, model).await {
                Ok(provisioned) => report.instances.push(provisioned),
                Err(err) => {
                    error!("instance {number} failed: {err}");
                    return Err(ProvisionerError::Aborted {
                        number,
                        completed: report
                            .instances
                            .iter()
                            .map(|p| p.instance.number())
                            .collect(),
                        source: Box::new(err),
                    });
                },
            }
        }

        Ok(report)
    }

    async fn provision_instance(
        &self,
        instance: Instance,
        model: &ModelChoice,
    ) -> Result<ProvisionedInstance, ProvisionerError> {
        let number = instance.number();
        let base = instance.directory();
        info!(
            "instance {number}: creating {} (port {})",
            base.display(),
            instance.port()
        );
        self.host.filesystem.create_dir(base).await?;

        Installer::new(
            &self.host.filesystem,
            &self.fetcher,
            &self.host.process_manager,
            self.host.settings.install_script_url(),
        )
        .install(base)
        .await?;

        let cli = self.host.node_cli(&instance)?;
        info!("instance {number}: init with {}", model.config_url());
        cli.init(Some(model.config_url())).await?;
        info!("instance {number}: setting port {}", instance.port());
        cli.set_port(instance.port()).await?;
        // the port change only applies after another init
        cli.init(None).await?;
        info!("instance {number}: starting");
        cli.start().await?;

        let info = cli.info().await?;
        self.host
            .filesystem
            .write(instance.info_file(), &info)
            .await?;
        let identity = NodeIdentity::parse(number, &String::from_utf8_lossy(&info));
        info!(
            "instance {number}: up, node id {}, device id {}",
            identity.node_id.as_deref().unwrap_or("<unknown>"),
            identity.device_id.as_deref().unwrap_or("<unknown>")
        );

        Ok(ProvisionedInstance {
            info_file: instance.info_file().to_path_buf(),
            instance,
            identity,
        })
    }
}
