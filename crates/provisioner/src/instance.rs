use std::path::{Path, PathBuf};

use crate::{errors::ProvisionerError, settings::Settings};

/// One node deployment, identified by its number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    number: u32,
    directory: PathBuf,
    port: u16,
    info_file: PathBuf,
}

impl Instance {
    /// Instance `number` laid out per `settings`, listening on `port_base + number`.
    pub fn new(number: u32, settings: &Settings) -> Result<Self, ProvisionerError> {
        let port = u32::from(settings.port_base())
            .checked_add(number)
            .and_then(|port| u16::try_from(port).ok())
            .ok_or(ProvisionerError::PortOutOfRange(number, settings.port_base()))?;

        Ok(Self {
            number,
            directory: settings.node_dir(number),
            port,
            info_file: settings.info_file(number),
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn info_file(&self) -> &Path {
        &self.info_file
    }
}
