use std::path::{Path, PathBuf};

use serde::Deserialize;
use support::constants::{
    DEFAULT_INSTALL_SCRIPT_URL, FIRST_INSTANCE_NUMBER, INFO_DIR_NAME, NODE_DIR_PREFIX, PORT_BASE,
};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Home directory is not set (use --home or set HOME)")]
    MissingHome,
    #[error("Node directory prefix can't be empty")]
    EmptyPrefix,
    #[error("Info directory name '{0}' collides with the instance directory naming")]
    InfoDirCollision(String),
    #[error("First instance number {0} doesn't fit a port above base {1}")]
    PortOverflow(u32, u16),
    #[error("Can't read settings file {0:?}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("Can't parse settings file {0:?}: {1}")]
    Parse(PathBuf, toml::de::Error),
}

/// Host-wide settings for a provisioning run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Directory holding the instance directories and the info directory.
    home_dir: PathBuf,

    /// Location of the vendor installer script.
    install_script_url: String,

    /// Instance directories are named `<prefix><number>`.
    node_dir_prefix: String,

    info_dir_name: String,

    first_instance_number: u32,

    port_base: u16,
}

impl Settings {
    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn install_script_url(&self) -> &str {
        &self.install_script_url
    }

    pub fn node_dir_prefix(&self) -> &str {
        &self.node_dir_prefix
    }

    pub fn first_instance_number(&self) -> u32 {
        self.first_instance_number
    }

    pub fn port_base(&self) -> u16 {
        self.port_base
    }

    pub fn node_dir(&self, number: u32) -> PathBuf {
        self.home_dir
            .join(format!("{}{}", self.node_dir_prefix, number))
    }

    pub fn info_dir(&self) -> PathBuf {
        self.home_dir.join(&self.info_dir_name)
    }

    pub fn info_file(&self, number: u32) -> PathBuf {
        self.info_dir().join(format!("node_info_{number}.txt"))
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.node_dir_prefix.is_empty() {
            return Err(SettingsError::EmptyPrefix);
        }

        if let Some(suffix) = self.info_dir_name.strip_prefix(&self.node_dir_prefix) {
            if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
                return Err(SettingsError::InfoDirCollision(self.info_dir_name.clone()));
            }
        }

        u32::from(self.port_base)
            .checked_add(self.first_instance_number)
            .filter(|port| *port <= u32::from(u16::MAX))
            .ok_or(SettingsError::PortOverflow(
                self.first_instance_number,
                self.port_base,
            ))?;

        Ok(())
    }
}

/// Optional TOML file, every key may be omitted.
///
/// ```toml
/// home_dir = "/srv/gaia"
/// install_script_url = "https://mirror.internal/install.sh"
/// port_base = 9100
/// ```
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub home_dir: Option<PathBuf>,
    pub install_script_url: Option<String>,
    pub node_dir_prefix: Option<String>,
    pub info_dir_name: Option<String>,
    pub first_instance_number: Option<u32>,
    pub port_base: Option<u16>,
}

impl SettingsFile {
    pub fn load_from_toml(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::Read(path.to_path_buf(), e))?;

        toml::from_str(&content).map_err(|e| SettingsError::Parse(path.to_path_buf(), e))
    }
}

#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    home_dir: Option<PathBuf>,
    config: Settings,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self {
            home_dir: None,
            config: Settings {
                home_dir: PathBuf::new(),
                install_script_url: DEFAULT_INSTALL_SCRIPT_URL.to_string(),
                node_dir_prefix: NODE_DIR_PREFIX.to_string(),
                info_dir_name: INFO_DIR_NAME.to_string(),
                first_instance_number: FIRST_INSTANCE_NUMBER,
                port_base: PORT_BASE,
            },
        }
    }
}

impl SettingsBuilder {
    pub fn new() -> SettingsBuilder {
        Self::default()
    }

    fn transition(home_dir: Option<PathBuf>, config: Settings) -> Self {
        Self { home_dir, config }
    }

    pub fn with_home_dir(self, home_dir: impl Into<PathBuf>) -> Self {
        Self::transition(Some(home_dir.into()), self.config)
    }

    pub fn with_install_script_url(self, url: impl Into<String>) -> Self {
        Self::transition(
            self.home_dir,
            Settings {
                install_script_url: url.into(),
                ..self.config
            },
        )
    }

    pub fn with_node_dir_prefix(self, prefix: impl Into<String>) -> Self {
        Self::transition(
            self.home_dir,
            Settings {
                node_dir_prefix: prefix.into(),
                ..self.config
            },
        )
    }

    pub fn with_info_dir_name(self, name: impl Into<String>) -> Self {
        Self::transition(
            self.home_dir,
            Settings {
                info_dir_name: name.into(),
                ..self.config
            },
        )
    }

    pub fn with_first_instance_number(self, number: u32) -> Self {
        Self::transition(
            self.home_dir,
            Settings {
                first_instance_number: number,
                ..self.config
            },
        )
    }

    pub fn with_port_base(self, port_base: u16) -> Self {
        Self::transition(
            self.home_dir,
            Settings {
                port_base,
                ..self.config
            },
        )
    }

    /// Apply every key present in `file`.
    pub fn with_file(self, file: SettingsFile) -> Self {
        let mut builder = self;
        if let Some(home_dir) = file.home_dir {
            builder = builder.with_home_dir(home_dir);
        }
        if let Some(url) = file.install_script_url {
            builder = builder.with_install_script_url(url);
        }
        if let Some(prefix) = file.node_dir_prefix {
            builder = builder.with_node_dir_prefix(prefix);
        }
        if let Some(name) = file.info_dir_name {
            builder = builder.with_info_dir_name(name);
        }
        if let Some(number) = file.first_instance_number {
            builder = builder.with_first_instance_number(number);
        }
        if let Some(port_base) = file.port_base {
            builder = builder.with_port_base(port_base);
        }
        builder
    }

    /// Build the settings, taking the home directory from `HOME` when none was given.
    pub fn build(self) -> Result<Settings, SettingsError> {
        let home_dir = self
            .home_dir
            .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
            .filter(|home| !home.as_os_str().is_empty())
            .ok_or(SettingsError::MissingHome)?;

        let settings = Settings {
            home_dir,
            ..self.config
        };
        settings.validate()?;

        Ok(settings)
    }
}
