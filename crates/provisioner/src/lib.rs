//! Provisioning of several `gaianet` nodes on a single host.
//!
//! Instances live in `<home>/gaia-node-<N>` (`N >= 101`) and listen on port `8100 + N`. The
//! captured `gaianet info` output of each instance is kept in
//! `<home>/gaia-node-info/node_info_<N>.txt`.
//!
//! Instance numbers are found by scanning the home directory, the scan and the directory
//! creation are not atomic: two concurrent runs on the same host can pick the same numbers.

pub mod allocator;
pub mod errors;
pub mod fleet;
pub mod identity;
pub mod installer;
pub mod instance;
pub mod model;
pub mod node_cli;
pub mod provisioner;
pub mod settings;

pub use errors::ProvisionerError;
pub use fleet::Host;
pub use identity::NodeIdentity;
pub use instance::Instance;
pub use model::{KnownModel, ModelChoice, Selection, SelectionError, KNOWN_MODELS};
pub use provisioner::{ProvisionReport, ProvisionedInstance, Provisioner};
pub use settings::{Settings, SettingsBuilder, SettingsError, SettingsFile};
