pub const VALID_REGEX: &str = "regex should be valid ";

pub const THIS_IS_A_BUG: &str = "- this is a bug please report it";

/// Directory name prefix shared by every provisioned instance (`gaia-node-101`, ...).
pub const NODE_DIR_PREFIX: &str = "gaia-node-";
/// Directory, next to the instances, holding the captured `info` output of each instance.
pub const INFO_DIR_NAME: &str = "gaia-node-info";
/// Lowest instance number handed out.
pub const FIRST_INSTANCE_NUMBER: u32 = 101;
/// Instance `N` listens on `PORT_BASE + N`.
pub const PORT_BASE: u16 = 8100;
/// Vendor installer, fetched once per instance.
pub const DEFAULT_INSTALL_SCRIPT_URL: &str =
    "https://github.com/GaiaNet-AI/gaianet-node/releases/latest/download/install.sh";
/// Name of the node CLI binary dropped by the installer under `<base>/bin`.
pub const NODE_CLI_NAME: &str = "gaianet";
