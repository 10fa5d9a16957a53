use lazy_static::lazy_static;
use regex::Regex;
use support::constants::{THIS_IS_A_BUG, VALID_REGEX};

lazy_static! {
    static ref NODE_ID_RE: Regex = Regex::new(r"(?mi)^[^\S\n]*Node ID:[^\S\n]*(\S+)")
        .unwrap_or_else(|_| panic!("{VALID_REGEX} {THIS_IS_A_BUG}"));
    static ref DEVICE_ID_RE: Regex = Regex::new(r"(?mi)^[^\S\n]*Device ID:[^\S\n]*(\S+)")
        .unwrap_or_else(|_| panic!("{VALID_REGEX} {THIS_IS_A_BUG}"));
    // terminal colors emitted by the node CLI
    static ref ANSI_RE: Regex = Regex::new(r"\x1b\[[0-9;]*[A-Za-z]")
        .unwrap_or_else(|_| panic!("{VALID_REGEX} {THIS_IS_A_BUG}"));
}

/// Identifiers reported by `gaianet info` for one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub number: u32,
    pub node_id: Option<String>,
    pub device_id: Option<String>,
}

impl NodeIdentity {
    pub fn parse(number: u32, info: &str) -> Self {
        let info = ANSI_RE.replace_all(info, "");
        let capture = |re: &Regex| {
            re.captures(&info)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        };

        Self {
            number,
            node_id: capture(&NODE_ID_RE),
            device_id: capture(&DEVICE_ID_RE),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.node_id.is_some() && self.device_id.is_some()
    }
}
