use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A persisted user policy for one category of network request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    Always,
    #[default]
    Ask,
    Never,
}

impl std::fmt::Display for PermissionDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionDecision::Always => write!(f, "always"),
            PermissionDecision::Ask => write!(f, "ask"),
            PermissionDecision::Never => write!(f, "never"),
        }
    }
}

impl FromStr for PermissionDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(PermissionDecision::Always),
            "ask" => Ok(PermissionDecision::Ask),
            "never" => Ok(PermissionDecision::Never),
            other => Err(format!(
                "unknown permission '{other}'; expected always, ask or never"
            )),
        }
    }
}
