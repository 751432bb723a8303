use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Runtime settings for the converter and its network capability.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Connect timeout shared by the unshorten lookup and the HTML fetch.
    pub connect_timeout_secs: u64,
    /// Read timeout shared by the unshorten lookup and the HTML fetch.
    pub read_timeout_secs: u64,
    /// Sent with the HTML fetch so Google serves the full page variant.
    pub user_agent: String,
    pub preferences_path: PathBuf,
}
