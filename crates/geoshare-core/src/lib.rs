pub mod app_config;
pub mod config;
pub mod permission;
pub mod preferences;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use permission::PermissionDecision;
pub use preferences::{
    MemoryPreferences, PreferencesStore, YamlPreferences, CONNECTION_PERMISSION_KEY,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read preferences file {path}: {source}")]
    PreferencesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse preferences file: {0}")]
    PreferencesFileParse(#[from] serde_yaml::Error),
}
