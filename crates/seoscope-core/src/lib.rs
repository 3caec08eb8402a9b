pub mod app_config;
pub mod config;
pub mod host;
pub mod sites;
pub mod weights;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use host::host_of;
pub use sites::{load_sites, SiteConfig, SitesFile};
pub use weights::{Category, ScoreWeights};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid score weights: {0}")]
    InvalidWeights(String),

    #[error("failed to read sites file {path}: {source}")]
    SitesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sites file: {0}")]
    SitesFileParse(#[from] serde_yaml::Error),

    #[error("sites validation failed: {0}")]
    Validation(String),
}
