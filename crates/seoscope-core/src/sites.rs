use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::host::host_of;
use crate::ConfigError;

/// One site in the monitored portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
    /// Queries whose SERP position is tracked for this site.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl SiteConfig {
    /// Host of `url` as normalized by [`host_of`]. Validated sites always
    /// have one.
    #[must_use]
    pub fn domain(&self) -> String {
        host_of(&self.url).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct SitesFile {
    pub sites: Vec<SiteConfig>,
}

/// Load and validate the site portfolio from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sites(path: &Path) -> Result<SitesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SitesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sites_file: SitesFile = serde_yaml::from_str(&content)?;

    validate_sites(&sites_file)?;

    Ok(sites_file)
}

fn validate_sites(sites_file: &SitesFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for site in &sites_file.sites {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site name must be non-empty".to_string(),
            ));
        }

        let scheme = site.url.split_once("://").map(|(s, _)| s.to_ascii_lowercase());
        if !matches!(scheme.as_deref(), Some("http" | "https")) {
            return Err(ConfigError::Validation(format!(
                "site '{}' has url '{}'; must start with http:// or https://",
                site.name, site.url
            )));
        }

        if host_of(&site.url).is_none() {
            return Err(ConfigError::Validation(format!(
                "site '{}' has url '{}' with no host",
                site.name, site.url
            )));
        }

        if !seen_names.insert(site.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site name: '{}'",
                site.name
            )));
        }

        if site.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "site '{}' has an empty keyword",
                site.name
            )));
        }
    }

    Ok(())
}
