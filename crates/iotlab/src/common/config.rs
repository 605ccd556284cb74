use std::path::Path;

use serde::Deserialize;

use iotlab_core::registry::{DEFAULT_ARCHITECTURES, DEFAULT_SITES};
use iotlab_core::{DEFAULT_DOMAIN, StaticSiteRegistry};

use crate::common::error::ClientError;

/// Client configuration loaded from a TOML file. Every key is optional.
///
/// ```toml
/// domain = "iot-lab.info"
/// sites = ["grenoble", "lille"]
/// architectures = ["m3", "a8"]
/// ```
#[derive(Deserialize, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub sites: Option<Vec<String>>,
    #[serde(default)]
    pub architectures: Option<Vec<String>>,
}

impl ClientConfig {
    pub fn parse(content: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Site and architecture names are parts of node host names, so they
    /// cannot be empty or contain a dot.
    fn check(&self) -> crate::Result<()> {
        let names = [("site", &self.sites), ("architecture", &self.architectures)];
        for (kind, values) in names {
            for value in values.iter().flatten() {
                if value.is_empty() || value.contains('.') || value.contains(char::is_whitespace) {
                    return Err(ClientError::ConfigError(format!(
                        "Invalid {kind} name '{value}'"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ClientError::FileError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|error| {
            ClientError::ConfigError(format!("{}: {error}", path.display()))
        })
    }

    /// Loads the configuration from `path`.
    /// A missing file is only an error when `explicit` is set.
    pub fn load_or_default(path: &Path, explicit: bool) -> crate::Result<Self> {
        if !explicit && !path.exists() {
            log::debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        log::debug!("Loading configuration from {}", path.display());
        Self::load(path)
    }

    pub fn registry(&self) -> StaticSiteRegistry {
        let sites: Vec<String> = match &self.sites {
            Some(sites) => sites.clone(),
            None => DEFAULT_SITES.iter().map(|s| s.to_string()).collect(),
        };
        let architectures: Vec<String> = match &self.architectures {
            Some(architectures) => architectures.clone(),
            None => DEFAULT_ARCHITECTURES.iter().map(|s| s.to_string()).collect(),
        };
        StaticSiteRegistry::new(
            sites,
            architectures,
            self.domain.as_deref().unwrap_or(DEFAULT_DOMAIN),
        )
    }
}
