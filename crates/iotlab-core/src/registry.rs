use std::collections::BTreeSet;

use crate::common::error::SpecError;
use crate::node::DEFAULT_DOMAIN;

pub const DEFAULT_SITES: &[&str] = &[
    "grenoble",
    "lille",
    "lyon",
    "paris",
    "saclay",
    "strasbourg",
];

pub const DEFAULT_ARCHITECTURES: &[&str] = &[
    "a8",
    "arduino-zero",
    "des",
    "firefly",
    "m3",
    "microbit",
    "nrf51dk",
    "nrf52dk",
    "nrf52840dk",
    "rpi3",
    "samr21",
    "st-lrwan1",
    "wsn430",
];

/// Source of truth for the sites and node architectures of the testbed.
pub trait SiteRegistry {
    fn is_valid_site(&self, name: &str) -> bool;
    fn is_valid_architecture(&self, name: &str) -> bool;

    /// Domain appended to physical node identifiers.
    fn domain(&self) -> &str {
        DEFAULT_DOMAIN
    }

    fn check_site(&self, name: &str) -> crate::Result<()> {
        if self.is_valid_site(name) {
            Ok(())
        } else {
            Err(SpecError::UnknownSite(name.to_string()))
        }
    }

    fn check_architecture(&self, name: &str) -> crate::Result<()> {
        if self.is_valid_architecture(name) {
            Ok(())
        } else {
            Err(SpecError::UnknownArchitecture(name.to_string()))
        }
    }
}

/// Registry backed by fixed lists.
#[derive(Clone, Debug)]
pub struct StaticSiteRegistry {
    sites: BTreeSet<String>,
    architectures: BTreeSet<String>,
    domain: String,
}

impl StaticSiteRegistry {
    pub fn new<S: Into<String>>(
        sites: impl IntoIterator<Item = S>,
        architectures: impl IntoIterator<Item = S>,
        domain: impl Into<String>,
    ) -> Self {
        StaticSiteRegistry {
            sites: sites.into_iter().map(Into::into).collect(),
            architectures: architectures.into_iter().map(Into::into).collect(),
            domain: domain.into(),
        }
    }

    pub fn sites(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().map(|s| s.as_str())
    }

    pub fn architectures(&self) -> impl Iterator<Item = &str> {
        self.architectures.iter().map(|s| s.as_str())
    }
}

impl Default for StaticSiteRegistry {
    fn default() -> Self {
        Self::new(
            DEFAULT_SITES.iter().copied(),
            DEFAULT_ARCHITECTURES.iter().copied(),
            DEFAULT_DOMAIN,
        )
    }
}

impl SiteRegistry for StaticSiteRegistry {
    fn is_valid_site(&self, name: &str) -> bool {
        self.sites.contains(name)
    }

    fn is_valid_architecture(&self, name: &str) -> bool {
        self.architectures.contains(name)
    }

    fn domain(&self) -> &str {
        &self.domain
    }
}
