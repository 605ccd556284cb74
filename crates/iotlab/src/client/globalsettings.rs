use iotlab_core::{SiteRegistry, StaticSiteRegistry};

use crate::client::output::outputs::Output;
use crate::common::config::ClientConfig;

pub struct GlobalSettings {
    registry: StaticSiteRegistry,
    printer: Box<dyn Output>,
}

impl GlobalSettings {
    pub fn new(config: &ClientConfig, printer: Box<dyn Output>) -> Self {
        let registry = config.registry();
        log::debug!("Using testbed domain {}", registry.domain());
        GlobalSettings { registry, printer }
    }

    pub fn registry(&self) -> &StaticSiteRegistry {
        &self.registry
    }

    pub fn printer(&self) -> &dyn Output {
        self.printer.as_ref()
    }
}
