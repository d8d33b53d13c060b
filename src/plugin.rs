//! The devtools plugin
//!
//! Ties configuration, the subscription manager and the optional
//! instrumentation together behind the host's enable/disable hooks.

use std::sync::Arc;

use crate::config::DevToolsConfig;
use crate::handler::HandlerCatalog;
use crate::instrument::{Instrumentation, NoInstrumentation, installation_id};
use crate::sink::{LogSink, Sink};
use crate::subscription::SubscriptionManager;

pub const NAME: &str = "devtools";
pub const PREFIX: &str = "devtools";

pub struct DevTools {
    config: DevToolsConfig,
    catalog: Arc<HandlerCatalog>,
    manager: SubscriptionManager,
    instrumentation: Box<dyn Instrumentation>,
    enabled: bool,
}

impl DevTools {
    /// Plugin reporting to the `log` facade with no instrumentation
    pub fn new(config: DevToolsConfig, catalog: Arc<HandlerCatalog>) -> Self {
        Self::with_sink(config, catalog, Arc::new(LogSink))
    }

    pub fn with_sink(config: DevToolsConfig, catalog: Arc<HandlerCatalog>, sink: Arc<dyn Sink>) -> Self {
        let manager = SubscriptionManager::new(config.handler_namespaces.clone(), sink);
        Self {
            config,
            catalog,
            manager,
            instrumentation: Box::new(NoInstrumentation),
            enabled: false,
        }
    }

    pub fn with_instrumentation(mut self, instrumentation: Box<dyn Instrumentation>) -> Self {
        self.instrumentation = instrumentation;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn config(&self) -> &DevToolsConfig {
        &self.config
    }

    pub fn manager(&self) -> &SubscriptionManager {
        &self.manager
    }

    /// Subscribe to every discoverable event and install instrumentation.
    /// Returns the number of subscriptions made.
    pub fn on_enabled(&mut self) -> usize {
        if self.enabled {
            return self.manager.len();
        }
        if !self.config.enabled {
            log::info!("{} is disabled in config", NAME);
            return 0;
        }

        let count = match self.manager.activate(&self.catalog, &self.config.exclusions()) {
            Ok(count) => count,
            Err(e) => {
                log::error!("Event discovery failed : {:?}", e);
                0
            }
        };

        if self.config.instrumentation
            && let Err(e) = self.instrumentation.install(&installation_id(NAME))
        {
            log::error!("Patching failed : {:?}", e);
        }

        self.enabled = true;
        count
    }

    /// Detach everything and remove instrumentation
    pub fn on_disabled(&mut self) -> usize {
        if !self.enabled {
            return 0;
        }

        let count = self.manager.deactivate();

        if self.config.instrumentation
            && let Err(e) = self.instrumentation.remove()
        {
            log::error!("Unpatching failed : {:?}", e);
        }

        self.enabled = false;
        count
    }
}

impl Drop for DevTools {
    fn drop(&mut self) {
        self.on_disabled();
    }
}
