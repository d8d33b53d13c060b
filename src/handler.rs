//! Handler catalog
//!
//! A handler type groups related events under a namespace, the way a plugin
//! framework exposes `Player`, `Server`, `Map` and so on. The catalog is the
//! discoverable collection of those types; it may change between activation
//! cycles when plugins are reloaded.

use eyre::Result;
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

use crate::event::EventMember;

/// A type exposing zero or more event members
pub trait HandlerSource: Send + Sync {
    fn namespace(&self) -> &str;

    fn name(&self) -> &str;

    /// Enumerate the event members; may fail for a single handler
    fn events(&self) -> Result<Vec<Arc<dyn EventMember>>>;

    /// `namespace.name`
    fn full_name(&self) -> String {
        format!("{}.{}", self.namespace(), self.name())
    }
}

/// Handler with a fixed list of events
pub struct Handler {
    namespace: String,
    name: String,
    events: Vec<Arc<dyn EventMember>>,
}

impl Handler {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            events: Vec::new(),
        }
    }

    /// Builder-style event registration
    pub fn with_event(mut self, event: Arc<dyn EventMember>) -> Self {
        self.events.push(event);
        self
    }
}

impl HandlerSource for Handler {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn events(&self) -> Result<Vec<Arc<dyn EventMember>>> {
        Ok(self.events.clone())
    }
}

/// Thread-safe collection of handler types keyed by full name
#[derive(Default)]
pub struct HandlerCatalog {
    handlers: RwLock<IndexMap<String, Arc<dyn HandlerSource>>>,
}

impl HandlerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a handler type
    pub fn register(&self, handler: Arc<dyn HandlerSource>) -> Result<()> {
        let key = handler.full_name();
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| eyre::eyre!("handler catalog is poisoned"))?;
        if handlers.insert(key.clone(), handler).is_some() {
            log::debug!("Replaced handler type {}", key);
        }
        Ok(())
    }

    /// Remove a handler type by its full name
    pub fn unregister(&self, full_name: &str) -> Result<bool> {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| eyre::eyre!("handler catalog is poisoned"))?;
        Ok(handlers.shift_remove(full_name).is_some())
    }

    /// All handler types in registration order
    pub fn handlers(&self) -> Result<Vec<Arc<dyn HandlerSource>>> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| eyre::eyre!("handler catalog is poisoned"))?;
        Ok(handlers.values().cloned().collect())
    }

    /// Handler types whose namespace is one of `namespaces`
    pub fn in_namespaces(&self, namespaces: &[String]) -> Result<Vec<Arc<dyn HandlerSource>>> {
        Ok(self
            .handlers()?
            .into_iter()
            .filter(|h| namespaces.iter().any(|ns| ns == h.namespace()))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.handlers.read().map(|h| h.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
