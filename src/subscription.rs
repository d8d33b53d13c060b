//! Discovery and subscription management
//!
//! On activation the manager walks every handler type in the configured
//! namespaces, attaches a payload-specialized observer to each event member
//! that is not excluded, and records the attachment. Deactivation detaches
//! exactly what was recorded.
//!
//! Discovery is best-effort: a handler whose events cannot be enumerated, or
//! a member that refuses the callback, is logged and skipped. One missing
//! subscription never prevents the others.

use eyre::{Result, bail};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::event::{EventMember, HandlerId, Observer};
use crate::format::Formatter;
use crate::handler::HandlerCatalog;
use crate::inspect::{Inspect, panic_message};
use crate::config::Exclusions;
use crate::sink::{Sink, deliver};

/// One discoverable event member
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EventDescriptor {
    pub namespace: String,
    pub handler: String,
    pub name: String,
    /// Fully-qualified payload type name; `None` for payload-less events
    pub payload: Option<&'static str>,
}

impl fmt::Display for EventDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.handler, self.name)
    }
}

/// A live callback on a member
struct Attachment {
    member: Arc<dyn EventMember>,
    id: HandlerId,
}

/// Lifecycle of the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum State {
    Inactive,
    Active,
}

/// What discovery would do with a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Attach,
    Excluded,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedEvent {
    pub descriptor: EventDescriptor,
    pub disposition: Disposition,
}

/// Observer that renders every firing and hands it to the sink
pub struct ReportObserver {
    formatter: Formatter,
    sink: Arc<dyn Sink>,
}

impl ReportObserver {
    pub fn new(formatter: Formatter, sink: Arc<dyn Sink>) -> Self {
        Self { formatter, sink }
    }
}

impl Observer for ReportObserver {
    fn on_payload(&self, payload: &dyn Inspect) {
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
            let name = payload.describe().short_name();
            self.formatter.render(&name, payload)
        }));

        match rendered {
            Ok(report) => deliver(self.sink.as_ref(), &report),
            Err(e) => log::warn!("Dropped report, payload could not be rendered: {}", panic_message(e.as_ref())),
        }
    }

    fn on_signal(&self, event: &str) {
        deliver(self.sink.as_ref(), &self.formatter.render_signal(event));
    }
}

struct Inner {
    state: State,
    registry: IndexMap<EventDescriptor, Attachment>,
}

/// Owns the subscription registry for one activation cycle at a time
pub struct SubscriptionManager {
    namespaces: Vec<String>,
    sink: Arc<dyn Sink>,
    inner: Mutex<Inner>,
}

impl SubscriptionManager {
    pub fn new(namespaces: Vec<String>, sink: Arc<dyn Sink>) -> Self {
        Self {
            namespaces,
            sink,
            inner: Mutex::new(Inner {
                state: State::Inactive,
                registry: IndexMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Registry entries stay valid even if a previous holder panicked
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> State {
        self.lock().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == State::Active
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.lock().registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Descriptors of every live subscription, in attachment order
    pub fn descriptors(&self) -> Vec<EventDescriptor> {
        self.lock().registry.keys().cloned().collect()
    }

    /// Discover and attach; returns how many members were attached
    pub fn activate(&self, catalog: &HandlerCatalog, exclusions: &Exclusions) -> Result<usize> {
        let mut inner = self.lock();
        if inner.state == State::Active {
            bail!("subscription manager is already active");
        }

        let formatter = Formatter::new(exclusions.nested_types.clone());
        let observer: Arc<dyn Observer> = Arc::new(ReportObserver::new(formatter, Arc::clone(&self.sink)));

        for (descriptor, member) in self.discover(catalog)? {
            if exclusions.skips_event(&descriptor.name) {
                log::trace!("Skipping excluded event {}", descriptor);
                continue;
            }
            if inner.registry.contains_key(&descriptor) {
                log::warn!("Event {} discovered twice, keeping the first", descriptor);
                continue;
            }

            match member.attach(Arc::clone(&observer)) {
                Ok(id) => {
                    log::trace!("Attached {} to {}", id, descriptor);
                    inner.registry.insert(descriptor, Attachment { member, id });
                }
                Err(e) => {
                    log::warn!("Failed to attach to {}: {}", descriptor, e);
                }
            }
        }

        inner.state = State::Active;
        log::info!("Subscribed to {} events", inner.registry.len());
        Ok(inner.registry.len())
    }

    /// Detach everything recorded; returns how many were detached
    pub fn deactivate(&self) -> usize {
        let mut inner = self.lock();
        let mut detached = 0;

        for (descriptor, attachment) in inner.registry.drain(..) {
            match attachment.member.detach(attachment.id) {
                Ok(true) => detached += 1,
                Ok(false) => log::warn!("{} was already detached from {}", attachment.id, descriptor),
                Err(e) => log::warn!("Failed to detach from {}: {}", descriptor, e),
            }
        }

        if inner.state == State::Active {
            log::info!("Unsubscribed from {} events", detached);
        }
        inner.state = State::Inactive;
        detached
    }

    /// Dry run of discovery: every member and whether it would be attached
    pub fn plan(&self, catalog: &HandlerCatalog, exclusions: &Exclusions) -> Result<Vec<PlannedEvent>> {
        Ok(self
            .discover(catalog)?
            .into_iter()
            .map(|(descriptor, _)| {
                let disposition = if exclusions.skips_event(&descriptor.name) {
                    Disposition::Excluded
                } else {
                    Disposition::Attach
                };
                PlannedEvent {
                    descriptor,
                    disposition,
                }
            })
            .collect())
    }

    fn discover(&self, catalog: &HandlerCatalog) -> Result<Vec<(EventDescriptor, Arc<dyn EventMember>)>> {
        let mut found = Vec::new();

        for handler in catalog.in_namespaces(&self.namespaces)? {
            let events = match handler.events() {
                Ok(events) => events,
                Err(e) => {
                    log::warn!("Failed to enumerate events of {}: {}", handler.full_name(), e);
                    continue;
                }
            };

            for member in events {
                let descriptor = EventDescriptor {
                    namespace: handler.namespace().to_string(),
                    handler: handler.name().to_string(),
                    name: member.name().to_string(),
                    payload: member.payload().map(|layout| layout.type_name),
                };
                found.push((descriptor, member));
            }
        }

        Ok(found)
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        if !self.is_empty() {
            self.deactivate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, Signal};
    use crate::handler::{Handler, HandlerSource};
    use crate::sink::MemorySink;
    use std::collections::HashSet;

    const NS: &str = "game.handlers";

    struct Broken;

    impl HandlerSource for Broken {
        fn namespace(&self) -> &str {
            NS
        }

        fn name(&self) -> &str {
            "Broken"
        }

        fn events(&self) -> Result<Vec<Arc<dyn EventMember>>> {
            bail!("assembly failed to load")
        }
    }

    struct Fixture {
        catalog: HandlerCatalog,
        said: Arc<Event<String>>,
        started: Arc<Signal>,
        sink: Arc<MemorySink>,
        manager: SubscriptionManager,
    }

    fn fixture() -> Fixture {
        let said = Arc::new(Event::<String>::new("Said"));
        let started = Arc::new(Signal::new("RoundStarted"));
        let catalog = HandlerCatalog::new();
        catalog
            .register(Arc::new(
                Handler::new(NS, "Server")
                    .with_event(started.clone())
                    .with_event(said.clone()),
            ))
            .unwrap();
        catalog
            .register(Arc::new(
                Handler::new("elsewhere", "Ignored").with_event(Arc::new(Signal::new("Never"))),
            ))
            .unwrap();

        let sink = Arc::new(MemorySink::new());
        let manager = SubscriptionManager::new(vec![NS.to_string()], sink.clone());
        Fixture {
            catalog,
            said,
            started,
            sink,
            manager,
        }
    }

    #[test]
    fn test_activate_attaches_namespace_members() {
        let f = fixture();
        let count = f.manager.activate(&f.catalog, &Exclusions::default()).unwrap();

        assert_eq!(count, 2);
        assert!(f.manager.is_active());
        assert_eq!(f.said.subscriber_count(), 1);
        assert_eq!(f.started.subscriber_count(), 1);

        let names: Vec<String> = f.manager.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["RoundStarted", "Said"]);
    }

    #[test]
    fn test_firing_reaches_sink() {
        let f = fixture();
        f.manager.activate(&f.catalog, &Exclusions::default()).unwrap();

        f.started.fire();
        f.said.fire(&"hi".to_string());

        assert_eq!(f.sink.reports(), vec!["[RoundStarted]", "[String]"]);
    }

    #[test]
    fn test_excluded_events_skipped() {
        let f = fixture();
        let exclusions = Exclusions {
            events: HashSet::from(["Said".to_string()]),
            nested_types: HashSet::new(),
        };

        assert_eq!(f.manager.activate(&f.catalog, &exclusions).unwrap(), 1);
        assert_eq!(f.said.subscriber_count(), 0);
    }

    #[test]
    fn test_deactivate_is_idempotent() {
        let f = fixture();
        f.manager.activate(&f.catalog, &Exclusions::default()).unwrap();

        assert_eq!(f.manager.deactivate(), 2);
        assert!(f.manager.is_empty());
        assert_eq!(f.manager.state(), State::Inactive);
        assert_eq!(f.said.subscriber_count(), 0);

        assert_eq!(f.manager.deactivate(), 0);
        assert!(f.manager.is_empty());
    }

    #[test]
    fn test_double_activate_rejected() {
        let f = fixture();
        f.manager.activate(&f.catalog, &Exclusions::default()).unwrap();
        assert!(f.manager.activate(&f.catalog, &Exclusions::default()).is_err());
        assert_eq!(f.said.subscriber_count(), 1);
    }

    #[test]
    fn test_broken_handler_does_not_abort_scan() {
        let f = fixture();
        f.catalog.register(Arc::new(Broken)).unwrap();

        assert_eq!(f.manager.activate(&f.catalog, &Exclusions::default()).unwrap(), 2);
    }

    #[test]
    fn test_reactivation_rediscovers() {
        let f = fixture();
        f.manager.activate(&f.catalog, &Exclusions::default()).unwrap();
        f.manager.deactivate();

        f.catalog
            .register(Arc::new(
                Handler::new(NS, "Player").with_event(Arc::new(Event::<u32>::new("Hurting"))),
            ))
            .unwrap();
        assert_eq!(f.manager.activate(&f.catalog, &Exclusions::default()).unwrap(), 3);
        f.manager.deactivate();

        f.catalog.unregister(&format!("{}.Server", NS)).unwrap();
        assert_eq!(f.manager.activate(&f.catalog, &Exclusions::default()).unwrap(), 1);
    }

    #[test]
    fn test_plan_reports_exclusions() {
        let f = fixture();
        let exclusions = Exclusions {
            events: HashSet::from(["RoundStarted".to_string()]),
            nested_types: HashSet::new(),
        };

        let plan = f.manager.plan(&f.catalog, &exclusions).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].disposition, Disposition::Excluded);
        assert_eq!(plan[1].disposition, Disposition::Attach);
        assert_eq!(plan[1].descriptor.payload, Some(std::any::type_name::<String>()));
        assert!(f.manager.is_empty());
    }

    #[test]
    fn test_drop_detaches() {
        let f = fixture();
        f.manager.activate(&f.catalog, &Exclusions::default()).unwrap();
        let said = Arc::clone(&f.said);
        drop(f);
        assert_eq!(said.subscriber_count(), 0);
    }

    struct Unreadable;

    impl Inspect for Unreadable {
        fn layout() -> crate::inspect::Layout {
            crate::inspect::Layout::object("game::Unreadable", &[])
        }

        fn describe(&self) -> crate::inspect::Layout {
            Self::layout()
        }

        fn display(&self) -> String {
            "Unreadable".to_string()
        }

        fn attributes(&self) -> Vec<crate::inspect::Attribute<'_>> {
            panic!("attribute table corrupted")
        }
    }

    #[test]
    fn test_unrenderable_payload_loses_only_its_report() {
        let f = fixture();
        let broken = Arc::new(Event::<Unreadable>::new("Broken"));
        f.catalog
            .register(Arc::new(Handler::new(NS, "Flaky").with_event(broken.clone())))
            .unwrap();
        assert_eq!(f.manager.activate(&f.catalog, &Exclusions::default()).unwrap(), 3);

        broken.fire(&Unreadable);
        f.started.fire();
        f.said.fire(&"hello".to_string());

        let reports = f.sink.take();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0], "[RoundStarted]");
        assert!(reports[1].starts_with("[String]"));
    }
}
