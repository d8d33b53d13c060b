//! Dynamic event discovery and payload dumping
//!
//! `devtools` attaches to every event exposed by a set of handler types and
//! logs a structured dump of each firing, without any per-event formatting
//! code. See [`plugin::DevTools`] for the entry point.

pub mod config;
pub mod demo;
pub mod event;
pub mod format;
pub mod handler;
pub mod inspect;
pub mod instrument;
pub mod plugin;
pub mod sink;
pub mod subscription;

pub use event::{Event, EventMember, HandlerId, Observer, Signal};
pub use format::Formatter;
pub use handler::{Handler, HandlerCatalog, HandlerSource};
pub use inspect::{Attribute, Inspect, Layout, Shape, Value};
pub use plugin::DevTools;
pub use subscription::{EventDescriptor, SubscriptionManager};
