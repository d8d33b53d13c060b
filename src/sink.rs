//! Report sinks
//!
//! A sink receives one rendered report per event firing. Emission is
//! fire-and-forget: a panicking sink loses that one report and nothing else.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

use crate::inspect::panic_message;

/// Log target used for rendered reports
pub const REPORT_TARGET: &str = "devtools";

/// Destination for rendered reports
pub trait Sink: Send + Sync {
    fn emit(&self, report: &str);
}

/// Writes reports to the `log` facade at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl Sink for LogSink {
    fn emit(&self, report: &str) {
        log::debug!(target: REPORT_TARGET, "{}", report);
    }
}

/// Keeps every report in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<String> {
        match self.reports.lock() {
            Ok(reports) => reports.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Remove and return everything collected so far
    pub fn take(&self) -> Vec<String> {
        match self.reports.lock() {
            Ok(mut reports) => std::mem::take(&mut *reports),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Sink for MemorySink {
    fn emit(&self, report: &str) {
        match self.reports.lock() {
            Ok(mut reports) => reports.push(report.to_string()),
            Err(poisoned) => poisoned.into_inner().push(report.to_string()),
        }
    }
}

/// Hand a report to a sink, containing any panic it raises
pub fn deliver(sink: &dyn Sink, report: &str) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| sink.emit(report))) {
        log::warn!("Report sink panicked, report dropped: {}", panic_message(payload.as_ref()));
    }
}
