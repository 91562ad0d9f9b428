//! Observability subsystem for rankkeeper
//!
//! - Structured logging (JSON, one line per event)
//! - Counters for every ordering operation
//! - Begin/complete tracing for multi-step operations
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on the ordering protocol
//! 3. No background threads
//!
//! # Usage
//!
//! ```ignore
//! use rankkeeper::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::MoveCommitted, &[("from", "3"), ("to", "2")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_moves_up();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

/// Log a lifecycle event at an explicit severity
pub fn log_event_at(severity: Severity, event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity, event.as_str(), fields);
}
