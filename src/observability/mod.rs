//! Observability for typed stores
//!
//! Structured JSON event logging. Observability is read-only: it never
//! changes the outcome of a cast, a load or a dump.
//!
//! ```ignore
//! use typedstore::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::StoreDeclared, &[("store", "settings")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{LogTarget, Logger, Severity};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
