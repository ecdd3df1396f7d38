//! Bridge from the `tracing` ecosystem into the log hub.
//!
//! Installed as an extra layer next to the file `fmt` layer, so
//! warnings and errors emitted by the shell's own code surface in the
//! status bar the same way engine-side messages do.

use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::log::{LogHub, LogRecord, Severity};

/// Map a tracing level onto the hub's severity scale.
pub fn severity_of(level: &tracing::Level) -> Severity {
    if *level == tracing::Level::ERROR {
        Severity::Error
    } else if *level == tracing::Level::WARN {
        Severity::Warning
    } else if *level == tracing::Level::INFO {
        Severity::Info
    } else {
        Severity::Debug
    }
}

/// A `tracing_subscriber` layer that republishes every event as a
/// [`LogRecord`].
pub struct HubLayer {
    hub: Arc<LogHub>,
}

impl HubLayer {
    pub fn new(hub: Arc<LogHub>) -> Self {
        Self { hub }
    }
}

impl<S: Subscriber> Layer<S> for HubLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.hub.publish(LogRecord {
            level: severity_of(meta.level()),
            target: meta.target().to_string(),
            file: meta.file().map(str::to_string),
            line: meta.line(),
            text: visitor.text,
        });
    }
}

/// Pulls the `message` field out of an event; other fields are ignored.
#[derive(Default)]
struct MessageVisitor {
    text: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.text = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.text = format!("{:?}", value);
        }
    }
}
