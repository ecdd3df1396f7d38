//! Log severity model and the in-process log hub.
//!
//! The hub is the routing point between log producers (the engine
//! connection, the tracing bridge) and display consumers (the status
//! bar).  Producers call [`LogHub::publish`] from whatever thread they
//! run on; subscribers registered with [`LogHub::subscribe`] receive
//! each record synchronously on that thread, filtered by their minimum
//! severity.  Consumers that need to touch UI state should forward into
//! their own event queue rather than mutate anything in the callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Ordered message severity.  Higher value = higher display priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

/// A single log event as routed through the hub.
///
/// `target` carries the module path of the emitting code (the engine
/// sends its own); `file` and `line` are present when the producer knows
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: Severity,
    pub target: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub text: String,
}

/// Handle returned by [`LogHub::subscribe`]; pass it back to
/// [`LogHub::unsubscribe`] at teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

type Callback = Box<dyn Fn(&LogRecord) + Send + Sync>;

struct Subscriber {
    id: SubscriberId,
    min_level: Severity,
    callback: Callback,
}

/// Fan-out point for log records.
///
/// Callbacks run under the hub lock and must not publish back into the
/// hub.
pub struct LogHub {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl LogHub {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `callback` for every record at `min_level` or above.
    pub fn subscribe(
        &self,
        min_level: Severity,
        callback: impl Fn(&LogRecord) + Send + Sync + 'static,
    ) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut subs = self.subscribers.lock().unwrap();
        subs.push(Subscriber {
            id,
            min_level,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a subscription.  Unknown ids are ignored, so double
    /// unsubscription at teardown is harmless.
    pub fn unsubscribe(&self, id: SubscriberId) {
        let mut subs = self.subscribers.lock().unwrap();
        subs.retain(|s| s.id != id);
    }

    /// Deliver `record` to every subscriber whose minimum level admits it.
    pub fn publish(&self, record: LogRecord) {
        let subs = self.subscribers.lock().unwrap();
        for sub in subs.iter() {
            if record.level >= sub.min_level {
                (sub.callback)(&record);
            }
        }
    }
}

impl Default for LogHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(level: Severity, text: &str) -> LogRecord {
        LogRecord {
            level,
            target: "test".to_string(),
            file: None,
            line: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn publish_respects_min_level() {
        let hub = LogHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        hub.subscribe(Severity::Warning, move |r| {
            sink.lock().unwrap().push((r.level, r.text.clone()));
        });

        hub.publish(record(Severity::Info, "quiet"));
        hub.publish(record(Severity::Warning, "loud"));
        hub.publish(record(Severity::Error, "louder"));

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (Severity::Warning, "loud".to_string()),
                (Severity::Error, "louder".to_string()),
            ]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hub = LogHub::new();
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        let id = hub.subscribe(Severity::Debug, move |_| {
            *sink.lock().unwrap() += 1;
        });

        hub.publish(record(Severity::Info, "one"));
        hub.unsubscribe(id);
        hub.publish(record(Severity::Info, "two"));
        // Unknown id: no-op.
        hub.unsubscribe(id);

        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn concurrent_publishers_reach_one_subscriber() {
        let hub = Arc::new(LogHub::new());
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        hub.subscribe(Severity::Info, move |_| {
            *sink.lock().unwrap() += 1;
        });

        let mut handles = Vec::new();
        for _ in 0..8 {
            let hub = Arc::clone(&hub);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    hub.publish(record(Severity::Warning, "w"));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(*seen.lock().unwrap(), 800);
    }
}
