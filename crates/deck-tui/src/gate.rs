//! Rate limiting for transient status-bar messages.
//!
//! Log messages can arrive in bursts from any producer thread (engine
//! connection, tracing bridge).  The gate decides which of them may
//! reach the display: once a message is admitted, lower-or-equal
//! severity messages are suppressed until the cooldown elapses without a
//! higher-severity message taking the window over.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use deck_core::log::Severity;

/// How long an admitted message suppresses lower-or-equal severities.
pub const SUPPRESS_COOLDOWN: Duration = Duration::from_millis(1000);

#[derive(Default)]
struct GateState {
    /// Severity of the currently active suppression window, if any.
    level: Option<Severity>,
    /// Identifies the window; a reset only applies while it is unchanged.
    serial: u64,
    /// Deferred reset for the latest window.  Earlier resets are left
    /// running; the serial check makes them no-ops.
    reset_task: Option<AbortHandle>,
}

/// Decides whether an incoming message may be displayed now.
///
/// Clone the gate into the subscription callback; all clones share one
/// window.  `admit` may be called from any thread; the deferred reset is
/// scheduled on the runtime the gate was created on.
#[derive(Clone)]
pub struct MessageGate {
    state: Arc<Mutex<GateState>>,
    runtime: Handle,
}

impl MessageGate {
    /// Must be called from within a tokio runtime; `admit` itself may
    /// then be called from threads that are not.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(GateState::default())),
            runtime: Handle::current(),
        }
    }

    /// Returns true when a message of `level` may be displayed now.
    ///
    /// Rejected messages are dropped for good; there is no queue.
    pub fn admit(&self, level: Severity) -> bool {
        let mut st = self.state.lock().unwrap();

        // do not replace a message of same or higher priority
        if st.level.is_some_and(|current| level <= current) {
            return false;
        }

        st.level = Some(level);
        st.serial += 1;
        let serial = st.serial;

        let state = Arc::clone(&self.state);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(SUPPRESS_COOLDOWN).await;
            let mut st = state.lock().unwrap();

            // allow new messages only if no newer window superseded this one
            if st.serial == serial {
                st.level = None;
            }
        });
        st.reset_task = Some(task.abort_handle());

        true
    }

    /// Cancel the outstanding deferred reset and clear the window.
    /// Called at teardown so nothing fires after the widget is gone.
    pub fn shutdown(&self) {
        let mut st = self.state.lock().unwrap();
        if let Some(task) = st.reset_task.take() {
            task.abort();
        }
        st.level = None;
    }
}
