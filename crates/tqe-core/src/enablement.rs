//! Per-project enhancement switch
//!
//! ```text
//! Disabled ── set_enabled(true) ──► Enabled     (listener subscribed)
//! Enabled  ── set_enabled(false) ─► Disabled    (listener unsubscribed)
//! any      ── project_closed() ───► Disabled
//! ```

use crate::events::{CompilationEventBus, CompilationListener, Subscription};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Persisted toggle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementState {
    pub enabled: bool,
}

impl EnhancementState {
    #[inline]
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

/// Owns the enabled flag and the listener's registration on the bus
///
/// The flag and the registration change together under one lock, so the
/// listener is subscribed exactly when the state is enabled.
pub struct EnablementComponent {
    bus: Arc<CompilationEventBus>,
    listener: Arc<dyn CompilationListener>,
    subscription: Mutex<Option<Subscription>>,
}

impl EnablementComponent {
    /// Disabled component for `listener` on `bus`
    #[must_use]
    pub fn new(bus: Arc<CompilationEventBus>, listener: Arc<dyn CompilationListener>) -> Self {
        Self {
            bus,
            listener,
            subscription: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// Switch enhancement on or off; re-entering the current state does nothing
    pub fn set_enabled(&self, enabled: bool) {
        let mut subscription = self.subscription.lock();
        match (subscription.is_some(), enabled) {
            (false, true) => {
                *subscription = Some(self.bus.subscribe(Arc::clone(&self.listener)));
                tracing::info!("type query enhancement enabled");
            }
            (true, false) => {
                if let Some(handle) = subscription.take() {
                    self.bus.unsubscribe(handle);
                }
                tracing::info!("type query enhancement disabled");
            }
            _ => tracing::trace!(enabled, "enhancement state unchanged"),
        }
    }

    /// Project is closing: stop listening
    pub fn project_closed(&self) {
        self.set_enabled(false);
    }

    /// Apply a persisted state
    pub fn load_state(&self, state: EnhancementState) {
        self.set_enabled(state.enabled);
    }

    /// Current state, for persistence
    #[must_use]
    pub fn state(&self) -> EnhancementState {
        EnhancementState::new(self.is_enabled())
    }
}

impl fmt::Debug for EnablementComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnablementComponent")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}
