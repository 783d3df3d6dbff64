//! Compilation-finished event bus
//!
//! The host raises one event per successful compilation round; listeners are
//! registered explicitly and identified by the [`Subscription`] handle they
//! get back.

use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tqe_artifact::CompiledClassSet;
use tqe_enhance::CompileContext;

/// Receiver of compilation-finished events
pub trait CompilationListener: Send + Sync {
    /// Called once per compilation round with the classes it produced
    fn compilation_finished(&self, ctx: &dyn CompileContext, compiled: &CompiledClassSet);
}

/// Handle of one registration on a [`CompilationEventBus`]
///
/// Not `Clone`: a registration is removed at most once.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

impl Subscription {
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Per-project registry of compilation listeners
#[derive(Default)]
pub struct CompilationEventBus {
    listeners: DashMap<u64, Arc<dyn CompilationListener>>,
    next_id: AtomicU64,
}

impl CompilationEventBus {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    #[must_use = "dropping the handle makes the registration permanent"]
    pub fn subscribe(&self, listener: Arc<dyn CompilationListener>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.insert(id, listener);
        tracing::debug!(subscription = id, "compilation listener subscribed");
        Subscription(id)
    }

    /// Remove a registration; `false` if it was already gone
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let removed = self.listeners.remove(&subscription.0).is_some();
        tracing::debug!(subscription = subscription.0, removed, "compilation listener unsubscribed");
        removed
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Notify every listener, in subscription order, on the calling thread
    pub fn compilation_finished(&self, ctx: &dyn CompileContext, compiled: &CompiledClassSet) {
        // Snapshot first so listeners may (un)subscribe while being notified
        let mut listeners: Vec<(u64, Arc<dyn CompilationListener>)> = self
            .listeners
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        listeners.sort_by_key(|(id, _)| *id);

        tracing::debug!(
            listeners = listeners.len(),
            classes = compiled.len(),
            "compilation finished"
        );
        for (_, listener) in listeners {
            listener.compilation_finished(ctx, compiled);
        }
    }
}

impl fmt::Debug for CompilationEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationEventBus")
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tqe_enhance::{LocalCompileContext, Project};

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(&'static str, usize)>>,
    }

    struct Named(&'static str, Arc<Recorder>);

    impl CompilationListener for Named {
        fn compilation_finished(&self, _ctx: &dyn CompileContext, compiled: &CompiledClassSet) {
            self.1.seen.lock().push((self.0, compiled.len()));
        }
    }

    fn ctx() -> LocalCompileContext {
        LocalCompileContext::new(Project::new("p", "/p"))
    }

    #[test]
    fn subscribe_and_unsubscribe() {
        let bus = CompilationEventBus::new();
        let recorder = Arc::new(Recorder::default());

        let first = bus.subscribe(Arc::new(Named("first", Arc::clone(&recorder))));
        let second = bus.subscribe(Arc::new(Named("second", Arc::clone(&recorder))));
        assert_ne!(first.id(), second.id());
        assert_eq!(bus.listener_count(), 2);

        assert!(bus.unsubscribe(first));
        assert_eq!(bus.listener_count(), 1);
        assert!(bus.unsubscribe(second));
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn listeners_notified_in_subscription_order() {
        let bus = CompilationEventBus::new();
        let recorder = Arc::new(Recorder::default());
        for name in ["a", "b", "c"] {
            let _ = bus.subscribe(Arc::new(Named(name, Arc::clone(&recorder))));
        }

        bus.compilation_finished(&ctx(), &CompiledClassSet::new());

        assert_eq!(*recorder.seen.lock(), vec![("a", 0), ("b", 0), ("c", 0)]);
    }

    #[test]
    fn unsubscribed_listener_is_not_notified() {
        let bus = CompilationEventBus::new();
        let recorder = Arc::new(Recorder::default());
        let sub = bus.subscribe(Arc::new(Named("gone", Arc::clone(&recorder))));
        bus.unsubscribe(sub);

        bus.compilation_finished(&ctx(), &CompiledClassSet::new());

        assert!(recorder.seen.lock().is_empty());
    }
}
