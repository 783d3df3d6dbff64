//! On/off toggle across open projects

use crate::enablement::EnablementComponent;
use dashmap::DashMap;
use std::sync::Arc;

/// Enablement components of the open projects, by project name
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    components: DashMap<String, Arc<EnablementComponent>>,
}

impl ProjectRegistry {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project's component, replacing any previous one
    pub fn register(&self, project: impl Into<String>, component: Arc<EnablementComponent>) {
        self.components.insert(project.into(), component);
    }

    /// Forget a project; its component is closed
    pub fn close(&self, project: &str) -> Option<Arc<EnablementComponent>> {
        let (_, component) = self.components.remove(project)?;
        component.project_closed();
        Some(component)
    }

    #[must_use]
    pub fn component(&self, project: &str) -> Option<Arc<EnablementComponent>> {
        self.components.get(project).map(|c| Arc::clone(c.value()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Toggle action over a [`ProjectRegistry`]
///
/// Projects without a registered component read as unselected and ignore
/// writes.
#[derive(Debug, Clone, Copy)]
pub struct EnhancementToggle<'r> {
    registry: &'r ProjectRegistry,
}

impl<'r> EnhancementToggle<'r> {
    #[inline]
    #[must_use]
    pub fn new(registry: &'r ProjectRegistry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn is_selected(&self, project: &str) -> bool {
        self.registry
            .component(project)
            .is_some_and(|c| c.is_enabled())
    }

    pub fn set_selected(&self, project: &str, selected: bool) {
        match self.registry.component(project) {
            Some(component) => component.set_enabled(selected),
            None => tracing::debug!(project, "toggle ignored for unknown project"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CompilationEventBus, CompilationListener};
    use tqe_artifact::CompiledClassSet;
    use tqe_enhance::CompileContext;

    struct Noop;

    impl CompilationListener for Noop {
        fn compilation_finished(&self, _ctx: &dyn CompileContext, _compiled: &CompiledClassSet) {}
    }

    fn registered(registry: &ProjectRegistry, name: &str) -> Arc<CompilationEventBus> {
        let bus = Arc::new(CompilationEventBus::new());
        registry.register(name, Arc::new(EnablementComponent::new(Arc::clone(&bus), Arc::new(Noop))));
        bus
    }

    #[test]
    fn toggles_registered_project() {
        let registry = ProjectRegistry::new();
        let bus = registered(&registry, "shop");
        let toggle = EnhancementToggle::new(&registry);

        assert!(!toggle.is_selected("shop"));
        toggle.set_selected("shop", true);
        assert!(toggle.is_selected("shop"));
        assert_eq!(bus.listener_count(), 1);

        toggle.set_selected("shop", false);
        assert!(!toggle.is_selected("shop"));
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn unknown_project_is_unselected_and_ignored() {
        let registry = ProjectRegistry::new();
        let bus = registered(&registry, "shop");
        let toggle = EnhancementToggle::new(&registry);

        toggle.set_selected("other", true);
        assert!(!toggle.is_selected("other"));
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn projects_toggle_independently() {
        let registry = ProjectRegistry::new();
        let shop = registered(&registry, "shop");
        let blog = registered(&registry, "blog");
        let toggle = EnhancementToggle::new(&registry);

        toggle.set_selected("shop", true);
        assert!(toggle.is_selected("shop"));
        assert!(!toggle.is_selected("blog"));
        assert_eq!((shop.listener_count(), blog.listener_count()), (1, 0));
    }

    #[test]
    fn closing_a_project_disables_it() {
        let registry = ProjectRegistry::new();
        let bus = registered(&registry, "shop");
        let toggle = EnhancementToggle::new(&registry);
        toggle.set_selected("shop", true);

        let closed = registry.close("shop").unwrap();
        assert!(!closed.is_enabled());
        assert_eq!(bus.listener_count(), 0);
        assert!(!toggle.is_selected("shop"));
        assert!(registry.is_empty());
    }
}
