//! Handles to the application being rendered.

use super::render_context::{DefaultRenderContextFactory, RenderContextFactory};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An opaque, shareable reference to a component the renderer understands.
///
/// The pipeline never inspects the component; the renderer downcasts it.
#[derive(Clone)]
pub struct ComponentRef {
    name: String,
    inner: Arc<dyn Any + Send + Sync>,
}

impl ComponentRef {
    /// Wraps a component value.
    pub fn new<T: Any + Send + Sync>(name: impl Into<String>, component: T) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(component),
        }
    }

    /// Returns the component's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Borrows the component as `T`, if it is one.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRef")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Everything the renderer needs besides data: the root component, the
/// routing component and the render-context factory.
///
/// Owned by the pipeline and shared read-only with every request.
#[derive(Clone)]
pub struct Application {
    root: ComponentRef,
    router: ComponentRef,
    context_factory: Arc<dyn RenderContextFactory>,
}

impl Application {
    /// Creates an application with the default render-context factory.
    #[must_use]
    pub fn new(root: ComponentRef, router: ComponentRef) -> Self {
        Self {
            root,
            router,
            context_factory: Arc::new(DefaultRenderContextFactory),
        }
    }

    /// Sets the render-context factory.
    #[must_use]
    pub fn with_context_factory(mut self, factory: Arc<dyn RenderContextFactory>) -> Self {
        self.context_factory = factory;
        self
    }

    /// Returns the root component.
    #[must_use]
    pub fn root(&self) -> &ComponentRef {
        &self.root
    }

    /// Returns the routing component.
    #[must_use]
    pub fn router(&self) -> &ComponentRef {
        &self.router
    }

    /// Returns the render-context factory.
    #[must_use]
    pub fn context_factory(&self) -> &Arc<dyn RenderContextFactory> {
        &self.context_factory
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("root", &self.root)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Shell {
        title: &'static str,
    }

    #[test]
    fn test_component_downcast() {
        let component = ComponentRef::new("MainApp", Shell { title: "home" });

        assert_eq!(component.name(), "MainApp");
        assert_eq!(component.downcast_ref::<Shell>(), Some(&Shell { title: "home" }));
        assert!(component.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_application_accessors() {
        let app = Application::new(ComponentRef::new("MainApp", ()), ComponentRef::new("Router", ()));
        assert_eq!(app.root().name(), "MainApp");
        assert_eq!(app.router().name(), "Router");
        assert!(format!("{app:?}").contains("MainApp"));
    }
}
