//! Native script binding component

use std::fmt;
use std::sync::Arc;

use crate::ecs::Component;
use crate::scripting::ScriptableBehavior;

/// Constructor for behavior instances
pub type BehaviorFactory = Arc<dyn Fn() -> Box<dyn ScriptableBehavior> + Send + Sync>;

/// Binds an entity to a behavior type
///
/// Holds only the factory; the live instance belongs to the scene's script
/// host and exists while the scene is running.
#[derive(Clone)]
pub struct NativeScriptComponent {
    factory: BehaviorFactory,
    behavior_name: &'static str,
}

impl Component for NativeScriptComponent {}

impl NativeScriptComponent {
    /// Bind to `T`, instantiated through `T::default()`
    pub fn bind<T: ScriptableBehavior + Default>() -> Self {
        Self {
            factory: Arc::new(|| Box::new(T::default()) as Box<dyn ScriptableBehavior>),
            behavior_name: std::any::type_name::<T>(),
        }
    }

    /// Bind to a custom constructor
    pub fn from_factory(
        behavior_name: &'static str,
        factory: impl Fn() -> Box<dyn ScriptableBehavior> + Send + Sync + 'static,
    ) -> Self {
        Self {
            factory: Arc::new(factory),
            behavior_name,
        }
    }

    /// Build a fresh instance
    pub fn instantiate(&self) -> Box<dyn ScriptableBehavior> {
        (self.factory)()
    }

    /// Name of the bound behavior
    pub const fn behavior_name(&self) -> &'static str {
        self.behavior_name
    }
}

impl fmt::Debug for NativeScriptComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeScriptComponent")
            .field("behavior", &self.behavior_name)
            .finish_non_exhaustive()
    }
}
