//! Deferred structural mutations
//!
//! Scripts run while the scene iterates its instances, so entity
//! destruction and arbitrary registry edits are queued and applied by the
//! scene at the next sync point.

use crate::ecs::{Entity, World};

/// Registry edit run after the current pass
pub type DeferredEdit = Box<dyn FnOnce(&mut World) + Send>;

/// A queued mutation
pub enum SceneCommand {
    /// Destroy an entity and its descendants
    Destroy(Entity),
    /// Run an arbitrary edit against the registry
    Edit(DeferredEdit),
}

impl std::fmt::Debug for SceneCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Destroy(entity) => f.debug_tuple("Destroy").field(entity).finish(),
            Self::Edit(_) => f.write_str("Edit(..)"),
        }
    }
}

/// FIFO of [`SceneCommand`]s
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Vec<SceneCommand>,
}

impl CommandQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue destruction of `entity`
    pub fn destroy(&mut self, entity: Entity) {
        self.commands.push(SceneCommand::Destroy(entity));
    }

    /// Queue a registry edit
    pub fn edit(&mut self, edit: impl FnOnce(&mut World) + Send + 'static) {
        self.commands.push(SceneCommand::Edit(Box::new(edit)));
    }

    /// Whether destruction of `entity` is already queued
    pub fn is_destroy_pending(&self, entity: Entity) -> bool {
        self.commands
            .iter()
            .any(|command| matches!(command, SceneCommand::Destroy(e) if *e == entity))
    }

    /// Number of queued commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Take every queued command in submission order
    pub fn take(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.commands)
    }
}
