//! Parent/child links between entities

use crate::ecs::{Component, Entity};

/// Scene-graph links, maintained by [`hierarchy`](crate::ecs::hierarchy)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RelationshipComponent {
    /// Parent entity, `None` for roots
    pub parent: Option<Entity>,

    /// Direct children in attachment order
    pub children: Vec<Entity>,
}

impl Component for RelationshipComponent {}

impl RelationshipComponent {
    /// Whether the entity has no parent
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
