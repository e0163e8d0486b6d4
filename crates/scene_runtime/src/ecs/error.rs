//! Registry errors

use super::Entity;

/// Errors returned by [`World`](super::World) operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The handle does not refer to a live entity
    #[error("entity {0} is not alive")]
    InvalidEntity(Entity),

    /// The entity already holds a component of this kind
    #[error("entity {entity} already has a {component}")]
    DuplicateComponent {
        /// Target entity
        entity: Entity,
        /// Component type name
        component: &'static str,
    },

    /// The entity holds no component of this kind
    #[error("entity {entity} has no {component}")]
    MissingComponent {
        /// Target entity
        entity: Entity,
        /// Component type name
        component: &'static str,
    },

    /// Parenting would make an entity its own ancestor
    #[error("cannot parent {child} under its descendant {parent}")]
    HierarchyCycle {
        /// Entity being re-parented
        child: Entity,
        /// Requested parent
        parent: Entity,
    },
}
