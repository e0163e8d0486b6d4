//! Scene-graph helpers over [`RelationshipComponent`]
//!
//! Entities without a relationship component are treated as roots without
//! children.

use super::components::{RelationshipComponent, TransformComponent};
use super::{EcsError, Entity, World};
use crate::foundation::math::Mat4;

/// Parent of `entity`, if any
pub fn parent(world: &World, entity: Entity) -> Option<Entity> {
    world
        .get_component::<RelationshipComponent>(entity)
        .ok()
        .and_then(|relationship| relationship.parent)
}

/// Direct children of `entity`
pub fn children(world: &World, entity: Entity) -> &[Entity] {
    match world.get_component::<RelationshipComponent>(entity) {
        Ok(relationship) => &relationship.children,
        Err(_) => &[],
    }
}

/// Whether `ancestor` appears on the parent chain of `entity`
pub fn is_ancestor(world: &World, ancestor: Entity, entity: Entity) -> bool {
    let mut current = parent(world, entity);
    while let Some(node) = current {
        if node == ancestor {
            return true;
        }
        current = parent(world, node);
    }
    false
}

/// Number of ancestors of `entity`; zero for roots
pub fn depth(world: &World, entity: Entity) -> usize {
    let mut depth = 0;
    let mut current = parent(world, entity);
    while let Some(node) = current {
        depth += 1;
        current = parent(world, node);
    }
    depth
}

/// Attach `child` under `new_parent`, or make it a root with `None`
///
/// # Errors
///
/// [`EcsError::InvalidEntity`] for dead handles and
/// [`EcsError::HierarchyCycle`] when `new_parent` is `child` or one of its
/// descendants.
pub fn set_parent(world: &mut World, child: Entity, new_parent: Option<Entity>) -> Result<(), EcsError> {
    if !world.is_alive(child) {
        return Err(EcsError::InvalidEntity(child));
    }
    if let Some(parent_entity) = new_parent {
        if !world.is_alive(parent_entity) {
            return Err(EcsError::InvalidEntity(parent_entity));
        }
        if parent_entity == child || is_ancestor(world, child, parent_entity) {
            return Err(EcsError::HierarchyCycle {
                child,
                parent: parent_entity,
            });
        }
    }

    detach(world, child);

    if let Some(parent_entity) = new_parent {
        relationship_mut(world, parent_entity)?.children.push(child);
    }
    relationship_mut(world, child)?.parent = new_parent;
    Ok(())
}

/// Unlink `entity` from its parent; it keeps its own children
pub fn detach(world: &mut World, entity: Entity) {
    let Some(old_parent) = parent(world, entity) else {
        return;
    };
    if let Ok(relationship) = world.get_component_mut::<RelationshipComponent>(old_parent) {
        relationship.children.retain(|&c| c != entity);
    }
    if let Ok(relationship) = world.get_component_mut::<RelationshipComponent>(entity) {
        relationship.parent = None;
    }
}

/// `entity` followed by all its descendants, depth first
pub fn descendants(world: &World, entity: Entity) -> Vec<Entity> {
    let mut order = Vec::new();
    let mut stack = vec![entity];
    while let Some(node) = stack.pop() {
        if !world.is_alive(node) {
            continue;
        }
        order.push(node);
        stack.extend(children(world, node).iter().rev().copied());
    }
    order
}

/// Local-to-world matrix composed along the parent chain
///
/// # Errors
///
/// [`EcsError::InvalidEntity`] for dead handles; entities without a
/// transform contribute identity.
pub fn world_matrix(world: &World, entity: Entity) -> Result<Mat4, EcsError> {
    if !world.is_alive(entity) {
        return Err(EcsError::InvalidEntity(entity));
    }
    let mut matrix = local_matrix(world, entity);
    let mut current = parent(world, entity);
    while let Some(node) = current {
        matrix = local_matrix(world, node) * matrix;
        current = parent(world, node);
    }
    Ok(matrix)
}

fn local_matrix(world: &World, entity: Entity) -> Mat4 {
    world
        .get_component::<TransformComponent>(entity)
        .map_or_else(|_| Mat4::identity(), TransformComponent::to_matrix)
}

fn relationship_mut(world: &mut World, entity: Entity) -> Result<&mut RelationshipComponent, EcsError> {
    if !world.has_component::<RelationshipComponent>(entity) {
        world.add_component(entity, RelationshipComponent::default())?;
    }
    world.get_component_mut::<RelationshipComponent>(entity)
}
