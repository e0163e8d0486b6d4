//! Entity creation with the default component set

use crate::ecs::components::{IdComponent, RelationshipComponent, TagComponent, TransformComponent, Uuid};
use crate::ecs::{Entity, World};

/// Create an entity carrying Id, Tag, Transform and Relationship components
///
/// A random UUID is drawn when `uuid` is `None`.
pub fn spawn_entity(world: &mut World, uuid: Option<Uuid>, name: &str) -> Entity {
    let entity = world.create_entity();
    let uuid = uuid.unwrap_or_else(Uuid::new_random);
    let name = if name.is_empty() { "Entity" } else { name };

    world.insert_component(entity, IdComponent { uuid });
    world.insert_component(entity, TagComponent::new(name));
    world.insert_component(entity, TransformComponent::identity());
    world.insert_component(entity, RelationshipComponent::default());

    log::trace!("Spawned entity {entity} ({name}, uuid {uuid})");
    entity
}

/// First entity, in slot order, whose tag name equals `name`
pub fn find_entity_by_name(world: &World, name: &str) -> Option<Entity> {
    world
        .storage::<TagComponent>()?
        .iter()
        .find(|(_, tag)| tag.name == name)
        .map(|(entity, _)| entity)
}

/// Entity whose [`IdComponent`] carries `uuid`
pub fn entity_by_uuid(world: &World, uuid: Uuid) -> Option<Entity> {
    world
        .storage::<IdComponent>()?
        .iter()
        .find(|(_, id)| id.uuid == uuid)
        .map(|(entity, _)| entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_adds_default_components() {
        let mut world = World::new();
        let entity = spawn_entity(&mut world, None, "Player");

        assert!(world.has_component::<IdComponent>(entity));
        assert!(world.has_component::<TransformComponent>(entity));
        assert!(world.has_component::<RelationshipComponent>(entity));
        assert_eq!(world.get_component::<TagComponent>(entity).unwrap().name, "Player");
    }

    #[test]
    fn test_empty_name_falls_back() {
        let mut world = World::new();
        let entity = spawn_entity(&mut world, None, "");
        assert_eq!(world.get_component::<TagComponent>(entity).unwrap().name, "Entity");
    }

    #[test]
    fn test_lookup_by_name_and_uuid() {
        let mut world = World::new();
        let _first = spawn_entity(&mut world, Some(Uuid::from_u64(1)), "A");
        let second = spawn_entity(&mut world, Some(Uuid::from_u64(2)), "B");

        assert_eq!(find_entity_by_name(&world, "B"), Some(second));
        assert_eq!(entity_by_uuid(&world, Uuid::from_u64(2)), Some(second));
        assert_eq!(find_entity_by_name(&world, "C"), None);

        world.destroy_entity(second).unwrap();
        assert_eq!(entity_by_uuid(&world, Uuid::from_u64(2)), None);
    }
}
