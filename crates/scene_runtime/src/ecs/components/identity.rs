//! Identity components attached to every scene entity

use crate::ecs::{Component, Entity, World};

/// Persistent 64-bit identifier, stable across scene copies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uuid(u64);

impl Uuid {
    /// Generate a random identifier
    pub fn new_random() -> Self {
        Self(rand::random())
    }

    /// Wrap a known value
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Raw value
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Uuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Component carrying the entity's [`Uuid`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdComponent {
    /// Persistent identifier
    pub uuid: Uuid,
}

impl Component for IdComponent {}

/// Name, group label and enabled switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagComponent {
    /// Display name, used by name lookups
    pub name: String,

    /// Free-form group label
    pub group: String,

    /// Disabled entities get no physics body and their scripts do not run
    pub enabled: bool,
}

impl Component for TagComponent {}

impl Default for TagComponent {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl TagComponent {
    /// Enabled tag with a name and no group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: String::new(),
            enabled: true,
        }
    }

    /// Builder pattern: Set enabled
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder pattern: Set group
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }
}

/// Whether `entity` is alive and not disabled through its [`TagComponent`]
///
/// Entities without a tag count as enabled.
pub fn is_enabled(world: &World, entity: Entity) -> bool {
    world.is_alive(entity) && world.get_component::<TagComponent>(entity).map_or(true, |tag| tag.enabled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_start_enabled() {
        assert!(TagComponent::new("A").enabled);
        assert!(TagComponent::default().enabled);
        assert!(!TagComponent::new("B").with_enabled(false).enabled);
    }

    #[test]
    fn test_is_enabled_reads_tag() {
        let mut world = World::new();
        let untagged = world.create_entity();
        let disabled = world.create_entity();
        world.add_component(disabled, TagComponent::new("Off").with_enabled(false)).unwrap();

        assert!(is_enabled(&world, untagged));
        assert!(!is_enabled(&world, disabled));

        world.destroy_entity(untagged).unwrap();
        assert!(!is_enabled(&world, untagged));
    }
}
