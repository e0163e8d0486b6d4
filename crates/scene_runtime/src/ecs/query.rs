//! Query support for multi-component views

use super::{Component, Entity, World};

/// Tuple of component types an entity must all hold to match a view
pub trait ComponentSet {
    /// Whether `entity` holds every component in the set
    fn is_contained_in(world: &World, entity: Entity) -> bool;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn is_contained_in(world: &World, entity: Entity) -> bool {
                $(world.has_component::<$name>(entity))&&+
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
