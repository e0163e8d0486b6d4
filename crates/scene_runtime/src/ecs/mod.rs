//! Entity-Component-System implementation
//!
//! [`World`] is the component registry. Scene-graph links live in
//! [`components::RelationshipComponent`] and are maintained through
//! [`hierarchy`].

pub mod component;
pub mod components;
pub mod entity;
pub mod error;
pub mod hierarchy;
pub mod query;
pub mod storage;
pub mod world;

pub use component::Component;
pub use entity::Entity;
pub use error::EcsError;
pub use query::ComponentSet;
pub use storage::ComponentStorage;
pub use world::World;
