//! ECS Components module
//!
//! Every entity created through a scene carries the identity, transform and
//! relationship components; physics and scripting components are opt-in.

pub mod identity;
pub mod native_script;
pub mod physics2d;
pub mod relationship;
pub mod transform;

pub use identity::{is_enabled, IdComponent, TagComponent, Uuid};
pub use native_script::{BehaviorFactory, NativeScriptComponent};
pub use physics2d::{BoxCollider2DComponent, CircleCollider2DComponent, Rigidbody2DComponent};
pub use relationship::RelationshipComponent;
pub use transform::TransformComponent;
