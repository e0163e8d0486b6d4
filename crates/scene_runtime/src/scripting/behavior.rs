//! Scriptable behavior trait

use crate::ecs::Entity;
use crate::foundation::time::Timestep;

use super::ScriptContext;

/// Native game logic attached to an entity through a
/// [`NativeScriptComponent`](crate::ecs::components::NativeScriptComponent)
///
/// While a scene is running, every instance receives exactly one
/// [`on_create`](Self::on_create), one [`on_update`](Self::on_update) per
/// active frame, and exactly one [`on_destroy`](Self::on_destroy) when the
/// scene stops, the entity is destroyed or the script component is removed,
/// whichever comes first. All hooks default to doing nothing.
///
/// ```
/// use scene_runtime::prelude::*;
///
/// #[derive(Default)]
/// struct Spinner;
///
/// impl ScriptableBehavior for Spinner {
///     fn on_update(&mut self, ctx: &mut ScriptContext<'_>, dt: Timestep) {
///         if let Ok(transform) = ctx.get_mut::<TransformComponent>() {
///             let angle = transform.angle_z() + dt.seconds();
///             *transform = transform.clone().with_rotation_z(angle);
///         }
///     }
/// }
/// ```
pub trait ScriptableBehavior: 'static {
    /// Called once when the instance is created
    fn on_create(&mut self, _ctx: &mut ScriptContext<'_>) {}

    /// Called once per frame while the scene plays
    fn on_update(&mut self, _ctx: &mut ScriptContext<'_>, _dt: Timestep) {}

    /// Called once before the instance is dropped
    fn on_destroy(&mut self, _ctx: &mut ScriptContext<'_>) {}

    /// The entity's body started touching `other`'s body
    fn on_collision_begin(&mut self, _ctx: &mut ScriptContext<'_>, _other: Entity) {}

    /// The entity's body stopped touching `other`'s body
    fn on_collision_end(&mut self, _ctx: &mut ScriptContext<'_>, _other: Entity) {}
}
