//! Behaviors used by the sandbox scene

use std::f32::consts::PI;

use rand::Rng;
use scene_runtime::prelude::*;

/// Swings a kinematic platform left and right around its start position
pub struct PlatformMover {
    origin: Option<Vec3>,
    elapsed: f32,
    amplitude: f32,
    speed: f32,
}

impl Default for PlatformMover {
    fn default() -> Self {
        Self {
            origin: None,
            elapsed: 0.0,
            amplitude: 3.0,
            speed: 1.5,
        }
    }
}

impl ScriptableBehavior for PlatformMover {
    fn on_create(&mut self, ctx: &mut ScriptContext<'_>) {
        self.origin = ctx.get::<TransformComponent>().ok().map(|t| t.position);
    }

    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, dt: Timestep) {
        let Some(origin) = self.origin else {
            return;
        };
        self.elapsed += dt.seconds();
        let offset = self.amplitude * (self.elapsed * self.speed).sin();
        if let Ok(transform) = ctx.get_mut::<TransformComponent>() {
            transform.position.x = origin.x + offset;
        }
    }
}

/// Drops a crate every `interval` seconds at a random x
pub struct CrateSpawner {
    interval: f32,
    cooldown: f32,
    spawned: u32,
}

impl Default for CrateSpawner {
    fn default() -> Self {
        Self {
            interval: 0.25,
            cooldown: 0.0,
            spawned: 0,
        }
    }
}

impl ScriptableBehavior for CrateSpawner {
    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, dt: Timestep) {
        self.cooldown -= dt.seconds();
        if self.cooldown > 0.0 {
            return;
        }
        self.cooldown += self.interval;
        self.spawned += 1;

        let mut rng = rand::thread_rng();
        let x = rng.gen_range(-6.0..6.0);
        let angle = rng.gen_range(0.0..PI);
        let lifetime = rng.gen_range(2.0..5.0);
        let round = rng.gen_bool(0.3);

        let entity = ctx.create_entity(&format!("Crate {}", self.spawned));
        if let Ok(transform) = ctx.component_of_mut::<TransformComponent>(entity) {
            *transform = TransformComponent::from_xy(x, 12.0).with_rotation_z(angle);
        }

        ctx.defer(move |world| {
            let _ = world.add_component(entity, Rigidbody2DComponent::new(BodyType::Dynamic).with_mass(2.0));
            if round {
                let _ = world.add_component(entity, CircleCollider2DComponent::new(0.5));
            } else {
                let _ = world.add_component(entity, BoxCollider2DComponent::default());
            }
            let _ = world.add_component(
                entity,
                NativeScriptComponent::from_factory("Lifetime", move || {
                    Box::new(Lifetime { remaining: lifetime }) as Box<dyn ScriptableBehavior>
                }),
            );
        });
    }

    fn on_destroy(&mut self, _ctx: &mut ScriptContext<'_>) {
        log::info!("Spawner dropped {} crates", self.spawned);
    }
}

/// Destroys its entity after `remaining` seconds
pub struct Lifetime {
    remaining: f32,
}

impl ScriptableBehavior for Lifetime {
    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, dt: Timestep) {
        self.remaining -= dt.seconds();
        if self.remaining <= 0.0 {
            ctx.destroy_self();
        }
    }

    fn on_destroy(&mut self, ctx: &mut ScriptContext<'_>) {
        if let Some(pose) = ctx.body_pose() {
            log::debug!(
                "Entity {} expired at ({:.2}, {:.2})",
                ctx.entity(),
                pose.position.x,
                pose.position.y
            );
        }
    }
}

/// Counts contacts against the entity it is attached to
#[derive(Default)]
pub struct ContactCounter {
    touching: usize,
    total: usize,
}

impl ScriptableBehavior for ContactCounter {
    fn on_collision_begin(&mut self, ctx: &mut ScriptContext<'_>, other: Entity) {
        self.touching += 1;
        self.total += 1;
        if let Ok(tag) = ctx.component_of::<TagComponent>(other) {
            log::trace!("{} landed", tag.name);
        }
    }

    fn on_collision_end(&mut self, _ctx: &mut ScriptContext<'_>, _other: Entity) {
        self.touching = self.touching.saturating_sub(1);
    }

    fn on_destroy(&mut self, _ctx: &mut ScriptContext<'_>) {
        log::info!("Ground saw {} contacts, {} still touching", self.total, self.touching);
    }
}
