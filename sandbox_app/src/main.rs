//! Headless sandbox
//!
//! Builds a small scene (static ground, a kinematic platform, a crate
//! spawner), runs it through a Play session and logs what happened.
//!
//! Usage: `sandbox [settings.toml|settings.ron] [frames]`

mod behaviors;

use scene_runtime::foundation::logging::{self, LevelFilter};
use scene_runtime::prelude::*;

use behaviors::{ContactCounter, CrateSpawner, PlatformMover};

const DEFAULT_FRAMES: u32 = 600;
const FRAME_TIME: f32 = 1.0 / 60.0;

fn build_scene(scene: &mut Scene) -> Result<(), SceneError> {
    let ground = scene.create_entity("Ground");
    scene.add_component(ground, Rigidbody2DComponent::new(BodyType::Static))?;
    scene.add_component(ground, BoxCollider2DComponent::new(Vec2::new(30.0, 1.0)))?;
    scene.add_component(ground, NativeScriptComponent::bind::<ContactCounter>())?;

    let platform = scene.create_entity("Platform");
    *scene.get_component_mut::<TransformComponent>(platform)? = TransformComponent::from_xy(0.0, 4.0);
    scene.add_component(platform, Rigidbody2DComponent::new(BodyType::Kinematic))?;
    scene.add_component(platform, BoxCollider2DComponent::new(Vec2::new(4.0, 0.5)))?;
    scene.add_component(platform, NativeScriptComponent::bind::<PlatformMover>())?;

    // A ball resting on the platform, parented so its transform is local.
    let ball = scene.create_entity("Ball");
    *scene.get_component_mut::<TransformComponent>(ball)? = TransformComponent::from_xy(0.0, 1.0);
    scene.add_component(ball, Rigidbody2DComponent::new(BodyType::Dynamic))?;
    scene.add_component(ball, CircleCollider2DComponent::new(0.4))?;
    scene.set_parent(ball, Some(platform))?;

    let spawner = scene.create_entity("Spawner");
    scene.add_component(spawner, NativeScriptComponent::bind::<CrateSpawner>())?;

    Ok(())
}

fn run(settings: SceneSettings, frames: u32) -> Result<(), SceneError> {
    let mut scene = Scene::with_settings(settings);
    build_scene(&mut scene)?;
    let snapshot = scene.copy()?;

    scene.on_runtime_start()?;
    let mut timer = Timer::new();
    for frame in 1..=frames {
        timer.tick();
        scene.update(Timestep::from_seconds(FRAME_TIME));

        if frame % 120 == 0 {
            let stats = scene.stats();
            log::info!(
                "Frame {frame}: {} entities, {} bodies, {} scripts, {}us scripts, {}us physics",
                stats.entity_count,
                stats.body_count,
                stats.script_count,
                stats.script_time_us,
                stats.physics_time_us
            );
        }
        if let Some(report) = scene.last_step_report() {
            for fault in &report.faults {
                log::warn!("Frame {frame}: {fault:?}");
            }
        }
    }
    scene.on_runtime_stop()?;

    if let Some(ball) = scene.find_entity_by_name("Ball") {
        let world = scene.world_transform(ball)?;
        let start = snapshot.world_transform(ball)?;
        log::info!(
            "Ball moved from ({:.2}, {:.2}) to ({:.2}, {:.2})",
            start.position.x,
            start.position.y,
            world.position.x,
            world.position.y
        );
    }
    log::info!(
        "Simulated {frames} frames in {:.2}s ({:.0} fps)",
        timer.total_time(),
        timer.average_fps()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_level(LevelFilter::Info);

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => {
            log::info!("Loading scene settings from {path}");
            SceneSettings::load_from_file(&path)?
        }
        None => SceneSettings {
            name: "Sandbox".to_string(),
            ..SceneSettings::default()
        },
    };
    let frames = match args.next() {
        Some(count) => count.parse()?,
        None => DEFAULT_FRAMES,
    };

    log::info!("Starting scene '{}' for {frames} frames", settings.name);
    match run(settings, frames) {
        Ok(()) => {
            log::info!("Sandbox completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Sandbox failed: {e}");
            Err(e.into())
        }
    }
}
