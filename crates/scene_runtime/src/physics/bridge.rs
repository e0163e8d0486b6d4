//! Physics2D bridge
//!
//! Keeps a [`PhysicsBackend`] consistent with the registry during a Play
//! session. Bodies are recorded in a side table keyed by entity and never
//! stored inside components.
//!
//! Every enabled entity with a [`Rigidbody2DComponent`] gets a body. An
//! enabled entity with a collider but no rigidbody gets an implicit static
//! body. Disabled entities get none.
//!
//! Authority per body type:
//! - Static and Kinematic: the transform drives the body. Changed world poses
//!   are pushed before each step and nothing is written back. Those attached
//!   under a dynamic body are pushed again after write-back, so they start
//!   the next step at their parent's new pose.
//! - Dynamic: the simulation drives the transform. After each advance that
//!   ran at least one step, position x/y and the z rotation are written back,
//!   parents before children; z translation and scale are left alone.
//!
//! Changing the body type, the mass or any collider (shape, offset, scale,
//! material, filter) recreates the body. A dynamic body keeps its pose and
//! linear velocity across the rebuild.

use slotmap::SecondaryMap;

use crate::config::PhysicsSettings;
use crate::ecs::components::{
    is_enabled, BoxCollider2DComponent, CircleCollider2DComponent, Rigidbody2DComponent, TransformComponent,
};
use crate::ecs::{hierarchy, Entity, World};
use crate::foundation::math::{
    decompose_transform, pose_2d, recompose_transform, rotation_z, DegenerateTransform, Pose2D, Vec2, Vec3,
};
use crate::foundation::time::Timestep;

use super::backend::{BodyContact, BodyHandle, PhysicsBackend};
use super::body::{BodyDesc, BodyProperties, BodyType, ColliderDesc, ColliderShape};
use super::rapier::RapierBackend;

const POSE_EPSILON: f32 = 1e-6;

/// Which side of a contact pair changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Bodies started touching
    Begin,
    /// Bodies stopped touching
    End,
}

/// Contact between two entities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEvent {
    /// Begin or end
    pub kind: ContactKind,
    /// First entity
    pub a: Entity,
    /// Second entity
    pub b: Entity,
}

/// Stage at which a transform could not be converted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultStage {
    /// Seeding a new body from the entity's world transform
    Create,
    /// Pushing a static or kinematic transform into its body
    Push,
    /// Writing a dynamic body's pose back into the transform
    WriteBack,
}

/// An entity whose transform and body could not be reconciled this advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformFault {
    /// Affected entity
    pub entity: Entity,
    /// Where it happened
    pub stage: FaultStage,
    /// Why
    pub reason: DegenerateTransform,
}

/// Outcome of the most recent [`Physics2DBridge::advance`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Simulation steps taken
    pub steps: u32,
    /// Transforms updated from dynamic bodies
    pub written_back: usize,
    /// Entities skipped because of degenerate or non-finite transforms
    pub faults: Vec<TransformFault>,
}

#[derive(Debug, Clone)]
struct BodyRecord {
    handle: BodyHandle,
    body_type: BodyType,
    properties: BodyProperties,
    mass: f32,
    /// Colliders as built, before density is spread over them
    colliders: Vec<ColliderDesc>,
    last_pose: Pose2D,
}

enum SyncAction {
    Create,
    Recreate,
    Update(BodyProperties),
}

/// Owns the physics world and the entity ↔ body side table
pub struct Physics2DBridge {
    backend: Box<dyn PhysicsBackend>,
    bodies: SecondaryMap<Entity, BodyRecord>,
    owners: SecondaryMap<BodyHandle, Entity>,
    settings: PhysicsSettings,
    accumulator: f32,
    report: StepReport,
    raw_contacts: Vec<BodyContact>,
    contacts: Vec<ContactEvent>,
}

impl Physics2DBridge {
    /// Wrap a backend; gravity is taken from `settings`
    pub fn new(mut backend: Box<dyn PhysicsBackend>, settings: PhysicsSettings) -> Self {
        backend.set_gravity(Vec2::new(settings.gravity[0], settings.gravity[1]));
        Self {
            backend,
            bodies: SecondaryMap::new(),
            owners: SecondaryMap::new(),
            settings,
            accumulator: 0.0,
            report: StepReport::default(),
            raw_contacts: Vec::new(),
            contacts: Vec::new(),
        }
    }

    /// Bridge over a fresh [`RapierBackend`]
    pub fn with_rapier(settings: PhysicsSettings) -> Self {
        Self::new(Box::<RapierBackend>::default(), settings)
    }

    /// Create a body for every enabled entity with a rigidbody or a collider
    pub fn build(&mut self, world: &World) {
        self.report = StepReport::default();
        self.sync(world);
        log::debug!("Physics world built with {} bodies", self.bodies.len());
    }

    /// Reconcile bodies with the registry, step, then write back dynamic poses
    ///
    /// A non-positive `dt` never steps and never writes back.
    pub fn advance(&mut self, world: &mut World, dt: Timestep) -> &StepReport {
        self.report = StepReport::default();

        self.sync(world);
        self.push_transforms(world);

        let steps = self.step(dt.seconds());
        self.report.steps = steps;
        if steps > 0 {
            self.write_back(world);
            self.push_followers(world);
        }

        self.collect_contacts();
        &self.report
    }

    /// Outcome of the last [`advance`](Self::advance)
    pub const fn last_report(&self) -> &StepReport {
        &self.report
    }

    /// Contacts gathered by the last advance, emptied on read
    pub fn take_contacts(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.contacts)
    }

    fn step(&mut self, dt: f32) -> u32 {
        if !(dt > 0.0) {
            return 0;
        }
        match self.settings.fixed_timestep {
            Some(fixed) if fixed > 0.0 => {
                self.accumulator += dt;
                let mut steps = 0;
                while self.accumulator >= fixed && steps < self.settings.max_substeps {
                    self.backend.step(fixed);
                    self.accumulator -= fixed;
                    steps += 1;
                }
                if self.accumulator >= fixed {
                    log::debug!("Dropping {:.4}s of physics backlog", self.accumulator);
                    self.accumulator = 0.0;
                }
                steps
            }
            _ => {
                self.backend.step(dt);
                1
            }
        }
    }

    fn sync(&mut self, world: &World) {
        let stale: Vec<Entity> = self
            .bodies
            .keys()
            .filter(|&entity| body_source(world, entity).is_none())
            .collect();
        for entity in stale {
            self.remove_body(entity);
        }

        let sources: Vec<(Entity, Rigidbody2DComponent)> = world
            .entities()
            .filter_map(|entity| body_source(world, entity).map(|rigidbody| (entity, rigidbody)))
            .collect();
        for (entity, rigidbody) in sources {
            let action = match self.bodies.get(entity) {
                None => Some(SyncAction::Create),
                Some(record)
                    if record.body_type != rigidbody.body_type
                        || record.mass.to_bits() != rigidbody.mass.to_bits()
                        || colliders_changed(world, entity, &record.colliders) =>
                {
                    Some(SyncAction::Recreate)
                }
                Some(record) if record.properties != rigidbody.properties() => {
                    Some(SyncAction::Update(rigidbody.properties()))
                }
                Some(_) => None,
            };

            match action {
                Some(SyncAction::Create) => self.create_body(world, entity, &rigidbody),
                Some(SyncAction::Recreate) => self.recreate_body(world, entity, &rigidbody),
                Some(SyncAction::Update(properties)) => {
                    if let Some(record) = self.bodies.get_mut(entity) {
                        self.backend.set_body_properties(record.handle, &properties);
                        record.properties = properties;
                    }
                }
                None => {}
            }
        }
    }

    fn recreate_body(&mut self, world: &World, entity: Entity, rigidbody: &Rigidbody2DComponent) {
        let carried = match self.bodies.get(entity) {
            Some(record) if record.body_type == BodyType::Dynamic && rigidbody.body_type == BodyType::Dynamic => {
                self.backend
                    .body_pose(record.handle)
                    .zip(self.backend.linear_velocity(record.handle))
            }
            _ => None,
        };

        self.remove_body(entity);
        self.create_body(world, entity, rigidbody);

        if let Some((pose, velocity)) = carried {
            self.set_body_pose(entity, pose);
            self.set_linear_velocity(entity, velocity);
        }
    }

    fn create_body(&mut self, world: &World, entity: Entity, rigidbody: &Rigidbody2DComponent) {
        let Ok(matrix) = hierarchy::world_matrix(world, entity) else {
            return;
        };
        let (pose, _, scale) = match pose_2d(&matrix) {
            Ok(parts) => parts,
            Err(reason) => {
                self.fault(entity, FaultStage::Create, reason);
                return;
            }
        };

        let built = collider_descs(world, entity, scale.xy().abs());
        let mut colliders = built.clone();
        let total_area: f32 = colliders.iter().map(|c| c.shape.area()).sum();
        if total_area > 0.0 {
            let density = rigidbody.mass / total_area;
            for collider in &mut colliders {
                collider.density = density;
            }
        }

        let desc = BodyDesc {
            body_type: rigidbody.body_type,
            pose,
            properties: rigidbody.properties(),
            additional_mass: rigidbody.mass,
            colliders,
        };
        let handle = self.backend.create_body(&desc);
        self.bodies.insert(
            entity,
            BodyRecord {
                handle,
                body_type: rigidbody.body_type,
                properties: desc.properties,
                mass: rigidbody.mass,
                colliders: built,
                last_pose: pose,
            },
        );
        self.owners.insert(handle, entity);
        log::debug!("Created {:?} body for entity {entity}", rigidbody.body_type);
    }

    fn push_transforms(&mut self, world: &World) {
        let driven: Vec<Entity> = self
            .bodies
            .iter()
            .filter(|(_, record)| record.body_type.is_transform_driven())
            .map(|(entity, _)| entity)
            .collect();
        for entity in driven {
            self.push_transform(world, entity);
        }
    }

    /// Re-push transform-driven bodies whose world pose moved with a dynamic ancestor
    fn push_followers(&mut self, world: &World) {
        let followers: Vec<Entity> = self
            .bodies
            .iter()
            .filter(|&(entity, record)| {
                record.body_type.is_transform_driven() && self.has_dynamic_ancestor(world, entity)
            })
            .map(|(entity, _)| entity)
            .collect();
        for entity in followers {
            self.push_transform(world, entity);
        }
    }

    fn push_transform(&mut self, world: &World, entity: Entity) {
        let Ok(matrix) = hierarchy::world_matrix(world, entity) else {
            return;
        };
        let Some(record) = self.bodies.get_mut(entity) else {
            return;
        };
        match pose_2d(&matrix) {
            Ok((pose, _, _)) => {
                if !pose.approx_eq(&record.last_pose, POSE_EPSILON) {
                    self.backend.set_body_pose(record.handle, pose);
                    record.last_pose = pose;
                }
            }
            Err(reason) => {
                log::warn!("Cannot push transform of entity {entity}: {reason}");
                self.report.faults.push(TransformFault {
                    entity,
                    stage: FaultStage::Push,
                    reason,
                });
            }
        }
    }

    fn has_dynamic_ancestor(&self, world: &World, entity: Entity) -> bool {
        let mut current = hierarchy::parent(world, entity);
        while let Some(node) = current {
            if self
                .bodies
                .get(node)
                .is_some_and(|record| record.body_type == BodyType::Dynamic)
            {
                return true;
            }
            current = hierarchy::parent(world, node);
        }
        false
    }

    fn write_back(&mut self, world: &mut World) {
        // Parents first, so children convert against their parent's new pose
        let mut poses: Vec<(usize, Entity, Pose2D)> = self
            .bodies
            .iter()
            .filter(|(_, record)| record.body_type == BodyType::Dynamic)
            .filter_map(|(entity, record)| {
                self.backend
                    .body_pose(record.handle)
                    .map(|pose| (hierarchy::depth(world, entity), entity, pose))
            })
            .collect();
        poses.sort_by_key(|&(depth, _, _)| depth);

        for (_, entity, pose) in poses {
            match apply_pose(world, entity, pose) {
                Ok(true) => self.report.written_back += 1,
                Ok(false) => {}
                Err(reason) => {
                    log::warn!("Skipping write-back of entity {entity}: {reason}");
                    self.report.faults.push(TransformFault {
                        entity,
                        stage: FaultStage::WriteBack,
                        reason,
                    });
                }
            }
        }
    }

    fn collect_contacts(&mut self) {
        self.backend.drain_contacts(&mut self.raw_contacts);
        for contact in self.raw_contacts.drain(..) {
            let (Some(&a), Some(&b)) = (self.owners.get(contact.a), self.owners.get(contact.b)) else {
                continue;
            };
            self.contacts.push(ContactEvent {
                kind: if contact.started { ContactKind::Begin } else { ContactKind::End },
                a,
                b,
            });
        }
    }

    fn fault(&mut self, entity: Entity, stage: FaultStage, reason: DegenerateTransform) {
        log::warn!("Entity {entity} has a degenerate transform ({reason}), no body created");
        self.report.faults.push(TransformFault { entity, stage, reason });
    }

    /// Destroy the body of `entity`; false if it had none
    pub fn remove_body(&mut self, entity: Entity) -> bool {
        let Some(record) = self.bodies.remove(entity) else {
            return false;
        };
        self.owners.remove(record.handle);
        self.backend.destroy_body(record.handle);
        log::debug!("Destroyed body of entity {entity}");
        true
    }

    /// Whether `entity` currently has a body
    pub fn has_body(&self, entity: Entity) -> bool {
        self.bodies.contains_key(entity)
    }

    /// Backend handle of the body of `entity`
    pub fn body_handle(&self, entity: Entity) -> Option<BodyHandle> {
        self.bodies.get(entity).map(|record| record.handle)
    }

    /// Number of bodies in the side table
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// World pose of the body of `entity`
    pub fn body_pose(&self, entity: Entity) -> Option<Pose2D> {
        self.body_handle(entity).and_then(|handle| self.backend.body_pose(handle))
    }

    /// Teleport the body of `entity`; false if it has none
    pub fn set_body_pose(&mut self, entity: Entity, pose: Pose2D) -> bool {
        let Some(record) = self.bodies.get_mut(entity) else {
            return false;
        };
        self.backend.set_body_pose(record.handle, pose);
        record.last_pose = pose;
        true
    }

    /// Linear velocity of the body of `entity`
    pub fn linear_velocity(&self, entity: Entity) -> Option<Vec2> {
        self.body_handle(entity).and_then(|handle| self.backend.linear_velocity(handle))
    }

    /// Replace the linear velocity; false if `entity` has no body
    pub fn set_linear_velocity(&mut self, entity: Entity, velocity: Vec2) -> bool {
        self.body_handle(entity)
            .map(|handle| self.backend.set_linear_velocity(handle, velocity))
            .is_some()
    }

    /// Apply a force for the next step; false if `entity` has no body
    pub fn apply_force(&mut self, entity: Entity, force: Vec2) -> bool {
        self.body_handle(entity)
            .map(|handle| self.backend.apply_force(handle, force))
            .is_some()
    }

    /// Apply an impulse; false if `entity` has no body
    pub fn apply_linear_impulse(&mut self, entity: Entity, impulse: Vec2) -> bool {
        self.body_handle(entity)
            .map(|handle| self.backend.apply_linear_impulse(handle, impulse))
            .is_some()
    }

    /// Gravity of the physics world
    pub fn gravity(&self) -> Vec2 {
        self.backend.gravity()
    }

    /// Replace gravity
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.backend.set_gravity(gravity);
    }

    /// Underlying backend
    pub fn backend(&self) -> &dyn PhysicsBackend {
        self.backend.as_ref()
    }
}

/// Rigidbody settings the body of `entity` is built from
///
/// Collider-only entities get a massless static body. Disabled entities and
/// entities with neither component get none.
fn body_source(world: &World, entity: Entity) -> Option<Rigidbody2DComponent> {
    if !is_enabled(world, entity) {
        return None;
    }
    if let Ok(rigidbody) = world.get_component::<Rigidbody2DComponent>(entity) {
        return Some(rigidbody.clone());
    }
    let has_collider = world.has_component::<BoxCollider2DComponent>(entity)
        || world.has_component::<CircleCollider2DComponent>(entity);
    has_collider.then(|| Rigidbody2DComponent::new(BodyType::Static).with_mass(0.0))
}

/// Whether the colliders of `entity` differ from those its body was built with
///
/// An entity whose scale cannot be read keeps its body.
fn colliders_changed(world: &World, entity: Entity, built: &[ColliderDesc]) -> bool {
    let Ok(matrix) = hierarchy::world_matrix(world, entity) else {
        return false;
    };
    match pose_2d(&matrix) {
        Ok((_, _, scale)) => collider_descs(world, entity, scale.xy().abs()) != built,
        Err(_) => false,
    }
}

fn collider_descs(world: &World, entity: Entity, scale: Vec2) -> Vec<ColliderDesc> {
    let mut colliders = Vec::new();
    if let Ok(collider) = world.get_component::<BoxCollider2DComponent>(entity) {
        colliders.push(ColliderDesc {
            shape: ColliderShape::Box {
                half_extents: collider.size.component_mul(&scale) * 0.5,
            },
            offset: collider.offset.component_mul(&scale),
            density: 0.0,
            friction: collider.friction,
            restitution: collider.restitution,
            is_sensor: collider.is_sensor,
            collision_category: collider.collision_category,
            collision_mask: collider.collision_mask,
        });
    }
    if let Ok(collider) = world.get_component::<CircleCollider2DComponent>(entity) {
        colliders.push(ColliderDesc {
            shape: ColliderShape::Circle {
                radius: collider.radius * scale.x.max(scale.y),
            },
            offset: collider.offset.component_mul(&scale),
            density: 0.0,
            friction: collider.friction,
            restitution: collider.restitution,
            is_sensor: collider.is_sensor,
            collision_category: collider.collision_category,
            collision_mask: collider.collision_mask,
        });
    }
    colliders
}

/// Write a world-space pose into the entity's local transform
///
/// Returns `Ok(false)` when the entity has no transform.
fn apply_pose(world: &mut World, entity: Entity, pose: Pose2D) -> Result<bool, DegenerateTransform> {
    if !pose.is_finite() {
        return Err(DegenerateTransform::NonFinite);
    }
    let Ok(current) = world.get_component::<TransformComponent>(entity) else {
        return Ok(false);
    };

    let (position, rotation) = match hierarchy::parent(world, entity) {
        None => (
            Vec3::new(pose.position.x, pose.position.y, current.position.z),
            rotation_z(pose.angle),
        ),
        Some(parent) => {
            let parent_matrix = hierarchy::world_matrix(world, parent).map_err(|_| DegenerateTransform::Singular)?;
            let (world_translation, _, world_scale) = decompose_transform(&(parent_matrix * current.to_matrix()))?;
            let target = recompose_transform(
                &Vec3::new(pose.position.x, pose.position.y, world_translation.z),
                &rotation_z(pose.angle),
                &world_scale,
            );
            let inverse = parent_matrix.try_inverse().ok_or(DegenerateTransform::Singular)?;
            let (local_position, local_rotation, _) = decompose_transform(&(inverse * target))?;
            (local_position, local_rotation)
        }
    };

    let transform = world
        .get_component_mut::<TransformComponent>(entity)
        .map_err(|_| DegenerateTransform::Singular)?;
    transform.position = position;
    transform.rotation = rotation;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::TagComponent;
    use crate::physics::testing::{MockBackend, MockProbe};
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn world_pose(world: &World, entity: Entity) -> Pose2D {
        let matrix = hierarchy::world_matrix(world, entity).unwrap();
        pose_2d(&matrix).unwrap().0
    }

    fn spawn_body(world: &mut World, x: f32, y: f32, body_type: BodyType) -> Entity {
        let entity = world.create_entity();
        world.add_component(entity, TransformComponent::from_xy(x, y)).unwrap();
        world.add_component(entity, Rigidbody2DComponent::new(body_type)).unwrap();
        world.add_component(entity, BoxCollider2DComponent::default()).unwrap();
        entity
    }

    fn mock_bridge(settings: PhysicsSettings) -> (Physics2DBridge, MockProbe) {
        let probe = MockProbe::default();
        (Physics2DBridge::new(Box::new(MockBackend::new(probe.clone())), settings), probe)
    }

    #[test]
    fn test_build_creates_one_body_per_rigidbody() {
        let mut world = World::new();
        let a = spawn_body(&mut world, 0.0, 0.0, BodyType::Dynamic);
        let b = spawn_body(&mut world, 1.0, 0.0, BodyType::Static);
        let plain = world.create_entity();

        let mut bridge = Physics2DBridge::with_rapier(PhysicsSettings::default());
        bridge.build(&world);

        assert_eq!(bridge.body_count(), 2);
        assert_eq!(bridge.backend().body_count(), 2);
        assert!(bridge.has_body(a) && bridge.has_body(b));
        assert!(!bridge.has_body(plain));
    }

    #[test]
    fn test_zero_dt_does_not_step_or_write_back() {
        let mut world = World::new();
        let entity = spawn_body(&mut world, 0.0, 5.0, BodyType::Dynamic);
        let (mut bridge, probe) = mock_bridge(PhysicsSettings::default());
        bridge.build(&world);

        let report = bridge.advance(&mut world, Timestep::from(0.0)).clone();

        assert_eq!(report.steps, 0);
        assert_eq!(report.written_back, 0);
        assert_eq!(probe.steps(), 0);
        assert_eq!(world.get_component::<TransformComponent>(entity).unwrap().position.y, 5.0);
    }

    #[test]
    fn test_write_back_preserves_z_and_scale() {
        let mut world = World::new();
        let entity = spawn_body(&mut world, 0.0, 0.0, BodyType::Dynamic);
        {
            let transform = world.get_component_mut::<TransformComponent>(entity).unwrap();
            transform.position.z = 3.0;
            transform.scale = Vec3::new(2.0, 2.0, 1.0);
        }
        let mut bridge = Physics2DBridge::with_rapier(PhysicsSettings {
            gravity: [0.0, -9.81],
            ..Default::default()
        });
        bridge.build(&world);

        bridge.advance(&mut world, Timestep::from(1.0 / 60.0));

        let transform = world.get_component::<TransformComponent>(entity).unwrap();
        assert!(transform.position.y < 0.0);
        assert_eq!(transform.position.z, 3.0);
        assert_eq!(transform.scale, Vec3::new(2.0, 2.0, 1.0));
    }

    #[test]
    fn test_static_transform_is_pushed_and_never_overwritten() {
        let mut world = World::new();
        let entity = spawn_body(&mut world, 0.0, 0.0, BodyType::Static);
        let mut bridge = Physics2DBridge::with_rapier(PhysicsSettings::default());
        bridge.build(&world);

        world.get_component_mut::<TransformComponent>(entity).unwrap().position = Vec3::new(4.0, -2.0, 0.0);
        bridge.advance(&mut world, Timestep::from(1.0 / 60.0));

        let pose = bridge.body_pose(entity).unwrap();
        assert_relative_eq!(pose.position, Vec2::new(4.0, -2.0), epsilon = 1e-5);
        assert_eq!(
            world.get_component::<TransformComponent>(entity).unwrap().position,
            Vec3::new(4.0, -2.0, 0.0)
        );
    }

    #[test]
    fn test_kinematic_body_follows_transform() {
        let mut world = World::new();
        let entity = spawn_body(&mut world, 0.0, 0.0, BodyType::Kinematic);
        let mut bridge = Physics2DBridge::with_rapier(PhysicsSettings::default());
        bridge.build(&world);

        world.get_component_mut::<TransformComponent>(entity).unwrap().position.x = 1.5;
        bridge.advance(&mut world, Timestep::from(1.0 / 60.0));

        assert_relative_eq!(bridge.body_pose(entity).unwrap().position.x, 1.5, epsilon = 1e-5);
        assert_eq!(world.get_component::<TransformComponent>(entity).unwrap().position.x, 1.5);
    }

    #[test]
    fn test_non_finite_pose_is_skipped_and_reported() {
        let mut world = World::new();
        let entity = spawn_body(&mut world, 1.0, 2.0, BodyType::Dynamic);
        let (mut bridge, probe) = mock_bridge(PhysicsSettings::default());
        bridge.build(&world);
        probe.poison();

        let report = bridge.advance(&mut world, Timestep::from(1.0 / 60.0)).clone();

        assert_eq!(report.written_back, 0);
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].entity, entity);
        assert_eq!(report.faults[0].stage, FaultStage::WriteBack);
        assert_eq!(
            world.get_component::<TransformComponent>(entity).unwrap().position,
            Vec3::new(1.0, 2.0, 0.0)
        );
    }

    #[test]
    fn test_degenerate_transform_gets_no_body() {
        let mut world = World::new();
        let entity = spawn_body(&mut world, 0.0, 0.0, BodyType::Dynamic);
        world.get_component_mut::<TransformComponent>(entity).unwrap().scale = Vec3::new(0.0, 1.0, 1.0);
        let mut bridge = Physics2DBridge::with_rapier(PhysicsSettings::default());

        bridge.build(&world);

        assert!(!bridge.has_body(entity));
        assert_eq!(bridge.last_report().faults[0].stage, FaultStage::Create);
    }

    #[test]
    fn test_sync_tracks_added_removed_and_retyped_bodies() {
        let mut world = World::new();
        let entity = spawn_body(&mut world, 0.0, 0.0, BodyType::Dynamic);
        let (mut bridge, _probe) = mock_bridge(PhysicsSettings::default());
        bridge.build(&world);
        let first = bridge.body_handle(entity).unwrap();

        world.get_component_mut::<Rigidbody2DComponent>(entity).unwrap().body_type = BodyType::Static;
        bridge.advance(&mut world, Timestep::from(0.0));
        assert_ne!(bridge.body_handle(entity), Some(first));
        assert_eq!(bridge.backend().body_count(), 1);

        let late = spawn_body(&mut world, 5.0, 0.0, BodyType::Dynamic);
        bridge.advance(&mut world, Timestep::from(0.0));
        assert!(bridge.has_body(late));

        world.remove_component::<Rigidbody2DComponent>(entity).unwrap();
        world.destroy_entity(late).unwrap();
        bridge.advance(&mut world, Timestep::from(0.0));
        assert_eq!(bridge.body_count(), 0);
        assert_eq!(bridge.backend().body_count(), 0);
    }

    #[test]
    fn test_fixed_timestep_substeps() {
        let world_settings = PhysicsSettings {
            fixed_timestep: Some(0.25),
            max_substeps: 4,
            ..Default::default()
        };
        let mut world = World::new();
        let (mut bridge, probe) = mock_bridge(world_settings);
        bridge.build(&world);

        assert_eq!(bridge.advance(&mut world, Timestep::from(0.625)).steps, 2);
        assert_eq!(bridge.advance(&mut world, Timestep::from(0.625)).steps, 3);
        assert_eq!(bridge.advance(&mut world, Timestep::from(10.0)).steps, 4);
        assert_eq!(bridge.advance(&mut world, Timestep::from(0.125)).steps, 0);
        assert_eq!(probe.steps(), 9);
    }

    #[test]
    fn test_child_write_back_is_local() {
        let mut world = World::new();
        let parent = world.create_entity();
        world.add_component(parent, TransformComponent::from_xy(10.0, 0.0)).unwrap();
        let child = spawn_body(&mut world, 1.0, 0.0, BodyType::Dynamic);
        hierarchy::set_parent(&mut world, child, Some(parent)).unwrap();

        let (mut bridge, _probe) = mock_bridge(PhysicsSettings {
            gravity: [0.0, 0.0],
            ..Default::default()
        });
        bridge.build(&world);
        assert_relative_eq!(bridge.body_pose(child).unwrap().position, Vec2::new(11.0, 0.0), epsilon = 1e-5);

        bridge.set_body_pose(child, Pose2D::new(Vec2::new(12.0, 1.0), 0.0));
        bridge.advance(&mut world, Timestep::from(1.0 / 60.0));

        let local = world.get_component::<TransformComponent>(child).unwrap();
        assert_relative_eq!(local.position, Vec3::new(2.0, 1.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn test_collider_only_entity_gets_static_body() {
        let mut world = World::new();
        let wall = world.create_entity();
        world.add_component(wall, TransformComponent::from_xy(3.0, 0.0)).unwrap();
        world.add_component(wall, BoxCollider2DComponent::default()).unwrap();
        let (mut bridge, _probe) = mock_bridge(PhysicsSettings::default());

        bridge.build(&world);
        assert!(bridge.has_body(wall));
        assert_relative_eq!(bridge.body_pose(wall).unwrap().position, Vec2::new(3.0, 0.0));

        bridge.advance(&mut world, Timestep::from(DT));
        assert_relative_eq!(bridge.body_pose(wall).unwrap().position, Vec2::new(3.0, 0.0));

        world.remove_component::<BoxCollider2DComponent>(wall).unwrap();
        bridge.advance(&mut world, Timestep::from(0.0));
        assert!(!bridge.has_body(wall));
    }

    #[test]
    fn test_disabled_entity_has_no_body() {
        let mut world = World::new();
        let entity = spawn_body(&mut world, 0.0, 5.0, BodyType::Dynamic);
        world.add_component(entity, TagComponent::new("Box").with_enabled(false)).unwrap();
        let (mut bridge, _probe) = mock_bridge(PhysicsSettings::default());

        bridge.build(&world);
        assert!(!bridge.has_body(entity));

        world.get_component_mut::<TagComponent>(entity).unwrap().enabled = true;
        bridge.advance(&mut world, Timestep::from(0.0));
        assert!(bridge.has_body(entity));

        world.get_component_mut::<TagComponent>(entity).unwrap().enabled = false;
        let report = bridge.advance(&mut world, Timestep::from(DT)).clone();
        assert!(!bridge.has_body(entity));
        assert_eq!(report.written_back, 0);
        assert_eq!(world.get_component::<TransformComponent>(entity).unwrap().position.y, 5.0);
    }

    #[test]
    fn test_mass_change_rebuilds_body_and_keeps_motion() {
        let mut world = World::new();
        let entity = spawn_body(&mut world, 0.0, 0.0, BodyType::Dynamic);
        let (mut bridge, _probe) = mock_bridge(PhysicsSettings {
            gravity: [0.0, 0.0],
            ..Default::default()
        });
        bridge.build(&world);
        let first = bridge.body_handle(entity).unwrap();
        bridge.set_linear_velocity(entity, Vec2::new(1.0, 0.0));
        bridge.set_body_pose(entity, Pose2D::new(Vec2::new(0.5, 0.0), 0.0));

        world.get_component_mut::<Rigidbody2DComponent>(entity).unwrap().mass = 4.0;
        bridge.advance(&mut world, Timestep::from(0.0));

        assert_ne!(bridge.body_handle(entity), Some(first));
        assert_eq!(bridge.backend().body_count(), 1);
        assert_relative_eq!(bridge.body_pose(entity).unwrap().position, Vec2::new(0.5, 0.0));
        assert_relative_eq!(bridge.linear_velocity(entity).unwrap(), Vec2::new(1.0, 0.0));

        bridge.apply_linear_impulse(entity, Vec2::new(4.0, 0.0));
        assert_relative_eq!(bridge.linear_velocity(entity).unwrap(), Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_collider_edits_rebuild_body() {
        let mut world = World::new();
        let entity = spawn_body(&mut world, 0.0, 0.0, BodyType::Dynamic);
        let (mut bridge, _probe) = mock_bridge(PhysicsSettings::default());
        bridge.build(&world);
        let first = bridge.body_handle(entity).unwrap();

        bridge.advance(&mut world, Timestep::from(0.0));
        assert_eq!(bridge.body_handle(entity), Some(first));

        world.get_component_mut::<BoxCollider2DComponent>(entity).unwrap().size = Vec2::new(2.0, 1.0);
        bridge.advance(&mut world, Timestep::from(0.0));
        let second = bridge.body_handle(entity).unwrap();
        assert_ne!(second, first);

        world.get_component_mut::<BoxCollider2DComponent>(entity).unwrap().is_sensor = true;
        bridge.advance(&mut world, Timestep::from(0.0));
        let third = bridge.body_handle(entity).unwrap();
        assert_ne!(third, second);

        world.get_component_mut::<TransformComponent>(entity).unwrap().scale = Vec3::new(3.0, 3.0, 1.0);
        bridge.advance(&mut world, Timestep::from(0.0));
        assert_ne!(bridge.body_handle(entity), Some(third));

        world.add_component(entity, CircleCollider2DComponent::new(0.25)).unwrap();
        let before = bridge.body_handle(entity);
        bridge.advance(&mut world, Timestep::from(0.0));
        assert_ne!(bridge.body_handle(entity), before);
        assert_eq!(bridge.backend().body_count(), 1);
    }

    #[test]
    fn test_nested_dynamic_bodies_write_back_parent_first() {
        let mut world = World::new();
        // Child occupies the lower slot, so slot order would visit it first
        let child = spawn_body(&mut world, 0.0, 1.0, BodyType::Dynamic);
        let parent = spawn_body(&mut world, 0.0, 10.0, BodyType::Dynamic);
        hierarchy::set_parent(&mut world, child, Some(parent)).unwrap();
        let (mut bridge, _probe) = mock_bridge(PhysicsSettings {
            gravity: [0.0, -9.8],
            ..Default::default()
        });
        bridge.build(&world);

        for _ in 0..5 {
            bridge.advance(&mut world, Timestep::from(DT));
        }

        for entity in [parent, child] {
            let body = bridge.body_pose(entity).unwrap();
            assert!(body.position.y < 11.0);
            assert_relative_eq!(world_pose(&world, entity).position, body.position, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_static_child_follows_dynamic_parent_in_same_advance() {
        let mut world = World::new();
        let parent = spawn_body(&mut world, 0.0, 10.0, BodyType::Dynamic);
        let follower = spawn_body(&mut world, 2.0, 0.0, BodyType::Static);
        hierarchy::set_parent(&mut world, follower, Some(parent)).unwrap();
        let (mut bridge, _probe) = mock_bridge(PhysicsSettings {
            gravity: [0.0, -9.8],
            ..Default::default()
        });
        bridge.build(&world);

        bridge.advance(&mut world, Timestep::from(DT));

        let parent_body = bridge.body_pose(parent).unwrap();
        assert!(parent_body.position.y < 10.0);
        assert_relative_eq!(
            bridge.body_pose(follower).unwrap().position,
            parent_body.position + Vec2::new(2.0, 0.0),
            epsilon = 1e-5
        );
        assert_eq!(
            world.get_component::<TransformComponent>(follower).unwrap().position,
            Vec3::new(2.0, 0.0, 0.0)
        );
    }
}
