//! Rapier implementation of the physics backend.

use crossbeam_channel::Receiver;
use rapier2d::prelude::*;
use slotmap::{Key, KeyData, SlotMap};

use crate::foundation::math::{Pose2D, Vec2};

use super::backend::{BodyContact, BodyHandle, PhysicsBackend};
use super::body::{BodyDesc, BodyFlags, BodyProperties, BodyType, ColliderDesc, ColliderShape};

/// [`PhysicsBackend`] backed by a rapier2d pipeline
pub struct RapierBackend {
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    handles: SlotMap<BodyHandle, RigidBodyHandle>,
    forced: Vec<RigidBodyHandle>,
    event_collector: ChannelEventCollector,
    collision_events: Receiver<CollisionEvent>,
    contact_force_events: Receiver<ContactForceEvent>,
}

impl Default for RapierBackend {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, -9.8))
    }
}

fn to_user_data(handle: BodyHandle) -> u128 {
    u128::from(handle.data().as_ffi())
}

fn from_user_data(user_data: u128) -> Option<BodyHandle> {
    u64::try_from(user_data)
        .ok()
        .map(|ffi| BodyHandle::from(KeyData::from_ffi(ffi)))
}

const fn rigid_body_type(body_type: BodyType) -> RigidBodyType {
    match body_type {
        BodyType::Static => RigidBodyType::Fixed,
        BodyType::Dynamic => RigidBodyType::Dynamic,
        BodyType::Kinematic => RigidBodyType::KinematicPositionBased,
    }
}

fn interaction_groups(category: u16, mask: u16) -> InteractionGroups {
    InteractionGroups::new(
        Group::from_bits_truncate(u32::from(category)),
        Group::from_bits_truncate(u32::from(mask)),
    )
}

fn build_collider(desc: &ColliderDesc, user_data: u128) -> Collider {
    let builder = match desc.shape {
        ColliderShape::Box { half_extents } => ColliderBuilder::cuboid(half_extents.x, half_extents.y),
        ColliderShape::Circle { radius } => ColliderBuilder::ball(radius),
    };
    builder
        .translation(vector![desc.offset.x, desc.offset.y])
        .density(desc.density)
        .friction(desc.friction)
        .restitution(desc.restitution)
        .sensor(desc.is_sensor)
        .collision_groups(interaction_groups(desc.collision_category, desc.collision_mask))
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .user_data(user_data)
        .build()
}

impl RapierBackend {
    /// Create an empty world with the given gravity
    pub fn new(gravity: Vec2) -> Self {
        let (collision_send, collision_events) = crossbeam_channel::unbounded();
        let (contact_force_send, contact_force_events) = crossbeam_channel::unbounded();

        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![gravity.x, gravity.y],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            handles: SlotMap::with_key(),
            forced: Vec::new(),
            event_collector: ChannelEventCollector::new(collision_send, contact_force_send),
            collision_events,
            contact_force_events,
        }
    }

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.handles
            .get(handle)
            .and_then(|&rapier_handle| self.rigid_body_set.get(rapier_handle))
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        let rapier_handle = *self.handles.get(handle)?;
        self.rigid_body_set.get_mut(rapier_handle)
    }

    fn body_of_collider(&self, collider: ColliderHandle) -> Option<BodyHandle> {
        self.collider_set
            .get(collider)
            .and_then(|collider| from_user_data(collider.user_data))
    }
}

impl PhysicsBackend for RapierBackend {
    fn gravity(&self) -> Vec2 {
        Vec2::new(self.gravity.x, self.gravity.y)
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = vector![gravity.x, gravity.y];
    }

    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = self.handles.insert(RigidBodyHandle::invalid());
        let user_data = to_user_data(handle);
        let properties = &desc.properties;

        let mut builder = RigidBodyBuilder::new(rigid_body_type(desc.body_type))
            .translation(vector![desc.pose.position.x, desc.pose.position.y])
            .rotation(desc.pose.angle)
            .gravity_scale(properties.gravity_scale)
            .linear_damping(properties.linear_damping)
            .angular_damping(properties.angular_damping)
            .ccd_enabled(properties.flags.contains(BodyFlags::BULLET))
            .user_data(user_data);
        if properties.flags.contains(BodyFlags::FIXED_ROTATION) {
            builder = builder.lock_rotations();
        }
        if desc.colliders.is_empty() && desc.additional_mass > 0.0 {
            builder = builder.additional_mass(desc.additional_mass);
        }

        let rapier_handle = self.rigid_body_set.insert(builder.build());
        for collider in &desc.colliders {
            self.collider_set.insert_with_parent(
                build_collider(collider, user_data),
                rapier_handle,
                &mut self.rigid_body_set,
            );
        }
        self.handles[handle] = rapier_handle;
        handle
    }

    fn destroy_body(&mut self, handle: BodyHandle) -> bool {
        let Some(rapier_handle) = self.handles.remove(handle) else {
            return false;
        };
        self.rigid_body_set
            .remove(
                rapier_handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            )
            .is_some()
    }

    fn set_body_properties(&mut self, handle: BodyHandle, properties: &BodyProperties) {
        if let Some(body) = self.body_mut(handle) {
            body.set_gravity_scale(properties.gravity_scale, true);
            body.set_linear_damping(properties.linear_damping);
            body.set_angular_damping(properties.angular_damping);
            body.lock_rotations(properties.flags.contains(BodyFlags::FIXED_ROTATION), true);
            body.enable_ccd(properties.flags.contains(BodyFlags::BULLET));
        }
    }

    fn body_pose(&self, handle: BodyHandle) -> Option<Pose2D> {
        self.body(handle).map(|body| {
            let position = body.position();
            Pose2D::new(
                Vec2::new(position.translation.vector.x, position.translation.vector.y),
                position.rotation.angle(),
            )
        })
    }

    fn set_body_pose(&mut self, handle: BodyHandle, pose: Pose2D) {
        if let Some(body) = self.body_mut(handle) {
            let isometry = Isometry::new(vector![pose.position.x, pose.position.y], pose.angle);
            if body.is_kinematic() {
                body.set_next_kinematic_position(isometry);
            } else {
                body.set_position(isometry, true);
            }
        }
    }

    fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.body(handle).map(|body| Vec2::new(body.linvel().x, body.linvel().y))
    }

    fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.set_linvel(vector![velocity.x, velocity.y], true);
        }
    }

    fn apply_force(&mut self, handle: BodyHandle, force: Vec2) {
        let Some(&rapier_handle) = self.handles.get(handle) else {
            return;
        };
        if let Some(body) = self.rigid_body_set.get_mut(rapier_handle) {
            body.add_force(vector![force.x, force.y], true);
            self.forced.push(rapier_handle);
        }
    }

    fn apply_linear_impulse(&mut self, handle: BodyHandle, impulse: Vec2) {
        if let Some(body) = self.body_mut(handle) {
            body.apply_impulse(vector![impulse.x, impulse.y], true);
        }
    }

    fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &self.event_collector,
        );

        // User forces persist in rapier until cleared
        for rapier_handle in self.forced.drain(..) {
            if let Some(body) = self.rigid_body_set.get_mut(rapier_handle) {
                body.reset_forces(false);
            }
        }
    }

    fn drain_contacts(&mut self, out: &mut Vec<BodyContact>) {
        while let Ok(event) = self.collision_events.try_recv() {
            let (Some(a), Some(b)) = (
                self.body_of_collider(event.collider1()),
                self.body_of_collider(event.collider2()),
            ) else {
                continue;
            };
            out.push(BodyContact {
                a,
                b,
                started: event.started(),
            });
        }
        while self.contact_force_events.try_recv().is_ok() {}
    }

    fn body_count(&self) -> usize {
        self.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn falling_box(y: f32) -> BodyDesc {
        BodyDesc {
            body_type: BodyType::Dynamic,
            pose: Pose2D::new(Vec2::new(0.0, y), 0.0),
            properties: BodyProperties::default(),
            additional_mass: 1.0,
            colliders: vec![ColliderDesc {
                shape: ColliderShape::Box {
                    half_extents: Vec2::new(0.5, 0.5),
                },
                offset: Vec2::zeros(),
                density: 1.0,
                friction: 0.3,
                restitution: 0.0,
                is_sensor: false,
                collision_category: 0x0001,
                collision_mask: 0xFFFF,
            }],
        }
    }

    fn overlapping_pair(backend: &mut RapierBackend, mask: u16) -> (BodyHandle, BodyHandle) {
        let a = backend.create_body(&falling_box(0.0));
        let mut desc = falling_box(0.25);
        desc.colliders[0].collision_category = 0x0002;
        desc.colliders[0].collision_mask = mask;
        let b = backend.create_body(&desc);
        (a, b)
    }

    #[test]
    fn test_create_and_destroy_body() {
        let mut backend = RapierBackend::default();
        let handle = backend.create_body(&falling_box(2.0));

        assert_eq!(backend.body_count(), 1);
        let pose = backend.body_pose(handle).unwrap();
        assert_relative_eq!(pose.position, Vec2::new(0.0, 2.0), epsilon = 1e-6);

        assert!(backend.destroy_body(handle));
        assert!(!backend.destroy_body(handle));
        assert_eq!(backend.body_count(), 0);
        assert!(backend.body_pose(handle).is_none());
    }

    #[test]
    fn test_dynamic_body_falls() {
        let mut backend = RapierBackend::new(Vec2::new(0.0, -9.81));
        let handle = backend.create_body(&falling_box(0.0));

        backend.step(1.0 / 60.0);

        let pose = backend.body_pose(handle).unwrap();
        assert!(pose.position.y < 0.0);
        assert!(backend.linear_velocity(handle).unwrap().y < 0.0);
    }

    #[test]
    fn test_static_body_follows_set_pose() {
        let mut backend = RapierBackend::default();
        let mut desc = falling_box(0.0);
        desc.body_type = BodyType::Static;
        let handle = backend.create_body(&desc);

        backend.set_body_pose(handle, Pose2D::new(Vec2::new(3.0, 4.0), 0.5));
        backend.step(1.0 / 60.0);

        let pose = backend.body_pose(handle).unwrap();
        assert_relative_eq!(pose.position, Vec2::new(3.0, 4.0), epsilon = 1e-5);
        assert_relative_eq!(pose.angle, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_impulse_changes_velocity() {
        let mut backend = RapierBackend::new(Vec2::zeros());
        let handle = backend.create_body(&falling_box(0.0));
        backend.step(1.0 / 60.0);

        backend.apply_linear_impulse(handle, Vec2::new(2.0, 0.0));

        assert!(backend.linear_velocity(handle).unwrap().x > 0.0);
    }

    #[test]
    fn test_collision_filter_blocks_contacts() {
        let mut contacts = Vec::new();

        let mut backend = RapierBackend::new(Vec2::zeros());
        let (a, b) = overlapping_pair(&mut backend, 0xFFFF);
        backend.step(1.0 / 60.0);
        backend.drain_contacts(&mut contacts);
        assert!(contacts
            .iter()
            .any(|c| c.started && ((c.a == a && c.b == b) || (c.a == b && c.b == a))));

        contacts.clear();
        let mut backend = RapierBackend::new(Vec2::zeros());
        overlapping_pair(&mut backend, !0x0001);
        backend.step(1.0 / 60.0);
        backend.drain_contacts(&mut contacts);
        assert!(contacts.is_empty());
    }
}
