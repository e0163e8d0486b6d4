//! Deterministic in-memory backend for bridge and scene tests

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use slotmap::SlotMap;

use crate::foundation::math::{Pose2D, Vec2};

use super::backend::{BodyContact, BodyHandle, PhysicsBackend};
use super::body::{BodyDesc, BodyProperties, BodyType};

/// Shared view into a [`MockBackend`] after it moved into a bridge
#[derive(Clone, Default)]
pub struct MockProbe {
    steps: Arc<AtomicU32>,
    poisoned: Arc<AtomicBool>,
    contacts: Arc<Mutex<Vec<(usize, usize, bool)>>>,
}

impl MockProbe {
    pub fn steps(&self) -> u32 {
        self.steps.load(Ordering::SeqCst)
    }

    /// Make every subsequent pose query return NaN
    pub fn poison(&self) {
        self.poisoned.store(true, Ordering::SeqCst);
    }

    /// Report a contact between the bodies created `a`-th and `b`-th at the next step
    pub fn queue_contact(&self, a: usize, b: usize, started: bool) {
        self.contacts.lock().unwrap().push((a, b, started));
    }
}

struct MockBody {
    body_type: BodyType,
    pose: Pose2D,
    velocity: Vec2,
    force: Vec2,
    mass: f32,
    properties: BodyProperties,
}

/// Semi-implicit Euler integrator without collision response
pub struct MockBackend {
    probe: MockProbe,
    gravity: Vec2,
    bodies: SlotMap<BodyHandle, MockBody>,
    created: Vec<BodyHandle>,
    contacts: Vec<BodyContact>,
}

impl MockBackend {
    pub fn new(probe: MockProbe) -> Self {
        Self {
            probe,
            gravity: Vec2::zeros(),
            bodies: SlotMap::with_key(),
            created: Vec::new(),
            contacts: Vec::new(),
        }
    }
}

impl PhysicsBackend for MockBackend {
    fn gravity(&self) -> Vec2 {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = self.bodies.insert(MockBody {
            body_type: desc.body_type,
            pose: desc.pose,
            velocity: Vec2::zeros(),
            force: Vec2::zeros(),
            mass: desc.additional_mass.max(f32::EPSILON),
            properties: desc.properties,
        });
        self.created.push(handle);
        handle
    }

    fn destroy_body(&mut self, handle: BodyHandle) -> bool {
        self.bodies.remove(handle).is_some()
    }

    fn set_body_properties(&mut self, handle: BodyHandle, properties: &BodyProperties) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.properties = *properties;
        }
    }

    fn body_pose(&self, handle: BodyHandle) -> Option<Pose2D> {
        if self.probe.poisoned.load(Ordering::SeqCst) {
            return self
                .bodies
                .contains_key(handle)
                .then(|| Pose2D::new(Vec2::new(f32::NAN, f32::NAN), f32::NAN));
        }
        self.bodies.get(handle).map(|body| body.pose)
    }

    fn set_body_pose(&mut self, handle: BodyHandle, pose: Pose2D) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.pose = pose;
        }
    }

    fn linear_velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(handle).map(|body| body.velocity)
    }

    fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.velocity = velocity;
        }
    }

    fn apply_force(&mut self, handle: BodyHandle, force: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.force += force;
        }
    }

    fn apply_linear_impulse(&mut self, handle: BodyHandle, impulse: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.velocity += impulse / body.mass;
        }
    }

    fn step(&mut self, dt: f32) {
        self.probe.steps.fetch_add(1, Ordering::SeqCst);
        for body in self.bodies.values_mut() {
            if body.body_type == BodyType::Dynamic {
                let acceleration = self.gravity * body.properties.gravity_scale + body.force / body.mass;
                body.velocity += acceleration * dt;
                body.pose.position += body.velocity * dt;
            }
            body.force = Vec2::zeros();
        }

        let queued: Vec<_> = self.probe.contacts.lock().unwrap().drain(..).collect();
        for (a, b, started) in queued {
            if let (Some(&a), Some(&b)) = (self.created.get(a), self.created.get(b)) {
                self.contacts.push(BodyContact { a, b, started });
            }
        }
    }

    fn drain_contacts(&mut self, out: &mut Vec<BodyContact>) {
        out.append(&mut self.contacts);
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}
