//! Rigid bodies: descriptions, handles and the world's per-body operations

use crate::entity::EntityId;
use crate::error::{PhysicsError, Result};
use crate::math::{clamp_magnitude, to_point, Transform, Vec2};
use crate::shape::Shape;
use crate::world::PhysicsWorld;
use log::debug;
use rapier2d::prelude as rapier;

/// Handle to a rigid body in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) rapier::RigidBodyHandle);

impl BodyHandle {
    /// Create from raw Rapier handle
    pub fn from_raw(handle: rapier::RigidBodyHandle) -> Self {
        Self(handle)
    }

    /// Get the raw Rapier handle
    pub fn raw(&self) -> rapier::RigidBodyHandle {
        self.0
    }
}

/// Description for inserting a rigid body. A mass of zero makes the body static.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    /// Collision geometry (shared)
    pub shape: Shape,
    /// Initial position and orientation
    pub transform: Transform,
    /// Mass; 0 for static
    pub mass: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Prevent all rotation
    pub lock_rotation: bool,
    /// Allow the solver to put this body to sleep
    pub can_sleep: bool,
    /// Upper bound on the magnitude of `apply_force`
    pub max_force: f32,
    /// Upper bound on the magnitude of `apply_torque`
    pub max_torque: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl BodyDesc {
    /// Dynamic body of the given mass
    pub fn dynamic(shape: Shape, mass: f32) -> Self {
        Self {
            shape,
            transform: Transform::identity(),
            mass,
            linear_velocity: Vec2::zeros(),
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            lock_rotation: false,
            can_sleep: true,
            max_force: f32::INFINITY,
            max_torque: f32::INFINITY,
            friction: 0.5,
            restitution: 0.0,
        }
    }

    /// Static body
    pub fn fixed(shape: Shape) -> Self {
        Self::dynamic(shape, 0.0)
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.transform = self.transform.with_angle(angle);
        self
    }

    pub fn with_linear_velocity(mut self, velocity: Vec2) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, velocity: f32) -> Self {
        self.angular_velocity = velocity;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn with_lock_rotation(mut self, lock: bool) -> Self {
        self.lock_rotation = lock;
        self
    }

    pub fn with_can_sleep(mut self, can_sleep: bool) -> Self {
        self.can_sleep = can_sleep;
        self
    }

    /// Set force and torque limits
    pub fn with_limits(mut self, max_force: f32, max_torque: f32) -> Self {
        self.max_force = max_force;
        self.max_torque = max_torque;
        self
    }

    pub fn with_material(mut self, friction: f32, restitution: f32) -> Self {
        self.friction = friction;
        self.restitution = restitution;
        self
    }

    /// Whether this description produces a static body
    pub fn is_fixed(&self) -> bool {
        self.mass == 0.0
    }
}

/// Per-body bookkeeping the solver does not carry
#[derive(Debug, Clone)]
pub(crate) struct BodyRecord {
    pub max_force: f32,
    pub max_torque: f32,
    /// Inverse moment of inertia about the plane normal; 0 when rotation cannot change
    pub inv_inertia: f32,
    pub owner: Option<EntityId>,
}

impl PhysicsWorld {
    fn rapier_body(&self, handle: BodyHandle) -> Result<&rapier::RigidBody> {
        self.bodies
            .get(handle.0)
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    fn rapier_body_mut(&mut self, handle: BodyHandle) -> Result<&mut rapier::RigidBody> {
        self.bodies
            .get_mut(handle.0)
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    pub(crate) fn record(&self, handle: BodyHandle) -> Result<&BodyRecord> {
        self.records
            .get(&handle.0)
            .ok_or(PhysicsError::BodyNotFound(handle))
    }

    // ==================== Lifecycle ====================

    /// Insert a body and its collider
    pub fn insert_body(&mut self, desc: BodyDesc) -> Result<BodyHandle> {
        if !desc.mass.is_finite() || desc.mass < 0.0 {
            return Err(PhysicsError::InvalidMass(desc.mass));
        }

        let fixed = desc.is_fixed();
        let area = desc.shape.area();
        if !fixed && area <= 0.0 {
            return Err(PhysicsError::ShapeCreationFailed(
                "dynamic body needs a shape with non-zero area".into(),
            ));
        }
        let density = if fixed { 1.0 } else { desc.mass / area };

        let mut builder = if fixed {
            rapier::RigidBodyBuilder::fixed()
        } else {
            rapier::RigidBodyBuilder::dynamic()
        }
        .position(desc.transform.to_isometry())
        .linvel(desc.linear_velocity)
        .angvel(desc.angular_velocity)
        .linear_damping(desc.linear_damping)
        .angular_damping(desc.angular_damping)
        .can_sleep(desc.can_sleep && self.config.sleeping_enabled);
        if desc.lock_rotation {
            builder = builder.lock_rotations();
        }

        let handle = self.bodies.insert(builder);

        let mut collider = rapier::ColliderBuilder::new(desc.shape.0.clone())
            .density(density)
            .friction(desc.friction)
            .restitution(desc.restitution);
        if self.config.collision_events {
            collider = collider.active_events(rapier::ActiveEvents::COLLISION_EVENTS);
        }
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        let inv_inertia = if fixed || desc.lock_rotation {
            0.0
        } else {
            desc.shape.inertia(density).1
        };

        self.records.insert(
            handle,
            BodyRecord {
                max_force: desc.max_force,
                max_torque: desc.max_torque,
                inv_inertia,
                owner: None,
            },
        );
        self.query_dirty = true;

        debug!(
            "Inserted {} body {:?} (mass {})",
            if fixed { "static" } else { "dynamic" },
            handle,
            desc.mass
        );
        Ok(BodyHandle(handle))
    }

    /// Remove a body and its colliders. The owning entity, if any, is not touched.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<()> {
        self.bodies
            .remove(
                handle.0,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .ok_or(PhysicsError::BodyNotFound(handle))?;
        self.records.remove(&handle.0);
        self.warped.remove(&handle.0);
        self.query_dirty = true;
        debug!("Removed body {:?}", handle.0);
        Ok(())
    }

    /// Whether the handle still refers to a live body
    pub fn contains_body(&self, handle: BodyHandle) -> bool {
        self.records.contains_key(&handle.0)
    }

    /// Entity that owns a body, if any
    pub fn owner(&self, handle: BodyHandle) -> Option<EntityId> {
        self.records.get(&handle.0).and_then(|r| r.owner)
    }

    // ==================== State ====================

    pub fn transform(&self, handle: BodyHandle) -> Result<Transform> {
        self.rapier_body(handle)
            .map(|b| Transform::from(*b.position()))
    }

    pub fn position(&self, handle: BodyHandle) -> Result<Vec2> {
        self.rapier_body(handle).map(|b| *b.translation())
    }

    pub fn angle(&self, handle: BodyHandle) -> Result<f32> {
        self.rapier_body(handle).map(|b| b.rotation().angle())
    }

    pub fn linear_velocity(&self, handle: BodyHandle) -> Result<Vec2> {
        self.rapier_body(handle).map(|b| *b.linvel())
    }

    pub fn angular_velocity(&self, handle: BodyHandle) -> Result<f32> {
        self.rapier_body(handle).map(|b| b.angvel())
    }

    pub fn is_sleeping(&self, handle: BodyHandle) -> Result<bool> {
        self.rapier_body(handle).map(|b| b.is_sleeping())
    }

    /// Inverse inertia about the plane normal (0 for static or rotation-locked bodies)
    pub fn inv_inertia(&self, handle: BodyHandle) -> Result<f32> {
        self.record(handle).map(|r| r.inv_inertia)
    }

    pub fn max_force(&self, handle: BodyHandle) -> Result<f32> {
        self.record(handle).map(|r| r.max_force)
    }

    pub fn max_torque(&self, handle: BodyHandle) -> Result<f32> {
        self.record(handle).map(|r| r.max_torque)
    }

    pub fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec2) -> Result<()> {
        self.rapier_body_mut(handle)
            .map(|b| b.set_linvel(velocity, true))
    }

    pub fn set_angular_velocity(&mut self, handle: BodyHandle, velocity: f32) -> Result<()> {
        self.rapier_body_mut(handle)
            .map(|b| b.set_angvel(velocity, true))
    }

    pub fn set_damping(&mut self, handle: BodyHandle, linear: f32, angular: f32) -> Result<()> {
        self.rapier_body_mut(handle).map(|b| {
            b.set_linear_damping(linear);
            b.set_angular_damping(angular);
        })
    }

    pub fn wake(&mut self, handle: BodyHandle) -> Result<()> {
        self.rapier_body_mut(handle).map(|b| b.wake_up(true))
    }

    // ==================== Forces ====================

    /// Add a central force for the current substep.
    ///
    /// The force is scaled down to the body's `max_force`; the returned value
    /// is what was actually applied.
    pub fn apply_force(&mut self, handle: BodyHandle, force: Vec2) -> Result<Vec2> {
        let applied = clamp_magnitude(force, self.record(handle)?.max_force);
        self.rapier_body_mut(handle)?.add_force(applied, true);
        Ok(applied)
    }

    /// Add a torque about the plane normal, clamped to `±max_torque`
    pub fn apply_torque(&mut self, handle: BodyHandle, torque: f32) -> Result<f32> {
        let max = self.record(handle)?.max_torque;
        let applied = torque.clamp(-max, max);
        self.rapier_body_mut(handle)?.add_torque(applied, true);
        Ok(applied)
    }

    /// Apply an instantaneous impulse at a world point
    pub fn apply_impulse_at(
        &mut self,
        handle: BodyHandle,
        impulse: Vec2,
        world_point: Vec2,
    ) -> Result<()> {
        self.rapier_body_mut(handle)?
            .apply_impulse_at_point(impulse, to_point(world_point), true);
        Ok(())
    }

    /// Teleport a body, keeping its velocities.
    ///
    /// Attached colliders move immediately so queries see the new pose, and
    /// contacts from before the warp are not reported.
    pub fn warp(&mut self, handle: BodyHandle, transform: Transform) -> Result<()> {
        let iso = transform.to_isometry();
        let body = self
            .bodies
            .get_mut(handle.0)
            .ok_or(PhysicsError::BodyNotFound(handle))?;
        body.set_position(iso, true);
        let attached: Vec<_> = body.colliders().to_vec();

        for collider in attached {
            if let Some(c) = self.colliders.get_mut(collider) {
                let local = c
                    .position_wrt_parent()
                    .copied()
                    .unwrap_or_else(rapier::Isometry::identity);
                c.set_position(iso * local);
            }
        }

        self.warped.insert(handle.0);
        self.query_dirty = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use approx::assert_relative_eq;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(PhysicsConfig::default()).unwrap()
    }

    #[test]
    fn test_insert_and_remove() {
        let mut world = world();
        let body = world
            .insert_body(BodyDesc::dynamic(Shape::ball(0.5), 2.0).with_position(Vec2::new(1.0, 2.0)))
            .unwrap();
        assert_eq!(world.body_count(), 1);
        assert_relative_eq!(world.position(body).unwrap(), Vec2::new(1.0, 2.0));

        world.remove_body(body).unwrap();
        assert_eq!(world.body_count(), 0);
        assert!(matches!(
            world.position(body),
            Err(PhysicsError::BodyNotFound(_))
        ));
        assert!(world.remove_body(body).is_err());
    }

    #[test]
    fn test_rejects_negative_mass() {
        let mut world = world();
        let err = world.insert_body(BodyDesc::dynamic(Shape::ball(0.5), -1.0));
        assert!(matches!(err, Err(PhysicsError::InvalidMass(_))));
    }

    #[test]
    fn test_force_is_scaled_not_truncated() {
        let mut world = world();
        let body = world
            .insert_body(BodyDesc::dynamic(Shape::ball(0.5), 1.0).with_limits(10.0, 2.0))
            .unwrap();

        let applied = world.apply_force(body, Vec2::new(60.0, 80.0)).unwrap();
        assert_relative_eq!(applied, Vec2::new(6.0, 8.0), epsilon = 1e-4);

        let small = world.apply_force(body, Vec2::new(1.0, 0.0)).unwrap();
        assert_relative_eq!(small, Vec2::new(1.0, 0.0));

        assert_relative_eq!(world.apply_torque(body, -5.0).unwrap(), -2.0);
        assert_relative_eq!(world.apply_torque(body, 0.5).unwrap(), 0.5);
    }

    #[test]
    fn test_inverse_inertia() {
        let mut world = world();
        // Solid disc: I = m r² / 2
        let disc = world
            .insert_body(BodyDesc::dynamic(Shape::ball(1.0), 2.0))
            .unwrap();
        assert_relative_eq!(world.inv_inertia(disc).unwrap(), 1.0, epsilon = 1e-3);

        let locked = world
            .insert_body(BodyDesc::dynamic(Shape::ball(1.0), 2.0).with_lock_rotation(true))
            .unwrap();
        assert_eq!(world.inv_inertia(locked).unwrap(), 0.0);

        let wall = world.insert_body(BodyDesc::fixed(Shape::cuboid(1.0, 1.0))).unwrap();
        assert_eq!(world.inv_inertia(wall).unwrap(), 0.0);
    }

    #[test]
    fn test_warp_keeps_velocity() {
        let mut world = world();
        let body = world
            .insert_body(
                BodyDesc::dynamic(Shape::ball(0.5), 1.0).with_linear_velocity(Vec2::new(3.0, 0.0)),
            )
            .unwrap();

        world
            .warp(body, Transform::new(Vec2::new(-40.0, 7.0), 1.0))
            .unwrap();
        let t = world.transform(body).unwrap();
        assert_relative_eq!(t.position, Vec2::new(-40.0, 7.0));
        assert_relative_eq!(t.angle(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(world.linear_velocity(body).unwrap(), Vec2::new(3.0, 0.0));
    }
}
