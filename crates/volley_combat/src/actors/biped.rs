//! Walking characters

use crate::error::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use volley_physics::math::clamp_magnitude;
use volley_physics::prelude::*;

/// Body and handling parameters for bipeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BipedTuning {
    /// Radius of the body circle
    pub radius: f32,
    /// Mass per unit area
    pub density: f32,
    /// Upper bound on the movement force
    pub max_force: f32,
    /// Linear damping while standing still at low speed
    pub quick_stop_damping: f32,
    /// Linear damping while walking or sliding fast
    pub coast_damping: f32,
    /// Squared speed below which an idle biped stops quickly
    pub quick_stop_speed_squared: f32,
}

impl Default for BipedTuning {
    fn default() -> Self {
        Self {
            radius: 0.25,
            density: 2.0,
            max_force: 400.0,
            quick_stop_damping: 3.0,
            coast_damping: 0.7,
            quick_stop_speed_squared: 40.0,
        }
    }
}

impl BipedTuning {
    pub fn mass(&self) -> f32 {
        PI * self.radius * self.radius * self.density
    }
}

/// Circle that walks under a clamped force and never rotates
#[derive(Debug, Clone)]
pub struct Biped {
    body: BodyHandle,
    force: Vec2,
    tuning: BipedTuning,
}

impl Biped {
    pub fn new(world: &mut PhysicsWorld, position: Vec2, tuning: BipedTuning) -> Result<Self> {
        let desc = BodyDesc::dynamic(Shape::ball(tuning.radius), tuning.mass())
            .with_position(position)
            .with_lock_rotation(true)
            .with_damping(tuning.quick_stop_damping, 0.0)
            .with_limits(tuning.max_force, 0.0);
        let body = world.insert_body(desc)?;
        Ok(Self {
            body,
            force: Vec2::zeros(),
            tuning,
        })
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn tuning(&self) -> &BipedTuning {
        &self.tuning
    }

    pub fn force(&self) -> Vec2 {
        self.force
    }

    /// Set the walking force, scaled down to `max_force`
    pub fn set_force(&mut self, force: Vec2) {
        self.force = clamp_magnitude(force, self.tuning.max_force);
    }

    /// Push and pick the damping for this substep
    pub(crate) fn drive(&mut self, world: &mut PhysicsWorld) -> volley_physics::Result<()> {
        let damping = if self.force != Vec2::zeros() {
            world.wake(self.body)?;
            world.apply_force(self.body, self.force)?;
            self.tuning.coast_damping
        } else if world.linear_velocity(self.body)?.norm_squared()
            < self.tuning.quick_stop_speed_squared
        {
            self.tuning.quick_stop_damping
        } else {
            self.tuning.coast_damping
        };
        world.set_damping(self.body, damping, 0.0)
    }

    /// Take the projectile's momentum as an impulse where it struck
    pub(crate) fn absorb(
        &mut self,
        world: &mut PhysicsWorld,
        hit: &HitInfo,
    ) -> volley_physics::Result<()> {
        world.wake(self.body)?;
        world.apply_impulse_at(self.body, hit.momentum(), hit.world_point)
    }
}

impl Entity for Biped {
    fn body(&self) -> Option<BodyHandle> {
        Some(self.body)
    }

    fn as_presubstep(&mut self) -> Option<&mut dyn OnPresubstep> {
        Some(self)
    }

    fn as_hit(&mut self) -> Option<&mut dyn OnHit> {
        Some(self)
    }
}

impl OnPresubstep for Biped {
    fn on_presubstep(&mut self, world: &mut PhysicsWorld, _dt: f32) {
        if let Err(e) = self.drive(world) {
            warn!("Biped on {:?} not driven: {}", self.body, e);
        }
    }
}

impl OnHit for Biped {
    fn on_hit(&mut self, world: &mut PhysicsWorld, hit: &HitInfo) {
        if let Err(e) = self.absorb(world, hit) {
            warn!("Biped on {:?} lost a hit: {}", self.body, e);
        }
    }
}
