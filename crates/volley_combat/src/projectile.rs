//! Ray-swept projectiles
//!
//! Projectiles are not bodies. Each substep a projectile sweeps a ray from
//! where it is to where it will be, so fast rounds cannot tunnel through thin
//! geometry. The first thing the ray touches is hit; nothing behind it is.

use crate::error::{CombatError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use volley_physics::prelude::*;

/// Check projectile parameters before sharing them between rounds
pub fn validate_properties(properties: &ProjectileProperties) -> Result<()> {
    if !properties.mass.is_finite() || properties.mass < 0.0 {
        return Err(CombatError::InvalidProjectile(format!(
            "mass must be finite and non-negative, got {}",
            properties.mass
        )));
    }
    if properties.range.is_nan() || properties.range <= 0.0 {
        return Err(CombatError::InvalidProjectile(format!(
            "range must be positive, got {}",
            properties.range
        )));
    }
    Ok(())
}

/// A single round in flight
#[derive(Debug, Clone)]
pub struct Projectile {
    pub properties: Arc<ProjectileProperties>,
    pub position: Vec2,
    pub velocity: Vec2,
    origin: Vec2,
    /// Body that fired this round; excluded from its sweeps
    pub shooter: Option<BodyHandle>,
}

impl Projectile {
    pub fn new(properties: Arc<ProjectileProperties>, position: Vec2, velocity: Vec2) -> Self {
        Self {
            properties,
            position,
            velocity,
            origin: position,
            shooter: None,
        }
    }

    pub fn with_shooter(mut self, shooter: BodyHandle) -> Self {
        self.shooter = Some(shooter);
        self
    }

    /// Where the round was fired from
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Whether the round has reached its maximum range
    pub fn expended(&self) -> bool {
        let range = self.properties.range;
        (self.position - self.origin).norm_squared() >= range * range
    }

    /// Advance by `dt`. Returns true once the round is finished (out of range or hit something).
    pub fn step(&mut self, world: &mut PhysicsWorld, dt: f32) -> bool {
        if self.expended() {
            return true;
        }

        let target = self.position + self.velocity * dt;
        match world.ray_sweep(self.position, target, self.shooter) {
            Some(hit) => {
                if let Some(body) = hit.body {
                    let info = HitInfo {
                        properties: Arc::clone(&self.properties),
                        velocity: self.velocity,
                        world_point: hit.point,
                        world_normal: hit.normal,
                        shooter: self.shooter,
                    };
                    world.deliver_hit(body, &info);
                }
                self.position = hit.point;
                true
            }
            None => {
                self.position = target;
                false
            }
        }
    }
}

/// Axis-aligned region outside of which projectiles are discarded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBoundary {
    pub half_extents: [f32; 2],
}

impl WorldBoundary {
    pub fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            half_extents: [half_width, half_height],
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x.abs() < self.half_extents[0] && p.y.abs() < self.half_extents[1]
    }
}

/// Rounds owned by one firing entity. Order is not preserved.
#[derive(Debug, Clone, Default)]
pub struct ProjectileList {
    projectiles: Vec<Projectile>,
}

impl ProjectileList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter()
    }

    pub fn push(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }

    pub fn clear(&mut self) {
        self.projectiles.clear();
    }

    /// Step a freshly fired round by the time it was overdue, keeping it if it survives
    pub fn launch(&mut self, world: &mut PhysicsWorld, mut projectile: Projectile, overdue: f32) -> bool {
        if projectile.step(world, overdue) {
            return false;
        }
        self.projectiles.push(projectile);
        true
    }

    /// Step every round, dropping those outside `boundary` or finished. Returns how many were dropped.
    pub fn step_all(
        &mut self,
        world: &mut PhysicsWorld,
        dt: f32,
        boundary: Option<&WorldBoundary>,
    ) -> usize {
        let before = self.projectiles.len();
        let mut i = 0;
        while i < self.projectiles.len() {
            let outside = boundary.is_some_and(|b| !b.contains(self.projectiles[i].position));
            if outside || self.projectiles[i].step(world, dt) {
                self.projectiles.swap_remove(i);
            } else {
                i += 1;
            }
        }
        before - self.projectiles.len()
    }
}
