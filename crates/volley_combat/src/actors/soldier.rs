//! Bipeds carrying a turret-aimed gun

use super::biped::{Biped, BipedTuning};
use crate::error::Result;
use crate::shooter::{Muzzle, Shooter};
use crate::turret::Turret;
use crate::weapon::{gaussian, WeaponTuning};
use log::warn;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use volley_physics::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoldierTuning {
    pub biped: BipedTuning,
    pub weapon: WeaponTuning,
    /// Turret slew rate in radians per second
    pub aim_speed: f32,
}

impl Default for SoldierTuning {
    fn default() -> Self {
        Self {
            biped: BipedTuning::default(),
            weapon: WeaponTuning::default(),
            aim_speed: TAU,
        }
    }
}

/// A biped whose gun follows a slewing turret.
///
/// Rounds leave from the edge of the body circle along the turret angle and
/// inherit the soldier's velocity.
#[derive(Debug, Clone)]
pub struct Soldier {
    pub biped: Biped,
    pub shooter: Shooter,
    pub turret: Turret,
    muzzle_speed: f32,
    spread: f32,
    rng: StdRng,
}

impl Soldier {
    pub fn new(
        world: &mut PhysicsWorld,
        position: Vec2,
        properties: ProjectileProperties,
        tuning: SoldierTuning,
        rng: StdRng,
    ) -> Result<Self> {
        tuning.weapon.validate()?;
        let shooter = Shooter::new(tuning.weapon.period, world.substep(), properties)?;
        let biped = Biped::new(world, position, tuning.biped)?;
        Ok(Self {
            biped,
            shooter,
            turret: Turret::new(tuning.aim_speed),
            muzzle_speed: tuning.weapon.muzzle_speed,
            spread: tuning.weapon.spread,
            rng,
        })
    }

    pub fn body(&self) -> BodyHandle {
        self.biped.body()
    }

    pub fn set_force(&mut self, force: Vec2) {
        self.biped.set_force(force);
    }

    /// Turn the turret towards a world-space direction. A zero vector leaves the target alone.
    pub fn aim_at(&mut self, direction: Vec2) {
        if direction != Vec2::zeros() {
            self.turret.target = direction.y.atan2(direction.x);
        }
    }

    /// Hold or release the trigger
    pub fn set_firing(&mut self, fire: bool) {
        self.shooter.set_enabled(fire);
    }

    pub fn firing(&self) -> bool {
        self.shooter.enabled()
    }
}

impl Entity for Soldier {
    fn body(&self) -> Option<BodyHandle> {
        Some(self.biped.body())
    }

    fn as_presubstep(&mut self) -> Option<&mut dyn OnPresubstep> {
        Some(self)
    }

    fn as_hit(&mut self) -> Option<&mut dyn OnHit> {
        Some(self)
    }
}

impl OnPresubstep for Soldier {
    fn on_presubstep(&mut self, world: &mut PhysicsWorld, dt: f32) {
        if let Err(e) = self.biped.drive(world) {
            warn!("Soldier on {:?} not driven: {}", self.biped.body(), e);
        }
        self.turret.step(dt);

        let body = self.biped.body();
        let reach = self.biped.tuning().radius;
        let aim = self.turret.aim_angle;
        let (speed, spread) = (self.muzzle_speed, self.spread);
        let rng = &mut self.rng;
        self.shooter.step(world, dt, Some(body), |world| {
            let position = world.position(body).ok()?;
            let carrier = world.linear_velocity(body).ok()?;
            let angle = aim + gaussian(&mut *rng, spread);
            let direction = Rotation::new(angle) * Vec2::new(1.0, 0.0);
            Some(Muzzle {
                position: position + direction * reach,
                velocity: direction * speed + carrier,
            })
        });
    }
}

impl OnHit for Soldier {
    fn on_hit(&mut self, world: &mut PhysicsWorld, hit: &HitInfo) {
        if let Err(e) = self.biped.absorb(world, hit) {
            warn!("Soldier on {:?} lost a hit: {}", self.biped.body(), e);
        }
    }
}
