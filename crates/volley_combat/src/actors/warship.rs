//! Ships carrying a weapon tree

use super::ship::{Ship, ShipTuning};
use crate::error::Result;
use crate::projectile::{ProjectileList, WorldBoundary};
use crate::weapon::{Platform, Salvo, Weapon, WeaponTuning};
use log::warn;
use rand::rngs::StdRng;
use std::sync::Arc;
use volley_physics::prelude::*;

/// Root platform with one gun either side of the bow
pub fn twin_mount(
    properties: Arc<ProjectileProperties>,
    tuning: &WeaponTuning,
    substep: f32,
) -> Result<Platform> {
    let mut platform = Platform::new(Vec2::zeros(), 0.0);
    for side in [0.25, -0.25] {
        platform.weapons.push(Weapon::new(
            Vec2::new(0.0, side),
            Arc::clone(&properties),
            tuning,
            substep,
        )?);
    }
    Ok(platform)
}

/// A ship whose weapon tree hangs from the hull frame
#[derive(Debug, Clone)]
pub struct Warship {
    pub ship: Ship,
    pub weapon_tree: Platform,
    pub projectiles: ProjectileList,
    pub boundary: Option<WorldBoundary>,
    rng: StdRng,
}

impl Warship {
    /// Unarmed warship; add weapons through `weapon_tree`
    pub fn new(
        world: &mut PhysicsWorld,
        transform: Transform,
        tuning: ShipTuning,
        rng: StdRng,
    ) -> Result<Self> {
        Ok(Self {
            ship: Ship::new(world, transform, tuning)?,
            weapon_tree: Platform::default(),
            projectiles: ProjectileList::new(),
            boundary: None,
            rng,
        })
    }

    pub fn with_weapon_tree(mut self, tree: Platform) -> Self {
        self.weapon_tree = tree;
        self
    }

    pub fn body(&self) -> BodyHandle {
        self.ship.body()
    }

    /// Pull or release every trigger in the tree
    pub fn fire(&mut self, enable: bool) {
        self.weapon_tree.fire(enable);
    }

    fn arm(&mut self, world: &mut PhysicsWorld, dt: f32) -> volley_physics::Result<u32> {
        self.projectiles.step_all(world, dt, self.boundary.as_ref());

        let body = self.ship.body();
        let frame = world.transform(body)?;
        let mut salvo = Salvo {
            carrier_velocity: world.linear_velocity(body)?,
            world,
            rng: &mut self.rng,
            projectiles: &mut self.projectiles,
            shooter: Some(body),
        };
        Ok(self.weapon_tree.step(&frame, dt, &mut salvo))
    }
}

impl Entity for Warship {
    fn body(&self) -> Option<BodyHandle> {
        Some(self.ship.body())
    }

    fn as_presubstep(&mut self) -> Option<&mut dyn OnPresubstep> {
        Some(self)
    }
}

impl OnPresubstep for Warship {
    fn on_presubstep(&mut self, world: &mut PhysicsWorld, dt: f32) {
        if let Err(e) = self.ship.drive(world, dt) {
            warn!("Warship on {:?} not driven: {}", self.ship.body(), e);
        }
        if let Err(e) = self.arm(world, dt) {
            warn!("Warship on {:?} held fire: {}", self.ship.body(), e);
        }
    }
}
