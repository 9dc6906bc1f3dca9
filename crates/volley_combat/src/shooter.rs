//! Periodic firing of projectiles from a single muzzle

use crate::error::Result;
use crate::periodic::PeriodicTrigger;
use crate::projectile::{validate_properties, Projectile, ProjectileList, WorldBoundary};
use std::sync::Arc;
use volley_physics::prelude::*;

/// Where a new round leaves the gun and how fast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Muzzle {
    pub position: Vec2,
    pub velocity: Vec2,
}

/// A trigger, the rounds it has fired, and the round type it fires
#[derive(Debug, Clone)]
pub struct Shooter {
    pub trigger: PeriodicTrigger,
    pub projectiles: ProjectileList,
    pub properties: Arc<ProjectileProperties>,
    /// Rounds leaving this region are discarded
    pub boundary: Option<WorldBoundary>,
}

impl Shooter {
    pub fn new(period: f32, substep: f32, properties: ProjectileProperties) -> Result<Self> {
        validate_properties(&properties)?;
        Ok(Self {
            trigger: PeriodicTrigger::new(period, substep)?,
            projectiles: ProjectileList::new(),
            properties: Arc::new(properties),
            boundary: None,
        })
    }

    pub fn with_boundary(mut self, boundary: WorldBoundary) -> Self {
        self.boundary = Some(boundary);
        self
    }

    pub fn enabled(&self) -> bool {
        self.trigger.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.trigger.enabled = enabled;
    }

    /// One substep: move rounds in flight, then fire whatever the trigger has due.
    ///
    /// `aim` supplies the muzzle for each new round; returning `None` skips
    /// that shot. New rounds are stepped by the time they were overdue so
    /// shots fired mid-substep start at the right distance. Returns the
    /// number of shots fired.
    pub fn step(
        &mut self,
        world: &mut PhysicsWorld,
        dt: f32,
        shooter: Option<BodyHandle>,
        mut aim: impl FnMut(&PhysicsWorld) -> Option<Muzzle>,
    ) -> u32 {
        self.projectiles.step_all(world, dt, self.boundary.as_ref());

        let projectiles = &mut self.projectiles;
        let properties = &self.properties;
        self.trigger.advance(dt, |overdue| {
            let Some(muzzle) = aim(world) else {
                return;
            };
            let mut round =
                Projectile::new(Arc::clone(properties), muzzle.position, muzzle.velocity);
            round.shooter = shooter;
            projectiles.launch(world, round, overdue);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CombatError;

    #[test]
    fn test_rejects_bad_properties() {
        let err = Shooter::new(0.1, 0.01, ProjectileProperties::new(0.01, -5.0));
        assert!(matches!(err, Err(CombatError::InvalidProjectile(_))));
        assert!(Shooter::new(0.0, 0.01, ProjectileProperties::default()).is_err());
    }

    #[test]
    fn test_skipped_shots() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default()).unwrap();
        let mut shooter = Shooter::new(0.1, 0.01, ProjectileProperties::default()).unwrap();
        shooter.set_enabled(true);
        assert_eq!(shooter.step(&mut world, 0.01, None, |_| None), 1);
        assert!(shooter.projectiles.is_empty());
    }

    #[test]
    fn test_fires_into_empty_world() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default().with_substep(0.01)).unwrap();
        let mut shooter = Shooter::new(0.043, 0.01, ProjectileProperties::default()).unwrap();
        shooter.set_enabled(true);

        let muzzle = Muzzle {
            position: Vec2::zeros(),
            velocity: Vec2::new(100.0, 0.0),
        };
        let mut fired = 0;
        for _ in 0..10 {
            fired += shooter.step(&mut world, 0.01, None, |_| Some(muzzle));
        }
        assert_eq!(fired, 3);
        assert_eq!(shooter.projectiles.len(), 3);

        // Rounds keep flying after the trigger is released
        shooter.set_enabled(false);
        for _ in 0..10 {
            assert_eq!(shooter.step(&mut world, 0.01, None, |_| Some(muzzle)), 0);
        }
        assert_eq!(shooter.projectiles.len(), 3);
        let lead = shooter.projectiles.iter().map(|p| p.position.x).fold(0.0, f32::max);
        assert!(lead > 15.0);
    }
}
