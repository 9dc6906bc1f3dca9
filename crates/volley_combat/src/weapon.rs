//! Weapon trees for vehicles
//!
//! A [`Platform`] is a frame attached to its parent (the carrier for the
//! root) by an offset and an angle. It carries weapons and further platforms,
//! so a turret on a gun deck on a hull is three nested platforms.

use crate::error::{CombatError, Result};
use crate::periodic::PeriodicTrigger;
use crate::projectile::{validate_properties, Projectile, ProjectileList};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::sync::Arc;
use volley_physics::prelude::*;

/// Firing characteristics shared by a class of weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    /// Seconds between shots
    pub period: f32,
    /// Launch speed relative to the carrier
    pub muzzle_speed: f32,
    /// Standard deviation of the launch angle, in radians
    pub spread: f32,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            period: 0.12,
            muzzle_speed: 400.0,
            spread: 0.02,
        }
    }
}

impl WeaponTuning {
    pub fn validate(&self) -> Result<()> {
        if !self.muzzle_speed.is_finite() {
            return Err(CombatError::InvalidProjectile(format!(
                "muzzle speed must be finite, got {}",
                self.muzzle_speed
            )));
        }
        if !self.spread.is_finite() || self.spread < 0.0 {
            return Err(CombatError::InvalidProjectile(format!(
                "spread must be finite and non-negative, got {}",
                self.spread
            )));
        }
        Ok(())
    }
}

/// Normally distributed sample with mean zero (Box-Muller)
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R, sigma: f32) -> f32 {
    if sigma <= 0.0 {
        return 0.0;
    }
    // gen::<f32>() is in [0, 1); flip it so ln never sees zero
    let u1 = 1.0 - rng.gen::<f32>();
    let u2 = rng.gen::<f32>();
    sigma * (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Everything a weapon tree writes to while firing
pub struct Salvo<'a, R: Rng + ?Sized> {
    pub world: &'a mut PhysicsWorld,
    pub rng: &'a mut R,
    pub projectiles: &'a mut ProjectileList,
    /// Added to every launch velocity
    pub carrier_velocity: Vec2,
    /// Excluded from the rounds' sweeps
    pub shooter: Option<BodyHandle>,
}

/// A single gun mounted on a platform
#[derive(Debug, Clone)]
pub struct Weapon {
    pub trigger: PeriodicTrigger,
    /// Muzzle position in the platform frame
    pub mount_point: Vec2,
    pub properties: Arc<ProjectileProperties>,
    pub muzzle_speed: f32,
    pub spread: f32,
}

impl Weapon {
    pub fn new(
        mount_point: Vec2,
        properties: Arc<ProjectileProperties>,
        tuning: &WeaponTuning,
        substep: f32,
    ) -> Result<Self> {
        validate_properties(&properties)?;
        tuning.validate()?;
        Ok(Self {
            trigger: PeriodicTrigger::new(tuning.period, substep)?,
            mount_point,
            properties,
            muzzle_speed: tuning.muzzle_speed,
            spread: tuning.spread,
        })
    }

    /// Swap the round type for subsequent shots
    pub fn set_properties(&mut self, properties: Arc<ProjectileProperties>) -> Result<()> {
        validate_properties(&properties)?;
        self.properties = properties;
        Ok(())
    }

    /// Fire whatever is due this substep from `frame`. Returns the number of shots.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        frame: &Transform,
        dt: f32,
        salvo: &mut Salvo<'_, R>,
    ) -> u32 {
        let origin = frame.transform_point(self.mount_point);
        let properties = &self.properties;
        let (muzzle_speed, spread) = (self.muzzle_speed, self.spread);
        self.trigger.advance(dt, |overdue| {
            let angle = frame.angle() + gaussian(&mut *salvo.rng, spread);
            let velocity =
                Rotation::new(angle) * Vec2::new(muzzle_speed, 0.0) + salvo.carrier_velocity;
            let mut round = Projectile::new(Arc::clone(properties), origin, velocity);
            round.shooter = salvo.shooter;
            salvo.projectiles.launch(salvo.world, round, overdue);
        })
    }
}

/// A frame holding weapons and nested platforms
#[derive(Debug, Clone, Default)]
pub struct Platform {
    /// Position in the parent frame
    pub offset: Vec2,
    /// Rotation relative to the parent frame
    pub offset_angle: f32,
    pub weapons: Vec<Weapon>,
    pub subplatforms: Vec<Platform>,
}

impl Platform {
    pub fn new(offset: Vec2, offset_angle: f32) -> Self {
        Self {
            offset,
            offset_angle,
            weapons: Vec::new(),
            subplatforms: Vec::new(),
        }
    }

    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapons.push(weapon);
        self
    }

    pub fn with_subplatform(mut self, platform: Platform) -> Self {
        self.subplatforms.push(platform);
        self
    }

    /// Pull or release every trigger on this platform and those below it
    pub fn fire(&mut self, enable: bool) {
        for weapon in &mut self.weapons {
            weapon.trigger.enabled = enable;
        }
        for platform in &mut self.subplatforms {
            platform.fire(enable);
        }
    }

    /// Total number of weapons in the tree
    pub fn weapon_count(&self) -> usize {
        self.weapons.len()
            + self
                .subplatforms
                .iter()
                .map(Platform::weapon_count)
                .sum::<usize>()
    }

    /// World frame of this platform given its parent's
    pub fn frame(&self, parent: &Transform) -> Transform {
        parent.compose(&Transform::new(self.offset, self.offset_angle))
    }

    /// Step every weapon in the tree. `parent` is the world frame this platform hangs from.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        parent: &Transform,
        dt: f32,
        salvo: &mut Salvo<'_, R>,
    ) -> u32 {
        let frame = self.frame(parent);
        let mut fired = 0;
        for weapon in &mut self.weapons {
            fired += weapon.step(&frame, dt, salvo);
        }
        for platform in &mut self.subplatforms {
            fired += platform.step(&frame, dt, salvo);
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f32::consts::FRAC_PI_2;

    const S: f32 = 0.01;

    fn weapon(mount_point: Vec2, spread: f32) -> Weapon {
        let tuning = WeaponTuning {
            spread,
            ..Default::default()
        };
        Weapon::new(mount_point, Arc::new(ProjectileProperties::default()), &tuning, S).unwrap()
    }

    #[test]
    fn test_gaussian_statistics() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(gaussian(&mut rng, 0.0), 0.0);

        let n = 20_000;
        let samples: Vec<f32> = (0..n).map(|_| gaussian(&mut rng, 0.5)).collect();
        let mean = samples.iter().sum::<f32>() / n as f32;
        let var = samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f32>() / n as f32;
        assert!(mean.abs() < 0.02, "mean {mean}");
        assert!((var.sqrt() - 0.5).abs() < 0.02, "sigma {}", var.sqrt());
    }

    #[test]
    fn test_tuning_defaults_and_validation() {
        let tuning: WeaponTuning = serde_json::from_str(r#"{ "spread": 0.1 }"#).unwrap();
        assert_eq!(tuning.period, 0.12);
        assert_eq!(tuning.muzzle_speed, 400.0);
        assert_eq!(tuning.spread, 0.1);

        let bad = WeaponTuning {
            spread: -1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_fire_reaches_whole_tree() {
        let mut tree = Platform::new(Vec2::zeros(), 0.0)
            .with_weapon(weapon(Vec2::new(0.0, 0.25), 0.0))
            .with_subplatform(
                Platform::new(Vec2::new(1.0, 0.0), 0.5)
                    .with_weapon(weapon(Vec2::zeros(), 0.0))
                    .with_subplatform(Platform::default().with_weapon(weapon(Vec2::zeros(), 0.0))),
            );
        assert_eq!(tree.weapon_count(), 3);

        tree.fire(true);
        assert!(tree.weapons[0].trigger.enabled);
        assert!(tree.subplatforms[0].subplatforms[0].weapons[0].trigger.enabled);

        tree.fire(false);
        assert!(!tree.subplatforms[0].weapons[0].trigger.enabled);
    }

    #[test]
    fn test_rounds_leave_rotated_mount() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default().with_substep(S)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut projectiles = ProjectileList::new();

        let mut tree = Platform::new(Vec2::new(1.0, 0.0), 0.0)
            .with_weapon(weapon(Vec2::new(0.0, 0.25), 0.0));
        tree.fire(true);

        let carrier = Transform::new(Vec2::new(10.0, 0.0), FRAC_PI_2);
        let mut salvo = Salvo {
            world: &mut world,
            rng: &mut rng,
            projectiles: &mut projectiles,
            carrier_velocity: Vec2::new(2.0, 0.0),
            shooter: None,
        };
        assert_eq!(tree.step(&carrier, S, &mut salvo), 1);

        // Mount at (9.75, 1), then stepped by the overdue substep
        let round = projectiles.iter().next().unwrap();
        assert_relative_eq!(round.origin(), Vec2::new(9.75, 1.0), epsilon = 1e-4);
        assert_relative_eq!(round.velocity, Vec2::new(2.0, 400.0), epsilon = 1e-2);
        assert_relative_eq!(round.position, Vec2::new(9.77, 5.0), epsilon = 1e-3);
    }

    #[test]
    fn test_released_trigger_stays_ready() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default().with_substep(S)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut projectiles = ProjectileList::new();
        let mut gun = weapon(Vec2::zeros(), 0.02);

        let mut salvo = Salvo {
            world: &mut world,
            rng: &mut rng,
            projectiles: &mut projectiles,
            carrier_velocity: Vec2::zeros(),
            shooter: None,
        };
        for _ in 0..20 {
            assert_eq!(gun.step(&Transform::identity(), S, &mut salvo), 0);
        }
        assert_eq!(gun.trigger.cooldown, 0.0);

        gun.trigger.enabled = true;
        assert_eq!(gun.step(&Transform::identity(), S, &mut salvo), 1);
        assert_eq!(projectiles.len(), 1);
    }

    #[test]
    fn test_fires_on_its_trigger_schedule() {
        let mut world = PhysicsWorld::new(PhysicsConfig::default().with_substep(S)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut projectiles = ProjectileList::new();
        let mut gun = weapon(Vec2::zeros(), 0.0);
        gun.trigger.set_period(0.03, S).unwrap();
        gun.trigger.enabled = true;
        let mut reference = gun.trigger.clone();

        let mut salvo = Salvo {
            world: &mut world,
            rng: &mut rng,
            projectiles: &mut projectiles,
            carrier_velocity: Vec2::zeros(),
            shooter: None,
        };
        for dt in [0.1, 0.01, 0.02, 0.07, f32::NAN] {
            let want = reference.advance(dt, |_| {});
            assert_eq!(gun.step(&Transform::identity(), dt, &mut salvo), want);
            assert_eq!(gun.trigger, reference);
        }
        assert_eq!(projectiles.len(), 7);
    }
}
