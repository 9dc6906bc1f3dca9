//! Volley Combat - triggers, projectiles and actors
//!
//! Gameplay built on the `volley_physics` substep loop.
//!
//! # Features
//!
//! - Periodic triggers that catch up on shots owed within a substep
//! - Ray-swept projectiles that hit only the first thing in their path
//! - Turrets that slew at a bounded rate
//! - Weapon trees with Gaussian spread
//! - Bipeds, soldiers, ships, warships and static obstacles
//!
//! # Example
//!
//! ```ignore
//! use rand::SeedableRng;
//! use volley_combat::prelude::*;
//! use volley_physics::prelude::*;
//!
//! let mut world = PhysicsWorld::new(PhysicsConfig::default())?;
//! obstacle_grid(&mut world, Vec2::new(-55.0, -55.0), 12, 12, 10.0)?;
//!
//! let player = Soldier::new(
//!     &mut world,
//!     Vec2::zeros(),
//!     ProjectileProperties::new(0.008, 1000.0),
//!     SoldierTuning::default(),
//!     rand::rngs::StdRng::from_entropy(),
//! )?;
//! let player = world.spawn(player);
//!
//! // Between frames, from input
//! if let Some(soldier) = world.entity_mut::<Soldier>(player) {
//!     soldier.set_force(Vec2::new(0.0, 200.0));
//!     soldier.aim_at(Vec2::new(1.0, 1.0));
//!     soldier.set_firing(true);
//! }
//! world.step(1.0 / 60.0);
//! ```

pub mod actors;
pub mod error;
pub mod periodic;
pub mod projectile;
pub mod shooter;
pub mod turret;
pub mod weapon;

pub mod prelude {
    pub use crate::actors::{
        obstacle_grid, twin_mount, Biped, BipedTuning, Obstacle, Ship, ShipTuning, Soldier,
        SoldierTuning, Warship,
    };
    pub use crate::error::{CombatError, Result};
    pub use crate::periodic::PeriodicTrigger;
    pub use crate::projectile::{Projectile, ProjectileList, WorldBoundary};
    pub use crate::shooter::{Muzzle, Shooter};
    pub use crate::turret::Turret;
    pub use crate::weapon::{Platform, Salvo, Weapon, WeaponTuning};
}

pub use prelude::*;
