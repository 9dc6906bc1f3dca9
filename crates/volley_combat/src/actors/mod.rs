//! Ready-made entities
//!
//! Each actor owns one body and plugs into the substep loop through the
//! capability traits. Spawn them with [`PhysicsWorld::spawn`] and drive them
//! between frames through [`PhysicsWorld::entity_mut`].
//!
//! [`PhysicsWorld::spawn`]: volley_physics::PhysicsWorld::spawn
//! [`PhysicsWorld::entity_mut`]: volley_physics::PhysicsWorld::entity_mut

pub mod biped;
pub mod obstacle;
pub mod ship;
pub mod soldier;
pub mod warship;

pub use biped::{Biped, BipedTuning};
pub use obstacle::{obstacle_grid, Obstacle, OBSTACLE_HALF_EXTENT};
pub use ship::{hull, Ship, ShipTuning};
pub use soldier::{Soldier, SoldierTuning};
pub use warship::{twin_mount, Warship};
