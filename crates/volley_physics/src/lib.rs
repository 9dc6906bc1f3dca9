//! Volley Physics - fixed-substep 2D simulation over Rapier
//!
//! This crate owns the substep protocol that gameplay code runs inside. Rapier
//! does the rigid-body dynamics; this crate decides when it runs and what
//! happens around it.
//!
//! # Features
//!
//! - Bounded fixed-substep stepping (time past the cap is dropped)
//! - Contact notification from the previous solve, once per manifold
//! - Presubstep callbacks that may spawn and despawn freely
//! - Clamped force/torque application and warping
//! - Closest-hit ray sweeps for projectiles
//! - Minimum-time rotation controller
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  PhysicsWorld                     │
//! │  ┌─────────────┐  ┌──────────────┐  ┌──────────┐ │
//! │  │ BodyRecords │  │EntityRegistry│  │  Query   │ │
//! │  └─────────────┘  └──────────────┘  └──────────┘ │
//! │  ┌──────────────────────────────────────────────┐│
//! │  │ per substep: contacts → presubstep → solver  ││
//! │  └──────────────────────────────────────────────┘│
//! └──────────────────────────────────────────────────┘
//!                        │
//!         ┌──────────────┼──────────────┐
//!         ▼              ▼              ▼
//!   ┌───────────┐ ┌────────────┐ ┌─────────┐
//!   │OnCollision│ │OnPresubstep│ │  OnHit  │
//!   └───────────┘ └────────────┘ └─────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use volley_physics::prelude::*;
//!
//! let mut world = PhysicsWorld::new(PhysicsConfig::default())?;
//!
//! let crate_body = world.insert_body(
//!     BodyDesc::dynamic(Shape::cuboid(0.5, 0.5), 4.0).with_position(Vec2::new(0.0, 2.0)),
//! )?;
//!
//! world.add_presubstep(move |world, _dt| {
//!     let _ = world.apply_force(crate_body, Vec2::new(10.0, 0.0));
//! });
//!
//! // Called once per rendered frame with the measured frame time
//! world.step(1.0 / 60.0);
//! ```

pub mod body;
pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod events;
pub mod math;
pub mod query;
pub mod shape;
pub mod world;

pub mod prelude {
    //! Common imports for physics functionality
    pub use crate::body::{BodyDesc, BodyHandle};
    pub use crate::config::PhysicsConfig;
    pub use crate::controller::{rotation_torque, RotationControl};
    pub use crate::entity::{Entity, EntityId, OnCollision, OnHit, OnPresubstep};
    pub use crate::error::{PhysicsError, Result};
    pub use crate::events::{CollisionEvent, CollisionEventType, HitInfo, ProjectileProperties};
    pub use crate::math::{rad_diff, Rotation, Transform, Vec2};
    pub use crate::query::RayHit;
    pub use crate::shape::{Shape, ShapeDesc};
    pub use crate::world::PhysicsWorld;
}

pub use prelude::*;
