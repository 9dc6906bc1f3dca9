//! Error types for the combat crate

use thiserror::Error;
use volley_physics::PhysicsError;

/// Combat system errors
#[derive(Debug, Error)]
pub enum CombatError {
    /// Trigger periods must be positive and finite
    #[error("Invalid trigger period: {0}")]
    InvalidPeriod(f32),

    /// Projectile parameters out of range
    #[error("Invalid projectile: {0}")]
    InvalidProjectile(String),

    /// Underlying physics failure
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

/// Result type for combat operations
pub type Result<T> = std::result::Result<T, CombatError>;
