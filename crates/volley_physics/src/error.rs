//! Error types for the physics system

use thiserror::Error;

/// Physics system errors
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Rigid body not found
    #[error("Rigid body not found: {0:?}")]
    BodyNotFound(crate::body::BodyHandle),

    /// Invalid configuration
    #[error("Invalid physics configuration: {0}")]
    InvalidConfig(String),

    /// Mass must be finite and non-negative
    #[error("Invalid body mass: {0}")]
    InvalidMass(f32),

    /// Shape creation failed
    #[error("Failed to create collision shape: {0}")]
    ShapeCreationFailed(String),
}

/// Result type for physics operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
