//! Physics configuration

use crate::error::{PhysicsError, Result};
use serde::{Deserialize, Serialize};

/// Physics world configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity vector (default: none, the simulation plane is top-down)
    pub gravity: [f32; 2],

    /// Fixed substep duration in seconds
    pub substep: f32,

    /// Maximum number of substeps per frame; time beyond the cap is dropped
    pub max_substeps: u32,

    /// Keep the sub-substep fraction of a frame for the next frame
    pub carry_remainder: bool,

    /// Solver iterations per substep
    pub solver_iterations: usize,

    /// Enable sleeping for inactive bodies
    pub sleeping_enabled: bool,

    /// Record started/stopped contact events for the host
    pub collision_events: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0],
            substep: 1.0 / 60.0,
            max_substeps: 10,
            carry_remainder: false,
            solver_iterations: 4,
            sleeping_enabled: true,
            collision_events: true,
        }
    }
}

impl PhysicsConfig {
    /// Create a configuration for high-precision simulation
    pub fn high_precision() -> Self {
        Self {
            substep: 1.0 / 120.0,
            max_substeps: 20,
            solver_iterations: 8,
            ..Default::default()
        }
    }

    /// Create a configuration for fast simulation (lower quality)
    pub fn fast() -> Self {
        Self {
            substep: 1.0 / 30.0,
            max_substeps: 4,
            solver_iterations: 2,
            collision_events: false,
            ..Default::default()
        }
    }

    /// Set gravity
    pub fn with_gravity(mut self, x: f32, y: f32) -> Self {
        self.gravity = [x, y];
        self
    }

    /// Set substep duration
    pub fn with_substep(mut self, substep: f32) -> Self {
        self.substep = substep;
        self
    }

    /// Set the substep cap
    pub fn with_max_substeps(mut self, max_substeps: u32) -> Self {
        self.max_substeps = max_substeps;
        self
    }

    /// Carry the fractional remainder between frames
    pub fn with_carry_remainder(mut self, carry: bool) -> Self {
        self.carry_remainder = carry;
        self
    }

    /// Check the configuration before a world is built from it
    pub fn validate(&self) -> Result<()> {
        if !(self.substep.is_finite() && self.substep > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "substep must be positive, got {}",
                self.substep
            )));
        }
        if self.max_substeps == 0 {
            return Err(PhysicsError::InvalidConfig(
                "max_substeps must be at least 1".into(),
            ));
        }
        if self.solver_iterations == 0 {
            return Err(PhysicsError::InvalidConfig(
                "solver_iterations must be at least 1".into(),
            ));
        }
        if !self.gravity.iter().all(|g| g.is_finite()) {
            return Err(PhysicsError::InvalidConfig(format!(
                "gravity must be finite, got {:?}",
                self.gravity
            )));
        }
        Ok(())
    }
}
