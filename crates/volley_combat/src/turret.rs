//! Aim slewing at a bounded angular speed

use serde::{Deserialize, Serialize};
use volley_physics::math::rad_diff;

/// Aim direction that turns towards `target` at no more than `aim_speed` rad/s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turret {
    /// Radians per second
    pub aim_speed: f32,
    pub target: f32,
    pub aim_angle: f32,
}

impl Turret {
    pub fn new(aim_speed: f32) -> Self {
        Self {
            aim_speed,
            target: 0.0,
            aim_angle: 0.0,
        }
    }

    /// Slew towards the target. Returns true once aimed.
    pub fn step(&mut self, dt: f32) -> bool {
        let max_change = dt * self.aim_speed;
        let gap = rad_diff(self.target, self.aim_angle);
        if gap.abs() > max_change {
            self.aim_angle = rad_diff(self.aim_angle + max_change.copysign(gap), 0.0);
            false
        } else {
            self.aim_angle = self.target;
            true
        }
    }

    /// Whether the aim is already on target
    pub fn aimed(&self) -> bool {
        rad_diff(self.target, self.aim_angle) == 0.0
    }
}
