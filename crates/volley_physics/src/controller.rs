//! Minimum-time rotation controller
//!
//! Drives a body's orientation towards a target angle with bang-bang torque.
//! Each substep it predicts where the body would come to rest if it started
//! braking now at full torque, and commands whatever torque closes the gap
//! between that resting angle and the target, saturated at the limit.

use crate::body::BodyHandle;
use crate::error::Result;
use crate::math::{rad_diff, sign};
use crate::world::PhysicsWorld;

/// Torque that steers `angle` towards `target` (or halts the spin if `stop`).
///
/// `inv_inertia` is the body's inverse moment of inertia about the plane
/// normal. Returns 0 when the body cannot rotate, for a non-positive `dt`,
/// and for non-finite inputs.
pub fn rotation_torque(
    angle: f32,
    angvel: f32,
    inv_inertia: f32,
    max_torque: f32,
    target: f32,
    stop: bool,
    dt: f32,
) -> f32 {
    let finite = [angle, angvel, inv_inertia, max_torque, target, dt]
        .iter()
        .all(|x| x.is_finite());
    if !finite || inv_inertia <= 0.0 || dt <= 0.0 {
        return 0.0;
    }

    let brake = sign(-angvel) * max_torque;
    let decel = brake * inv_inertia;
    let t_stop = if angvel == 0.0 || decel == 0.0 {
        0.0
    } else {
        (angvel / decel).abs()
    };

    if stop {
        return if t_stop > dt {
            brake
        } else {
            // exact torque that zeroes angvel by the end of this substep
            (-angvel / (inv_inertia * dt)).clamp(-max_torque, max_torque)
        };
    }

    let rest_angle = angle + angvel * t_stop + 0.5 * decel * t_stop * t_stop;
    let delta = rad_diff(target, rest_angle);
    (brake + 2.0 * delta / (inv_inertia * dt * dt)).clamp(-max_torque, max_torque)
}

/// Rotation controller bound to one body
#[derive(Debug, Clone)]
pub struct RotationControl {
    body: BodyHandle,
    inv_inertia: f32,
    max_torque: f32,
    /// Angle to steer towards
    pub target: f32,
    /// Halt rotation instead of seeking `target`
    pub stop: bool,
}

impl RotationControl {
    /// Bind to `body`, caching its inverse inertia
    pub fn new(world: &PhysicsWorld, body: BodyHandle, max_torque: f32) -> Result<Self> {
        Ok(Self {
            body,
            inv_inertia: world.inv_inertia(body)?,
            max_torque,
            target: world.angle(body)?,
            stop: false,
        })
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn max_torque(&self) -> f32 {
        self.max_torque
    }

    /// Torque to command this substep
    pub fn torque(&self, world: &PhysicsWorld, dt: f32) -> Result<f32> {
        Ok(rotation_torque(
            world.angle(self.body)?,
            world.angular_velocity(self.body)?,
            self.inv_inertia,
            self.max_torque,
            self.target,
            self.stop,
            dt,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_at_rest_on_target() {
        assert_eq!(rotation_torque(0.7, 0.0, 2.0, 10.0, 0.7, false, DT), 0.0);
        assert_eq!(rotation_torque(0.7, 0.0, 2.0, 10.0, 0.0, true, DT), 0.0);
    }

    #[test]
    fn test_saturates_towards_far_target() {
        let t = rotation_torque(0.0, 0.0, 1.0, 10.0, 2.0, false, DT);
        assert_relative_eq!(t, 10.0);
        let t = rotation_torque(0.0, 0.0, 1.0, 10.0, -2.0, false, DT);
        assert_relative_eq!(t, -10.0);
    }

    #[test]
    fn test_takes_short_way_round() {
        // From just below PI to just above -PI is a small positive turn
        let t = rotation_torque(3.0, 0.0, 1.0, 10.0, -3.0, false, DT);
        assert!(t > 0.0);
    }

    #[test]
    fn test_brakes_when_overshooting() {
        // Spinning fast towards a close target: full reverse torque
        let t = rotation_torque(0.0, 5.0, 1.0, 10.0, 0.1, false, DT);
        assert_relative_eq!(t, -10.0);
    }

    #[test]
    fn test_stop_mode() {
        // Cannot stop within one substep
        let t = rotation_torque(0.0, 5.0, 1.0, 10.0, 0.0, true, DT);
        assert_relative_eq!(t, -10.0);

        // Slow enough to stop exactly this substep
        let v = 0.05;
        let t = rotation_torque(0.0, v, 1.0, 10.0, 0.0, true, DT);
        assert_relative_eq!(t, -v / DT, epsilon = 1e-4);
        assert_relative_eq!(v + t * DT, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(rotation_torque(0.0, 1.0, 0.0, 10.0, 1.0, false, DT), 0.0);
        assert_eq!(rotation_torque(0.0, 1.0, 1.0, 10.0, 1.0, false, 0.0), 0.0);
        assert_eq!(rotation_torque(f32::NAN, 1.0, 1.0, 10.0, 1.0, false, DT), 0.0);
    }
}
