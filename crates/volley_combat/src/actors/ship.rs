//! Spacecraft hulls

use crate::error::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use volley_physics::math::{clamp_magnitude, wrap_position};
use volley_physics::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipTuning {
    pub mass: f32,
    /// Upper bound on the thrust magnitude
    pub max_force: f32,
    /// Upper bound on the turning torque
    pub max_torque: f32,
}

impl Default for ShipTuning {
    fn default() -> Self {
        Self {
            mass: 64.0,
            max_force: 512.0,
            max_torque: 64.0,
        }
    }
}

/// Triangular hull pointing along +x, shared by every ship
pub fn hull() -> Shape {
    static HULL: OnceLock<Shape> = OnceLock::new();
    HULL.get_or_init(|| {
        Shape::triangle(
            Vec2::new(0.75, 0.0),
            Vec2::new(-0.5, 0.5),
            Vec2::new(-0.5, -0.5),
        )
    })
    .clone()
}

/// Thrust in the body frame plus either a raw torque or the rotation controller.
///
/// Ships never fall asleep, so input always takes effect.
#[derive(Debug, Clone)]
pub struct Ship {
    body: BodyHandle,
    force: Vec2,
    torque: f32,
    tuning: ShipTuning,
    pub rctrl: RotationControl,
    /// Steer with `rctrl` instead of the raw torque
    pub rctrl_active: bool,
    /// Half-size of the square the ship wraps around in, if any
    pub wrap_limit: Option<f32>,
}

impl Ship {
    pub fn new(world: &mut PhysicsWorld, transform: Transform, tuning: ShipTuning) -> Result<Self> {
        let desc = BodyDesc::dynamic(hull(), tuning.mass)
            .with_transform(transform)
            .with_can_sleep(false)
            .with_limits(tuning.max_force, tuning.max_torque);
        let body = world.insert_body(desc)?;
        let rctrl = RotationControl::new(world, body, tuning.max_torque)?;
        Ok(Self {
            body,
            force: Vec2::zeros(),
            torque: 0.0,
            tuning,
            rctrl,
            rctrl_active: false,
            wrap_limit: None,
        })
    }

    pub fn with_wrap_limit(mut self, limit: f32) -> Self {
        self.wrap_limit = Some(limit);
        self
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn tuning(&self) -> &ShipTuning {
        &self.tuning
    }

    /// Thrust in the ship's own frame
    pub fn force(&self) -> Vec2 {
        self.force
    }

    pub fn set_force(&mut self, force: Vec2) {
        self.force = clamp_magnitude(force, self.tuning.max_force);
    }

    pub fn torque(&self) -> f32 {
        self.torque
    }

    pub fn set_torque(&mut self, torque: f32) {
        let max = self.tuning.max_torque;
        self.torque = torque.clamp(-max, max);
    }

    /// Apply this substep's thrust and torque, then wrap at the edge
    pub(crate) fn drive(
        &mut self,
        world: &mut PhysicsWorld,
        dt: f32,
    ) -> volley_physics::Result<()> {
        let transform = world.transform(self.body)?;
        if self.force != Vec2::zeros() {
            world.apply_force(self.body, transform.transform_vector(self.force))?;
        }

        let torque = if self.rctrl_active {
            self.rctrl.torque(world, dt)?
        } else {
            self.torque
        };
        world.apply_torque(self.body, torque)?;

        let wrapped = self
            .wrap_limit
            .and_then(|limit| wrap_position(transform.position, limit));
        if let Some(position) = wrapped {
            world.warp(self.body, transform.with_position(position))?;
        }
        Ok(())
    }
}

impl Entity for Ship {
    fn body(&self) -> Option<BodyHandle> {
        Some(self.body)
    }

    fn as_presubstep(&mut self) -> Option<&mut dyn OnPresubstep> {
        Some(self)
    }
}

impl OnPresubstep for Ship {
    fn on_presubstep(&mut self, world: &mut PhysicsWorld, dt: f32) {
        if let Err(e) = self.drive(world, dt) {
            warn!("Ship on {:?} not driven: {}", self.body, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    const DT: f32 = 1.0 / 60.0;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(PhysicsConfig::default()).unwrap()
    }

    #[test]
    fn test_hull_is_shared() {
        assert!(hull().ptr_eq(&hull()));
    }

    #[test]
    fn test_inputs_are_clamped() {
        let mut w = world();
        let mut ship = Ship::new(&mut w, Transform::identity(), ShipTuning::default()).unwrap();
        ship.set_force(Vec2::new(0.0, -1024.0));
        assert_relative_eq!(ship.force(), Vec2::new(0.0, -512.0), epsilon = 1e-3);
        ship.set_torque(-100.0);
        assert_eq!(ship.torque(), -64.0);
        ship.set_torque(10.0);
        assert_eq!(ship.torque(), 10.0);
    }

    #[test]
    fn test_thrust_follows_heading() {
        let mut w = world();
        let ship = Ship::new(
            &mut w,
            Transform::new(Vec2::zeros(), FRAC_PI_2),
            ShipTuning::default(),
        )
        .unwrap();
        let body = ship.body();
        let id = w.spawn(ship);
        w.entity_mut::<Ship>(id).unwrap().set_force(Vec2::new(256.0, 0.0));

        for _ in 0..30 {
            w.step(DT);
        }
        let v = w.linear_velocity(body).unwrap();
        assert!(v.y > 1.0, "moved {v:?}");
        assert!(v.x.abs() < 1e-3);
    }

    #[test]
    fn test_controller_turns_to_target() {
        let mut w = world();
        let mut ship = Ship::new(&mut w, Transform::identity(), ShipTuning::default()).unwrap();
        ship.rctrl.target = 1.0;
        ship.rctrl_active = true;
        let body = ship.body();
        w.spawn(ship);

        for _ in 0..600 {
            w.step(DT);
        }
        assert_relative_eq!(w.angle(body).unwrap(), 1.0, epsilon = 0.05);
        // Settles into a chatter of one substep of full torque
        assert!(w.angular_velocity(body).unwrap().abs() < 0.3);
    }

    #[test]
    fn test_wraps_at_edge() {
        let mut w = world();
        let ship = Ship::new(
            &mut w,
            Transform::from_position(Vec2::new(9.9, 0.0)),
            ShipTuning::default(),
        )
        .unwrap()
        .with_wrap_limit(10.0);
        let body = ship.body();
        w.spawn(ship);
        w.set_linear_velocity(body, Vec2::new(30.0, 0.0)).unwrap();

        for _ in 0..3 {
            w.step(DT);
        }
        let p = w.position(body).unwrap();
        assert!(p.x < 0.0, "wrapped to {p:?}");
        assert_relative_eq!(w.linear_velocity(body).unwrap().x, 30.0, epsilon = 1e-3);
    }
}
