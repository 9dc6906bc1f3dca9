//! Planar math helpers: transforms, angle arithmetic, wraparound

use rapier2d::na::{Isometry2, Matrix3, Point2, Translation2, UnitComplex, Vector2};
use std::f32::consts::{PI, TAU};

/// 2D vector in world units
pub type Vec2 = Vector2<f32>;

/// Proper planar rotation
pub type Rotation = UnitComplex<f32>;

/// Signed difference `a - b` reduced to `(-PI, PI]`
pub fn rad_diff(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(TAU);
    if d > PI {
        d - TAU
    } else {
        d
    }
}

/// Sign with `sign(0) == 0`
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Scale `v` down so its length does not exceed `max`. Never zeroes a non-zero vector.
pub fn clamp_magnitude(v: Vec2, max: f32) -> Vec2 {
    let len_sq = v.norm_squared();
    if len_sq > max * max && len_sq > 0.0 {
        v * (max / len_sq.sqrt())
    } else {
        v
    }
}

/// Wrap a position that has left the square `[-limit, limit]²` to the opposite edge.
///
/// Returns `None` while the position is inside the region.
pub fn wrap_position(p: Vec2, limit: f32) -> Option<Vec2> {
    let mut wrapped = p;
    let mut moved = false;
    for axis in 0..2 {
        if wrapped[axis] > limit {
            wrapped[axis] -= 2.0 * limit;
            moved = true;
        } else if wrapped[axis] < -limit {
            wrapped[axis] += 2.0 * limit;
            moved = true;
        }
    }
    moved.then_some(wrapped)
}

/// Rigid planar transform: position plus orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World position
    pub position: Vec2,
    /// World orientation
    pub orientation: Rotation,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Identity transform
    pub fn identity() -> Self {
        Self {
            position: Vec2::zeros(),
            orientation: Rotation::identity(),
        }
    }

    pub fn new(position: Vec2, angle: f32) -> Self {
        Self {
            position,
            orientation: Rotation::new(angle),
        }
    }

    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            orientation: Rotation::identity(),
        }
    }

    pub fn from_angle(angle: f32) -> Self {
        Self::new(Vec2::zeros(), angle)
    }

    /// Orientation angle in `(-PI, PI]`
    pub fn angle(&self) -> f32 {
        self.orientation.angle()
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.orientation = Rotation::new(angle);
        self
    }

    pub fn to_isometry(&self) -> Isometry2<f32> {
        Isometry2::from_parts(Translation2::from(self.position), self.orientation)
    }

    /// `self ∘ local`: place a child transform expressed in this frame
    pub fn compose(&self, local: &Transform) -> Transform {
        Transform {
            position: self.transform_point(local.position),
            orientation: self.orientation * local.orientation,
        }
    }

    /// Map a local point into world space
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        self.orientation * p + self.position
    }

    /// Rotate a local direction into world space
    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        self.orientation * v
    }

    /// Homogeneous model matrix for renderers
    pub fn model_matrix(&self) -> Matrix3<f32> {
        self.to_isometry().to_homogeneous()
    }
}

impl From<Isometry2<f32>> for Transform {
    fn from(iso: Isometry2<f32>) -> Self {
        Self {
            position: iso.translation.vector,
            orientation: iso.rotation,
        }
    }
}

impl From<Transform> for Isometry2<f32> {
    fn from(t: Transform) -> Self {
        t.to_isometry()
    }
}

pub(crate) fn to_point(v: Vec2) -> Point2<f32> {
    Point2::from(v)
}
