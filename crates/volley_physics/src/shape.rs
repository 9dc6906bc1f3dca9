//! Shared collision geometry

use crate::error::{PhysicsError, Result};
use crate::math::{to_point, Vec2};
use rapier2d::prelude as rapier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Immutable collision shape shared between bodies.
///
/// Cloning is a reference-count bump; the geometry itself is never copied.
#[derive(Clone)]
pub struct Shape(pub(crate) rapier::SharedShape);

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shape")
            .field(&self.0.shape_type())
            .finish()
    }
}

impl Shape {
    /// Circle with radius
    pub fn ball(radius: f32) -> Self {
        Self(rapier::SharedShape::ball(radius))
    }

    /// Box with half-extents
    pub fn cuboid(hx: f32, hy: f32) -> Self {
        Self(rapier::SharedShape::cuboid(hx, hy))
    }

    /// Triangle from three counter-clockwise points
    pub fn triangle(a: Vec2, b: Vec2, c: Vec2) -> Self {
        Self(rapier::SharedShape::triangle(
            to_point(a),
            to_point(b),
            to_point(c),
        ))
    }

    /// Convex hull of a point cloud
    pub fn convex_polygon(points: &[Vec2]) -> Result<Self> {
        if points.len() < 3 {
            return Err(PhysicsError::ShapeCreationFailed(format!(
                "convex polygon needs at least 3 points, got {}",
                points.len()
            )));
        }
        let points: Vec<_> = points.iter().copied().map(to_point).collect();
        rapier::SharedShape::convex_hull(&points)
            .map(Self)
            .ok_or_else(|| {
                PhysicsError::ShapeCreationFailed(format!(
                    "degenerate convex hull from {} points",
                    points.len()
                ))
            })
    }

    /// Build a shape from its serializable description
    pub fn from_desc(desc: &ShapeDesc) -> Result<Self> {
        match desc {
            ShapeDesc::Ball { radius } if *radius > 0.0 => Ok(Self::ball(*radius)),
            ShapeDesc::Cuboid { half_extents } if half_extents.iter().all(|h| *h > 0.0) => {
                Ok(Self::cuboid(half_extents[0], half_extents[1]))
            }
            ShapeDesc::ConvexPolygon { points } => {
                let points: Vec<Vec2> = points.iter().map(|p| Vec2::new(p[0], p[1])).collect();
                Self::convex_polygon(&points)
            }
            other => Err(PhysicsError::ShapeCreationFailed(format!(
                "non-positive extents in {other:?}"
            ))),
        }
    }

    /// Whether two handles refer to the same geometry
    pub fn ptr_eq(&self, other: &Shape) -> bool {
        Arc::ptr_eq(&self.0 .0, &other.0 .0)
    }

    /// Area of the shape
    pub fn area(&self) -> f32 {
        self.0.mass_properties(1.0).mass()
    }

    /// Mass and inverse inertia for the given density
    pub(crate) fn inertia(&self, density: f32) -> (f32, f32) {
        let props = self.0.mass_properties(density);
        let sqrt = props.inv_principal_inertia_sqrt;
        (props.mass(), sqrt * sqrt)
    }
}

/// Serializable shape description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeDesc {
    Ball { radius: f32 },
    Cuboid { half_extents: [f32; 2] },
    ConvexPolygon { points: Vec<[f32; 2]> },
}
