//! Ray queries against the solver's geometry

use crate::body::BodyHandle;
use crate::events::HitInfo;
use crate::math::{to_point, Vec2};
use crate::world::PhysicsWorld;
use log::trace;
use rapier2d::prelude as rapier;

/// Closest intersection along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Body owning the struck collider; `None` for parentless colliders
    pub body: Option<BodyHandle>,
    /// Impact point in world space
    pub point: Vec2,
    /// Surface normal at the impact point
    pub normal: Vec2,
    /// Position along the ray in `[0, 1]` for sweeps, distance for raycasts
    pub fraction: f32,
}

/// Query interface borrowed from a synced world
pub struct PhysicsQuery<'a> {
    pub(crate) query_pipeline: &'a rapier::QueryPipeline,
    pub(crate) colliders: &'a rapier::ColliderSet,
    pub(crate) bodies: &'a rapier::RigidBodySet,
}

impl<'a> PhysicsQuery<'a> {
    fn cast(
        &self,
        ray: &rapier::Ray,
        max_toi: f32,
        exclude: Option<BodyHandle>,
    ) -> Option<RayHit> {
        let mut filter = rapier::QueryFilter::new().exclude_sensors();
        if let Some(body) = exclude {
            filter = filter.exclude_rigid_body(body.0);
        }

        self.query_pipeline
            .cast_ray_and_get_normal(self.bodies, self.colliders, ray, max_toi, true, filter)
            .map(|(handle, intersection)| {
                let point = ray.point_at(intersection.time_of_impact);
                RayHit {
                    body: self
                        .colliders
                        .get(handle)
                        .and_then(|c| c.parent())
                        .map(BodyHandle),
                    point: point.coords,
                    normal: intersection.normal,
                    fraction: intersection.time_of_impact,
                }
            })
    }

    /// Closest hit on the segment `from → to`, ignoring `exclude`.
    ///
    /// A zero-length segment touches nothing.
    pub fn ray_sweep(&self, from: Vec2, to: Vec2, exclude: Option<BodyHandle>) -> Option<RayHit> {
        let delta = to - from;
        let len = delta.norm();
        if !(len > 0.0 && len.is_finite()) {
            return None;
        }
        // Unit direction, with the segment length as the time-of-impact bound
        let ray = rapier::Ray::new(to_point(from), delta / len);
        self.cast(&ray, len, exclude).map(|hit| RayHit {
            fraction: hit.fraction / len,
            ..hit
        })
    }

    /// Closest hit along a direction, up to `max_distance`
    pub fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<RayHit> {
        let len = direction.norm();
        if len <= f32::EPSILON {
            return None;
        }
        let ray = rapier::Ray::new(to_point(origin), direction / len);
        self.cast(&ray, max_distance, None)
    }

    /// Body whose solid geometry contains a point
    pub fn body_at(&self, point: Vec2) -> Option<BodyHandle> {
        let mut result = None;
        self.query_pipeline.intersections_with_point(
            self.bodies,
            self.colliders,
            &to_point(point),
            rapier::QueryFilter::new().exclude_sensors(),
            |handle| {
                result = self.colliders.get(handle).and_then(|c| c.parent());
                result.is_none()
            },
        );
        result.map(BodyHandle)
    }
}

impl PhysicsWorld {
    /// Query interface. Brings the acceleration structure up to date first.
    pub fn query(&mut self) -> PhysicsQuery<'_> {
        self.sync_query_pipeline();
        PhysicsQuery {
            query_pipeline: &self.query_pipeline,
            colliders: &self.colliders,
            bodies: &self.bodies,
        }
    }

    /// Rebuild the ray-query structure if bodies moved outside the solver
    pub fn sync_query_pipeline(&mut self) {
        if self.query_dirty {
            self.query_pipeline.update(&self.colliders);
            self.query_dirty = false;
        }
    }

    /// Closest hit on the segment `from → to`
    pub fn ray_sweep(&mut self, from: Vec2, to: Vec2, exclude: Option<BodyHandle>) -> Option<RayHit> {
        self.query().ray_sweep(from, to, exclude)
    }

    /// Hand a projectile impact to the owner of `body`.
    ///
    /// Returns whether an `OnHit` owner received it. Owners that are busy in a
    /// callback of their own are skipped.
    pub fn deliver_hit(&mut self, body: BodyHandle, hit: &HitInfo) -> bool {
        let Some(owner) = self.owner(body) else {
            return false;
        };
        let delivered = self
            .with_entity(owner, |entity, world| {
                entity
                    .as_hit()
                    .map(|target| target.on_hit(world, hit))
                    .is_some()
            })
            .unwrap_or(false);
        if !delivered {
            trace!("Hit on {:?} not delivered (owner {:?})", body.0, owner);
        }
        delivered
    }
}
