//! Physics events: contact start/stop records and projectile impacts

use crate::body::BodyHandle;
use crate::math::Vec2;
use rapier2d::prelude as rapier;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable projectile parameters shared by every round of one weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileProperties {
    /// Mass carried into the target on impact
    pub mass: f32,
    /// Distance from the spawn point after which the round is spent
    pub range: f32,
}

impl Default for ProjectileProperties {
    fn default() -> Self {
        Self {
            mass: 0.008,
            range: 1000.0,
        }
    }
}

impl ProjectileProperties {
    pub fn new(mass: f32, range: f32) -> Self {
        Self { mass, range }
    }
}

/// What a victim learns about a projectile that struck it
#[derive(Debug, Clone)]
pub struct HitInfo {
    pub properties: Arc<ProjectileProperties>,
    /// Projectile velocity at impact
    pub velocity: Vec2,
    /// Impact point in world space
    pub world_point: Vec2,
    /// Surface normal at the impact point
    pub world_normal: Vec2,
    /// Body that fired the projectile, if known
    pub shooter: Option<BodyHandle>,
}

impl HitInfo {
    /// Linear momentum delivered by the projectile
    pub fn momentum(&self) -> Vec2 {
        self.velocity * self.properties.mass
    }
}

/// Type of collision event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEventType {
    /// Bodies started touching
    Started,
    /// Bodies stopped touching
    Stopped,
}

/// Start or end of contact between two bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub body1: BodyHandle,
    pub body2: BodyHandle,
    pub event_type: CollisionEventType,
}

impl CollisionEvent {
    pub fn is_started(&self) -> bool {
        self.event_type == CollisionEventType::Started
    }

    pub fn is_stopped(&self) -> bool {
        self.event_type == CollisionEventType::Stopped
    }

    /// Whether this event involves the given body
    pub fn involves(&self, body: BodyHandle) -> bool {
        self.body1 == body || self.body2 == body
    }
}

/// Collision events gathered during one `step`
#[derive(Debug, Default)]
pub struct EventCollector {
    pub collision_events: Vec<CollisionEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.collision_events.clear();
    }

    pub fn started_collisions(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.collision_events.iter().filter(|e| e.is_started())
    }

    pub fn stopped_collisions(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.collision_events.iter().filter(|e| e.is_stopped())
    }
}

/// Forwards solver events out of `PhysicsPipeline::step`
pub(crate) struct ChannelEventCollector {
    pub collision_events: crossbeam_channel::Sender<rapier::CollisionEvent>,
}

impl rapier::EventHandler for ChannelEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &rapier::RigidBodySet,
        _colliders: &rapier::ColliderSet,
        event: rapier::CollisionEvent,
        _contact_pair: Option<&rapier::ContactPair>,
    ) {
        let _ = self.collision_events.send(event);
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &rapier::RigidBodySet,
        _colliders: &rapier::ColliderSet,
        _contact_pair: &rapier::ContactPair,
        _total_force_magnitude: f32,
    ) {
    }
}
