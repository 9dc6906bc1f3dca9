//! Physics world - substep orchestration around the Rapier pipeline

use crate::body::{BodyHandle, BodyRecord};
use crate::config::PhysicsConfig;
use crate::entity::{Entity, EntityId, EntityRegistry, PresubstepFn};
use crate::error::Result;
use crate::events::{ChannelEventCollector, CollisionEvent, CollisionEventType, EventCollector};
use log::{debug, trace, warn};
use rapier2d::prelude as rapier;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;

/// Relative tolerance, in ULPs, when counting whole substeps in a frame.
///
/// `n * substep / substep` can round to just under `n`; anything closer to
/// `n` than this still counts as `n` substeps. Shorter frames do not.
const SUBSTEP_ULPS: f32 = 4.0;

/// The main physics world containing all simulation state
pub struct PhysicsWorld {
    /// Configuration
    pub(crate) config: PhysicsConfig,

    /// Rapier physics pipeline
    pipeline: rapier::PhysicsPipeline,

    /// Gravity
    gravity: rapier::Vector<f32>,

    /// Integration parameters
    integration_params: rapier::IntegrationParameters,

    pub(crate) islands: rapier::IslandManager,
    broad_phase: rapier::DefaultBroadPhase,
    narrow_phase: rapier::NarrowPhase,
    pub(crate) impulse_joints: rapier::ImpulseJointSet,
    pub(crate) multibody_joints: rapier::MultibodyJointSet,
    ccd_solver: rapier::CCDSolver,

    /// Query pipeline, refreshed by every solver step
    pub(crate) query_pipeline: rapier::QueryPipeline,

    /// Set when bodies moved or appeared outside the solver
    pub(crate) query_dirty: bool,

    pub(crate) bodies: rapier::RigidBodySet,
    pub(crate) colliders: rapier::ColliderSet,

    /// Limits, inertia and owners keyed by body
    pub(crate) records: HashMap<rapier::RigidBodyHandle, BodyRecord>,

    /// Bodies warped since the last solve; their stale contacts are ignored
    pub(crate) warped: HashSet<rapier::RigidBodyHandle>,

    pub(crate) entities: EntityRegistry,

    /// Event collector
    events: EventCollector,

    /// Fractional substep carried into the next frame
    accumulated_time: f32,

    elapsed_substeps: u64,
}

impl PhysicsWorld {
    /// Create a new physics world
    pub fn new(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: PhysicsConfig) -> Self {
        let gravity = rapier::Vector::new(config.gravity[0], config.gravity[1]);

        let mut integration_params = rapier::IntegrationParameters::default();
        integration_params.dt = config.substep;
        if let Some(iterations) = NonZeroUsize::new(config.solver_iterations) {
            integration_params.num_solver_iterations = iterations;
        }

        debug!(
            "Physics world: substep {:.4}s, at most {} per frame",
            config.substep, config.max_substeps
        );

        Self {
            config,
            pipeline: rapier::PhysicsPipeline::new(),
            gravity,
            integration_params,
            islands: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            impulse_joints: rapier::ImpulseJointSet::new(),
            multibody_joints: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            query_pipeline: rapier::QueryPipeline::new(),
            query_dirty: false,
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
            records: HashMap::new(),
            warped: HashSet::new(),
            entities: EntityRegistry::new(),
            events: EventCollector::new(),
            accumulated_time: 0.0,
            elapsed_substeps: 0,
        }
    }

    /// Get the physics configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Fixed substep duration
    pub fn substep(&self) -> f32 {
        self.config.substep
    }

    /// Substeps run since creation
    pub fn elapsed_substeps(&self) -> u64 {
        self.elapsed_substeps
    }

    // ==================== Entities ====================

    /// Register an entity, linking it as the owner of its body
    pub fn spawn<E: Entity>(&mut self, entity: E) -> EntityId {
        self.spawn_boxed(Box::new(entity))
    }

    /// Register a boxed entity.
    ///
    /// A body already owned by a live entity is taken over by the new one.
    pub fn spawn_boxed(&mut self, entity: Box<dyn Entity>) -> EntityId {
        let body = entity.body();
        let id = self.entities.insert(entity);
        if let Some(handle) = body {
            if let Some(record) = self.records.get_mut(&handle.0) {
                if let Some(previous) = record.owner {
                    warn!("{:?} takes body {:?} over from {:?}", id, handle.0, previous);
                }
                record.owner = Some(id);
            }
        }
        debug!("Spawned {:?} (body {:?})", id, body.map(|b| b.0));
        id
    }

    /// Unregister an entity. Its body stays in the world, unowned.
    ///
    /// An entity may despawn itself from inside its own callback; it is then
    /// dropped when the callback returns and `None` is returned here.
    pub fn despawn(&mut self, id: EntityId) -> Option<Box<dyn Entity>> {
        if !self.entities.contains(id) {
            return None;
        }
        for record in self.records.values_mut() {
            if record.owner == Some(id) {
                record.owner = None;
            }
        }
        debug!("Despawned {:?}", id);
        self.entities.remove(id)
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains(id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Borrow an entity as its concrete type
    pub fn entity<T: Entity>(&self, id: EntityId) -> Option<&T> {
        self.entities
            .get(id)
            .and_then(|e| e.as_any().downcast_ref::<T>())
    }

    /// Mutably borrow an entity as its concrete type
    pub fn entity_mut<T: Entity>(&mut self, id: EntityId) -> Option<&mut T> {
        self.entities
            .get_mut(id)
            .and_then(|e| e.as_any_mut().downcast_mut::<T>())
    }

    /// Register a closure to run once per substep, after any already registered
    pub fn add_presubstep<F>(&mut self, f: F) -> EntityId
    where
        F: FnMut(&mut PhysicsWorld, f32) + 'static,
    {
        self.spawn(PresubstepFn(f))
    }

    /// Run `f` with the entity checked out of the registry.
    ///
    /// Returns `None` if the entity is gone or already running a callback.
    pub(crate) fn with_entity<R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut dyn Entity, &mut PhysicsWorld) -> R,
    ) -> Option<R> {
        let mut entity = self.entities.checkout(id)?;
        let out = f(&mut *entity, self);
        if self.entities.checkin(id, entity).is_some() {
            trace!("{:?} despawned during its own callback", id);
        }
        Some(out)
    }

    // ==================== Simulation ====================

    /// Advance by as many whole substeps as fit in `elapsed`, up to the cap.
    ///
    /// Returns the number of substeps run. Time past `max_substeps` is
    /// dropped; the sub-substep remainder is dropped too unless
    /// `carry_remainder` is set.
    pub fn step(&mut self, elapsed: f32) -> u32 {
        let substep = self.config.substep;
        let available = if self.config.carry_remainder {
            self.accumulated_time + elapsed.max(0.0)
        } else {
            elapsed.max(0.0)
        };
        if !available.is_finite() {
            self.accumulated_time = 0.0;
            return 0;
        }

        let ratio = available / substep;
        let whole = (ratio + ratio.max(1.0) * SUBSTEP_ULPS * f32::EPSILON).floor();
        let count = (whole as u32).min(self.config.max_substeps);

        let consumed = count as f32 * substep;
        if whole as u32 > count {
            trace!(
                "Dropping {:.4}s beyond the {} substep cap",
                available - consumed,
                self.config.max_substeps
            );
            self.accumulated_time = 0.0;
        } else if self.config.carry_remainder {
            self.accumulated_time = (available - consumed).max(0.0);
        } else if available > consumed {
            trace!("Dropping {:.4}s remainder", available - consumed);
        }

        self.events.clear();
        for _ in 0..count {
            self.run_substep();
        }
        count
    }

    fn run_substep(&mut self) {
        let dt = self.config.substep;
        self.resolve_contacts();
        self.run_presubstep(dt);
        self.advance_solver();
        self.elapsed_substeps += 1;
    }

    /// Notify both sides of every pair that touched in the previous solve
    fn resolve_contacts(&mut self) {
        let mut touching = Vec::new();
        for pair in self.narrow_phase.contact_pairs() {
            let (Some(b1), Some(b2)) = (
                self.colliders.get(pair.collider1).and_then(|c| c.parent()),
                self.colliders.get(pair.collider2).and_then(|c| c.parent()),
            ) else {
                continue;
            };
            for manifold in &pair.manifolds {
                if manifold.points.iter().any(|p| p.dist <= 0.0) {
                    touching.push((b1, b2));
                }
            }
        }

        for (b1, b2) in touching {
            if self.warped.contains(&b1) || self.warped.contains(&b2) {
                continue;
            }
            self.notify_collision(BodyHandle(b1), BodyHandle(b2));
            self.notify_collision(BodyHandle(b2), BodyHandle(b1));
        }
    }

    fn notify_collision(&mut self, body: BodyHandle, other: BodyHandle) {
        let Some(owner) = self.owner(body) else {
            return;
        };
        self.with_entity(owner, |entity, world| {
            if let Some(handler) = entity.as_collision() {
                handler.on_collision(world, other);
            }
        });
    }

    fn run_presubstep(&mut self, dt: f32) {
        for id in self.entities.presubstep_snapshot() {
            self.with_entity(id, |entity, world| {
                if let Some(handler) = entity.as_presubstep() {
                    handler.on_presubstep(world, dt);
                }
            });
        }
    }

    fn advance_solver(&mut self) {
        let (collision_send, collision_recv) = crossbeam_channel::unbounded();
        let event_handler = ChannelEventCollector {
            collision_events: collision_send,
        };

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &event_handler,
        );
        self.query_dirty = false;

        // Rapier keeps user forces until cleared; ours last one substep
        for handle in self.records.keys() {
            if let Some(body) = self.bodies.get_mut(*handle) {
                body.reset_forces(false);
                body.reset_torques(false);
            }
        }
        self.warped.clear();

        while let Ok(event) = collision_recv.try_recv() {
            let (h1, h2, event_type) = match event {
                rapier::CollisionEvent::Started(h1, h2, _) => (h1, h2, CollisionEventType::Started),
                rapier::CollisionEvent::Stopped(h1, h2, _) => (h1, h2, CollisionEventType::Stopped),
            };
            let parent = |h| self.colliders.get(h).and_then(|c| c.parent());
            if let (Some(b1), Some(b2)) = (parent(h1), parent(h2)) {
                self.events.collision_events.push(CollisionEvent {
                    body1: BodyHandle(b1),
                    body2: BodyHandle(b2),
                    event_type,
                });
            }
        }
        trace!("Substep {} solved", self.elapsed_substeps);
    }

    // ==================== Events ====================

    /// Contact start/stop events gathered during the last `step`
    pub fn collision_events(&self) -> &[CollisionEvent] {
        &self.events.collision_events
    }

    pub fn collision_started(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.events.started_collisions()
    }

    pub fn collision_stopped(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.events.stopped_collisions()
    }

    // ==================== Debug ====================

    /// Get number of rigid bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Get number of active (awake) bodies
    pub fn active_body_count(&self) -> usize {
        self.islands.active_dynamic_bodies().len()
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::build(PhysicsConfig::default())
    }
}
