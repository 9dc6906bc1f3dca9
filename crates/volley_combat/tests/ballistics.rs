//! Projectiles and firing actors against a live world

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use volley_combat::actors::{hull, OBSTACLE_HALF_EXTENT};
use volley_combat::prelude::*;
use volley_physics::prelude::*;

const DT: f32 = 1.0 / 60.0;

fn world() -> PhysicsWorld {
    PhysicsWorld::new(PhysicsConfig::default()).unwrap()
}

/// Static box that records where it was hit
struct Target {
    body: BodyHandle,
    hits: Rc<RefCell<Vec<Vec2>>>,
}

impl Entity for Target {
    fn body(&self) -> Option<BodyHandle> {
        Some(self.body)
    }

    fn as_hit(&mut self) -> Option<&mut dyn OnHit> {
        Some(self)
    }
}

impl OnHit for Target {
    fn on_hit(&mut self, _world: &mut PhysicsWorld, hit: &HitInfo) {
        self.hits.borrow_mut().push(hit.world_point);
    }
}

fn target(world: &mut PhysicsWorld, x: f32) -> (EntityId, Rc<RefCell<Vec<Vec2>>>) {
    let body = world
        .insert_body(BodyDesc::fixed(Shape::cuboid(0.5, 0.5)).with_position(Vec2::new(x, 0.0)))
        .unwrap();
    let hits = Rc::new(RefCell::new(Vec::new()));
    let id = world.spawn(Target {
        body,
        hits: Rc::clone(&hits),
    });
    (id, hits)
}

#[test]
fn projectile_stops_at_range() {
    let mut world = world();
    let mut round = Projectile::new(
        Arc::new(ProjectileProperties::new(0.01, 10.0)),
        Vec2::zeros(),
        Vec2::new(4.0, 0.0),
    );

    assert!(!round.step(&mut world, 1.0));
    assert!(!round.step(&mut world, 1.0));
    // 8 < 10, so it still moves, overshooting to 12
    assert!(!round.step(&mut world, 1.0));
    assert_eq!(round.position, Vec2::new(12.0, 0.0));

    assert!(round.expended());
    assert!(round.step(&mut world, 1.0));
    assert_eq!(round.position, Vec2::new(12.0, 0.0));
}

#[test]
fn only_the_nearer_target_is_hit() {
    let mut world = world();
    let (_, near) = target(&mut world, 5.0);
    let (_, far) = target(&mut world, 10.0);

    let mut round = Projectile::new(
        Arc::new(ProjectileProperties::default()),
        Vec2::zeros(),
        Vec2::new(100.0, 0.0),
    );
    assert!(round.step(&mut world, 0.12));

    assert_eq!(near.borrow().len(), 1);
    assert!(far.borrow().is_empty());
    assert_relative_eq!(near.borrow()[0], Vec2::new(4.5, 0.0), epsilon = 1e-4);
    assert_relative_eq!(round.position, Vec2::new(4.5, 0.0), epsilon = 1e-4);
}

#[test]
fn short_sweeps_near_a_hull_touch_nothing() {
    let mut world = world();
    let body = world
        .insert_body(BodyDesc::fixed(hull()).with_position(Vec2::new(5.0, 0.0)))
        .unwrap();
    let hits = Rc::new(RefCell::new(Vec::new()));
    world.spawn(Target {
        body,
        hits: Rc::clone(&hits),
    });

    // Inside the hull's bounding box but clear of the triangle
    let start = Vec2::new(5.6, 0.4);
    for len in [0.0, 1e-7, 1e-5, 1e-3] {
        let hit = world.ray_sweep(start, start + Vec2::new(len, 0.0), None);
        assert!(hit.is_none(), "sweep of {len} hit {hit:?}");
    }
    let hit = world
        .ray_sweep(Vec2::new(3.0, 0.4), Vec2::new(5.0, 0.4), None)
        .unwrap();
    assert_relative_eq!(hit.point, Vec2::new(4.5, 0.4), epsilon = 1e-4);
    assert_relative_eq!(hit.fraction, 0.75, epsilon = 1e-4);

    // Floored to the substep, every launch after the first is stepped by zero
    let mut shooter = Shooter::new(0.001, world.substep(), ProjectileProperties::default())
        .unwrap();
    shooter.set_enabled(true);
    let mut fired = 0;
    for _ in 0..3 {
        let dt = world.substep();
        fired += shooter.step(&mut world, dt, None, |_| {
            Some(Muzzle {
                position: start,
                velocity: Vec2::new(0.0, 10.0),
            })
        });
    }
    assert_eq!(fired, 4);
    assert_eq!(shooter.projectiles.len(), 4);
    assert!(hits.borrow().is_empty());
}

#[test]
fn despawned_target_absorbs_without_notice() {
    let mut world = world();
    let (id, hits) = target(&mut world, 5.0);
    world.despawn(id);

    let mut list = ProjectileList::new();
    list.push(Projectile::new(
        Arc::new(ProjectileProperties::default()),
        Vec2::zeros(),
        Vec2::new(100.0, 0.0),
    ));
    assert_eq!(list.step_all(&mut world, 0.1, None), 1);
    assert!(list.is_empty());
    assert!(hits.borrow().is_empty());
}

#[test]
fn boundary_discards_strays() {
    let mut world = world();
    let boundary = WorldBoundary::new(5.0, 5.0);
    let mut list = ProjectileList::new();
    for vx in [10.0, 100.0] {
        list.push(Projectile::new(
            Arc::new(ProjectileProperties::default()),
            Vec2::zeros(),
            Vec2::new(vx, 0.0),
        ));
    }

    // Both step once; the fast round is now outside and goes next time
    assert_eq!(list.step_all(&mut world, 0.1, Some(&boundary)), 0);
    assert_eq!(list.step_all(&mut world, 0.1, Some(&boundary)), 1);
    assert_eq!(list.len(), 1);
    assert_relative_eq!(list.iter().next().unwrap().position.x, 2.0, epsilon = 1e-5);
}

#[test]
fn soldier_knocks_back_biped() {
    let mut world = world();
    let tuning = SoldierTuning {
        weapon: WeaponTuning {
            spread: 0.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let soldier = Soldier::new(
        &mut world,
        Vec2::zeros(),
        ProjectileProperties::default(),
        tuning,
        StdRng::seed_from_u64(5),
    )
    .unwrap();
    let shooter = world.spawn(soldier);

    let biped = Biped::new(&mut world, Vec2::new(3.0, 0.0), BipedTuning::default()).unwrap();
    let victim = biped.body();
    world.spawn(biped);

    world.entity_mut::<Soldier>(shooter).unwrap().set_firing(true);
    for _ in 0..10 {
        world.step(DT);
    }

    let victim_x = world.position(victim).unwrap().x;
    assert!(victim_x > 3.0);
    assert!(world.linear_velocity(victim).unwrap().x > 0.0);
    // Nothing in flight has passed through the victim
    let soldier = world.entity::<Soldier>(shooter).unwrap();
    assert!(soldier.shooter.projectiles.iter().all(|p| p.position.x < victim_x));
}

#[test]
fn warship_rounds_stop_at_obstacle() {
    let mut world = world();
    let obstacle = Obstacle::new(&mut world, Vec2::new(20.0, 0.0)).unwrap();
    world.spawn(obstacle);

    let tree = twin_mount(
        Arc::new(ProjectileProperties::default()),
        &WeaponTuning::default(),
        world.substep(),
    )
    .unwrap();
    let mut ship = Warship::new(
        &mut world,
        Transform::identity(),
        ShipTuning::default(),
        StdRng::seed_from_u64(9),
    )
    .unwrap()
    .with_weapon_tree(tree);
    ship.fire(true);
    let id = world.spawn(ship);

    for _ in 0..30 {
        world.step(DT);
    }
    let ship = world.entity::<Warship>(id).unwrap();
    assert!(ship.projectiles.len() < 10);
    assert!(ship
        .projectiles
        .iter()
        .all(|p| p.position.x <= 20.0 - OBSTACLE_HALF_EXTENT + 1e-3));
}
