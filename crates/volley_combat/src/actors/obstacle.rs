//! Static scenery

use crate::error::Result;
use std::sync::OnceLock;
use volley_physics::prelude::*;

/// Half the side length of an obstacle square
pub const OBSTACLE_HALF_EXTENT: f32 = 1.0;

fn square() -> Shape {
    static SQUARE: OnceLock<Shape> = OnceLock::new();
    SQUARE
        .get_or_init(|| Shape::cuboid(OBSTACLE_HALF_EXTENT, OBSTACLE_HALF_EXTENT))
        .clone()
}

/// Immovable square that stops projectiles and bodies
#[derive(Debug, Clone)]
pub struct Obstacle {
    body: BodyHandle,
}

impl Obstacle {
    pub fn new(world: &mut PhysicsWorld, position: Vec2) -> Result<Self> {
        let body = world.insert_body(BodyDesc::fixed(square()).with_position(position))?;
        Ok(Self { body })
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }
}

impl Entity for Obstacle {
    fn body(&self) -> Option<BodyHandle> {
        Some(self.body)
    }
}

/// Spawn `cols × rows` obstacles starting at `origin`, `spacing` apart on both axes
pub fn obstacle_grid(
    world: &mut PhysicsWorld,
    origin: Vec2,
    cols: u32,
    rows: u32,
    spacing: f32,
) -> Result<Vec<EntityId>> {
    let mut ids = Vec::with_capacity((cols * rows) as usize);
    for y in 0..rows {
        for x in 0..cols {
            let position = origin + Vec2::new(x as f32, y as f32) * spacing;
            let obstacle = Obstacle::new(world, position)?;
            ids.push(world.spawn(obstacle));
        }
    }
    Ok(ids)
}
