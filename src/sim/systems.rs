//! Fixed-order tick systems
//!
//! One tick is one ordered pass: Physics Step -> Player Constraint ->
//! Collision Check -> Obstacle Spawn -> Obstacle Despawn. Each system takes
//! the shared entity store, the world, and the frame context; events surface
//! through the context as typed values and are consumed once per tick by the
//! session controller.

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::settings::SessionPolicy;
use crate::world::{BodySpec, World};

use super::entities::{Category, ColorToken, Entity, EntityArena, EntityId, RenderShape, VisualSize};
use super::Screen;

/// Per-tick ephemeral context handed to every system
#[derive(Debug)]
pub struct FrameContext {
    /// Time advanced by this tick (ms)
    pub delta_ms: f64,
    /// Monotonic session clock at this tick (ms)
    pub now_ms: f64,
    /// Events emitted by systems this tick
    pub events: Vec<GameEvent>,
}

impl FrameContext {
    pub fn new(delta_ms: f64, now_ms: f64) -> Self {
        Self {
            delta_ms,
            now_ms,
            events: Vec::new(),
        }
    }
}

/// Typed events surfaced from the tick pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Player touched an obstacle; terminal for the session
    GameOver,
}

/// Spawner bookkeeping that survives across ticks
#[derive(Debug)]
pub struct SpawnState {
    /// None until the session's first spawn, which happens immediately
    pub last_spawn_at: Option<f64>,
    rng: Pcg32,
}

impl SpawnState {
    pub fn new(seed: u64) -> Self {
        Self {
            last_spawn_at: None,
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

/// Advance the physics simulation by the tick delta
pub fn physics_step(world: &mut World, ctx: &FrameContext) {
    world.step((ctx.delta_ms / 1000.0) as f32);
}

/// Keep the player on its row: clamp x to the screen, pin y, zero the
/// vertical velocity. A missing player is a no-op.
pub fn player_constraint(
    entities: &EntityArena,
    world: &mut World,
    screen: Screen,
    player: Option<EntityId>,
) {
    let Some(entity) = player.and_then(|id| entities.get(id)) else {
        return;
    };
    let Some(body) = world.body(entity.body) else {
        return;
    };
    let half = entity.size.half_width();
    let pos = Vec2::new(
        body.pos.x.clamp(half, screen.width - half),
        screen.player_row(),
    );
    let vel = Vec2::new(body.vel.x, 0.0);
    world.set_position(entity.body, pos);
    world.set_velocity(entity.body, vel);
}

/// Emit exactly one `GameOver` on the first player/obstacle overlap this tick
pub fn collision_check(
    entities: &EntityArena,
    world: &World,
    ctx: &mut FrameContext,
    player: Option<EntityId>,
) {
    let Some(player) = player.and_then(|id| entities.get(id)) else {
        return;
    };
    for (_, obstacle) in entities.in_category(Category::Obstacle) {
        if world.collides(player.body, obstacle.body) {
            ctx.events.push(GameEvent::GameOver);
            return;
        }
    }
}

/// Spawn at most one obstacle per interval: random extent in
/// [OBSTACLE_MIN_EXTENT, OBSTACLE_MAX_EXTENT), random horizontal position
/// fully inside the screen, random hue, entering at the top edge
pub fn obstacle_spawn(
    entities: &mut EntityArena,
    world: &mut World,
    ctx: &FrameContext,
    spawn: &mut SpawnState,
    screen: Screen,
    policy: &SessionPolicy,
) {
    let due = match spawn.last_spawn_at {
        None => true,
        Some(last) => ctx.now_ms - last > SPAWN_INTERVAL_MS,
    };
    if !due {
        return;
    }

    let width = spawn.rng.random_range(OBSTACLE_MIN_EXTENT..OBSTACLE_MAX_EXTENT);
    let height = spawn.rng.random_range(OBSTACLE_MIN_EXTENT..OBSTACLE_MAX_EXTENT);
    if width >= screen.width {
        // screen too narrow for this roll; try again next tick
        return;
    }
    let x = spawn.rng.random_range(0.0..screen.width - width) + width / 2.0;
    // just below a ceiling, or above the visible area for free fall
    let y = if policy.has_ceiling {
        height / 2.0 + 1.0
    } else {
        -height / 2.0 - 1.0
    };
    let hue = spawn.rng.random_range(0.0..360.0);

    let spec = BodySpec::rect(width, height)
        .at(Vec2::new(x, y))
        .restitution(OBSTACLE_RESTITUTION)
        .friction(OBSTACLE_FRICTION)
        .air_drag(OBSTACLE_AIR_DRAG)
        .gravity_scale(policy.obstacle_gravity_scale)
        .group(OBSTACLE_GROUP);
    let body = match world.add_body(spec) {
        Ok(handle) => handle,
        Err(err) => {
            log::error!("obstacle body rejected: {}", err);
            return;
        }
    };

    entities.insert(Entity {
        body,
        size: VisualSize::Extent { width, height },
        color: ColorToken::Hue(hue),
        shape: RenderShape::RoundedRect,
        category: Category::Obstacle,
        spawned_at: Some(ctx.now_ms),
    });
    spawn.last_spawn_at = Some(ctx.now_ms);
    log::debug!("spawned {}x{} obstacle at x={:.0}", width as u32, height as u32, x);
}

/// Remove every obstacle that fell past the bottom margin, from both the
/// store and the world, within this tick
pub fn obstacle_despawn(entities: &mut EntityArena, world: &mut World, screen: Screen) {
    let mut doomed: Vec<EntityId> = Vec::new();
    for (id, obstacle) in entities.in_category(Category::Obstacle) {
        let gone = match world.body(obstacle.body) {
            Some(body) => body.pos.y > screen.height + DESPAWN_MARGIN,
            // body vanished from the world: drop the record this tick too
            None => true,
        };
        if gone {
            doomed.push(id);
        }
    }
    for id in doomed {
        if let Some(obstacle) = entities.remove(id) {
            world.remove_body(obstacle.body);
            log::debug!("despawned obstacle below the screen");
        }
    }
}
