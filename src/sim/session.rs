//! Game session controller
//!
//! Owns the world, the entity store, the spawner state, and the two interval
//! timers; drives the system pipeline once per tick and consumes its events.
//! A session is exclusively owned state: every start tears the previous
//! session down in one atomic pass (timers disarmed, sensor dropped, dynamic
//! bodies cleared) before the new world exists, so stale periodic work can
//! never touch a fresh session.

use crossbeam_channel::Receiver;
use glam::Vec2;

use crate::consts::*;
use crate::input::{ControlCommand, SensorBridge, SensorSample};
use crate::settings::{SessionPolicy, Settings};
use crate::world::{BodySpec, World, WorldError};

use super::entities::{Category, ColorToken, Entity, EntityArena, EntityId, RenderShape, VisualSize};
use super::systems::{self, FrameContext, GameEvent, SpawnState};
use super::Screen;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    GameOver,
}

/// Errors that abort a session start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The physics world rejected a body during setup
    WorldInit(WorldError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            SessionError::WorldInit(err) => write!(f, "world setup failed: {}", err),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<WorldError> for SessionError {
    fn from(err: WorldError) -> Self {
        SessionError::WorldInit(err)
    }
}

/// Accumulator-driven interval timer; armed only while the session runs
#[derive(Debug, Clone, Copy, Default)]
struct IntervalTimer {
    period_ms: f64,
    acc_ms: f64,
    armed: bool,
}

impl IntervalTimer {
    fn armed(period_ms: f64) -> Self {
        Self {
            period_ms,
            acc_ms: 0.0,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
        self.acc_ms = 0.0;
    }

    /// Advance by `delta_ms`; returns how many whole periods elapsed
    fn advance(&mut self, delta_ms: f64) -> u32 {
        if !self.armed {
            return 0;
        }
        self.acc_ms += delta_ms;
        let mut fired = 0;
        while self.acc_ms >= self.period_ms {
            self.acc_ms -= self.period_ms;
            fired += 1;
        }
        fired
    }
}

/// One play-through: world, entities, timers, and the phase machine
#[derive(Debug)]
pub struct GameSession {
    phase: Phase,
    score: u64,
    screen: Screen,
    policy: SessionPolicy,
    seed: u64,
    /// Monotonic session clock (ms since start)
    clock_ms: f64,
    gravity_magnitude: f32,
    /// Gravity direction; Vec2::Y unless a tilt command replaced it
    gravity_dir: Vec2,
    world: World,
    entities: EntityArena,
    player: Option<EntityId>,
    spawn: SpawnState,
    score_timer: IntervalTimer,
    difficulty_timer: IntervalTimer,
    bridge: Option<SensorBridge>,
}

impl GameSession {
    pub fn new(screen_width: f32, screen_height: f32, policy: SessionPolicy, seed: u64) -> Self {
        Self {
            phase: Phase::Idle,
            score: 0,
            screen: Screen::new(screen_width, screen_height),
            policy,
            seed,
            clock_ms: 0.0,
            gravity_magnitude: GRAVITY_BASE,
            gravity_dir: Vec2::Y,
            world: World::new(Vec2::ZERO),
            entities: EntityArena::new(),
            player: None,
            spawn: SpawnState::new(seed),
            score_timer: IntervalTimer::default(),
            difficulty_timer: IntervalTimer::default(),
            bridge: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.screen_width,
            settings.screen_height,
            settings.policy,
            settings.seed,
        )
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn gravity_magnitude(&self) -> f32 {
        self.gravity_magnitude
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Entities for the renderer to draw
    pub fn entities(&self) -> &EntityArena {
        &self.entities
    }

    /// The world, for body position reads and host-side overrides
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    /// Start (or restart) a session: fresh world and entities, score and
    /// difficulty reset, timers armed, sensor subscribed.
    ///
    /// A setup failure aborts the start and leaves the session Idle.
    pub fn start(
        &mut self,
        sensor: Option<Receiver<SensorSample>>,
    ) -> Result<(), SessionError> {
        // teardown before any new state exists
        self.teardown();
        self.phase = Phase::Idle;
        self.score = 0;
        self.clock_ms = 0.0;
        self.gravity_magnitude = GRAVITY_BASE;
        self.gravity_dir = Vec2::Y;

        let mut world = Self::build_world(self.screen, &self.policy)?;
        let player_body = world.add_body(
            BodySpec::circle(PLAYER_RADIUS)
                .at(self.screen.player_start())
                .group(self.policy.player_collision_group),
        )?;

        self.world = world;
        self.entities = EntityArena::new();
        self.player = Some(self.entities.insert(Entity {
            body: player_body,
            size: VisualSize::Radius(PLAYER_RADIUS),
            color: ColorToken::Named("white"),
            shape: RenderShape::Disc,
            category: Category::Player,
            spawned_at: None,
        }));
        self.spawn = SpawnState::new(self.seed);
        self.score_timer = IntervalTimer::armed(SCORE_INTERVAL_MS);
        self.difficulty_timer = IntervalTimer::armed(DIFFICULTY_INTERVAL_MS);
        self.bridge = sensor
            .map(|receiver| SensorBridge::subscribe(receiver, self.policy.control_mapping));
        self.phase = Phase::Running;
        log::info!(
            "session started: {}x{} screen, seed {}",
            self.screen.width,
            self.screen.height,
            self.seed
        );
        Ok(())
    }

    /// Restart after a game over (alias for a fresh start)
    pub fn restart(
        &mut self,
        sensor: Option<Receiver<SensorSample>>,
    ) -> Result<(), SessionError> {
        self.start(sensor)
    }

    /// Explicit stop: same teardown as a collision, score frozen for display
    pub fn stop(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        self.teardown();
        self.phase = Phase::GameOver;
        log::info!("session stopped at score {}", self.score);
    }

    /// Advance one frame: apply the newest control command, run the system
    /// pipeline in order, consume its events, then advance the timers.
    /// No-op outside Running.
    pub fn tick(&mut self, delta_ms: f64) {
        if self.phase != Phase::Running || delta_ms <= 0.0 {
            return;
        }
        self.clock_ms += delta_ms;

        // control path: latest sensor sample wins, applied before the pipeline
        let command = self.bridge.as_mut().and_then(SensorBridge::latest_command);
        if let Some(command) = command {
            self.apply_command(command);
        }

        let mut ctx = FrameContext::new(delta_ms, self.clock_ms);
        systems::physics_step(&mut self.world, &ctx);
        systems::player_constraint(&self.entities, &mut self.world, self.screen, self.player);
        systems::collision_check(&self.entities, &self.world, &mut ctx, self.player);
        systems::obstacle_spawn(
            &mut self.entities,
            &mut self.world,
            &ctx,
            &mut self.spawn,
            self.screen,
            &self.policy,
        );
        systems::obstacle_despawn(&mut self.entities, &mut self.world, self.screen);

        for event in ctx.events.drain(..) {
            match event {
                GameEvent::GameOver => {
                    log::info!("game over at score {}", self.score);
                    self.teardown();
                    self.phase = Phase::GameOver;
                    return;
                }
            }
        }

        // periodic work; armed only while running
        self.score += u64::from(self.score_timer.advance(delta_ms));
        let ramp_steps = self.difficulty_timer.advance(delta_ms);
        if ramp_steps > 0 {
            self.gravity_magnitude +=
                self.policy.difficulty_ramp_per_second * ramp_steps as f32;
            self.apply_gravity();
        }
    }

    fn apply_command(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::SteerVelocity(vx) => {
                let Some(entity) = self.player.and_then(|id| self.entities.get(id)) else {
                    return;
                };
                let Some(body) = self.world.body(entity.body) else {
                    return;
                };
                let vel = Vec2::new(vx, body.vel.y);
                self.world.set_velocity(entity.body, vel);
            }
            ControlCommand::TiltGravity(dir) => {
                self.gravity_dir = dir;
                self.apply_gravity();
            }
        }
    }

    fn apply_gravity(&mut self) {
        self.world.set_gravity(self.gravity_dir * self.gravity_magnitude);
    }

    /// Single atomic cancel-all: timers, sensor subscription, dynamic bodies,
    /// entity records. Runs on every exit from Running and ahead of every
    /// start.
    fn teardown(&mut self) {
        self.score_timer.disarm();
        self.difficulty_timer.disarm();
        if let Some(mut bridge) = self.bridge.take() {
            bridge.unsubscribe();
        }
        self.world.clear_dynamic();
        self.entities.clear();
        self.player = None;
    }

    /// Static boundaries: 50 px slabs hugging each screen edge. The floor
    /// sits below the despawn line as a backstop, so falling obstacles are
    /// reclaimed by the despawner before ever resting on it.
    fn build_world(screen: Screen, policy: &SessionPolicy) -> Result<World, WorldError> {
        let mut world = World::new(Vec2::Y * GRAVITY_BASE);
        let slab = 50.0;

        world.add_body(
            BodySpec::rect(screen.width, slab)
                .at(Vec2::new(
                    screen.width / 2.0,
                    screen.height + DESPAWN_MARGIN + slab * 1.5,
                ))
                .fixed(),
        )?;
        world.add_body(
            BodySpec::rect(slab, screen.height)
                .at(Vec2::new(-slab / 2.0, screen.height / 2.0))
                .fixed(),
        )?;
        world.add_body(
            BodySpec::rect(slab, screen.height)
                .at(Vec2::new(screen.width + slab / 2.0, screen.height / 2.0))
                .fixed(),
        )?;
        if policy.has_ceiling {
            world.add_body(
                BodySpec::rect(screen.width, slab)
                    .at(Vec2::new(screen.width / 2.0, -slab / 2.0))
                    .fixed(),
            )?;
        }
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    const WIDTH: f32 = 400.0;
    const HEIGHT: f32 = 800.0;

    fn session() -> GameSession {
        GameSession::new(WIDTH, HEIGHT, SessionPolicy::dodge(), 99)
    }

    /// Session whose obstacles hover at their spawn point, so multi-second
    /// runs cannot end on a lucky collision
    fn hover_session() -> GameSession {
        let mut policy = SessionPolicy::dodge();
        policy.obstacle_gravity_scale = 0.0;
        GameSession::new(WIDTH, HEIGHT, policy, 99)
    }

    /// Drive `ms` of game time in exact 10 ms ticks
    fn run_ms(session: &mut GameSession, ms: u64) {
        for _ in 0..ms / 10 {
            session.tick(10.0);
        }
    }

    fn first_obstacle(session: &GameSession) -> (EntityId, Entity) {
        let (id, entity) = session
            .entities()
            .in_category(Category::Obstacle)
            .next()
            .expect("an obstacle should exist");
        (id, entity.clone())
    }

    #[test]
    fn test_interval_timer_counts_whole_periods() {
        let mut timer = IntervalTimer::armed(100.0);
        assert_eq!(timer.advance(99.0), 0);
        assert_eq!(timer.advance(1.0), 1);
        assert_eq!(timer.advance(250.0), 2);
        timer.disarm();
        assert_eq!(timer.advance(1000.0), 0);
    }

    #[test]
    fn test_start_builds_player_on_row() {
        let mut session = session();
        session.start(None).expect("start");
        assert_eq!(session.phase(), Phase::Running);
        assert_eq!(session.score(), 0);

        let player = session.player().expect("player id");
        let entity = session.entities().get(player).expect("player entity");
        let body = session.world().body(entity.body).expect("player body");
        assert_eq!(body.pos, session.screen().player_start());
        assert_eq!(body.vel, Vec2::ZERO);
    }

    #[test]
    fn test_start_rejects_degenerate_screen() {
        let mut session = GameSession::new(0.0, 0.0, SessionPolicy::dodge(), 1);
        let result = session.start(None);
        assert!(matches!(result, Err(SessionError::WorldInit(_))));
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_one_second_of_ticks() {
        // 1000 ms with no input and no collision: one obstacle, score 10,
        // one difficulty step
        let mut session = session();
        session.start(None).expect("start");
        run_ms(&mut session, 1000);

        assert_eq!(session.phase(), Phase::Running);
        assert_eq!(session.score(), 10);
        let ramp = SessionPolicy::dodge().difficulty_ramp_per_second;
        assert!((session.gravity_magnitude() - (GRAVITY_BASE + ramp)).abs() < 1e-6);
        assert_eq!(session.entities().in_category(Category::Obstacle).count(), 1);
    }

    #[test]
    fn test_collision_ends_session_and_freezes_score() {
        let mut session = session();
        session.start(None).expect("start");
        run_ms(&mut session, 500);
        let score_before = session.score();

        // drop the spawned obstacle onto the player
        let (_, obstacle) = first_obstacle(&session);
        let target = session.screen().player_start();
        session.world_mut().set_position(obstacle.body, target);
        session.tick(10.0);

        assert_eq!(session.phase(), Phase::GameOver);
        assert_eq!(session.world().dynamic_count(), 0);
        assert!(session.entities().is_empty());

        // timers are torn down: more time changes nothing
        let frozen = session.score();
        assert!(frozen >= score_before);
        run_ms(&mut session, 2000);
        assert_eq!(session.score(), frozen);
        assert_eq!(session.phase(), Phase::GameOver);
    }

    #[test]
    fn test_despawn_end_to_end() {
        let mut session = session();
        session.start(None).expect("start");
        session.tick(10.0); // spawns the first obstacle

        let (id, obstacle) = first_obstacle(&session);
        session.world_mut().set_position(
            obstacle.body,
            Vec2::new(200.0, HEIGHT + DESPAWN_MARGIN + 1.0),
        );
        session.tick(10.0);

        assert!(session.entities().get(id).is_none());
        assert!(session.world().body(obstacle.body).is_none());
        // the player is the only dynamic body left
        assert_eq!(session.world().dynamic_count(), 1);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut session = hover_session();
        session.start(None).expect("start");
        run_ms(&mut session, 2500);
        assert!(session.score() > 0);
        assert!(session.gravity_magnitude() > GRAVITY_BASE);
        assert!(session.entities().in_category(Category::Obstacle).count() > 0);

        session.restart(None).expect("restart");

        assert_eq!(session.phase(), Phase::Running);
        assert_eq!(session.score(), 0);
        assert_eq!(session.gravity_magnitude(), GRAVITY_BASE);
        assert_eq!(session.entities().in_category(Category::Obstacle).count(), 0);
        let player = session.player().expect("player id");
        let entity = session.entities().get(player).expect("player entity");
        let body = session.world().body(entity.body).expect("player body");
        assert_eq!(body.pos, session.screen().player_start());
        assert_eq!(body.vel, Vec2::ZERO);
    }

    #[test]
    fn test_restart_is_deterministic() {
        let mut first = hover_session();
        first.start(None).expect("start");
        run_ms(&mut first, 1500);
        let (_, reference) = first_obstacle(&first);

        first.restart(None).expect("restart");
        run_ms(&mut first, 1500);
        let (_, replay) = first_obstacle(&first);

        // same seed, same tick sequence: identical spawn rolls
        assert_eq!(replay.size, reference.size);
        assert_eq!(replay.color, reference.color);
    }

    #[test]
    fn test_stop_tears_down() {
        let mut session = session();
        session.start(None).expect("start");
        run_ms(&mut session, 300);
        session.stop();

        assert_eq!(session.phase(), Phase::GameOver);
        assert_eq!(session.world().dynamic_count(), 0);
        assert!(session.entities().is_empty());
        // stop when not running is a no-op
        session.stop();
        assert_eq!(session.phase(), Phase::GameOver);
    }

    #[test]
    fn test_steering_command_overrides_player_velocity() {
        let mut session = session();
        let (tx, rx) = unbounded();
        session.start(Some(rx)).expect("start");

        // two samples before one tick: last wins
        tx.send(SensorSample { x: 0.0, y: 0.9, z: 0.0, at_ms: 0.0 }).unwrap();
        tx.send(SensorSample { x: 0.0, y: 0.5, z: 0.0, at_ms: 16.0 }).unwrap();
        session.tick(10.0);

        let player = session.player().expect("player id");
        let body_handle = session.entities().get(player).expect("entity").body;
        let body = session.world().body(body_handle).expect("body");
        assert!((body.vel.x - 0.5 * GYRO_STEER_GAIN).abs() < 1e-3);
        assert_eq!(body.vel.y, 0.0);
    }

    #[test]
    fn test_tilt_command_overrides_gravity() {
        let mut session = GameSession::new(WIDTH, HEIGHT, SessionPolicy::tilt_box(), 5);
        let (tx, rx) = unbounded();
        session.start(Some(rx)).expect("start");

        tx.send(SensorSample { x: 0.1, y: 0.2, z: 0.0, at_ms: 0.0 }).unwrap();
        session.tick(10.0);

        let gravity = session.world().gravity().vec;
        assert!((gravity.x - 0.2 * GYRO_GRAVITY_GAIN).abs() < 1e-6);
        assert!((gravity.y + 0.1 * GYRO_GRAVITY_GAIN).abs() < 1e-6);
    }

    #[test]
    fn test_dropped_sensor_stalls_input() {
        let mut session = session();
        let (tx, rx) = unbounded();
        session.start(Some(rx)).expect("start");
        tx.send(SensorSample { x: 0.0, y: 1.0, z: 0.0, at_ms: 0.0 }).unwrap();
        drop(tx);

        // final sample applies, then input stalls without ending the session
        session.tick(10.0);
        run_ms(&mut session, 200);
        assert_eq!(session.phase(), Phase::Running);
    }

    #[test]
    fn test_tick_outside_running_is_noop() {
        let mut session = session();
        session.tick(1000.0);
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.score(), 0);
        assert_eq!(session.clock_ms(), 0.0);
    }
}
