//! Tilt Dodge - sensor-driven minigame core
//!
//! Core modules:
//! - `world`: rigid-body world adapter (gravity, boundaries, dynamic bodies)
//! - `sim`: entity store, per-tick system pipeline, and the session controller
//! - `input`: sensor sample bridge (gyroscope/accelerometer -> control commands)
//! - `speedo`: accelerometer speedometer readout
//! - `settings`: host-facing configuration and variant policy presets
//!
//! Rendering and platform sensor plumbing are the host's job: the host feeds
//! `SensorSample`s into a channel, calls `GameSession::tick` once per rendered
//! frame, and draws each entity at its body's current position.

pub mod input;
pub mod settings;
pub mod sim;
pub mod speedo;
pub mod world;

pub use input::{ControlMapping, SensorSample};
pub use settings::{SessionPolicy, Settings};
pub use sim::{GameEvent, GameSession, Phase};

/// Game configuration constants
pub mod consts {
    /// Display-synchronized tick interval (60 Hz reference cadence)
    pub const TICK_MS: f64 = 1000.0 / 60.0;

    /// Player disc radius
    pub const PLAYER_RADIUS: f32 = 25.0;
    /// Height of the player's fixed row above the bottom screen edge
    pub const PLAYER_ROW_OFFSET: f32 = 120.0;

    /// Obstacle extents (width and height) are drawn from [MIN, MAX)
    pub const OBSTACLE_MIN_EXTENT: f32 = 30.0;
    pub const OBSTACLE_MAX_EXTENT: f32 = 70.0;
    /// Minimum interval between obstacle spawns
    pub const SPAWN_INTERVAL_MS: f64 = 1000.0;
    /// Obstacles past `screen_height + DESPAWN_MARGIN` are reclaimed
    pub const DESPAWN_MARGIN: f32 = 100.0;
    /// Collision group shared by all obstacles
    pub const OBSTACLE_GROUP: i32 = -1;

    /// Obstacle body tuning: soft bounce, near-zero contact friction,
    /// light frame-rate-scaled air drag
    pub const OBSTACLE_RESTITUTION: f32 = 0.1;
    pub const OBSTACLE_FRICTION: f32 = 0.001;
    pub const OBSTACLE_AIR_DRAG: f32 = 0.01;

    /// Score ticks up once per interval while running
    pub const SCORE_INTERVAL_MS: f64 = 100.0;
    /// Gravity ramps once per interval while running
    pub const DIFFICULTY_INTERVAL_MS: f64 = 1000.0;
    /// Baseline gravity magnitude (world units)
    pub const GRAVITY_BASE: f32 = 1.0;
    /// World gravity units -> px/s^2
    pub const GRAVITY_SCALE: f32 = 1000.0;

    /// Reference sensor sampling interval
    pub const SENSOR_INTERVAL_MS: f64 = 16.0;
    /// Gyro y-rate -> horizontal player velocity (px/s per rad/s)
    pub const GYRO_STEER_GAIN: f32 = 400.0;
    /// Gyro rate -> gravity direction gain
    pub const GYRO_GRAVITY_GAIN: f32 = 2.0;
}
