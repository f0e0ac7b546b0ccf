//! Game simulation
//!
//! - `entities`: slot-arena entity store (bodies + display metadata)
//! - `systems`: the fixed-order per-tick pipeline
//! - `session`: session state machine, interval timers, teardown

pub mod entities;
pub mod session;
pub mod systems;

pub use entities::{Category, ColorToken, Entity, EntityArena, EntityId, RenderShape, VisualSize};
pub use session::{GameSession, Phase, SessionError};
pub use systems::{FrameContext, GameEvent, SpawnState};

use crate::consts::PLAYER_ROW_OFFSET;

/// Screen dimensions the session was started with (px)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    pub width: f32,
    pub height: f32,
}

impl Screen {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Vertical coordinate of the player's fixed row
    pub fn player_row(&self) -> f32 {
        self.height - PLAYER_ROW_OFFSET
    }

    /// Player start coordinate: centered on the row
    pub fn player_start(&self) -> glam::Vec2 {
        glam::Vec2::new(self.width / 2.0, self.player_row())
    }
}
