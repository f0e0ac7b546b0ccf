//! Session policy and host-facing settings
//!
//! The game's screen variants differ only in gravity handling, ceiling
//! presence, and collision grouping. Those knobs are consolidated here into
//! one serializable policy struct with named presets; the host picks a preset
//! (or loads a JSON settings file) and hands it to the session controller.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::OBSTACLE_GROUP;
use crate::input::ControlMapping;

/// Variant knobs for a game session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionPolicy {
    /// Solid top boundary; obstacles spawn just below it instead of
    /// free-falling from above the visible area
    pub has_ceiling: bool,
    /// Gravity multiplier applied to obstacle bodies
    pub obstacle_gravity_scale: f32,
    /// Collision group for the player body: 0 or the obstacle group lets
    /// obstacles shove the player around; any other nonzero group leaves the
    /// pair physically inert so contact only ends the game
    pub player_collision_group: i32,
    /// Gravity magnitude added per difficulty step (one step per second)
    pub difficulty_ramp_per_second: f32,
    /// Sensor axis mapping
    pub control_mapping: ControlMapping,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::dodge()
    }
}

impl SessionPolicy {
    /// The dodge screen: steered player, open top and bottom, inert player
    /// group, ramping difficulty
    pub fn dodge() -> Self {
        Self {
            has_ceiling: false,
            obstacle_gravity_scale: 1.0,
            player_collision_group: 2,
            difficulty_ramp_per_second: 0.05,
            control_mapping: ControlMapping::GyroToVelocity,
        }
    }

    /// The tilt-box screen: gravity follows the device, closed box, the
    /// player is shoved like everything else, no ramp
    pub fn tilt_box() -> Self {
        Self {
            has_ceiling: true,
            obstacle_gravity_scale: 1.0,
            player_collision_group: 0,
            difficulty_ramp_per_second: 0.0,
            control_mapping: ControlMapping::GyroToGravity,
        }
    }

    /// Whether obstacles physically push the player under this policy
    pub fn player_is_pushable(&self) -> bool {
        self.player_collision_group == 0 || self.player_collision_group == OBSTACLE_GROUP
    }
}

/// Host-facing settings: screen geometry, RNG seed, and the variant policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub screen_width: f32,
    pub screen_height: f32,
    pub seed: u64,
    pub policy: SessionPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // portrait phone reference
            screen_width: 400.0,
            screen_height: 800.0,
            seed: 0x7117_d0d6e,
            policy: SessionPolicy::default(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load settings from a JSON file, falling back to defaults when the file
    /// is missing or malformed
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    log::warn!("Ignoring malformed settings {}: {}", path.display(), err);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }
}
