//! Playfield configuration.

use serde::{Deserialize, Serialize};

use crate::games::plane_war::enemy::EnemyKind;
use crate::games::plane_war::reward::RewardWeights;
use crate::qlearn::ConfigError;

/// Geometry and physics of the playfield.
///
/// Defaults reproduce the classic 480x640 layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneWarConfig {
    /// Field width in pixels.
    pub width: i32,

    /// Field height in pixels.
    pub height: i32,

    /// Side length of the player's square hitbox.
    pub player_size: i32,

    /// Distance from the bottom of the field to the player's top edge.
    pub player_offset: i32,

    /// Pixels moved per Left/Right frame.
    pub player_speed: i32,

    /// Pixels a bullet rises per frame.
    pub bullet_speed: i32,

    /// Bullet hitbox width.
    pub bullet_width: i32,

    /// Bullet hitbox height.
    pub bullet_height: i32,

    /// Lives at the start of a session.
    pub lives: u32,

    /// Reward shaping terms.
    pub rewards: RewardWeights,
}

impl Default for PlaneWarConfig {
    fn default() -> Self {
        Self {
            width: 480,
            height: 640,
            player_size: 50,
            player_offset: 90,
            player_speed: 6,
            bullet_speed: 9,
            bullet_width: 4,
            bullet_height: 12,
            lives: 3,
            rewards: RewardWeights::default(),
        }
    }
}

impl PlaneWarConfig {
    /// Top edge of the player's hitbox.
    pub fn player_y(&self) -> i32 {
        self.height - self.player_offset
    }

    /// Largest legal left edge for the player.
    pub fn max_player_x(&self) -> i32 {
        self.width - self.player_size
    }

    /// Builder method: set the number of lives.
    pub fn with_lives(mut self, lives: u32) -> Self {
        self.lives = lives;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let widest_enemy = EnemyKind::ALL
            .iter()
            .map(|k| k.archetype().size)
            .max()
            .unwrap_or(0);

        if self.width < self.player_size || self.width < widest_enemy {
            return Err(ConfigError::Playfield(format!(
                "width {} cannot fit the player ({}) and enemies ({})",
                self.width, self.player_size, widest_enemy
            )));
        }
        if self.height <= 0 || self.player_offset <= 0 || self.player_offset > self.height {
            return Err(ConfigError::Playfield(format!(
                "player offset {} must lie within height {}",
                self.player_offset, self.height
            )));
        }
        if self.player_size <= 0 || self.bullet_width <= 0 || self.bullet_height <= 0 {
            return Err(ConfigError::Playfield("sizes must be positive".to_string()));
        }
        if self.player_speed < 0 || self.bullet_speed <= 0 {
            return Err(ConfigError::Playfield(format!(
                "speeds must be positive (player {}, bullet {})",
                self.player_speed, self.bullet_speed
            )));
        }
        if self.lives == 0 {
            return Err(ConfigError::Playfield("lives must be at least 1".to_string()));
        }

        Ok(())
    }
}
