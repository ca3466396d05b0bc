//! State abstraction.
//!
//! Maps continuous geometry to one of 12 discrete states: horizontal
//! relation (3) x vertical relation (2) x enemy kind (2).

use std::fmt;

use crate::games::plane_war::enemy::EnemyKind;
use crate::qlearn::env::StateKey;

/// Horizontal offsets beyond this many pixels leave the center band.
pub const X_BAND: i32 = 40;

/// An enemy below this percentage of the field height is near.
pub const NEAR_PERCENT: i64 = 55;

/// Where the enemy is horizontally, relative to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XRelation {
    /// Enemy more than `X_BAND` pixels to the left.
    Left,
    /// Within the band.
    Center,
    /// Enemy more than `X_BAND` pixels to the right.
    Right,
}

/// Whether the enemy is close to the player's row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YRelation {
    /// Past `NEAR_PERCENT` of the field height.
    Near,
    /// Still in the upper part of the field.
    Far,
}

/// Discrete state used as the learning key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaneState {
    /// Horizontal relation.
    pub x: XRelation,
    /// Vertical relation.
    pub y: YRelation,
    /// Kind of the enemy on the field.
    pub kind: EnemyKind,
}

impl XRelation {
    fn name(self) -> &'static str {
        match self {
            XRelation::Left => "left",
            XRelation::Center => "center",
            XRelation::Right => "right",
        }
    }
}

impl YRelation {
    fn name(self) -> &'static str {
        match self {
            YRelation::Near => "near",
            YRelation::Far => "far",
        }
    }
}

impl StateKey for PlaneState {
    fn key(&self) -> String {
        format!("{}|{}|{}", self.x.name(), self.y.name(), self.kind.name())
    }
}

impl fmt::Display for PlaneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Discretize the player/enemy geometry.
///
/// `dx = enemy_x - player_x`: below `-X_BAND` is left, above `X_BAND` is
/// right, anything else (bounds included) is center. The enemy is near once
/// `enemy_y` is strictly past `NEAR_PERCENT` of `height`.
pub fn abstract_state(
    player_x: i32,
    enemy_x: i32,
    enemy_y: i32,
    kind: EnemyKind,
    height: i32,
) -> PlaneState {
    let dx = enemy_x - player_x;
    let x = if dx < -X_BAND {
        XRelation::Left
    } else if dx > X_BAND {
        XRelation::Right
    } else {
        XRelation::Center
    };

    let y = if i64::from(enemy_y) * 100 > i64::from(height) * NEAR_PERCENT {
        YRelation::Near
    } else {
        YRelation::Far
    };

    PlaneState { x, y, kind }
}
