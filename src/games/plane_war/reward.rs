//! Reward shaping.
//!
//! Every frame gets a dense reward built from independent additive terms,
//! so the learner sees signal long before the first kill or crash.

use serde::{Deserialize, Serialize};

use crate::games::plane_war::action::PlaneAction;
use crate::games::plane_war::enemy::EnemyKind;

/// Weights and thresholds of the shaping terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    /// Added when the action is Stay.
    pub stay: f64,

    /// Added when the horizontal distance is below `aligned_distance`.
    pub aligned: f64,

    /// Exclusive upper bound on distance for the aligned bonus.
    pub aligned_distance: i32,

    /// Added when shooting from farther than `wasted_shot_distance`.
    pub wasted_shot: f64,

    /// Exclusive lower bound on distance for the wasted-shot penalty.
    pub wasted_shot_distance: i32,

    /// Added when the player is within `edge_margin` of either edge.
    pub edge: f64,

    /// Added on top of `edge` when the player stays at an edge.
    pub edge_idle: f64,

    /// Pixels from a wall that count as touching it.
    pub edge_margin: i32,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            stay: -0.1,
            aligned: 0.2,
            aligned_distance: 20,
            wasted_shot: -0.2,
            wasted_shot_distance: 30,
            edge: -0.3,
            edge_idle: -0.3,
            edge_margin: 5,
        }
    }
}

/// Facts about one frame that the shaper scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    /// Action applied this frame.
    pub action: PlaneAction,
    /// Player left edge after the move.
    pub player_x: i32,
    /// Enemy left edge this frame.
    pub enemy_x: i32,
    /// Kind of the enemy a bullet destroyed, if any.
    pub destroyed: Option<EnemyKind>,
    /// Kind of the enemy the player collided with, if any.
    pub collided: Option<EnemyKind>,
    /// Whether the enemy left through the bottom of the field.
    pub escaped: bool,
    /// Whether this frame used up the last life.
    pub game_over: bool,
}

impl FrameOutcome {
    /// A quiet frame: no kill, no crash.
    pub fn quiet(action: PlaneAction, player_x: i32, enemy_x: i32) -> Self {
        Self {
            action,
            player_x,
            enemy_x,
            destroyed: None,
            collided: None,
            escaped: false,
            game_over: false,
        }
    }
}

/// Computes the per-frame reward.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardShaper {
    weights: RewardWeights,
    max_player_x: i32,
}

impl Default for RewardShaper {
    fn default() -> Self {
        Self::new(RewardWeights::default(), 480, 50)
    }
}

impl RewardShaper {
    /// Create a shaper for a field `width` wide with a player `player_size` wide.
    pub fn new(weights: RewardWeights, width: i32, player_size: i32) -> Self {
        Self {
            weights,
            max_player_x: width - player_size,
        }
    }

    /// Whether the player is pressed against a wall.
    pub fn at_edge(&self, player_x: i32) -> bool {
        let margin = self.weights.edge_margin;
        player_x <= margin || player_x >= self.max_player_x - margin
    }

    /// Sum every applicable term for `outcome`. The result is not clipped.
    pub fn shape(&self, outcome: &FrameOutcome) -> f64 {
        let w = &self.weights;
        let distance = (outcome.player_x - outcome.enemy_x).abs();
        let staying = outcome.action == PlaneAction::Stay;
        let at_edge = self.at_edge(outcome.player_x);

        let mut reward = 0.0;

        if staying {
            reward += w.stay;
        }
        if distance < w.aligned_distance {
            reward += w.aligned;
        }
        if outcome.action == PlaneAction::Shoot && distance > w.wasted_shot_distance {
            reward += w.wasted_shot;
        }
        if at_edge {
            reward += w.edge;
        }
        if staying && at_edge {
            reward += w.edge_idle;
        }
        if let Some(kind) = outcome.destroyed {
            reward += kind.archetype().reward;
        }
        if let Some(kind) = outcome.collided {
            reward += kind.archetype().penalty;
        }

        reward
    }

    /// Get the shaping weights.
    pub fn weights(&self) -> &RewardWeights {
        &self.weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_stay_near_enemy() {
        let shaper = RewardShaper::default();
        let outcome = FrameOutcome::quiet(PlaneAction::Stay, 200, 210);
        assert_eq!(shaper.shape(&outcome), 0.1);
    }

    #[test]
    fn test_moving_far_from_enemy_is_neutral() {
        let shaper = RewardShaper::default();
        assert_eq!(shaper.shape(&FrameOutcome::quiet(PlaneAction::Left, 200, 300)), 0.0);
        assert_eq!(shaper.shape(&FrameOutcome::quiet(PlaneAction::Right, 200, 180)), 0.0);
    }

    #[test]
    fn test_shot_distance_terms() {
        let shaper = RewardShaper::default();
        // Distance 31: wasted
        assert!(approx(shaper.shape(&FrameOutcome::quiet(PlaneAction::Shoot, 200, 231)), -0.2));
        // Distance 30: neither wasted nor aligned
        assert_eq!(shaper.shape(&FrameOutcome::quiet(PlaneAction::Shoot, 200, 230)), 0.0);
        // Distance 19: aligned
        assert!(approx(shaper.shape(&FrameOutcome::quiet(PlaneAction::Shoot, 200, 181)), 0.2));
    }

    #[test]
    fn test_edge_penalties_stack() {
        let shaper = RewardShaper::default();
        assert!(shaper.at_edge(0));
        assert!(shaper.at_edge(5));
        assert!(!shaper.at_edge(6));
        assert!(!shaper.at_edge(424));
        assert!(shaper.at_edge(425));
        assert!(shaper.at_edge(430));

        // Moving into the left wall
        assert!(approx(shaper.shape(&FrameOutcome::quiet(PlaneAction::Left, 0, 300)), -0.3));
        // Staying at the right wall: stay + edge + idle edge
        assert!(approx(shaper.shape(&FrameOutcome::quiet(PlaneAction::Stay, 430, 100)), -0.7));
    }

    #[test]
    fn test_kill_and_crash_terms() {
        let shaper = RewardShaper::default();

        let mut kill = FrameOutcome::quiet(PlaneAction::Shoot, 200, 205);
        kill.destroyed = Some(EnemyKind::Large);
        assert!(approx(shaper.shape(&kill), 30.2));

        let mut crash = FrameOutcome::quiet(PlaneAction::Right, 200, 260);
        crash.collided = Some(EnemyKind::Small);
        assert!(approx(shaper.shape(&crash), -20.0));
    }

    #[test]
    fn test_custom_weights() {
        let weights = RewardWeights {
            stay: -1.0,
            ..Default::default()
        };
        let shaper = RewardShaper::new(weights, 480, 50);
        assert!(approx(shaper.shape(&FrameOutcome::quiet(PlaneAction::Stay, 200, 300)), -1.0));
    }
}
