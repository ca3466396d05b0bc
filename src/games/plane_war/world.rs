//! Headless simulation of the playfield.
//!
//! Owns every piece of positional state (player, bullets, enemy, lives,
//! score) and exposes only the abstracted state to the agent.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::games::plane_war::action::PlaneAction;
use crate::games::plane_war::config::PlaneWarConfig;
use crate::games::plane_war::enemy::Enemy;
use crate::games::plane_war::reward::{FrameOutcome, RewardShaper};
use crate::games::plane_war::state::{abstract_state, PlaneState};
use crate::qlearn::env::{Environment, Step};

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub w: i32,
    /// Height.
    pub h: i32,
}

impl Rect {
    /// Create a rectangle.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Whether the interiors intersect. Touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

/// A player bullet, identified by its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bullet {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
}

/// The game world.
#[derive(Debug, Clone)]
pub struct PlaneWar {
    config: PlaneWarConfig,
    shaper: RewardShaper,
    player_x: i32,
    bullets: Vec<Bullet>,
    enemy: Enemy,
    lives: u32,
    score: i64,
    frame: u64,
    last_outcome: Option<FrameOutcome>,
    rng: StdRng,
}

impl PlaneWar {
    /// Create a world. `seed` fixes the spawn sequence.
    pub fn new(config: PlaneWarConfig, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let shaper = RewardShaper::new(config.rewards.clone(), config.width, config.player_size);
        let enemy = Enemy::spawn(&mut rng, config.width);

        Self {
            player_x: config.width / 2,
            bullets: Vec::new(),
            enemy,
            lives: config.lives,
            score: 0,
            frame: 0,
            last_outcome: None,
            shaper,
            config,
            rng,
        }
    }

    /// Apply `action` and advance the world by one frame.
    ///
    /// Order within a frame: move or fire, clamp, move bullets, move the
    /// enemy, resolve one bullet hit, resolve a collision with the player.
    /// A kill and a crash against the same enemy can land in one frame.
    pub fn advance(&mut self, action: PlaneAction) -> FrameOutcome {
        let cfg = &self.config;

        match action {
            PlaneAction::Left => self.player_x -= cfg.player_speed,
            PlaneAction::Right => self.player_x += cfg.player_speed,
            PlaneAction::Shoot => self.bullets.push(Bullet {
                x: self.player_x + cfg.player_size / 2 - cfg.bullet_width / 2,
                y: cfg.player_y(),
            }),
            PlaneAction::Stay => {}
        }
        self.player_x = self.player_x.clamp(0, cfg.max_player_x());

        let mut outcome = FrameOutcome::quiet(action, self.player_x, self.enemy.x);

        let bullet_speed = cfg.bullet_speed;
        self.bullets.retain_mut(|b| {
            b.y -= bullet_speed;
            b.y >= 0
        });

        self.enemy.descend();
        if self.enemy.y > self.config.height {
            outcome.escaped = true;
            self.respawn();
        }

        // Both checks use the enemy as it stood before any kill this frame
        let enemy_rect = self.enemy_rect();
        let kind = self.enemy.kind;

        if let Some(i) = self
            .bullets
            .iter()
            .position(|b| self.bullet_rect(b).overlaps(&enemy_rect))
        {
            self.bullets.remove(i);
            outcome.destroyed = Some(kind);
            self.score += kind.archetype().reward as i64;
            self.respawn();
        }

        if self.player_rect().overlaps(&enemy_rect) {
            outcome.collided = Some(kind);
            self.score += kind.archetype().penalty as i64;
            self.lives = self.lives.saturating_sub(1);

            if self.lives == 0 {
                outcome.game_over = true;
            } else if outcome.destroyed.is_none() {
                self.respawn();
            }
        }

        self.frame += 1;
        self.last_outcome = Some(outcome);
        outcome
    }

    fn respawn(&mut self) {
        self.enemy = Enemy::spawn(&mut self.rng, self.config.width);
    }

    /// Hitbox of the player.
    pub fn player_rect(&self) -> Rect {
        let size = self.config.player_size;
        Rect::new(self.player_x, self.config.player_y(), size, size)
    }

    /// Hitbox of the enemy.
    pub fn enemy_rect(&self) -> Rect {
        let size = self.enemy.size();
        Rect::new(self.enemy.x, self.enemy.y, size, size)
    }

    fn bullet_rect(&self, bullet: &Bullet) -> Rect {
        Rect::new(
            bullet.x,
            bullet.y,
            self.config.bullet_width,
            self.config.bullet_height,
        )
    }

    /// Place the player; clamped to the field.
    pub fn set_player_x(&mut self, x: i32) {
        self.player_x = x.clamp(0, self.config.max_player_x());
    }

    /// Replace the enemy on the field.
    pub fn set_enemy(&mut self, enemy: Enemy) {
        self.enemy = enemy;
    }

    /// Player left edge.
    pub fn player_x(&self) -> i32 {
        self.player_x
    }

    /// The enemy on the field.
    pub fn enemy(&self) -> &Enemy {
        &self.enemy
    }

    /// Bullets in flight.
    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    /// Lives remaining.
    pub fn lives(&self) -> u32 {
        self.lives
    }

    /// Accumulated score.
    pub fn score(&self) -> i64 {
        self.score
    }

    /// Frames advanced since the last reset.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Facts of the most recent frame.
    pub fn last_outcome(&self) -> Option<&FrameOutcome> {
        self.last_outcome.as_ref()
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &PlaneWarConfig {
        &self.config
    }

    /// Get reference to the reward shaper.
    pub fn shaper(&self) -> &RewardShaper {
        &self.shaper
    }
}

impl Environment for PlaneWar {
    type State = PlaneState;
    type Action = PlaneAction;

    fn observe(&self) -> PlaneState {
        abstract_state(
            self.player_x,
            self.enemy.x,
            self.enemy.y,
            self.enemy.kind,
            self.config.height,
        )
    }

    fn step(&mut self, action: PlaneAction) -> Step {
        let outcome = self.advance(action);
        Step {
            reward: self.shaper.shape(&outcome),
            terminal: outcome.game_over,
        }
    }

    fn is_terminal(&self) -> bool {
        self.lives == 0
    }

    fn reset(&mut self) {
        self.player_x = self.config.width / 2;
        self.bullets.clear();
        self.lives = self.config.lives;
        self.score = 0;
        self.frame = 0;
        self.last_outcome = None;
        self.respawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::plane_war::enemy::EnemyKind;

    fn world() -> PlaneWar {
        PlaneWar::new(PlaneWarConfig::default(), Some(1))
    }

    fn parked_enemy(kind: EnemyKind, x: i32) -> Enemy {
        // High enough that it cannot reach the player for a while
        Enemy { kind, x, y: -200 }
    }

    #[test]
    fn test_rect_overlap_is_strict() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(a.overlaps(&Rect::new(9, 9, 10, 10)));
        assert!(!a.overlaps(&Rect::new(10, 0, 10, 10)));
        assert!(!a.overlaps(&Rect::new(0, 10, 10, 10)));
    }

    #[test]
    fn test_initial_layout() {
        let w = world();
        assert_eq!(w.player_x(), 240);
        assert_eq!(w.lives(), 3);
        assert_eq!(w.score(), 0);
        assert_eq!(w.enemy().y, -w.enemy().size());
        assert!(!w.is_terminal());
    }

    #[test]
    fn test_movement_is_clamped() {
        let mut w = world();
        w.set_enemy(parked_enemy(EnemyKind::Large, 0));

        w.set_player_x(3);
        w.advance(PlaneAction::Left);
        assert_eq!(w.player_x(), 0);

        w.set_player_x(428);
        w.advance(PlaneAction::Right);
        assert_eq!(w.player_x(), 430);

        w.advance(PlaneAction::Left);
        assert_eq!(w.player_x(), 424);
    }

    #[test]
    fn test_bullets_rise_and_expire() {
        let mut w = world();
        w.set_enemy(parked_enemy(EnemyKind::Large, 0));
        w.set_player_x(300);

        w.advance(PlaneAction::Shoot);
        assert_eq!(w.bullets(), &[Bullet { x: 323, y: 541 }]);

        // 541 / 9 = 60.1: gone once y drops below zero
        for _ in 0..60 {
            w.advance(PlaneAction::Stay);
        }
        assert_eq!(w.bullets().len(), 1);
        assert_eq!(w.bullets()[0].y, 1);
        w.advance(PlaneAction::Stay);
        assert!(w.bullets().is_empty());
    }

    #[test]
    fn test_bullet_destroys_enemy() {
        let mut w = world();
        w.set_player_x(200);
        // Large enemy right above the nose, close enough to be hit at once
        w.set_enemy(Enemy {
            kind: EnemyKind::Large,
            x: 200,
            y: 480,
        });

        let outcome = w.advance(PlaneAction::Shoot);
        assert_eq!(outcome.destroyed, Some(EnemyKind::Large));
        assert_eq!(outcome.collided, None);
        assert_eq!(w.score(), 30);
        assert!(w.bullets().is_empty());
        assert!(w.enemy().y < 0);

        let reward = w.shaper().shape(&outcome);
        assert!((reward - 30.2).abs() < 1e-9);
    }

    #[test]
    fn test_one_kill_per_frame() {
        let mut w = world();
        w.set_player_x(200);
        w.set_enemy(parked_enemy(EnemyKind::Large, 0));
        w.advance(PlaneAction::Shoot);
        w.advance(PlaneAction::Shoot);
        assert_eq!(w.bullets().len(), 2);

        // Both bullets now sit inside this hitbox
        w.set_enemy(Enemy {
            kind: EnemyKind::Large,
            x: 190,
            y: 470,
        });
        let outcome = w.advance(PlaneAction::Stay);
        assert_eq!(outcome.destroyed, Some(EnemyKind::Large));
        assert_eq!(w.bullets().len(), 1);
        assert_eq!(w.score(), 30);
    }

    #[test]
    fn test_kill_and_crash_in_one_frame() {
        let mut w = world();
        w.set_player_x(200);
        w.set_enemy(Enemy {
            kind: EnemyKind::Large,
            x: 200,
            y: 497,
        });

        let outcome = w.advance(PlaneAction::Shoot);
        assert_eq!(outcome.destroyed, Some(EnemyKind::Large));
        assert_eq!(outcome.collided, Some(EnemyKind::Large));
        assert_eq!(w.lives(), 2);
        assert_eq!(w.score(), 10);
        assert!(w.enemy().y < 0);

        // aligned + kill + crash
        let reward = w.shaper().shape(&outcome);
        assert!((reward - 10.2).abs() < 1e-9);
    }

    #[test]
    fn test_kill_on_last_life_still_ends_game() {
        let config = PlaneWarConfig::default().with_lives(1);
        let mut w = PlaneWar::new(config, Some(1));
        w.set_player_x(200);
        w.set_enemy(Enemy {
            kind: EnemyKind::Large,
            x: 200,
            y: 497,
        });

        let step = w.step(PlaneAction::Shoot);
        assert!(step.terminal);
        assert!(w.is_terminal());
        assert_eq!(w.score(), 10);
        assert_eq!(w.last_outcome().map(|o| o.game_over), Some(true));
    }

    #[test]
    fn test_collision_costs_a_life() {
        let mut w = world();
        w.set_player_x(200);
        w.set_enemy(Enemy {
            kind: EnemyKind::Small,
            x: 210,
            y: 530,
        });

        let outcome = w.advance(PlaneAction::Stay);
        assert_eq!(outcome.collided, Some(EnemyKind::Small));
        assert!(!outcome.game_over);
        assert_eq!(w.lives(), 2);
        assert_eq!(w.score(), -20);
        assert!(w.enemy().y < 0);

        // stay + aligned + crash
        let reward = w.shaper().shape(&outcome);
        assert!((reward - (-0.1 + 0.2 - 20.0)).abs() < 1e-9);
    }

    #[test]
    fn test_third_collision_ends_game() {
        let mut w = world();
        w.set_player_x(200);

        for expected_lives in [2, 1, 0] {
            w.set_enemy(Enemy {
                kind: EnemyKind::Large,
                x: 200,
                y: 500,
            });
            let step = w.step(PlaneAction::Left);
            assert_eq!(w.lives(), expected_lives);
            assert_eq!(step.terminal, expected_lives == 0);
        }
        assert!(w.is_terminal());
        assert_eq!(w.score(), -60);

        w.reset();
        assert!(!w.is_terminal());
        assert_eq!(w.lives(), 3);
        assert_eq!(w.score(), 0);
        assert_eq!(w.frame(), 0);
    }

    #[test]
    fn test_enemy_escapes_below_field() {
        let mut w = world();
        w.set_player_x(0);
        w.set_enemy(Enemy {
            kind: EnemyKind::Small,
            x: 400,
            y: 636,
        });

        let outcome = w.advance(PlaneAction::Right);
        assert!(outcome.escaped);
        assert_eq!(w.lives(), 3);
        assert_eq!(w.score(), 0);
        assert!(w.enemy().y < 0);
    }

    #[test]
    fn test_observe_matches_abstraction() {
        let mut w = world();
        w.set_player_x(100);
        w.set_enemy(Enemy {
            kind: EnemyKind::Small,
            x: 300,
            y: 400,
        });
        assert_eq!(
            w.observe(),
            abstract_state(100, 300, 400, EnemyKind::Small, 640)
        );
    }

    #[test]
    fn test_seeded_worlds_replay_identically() {
        let mut a = PlaneWar::new(PlaneWarConfig::default(), Some(99));
        let mut b = PlaneWar::new(PlaneWarConfig::default(), Some(99));
        let script = [
            PlaneAction::Left,
            PlaneAction::Shoot,
            PlaneAction::Right,
            PlaneAction::Stay,
        ];

        for i in 0..2_000 {
            if a.is_terminal() {
                break;
            }
            let action = script[i % script.len()];
            assert_eq!(a.step(action), b.step(action));
            assert_eq!(a.observe(), b.observe());
        }
    }
}
