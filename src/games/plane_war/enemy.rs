//! Enemy archetypes and spawning.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// The two kinds of enemy craft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Small, fast, cheap.
    Small,
    /// Large, slow, valuable.
    Large,
}

/// Fixed properties of an enemy kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Archetype {
    /// Side length of the square hitbox.
    pub size: i32,
    /// Pixels descended per frame.
    pub speed: i32,
    /// Reward for destroying it.
    pub reward: f64,
    /// Reward (negative) for colliding with it.
    pub penalty: f64,
}

const SMALL: Archetype = Archetype {
    size: 32,
    speed: 6,
    reward: 10.0,
    penalty: -20.0,
};

const LARGE: Archetype = Archetype {
    size: 64,
    speed: 3,
    reward: 30.0,
    penalty: -20.0,
};

impl EnemyKind {
    /// Both kinds.
    pub const ALL: [EnemyKind; 2] = [EnemyKind::Small, EnemyKind::Large];

    /// The archetype for this kind.
    pub fn archetype(self) -> Archetype {
        match self {
            EnemyKind::Small => SMALL,
            EnemyKind::Large => LARGE,
        }
    }

    /// Lower-case name used in state keys.
    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Small => "small",
            EnemyKind::Large => "large",
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The enemy currently on the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enemy {
    /// Kind, fixing size and speed.
    pub kind: EnemyKind,
    /// Left edge.
    pub x: i32,
    /// Top edge; negative while entering from above.
    pub y: i32,
}

impl Enemy {
    /// Spawn a uniformly random kind just above a field `width` wide.
    ///
    /// The left edge is uniform over positions that keep the whole craft on
    /// the field.
    pub fn spawn<R: Rng>(rng: &mut R, width: i32) -> Self {
        let kind = EnemyKind::ALL[rng.gen_range(0..EnemyKind::ALL.len())];
        let size = kind.archetype().size;
        Self {
            kind,
            x: rng.gen_range(0..=width - size),
            y: -size,
        }
    }

    /// Side length of the hitbox.
    pub fn size(&self) -> i32 {
        self.kind.archetype().size
    }

    /// Move down by this kind's speed.
    pub fn descend(&mut self) {
        self.y += self.kind.archetype().speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_archetypes() {
        let small = EnemyKind::Small.archetype();
        assert_eq!((small.size, small.speed), (32, 6));
        assert_eq!((small.reward, small.penalty), (10.0, -20.0));

        let large = EnemyKind::Large.archetype();
        assert_eq!((large.size, large.speed), (64, 3));
        assert_eq!((large.reward, large.penalty), (30.0, -20.0));
    }

    #[test]
    fn test_spawn_stays_on_field() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [false; 2];

        for _ in 0..1000 {
            let enemy = Enemy::spawn(&mut rng, 480);
            assert!(enemy.x >= 0 && enemy.x + enemy.size() <= 480);
            assert_eq!(enemy.y, -enemy.size());
            seen[enemy.kind as usize] = true;
        }
        assert_eq!(seen, [true, true]);
    }
}
