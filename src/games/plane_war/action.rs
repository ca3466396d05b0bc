//! Player actions.

use std::fmt;

use crate::qlearn::env::Action;

/// The four moves available each frame.
///
/// The declaration order is the enumeration order greedy selection uses to
/// break ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneAction {
    /// Move left by the player speed.
    Left,
    /// Hold position.
    Stay,
    /// Move right by the player speed.
    Right,
    /// Fire a bullet from the nose of the craft.
    Shoot,
}

impl Action for PlaneAction {
    const ALL: &'static [Self] = &[
        PlaneAction::Left,
        PlaneAction::Stay,
        PlaneAction::Right,
        PlaneAction::Shoot,
    ];

    fn index(self) -> usize {
        match self {
            PlaneAction::Left => 0,
            PlaneAction::Stay => 1,
            PlaneAction::Right => 2,
            PlaneAction::Shoot => 3,
        }
    }

    fn name(self) -> &'static str {
        match self {
            PlaneAction::Left => "LEFT",
            PlaneAction::Stay => "STAY",
            PlaneAction::Right => "RIGHT",
            PlaneAction::Shoot => "SHOOT",
        }
    }
}

impl PlaneAction {
    /// Map an input token to an action.
    ///
    /// Accepts single letters (`l`, `s`, `r`, `f`) and full words, in any
    /// case. Anything unrecognised is treated as no key pressed.
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "l" | "left" | "a" => PlaneAction::Left,
            "r" | "right" | "d" => PlaneAction::Right,
            "f" | "fire" | "shoot" | "space" | "x" => PlaneAction::Shoot,
            _ => PlaneAction::Stay,
        }
    }
}

impl fmt::Display for PlaneAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_order() {
        for (i, &action) in PlaneAction::ALL.iter().enumerate() {
            assert_eq!(action.index(), i);
            assert_eq!(PlaneAction::from_index(i), action);
        }
        assert_eq!(
            PlaneAction::names(),
            vec!["LEFT", "STAY", "RIGHT", "SHOOT"]
        );
    }

    #[test]
    fn test_tokens() {
        assert_eq!(PlaneAction::from_token("L"), PlaneAction::Left);
        assert_eq!(PlaneAction::from_token("right"), PlaneAction::Right);
        assert_eq!(PlaneAction::from_token("fire"), PlaneAction::Shoot);
        assert_eq!(PlaneAction::from_token("s"), PlaneAction::Stay);
        assert_eq!(PlaneAction::from_token("jump"), PlaneAction::Stay);
    }
}
