//! Environment traits for the Q-learning agent.
//!
//! Any game that implements `Environment` can be played and learned by a
//! `QAgent`. This keeps the learning rule separate from game physics.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for the closed set of actions an agent can choose from.
///
/// `ALL` fixes the enumeration order. Greedy selection breaks ties in favour
/// of the earliest action in this order, and the value table stores one
/// value per action at the matching index.
pub trait Action: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Every action, in the fixed enumeration order.
    const ALL: &'static [Self];

    /// Position of this action in `ALL`.
    fn index(self) -> usize;

    /// Stable name used in the persisted value table.
    fn name(self) -> &'static str;

    /// Action at `index` in `ALL`.
    fn from_index(index: usize) -> Self {
        Self::ALL[index]
    }

    /// Names of every action, in enumeration order.
    fn names() -> Vec<String> {
        Self::ALL.iter().map(|a| a.name().to_string()).collect()
    }
}

/// Trait for discrete states the agent keys its value table by.
///
/// Two observations that should share learned values must produce the same
/// key.
pub trait StateKey: Clone + Eq + Hash + Debug {
    /// Generate the unique string key for this state.
    fn key(&self) -> String;
}

/// Result of advancing an environment by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Shaped reward for the frame.
    pub reward: f64,
    /// Whether the episode ended on this frame.
    pub terminal: bool,
}

/// The interface between the agent and a game world.
///
/// # Example
/// ```ignore
/// impl Environment for MyGame {
///     type State = MyState;
///     type Action = MyAction;
///
///     fn observe(&self) -> MyState { /* ... */ }
///     fn step(&mut self, action: MyAction) -> Step { /* ... */ }
///     fn is_terminal(&self) -> bool { /* ... */ }
///     fn reset(&mut self) { /* ... */ }
/// }
/// ```
pub trait Environment {
    /// The discrete state exposed to the agent.
    type State: StateKey;

    /// The action type the environment accepts.
    type Action: Action;

    /// Discretize the current world into a state.
    ///
    /// Must be a pure function of the current world, never of its history.
    fn observe(&self) -> Self::State;

    /// Apply `action`, advance the world by one frame and score it.
    fn step(&mut self, action: Self::Action) -> Step;

    /// Whether the episode is over.
    fn is_terminal(&self) -> bool;

    /// Start a fresh episode.
    fn reset(&mut self);
}

/// A single observed transition, consumed once by the learner.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S, A> {
    /// State the action was chosen in.
    pub state: S,
    /// The chosen action.
    pub action: A,
    /// Reward observed for the frame.
    pub reward: f64,
    /// State after the world advanced.
    pub next_state: S,
}
