//! Game implementations for the Q-learning agent.
//!
//! Each game implements the `Environment` trait so the generic agent can
//! play and learn from it.
//!
//! ## Available Games
//!
//! - [`plane_war`]: A vertical arcade shooter with shaped per-frame rewards
//!
//! ## Adding New Games
//!
//! 1. Create a new module under `src/games/`
//! 2. Define a discrete state type implementing `StateKey`
//! 3. Define an action enum implementing `Action`
//! 4. Implement the `Environment` trait for the game world
//! 5. Add tests that pin down the transition and reward rules

pub mod plane_war;
