//! Tabular Q-learning.
//!
//! This module provides a generic one-step Q-learning agent for any game
//! implementing the `Environment` trait.
//!
//! # Overview
//!
//! The agent keeps a sparse table of action values keyed by a discrete
//! state string. Each frame it:
//! 1. Observes the state and picks an action epsilon-greedily
//! 2. Applies the action and receives a reward
//! 3. Updates the value of the pair it just tried
//! 4. Decays the exploration rate toward its floor
//!
//! # Update Rule
//!
//! ```text
//! Q(s, a) <- Q(s, a) + alpha * (r + gamma * max_a' Q(s', a') - Q(s, a))
//! epsilon <- max(epsilon_min, epsilon * decay)
//! ```
//!
//! Unseen states read as all zeros. Greedy ties go to the first action in
//! declaration order.
//!
//! # Example
//!
//! ```ignore
//! use plane_war_rl::qlearn::{AgentConfig, QAgent};
//! use plane_war_rl::games::plane_war::{PlaneAction, PlaneWar, PlaneWarConfig};
//!
//! let mut agent = QAgent::<PlaneAction>::with_store_path(AgentConfig::default(), "q_table.json");
//! let mut world = PlaneWar::new(PlaneWarConfig::default(), None);
//!
//! let episode = agent.run_episode(&mut world, None);
//! agent.flush()?;
//! println!("{} frames, reward {:.1}", episode.frames, episode.total_reward);
//! ```

pub mod agent;
pub mod config;
pub mod env;
pub mod storage;

// Re-export main types for convenient access
pub use agent::{EpisodeStats, FrameResult, QAgent};
pub use config::{AgentConfig, AgentStats, ConfigError};
pub use env::{Action, Environment, StateKey, Step, Transition};
pub use storage::{StoreError, ValueStore, ValueStoreExport};
