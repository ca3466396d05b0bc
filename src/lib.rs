//! # Plane War RL
//!
//! A tabular Q-learning agent that learns to fly the Plane War arcade
//! shooter.
//!
//! ## Features
//!
//! - **Generic Agent**: Works with any game implementing the `Environment` trait
//! - **Epsilon-Greedy Policy**: Multiplicative exploration decay with a floor
//! - **Shaped Rewards**: Dense per-frame signal on top of kill and crash scores
//! - **Persistent Table**: Values survive restarts and are saved atomically
//! - **Two Modes**: The agent learns while flying, or a human flies untouched
//!
//! ## Quick Start
//!
//! ```ignore
//! use plane_war_rl::{AgentConfig, QAgent};
//! use plane_war_rl::games::plane_war::{Pilot, PlaneAction, Session, SessionConfig};
//!
//! let config = SessionConfig::default();
//! let mut agent = QAgent::<PlaneAction>::with_store_path(config.agent.clone(), "q_table.json");
//!
//! let mut session = Session::new(&config, None);
//! let summary = session.run(Pilot::Agent(&mut agent), |report| println!("{}", report));
//! ```
//!
//! ## Modules
//!
//! - [`qlearn`]: Core Q-learning agent and value storage
//! - [`games`]: Game implementations (Plane War)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      QAgent (Generic)                           │
//! │  - Epsilon-greedy choice   - One-step value update              │
//! │  - Exploration decay       - Batched table persistence          │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ implements Environment trait
//!                               ▼
//!                        ┌─────────────┐
//!                        │  Plane War  │
//!                        │  world +    │
//!                        │  shaping    │
//!                        └─────────────┘
//! ```

#![warn(missing_docs)]

/// Q-learning agent module.
///
/// This is the core module containing the generic learner.
pub mod qlearn;

/// Game implementations module.
///
/// Contains the Plane War shooter.
pub mod games;

// Re-export commonly used types at crate root for convenience
pub use qlearn::{
    Action, AgentConfig, AgentStats, Environment, QAgent, StateKey, Step, ValueStore,
};
