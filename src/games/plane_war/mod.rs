//! Plane War: a vertical shooter flown by a tabular Q-learning agent.
//!
//! ## Game Rules
//!
//! - A 480x640 field with the player pinned near the bottom edge
//! - One enemy on the field at a time, either small (fast) or large (slow)
//! - Each frame the player moves left, stays, moves right, or fires
//! - Shooting an enemy scores 10 (small) or 30 (large)
//! - Colliding with an enemy costs 20 points and one life
//! - The game ends when the last life is lost
//!
//! ## Learning Setup
//!
//! ```text
//! geometry ──abstract_state──▶ PlaneState ("left|near|small")
//!                                  │
//!                                  ▼
//!                     QAgent::choose (epsilon-greedy)
//!                                  │
//!                                  ▼
//!           PlaneWar::advance ──▶ FrameOutcome ──RewardShaper──▶ reward
//! ```
//!
//! The state space is 3 x 2 x 2 = 12 keys over 4 actions.

pub mod action;
pub mod config;
pub mod enemy;
pub mod reward;
pub mod session;
pub mod state;
pub mod world;

pub use action::PlaneAction;
pub use config::PlaneWarConfig;
pub use enemy::{Archetype, Enemy, EnemyKind};
pub use reward::{FrameOutcome, RewardShaper, RewardWeights};
pub use session::{
    FrameReport, InputSource, LineInput, Mode, Pilot, Session, SessionConfig, SessionOutcome,
    SessionSummary,
};
pub use state::{abstract_state, PlaneState, XRelation, YRelation};
pub use world::{Bullet, PlaneWar, Rect};
