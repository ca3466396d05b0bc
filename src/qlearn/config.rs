//! Configuration options for the Q-learning agent.
//!
//! This module provides the learning hyperparameters, the exploration
//! schedule and the persistence cadence.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for the Q-learning agent.
///
/// # Example
/// ```
/// use plane_war_rl::qlearn::AgentConfig;
///
/// let config = AgentConfig::default();
/// assert_eq!(config.alpha, 0.1);
/// assert_eq!(config.gamma, 0.9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Learning rate.
    pub alpha: f64,

    /// Discount factor applied to the best next-state value.
    pub gamma: f64,

    /// Exploration rate at the start of a process.
    pub initial_exploration: f64,

    /// Floor the exploration rate never decays below.
    pub min_exploration: f64,

    /// Multiplicative decay applied after every learning update.
    ///
    /// Decay is per update, so a faster frame rate anneals faster in
    /// wall-clock time.
    pub exploration_decay: f64,

    /// Save the value table every this many updates.
    ///
    /// `Some(1)` saves after every update. `None` only saves on an explicit
    /// flush.
    pub persist_every: Option<u64>,

    /// Random seed for reproducibility.
    ///
    /// If `None`, the agent seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            initial_exploration: 1.0,
            min_exploration: 0.05,
            exploration_decay: 0.995,
            persist_every: Some(600),
            seed: None,
        }
    }
}

impl AgentConfig {
    /// Create a new AgentConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration that never explores, for evaluating a trained table.
    pub fn greedy() -> Self {
        Self {
            initial_exploration: 0.0,
            min_exploration: 0.0,
            ..Default::default()
        }
    }

    /// Builder method: set the learning rate.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Builder method: set the discount factor.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Builder method: set the starting exploration rate.
    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.initial_exploration = exploration.clamp(0.0, 1.0);
        self
    }

    /// Builder method: set the exploration floor.
    pub fn with_min_exploration(mut self, min: f64) -> Self {
        self.min_exploration = min.clamp(0.0, 1.0);
        self
    }

    /// Builder method: set how often the table is persisted.
    pub fn with_persist_every(mut self, updates: Option<u64>) -> Self {
        self.persist_every = updates;
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ConfigError::OutOfRange("alpha", self.alpha));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::OutOfRange("gamma", self.gamma));
        }
        if !(0.0..=1.0).contains(&self.initial_exploration) {
            return Err(ConfigError::OutOfRange(
                "initial_exploration",
                self.initial_exploration,
            ));
        }
        if !(0.0..=1.0).contains(&self.min_exploration) {
            return Err(ConfigError::OutOfRange("min_exploration", self.min_exploration));
        }
        if self.min_exploration > self.initial_exploration {
            return Err(ConfigError::ExplorationBounds {
                min: self.min_exploration,
                initial: self.initial_exploration,
            });
        }
        if !(self.exploration_decay > 0.0 && self.exploration_decay <= 1.0) {
            return Err(ConfigError::OutOfRange(
                "exploration_decay",
                self.exploration_decay,
            ));
        }
        if self.persist_every == Some(0) {
            return Err(ConfigError::ZeroPersistInterval);
        }

        Ok(())
    }
}

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(String),

    /// The configuration file is not valid JSON for this schema.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A parameter is outside its allowed range.
    #[error("{0} = {1} is out of range")]
    OutOfRange(&'static str, f64),

    /// The exploration floor is above the starting rate.
    #[error("min_exploration {min} exceeds initial_exploration {initial}")]
    ExplorationBounds {
        /// Configured floor.
        min: f64,
        /// Configured starting rate.
        initial: f64,
    },

    /// `persist_every` is zero.
    #[error("persist_every must be at least 1 (use null to disable periodic saves)")]
    ZeroPersistInterval,

    /// A playfield dimension is not usable.
    #[error("invalid playfield: {0}")]
    Playfield(String),
}

/// Statistics tracked while an agent learns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    /// Learning updates applied in this process.
    pub updates: u64,

    /// Number of states in the value table.
    pub states: usize,

    /// Current exploration rate.
    pub exploration: f64,

    /// Sum of rewards passed to the learner.
    pub cumulative_reward: f64,

    /// Successful saves of the value table.
    pub saves: u64,

    /// Saves that failed and were skipped.
    pub failed_saves: u64,
}

impl AgentStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean reward per update so far.
    pub fn mean_reward(&self) -> f64 {
        if self.updates == 0 {
            0.0
        } else {
            self.cumulative_reward / self.updates as f64
        }
    }
}
