//! Tabular Q-learning agent.
//!
//! The agent owns everything that learns: the value table, the exploration
//! rate and its random number generator. Nothing here is global, so several
//! independent agents can live in one process.
//!
//! - **Policy**: epsilon-greedy over the fixed action enumeration, ties to
//!   the earliest action.
//! - **Learner**: one-step bootstrapped update toward
//!   `reward + gamma * max_a' Q(next_state, a')`.
//! - **Persistence**: the table is saved every `persist_every` updates and on
//!   `flush()`.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::qlearn::config::{AgentConfig, AgentStats};
use crate::qlearn::env::{Action, Environment, StateKey, Transition};
use crate::qlearn::storage::{StoreError, ValueStore};

/// The Q-learning agent.
///
/// # Type Parameters
/// - `A`: The action type, which fixes the width of each table row
///
/// # Example
/// ```ignore
/// use plane_war_rl::qlearn::{AgentConfig, QAgent};
///
/// let mut agent = QAgent::with_store_path(AgentConfig::default(), "q_table.json");
/// let stats = agent.run_episode(&mut world, None);
/// agent.flush()?;
/// ```
pub struct QAgent<A: Action> {
    /// Hyperparameters.
    config: AgentConfig,

    /// Learned action values.
    store: ValueStore,

    /// Current exploration rate.
    exploration: f64,

    /// Where the table is persisted, if anywhere.
    store_path: Option<PathBuf>,

    /// Updates applied since the last save attempt.
    pending: u64,

    /// Statistics tracking.
    stats: AgentStats,

    /// Random number generator.
    rng: StdRng,

    _phantom: PhantomData<A>,
}

impl<A: Action> QAgent<A> {
    /// Create an agent with an empty, unpersisted value table.
    pub fn new(config: AgentConfig) -> Self {
        Self::with_store(config, ValueStore::new(A::ALL.len()))
    }

    /// Create an agent around an existing value table.
    pub fn with_store(config: AgentConfig, store: ValueStore) -> Self {
        debug_assert_eq!(store.num_actions(), A::ALL.len());

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let exploration = config.initial_exploration;

        let mut stats = AgentStats::new();
        stats.states = store.num_states();
        stats.exploration = exploration;

        Self {
            config,
            store,
            exploration,
            store_path: None,
            pending: 0,
            stats,
            rng,
            _phantom: PhantomData,
        }
    }

    /// Create an agent persisted at `path`, loading whatever table is there.
    ///
    /// A missing or unreadable file gives an empty table; see
    /// [`ValueStore::load`].
    pub fn with_store_path<P: AsRef<Path>>(config: AgentConfig, path: P) -> Self {
        let path = path.as_ref();
        let store = ValueStore::load(path, &A::names());
        let mut agent = Self::with_store(config, store);
        agent.store_path = Some(path.to_path_buf());
        agent
    }

    /// Choose an action for `state`.
    ///
    /// With probability equal to the exploration rate the action is uniform
    /// over all actions. Otherwise it is the greedy action.
    pub fn choose<S: StateKey>(&mut self, state: &S) -> A {
        if self.exploration > 0.0 && self.rng.gen::<f64>() < self.exploration {
            let index = self.rng.gen_range(0..A::ALL.len());
            A::from_index(index)
        } else {
            self.greedy_action(state)
        }
    }

    /// The highest-valued action for `state`, ties to the earliest action.
    pub fn greedy_action<S: StateKey>(&self, state: &S) -> A {
        A::from_index(self.store.best_action(&state.key()))
    }

    /// Current estimate for `action` in `state`.
    pub fn value<S: StateKey>(&self, state: &S, action: A) -> f64 {
        self.store.get(&state.key(), action.index())
    }

    /// Apply the one-step Q-learning update.
    ///
    /// ```text
    /// target = reward + gamma * max_a' Q(next_state, a')
    /// Q(state, action) += alpha * (target - Q(state, action))
    /// ```
    ///
    /// `state == next_state` is not special-cased.
    pub fn update<S: StateKey>(&mut self, state: &S, action: A, reward: f64, next_state: &S) {
        let key = state.key();
        let current = self.store.get(&key, action.index());
        let target = reward + self.config.gamma * self.store.max_value(&next_state.key());
        let updated = current + self.config.alpha * (target - current);
        self.store.set(&key, action.index(), updated);
    }

    /// Decay the exploration rate once, never below the configured floor.
    pub fn decay_exploration(&mut self) {
        self.exploration =
            (self.exploration * self.config.exploration_decay).max(self.config.min_exploration);
        self.stats.exploration = self.exploration;
    }

    /// Learn from one transition: update, decay, and save when due.
    pub fn learn<S: StateKey>(&mut self, transition: Transition<S, A>) {
        let Transition {
            state,
            action,
            reward,
            next_state,
        } = transition;

        self.update(&state, action, reward, &next_state);
        self.decay_exploration();

        self.stats.updates += 1;
        self.stats.cumulative_reward += reward;
        self.stats.states = self.store.num_states();
        self.pending += 1;

        self.persist_if_due();
    }

    /// Play and learn one frame of `env`.
    ///
    /// The frame that ends the episode is not learned from: the world
    /// stops before the next state is observed.
    pub fn play_frame<E>(&mut self, env: &mut E) -> FrameResult<A>
    where
        E: Environment<Action = A>,
    {
        let state = env.observe();
        let action = self.choose(&state);
        let step = env.step(action);

        if step.terminal {
            return FrameResult {
                action,
                reward: step.reward,
                terminal: true,
                learned: false,
            };
        }

        let next_state = env.observe();
        self.learn(Transition {
            state,
            action,
            reward: step.reward,
            next_state,
        });

        FrameResult {
            action,
            reward: step.reward,
            terminal: false,
            learned: true,
        }
    }

    /// Play `env` until it ends or `max_frames` frames have passed.
    ///
    /// The environment is not reset first.
    pub fn run_episode<E>(&mut self, env: &mut E, max_frames: Option<u64>) -> EpisodeStats
    where
        E: Environment<Action = A>,
    {
        let mut episode = EpisodeStats::default();

        while !env.is_terminal() && max_frames.map_or(true, |max| episode.frames < max) {
            let result = self.play_frame(env);
            episode.frames += 1;
            episode.total_reward += result.reward;
            episode.terminal = result.terminal;
        }

        debug!(
            frames = episode.frames,
            reward = episode.total_reward,
            exploration = self.exploration,
            states = self.store.num_states(),
            "episode finished"
        );
        episode
    }

    /// Save the table now if it is persisted.
    ///
    /// Call this at session end; periodic saves alone may leave the last
    /// few updates unsaved.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if self.store_path.is_none() {
            return Ok(());
        }
        self.save()
    }

    fn persist_if_due(&mut self) {
        let Some(every) = self.config.persist_every else {
            return;
        };
        if self.store_path.is_none() || self.pending < every {
            return;
        }

        if let Err(e) = self.save() {
            warn!(error = %e, "failed to save value table, continuing in memory");
        }
    }

    fn save(&mut self) -> Result<(), StoreError> {
        let Some(path) = self.store_path.as_deref() else {
            return Ok(());
        };

        self.pending = 0;
        match self.store.save(path, &A::names()) {
            Ok(()) => {
                self.stats.saves += 1;
                info!(
                    path = %path.display(),
                    states = self.store.num_states(),
                    updates = self.stats.updates,
                    "saved value table"
                );
                Ok(())
            }
            Err(e) => {
                self.stats.failed_saves += 1;
                Err(e)
            }
        }
    }

    /// Get the current exploration rate.
    pub fn exploration(&self) -> f64 {
        self.exploration
    }

    /// Get the number of states in the table.
    pub fn num_states(&self) -> usize {
        self.store.num_states()
    }

    /// Get current statistics.
    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    /// Get reference to the value table.
    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Where the table is persisted, if anywhere.
    pub fn store_path(&self) -> Option<&Path> {
        self.store_path.as_deref()
    }
}

/// What happened on one agent-driven frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameResult<A> {
    /// Action taken.
    pub action: A,
    /// Reward for the frame.
    pub reward: f64,
    /// Whether the frame ended the episode.
    pub terminal: bool,
    /// Whether a learning update was applied.
    pub learned: bool,
}

/// Summary of one episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    /// Frames played.
    pub frames: u64,
    /// Sum of frame rewards.
    pub total_reward: f64,
    /// Whether the episode reached a terminal frame.
    pub terminal: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::plane_war::{
        EnemyKind, PlaneAction, PlaneState, PlaneWar, PlaneWarConfig, XRelation, YRelation,
    };
    use crate::qlearn::env::Step;
    use tempfile::tempdir;

    fn state(x: XRelation, y: YRelation, kind: EnemyKind) -> PlaneState {
        PlaneState { x, y, kind }
    }

    fn greedy_agent() -> QAgent<PlaneAction> {
        QAgent::new(AgentConfig::greedy().with_seed(7))
    }

    #[test]
    fn test_greedy_tie_break_is_left() {
        let mut agent = greedy_agent();
        let s = state(XRelation::Center, YRelation::Far, EnemyKind::Small);
        for _ in 0..10 {
            assert_eq!(agent.choose(&s), PlaneAction::Left);
        }
    }

    #[test]
    fn test_greedy_follows_best_value() {
        let mut agent = greedy_agent();
        let s = state(XRelation::Right, YRelation::Near, EnemyKind::Large);
        agent.update(&s, PlaneAction::Right, 5.0, &s);
        assert_eq!(agent.choose(&s), PlaneAction::Right);

        agent.update(&s, PlaneAction::Shoot, 50.0, &s);
        assert_eq!(agent.choose(&s), PlaneAction::Shoot);
    }

    #[test]
    fn test_full_exploration_draws_every_action() {
        let mut agent = QAgent::<PlaneAction>::new(AgentConfig::default().with_seed(42));
        let s = state(XRelation::Left, YRelation::Far, EnemyKind::Small);

        let mut counts = [0usize; 4];
        for _ in 0..4000 {
            counts[agent.choose(&s).index()] += 1;
        }
        for count in counts {
            assert!(count > 800 && count < 1200, "counts not uniform: {:?}", counts);
        }
    }

    #[test]
    fn test_single_update_matches_formula() {
        let mut agent = greedy_agent();
        let s = state(XRelation::Left, YRelation::Near, EnemyKind::Small);
        let s2 = state(XRelation::Center, YRelation::Near, EnemyKind::Small);

        agent.update(&s2, PlaneAction::Stay, 10.0, &s2);
        assert!((agent.value(&s2, PlaneAction::Stay) - 1.0).abs() < 1e-12);

        agent.update(&s, PlaneAction::Right, 0.5, &s2);
        // 0 + 0.1 * (0.5 + 0.9 * 1.0 - 0)
        assert!((agent.value(&s, PlaneAction::Right) - 0.14).abs() < 1e-12);
    }

    #[test]
    fn test_self_loop_converges_to_discounted_sum() {
        let mut agent = greedy_agent();
        let s = state(XRelation::Center, YRelation::Near, EnemyKind::Large);

        for _ in 0..5000 {
            agent.update(&s, PlaneAction::Shoot, 1.0, &s);
        }
        assert!((agent.value(&s, PlaneAction::Shoot) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_negative_reward_converges_when_all_actions_share_it() {
        let mut agent = greedy_agent();
        let s = state(XRelation::Left, YRelation::Far, EnemyKind::Large);

        for _ in 0..5000 {
            for &action in PlaneAction::ALL {
                agent.update(&s, action, -2.0, &s);
            }
        }
        for &action in PlaneAction::ALL {
            assert!((agent.value(&s, action) + 20.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_exploration_reaches_floor_after_598_decays() {
        let mut agent = QAgent::<PlaneAction>::new(AgentConfig::default().with_seed(1));
        assert_eq!(agent.exploration(), 1.0);

        let mut previous = agent.exploration();
        for _ in 0..597 {
            agent.decay_exploration();
            assert!(agent.exploration() <= previous);
            previous = agent.exploration();
        }
        assert!(agent.exploration() > 0.05);

        agent.decay_exploration();
        assert_eq!(agent.exploration(), 0.05);

        for _ in 0..10_000 {
            agent.decay_exploration();
        }
        assert_eq!(agent.exploration(), 0.05);
    }

    #[test]
    fn test_learn_decays_and_counts() {
        let mut agent = QAgent::<PlaneAction>::new(AgentConfig::default().with_seed(3));
        let s = state(XRelation::Center, YRelation::Far, EnemyKind::Small);

        agent.learn(Transition {
            state: s,
            action: PlaneAction::Stay,
            reward: -0.1,
            next_state: s,
        });

        assert_eq!(agent.stats().updates, 1);
        assert_eq!(agent.stats().states, 1);
        assert!((agent.exploration() - 0.995).abs() < 1e-12);
        assert!((agent.stats().cumulative_reward + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_periodic_persistence_and_flush() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("q_table.json");
        let config = AgentConfig::default()
            .with_seed(5)
            .with_persist_every(Some(3));
        let mut agent = QAgent::<PlaneAction>::with_store_path(config.clone(), &path);
        let s = state(XRelation::Right, YRelation::Far, EnemyKind::Small);

        for _ in 0..2 {
            agent.learn(Transition {
                state: s,
                action: PlaneAction::Right,
                reward: 1.0,
                next_state: s,
            });
        }
        assert!(!path.exists());

        agent.learn(Transition {
            state: s,
            action: PlaneAction::Right,
            reward: 1.0,
            next_state: s,
        });
        assert!(path.exists());
        assert_eq!(agent.stats().saves, 1);

        agent.learn(Transition {
            state: s,
            action: PlaneAction::Right,
            reward: 1.0,
            next_state: s,
        });
        agent.flush().unwrap();
        assert_eq!(agent.stats().saves, 2);

        let reloaded = QAgent::<PlaneAction>::with_store_path(config, &path);
        assert_eq!(reloaded.store(), agent.store());
        // Exploration is per process, not persisted
        assert_eq!(reloaded.exploration(), 1.0);
    }

    #[test]
    fn test_failed_save_is_not_fatal() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let config = AgentConfig::default()
            .with_seed(9)
            .with_persist_every(Some(1));
        let mut agent = QAgent::<PlaneAction>::with_store_path(config, blocker.join("q.json"));
        let s = state(XRelation::Left, YRelation::Near, EnemyKind::Large);

        agent.learn(Transition {
            state: s,
            action: PlaneAction::Left,
            reward: 2.0,
            next_state: s,
        });

        assert_eq!(agent.stats().failed_saves, 1);
        assert!(agent.value(&s, PlaneAction::Left) > 0.0);
        assert!(agent.flush().is_err());
    }

    #[test]
    fn test_flush_without_path_is_noop() {
        let mut agent = greedy_agent();
        assert!(agent.flush().is_ok());
        assert_eq!(agent.stats().saves, 0);
    }

    /// A one-state environment that ends after a fixed number of frames.
    struct Countdown {
        left: u32,
    }

    impl Environment for Countdown {
        type State = PlaneState;
        type Action = PlaneAction;

        fn observe(&self) -> PlaneState {
            PlaneState {
                x: XRelation::Center,
                y: YRelation::Far,
                kind: EnemyKind::Small,
            }
        }

        fn step(&mut self, action: PlaneAction) -> Step {
            self.left -= 1;
            Step {
                reward: if action == PlaneAction::Shoot { 1.0 } else { 0.0 },
                terminal: self.left == 0,
            }
        }

        fn is_terminal(&self) -> bool {
            self.left == 0
        }

        fn reset(&mut self) {
            self.left = 10;
        }
    }

    #[test]
    fn test_terminal_frame_is_not_learned() {
        let mut agent = QAgent::<PlaneAction>::new(AgentConfig::default().with_seed(11));
        let mut env = Countdown { left: 10 };

        let episode = agent.run_episode(&mut env, None);
        assert_eq!(episode.frames, 10);
        assert!(episode.terminal);
        assert_eq!(agent.stats().updates, 9);
    }

    #[test]
    fn test_frame_cap_stops_episode() {
        let mut agent = QAgent::<PlaneAction>::new(AgentConfig::default().with_seed(12));
        let mut env = Countdown { left: 10 };

        let episode = agent.run_episode(&mut env, Some(4));
        assert_eq!(episode.frames, 4);
        assert!(!episode.terminal);

        env.reset();
        assert!(!env.is_terminal());
    }

    #[test]
    fn test_plays_plane_war_episode() {
        let mut agent = QAgent::<PlaneAction>::new(AgentConfig::default().with_seed(21));
        let mut world = PlaneWar::new(PlaneWarConfig::default(), Some(21));

        let episode = agent.run_episode(&mut world, Some(5_000));
        assert!(episode.frames > 0);
        assert!(agent.num_states() > 0);
        assert!(agent.exploration() < 1.0);
    }
}
