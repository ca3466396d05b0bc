//! The per-frame game loop.
//!
//! A session plays one game (three lives by default) with either the agent
//! or a human at the controls. In AI mode every frame is learned from and
//! the value table is flushed when the session ends, including when an
//! interrupt flag stops it early. In HUMAN mode the learner is never touched.

use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::games::plane_war::action::PlaneAction;
use crate::games::plane_war::config::PlaneWarConfig;
use crate::games::plane_war::world::PlaneWar;
use crate::qlearn::env::Environment;
use crate::qlearn::{AgentConfig, ConfigError, QAgent};

/// Who is flying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// The agent chooses and learns.
    Ai,
    /// An input source chooses; nothing is learned.
    Human,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ai" | "a" => Ok(Mode::Ai),
            "human" | "h" => Ok(Mode::Human),
            other => Err(format!("unknown mode '{}' (expected 'ai' or 'human')", other)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Ai => write!(f, "AI"),
            Mode::Human => write!(f, "HUMAN"),
        }
    }
}

/// A source of human actions, one per frame.
pub trait InputSource {
    /// The action for the next frame, or `None` to quit.
    fn next_action(&mut self) -> Option<PlaneAction>;
}

/// Reads whitespace-separated action tokens, one per frame.
///
/// A blank line counts as one frame with no key pressed. End of input is the
/// quit signal.
pub struct LineInput<R> {
    reader: R,
    queued: VecDeque<PlaneAction>,
}

impl<R: BufRead> LineInput<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            queued: VecDeque::new(),
        }
    }
}

impl<R: BufRead> InputSource for LineInput<R> {
    fn next_action(&mut self) -> Option<PlaneAction> {
        if let Some(action) = self.queued.pop_front() {
            return Some(action);
        }

        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => {
                self.queued
                    .extend(line.split_whitespace().map(PlaneAction::from_token));
                Some(self.queued.pop_front().unwrap_or(PlaneAction::Stay))
            }
            Err(e) => {
                warn!(error = %e, "input read failed, quitting");
                None
            }
        }
    }
}

/// Replays a fixed list of actions, then quits.
impl InputSource for std::vec::IntoIter<PlaneAction> {
    fn next_action(&mut self) -> Option<PlaneAction> {
        self.next()
    }
}

/// The controller for a session.
pub enum Pilot<'a> {
    /// The learning agent.
    Agent(&'a mut QAgent<PlaneAction>),
    /// A human behind an input source.
    Human(&'a mut dyn InputSource),
}

impl Pilot<'_> {
    /// The mode this pilot plays in.
    pub fn mode(&self) -> Mode {
        match self {
            Pilot::Agent(_) => Mode::Ai,
            Pilot::Human(_) => Mode::Human,
        }
    }
}

/// Everything the HUD shows after a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Frame number within the session, starting at 1.
    pub frame: u64,
    /// Who is flying.
    pub mode: Mode,
    /// Action taken.
    pub action: PlaneAction,
    /// Shaped reward for the frame.
    pub reward: f64,
    /// Score so far.
    pub score: i64,
    /// Lives left.
    pub lives: u32,
    /// Exploration rate in AI mode.
    pub exploration: Option<f64>,
    /// Whether the game just ended.
    pub game_over: bool,
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mode: {} | Score: {} | Lives: {} | Last Reward: {:.1}",
            self.mode, self.score, self.lives, self.reward
        )?;
        if let Some(exploration) = self.exploration {
            write!(f, " | Epsilon: {:.2}", exploration)?;
        }
        Ok(())
    }
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// All lives lost.
    GameOver,
    /// The input source signalled quit, or the session was interrupted.
    Quit,
    /// `max_frames` reached.
    FrameLimit,
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Who flew.
    pub mode: Mode,
    /// Frames played.
    pub frames: u64,
    /// Final score.
    pub score: i64,
    /// Lives left at the end.
    pub lives_left: u32,
    /// Sum of frame rewards.
    pub total_reward: f64,
    /// Enemies shot down.
    pub kills: u32,
    /// Collisions with the player.
    pub crashes: u32,
    /// Enemies that left through the bottom.
    pub escapes: u32,
    /// Why it stopped.
    pub outcome: SessionOutcome,
}

/// Complete configuration for playing sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Learning parameters.
    pub agent: AgentConfig,

    /// Playfield parameters.
    pub world: PlaneWarConfig,

    /// Frames per second to pace at; `None` runs as fast as possible.
    pub frame_rate: Option<u32>,

    /// Stop a session after this many frames.
    pub max_frames: Option<u64>,
}

impl SessionConfig {
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

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.agent.validate()?;
        self.world.validate()?;
        if self.frame_rate == Some(0) {
            return Err(ConfigError::OutOfRange("frame_rate", 0.0));
        }
        Ok(())
    }
}

/// One game from first frame to game over (or quit).
pub struct Session {
    world: PlaneWar,
    frame_rate: Option<u32>,
    max_frames: Option<u64>,
    interrupted: Option<Arc<AtomicBool>>,
}

impl Session {
    /// Create a session over a fresh world.
    pub fn new(config: &SessionConfig, seed: Option<u64>) -> Self {
        Self {
            world: PlaneWar::new(config.world.clone(), seed),
            frame_rate: config.frame_rate,
            max_frames: config.max_frames,
            interrupted: None,
        }
    }

    /// Stop at the next frame boundary once `flag` is set.
    ///
    /// The session then ends as `Quit`, so an AI session still flushes.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(flag);
        self
    }

    /// Whether the interrupt flag has been raised.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Start a new game in the same world.
    pub fn restart(&mut self) {
        self.world.reset();
    }

    /// Play until game over, quit, or the frame limit.
    ///
    /// `observer` receives a report after every frame; it is where a
    /// renderer hooks in.
    pub fn run<F>(&mut self, mut pilot: Pilot<'_>, mut observer: F) -> SessionSummary
    where
        F: FnMut(&FrameReport),
    {
        let mode = pilot.mode();
        let frame_budget = self
            .frame_rate
            .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)));

        debug!(%mode, lives = self.world.lives(), "session started");

        let mut frames = 0u64;
        let mut total_reward = 0.0;
        let (mut kills, mut crashes, mut escapes) = (0u32, 0u32, 0u32);

        let outcome = loop {
            if self.world.is_terminal() {
                break SessionOutcome::GameOver;
            }
            if self.is_interrupted() {
                info!(frames, "session interrupted");
                break SessionOutcome::Quit;
            }
            if self.max_frames.is_some_and(|max| frames >= max) {
                break SessionOutcome::FrameLimit;
            }
            let tick = Instant::now();

            let (action, reward, game_over, exploration) = match &mut pilot {
                Pilot::Agent(agent) => {
                    let result = agent.play_frame(&mut self.world);
                    (
                        result.action,
                        result.reward,
                        result.terminal,
                        Some(agent.exploration()),
                    )
                }
                Pilot::Human(input) => {
                    let Some(action) = input.next_action() else {
                        break SessionOutcome::Quit;
                    };
                    let step = self.world.step(action);
                    (action, step.reward, step.terminal, None)
                }
            };

            frames += 1;
            total_reward += reward;
            if let Some(last) = self.world.last_outcome() {
                kills += u32::from(last.destroyed.is_some());
                crashes += u32::from(last.collided.is_some());
                escapes += u32::from(last.escaped);
            }

            observer(&FrameReport {
                frame: frames,
                mode,
                action,
                reward,
                score: self.world.score(),
                lives: self.world.lives(),
                exploration,
                game_over,
            });

            if game_over {
                break SessionOutcome::GameOver;
            }

            if let Some(budget) = frame_budget {
                let elapsed = tick.elapsed();
                if elapsed < budget {
                    thread::sleep(budget - elapsed);
                }
            }
        };

        if let Pilot::Agent(agent) = pilot {
            if let Err(e) = agent.flush() {
                warn!(error = %e, "could not save value table at session end");
            }
        }

        let summary = SessionSummary {
            mode,
            frames,
            score: self.world.score(),
            lives_left: self.world.lives(),
            total_reward,
            kills,
            crashes,
            escapes,
            outcome,
        };
        info!(
            %mode,
            frames = summary.frames,
            score = summary.score,
            kills = summary.kills,
            crashes = summary.crashes,
            outcome = ?summary.outcome,
            "session finished"
        );
        summary
    }

    /// Get reference to the world.
    pub fn world(&self) -> &PlaneWar {
        &self.world
    }

    /// Get mutable reference to the world.
    pub fn world_mut(&mut self) -> &mut PlaneWar {
        &mut self.world
    }
}
