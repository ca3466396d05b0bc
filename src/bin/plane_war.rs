//! Plane War player binary.
//!
//! Flies the shooter with the learning agent (`--mode ai`) or from stdin
//! action tokens (`--mode human`). The value table is loaded at startup and
//! saved back when each AI session ends. Ctrl-C in AI mode stops at the next
//! frame and still saves.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use plane_war_rl::games::plane_war::{
    FrameReport, LineInput, Mode, Pilot, PlaneAction, Session, SessionConfig, SessionSummary,
};
use plane_war_rl::QAgent;

/// HUD lines are printed once per second of game time in AI mode.
const AI_REPORT_INTERVAL: u64 = 60;

#[derive(Parser, Debug)]
#[command(name = "plane_war")]
#[command(about = "Fly Plane War yourself or let the Q-learning agent learn it")]
struct Cli {
    /// Who flies: 'ai' learns and saves the table, 'human' reads actions from stdin
    #[arg(long)]
    mode: Mode,

    /// Value table file
    #[arg(long, default_value = "q_table.json")]
    table: PathBuf,

    /// Session configuration (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for enemy spawns and exploration
    #[arg(long)]
    seed: Option<u64>,

    /// Number of consecutive AI sessions
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    sessions: u32,

    /// Stop a session after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Pace frames at this rate (unpaced when omitted)
    #[arg(long)]
    fps: Option<u32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.mode {
        Mode::Ai => run_ai(&cli, &config),
        Mode::Human => run_human(&cli, &config),
    }
}

fn load_config(cli: &Cli) -> Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let config = SessionConfig::from_json_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            info!(path = %path.display(), "loaded session config");
            config
        }
        None => SessionConfig::default(),
    };

    if let Some(seed) = cli.seed {
        config.agent.seed = Some(seed);
    }
    if cli.max_frames.is_some() {
        config.max_frames = cli.max_frames;
    }
    if cli.fps.is_some() {
        config.frame_rate = cli.fps;
    }
    config.validate().context("invalid session config")?;

    Ok(config)
}

/// Install a SIGINT/SIGTERM handler that raises the returned flag.
fn setup_signal_handler() -> Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    let flag_clone = Arc::clone(&flag);

    ctrlc::set_handler(move || {
        flag_clone.store(true, Ordering::SeqCst);
    })
    .context("failed to set signal handler")?;

    Ok(flag)
}

fn run_ai(cli: &Cli, config: &SessionConfig) -> Result<()> {
    let start = Instant::now();
    let interrupted = setup_signal_handler()?;
    let mut agent = QAgent::<PlaneAction>::with_store_path(config.agent.clone(), &cli.table);
    info!(
        table = %cli.table.display(),
        states = agent.num_states(),
        exploration = agent.exploration(),
        "agent ready"
    );

    let mut session = Session::new(config, cli.seed).with_interrupt(interrupted);
    let mut summaries = Vec::with_capacity(cli.sessions as usize);

    if cli.sessions == 1 {
        let summary = session.run(Pilot::Agent(&mut agent), |report| {
            if report.frame % AI_REPORT_INTERVAL == 0 || report.game_over {
                println!("{}", report);
            }
        });
        summaries.push(summary);
    } else {
        let progress = ProgressBar::new(u64::from(cli.sessions));
        progress.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} sessions {msg}",
            )?
            .progress_chars("#>-"),
        );

        for _ in 0..cli.sessions {
            session.restart();
            let summary = session.run(Pilot::Agent(&mut agent), |_| {});
            progress.set_message(format!(
                "score {} eps {:.3}",
                summary.score,
                agent.exploration()
            ));
            progress.inc(1);
            summaries.push(summary);

            if session.is_interrupted() {
                progress.abandon_with_message("interrupted");
                break;
            }
        }
        if !progress.is_finished() {
            progress.finish();
        }
    }

    print_summary(&summaries);

    let stats = agent.stats();
    println!("\n=== Agent ===");
    println!("Updates: {}", stats.updates);
    println!(
        "States: {} (~{} bytes)",
        agent.num_states(),
        agent.store().memory_usage()
    );
    println!("Exploration: {:.4}", agent.exploration());
    println!("Mean reward per update: {:.3}", stats.mean_reward());
    println!("Saves: {} ({} failed)", stats.saves, stats.failed_saves);
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}

fn run_human(cli: &Cli, config: &SessionConfig) -> Result<()> {
    println!("Tokens per frame: l/left, r/right, f/fire, anything else stays.");
    println!("A blank line is one idle frame. End input (Ctrl-D) to quit.\n");

    let stdin = io::stdin();
    let mut input = LineInput::new(stdin.lock());
    let mut session = Session::new(config, cli.seed);

    let summary = session.run(Pilot::Human(&mut input), |report: &FrameReport| {
        println!("{}", report);
    });
    print_summary(&[summary]);

    Ok(())
}

fn print_summary(summaries: &[SessionSummary]) {
    println!("\n=== Summary ===");
    let first_shown = summaries.len().saturating_sub(10);
    for (i, s) in summaries.iter().enumerate().skip(first_shown) {
        println!(
            "Session {:>4}: score {:>6}, frames {:>6}, reward {:>9.1}, kills {:>4}, crashes {}, escapes {:>4}, {:?}",
            i + 1,
            s.score,
            s.frames,
            s.total_reward,
            s.kills,
            s.crashes,
            s.escapes,
            s.outcome
        );
    }
    if summaries.len() > 1 {
        let mean = summaries.iter().map(|s| s.score as f64).sum::<f64>() / summaries.len() as f64;
        let best = summaries.iter().map(|s| s.score).max().unwrap_or(0);
        println!("Mean score: {:.1}, best: {}", mean, best);
    }
}
