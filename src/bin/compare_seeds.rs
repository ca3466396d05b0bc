//! Seed comparison binary.
//!
//! Trains one independent agent per seed, in parallel, and reports how the
//! score curves differ. Nothing is persisted except the optional report.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plane_war_rl::games::plane_war::{Pilot, PlaneAction, Session, SessionConfig};
use plane_war_rl::{AgentConfig, QAgent};

#[derive(Parser, Debug)]
#[command(name = "compare_seeds")]
#[command(about = "Train independent Plane War agents across seeds and compare them")]
struct Cli {
    /// Comma-separated seeds
    #[arg(long, default_value = "1,2,3,4")]
    seeds: String,

    /// Sessions to train per seed
    #[arg(long, default_value_t = 50)]
    sessions: u32,

    /// Stop each session after this many frames
    #[arg(long, default_value_t = 20_000)]
    max_frames: u64,

    /// Session configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the report here as JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SeedResult {
    seed: u64,
    scores: Vec<i64>,
    mean_score: f64,
    best_score: i64,
    /// Mean over the last tenth of sessions
    final_mean_score: f64,
    updates: u64,
    states: usize,
    final_exploration: f64,
    elapsed_secs: f64,
}

#[derive(Debug, Serialize)]
struct Report {
    sessions_per_seed: u32,
    max_frames: u64,
    agent: AgentConfig,
    total_time_secs: f64,
    results: Vec<SeedResult>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let seeds = parse_seeds(&cli.seeds)?;

    let mut config = match &cli.config {
        Some(path) => SessionConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SessionConfig::default(),
    };
    config.max_frames = Some(cli.max_frames);
    config.frame_rate = None;

    println!("=== Plane War Seed Comparison ===");
    println!("Seeds: {:?}", seeds);
    println!("Sessions per seed: {}\n", cli.sessions);

    let total_start = Instant::now();
    let completed = AtomicUsize::new(0);

    let results: Vec<SeedResult> = seeds
        .par_iter()
        .map(|&seed| {
            let result = train_seed(&config, seed, cli.sessions);
            let count = completed.fetch_add(1, Ordering::Relaxed) + 1;
            println!(
                "[{}/{}] seed {} - mean {:.1}, last {:.1}, best {}, time: {:.2}s",
                count,
                seeds.len(),
                seed,
                result.mean_score,
                result.final_mean_score,
                result.best_score,
                result.elapsed_secs
            );
            result
        })
        .collect();

    let total_elapsed = total_start.elapsed().as_secs_f64();

    println!("\n=== Summary ===");
    println!("Total time: {:.2}s", total_elapsed);
    for r in &results {
        println!(
            "seed {:>6}: mean {:>8.1}  last {:>8.1}  best {:>6}  states {:>2}  eps {:.3}",
            r.seed, r.mean_score, r.final_mean_score, r.best_score, r.states, r.final_exploration
        );
    }

    if let Some(path) = &cli.output {
        let report = Report {
            sessions_per_seed: cli.sessions,
            max_frames: cli.max_frames,
            agent: config.agent.clone(),
            total_time_secs: total_elapsed,
            results,
        };
        let json = serde_json::to_string_pretty(&report)?;
        let mut file = File::create(path)
            .with_context(|| format!("creating report {}", path.display()))?;
        file.write_all(json.as_bytes())?;
        info!(path = %path.display(), "report written");
    }

    Ok(())
}

fn parse_seeds(raw: &str) -> Result<Vec<u64>> {
    let seeds = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u64>().with_context(|| format!("invalid seed '{}'", s)))
        .collect::<Result<Vec<_>>>()?;
    if seeds.is_empty() {
        bail!("no seeds given");
    }
    Ok(seeds)
}

fn train_seed(config: &SessionConfig, seed: u64, sessions: u32) -> SeedResult {
    let start = Instant::now();
    let mut agent = QAgent::<PlaneAction>::new(config.agent.clone().with_seed(seed));
    let mut session = Session::new(config, Some(seed));

    let mut scores = Vec::with_capacity(sessions as usize);
    for _ in 0..sessions {
        session.restart();
        let summary = session.run(Pilot::Agent(&mut agent), |_| {});
        scores.push(summary.score);
    }

    let tail = (scores.len() / 10).max(1).min(scores.len());
    SeedResult {
        seed,
        mean_score: mean(&scores),
        best_score: scores.iter().copied().max().unwrap_or(0),
        final_mean_score: mean(&scores[scores.len() - tail..]),
        updates: agent.stats().updates,
        states: agent.num_states(),
        final_exploration: agent.exploration(),
        elapsed_secs: start.elapsed().as_secs_f64(),
        scores,
    }
}

fn mean(scores: &[i64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64
}
