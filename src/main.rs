mod config;
mod core;
mod gravity;
mod integrator;
mod relativity;
mod render;
mod spatial;
mod types;
mod ui;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::info;

use crate::{config::SimConfig, core::World, types::Intents};

#[derive(Parser, Debug)]
#[command(about = "Asteroids around a black hole, with relativistic physics")]
struct Args {
    /// YAML scenario overriding the built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed for the accretion disk; random when omitted.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Run this many frames without a terminal UI and print a summary.
    #[arg(short, long)]
    frames: Option<u64>,
}

fn load_config(path: Option<&PathBuf>) -> Result<SimConfig> {
    match path {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading scenario from {}", path.display())),
        None => Ok(SimConfig::default()),
    }
}

fn run_headless(mut world: World, frames: u64) {
    let mut played = 0;
    let mut swallowed = 0;
    let mut over = false;
    let mut live = Vec::new();
    world.snapshot(&mut live);
    for _ in 0..frames {
        played += 1;
        let result = world.advance_frame(Intents::default());
        swallowed += result.removed.len();
        live = result.live;
        if result.session_over {
            over = true;
            break;
        }
    }
    let stats = world.stats();
    let viewer = world.viewer();
    let visible = live
        .iter()
        .filter(|body| world.project(&viewer, body).is_some())
        .count();
    println!(
        "frames: {played} | ship: ({:.1}, {:.1}) β={:.4} | debris: {} | disk: {} | on screen: {visible} | swallowed: {swallowed}{}",
        world.ship().pos.x,
        world.ship().pos.y,
        stats.ship_beta,
        stats.debris_count,
        stats.disk_count,
        if over { " | ship captured" } else { "" },
    );
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    let world = World::new(config, args.seed);

    if let Some(frames) = args.frames {
        run_headless(world, frames);
        return Ok(());
    }

    let summary = ui::run(world).map_err(|e| anyhow!("terminal session failed: {e}"))?;
    info!("session ended after {} frames: {:?}", summary.frames, summary.end);
    if summary.end == ui::SessionEnd::Captured {
        println!("Game over: swallowed by the black hole.");
    }
    println!("frames played: {}", summary.frames);
    Ok(())
}
