#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that simulates Mini Dungeons days against the in-memory world.

mod simulation;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use mini_dungeons_content::{default_content_dir, Content, ModConfig};
use mini_dungeons_system_dungeon::DungeonManager;
use mini_dungeons_world::{Hud, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use simulation::run_day;

/// Simulates daily dungeon portals and clears every dungeon that opens.
#[derive(Debug, Parser)]
#[command(name = "mini-dungeons", version, about, long_about = None)]
struct Cli {
    /// Directory holding `dungeons.json` and `challenges.json`.
    #[arg(long, default_value_os_t = default_content_dir())]
    content: PathBuf,
    /// Mod configuration file; defaults apply when it does not exist.
    #[arg(long, default_value = "assets/mod_config.toml")]
    config: PathBuf,
    /// Seed of the simulation random source.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Number of days to simulate.
    #[arg(long, default_value_t = 7)]
    days: u32,
}

/// Entry point for the Mini Dungeons command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_dungeons=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ModConfig::load_or_default(&cli.config)?;
    let content = Content::load(&cli.content)?;
    info!(seed = cli.seed, days = cli.days, "starting simulation");

    let mut manager = DungeonManager::new(content.dungeons, Arc::new(content.challenges));
    let mut world = World::new();
    let mut hud = Hud::new();
    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);

    let mut cleared = 0;
    for day in 1..=cli.days {
        let report = run_day(day, &mut manager, &mut world, &mut hud, &config, &mut rng);
        cleared += report.cleared();
        println!("{report}");
    }
    println!(
        "{} day(s) simulated, {cleared} dungeon(s) cleared",
        cli.days
    );
    Ok(())
}
