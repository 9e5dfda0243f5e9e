use std::fmt;

use mini_dungeons_content::ModConfig;
use mini_dungeons_core::{ChallengeLookup, Command, Event, LocationHandle, MonsterId, RandomSource};
use mini_dungeons_system_dungeon::{DungeonManager, KillOutcome, PortalSpawn};
use mini_dungeons_world::{apply, query, Hud, World};
use tracing::{debug, info, warn};

/// Upper bound on kills per dungeon run, guarding against content that never clears.
const MAX_KILLS_PER_RUN: usize = 10_000;

/// Outcome of a single simulated day.
#[derive(Debug, Default)]
pub(crate) struct DayReport {
    day: u32,
    runs: Vec<DungeonRun>,
    removed_locations: usize,
    messages: Vec<String>,
}

impl DayReport {
    /// Number of dungeons cleared during the day.
    pub(crate) fn cleared(&self) -> usize {
        self.runs.iter().filter(|run| run.cleared).count()
    }
}

impl fmt::Display for DayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.runs.is_empty() {
            return write!(f, "day {}: no portals", self.day);
        }
        write!(
            f,
            "day {}: {} portal(s), {} location(s) removed",
            self.day,
            self.runs.len(),
            self.removed_locations
        )?;
        for run in &self.runs {
            write!(f, "\n  {run}")?;
        }
        for message in &self.messages {
            write!(f, "\n  hud: {message}")?;
        }
        Ok(())
    }
}

/// What happened inside one dungeon during the day.
#[derive(Debug)]
struct DungeonRun {
    portal: PortalSpawn,
    waves: usize,
    kills: usize,
    failures: usize,
    cleared: bool,
}

impl DungeonRun {
    fn new(portal: PortalSpawn) -> Self {
        Self {
            portal,
            waves: 0,
            kills: 0,
            failures: 0,
            cleared: false,
        }
    }
}

impl fmt::Display for DungeonRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (portal in {} at {}, location {}): {} wave(s), {} kill(s)",
            self.portal.dungeon,
            self.portal.spawn_map_name,
            self.portal.portal_point,
            self.portal.location,
            self.waves,
            self.kills
        )?;
        if self.failures > 0 {
            write!(f, ", {} spawn failure(s)", self.failures)?;
        }
        f.write_str(if self.cleared { ", cleared" } else { ", not cleared" })
    }
}

/// Plays one day: opens portals, clears every dungeon that opened, then tears them down.
pub(crate) fn run_day<C, R>(
    day: u32,
    manager: &mut DungeonManager<C>,
    world: &mut World,
    hud: &mut Hud,
    config: &ModConfig,
    rng: &mut R,
) -> DayReport
where
    C: ChallengeLookup,
    R: RandomSource + ?Sized,
{
    let portals = manager.start_day(config, world, rng);
    debug!(day, portals = portals.len(), "day started");

    let mut runs = Vec::with_capacity(portals.len());
    for portal in portals {
        runs.push(clear_dungeon(portal, manager, world, hud, config, rng));
    }

    let removed_locations = manager.end_day(world);
    info!(day, removed_locations, "day ended");

    DayReport {
        day,
        runs,
        removed_locations,
        messages: hud.drain(),
    }
}

fn clear_dungeon<C, R>(
    portal: PortalSpawn,
    manager: &mut DungeonManager<C>,
    world: &mut World,
    hud: &mut Hud,
    config: &ModConfig,
    rng: &mut R,
) -> DungeonRun
where
    C: ChallengeLookup,
    R: RandomSource + ?Sized,
{
    let location = portal.location.clone();
    let mut run = DungeonRun::new(portal);

    match manager.player_entered(&location, world, rng) {
        Some(Ok(report)) => {
            run.waves += 1;
            run.failures += report.failures().len();
        }
        Some(Err(reason)) => {
            warn!(dungeon = %run.portal.dungeon, %reason, "could not enter dungeon");
            return run;
        }
        None => {
            warn!(location = %location, "no dungeon owns the entered location");
            return run;
        }
    }

    while !run.cleared && run.kills < MAX_KILLS_PER_RUN {
        let Some(monster) = next_target(world, &location) else {
            debug!(dungeon = %run.portal.dungeon, "no monster left to fight");
            break;
        };
        let killed = kill(world, monster);
        run.kills += killed.len();

        for (dungeon, outcome) in manager.on_monster_killed(&killed, world, rng, config, hud) {
            if dungeon != run.portal.dungeon {
                continue;
            }
            match outcome {
                KillOutcome::WaveSpawned(report) => {
                    run.waves += 1;
                    run.failures += report.failures().len();
                }
                KillOutcome::WaveFailed(reason) => {
                    warn!(%dungeon, %reason, "next wave failed to spawn");
                }
                KillOutcome::Cleared => run.cleared = true,
                KillOutcome::Ignored | KillOutcome::MonstersRemaining(_) => {}
            }
        }
    }

    run
}

fn next_target(world: &World, location: &LocationHandle) -> Option<MonsterId> {
    query::monsters(world, location)
        .first()
        .map(|monster| monster.id)
}

fn kill(world: &mut World, monster: MonsterId) -> Vec<MonsterId> {
    let mut events = Vec::new();
    apply(world, Command::KillMonster { monster }, &mut events);
    events
        .into_iter()
        .map(|event| match event {
            Event::MonsterKilled { monster, .. } => monster,
        })
        .collect()
}
