use std::sync::Arc;

use mini_dungeons_core::{
    ChallengeLookup, DungeonDefinition, LocationHandle, LocationRegistry, MonsterId, Notifier,
    Point, RandomSource, SpawnSettings,
};
use tracing::{debug, error, info};

use crate::{Dungeon, KillOutcome, WaveError, WaveReport};

/// Entrance portal the host should place after a successful daily roll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortalSpawn {
    /// Dungeon the portal leads into.
    pub dungeon: String,
    /// Host location receiving the portal.
    pub spawn_map_name: String,
    /// Tile of the portal inside the spawn map.
    pub portal_point: Point,
    /// Dungeon location the portal leads to.
    pub location: LocationHandle,
    /// Tile where the player arrives inside the dungeon.
    pub arrival_point: Option<Point>,
}

/// Drives every configured dungeon through the host's daily lifecycle.
#[derive(Debug)]
pub struct DungeonManager<C> {
    dungeons: Vec<Dungeon<C>>,
}

impl<C: ChallengeLookup> DungeonManager<C> {
    /// Creates one controller per definition, all sharing the challenge table.
    #[must_use]
    pub fn new(definitions: Vec<DungeonDefinition>, challenges: Arc<C>) -> Self {
        let dungeons = definitions
            .into_iter()
            .map(|definition| Dungeon::new(definition, Arc::clone(&challenges)))
            .collect();
        Self { dungeons }
    }

    /// Controllers in content order.
    #[must_use]
    pub fn dungeons(&self) -> &[Dungeon<C>] {
        &self.dungeons
    }

    /// Controller of the named dungeon.
    #[must_use]
    pub fn dungeon(&self, name: &str) -> Option<&Dungeon<C>> {
        self.dungeons.iter().find(|dungeon| dungeon.name() == name)
    }

    /// Mutable controller of the named dungeon.
    pub fn dungeon_mut(&mut self, name: &str) -> Option<&mut Dungeon<C>> {
        self.dungeons
            .iter_mut()
            .find(|dungeon| dungeon.name() == name)
    }

    /// Reports whether the named dungeon is loaded and allowed to spawn.
    #[must_use]
    pub fn spawning_enabled_for<S>(&self, name: &str, settings: &S) -> bool
    where
        S: SpawnSettings + ?Sized,
    {
        self.dungeon(name).is_some() && settings.spawning_enabled(name)
    }

    /// Resets every dungeon and rolls today's portals.
    ///
    /// Each dungeon whose portal spawns gets its location created right away.
    pub fn start_day<S, L, R>(
        &mut self,
        settings: &S,
        registry: &mut L,
        rng: &mut R,
    ) -> Vec<PortalSpawn>
    where
        S: SpawnSettings + ?Sized,
        L: LocationRegistry + ?Sized,
        R: RandomSource + ?Sized,
    {
        let mut portals = Vec::new();
        for dungeon in &mut self.dungeons {
            dungeon.day_reset();

            if !dungeon.try_to_spawn_portal(settings, rng).spawned() {
                continue;
            }

            match dungeon.create_dungeon_location(registry, rng) {
                Ok(location) => {
                    info!(
                        dungeon = %dungeon.name(),
                        location = %location,
                        map = %dungeon.spawn_map_name(),
                        "dungeon portal opened"
                    );
                    portals.push(PortalSpawn {
                        dungeon: dungeon.name().to_owned(),
                        spawn_map_name: dungeon.spawn_map_name().to_owned(),
                        portal_point: dungeon.entry_portal_point(),
                        location,
                        arrival_point: dungeon.exit_portal_point(),
                    });
                }
                Err(reason) => {
                    error!(dungeon = %dungeon.name(), %reason, "failed to create dungeon location");
                }
            }
        }
        portals
    }

    /// Removes every dungeon location from the host at the end of the day.
    pub fn end_day<L>(&mut self, registry: &mut L) -> usize
    where
        L: LocationRegistry + ?Sized,
    {
        self.dungeons
            .iter_mut()
            .map(|dungeon| dungeon.remove_locations(registry))
            .sum()
    }

    /// Routes the player-entered trigger to the dungeon owning `location`.
    ///
    /// Returns `None` when no dungeon's current location matches.
    pub fn player_entered<L, R>(
        &mut self,
        location: &LocationHandle,
        registry: &mut L,
        rng: &mut R,
    ) -> Option<Result<WaveReport, WaveError>>
    where
        L: LocationRegistry + ?Sized,
        R: RandomSource + ?Sized,
    {
        let dungeon = self
            .dungeons
            .iter_mut()
            .find(|dungeon| dungeon.current_location() == Some(location))?;
        debug!(dungeon = %dungeon.name(), location = %location, "player entered dungeon");
        Some(dungeon.enter(registry, rng))
    }

    /// Forwards a monster death to every dungeon.
    ///
    /// Returns the name and outcome of each dungeon that did not ignore it.
    pub fn on_monster_killed<L, R, S, N>(
        &mut self,
        killed: &[MonsterId],
        registry: &mut L,
        rng: &mut R,
        settings: &S,
        notifier: &mut N,
    ) -> Vec<(String, KillOutcome)>
    where
        L: LocationRegistry + ?Sized,
        R: RandomSource + ?Sized,
        S: SpawnSettings + ?Sized,
        N: Notifier + ?Sized,
    {
        let mut outcomes = Vec::new();
        for dungeon in &mut self.dungeons {
            let outcome = dungeon.on_monster_killed(killed, registry, rng, settings, notifier);
            if outcome != KillOutcome::Ignored {
                outcomes.push((dungeon.name().to_owned(), outcome));
            }
        }
        outcomes
    }
}
