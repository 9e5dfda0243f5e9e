#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Dungeon lifecycle and wave-spawning state machine.
//!
//! A [`Dungeon`] owns the run-time state of one configured dungeon. Every day
//! it is reset, rolls whether its portal appears, creates its location, and
//! then spawns the waves of its challenge one after another as the host
//! reports monster deaths. The [`DungeonManager`] drives all configured
//! dungeons through the host's daily lifecycle.
//!
//! Failures never propagate to the host as panics: operations return typed
//! outcomes and log internal-consistency problems through `tracing`.

mod manager;

use std::sync::Arc;

use mini_dungeons_core::{
    ChallengeDefinition, ChallengeLookup, DungeonDefinition, LifecycleState, LocationHandle,
    LocationRegistry, MapVariant, MonsterId, MonsterKind, Notifier, ObjectId, Point,
    RandomSource, SpawnSettings, Wave, DUNGEON_CLEARED_MESSAGE, LOCATION_PREFIX,
};
use mini_dungeons_system_selection::{pick_uniform, pick_weighted_by};
use tracing::{debug, error, trace};

pub use manager::{DungeonManager, PortalSpawn};

/// Result of a daily portal spawn attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortalOutcome {
    /// The roll succeeded and the portal spawned.
    Spawned,
    /// The roll failed; no further attempts are allowed until the next reset.
    Missed,
    /// The attempt was not made.
    Blocked(PortalBlock),
}

impl PortalOutcome {
    /// Reports whether the portal spawned.
    #[must_use]
    pub const fn spawned(self) -> bool {
        matches!(self, Self::Spawned)
    }
}

/// Reasons a portal spawn attempt is refused without rolling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortalBlock {
    /// The portal was already rolled for today.
    AlreadyTested,
    /// Spawning is disabled for this dungeon in the configuration.
    Disabled,
}

/// A single unit that could not be placed while spawning a wave.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpawnFailure {
    /// The content names a monster kind the engine cannot instantiate.
    UnknownMonster {
        /// Name as written in content.
        name: String,
        /// Spawn point that was picked for the monster.
        point: Point,
    },
    /// Monsters were requested but the challenge has no spawn points.
    NoSpawnPoints {
        /// Name of the monster that could not be placed.
        name: String,
    },
    /// A static object has no spawn point at its list index.
    ObjectPointOutOfRange {
        /// Object that was skipped.
        object: ObjectId,
        /// Index of the object, and therefore of the missing spawn point.
        index: usize,
    },
    /// The host no longer knows the current location.
    LocationMissing,
}

/// Summary of a wave that was spawned.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WaveReport {
    wave: usize,
    monsters: Vec<MonsterId>,
    objects: usize,
    failures: Vec<SpawnFailure>,
}

impl WaveReport {
    /// Zero-based index of the spawned wave.
    #[must_use]
    pub const fn wave(&self) -> usize {
        self.wave
    }

    /// Monsters placed by the wave.
    #[must_use]
    pub fn monsters(&self) -> &[MonsterId] {
        &self.monsters
    }

    /// Number of static objects placed by the wave.
    #[must_use]
    pub const fn objects(&self) -> usize {
        self.objects
    }

    /// Units that were skipped.
    #[must_use]
    pub fn failures(&self) -> &[SpawnFailure] {
        &self.failures
    }
}

/// Reasons a wave could not be spawned at all.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WaveError {
    /// No challenge is resolved for the selected map.
    #[error("challenge was not resolved when trying to create the next wave")]
    NoChallenge,
    /// There is no current dungeon location to spawn into.
    #[error("no current dungeon location to spawn the wave into")]
    NoLocation,
    /// The challenge has no wave left to spawn.
    #[error("challenge has no wave at index {next} ({wave_count} waves)")]
    WavesExhausted {
        /// Index that was requested.
        next: usize,
        /// Number of waves in the challenge.
        wave_count: usize,
    },
    /// The dungeon cannot be entered from its current state.
    #[error("dungeon cannot be entered while {0:?}")]
    NotEnterable(LifecycleState),
}

/// Reasons a dungeon location could not be created.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// Only one location per dungeon may be active at a time.
    #[error("dungeon location {0} is already active")]
    AlreadyActive(LocationHandle),
}

/// Result of processing a monster death notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KillOutcome {
    /// The dungeon has no running wave or no current location.
    Ignored,
    /// Monsters are still alive in the current location.
    MonstersRemaining(usize),
    /// The wave was cleared and the next one spawned.
    WaveSpawned(WaveReport),
    /// The wave was cleared but the next one failed to spawn.
    WaveFailed(WaveError),
    /// The final wave was cleared.
    Cleared,
}

/// Run-time controller for a single configured dungeon.
#[derive(Debug)]
pub struct Dungeon<C> {
    definition: DungeonDefinition,
    challenges: Arc<C>,
    state: LifecycleState,
    selected_map: Option<usize>,
    current_wave: Option<usize>,
    current_location: Option<usize>,
    locations: Vec<LocationHandle>,
}

impl<C: ChallengeLookup> Dungeon<C> {
    /// Creates a controller for the definition, resolving challenges through `challenges`.
    #[must_use]
    pub fn new(definition: DungeonDefinition, challenges: Arc<C>) -> Self {
        Self {
            definition,
            challenges,
            state: LifecycleState::None,
            selected_map: None,
            current_wave: None,
            current_location: None,
            locations: Vec::new(),
        }
    }

    /// Unique dungeon name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Immutable definition backing the controller.
    #[must_use]
    pub fn definition(&self) -> &DungeonDefinition {
        &self.definition
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Daily probability that the portal appears.
    #[must_use]
    pub fn spawn_chance(&self) -> f64 {
        self.definition.spawn_chance()
    }

    /// Host location that receives the entrance portal.
    #[must_use]
    pub fn spawn_map_name(&self) -> &str {
        self.definition.spawn_map_name()
    }

    /// Tile of the entrance portal in the spawn map.
    #[must_use]
    pub fn entry_portal_point(&self) -> Point {
        self.definition.portal_point()
    }

    /// Tile where the player arrives inside the dungeon, once a map is selected.
    #[must_use]
    pub fn exit_portal_point(&self) -> Option<Point> {
        self.current_map().map(MapVariant::entry_point)
    }

    /// Index of the selected map variant.
    #[must_use]
    pub const fn selected_map(&self) -> Option<usize> {
        self.selected_map
    }

    /// Selected map variant.
    #[must_use]
    pub fn current_map(&self) -> Option<&MapVariant> {
        self.selected_map
            .and_then(|index| self.definition.maps().get(index))
    }

    /// Name of the challenge bound to the selected map.
    #[must_use]
    pub fn challenge_name(&self) -> Option<&str> {
        self.current_map().map(MapVariant::challenge)
    }

    /// Challenge bound to the selected map, if it exists in the table.
    #[must_use]
    pub fn challenge(&self) -> Option<&ChallengeDefinition> {
        self.challenge_in(&self.challenges)
    }

    /// Index of the most recently spawned wave.
    #[must_use]
    pub const fn current_wave_index(&self) -> Option<usize> {
        self.current_wave
    }

    /// Most recently spawned wave.
    #[must_use]
    pub fn current_wave(&self) -> Option<&Wave> {
        let index = self.current_wave?;
        self.challenge()?.wave(index)
    }

    /// Location the current waves spawn into.
    #[must_use]
    pub fn current_location(&self) -> Option<&LocationHandle> {
        self.current_location
            .and_then(|index| self.locations.get(index))
    }

    /// Every location created since the last reset.
    #[must_use]
    pub fn active_locations(&self) -> &[LocationHandle] {
        &self.locations
    }

    /// Returns the controller to its start-of-day state and forgets all locations.
    pub fn day_reset(&mut self) {
        self.state = LifecycleState::None;
        self.selected_map = None;
        self.current_wave = None;
        self.current_location = None;
        self.locations.clear();
    }

    /// Rolls whether today's portal appears. Only the first attempt per day rolls.
    pub fn try_to_spawn_portal<S, R>(&mut self, settings: &S, rng: &mut R) -> PortalOutcome
    where
        S: SpawnSettings + ?Sized,
        R: RandomSource + ?Sized,
    {
        if self.state >= LifecycleState::SpawnTested {
            return PortalOutcome::Blocked(PortalBlock::AlreadyTested);
        }
        if !settings.spawning_enabled(self.name()) {
            return PortalOutcome::Blocked(PortalBlock::Disabled);
        }

        self.state = LifecycleState::SpawnTested;
        if rng.next_double() < self.spawn_chance() {
            self.state = LifecycleState::Spawned;
            debug!(dungeon = %self.name(), "dungeon portal spawned");
            PortalOutcome::Spawned
        } else {
            PortalOutcome::Missed
        }
    }

    /// Registers the dungeon location with the host and rolls its map layout.
    ///
    /// A dungeon supports a single active location; a second call before
    /// [`Self::day_reset`] is rejected.
    pub fn create_dungeon_location<L, R>(
        &mut self,
        registry: &mut L,
        rng: &mut R,
    ) -> Result<LocationHandle, LocationError>
    where
        L: LocationRegistry + ?Sized,
        R: RandomSource + ?Sized,
    {
        if let Some(active) = self.current_location() {
            return Err(LocationError::AlreadyActive(active.clone()));
        }

        let name = format!(
            "{LOCATION_PREFIX}.{}_{}",
            self.name(),
            self.locations.len() + 1
        );
        let location = registry.create_location(&name);

        self.pick_map_type(rng);

        self.locations.push(location.clone());
        self.current_location = Some(self.locations.len() - 1);

        Ok(location)
    }

    /// Removes every location created since the last reset from the host.
    pub fn remove_locations<L>(&mut self, registry: &mut L) -> usize
    where
        L: LocationRegistry + ?Sized,
    {
        let mut removed = 0;
        for location in &self.locations {
            if registry.remove_location(location) {
                debug!(location = %location, "Removed location from the locations list");
                removed += 1;
            }
        }
        removed
    }

    /// Enters the dungeon and spawns its first wave.
    pub fn enter<L, R>(&mut self, registry: &mut L, rng: &mut R) -> Result<WaveReport, WaveError>
    where
        L: LocationRegistry + ?Sized,
        R: RandomSource + ?Sized,
    {
        if self.state != LifecycleState::Spawned {
            return Err(WaveError::NotEnterable(self.state));
        }
        self.state = LifecycleState::Entered;
        self.initialize(registry, rng)
    }

    /// Resolves the challenge of the selected map and spawns its first wave.
    pub fn initialize<L, R>(
        &mut self,
        registry: &mut L,
        rng: &mut R,
    ) -> Result<WaveReport, WaveError>
    where
        L: LocationRegistry + ?Sized,
        R: RandomSource + ?Sized,
    {
        let Some(challenge_name) = self.challenge_name() else {
            debug!(dungeon = %self.name(), "no map selected, nothing to initialize");
            return Err(WaveError::NoChallenge);
        };
        let challenges = Arc::clone(&self.challenges);
        let Some(challenge) = challenges.challenge(challenge_name) else {
            error!(
                dungeon = %self.name(),
                challenge = challenge_name,
                "Selected map references a missing challenge"
            );
            return Err(WaveError::NoChallenge);
        };
        self.spawn_wave(Some(challenge), registry, rng)
    }

    /// Advances to the next wave of the resolved challenge and spawns it.
    pub fn spawn_next_wave<L, R>(
        &mut self,
        registry: &mut L,
        rng: &mut R,
    ) -> Result<WaveReport, WaveError>
    where
        L: LocationRegistry + ?Sized,
        R: RandomSource + ?Sized,
    {
        let challenges = Arc::clone(&self.challenges);
        let challenge = self.challenge_in(&challenges);
        self.spawn_wave(challenge, registry, rng)
    }

    /// Reports whether the most recently spawned wave is the last one.
    #[must_use]
    pub fn is_final_wave(&self) -> bool {
        let Some(challenge) = self.challenge() else {
            return false;
        };
        let Some(wave) = self.current_wave else {
            return false;
        };
        wave + 1 >= challenge.wave_count()
    }

    /// Handles a monster death anywhere in the world.
    ///
    /// `killed` is only traced. The clear check asks the registry for the live
    /// monster count of the current location, so deaths elsewhere are harmless.
    /// Once that count is zero the next wave spawns, or the dungeon is cleared
    /// after its final wave.
    pub fn on_monster_killed<L, R, S, N>(
        &mut self,
        killed: &[MonsterId],
        registry: &mut L,
        rng: &mut R,
        settings: &S,
        notifier: &mut N,
    ) -> KillOutcome
    where
        L: LocationRegistry + ?Sized,
        R: RandomSource + ?Sized,
        S: SpawnSettings + ?Sized,
        N: Notifier + ?Sized,
    {
        if !self.is_running() || self.current_wave.is_none() {
            return KillOutcome::Ignored;
        }
        let Some(location) = self.current_location() else {
            return KillOutcome::Ignored;
        };
        let Some(live) = registry.live_monsters(location) else {
            return KillOutcome::Ignored;
        };
        trace!(dungeon = %self.name(), killed = killed.len(), live, "monster death reported");
        if live > 0 {
            return KillOutcome::MonstersRemaining(live);
        }

        if !self.is_final_wave() {
            return match self.spawn_next_wave(registry, rng) {
                Ok(report) => KillOutcome::WaveSpawned(report),
                Err(error) => KillOutcome::WaveFailed(error),
            };
        }

        self.state = LifecycleState::Cleared;
        debug!(dungeon = %self.name(), "Player cleared dungeon");
        if settings.hud_notification_enabled() {
            notifier.notify(DUNGEON_CLEARED_MESSAGE);
        }
        KillOutcome::Cleared
    }

    fn is_running(&self) -> bool {
        matches!(
            self.state,
            LifecycleState::Spawned | LifecycleState::Entered
        )
    }

    fn challenge_in<'c>(&self, table: &'c C) -> Option<&'c ChallengeDefinition> {
        table.challenge(self.challenge_name()?)
    }

    fn pick_map_type<R>(&mut self, rng: &mut R)
    where
        R: RandomSource + ?Sized,
    {
        match pick_weighted_by(self.definition.maps(), MapVariant::spawn_weight, rng) {
            Ok(index) => {
                self.selected_map = Some(index);
                debug!(dungeon = %self.name(), map = index, "picked dungeon map");
            }
            Err(reason) => {
                self.selected_map = None;
                error!(
                    dungeon = %self.name(),
                    %reason,
                    "Something went wrong picking the dungeon map"
                );
            }
        }
    }

    fn spawn_wave<L, R>(
        &mut self,
        challenge: Option<&ChallengeDefinition>,
        registry: &mut L,
        rng: &mut R,
    ) -> Result<WaveReport, WaveError>
    where
        L: LocationRegistry + ?Sized,
        R: RandomSource + ?Sized,
    {
        let Some(challenge) = challenge else {
            error!(
                dungeon = %self.name(),
                "Challenge was not resolved when trying to create the next wave"
            );
            return Err(WaveError::NoChallenge);
        };
        let Some(location) = self.current_location().cloned() else {
            error!(dungeon = %self.name(), "No dungeon location to spawn the next wave into");
            return Err(WaveError::NoLocation);
        };

        let next = self.current_wave.map_or(0, |wave| wave + 1);
        let Some(wave) = challenge.wave(next) else {
            error!(
                dungeon = %self.name(),
                wave = next,
                wave_count = challenge.wave_count(),
                "Challenge has no wave left to spawn"
            );
            return Err(WaveError::WavesExhausted {
                next,
                wave_count: challenge.wave_count(),
            });
        };

        self.current_wave = Some(next);
        debug!(dungeon = %self.name(), wave = next, "Spawning wave");

        let mut report = WaveReport {
            wave: next,
            ..WaveReport::default()
        };
        spawn_monsters(challenge, wave, &location, registry, rng, &mut report);
        spawn_objects(challenge, &location, registry, &mut report);
        Ok(report)
    }
}

fn spawn_monsters<L, R>(
    challenge: &ChallengeDefinition,
    wave: &Wave,
    location: &LocationHandle,
    registry: &mut L,
    rng: &mut R,
    report: &mut WaveReport,
) where
    L: LocationRegistry + ?Sized,
    R: RandomSource + ?Sized,
{
    for spawn in wave.monsters() {
        let name = spawn.monster_name();
        let kind = name.parse::<MonsterKind>();

        for _ in 0..spawn.spawn_amount() {
            let Some(&point) = pick_uniform(challenge.spawn_points(), rng) else {
                error!(monster = name, "Trying to spawn a monster without spawn points");
                report.failures.push(SpawnFailure::NoSpawnPoints {
                    name: name.to_owned(),
                });
                break;
            };

            let Ok(monster_kind) = kind.as_ref() else {
                error!(
                    monster = name,
                    %point,
                    "Trying to spawn an unknown monster type"
                );
                report.failures.push(SpawnFailure::UnknownMonster {
                    name: name.to_owned(),
                    point,
                });
                continue;
            };

            match registry.place_monster(location, point, *monster_kind) {
                Some(monster) => report.monsters.push(monster),
                None => report.failures.push(SpawnFailure::LocationMissing),
            }
        }
    }
}

fn spawn_objects<L>(
    challenge: &ChallengeDefinition,
    location: &LocationHandle,
    registry: &mut L,
    report: &mut WaveReport,
) where
    L: LocationRegistry + ?Sized,
{
    for (index, object) in challenge.spawned_objects().iter().enumerate() {
        let Some(&point) = challenge.spawn_points().get(index) else {
            error!(
                object = %object.object_id(),
                index,
                spawn_points = challenge.spawn_points().len(),
                "Spawned object has no spawn point at its index"
            );
            report.failures.push(SpawnFailure::ObjectPointOutOfRange {
                object: object.object_id().clone(),
                index,
            });
            continue;
        };

        if registry.place_object(location, point, object.object_id()) {
            report.objects += 1;
        } else {
            report.failures.push(SpawnFailure::LocationMissing);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mini_dungeons_core::{ChallengeTable, MonsterSpawn, SpawnedObject};

    struct Fixed {
        int: u64,
        double: f64,
    }

    impl RandomSource for Fixed {
        fn next_int(&mut self, bound: u64) -> u64 {
            self.int.min(bound.saturating_sub(1))
        }

        fn next_double(&mut self) -> f64 {
            self.double
        }
    }

    struct Toggles(bool);

    impl SpawnSettings for Toggles {
        fn spawning_enabled(&self, _dungeon: &str) -> bool {
            self.0
        }

        fn hud_notification_enabled(&self) -> bool {
            true
        }
    }

    fn dungeon(maps: Vec<MapVariant>, spawn_chance: f64) -> Dungeon<ChallengeTable> {
        let mut table = ChallengeTable::new();
        let _ = table.insert(
            "C1",
            ChallengeDefinition::new(
                vec![
                    Wave::new(vec![MonsterSpawn::new("GreenSlime", 1)]),
                    Wave::new(vec![MonsterSpawn::new("GreenSlime", 1)]),
                    Wave::new(vec![MonsterSpawn::new("GreenSlime", 1)]),
                ],
                vec![Point::new(1, 1)],
                vec![SpawnedObject::new(ObjectId::new("93"))],
            ),
        );
        let definition =
            DungeonDefinition::new("Test", maps, spawn_chance, "Forest", Point::new(3, 4));
        Dungeon::new(definition, Arc::new(table))
    }

    #[test]
    fn spawn_roll_equal_to_chance_misses() {
        let mut dungeon = dungeon(vec![], 0.5);
        let outcome = dungeon.try_to_spawn_portal(
            &Toggles(true),
            &mut Fixed {
                int: 0,
                double: 0.5,
            },
        );
        assert_eq!(outcome, PortalOutcome::Missed);
        assert_eq!(dungeon.state(), LifecycleState::SpawnTested);
    }

    #[test]
    fn disabled_dungeon_does_not_roll() {
        let mut dungeon = dungeon(vec![], 1.0);
        let outcome = dungeon.try_to_spawn_portal(
            &Toggles(false),
            &mut Fixed {
                int: 0,
                double: 0.0,
            },
        );
        assert_eq!(outcome, PortalOutcome::Blocked(PortalBlock::Disabled));
        assert_eq!(dungeon.state(), LifecycleState::None);
    }

    #[test]
    fn final_wave_tracks_wave_index() {
        let mut dungeon = dungeon(vec![MapVariant::new("C1", 1, Point::new(0, 0))], 1.0);
        assert!(!dungeon.is_final_wave());

        dungeon.selected_map = Some(0);
        assert!(!dungeon.is_final_wave(), "no wave spawned yet");

        dungeon.current_wave = Some(0);
        assert!(!dungeon.is_final_wave());
        dungeon.current_wave = Some(1);
        assert!(!dungeon.is_final_wave());
        dungeon.current_wave = Some(2);
        assert!(dungeon.is_final_wave());
    }

    #[test]
    fn final_wave_is_false_without_challenge() {
        let mut dungeon = dungeon(vec![MapVariant::new("Missing", 1, Point::new(0, 0))], 1.0);
        dungeon.selected_map = Some(0);
        dungeon.current_wave = Some(5);
        assert!(dungeon.challenge().is_none());
        assert!(!dungeon.is_final_wave());
    }

    #[test]
    fn exit_portal_follows_selected_map() {
        let mut dungeon = dungeon(
            vec![
                MapVariant::new("C1", 1, Point::new(5, 6)),
                MapVariant::new("C1", 1, Point::new(7, 8)),
            ],
            1.0,
        );
        assert_eq!(dungeon.exit_portal_point(), None);
        dungeon.selected_map = Some(1);
        assert_eq!(dungeon.exit_portal_point(), Some(Point::new(7, 8)));
        assert_eq!(dungeon.entry_portal_point(), Point::new(3, 4));
    }
}
