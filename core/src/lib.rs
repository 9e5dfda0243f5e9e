#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Mini Dungeons engine.
//!
//! This crate defines the immutable content model (dungeon and challenge
//! definitions) together with the collaborator traits the dungeon controller
//! depends on. The host game implements [`LocationRegistry`], [`Notifier`]
//! and [`SpawnSettings`]; randomness flows through [`RandomSource`], which is
//! implemented for every [`rand::Rng`]. The in-memory host world accepts
//! [`Command`] values and broadcasts [`Event`] values in the same way the
//! rest of the engine exchanges messages.

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Prefix applied to the names of every dungeon location handed to the host.
pub const LOCATION_PREFIX: &str = "MiniDungeons";

/// Message surfaced to the player when a dungeon is cleared.
pub const DUNGEON_CLEARED_MESSAGE: &str = "The dungeon has been cleared";

/// Tile coordinate within a location.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Point {
    #[serde(rename = "X")]
    x: i32,
    #[serde(rename = "Y")]
    y: i32,
}

impl Point {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal tile index.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical tile index.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{X:{} Y:{}}}", self.x, self.y)
    }
}

/// Monster kinds the engine knows how to instantiate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MonsterKind {
    /// The common green slime.
    GreenSlime,
}

impl MonsterKind {
    /// Name used for the kind in content files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GreenSlime => "GreenSlime",
        }
    }
}

impl fmt::Display for MonsterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raised when a content file names a monster the engine cannot spawn.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown monster kind `{0}`")]
pub struct UnknownMonsterKind(pub String);

impl FromStr for MonsterKind {
    type Err = UnknownMonsterKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "GreenSlime" => Ok(Self::GreenSlime),
            other => Err(UnknownMonsterKind(other.to_owned())),
        }
    }
}

/// Identifier of a placeable world object, as understood by the host.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Wraps the provided host object identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier the host assigns to a spawned monster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonsterId(u32);

impl MonsterId {
    /// Creates a new monster identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle to a dungeon location registered with the host.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationHandle(String);

impl LocationHandle {
    /// Creates a handle referring to the location with the given unique name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Unique name of the location.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One possible layout a dungeon can roll when its location is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapVariant {
    #[serde(rename = "Challenge")]
    challenge: String,
    #[serde(rename = "SpawnWeight")]
    spawn_weight: u32,
    #[serde(rename = "EntryX")]
    entry_x: i32,
    #[serde(rename = "EntryY")]
    entry_y: i32,
}

impl MapVariant {
    /// Creates a map variant bound to the named challenge.
    #[must_use]
    pub fn new(challenge: impl Into<String>, spawn_weight: u32, entry: Point) -> Self {
        Self {
            challenge: challenge.into(),
            spawn_weight,
            entry_x: entry.x(),
            entry_y: entry.y(),
        }
    }

    /// Name of the challenge played on this layout.
    #[must_use]
    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    /// Relative weight used when rolling the layout.
    #[must_use]
    pub const fn spawn_weight(&self) -> u32 {
        self.spawn_weight
    }

    /// Tile where the player arrives through the portal.
    #[must_use]
    pub const fn entry_point(&self) -> Point {
        Point::new(self.entry_x, self.entry_y)
    }
}

/// Immutable description of a dungeon loaded from content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DungeonDefinition {
    #[serde(rename = "DungeonName")]
    name: String,
    #[serde(rename = "DungeonMaps", default)]
    maps: Vec<MapVariant>,
    #[serde(rename = "SpawnChance")]
    spawn_chance: f64,
    #[serde(rename = "SpawnMapName")]
    spawn_map_name: String,
    #[serde(rename = "PortalX")]
    portal_x: i32,
    #[serde(rename = "PortalY")]
    portal_y: i32,
}

impl DungeonDefinition {
    /// Creates a dungeon definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        maps: Vec<MapVariant>,
        spawn_chance: f64,
        spawn_map_name: impl Into<String>,
        portal_point: Point,
    ) -> Self {
        Self {
            name: name.into(),
            maps,
            spawn_chance,
            spawn_map_name: spawn_map_name.into(),
            portal_x: portal_point.x(),
            portal_y: portal_point.y(),
        }
    }

    /// Unique dungeon name, also the key for its spawning toggle.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Layouts the dungeon can roll.
    #[must_use]
    pub fn maps(&self) -> &[MapVariant] {
        &self.maps
    }

    /// Daily probability in `[0, 1]` that the portal appears.
    #[must_use]
    pub const fn spawn_chance(&self) -> f64 {
        self.spawn_chance
    }

    /// Name of the host location where the entrance portal is placed.
    #[must_use]
    pub fn spawn_map_name(&self) -> &str {
        &self.spawn_map_name
    }

    /// Tile of the entrance portal inside the spawn map.
    #[must_use]
    pub const fn portal_point(&self) -> Point {
        Point::new(self.portal_x, self.portal_y)
    }
}

/// Number of monsters of one kind spawned by a wave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterSpawn {
    #[serde(rename = "MonsterName")]
    monster_name: String,
    #[serde(rename = "SpawnAmount")]
    spawn_amount: u32,
}

impl MonsterSpawn {
    /// Creates a spawn entry. The name is resolved when the wave spawns.
    #[must_use]
    pub fn new(monster_name: impl Into<String>, spawn_amount: u32) -> Self {
        Self {
            monster_name: monster_name.into(),
            spawn_amount,
        }
    }

    /// Monster name as written in content.
    #[must_use]
    pub fn monster_name(&self) -> &str {
        &self.monster_name
    }

    /// Number of monsters to spawn.
    #[must_use]
    pub const fn spawn_amount(&self) -> u32 {
        self.spawn_amount
    }
}

/// A single stage of a challenge.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    #[serde(rename = "Monsters", default)]
    monsters: Vec<MonsterSpawn>,
}

impl Wave {
    /// Creates a wave from its monster spawns.
    #[must_use]
    pub fn new(monsters: Vec<MonsterSpawn>) -> Self {
        Self { monsters }
    }

    /// Monster spawns in content order.
    #[must_use]
    pub fn monsters(&self) -> &[MonsterSpawn] {
        &self.monsters
    }

    /// Total number of monsters the wave asks for.
    #[must_use]
    pub fn monster_count(&self) -> u64 {
        self.monsters
            .iter()
            .map(|spawn| u64::from(spawn.spawn_amount()))
            .sum()
    }
}

/// Static object placed when a wave spawns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedObject {
    #[serde(rename = "ObjectID")]
    object_id: ObjectId,
}

impl SpawnedObject {
    /// Creates a spawned object entry.
    #[must_use]
    pub fn new(object_id: ObjectId) -> Self {
        Self { object_id }
    }

    /// Host identifier of the object.
    #[must_use]
    pub fn object_id(&self) -> &ObjectId {
        &self.object_id
    }
}

/// Immutable wave-based combat content bound to a map layout.
///
/// Monsters are placed on uniformly random spawn points, while the object
/// at position `i` of [`Self::spawned_objects`] is always placed on spawn
/// point `i`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeDefinition {
    #[serde(rename = "MonsterWaves", default)]
    waves: Vec<Wave>,
    #[serde(rename = "SpawnPoints", default)]
    spawn_points: Vec<Point>,
    #[serde(rename = "SpawnedObjects", default)]
    spawned_objects: Vec<SpawnedObject>,
}

impl ChallengeDefinition {
    /// Creates a challenge definition.
    #[must_use]
    pub fn new(
        waves: Vec<Wave>,
        spawn_points: Vec<Point>,
        spawned_objects: Vec<SpawnedObject>,
    ) -> Self {
        Self {
            waves,
            spawn_points,
            spawned_objects,
        }
    }

    /// Waves in play order.
    #[must_use]
    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }

    /// Number of waves.
    #[must_use]
    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    /// Wave at the provided index, if present.
    #[must_use]
    pub fn wave(&self, index: usize) -> Option<&Wave> {
        self.waves.get(index)
    }

    /// Candidate tiles for spawns.
    #[must_use]
    pub fn spawn_points(&self) -> &[Point] {
        &self.spawn_points
    }

    /// Objects placed on every wave, index-aligned with the spawn points.
    #[must_use]
    pub fn spawned_objects(&self) -> &[SpawnedObject] {
        &self.spawned_objects
    }
}

/// Read-only lookup from challenge name to definition.
pub trait ChallengeLookup {
    /// Returns the challenge registered under `name`.
    fn challenge(&self, name: &str) -> Option<&ChallengeDefinition>;
}

/// Process-wide table of challenges keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeTable {
    challenges: HashMap<String, ChallengeDefinition>,
}

impl ChallengeTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a challenge, returning the definition it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        challenge: ChallengeDefinition,
    ) -> Option<ChallengeDefinition> {
        self.challenges.insert(name.into(), challenge)
    }

    /// Reports whether a challenge with the provided name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.challenges.contains_key(name)
    }

    /// Number of registered challenges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    /// Reports whether the table holds no challenges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    /// Iterates over the registered challenges in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChallengeDefinition)> {
        self.challenges
            .iter()
            .map(|(name, challenge)| (name.as_str(), challenge))
    }
}

impl ChallengeLookup for ChallengeTable {
    fn challenge(&self, name: &str) -> Option<&ChallengeDefinition> {
        self.challenges.get(name)
    }
}

impl<N: Into<String>> FromIterator<(N, ChallengeDefinition)> for ChallengeTable {
    fn from_iter<I: IntoIterator<Item = (N, ChallengeDefinition)>>(iter: I) -> Self {
        Self {
            challenges: iter
                .into_iter()
                .map(|(name, challenge)| (name.into(), challenge))
                .collect(),
        }
    }
}

/// Monotonic progress marker of a dungeon's daily run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Nothing has happened since the last reset.
    #[default]
    None,
    /// The portal spawn roll has been made.
    SpawnTested,
    /// The portal spawned.
    Spawned,
    /// The player entered the dungeon.
    Entered,
    /// Every wave of the challenge was defeated.
    Cleared,
}

/// Uniform random source supplied by the host.
pub trait RandomSource {
    /// Returns an integer uniformly drawn from `[0, bound)`. A zero bound yields zero.
    fn next_int(&mut self, bound: u64) -> u64;

    /// Returns a float uniformly drawn from `[0, 1)`.
    fn next_double(&mut self) -> f64;
}

impl<R: rand::Rng> RandomSource for R {
    fn next_int(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.gen_range(0..bound)
    }

    fn next_double(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Host registry of game locations.
pub trait LocationRegistry {
    /// Registers a new location under the provided unique name.
    fn create_location(&mut self, name: &str) -> LocationHandle;

    /// Removes the location, reporting whether it was registered.
    fn remove_location(&mut self, location: &LocationHandle) -> bool;

    /// Places a monster, returning `None` when the location is unknown.
    fn place_monster(
        &mut self,
        location: &LocationHandle,
        point: Point,
        kind: MonsterKind,
    ) -> Option<MonsterId>;

    /// Places an object, reporting whether the location exists.
    fn place_object(&mut self, location: &LocationHandle, point: Point, object: &ObjectId)
        -> bool;

    /// Number of live monsters, or `None` when the location is unknown.
    fn live_monsters(&self, location: &LocationHandle) -> Option<usize>;
}

/// Host configuration toggles consulted by the controller.
pub trait SpawnSettings {
    /// Reports whether portals of the named dungeon may spawn.
    fn spawning_enabled(&self, dungeon: &str) -> bool;

    /// Reports whether clearing a dungeon shows a HUD message.
    fn hud_notification_enabled(&self) -> bool;
}

/// Pushes short user-facing messages.
pub trait Notifier {
    /// Shows the message to the player.
    fn notify(&mut self, message: &str);
}

/// Commands that express host world mutations driven outside the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Kills a single monster.
    KillMonster {
        /// Identifier of the monster to kill.
        monster: MonsterId,
    },
    /// Kills every monster inside the provided location.
    ClearLocation {
        /// Location whose monsters are killed.
        location: LocationHandle,
    },
}

/// Events broadcast by the host world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that a monster died.
    MonsterKilled {
        /// Identifier of the monster.
        monster: MonsterId,
        /// Location the monster lived in.
        location: LocationHandle,
    },
}
