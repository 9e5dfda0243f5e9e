#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative in-memory host world for Mini Dungeons.
//!
//! The world plays the part of the host game: it registers dungeon
//! locations and holds the monsters and objects placed into them. The
//! [`Hud`] records the messages shown to the player. Monster deaths are requested
//! through [`Command`] values passed to [`apply`], which answers with
//! [`Event::MonsterKilled`] for every monster that died.

use std::collections::BTreeMap;

use mini_dungeons_core::{
    Command, Event, LocationHandle, LocationRegistry, MonsterId, MonsterKind, Notifier, ObjectId,
    Point,
};
use tracing::trace;

/// Represents the authoritative host world state.
#[derive(Debug, Default)]
pub struct World {
    locations: Vec<Location>,
    next_monster: u32,
}

impl World {
    /// Creates an empty world without any dungeon locations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn location(&self, handle: &LocationHandle) -> Option<&Location> {
        self.locations
            .iter()
            .find(|location| location.handle == *handle)
    }

    fn location_mut(&mut self, handle: &LocationHandle) -> Option<&mut Location> {
        self.locations
            .iter_mut()
            .find(|location| location.handle == *handle)
    }

    fn allocate_monster_id(&mut self) -> MonsterId {
        let id = MonsterId::new(self.next_monster);
        self.next_monster = self.next_monster.wrapping_add(1);
        id
    }

    fn kill_monster(&mut self, monster: MonsterId, out_events: &mut Vec<Event>) {
        for location in &mut self.locations {
            if let Some(index) = location.monsters.iter().position(|m| m.id == monster) {
                let _ = location.monsters.remove(index);
                out_events.push(Event::MonsterKilled {
                    monster,
                    location: location.handle.clone(),
                });
                return;
            }
        }
    }

    fn clear_location(&mut self, handle: &LocationHandle, out_events: &mut Vec<Event>) {
        let Some(location) = self.location_mut(handle) else {
            return;
        };
        for monster in location.monsters.drain(..) {
            out_events.push(Event::MonsterKilled {
                monster: monster.id,
                location: location.handle.clone(),
            });
        }
    }
}

impl LocationRegistry for World {
    fn create_location(&mut self, name: &str) -> LocationHandle {
        let handle = LocationHandle::new(name);
        match self.location_mut(&handle) {
            Some(existing) => {
                existing.monsters.clear();
                existing.objects.clear();
            }
            None => self.locations.push(Location::new(handle.clone())),
        }
        trace!(location = %handle, "location registered");
        handle
    }

    fn remove_location(&mut self, location: &LocationHandle) -> bool {
        let before = self.locations.len();
        self.locations.retain(|candidate| candidate.handle != *location);
        before != self.locations.len()
    }

    fn place_monster(
        &mut self,
        location: &LocationHandle,
        point: Point,
        kind: MonsterKind,
    ) -> Option<MonsterId> {
        if self.location(location).is_none() {
            return None;
        }
        let id = self.allocate_monster_id();
        let target = self.location_mut(location)?;
        target.monsters.push(Monster { id, kind, point });
        Some(id)
    }

    fn place_object(&mut self, location: &LocationHandle, point: Point, object: &ObjectId) -> bool {
        let Some(target) = self.location_mut(location) else {
            return false;
        };
        let _ = target.objects.insert(point, object.clone());
        true
    }

    fn live_monsters(&self, location: &LocationHandle) -> Option<usize> {
        self.location(location)
            .map(|location| location.monsters.len())
    }
}

/// Messages surfaced to the player on the heads-up display.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Hud {
    messages: Vec<String>,
}

impl Hud {
    /// Creates an empty display.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages shown so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Removes and returns every message shown so far.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}

impl Notifier for Hud {
    fn notify(&mut self, message: &str) {
        trace!(message, "hud message");
        self.messages.push(message.to_owned());
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::KillMonster { monster } => world.kill_monster(monster, out_events),
        Command::ClearLocation { location } => world.clear_location(&location, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use mini_dungeons_core::{LocationHandle, MonsterId, MonsterKind, ObjectId, Point};

    /// Handles of every registered location in creation order.
    #[must_use]
    pub fn locations(world: &World) -> Vec<LocationHandle> {
        world
            .locations
            .iter()
            .map(|location| location.handle.clone())
            .collect()
    }

    /// Reports whether the location is registered.
    #[must_use]
    pub fn has_location(world: &World, handle: &LocationHandle) -> bool {
        world.location(handle).is_some()
    }

    /// Captures the monsters living in the location, ordered by identifier.
    #[must_use]
    pub fn monsters(world: &World, handle: &LocationHandle) -> Vec<MonsterSnapshot> {
        let mut snapshots: Vec<MonsterSnapshot> = world
            .location(handle)
            .map(|location| {
                location
                    .monsters
                    .iter()
                    .map(|monster| MonsterSnapshot {
                        id: monster.id,
                        kind: monster.kind,
                        point: monster.point,
                    })
                    .collect()
            })
            .unwrap_or_default();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Objects placed in the location, ordered by tile.
    #[must_use]
    pub fn objects(world: &World, handle: &LocationHandle) -> Vec<(Point, ObjectId)> {
        world
            .location(handle)
            .map(|location| {
                location
                    .objects
                    .iter()
                    .map(|(point, object)| (*point, object.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Immutable representation of a single monster used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct MonsterSnapshot {
        /// Identifier assigned by the world.
        pub id: MonsterId,
        /// Kind of monster.
        pub kind: MonsterKind,
        /// Tile the monster was placed on.
        pub point: Point,
    }
}

#[derive(Debug)]
struct Location {
    handle: LocationHandle,
    monsters: Vec<Monster>,
    objects: BTreeMap<Point, ObjectId>,
}

impl Location {
    fn new(handle: LocationHandle) -> Self {
        Self {
            handle,
            monsters: Vec::new(),
            objects: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Monster {
    id: MonsterId,
    kind: MonsterKind,
    point: Point,
}
