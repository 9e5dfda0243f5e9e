use std::collections::HashSet;

use mini_dungeons_core::{ChallengeLookup, ChallengeTable, DungeonDefinition};

/// Inconsistency found between dungeon and challenge definitions.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ContentIssue {
    /// Two dungeons share a name, so their toggles and lookups collide.
    #[error("dungeon `{dungeon}` is defined more than once")]
    DuplicateDungeon {
        /// Repeated dungeon name.
        dungeon: String,
    },
    /// The spawn chance lies outside `[0, 1]`.
    #[error("dungeon `{dungeon}` has spawn chance {chance} outside [0, 1]")]
    SpawnChanceOutOfRange {
        /// Offending dungeon.
        dungeon: String,
        /// Configured chance.
        chance: f64,
    },
    /// The dungeon has maps but all of them weigh zero.
    #[error("dungeon `{dungeon}` has maps but the sum of their weights is 0")]
    ZeroTotalWeight {
        /// Offending dungeon.
        dungeon: String,
    },
    /// A map names a challenge that does not exist.
    #[error("dungeon `{dungeon}` references missing challenge `{challenge}`")]
    MissingChallenge {
        /// Dungeon owning the map.
        dungeon: String,
        /// Name that failed to resolve.
        challenge: String,
    },
    /// A referenced challenge has no waves.
    #[error("challenge `{challenge}` is referenced but has no waves")]
    EmptyChallenge {
        /// Offending challenge.
        challenge: String,
    },
    /// A challenge spawns monsters but has nowhere to put them.
    #[error("challenge `{challenge}` spawns monsters but has no spawn points")]
    MonstersWithoutSpawnPoints {
        /// Offending challenge.
        challenge: String,
    },
    /// Objects are placed by index onto spawn points, and there are too few.
    #[error("challenge `{challenge}` places {objects} objects on only {spawn_points} spawn points")]
    ObjectsExceedSpawnPoints {
        /// Offending challenge.
        challenge: String,
        /// Number of spawned objects.
        objects: usize,
        /// Number of spawn points.
        spawn_points: usize,
    },
}

/// Checks dungeons against the challenge table and reports every issue found.
#[must_use]
pub fn validate(dungeons: &[DungeonDefinition], challenges: &ChallengeTable) -> Vec<ContentIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    let mut referenced = Vec::new();

    for dungeon in dungeons {
        let name = dungeon.name();
        if !seen.insert(name) {
            issues.push(ContentIssue::DuplicateDungeon {
                dungeon: name.to_owned(),
            });
        }

        let chance = dungeon.spawn_chance();
        if !(0.0..=1.0).contains(&chance) {
            issues.push(ContentIssue::SpawnChanceOutOfRange {
                dungeon: name.to_owned(),
                chance,
            });
        }

        let maps = dungeon.maps();
        if !maps.is_empty() && maps.iter().all(|map| map.spawn_weight() == 0) {
            issues.push(ContentIssue::ZeroTotalWeight {
                dungeon: name.to_owned(),
            });
        }

        for map in maps {
            let challenge = map.challenge();
            if challenges.challenge(challenge).is_none() {
                issues.push(ContentIssue::MissingChallenge {
                    dungeon: name.to_owned(),
                    challenge: challenge.to_owned(),
                });
            } else if !referenced.contains(&challenge) {
                referenced.push(challenge);
            }
        }
    }

    for name in referenced {
        let Some(challenge) = challenges.challenge(name) else {
            continue;
        };

        if challenge.waves().is_empty() {
            issues.push(ContentIssue::EmptyChallenge {
                challenge: name.to_owned(),
            });
        }

        let spawns_monsters = challenge.waves().iter().any(|wave| wave.monster_count() > 0);
        if spawns_monsters && challenge.spawn_points().is_empty() {
            issues.push(ContentIssue::MonstersWithoutSpawnPoints {
                challenge: name.to_owned(),
            });
        }

        let objects = challenge.spawned_objects().len();
        let spawn_points = challenge.spawn_points().len();
        if objects > spawn_points {
            issues.push(ContentIssue::ObjectsExceedSpawnPoints {
                challenge: name.to_owned(),
                objects,
                spawn_points,
            });
        }
    }

    issues
}
