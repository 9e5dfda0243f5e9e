use std::sync::Arc;

use mini_dungeons_core::{
    ChallengeDefinition, ChallengeTable, Command, DungeonDefinition, Event, LifecycleState,
    MapVariant, MonsterSpawn, ObjectId, Point, SpawnSettings, SpawnedObject, Wave,
    DUNGEON_CLEARED_MESSAGE,
};
use mini_dungeons_system_dungeon::{DungeonManager, KillOutcome};
use mini_dungeons_world::{apply, query, Hud, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Enables every dungeon except the listed ones.
struct Blocklist(Vec<&'static str>);

impl SpawnSettings for Blocklist {
    fn spawning_enabled(&self, dungeon: &str) -> bool {
        !self.0.contains(&dungeon)
    }

    fn hud_notification_enabled(&self) -> bool {
        true
    }
}

fn challenges() -> Arc<ChallengeTable> {
    let table: ChallengeTable = [
        (
            "Den",
            ChallengeDefinition::new(
                vec![
                    Wave::new(vec![MonsterSpawn::new("GreenSlime", 2)]),
                    Wave::new(vec![MonsterSpawn::new("GreenSlime", 4)]),
                ],
                vec![Point::new(3, 3), Point::new(6, 3), Point::new(9, 5)],
                vec![SpawnedObject::new(ObjectId::new("93"))],
            ),
        ),
        (
            "Gauntlet",
            ChallengeDefinition::new(
                vec![
                    Wave::new(vec![MonsterSpawn::new("GreenSlime", 1)]),
                    Wave::new(vec![MonsterSpawn::new("GreenSlime", 1)]),
                    Wave::new(vec![MonsterSpawn::new("GreenSlime", 1)]),
                ],
                vec![Point::new(1, 1)],
                vec![],
            ),
        ),
    ]
    .into_iter()
    .collect();
    Arc::new(table)
}

fn dungeons() -> Vec<DungeonDefinition> {
    vec![
        DungeonDefinition::new(
            "Slime Dungeon",
            vec![
                MapVariant::new("Den", 3, Point::new(8, 14)),
                MapVariant::new("Gauntlet", 1, Point::new(4, 20)),
            ],
            1.0,
            "Forest",
            Point::new(62, 28),
        ),
        DungeonDefinition::new(
            "Mountain Hollow",
            vec![MapVariant::new("Gauntlet", 1, Point::new(6, 10))],
            1.0,
            "Mountain",
            Point::new(41, 9),
        ),
        DungeonDefinition::new(
            "Sealed Vault",
            vec![MapVariant::new("Den", 1, Point::new(2, 2))],
            1.0,
            "Town",
            Point::new(5, 5),
        ),
    ]
}

#[test]
fn a_full_day_opens_clears_and_removes_dungeons() {
    let mut manager = DungeonManager::new(dungeons(), challenges());
    let mut world = World::new();
    let mut hud = Hud::new();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let settings = Blocklist(vec!["Sealed Vault"]);

    assert!(manager.spawning_enabled_for("Slime Dungeon", &settings));
    assert!(!manager.spawning_enabled_for("Sealed Vault", &settings));
    assert!(!manager.spawning_enabled_for("Unknown", &settings));

    let portals = manager.start_day(&settings, &mut world, &mut rng);
    let opened: Vec<&str> = portals.iter().map(|portal| portal.dungeon.as_str()).collect();
    assert_eq!(opened, ["Slime Dungeon", "Mountain Hollow"]);
    assert_eq!(query::locations(&world).len(), 2);
    assert_eq!(
        manager.dungeon("Sealed Vault").map(|dungeon| dungeon.state()),
        Some(LifecycleState::None)
    );

    for portal in &portals {
        assert_eq!(portal.location.name(), format!("MiniDungeons.{}_1", portal.dungeon));
        let dungeon = manager.dungeon(&portal.dungeon).expect("dungeon exists");
        assert_eq!(portal.arrival_point, dungeon.exit_portal_point());
        assert_eq!(portal.portal_point, dungeon.entry_portal_point());

        let first = manager
            .player_entered(&portal.location, &mut world, &mut rng)
            .expect("location belongs to a dungeon")
            .expect("first wave spawns");
        assert_eq!(first.wave(), 0);
        assert!(!first.monsters().is_empty());

        let mut cleared = false;
        for _ in 0..100 {
            let Some(target) = query::monsters(&world, &portal.location).first().copied() else {
                break;
            };
            let mut events = Vec::new();
            apply(
                &mut world,
                Command::KillMonster { monster: target.id },
                &mut events,
            );
            let killed: Vec<_> = events
                .iter()
                .map(|event| match event {
                    Event::MonsterKilled { monster, .. } => *monster,
                })
                .collect();

            let outcomes =
                manager.on_monster_killed(&killed, &mut world, &mut rng, &settings, &mut hud);
            for (name, outcome) in outcomes {
                assert_eq!(name, portal.dungeon, "only the running dungeon reacts");
                if outcome == KillOutcome::Cleared {
                    cleared = true;
                }
            }
            if cleared {
                break;
            }
        }

        assert!(cleared, "{} should be cleared", portal.dungeon);
        assert_eq!(
            manager.dungeon(&portal.dungeon).map(|dungeon| dungeon.state()),
            Some(LifecycleState::Cleared)
        );
    }

    assert_eq!(hud.messages(), [DUNGEON_CLEARED_MESSAGE, DUNGEON_CLEARED_MESSAGE]);

    assert_eq!(manager.end_day(&mut world), 2);
    assert!(query::locations(&world).is_empty());
}

#[test]
fn unknown_locations_are_not_routed() {
    let mut manager = DungeonManager::new(dungeons(), challenges());
    let mut world = World::new();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let stranger = mini_dungeons_core::LocationHandle::new("Farm");
    assert!(manager
        .player_entered(&stranger, &mut world, &mut rng)
        .is_none());
}

#[test]
fn next_day_starts_from_a_clean_slate() {
    let mut manager = DungeonManager::new(dungeons(), challenges());
    let mut world = World::new();
    let mut rng = ChaCha8Rng::seed_from_u64(77);
    let settings = Blocklist(vec![]);

    let first = manager.start_day(&settings, &mut world, &mut rng);
    assert_eq!(first.len(), 3);
    let entered = manager
        .player_entered(&first[0].location, &mut world, &mut rng)
        .expect("routed");
    assert!(entered.is_ok());
    assert_eq!(manager.end_day(&mut world), 3);

    let second = manager.start_day(&settings, &mut world, &mut rng);
    assert_eq!(second.len(), 3);
    for dungeon in manager.dungeons() {
        assert_eq!(dungeon.state(), LifecycleState::Spawned);
        assert_eq!(dungeon.current_wave_index(), None);
        assert_eq!(dungeon.active_locations().len(), 1);
    }
    assert_eq!(query::locations(&world).len(), 3);
}

#[test]
fn deaths_outside_dungeons_are_ignored() {
    let mut manager = DungeonManager::new(dungeons(), challenges());
    let mut world = World::new();
    let mut hud = Hud::new();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let settings = Blocklist(vec![]);

    let _ = manager.start_day(&settings, &mut world, &mut rng);
    let outcomes = manager.on_monster_killed(&[], &mut world, &mut rng, &settings, &mut hud);
    assert!(outcomes.is_empty(), "no dungeon has a wave running yet");
}

#[test]
fn single_map_dungeon_walkthrough() {
    use mini_dungeons_core::LocationRegistry;
    use mini_dungeons_system_dungeon::{Dungeon, PortalOutcome};

    struct Enabled;

    impl SpawnSettings for Enabled {
        fn spawning_enabled(&self, _dungeon: &str) -> bool {
            true
        }

        fn hud_notification_enabled(&self) -> bool {
            true
        }
    }

    let table: ChallengeTable = [(
        "C1",
        ChallengeDefinition::new(
            vec![
                Wave::new(vec![MonsterSpawn::new("GreenSlime", 2)]),
                Wave::new(vec![MonsterSpawn::new("GreenSlime", 1)]),
            ],
            vec![Point::new(2, 3), Point::new(5, 8)],
            vec![],
        ),
    )]
    .into_iter()
    .collect();
    let definition = DungeonDefinition::new(
        "Walkthrough",
        vec![MapVariant::new("C1", 1, Point::new(1, 1))],
        1.0,
        "Forest",
        Point::new(10, 10),
    );
    let mut dungeon = Dungeon::new(definition, Arc::new(table));
    let mut world = World::new();
    let mut hud = Hud::new();
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    dungeon.day_reset();
    assert_eq!(
        dungeon.try_to_spawn_portal(&Enabled, &mut rng),
        PortalOutcome::Spawned
    );
    assert_eq!(dungeon.state(), LifecycleState::Spawned);
    let location = dungeon
        .create_dungeon_location(&mut world, &mut rng)
        .expect("location");

    let first = dungeon.initialize(&mut world, &mut rng).expect("wave 0");
    assert_eq!(first.monsters().len(), 2);
    assert_eq!(dungeon.current_wave_index(), Some(0));

    let mut events = Vec::new();
    for &monster in first.monsters() {
        apply(&mut world, Command::KillMonster { monster }, &mut events);
    }
    let killed: Vec<_> = events
        .drain(..)
        .map(|event| match event {
            Event::MonsterKilled { monster, .. } => monster,
        })
        .collect();
    let outcome = dungeon.on_monster_killed(&killed, &mut world, &mut rng, &Enabled, &mut hud);
    let second = match outcome {
        KillOutcome::WaveSpawned(report) => report,
        other => panic!("expected the second wave, got {other:?}"),
    };
    assert_eq!(second.monsters().len(), 1);
    assert_eq!(dungeon.current_wave_index(), Some(1));
    assert_eq!(world.live_monsters(&location), Some(1));

    apply(
        &mut world,
        Command::KillMonster {
            monster: second.monsters()[0],
        },
        &mut events,
    );
    assert_eq!(
        dungeon.on_monster_killed(
            second.monsters(),
            &mut world,
            &mut rng,
            &Enabled,
            &mut hud,
        ),
        KillOutcome::Cleared
    );
    assert_eq!(dungeon.state(), LifecycleState::Cleared);
    assert_eq!(hud.messages(), [DUNGEON_CLEARED_MESSAGE]);
}
