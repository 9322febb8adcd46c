mod common;

use common::*;
use horse_husbandry::horse::{BreedingStage, Gender};
use horse_husbandry::{HorseId, HusbandryConfig, Location, WorldAdapter};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Action {
    Heartbeats(u8),
    Breed,
    BodyCondition(u8),
    UnloadHome,
    LoadHome,
    Wander(f64, f64),
    Teleport(f64, f64),
    Respawn,
    Despawn,
    KillStallion,
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => (1u8..20).prop_map(Action::Heartbeats),
        2 => Just(Action::Breed),
        1 => (0u8..12).prop_map(Action::BodyCondition),
        1 => Just(Action::UnloadHome),
        1 => Just(Action::LoadHome),
        1 => (0.0f64..15.9, 0.0f64..15.9).prop_map(|(x, z)| Action::Wander(x, z)),
        1 => (-40.0f64..40.0, -40.0f64..40.0).prop_map(|(x, z)| Action::Teleport(x, z)),
        1 => Just(Action::Respawn),
        1 => Just(Action::Despawn),
        1 => Just(Action::KillStallion),
    ]
}

fn home() -> Location {
    at(3.0, 3.0)
}

fn check_invariants(manager: &Manager) {
    let marker = manager.config().entity_marker.clone();
    for record in manager.records() {
        let horse_id = record.id.expect("tracked records are persisted");
        let carrying = matches!(record.breeding_stage, BreedingStage::Pregnant | BreedingStage::Labor);
        assert_eq!(carrying, record.pregnancy.is_some(), "horse {} stage {:?}", horse_id, record.breeding_stage);
        if record.pregnancy.is_some() {
            assert_eq!(record.gender, Gender::Mare);
        }

        let tagged: Vec<_> = manager
            .world()
            .tagged_with(horse_id)
            .into_iter()
            .filter(|handle| manager.world().tag_of(*handle).map_or(false, |tag| tag.marker == marker))
            .collect();
        assert!(tagged.len() <= 1, "horse {} has {} live entities", horse_id, tagged.len());
        match manager.handle_of(horse_id) {
            Some(handle) => assert_eq!(tagged, vec![handle]),
            None => assert!(tagged.is_empty()),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn records_and_entities_stay_in_step(actions in prop::collection::vec(arb_action(), 1..40)) {
        let config = HusbandryConfig { father_recovery_secs: 10, nurture_secs: 15, miscarriage_recovery_secs: 15, ..quick_config() };
        let (mut manager, (mare_id, _), (stallion_id, _)) = breeding_pair_with(config);
        let mut clock = now();

        for action in actions {
            match action {
                Action::Heartbeats(count) => {
                    for _ in 0..count {
                        clock = clock.plus_secs(1);
                        manager.heartbeat(clock);
                    }
                }
                Action::Breed => {
                    if let (Some(mare), Some(stallion)) = (manager.handle_of(mare_id), manager.handle_of(stallion_id)) {
                        let before = (manager.record(mare_id).cloned(), manager.record(stallion_id).cloned());
                        if manager.breed(mare, stallion, VET, clock).is_err() {
                            prop_assert_eq!((manager.record(mare_id).cloned(), manager.record(stallion_id).cloned()), before);
                        }
                    }
                }
                Action::BodyCondition(score) => {
                    let _ = manager.set_body_condition(mare_id, score);
                }
                Action::UnloadHome => {
                    let chunk = home().chunk();
                    manager.world_mut().unload_chunk(&chunk);
                    manager.on_chunk_unload(&chunk);
                }
                Action::LoadHome => {
                    let chunk = home().chunk();
                    manager.world_mut().load_chunk(chunk.clone());
                    manager.on_chunk_load(&chunk);
                }
                Action::Wander(x, z) => {
                    if let Some(handle) = manager.handle_of(mare_id) {
                        manager.world_mut().move_entity(handle, at(x, z));
                    }
                }
                Action::Teleport(x, z) => {
                    if manager.record(mare_id).is_some() {
                        manager.teleport(mare_id, at(x, z)).expect("teleport");
                    }
                }
                Action::Respawn => {
                    if manager.record(stallion_id).is_some() {
                        manager.spawn(stallion_id, home()).expect("spawn");
                    }
                }
                Action::Despawn => {
                    manager.despawn(mare_id);
                    prop_assert!(!manager.despawn(mare_id));
                }
                Action::KillStallion => {
                    if let Some(handle) = manager.handle_of(stallion_id) {
                        manager.on_entity_death(handle);
                    }
                }
            }
            check_invariants(&manager);
        }

        // Whatever happened, the store holds what memory holds.
        for record in manager.records() {
            let horse_id: HorseId = record.id.expect("persisted");
            prop_assert_eq!(&manager.store().stored(horse_id), record);
        }
    }
}
