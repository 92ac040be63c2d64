//! End-to-end encounter flows driven the way a DM front-end drives them.
//!
//! Run with: `cargo test -p dnd-combat --test encounter_flow`

use dnd_combat::testing::{fighter, goblin, orc, wizard, ScriptedRoller};
use dnd_combat::{
    ActionOutcome, ActionRequest, CombatError, Encounter, EncounterEvent, EncounterOutcome,
    ExternalRoll, Participant, ParticipantId, RollPurpose,
};

/// Install a test-friendly subscriber so `RUST_LOG=debug` shows engine logs.
fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn names<R: dnd_combat::DieRoller>(encounter: &Encounter<R>) -> Vec<String> {
    encounter.order().iter().map(|p| p.name.clone()).collect()
}

// =============================================================================
// Goblin vs Fighter walkthrough
// =============================================================================

#[test]
fn test_goblin_and_fighter_walkthrough() {
    setup();

    let goblin = goblin();
    let fighter = fighter();
    let (goblin_id, fighter_id) = (goblin.id, fighter.id);

    // Goblin rolls 10 (+2 DEX) = 12; the fighter is asked to roll.
    let mut encounter = Encounter::new(ScriptedRoller::new([10]));
    encounter.initialize(vec![goblin, fighter]).unwrap();
    assert_eq!(names(&encounter), ["Goblin", "Fighter"]);
    assert_eq!(encounter.order()[0].initiative, Some(12));
    assert_eq!(encounter.awaiting_initiative(), vec![fighter_id]);

    let events = encounter.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        EncounterEvent::InitiativeRequested { participant, .. } if *participant == fighter_id
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        EncounterEvent::InitiativeRolled { participant, total: 12, .. } if *participant == goblin_id
    )));

    encounter.report_initiative(fighter_id, 15).unwrap();
    assert_eq!(names(&encounter), ["Fighter", "Goblin"]);
    assert!(encounter.awaiting_initiative().is_empty());

    encounter.apply_condition(goblin_id, "poisoned", Some(1)).unwrap();
    encounter.apply_condition(fighter_id, "blessed", Some(1)).unwrap();

    let turn = encounter.advance_turn().unwrap();
    assert_eq!(turn.participant, goblin_id);
    assert_eq!((turn.round, turn.turn), (1, 1));
    assert!(encounter.has_condition(goblin_id, "poisoned"));

    let turn = encounter.advance_turn().unwrap();
    assert_eq!(turn.participant, fighter_id);
    assert_eq!((turn.round, turn.turn), (2, 0));
    assert!(turn.new_round);
    assert_eq!(turn.expired.len(), 2);
    assert!(!encounter.has_condition(goblin_id, "poisoned"));
    assert!(!encounter.has_condition(fighter_id, "blessed"));
}

// =============================================================================
// Turn pointer and rounds
// =============================================================================

#[test]
fn test_n_advances_is_one_round() {
    setup();
    let mut encounter = Encounter::new(ScriptedRoller::new([4, 17, 9, 12]));
    encounter
        .initialize(vec![goblin(), orc(), goblin(), orc()])
        .unwrap();
    let n = encounter.order().len();

    for cycle in 1..=3 {
        for _ in 0..n {
            encounter.advance_turn().unwrap();
        }
        assert_eq!(encounter.round(), 1 + cycle);
        assert_eq!(encounter.turn(), 0);
    }
}

#[test]
fn test_round_includes_late_reported_players() {
    let fighter = fighter();
    let wizard = wizard();
    let (fighter_id, wizard_id) = (fighter.id, wizard.id);
    let mut encounter = Encounter::new(ScriptedRoller::new([10]));
    encounter.initialize(vec![fighter, goblin(), wizard]).unwrap();

    encounter.report_initiative(wizard_id, 3).unwrap();
    assert_eq!(names(&encounter), ["Goblin", "Wizard", "Fighter"]);
    encounter.report_initiative(fighter_id, 20).unwrap();
    assert_eq!(names(&encounter), ["Fighter", "Goblin", "Wizard"]);

    let mut visited = Vec::new();
    for _ in 0..3 {
        visited.push(encounter.current().unwrap().name.clone());
        encounter.advance_turn().unwrap();
    }
    assert_eq!(visited, ["Fighter", "Goblin", "Wizard"]);
    assert_eq!(encounter.round(), 2);
}

#[test]
fn test_condition_duration_two_fires_once() {
    let mut encounter = Encounter::new(ScriptedRoller::new([10, 5]));
    encounter.initialize(vec![goblin(), orc()]).unwrap();
    let orc_id = encounter.order()[1].id;
    encounter.apply_condition(orc_id, "stunned", Some(2)).unwrap();
    encounter.drain_events();

    let mut expiries = 0;
    for round in 1..=4 {
        encounter.advance_turn().unwrap();
        encounter.advance_turn().unwrap();
        let fired = encounter
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, EncounterEvent::ConditionExpired { .. }))
            .count();
        expiries += fired;
        match round {
            1 => assert!(encounter.has_condition(orc_id, "stunned")),
            2 => assert_eq!(fired, 1),
            _ => assert_eq!(fired, 0),
        }
    }
    assert_eq!(expiries, 1);
}

// =============================================================================
// Actions
// =============================================================================

#[test]
fn test_player_attack_round_trip() {
    setup();
    let fighter = fighter();
    let fighter_id = fighter.id;
    let mut encounter = Encounter::new(ScriptedRoller::new([10]));
    encounter.initialize(vec![goblin(), fighter]).unwrap();
    encounter.report_initiative(fighter_id, 15).unwrap();
    let goblin_id = encounter.order()[1].id;

    let outcome = encounter
        .process_action(ActionRequest::attack(fighter_id, goblin_id))
        .unwrap();
    let ActionOutcome::RollRequired { request } = outcome else {
        panic!("player attacks must ask for a roll");
    };
    assert!(matches!(request.purpose, RollPurpose::Attack { .. }));

    let outcome = encounter
        .process_action(
            ActionRequest::attack(fighter_id, goblin_id).with_roll(ExternalRoll::with_natural(20, 15)),
        )
        .unwrap();
    let ActionOutcome::Attack(attack) = outcome else {
        panic!("expected an attack result");
    };
    assert!(attack.hit);
    let damage = attack.damage.expect("hits always ask for damage");
    assert!(matches!(damage.purpose, RollPurpose::Damage { critical: false, .. }));

    // The caller applies damage itself.
    encounter
        .participant_mut(goblin_id)
        .unwrap()
        .stats
        .hit_points
        .current -= 9;
    let summary = encounter.end(EncounterOutcome::Victory).unwrap();
    assert_eq!(summary.survivors, vec![fighter_id]);
    assert_eq!(summary.fallen, vec![goblin_id]);
}

#[test]
fn test_engine_attack_never_asks_for_attack_roll() {
    let mut encounter = Encounter::new(ScriptedRoller::new([10, 2]));
    let fighter = fighter();
    let fighter_id = fighter.id;
    encounter.initialize(vec![goblin(), fighter]).unwrap();
    let goblin_id = encounter.current().unwrap().id;

    let outcome = encounter
        .process_action(ActionRequest::attack(goblin_id, fighter_id))
        .unwrap();
    assert!(matches!(outcome, ActionOutcome::Attack(ref a) if !a.hit && a.damage.is_none()));
}

#[test]
fn test_wrong_actor_and_unknown_actor() {
    let mut encounter = Encounter::new(ScriptedRoller::new([10]));
    let fighter = fighter();
    let fighter_id = fighter.id;
    encounter.initialize(vec![goblin(), fighter]).unwrap();

    let goblin_id = encounter.current().unwrap().id;
    assert!(matches!(
        encounter.process_action(ActionRequest::attack(fighter_id, goblin_id)),
        Err(CombatError::NotYourTurn { .. })
    ));
    assert!(matches!(
        encounter.process_action(ActionRequest::movement(ParticipantId::new(), 30, None)),
        Err(CombatError::ParticipantNotFound(_))
    ));
}

#[test]
fn test_spell_requires_known_spell() {
    let wizard = wizard();
    let wizard_id = wizard.id;
    let mut encounter = Encounter::new(ScriptedRoller::new([1]));
    encounter.initialize(vec![wizard, goblin()]).unwrap();
    encounter.report_initiative(wizard_id, 25).unwrap();
    let goblin_id = encounter.order()[1].id;

    let outcome = encounter
        .process_action(ActionRequest::spell(wizard_id, "Magic Missile", vec![goblin_id]))
        .unwrap();
    assert!(matches!(outcome, ActionOutcome::Spell(_)));

    assert!(matches!(
        encounter.process_action(ActionRequest::spell(wizard_id, "Fireball", vec![])),
        Err(CombatError::UnknownSpell { .. })
    ));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn test_end_twice() {
    let mut encounter = Encounter::new(ScriptedRoller::new([10]));
    encounter.initialize(vec![goblin()]).unwrap();
    assert!(encounter.end(EncounterOutcome::Truce).is_ok());
    assert!(matches!(
        encounter.end(EncounterOutcome::Truce),
        Err(CombatError::NotActive)
    ));

    let ended = encounter
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, EncounterEvent::EncounterEnded { .. }))
        .count();
    assert_eq!(ended, 1);
}

#[test]
fn test_every_event_has_narration() {
    let mut encounter = Encounter::new(ScriptedRoller::new([10, 15]));
    let fighter = fighter();
    let fighter_id = fighter.id;
    encounter.initialize(vec![goblin(), fighter, orc()]).unwrap();
    encounter.report_initiative(fighter_id, 1).unwrap();
    encounter.add_participant(Participant::npc("Wolf")).unwrap();
    encounter.advance_turn().unwrap();
    encounter.end(EncounterOutcome::Defeat).unwrap();

    let events = encounter.drain_events();
    assert!(!events.is_empty());
    for event in events {
        assert!(!event.narrative().is_empty(), "{event:?}");
    }
}
