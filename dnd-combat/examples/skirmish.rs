//! Run a goblin-vs-orc skirmish with real dice, printing the narration.
//!
//! Usage: `cargo run -p dnd-combat --example skirmish [seed]`

use dnd_combat::testing::{goblin, orc};
use dnd_combat::{
    ActionOutcome, ActionRequest, Encounter, EncounterConfig, EncounterOutcome, Participant,
    RandomRoller,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let seed: u64 = std::env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(7);
    let mut damage_dice = RandomRoller::seeded(seed.wrapping_add(1));
    let mut encounter = Encounter::with_config(EncounterConfig::default(), RandomRoller::seeded(seed));

    let mut scout = goblin();
    scout.name = "Goblin Scout".to_string();
    let goblins = vec![goblin().with_hit_points(14), scout.with_hit_points(14)];
    let orc = orc();
    let orc_id = orc.id;

    let mut roster: Vec<Participant> = goblins;
    roster.push(orc);
    encounter.initialize(roster)?;
    print_events(&mut encounter);

    while encounter.round() <= 10 {
        let actor = encounter.current().cloned().ok_or("no current participant")?;
        let target = if actor.id == orc_id {
            encounter.order().iter().find(|p| p.id != orc_id).map(|p| p.id)
        } else {
            Some(orc_id)
        };
        let Some(target) = target else { break };

        if let ActionOutcome::Attack(attack) =
            encounter.process_action(ActionRequest::attack(actor.id, target))?
        {
            if let Some(request) = attack.damage {
                let roll = request.expression.roll_with(&mut damage_dice);
                println!("  {}: {roll}", request.instructions());
                let damage = roll.total.max(0);
                if let Some(hit) = encounter.participant_mut(target) {
                    hit.stats.hit_points.current -= damage;
                }
            }
        }
        print_events(&mut encounter);

        let down = encounter.participant(target).is_some_and(|p| !p.is_alive());
        if down {
            if target == orc_id || encounter.order().len() == 2 {
                let outcome = if target == orc_id {
                    EncounterOutcome::Victory
                } else {
                    EncounterOutcome::Defeat
                };
                let summary = encounter.end(outcome)?;
                print_events(&mut encounter);
                println!("\n{summary:#?}");
                return Ok(());
            }
            encounter.remove_participant(target)?;
        }

        encounter.advance_turn()?;
        print_events(&mut encounter);
    }

    encounter.end(EncounterOutcome::Truce)?;
    print_events(&mut encounter);
    Ok(())
}

fn print_events(encounter: &mut Encounter) {
    for event in encounter.drain_events() {
        println!("{}", event.narrative());
    }
}
