//! Outbound encounter events.
//!
//! The engine appends an [`EncounterEvent`] for everything a narrator or UI
//! might want to announce. Callers collect them with
//! [`Encounter::drain_events`](crate::Encounter::drain_events) after each
//! operation; nothing here knows how they are delivered.

use crate::action::RollRequest;
use crate::dice::DieType;
use crate::encounter::EncounterSummary;
use crate::participant::ParticipantId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EncounterEvent {
    EncounterStarted {
        participants: usize,
    },
    /// The engine rolled initiative for an engine-controlled participant.
    InitiativeRolled {
        participant: ParticipantId,
        name: String,
        roll: u32,
        modifier: i8,
        total: i32,
    },
    /// A player-controlled participant must roll initiative themselves.
    InitiativeRequested {
        participant: ParticipantId,
        name: String,
        die: DieType,
        modifier: i8,
    },
    InitiativeReported {
        participant: ParticipantId,
        name: String,
        value: i32,
    },
    RoundStarted {
        round: u32,
    },
    TurnStarted {
        participant: ParticipantId,
        name: String,
        round: u32,
        turn: usize,
    },
    ConditionApplied {
        participant: ParticipantId,
        name: String,
        condition: String,
        duration: Option<u32>,
    },
    ConditionRemoved {
        participant: ParticipantId,
        name: String,
        condition: String,
    },
    ConditionExpired {
        participant: ParticipantId,
        name: String,
        condition: String,
    },
    /// The acting participant has to roll and report back.
    RollRequested {
        participant: ParticipantId,
        name: String,
        request: RollRequest,
    },
    AttackResolved {
        attacker: String,
        target: String,
        attack_total: i32,
        target_ac: u8,
        hit: bool,
        critical: bool,
    },
    SpellCast {
        caster: String,
        spell: String,
        targets: Vec<String>,
    },
    ActionTaken {
        actor: String,
        description: String,
    },
    ParticipantJoined {
        participant: ParticipantId,
        name: String,
    },
    ParticipantRemoved {
        participant: ParticipantId,
        name: String,
    },
    EncounterEnded {
        summary: EncounterSummary,
    },
}

impl EncounterEvent {
    /// Narration-ready text for this event.
    pub fn narrative(&self) -> String {
        match self {
            EncounterEvent::EncounterStarted { participants } => {
                format!("Combat begins with {participants} combatants! Roll for initiative.")
            }
            EncounterEvent::InitiativeRolled {
                name,
                roll,
                modifier,
                total,
                ..
            } => format!("{name} rolls initiative: {roll} {} = {total}", signed(*modifier)),
            EncounterEvent::InitiativeRequested {
                name, die, modifier, ..
            } => format!("{name}, roll initiative (1{die} {}).", signed(*modifier)),
            EncounterEvent::InitiativeReported { name, value, .. } => {
                format!("{name} has initiative {value}.")
            }
            EncounterEvent::RoundStarted { round } => format!("Round {round} begins!"),
            EncounterEvent::TurnStarted { name, round, .. } => {
                format!("{name}'s turn (Round {round}).")
            }
            EncounterEvent::ConditionApplied {
                name,
                condition,
                duration,
                ..
            } => match duration {
                Some(1) => format!("{name} is now {condition} for 1 round."),
                Some(rounds) => format!("{name} is now {condition} for {rounds} rounds."),
                None => format!("{name} is now {condition}."),
            },
            EncounterEvent::ConditionRemoved {
                name, condition, ..
            } => format!("{name} is no longer {condition}."),
            EncounterEvent::ConditionExpired {
                name, condition, ..
            } => format!("{name}'s {condition} condition wears off."),
            EncounterEvent::RollRequested { name, request, .. } => {
                format!("{name}: {}", request.instructions())
            }
            EncounterEvent::AttackResolved {
                attacker,
                target,
                attack_total,
                target_ac,
                hit,
                critical,
            } => {
                let verdict = match (hit, critical) {
                    (true, true) => "CRITICAL HIT!",
                    (true, false) => "Hit!",
                    (false, _) => "Miss.",
                };
                format!("{attacker} attacks {target} ({attack_total} vs AC {target_ac}). {verdict}")
            }
            EncounterEvent::SpellCast {
                caster,
                spell,
                targets,
            } => {
                if targets.is_empty() {
                    format!("{caster} casts {spell}.")
                } else {
                    format!("{caster} casts {spell} on {}.", targets.join(", "))
                }
            }
            EncounterEvent::ActionTaken { actor, description } => format!("{actor} {description}."),
            EncounterEvent::ParticipantJoined { name, .. } => format!("{name} joins the fight!"),
            EncounterEvent::ParticipantRemoved { name, .. } => {
                format!("{name} is no longer in the fight.")
            }
            EncounterEvent::EncounterEnded { summary } => format!(
                "Combat ends after {} round(s): {}.",
                summary.rounds, summary.outcome
            ),
        }
    }
}

fn signed(value: i8) -> String {
    if value < 0 {
        format!("- {}", value.unsigned_abs())
    } else {
        format!("+ {value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initiative_narrative() {
        let event = EncounterEvent::InitiativeRolled {
            participant: ParticipantId::new(),
            name: "Goblin".to_string(),
            roll: 10,
            modifier: 2,
            total: 12,
        };
        assert_eq!(event.narrative(), "Goblin rolls initiative: 10 + 2 = 12");

        let event = EncounterEvent::InitiativeRequested {
            participant: ParticipantId::new(),
            name: "Fighter".to_string(),
            die: DieType::D20,
            modifier: -1,
        };
        assert_eq!(event.narrative(), "Fighter, roll initiative (1d20 - 1).");
    }

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = EncounterEvent::RoundStarted { round: 3 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "round_started");
        assert_eq!(json["round"], 3);
    }
}
