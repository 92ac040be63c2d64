//! Initiative: who acts in what order.
//!
//! Engine-controlled participants roll immediately. Player-controlled
//! participants are left without a value and a roll is requested from the
//! caller; until it is reported they sit at the end of the order.

use crate::dice::{DieRoller, DieType};
use crate::error::{CombatError, Result};
use crate::events::EncounterEvent;
use crate::participant::{Participant, ParticipantId};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Highest initiative first, participants still awaiting a roll last.
///
/// Stable: equal values keep their prior relative order.
pub fn sort_order(order: &mut [Participant]) {
    order.sort_by(|a, b| by_initiative(a.initiative, b.initiative));
}

fn by_initiative(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Where `participant` belongs in an already sorted `order`: after every
/// entry it does not strictly beat.
pub fn insertion_index(order: &[Participant], participant: &Participant) -> usize {
    order
        .iter()
        .position(|p| by_initiative(participant.initiative, p.initiative) == Ordering::Less)
        .unwrap_or(order.len())
}

/// Rolls and orders initiative with an injected die roller.
pub struct InitiativeResolver<'a, R: DieRoller + ?Sized> {
    roller: &'a mut R,
    die: DieType,
}

/// Turn order plus the announcements produced while establishing it.
#[derive(Debug, Clone)]
pub struct ResolvedInitiative {
    pub order: Vec<Participant>,
    pub events: Vec<EncounterEvent>,
}

impl<'a, R: DieRoller + ?Sized> InitiativeResolver<'a, R> {
    pub fn new(roller: &'a mut R, die: DieType) -> Self {
        Self { roller, die }
    }

    /// Establish the turn order for a fresh encounter.
    ///
    /// Fails with [`CombatError::InvalidEncounter`] for an empty list or a
    /// repeated participant id.
    pub fn resolve(&mut self, participants: Vec<Participant>) -> Result<ResolvedInitiative> {
        if participants.is_empty() {
            return Err(CombatError::InvalidEncounter(
                "an encounter needs at least one participant".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = participants.iter().find(|p| !seen.insert(p.id)) {
            return Err(CombatError::InvalidEncounter(format!(
                "participant id {} appears more than once",
                dup.id
            )));
        }

        let mut events = Vec::with_capacity(participants.len());
        let mut order = Vec::with_capacity(participants.len());
        for participant in participants {
            let (participant, event) = self.prepare(participant);
            events.push(event);
            order.push(participant);
        }

        sort_order(&mut order);
        Ok(ResolvedInitiative { order, events })
    }

    /// Roll for an engine-controlled participant, or clear and request a roll
    /// for a player-controlled one.
    pub fn prepare(&mut self, mut participant: Participant) -> (Participant, EncounterEvent) {
        participant.has_acted = false;
        let modifier = participant.stats.initiative_modifier();

        if participant.control.engine_rolls() {
            let roll = self.roller.roll_one(self.die.sides()).clamp(1, self.die.sides());
            let total = roll as i32 + i32::from(modifier);
            participant.initiative = Some(total);
            tracing::debug!(
                participant = %participant.id,
                name = %participant.name,
                roll,
                modifier,
                total,
                "Rolled initiative"
            );
            let event = EncounterEvent::InitiativeRolled {
                participant: participant.id,
                name: participant.name.clone(),
                roll,
                modifier,
                total,
            };
            (participant, event)
        } else {
            participant.initiative = None;
            tracing::debug!(
                participant = %participant.id,
                name = %participant.name,
                "Awaiting initiative roll from player"
            );
            let event = EncounterEvent::InitiativeRequested {
                participant: participant.id,
                name: participant.name.clone(),
                die: self.die,
                modifier,
            };
            (participant, event)
        }
    }
}

/// Record an externally rolled initiative value and re-sort the whole order.
///
/// Returns the event announcing the value.
pub fn report(order: &mut [Participant], id: ParticipantId, value: i32) -> Result<EncounterEvent> {
    let participant = order
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or(CombatError::ParticipantNotFound(id))?;

    if participant.initiative.is_some() {
        return Err(CombatError::NotAwaitingRoll(id));
    }

    participant.initiative = Some(value);
    let event = EncounterEvent::InitiativeReported {
        participant: id,
        name: participant.name.clone(),
        value,
    };

    sort_order(order);
    Ok(event)
}
