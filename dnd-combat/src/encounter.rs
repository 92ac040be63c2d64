//! The encounter: lifecycle, turn order and round scheduling.
//!
//! An [`Encounter`] is inactive until [`Encounter::initialize`] and returns
//! to inactive on [`Encounter::end`]. While active it is always on exactly
//! one participant's turn, identified by `(round, turn)`:
//!
//! ```
//! use dnd_combat::testing::{fighter, goblin, ScriptedRoller};
//! use dnd_combat::Encounter;
//!
//! let mut encounter = Encounter::new(ScriptedRoller::new([10]));
//! let fighter = fighter();
//! let fighter_id = fighter.id;
//! encounter.initialize(vec![goblin(), fighter]).unwrap();
//! encounter.report_initiative(fighter_id, 15).unwrap();
//!
//! assert_eq!(encounter.current().unwrap().name, "Fighter");
//! let turn = encounter.advance_turn().unwrap();
//! assert_eq!((turn.name.as_str(), turn.round), ("Goblin", 1));
//! ```

use crate::action::{AcceptAll, ActionHook, ActionOutcome, ActionRequest, ActionResolver};
use crate::condition::{
    Condition, ConditionApplication, ConditionRemoval, ConditionTable, ExpiredCondition,
};
use crate::config::EncounterConfig;
use crate::dice::{DieRoller, RandomRoller};
use crate::error::{CombatError, Result};
use crate::events::EncounterEvent;
use crate::initiative::{self, InitiativeResolver};
use crate::participant::{Participant, ParticipantId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one encounter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncounterId(pub Uuid);

impl EncounterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EncounterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EncounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of everything the encounter tracks.
///
/// When `active`, `round >= 1` and `turn < order.len()`. When inactive the
/// order and condition table are empty and `round` is 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterState {
    pub id: Option<EncounterId>,
    pub active: bool,
    pub round: u32,
    pub turn: usize,
    /// Turn order: index 0 acts first each round.
    pub order: Vec<Participant>,
    pub conditions: ConditionTable,
}

/// How the encounter ended, as decided by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterOutcome {
    Victory,
    Defeat,
    Fled,
    Truce,
    Other(String),
}

impl fmt::Display for EncounterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncounterOutcome::Victory => write!(f, "victory"),
            EncounterOutcome::Defeat => write!(f, "defeat"),
            EncounterOutcome::Fled => write!(f, "fled"),
            EncounterOutcome::Truce => write!(f, "truce"),
            EncounterOutcome::Other(tag) => write!(f, "{tag}"),
        }
    }
}

/// What is left once an encounter ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterSummary {
    pub outcome: EncounterOutcome,
    /// Round reached when the encounter ended.
    pub rounds: u32,
    pub survivors: Vec<ParticipantId>,
    pub fallen: Vec<ParticipantId>,
}

/// Whose turn it is after [`Encounter::advance_turn`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnInfo {
    pub participant: ParticipantId,
    pub name: String,
    pub round: u32,
    pub turn: usize,
    /// True when this advance wrapped into a new round.
    pub new_round: bool,
    /// Conditions that ran out at the round boundary, if one was crossed.
    pub expired: Vec<ExpiredCondition>,
}

/// A turn-based combat encounter.
///
/// Owned by whoever runs the session; the engine itself has no shared state,
/// so independent encounters can run side by side.
pub struct Encounter<R: DieRoller = RandomRoller> {
    config: EncounterConfig,
    roller: R,
    hook: Box<dyn ActionHook>,
    state: EncounterState,
    events: Vec<EncounterEvent>,
}

impl Encounter<RandomRoller> {
    /// An encounter rolling with a fresh pseudo-random source.
    pub fn with_random_dice(config: EncounterConfig) -> Self {
        Self::with_config(config, RandomRoller::new())
    }
}

impl<R: DieRoller> Encounter<R> {
    pub fn new(roller: R) -> Self {
        Self::with_config(EncounterConfig::default(), roller)
    }

    pub fn with_config(config: EncounterConfig, roller: R) -> Self {
        Self {
            config,
            roller,
            hook: Box::new(AcceptAll),
            state: EncounterState::default(),
            events: Vec::new(),
        }
    }

    /// Install validation for ability and move actions.
    pub fn with_hook(mut self, hook: impl ActionHook + 'static) -> Self {
        self.hook = Box::new(hook);
        self
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    pub fn state(&self) -> &EncounterState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn round(&self) -> u32 {
        self.state.round
    }

    pub fn turn(&self) -> usize {
        self.state.turn
    }

    pub fn order(&self) -> &[Participant] {
        &self.state.order
    }

    /// The participant whose turn it is, if the encounter is active.
    pub fn current(&self) -> Option<&Participant> {
        if !self.state.active {
            return None;
        }
        self.state.order.get(self.state.turn)
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.state.order.iter().find(|p| p.id == id)
    }

    /// Mutable access for caller-owned changes such as hit points.
    pub fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.state.order.iter_mut().find(|p| p.id == id)
    }

    /// Participants still waiting for a reported initiative value.
    pub fn awaiting_initiative(&self) -> Vec<ParticipantId> {
        self.state
            .order
            .iter()
            .filter(|p| p.awaiting_initiative())
            .map(|p| p.id)
            .collect()
    }

    pub fn conditions_for(&self, id: ParticipantId) -> &[Condition] {
        self.state.conditions.for_participant(id)
    }

    pub fn has_condition(&self, id: ParticipantId, name: &str) -> bool {
        self.state.conditions.has(id, name)
    }

    /// Hand over every event produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<EncounterEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Start an encounter: resolve initiative, round 1, first turn.
    ///
    /// Engine-controlled participants are rolled immediately; player-controlled
    /// participants are queued at the end awaiting [`Self::report_initiative`].
    pub fn initialize(&mut self, participants: Vec<Participant>) -> Result<&[Participant]> {
        if self.state.active {
            return Err(CombatError::AlreadyActive);
        }

        let count = participants.len();
        let resolved = InitiativeResolver::new(&mut self.roller, self.config.initiative_die)
            .resolve(participants)?;

        let id = EncounterId::new();
        self.state = EncounterState {
            id: Some(id),
            active: true,
            round: 1,
            turn: 0,
            order: resolved.order,
            conditions: ConditionTable::new(),
        };

        tracing::info!(encounter = %id, participants = count, "Encounter started");

        self.events
            .push(EncounterEvent::EncounterStarted { participants: count });
        self.events.extend(resolved.events);
        self.events.push(EncounterEvent::RoundStarted { round: 1 });
        self.push_turn_started();

        Ok(self.state.order.as_slice())
    }

    /// Record a player's externally rolled initiative and re-sort the order.
    ///
    /// The turn pointer is left where it is, so calling this once turns are
    /// under way can change who is current.
    pub fn report_initiative(&mut self, id: ParticipantId, value: i32) -> Result<&[Participant]> {
        self.require_active()?;

        let before = self.current().map(|p| p.id);
        let event = initiative::report(&mut self.state.order, id, value)?;
        self.events.push(event);

        let after = self.current().map(|p| p.id);
        if before != after && (self.state.round > 1 || self.state.turn > 0) {
            tracing::warn!(
                participant = %id,
                round = self.state.round,
                turn = self.state.turn,
                "Initiative reported mid-combat changed the current participant"
            );
        }
        tracing::debug!(participant = %id, value, "Initiative reported");

        Ok(self.state.order.as_slice())
    }

    /// End the current turn and move to the next.
    ///
    /// Passing the last slot finishes the round: timed conditions tick down
    /// (expired ones are removed and announced), every `has_acted` flag is
    /// cleared and round `n + 1` starts at the top of the order.
    pub fn advance_turn(&mut self) -> Result<TurnInfo> {
        self.require_active()?;

        let turn = self.state.turn;
        if let Some(current) = self.state.order.get_mut(turn) {
            current.has_acted = true;
        }
        self.state.turn += 1;

        let mut expired = Vec::new();
        let new_round = self.state.turn >= self.state.order.len();
        if new_round {
            expired = self.end_round();
        }

        let current = &self.state.order[self.state.turn];
        let info = TurnInfo {
            participant: current.id,
            name: current.name.clone(),
            round: self.state.round,
            turn: self.state.turn,
            new_round,
            expired,
        };

        tracing::debug!(
            participant = %info.name,
            round = info.round,
            turn = info.turn,
            "Turn advanced"
        );
        self.push_turn_started();

        Ok(info)
    }

    /// End the encounter, counting anyone with hit points left as a survivor.
    pub fn end(&mut self, outcome: EncounterOutcome) -> Result<EncounterSummary> {
        self.end_with(outcome, Participant::is_alive)
    }

    /// End the encounter with a caller-supplied liveness test.
    ///
    /// Ending an encounter that is not active fails with
    /// [`CombatError::NotActive`].
    pub fn end_with<F>(&mut self, outcome: EncounterOutcome, is_alive: F) -> Result<EncounterSummary>
    where
        F: Fn(&Participant) -> bool,
    {
        self.require_active()?;

        let (survivors, fallen): (Vec<&Participant>, Vec<&Participant>) =
            self.state.order.iter().partition(|p| is_alive(*p));

        let summary = EncounterSummary {
            outcome,
            rounds: self.state.round,
            survivors: survivors.iter().map(|p| p.id).collect(),
            fallen: fallen.iter().map(|p| p.id).collect(),
        };

        tracing::info!(
            encounter = ?self.state.id,
            outcome = %summary.outcome,
            rounds = summary.rounds,
            survivors = summary.survivors.len(),
            "Encounter ended"
        );

        self.state = EncounterState::default();
        self.events.push(EncounterEvent::EncounterEnded {
            summary: summary.clone(),
        });
        Ok(summary)
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// Resolve an action for the current participant.
    ///
    /// Player-controlled attacks without a roll come back as
    /// [`ActionOutcome::RollRequired`] and leave the encounter untouched.
    pub fn process_action(&mut self, request: ActionRequest) -> Result<ActionOutcome> {
        self.require_active()?;

        let actor = self
            .participant(request.actor)
            .ok_or(CombatError::ParticipantNotFound(request.actor))?;
        let current = &self.state.order[self.state.turn];
        if actor.id != current.id {
            return Err(CombatError::NotYourTurn {
                actor: actor.id,
                current: current.id,
            });
        }

        tracing::debug!(
            actor = %actor.name,
            action = request.kind.label(),
            "Processing action"
        );

        let resolution = ActionResolver::new(&mut self.roller, &self.config, self.hook.as_ref())
            .resolve(current, &self.state.order, &request.kind)?;

        self.events.extend(resolution.events);
        Ok(resolution.outcome)
    }

    // ------------------------------------------------------------------------
    // Conditions
    // ------------------------------------------------------------------------

    /// Attach a condition. `duration` is in rounds; `None` lasts until removed.
    pub fn apply_condition(
        &mut self,
        id: ParticipantId,
        name: impl Into<String>,
        duration: Option<u32>,
    ) -> Result<ConditionApplication> {
        self.require_active()?;
        let name = name.into();
        let participant_name = self.participant_name(id)?;

        let condition = Condition::new(name.clone(), duration, self.state.round);
        let application = self
            .state
            .conditions
            .apply(id, condition, self.config.reapply_policy);

        if application == ConditionApplication::Rejected {
            return Err(CombatError::ConditionAlreadyApplied {
                participant: id,
                condition: name,
            });
        }

        tracing::debug!(participant = %participant_name, condition = %name, ?duration, ?application, "Condition applied");
        self.events.push(EncounterEvent::ConditionApplied {
            participant: id,
            name: participant_name,
            condition: name,
            duration,
        });
        Ok(application)
    }

    /// Remove every record of the named condition. Absent conditions report
    /// [`ConditionRemoval::NotFound`] rather than failing.
    pub fn remove_condition(&mut self, id: ParticipantId, name: &str) -> Result<ConditionRemoval> {
        self.require_active()?;
        let participant_name = self.participant_name(id)?;

        let removal = self.state.conditions.remove(id, name);
        if let ConditionRemoval::Removed(count) = removal {
            tracing::debug!(participant = %participant_name, condition = name, count, "Condition removed");
            self.events.push(EncounterEvent::ConditionRemoved {
                participant: id,
                name: participant_name,
                condition: name.to_string(),
            });
        }
        Ok(removal)
    }

    // ------------------------------------------------------------------------
    // Roster changes
    // ------------------------------------------------------------------------

    /// Bring a new participant into a running encounter.
    ///
    /// Engine-controlled arrivals roll initiative and slot in behind anyone
    /// they tie with; player-controlled arrivals join the end of the order
    /// awaiting a roll. The current participant stays current either way.
    pub fn add_participant(&mut self, participant: Participant) -> Result<()> {
        self.require_active()?;
        if self.participant(participant.id).is_some() {
            return Err(CombatError::InvalidEncounter(format!(
                "participant id {} is already in the encounter",
                participant.id
            )));
        }

        let (participant, roll_event) =
            InitiativeResolver::new(&mut self.roller, self.config.initiative_die).prepare(participant);

        let index = initiative::insertion_index(&self.state.order, &participant);
        if index <= self.state.turn {
            self.state.turn += 1;
        }

        tracing::debug!(participant = %participant.name, index, "Participant joined");
        self.events.push(EncounterEvent::ParticipantJoined {
            participant: participant.id,
            name: participant.name.clone(),
        });
        self.events.push(roll_event);
        self.state.order.insert(index, participant);
        Ok(())
    }

    /// Take a participant out of a running encounter (death, flight, ...).
    ///
    /// Removing the current participant passes the turn to whoever followed
    /// them, wrapping into the next round if they were last. The final
    /// participant cannot be removed; end the encounter instead.
    pub fn remove_participant(&mut self, id: ParticipantId) -> Result<Participant> {
        self.require_active()?;
        let index = self
            .state
            .order
            .iter()
            .position(|p| p.id == id)
            .ok_or(CombatError::ParticipantNotFound(id))?;

        if self.state.order.len() == 1 {
            return Err(CombatError::InvalidEncounter(
                "cannot remove the last participant; end the encounter instead".to_string(),
            ));
        }

        let removed = self.state.order.remove(index);
        self.state.conditions.forget(id);

        tracing::debug!(participant = %removed.name, index, "Participant removed");
        self.events.push(EncounterEvent::ParticipantRemoved {
            participant: removed.id,
            name: removed.name.clone(),
        });

        if index < self.state.turn {
            self.state.turn -= 1;
        } else if index == self.state.turn {
            if self.state.turn >= self.state.order.len() {
                self.end_round();
            }
            self.push_turn_started();
        }

        Ok(removed)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn require_active(&self) -> Result<()> {
        if self.state.active {
            Ok(())
        } else {
            Err(CombatError::NotActive)
        }
    }

    fn participant_name(&self, id: ParticipantId) -> Result<String> {
        self.participant(id)
            .map(|p| p.name.clone())
            .ok_or(CombatError::ParticipantNotFound(id))
    }

    /// Round boundary: tick conditions, reset `has_acted`, start next round.
    fn end_round(&mut self) -> Vec<ExpiredCondition> {
        let order_ids: Vec<ParticipantId> = self.state.order.iter().map(|p| p.id).collect();
        let expired = self.state.conditions.tick_round(order_ids);

        for gone in &expired {
            let name = self
                .participant(gone.participant)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            tracing::debug!(participant = %name, condition = %gone.condition, "Condition expired");
            self.events.push(EncounterEvent::ConditionExpired {
                participant: gone.participant,
                name,
                condition: gone.condition.clone(),
            });
        }

        for participant in &mut self.state.order {
            participant.has_acted = false;
        }
        self.state.round += 1;
        self.state.turn = 0;

        tracing::debug!(round = self.state.round, "Round started");
        self.events.push(EncounterEvent::RoundStarted {
            round: self.state.round,
        });
        expired
    }

    fn push_turn_started(&mut self) {
        if let Some(current) = self.state.order.get(self.state.turn) {
            self.events.push(EncounterEvent::TurnStarted {
                participant: current.id,
                name: current.name.clone(),
                round: self.state.round,
                turn: self.state.turn,
            });
        }
    }
}
