//! Errors returned by encounter operations.

use crate::dice::DiceError;
use crate::participant::ParticipantId;
use thiserror::Error;

/// Every way an encounter operation can be refused.
///
/// All variants are recoverable: the encounter is left exactly as it was
/// before the rejected call.
#[derive(Debug, Error)]
pub enum CombatError {
    #[error("Invalid encounter: {0}")]
    InvalidEncounter(String),

    #[error("An encounter is already in progress")]
    AlreadyActive,

    #[error("No encounter is in progress")]
    NotActive,

    #[error("No participant with id {0}")]
    ParticipantNotFound(ParticipantId),

    #[error("Participant {0} is not awaiting an initiative roll")]
    NotAwaitingRoll(ParticipantId),

    #[error("It is not {actor}'s turn (current: {current})")]
    NotYourTurn {
        actor: ParticipantId,
        current: ParticipantId,
    },

    #[error("{caster} does not know the spell '{spell}'")]
    UnknownSpell { caster: String, spell: String },

    #[error("{participant} is already {condition}")]
    ConditionAlreadyApplied {
        participant: ParticipantId,
        condition: String,
    },

    #[error("Action rejected: {0}")]
    ActionRejected(String),

    #[error("Dice error: {0}")]
    Dice(#[from] DiceError),
}

pub type Result<T> = std::result::Result<T, CombatError>;
