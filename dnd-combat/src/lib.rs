//! Turn-based D&D 5e combat encounters for a human or AI Dungeon Master.
//!
//! This crate provides:
//! - Initiative resolution with engine rolls for monsters and deferred
//!   rolls for players
//! - Round/turn scheduling with timed conditions
//! - Attack, spell, ability and move resolution
//! - Narration-ready outbound events
//!
//! The engine is synchronous and owns no global state. Dice come from an
//! injected [`DieRoller`], and the caller drives everything: start an
//! encounter, advance turns, submit actions and end it.
//!
//! # Quick Start
//!
//! ```
//! use dnd_combat::testing::{fighter, goblin};
//! use dnd_combat::{ActionOutcome, ActionRequest, Encounter, EncounterOutcome, RandomRoller};
//!
//! let mut encounter = Encounter::new(RandomRoller::seeded(42));
//! let fighter = fighter();
//! let fighter_id = fighter.id;
//! let goblin = goblin();
//! let goblin_id = goblin.id;
//!
//! encounter.initialize(vec![goblin, fighter])?;
//! encounter.report_initiative(fighter_id, 25)?;
//!
//! // The fighter is player-controlled, so the engine asks for the roll.
//! let outcome = encounter.process_action(ActionRequest::attack(fighter_id, goblin_id))?;
//! assert!(matches!(outcome, ActionOutcome::RollRequired { .. }));
//!
//! for event in encounter.drain_events() {
//!     println!("{}", event.narrative());
//! }
//!
//! encounter.end(EncounterOutcome::Victory)?;
//! # Ok::<(), dnd_combat::CombatError>(())
//! ```

pub mod action;
pub mod condition;
pub mod config;
pub mod dice;
pub mod encounter;
pub mod error;
pub mod events;
pub mod initiative;
pub mod participant;
pub mod session;
pub mod testing;

// Primary public API
pub use action::{
    AcceptAll, ActionHook, ActionKind, ActionOutcome, ActionRequest, AttackOutcome, ExternalRoll,
    ModifierSource, RequireKnownAbilities, RollPurpose, RollRequest, SpellOutcome,
};
pub use condition::{Condition, ConditionApplication, ConditionRemoval, ExpiredCondition, ReapplyPolicy};
pub use config::{ConfigError, EncounterConfig};
pub use dice::{Advantage, DieRoller, DieType, RandomRoller};
pub use encounter::{
    Encounter, EncounterId, EncounterOutcome, EncounterState, EncounterSummary, TurnInfo,
};
pub use error::{CombatError, Result};
pub use events::EncounterEvent;
pub use participant::{Ability, ControlKind, Participant, ParticipantId, Weapon};
pub use session::{EncounterSessions, SharedEncounter};
