//! Timed status conditions.
//!
//! Conditions are free-form name tags ("poisoned", "stunned", ...) bound to a
//! participant, optionally limited to a number of rounds. Durations tick down
//! only at round boundaries; see [`ConditionTable::tick_round`].

use crate::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named, optionally time-limited effect on one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    /// Rounds left; `None` lasts until removed.
    pub remaining_rounds: Option<u32>,
    pub round_applied: u32,
}

impl Condition {
    pub fn new(name: impl Into<String>, remaining_rounds: Option<u32>, round_applied: u32) -> Self {
        Self {
            name: name.into(),
            remaining_rounds,
            round_applied,
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Count down one round. Returns true once the condition has run out.
    fn tick(&mut self) -> bool {
        match self.remaining_rounds.as_mut() {
            Some(rounds) => {
                *rounds = rounds.saturating_sub(1);
                *rounds == 0
            }
            None => false,
        }
    }
}

/// What happens when a condition is applied to someone who already has it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReapplyPolicy {
    /// Replace the existing record(s) with the new duration.
    #[default]
    Refresh,
    /// Keep both records; each expires on its own.
    Stack,
    /// Refuse the second application.
    Reject,
}

/// Result of applying a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionApplication {
    Applied,
    Refreshed,
    Stacked,
    /// The policy refused a repeat application; nothing changed.
    Rejected,
}

/// Result of removing a condition. Removing something absent is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionRemoval {
    Removed(usize),
    NotFound,
}

/// A condition that ran out at a round boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiredCondition {
    pub participant: ParticipantId,
    pub condition: String,
}

/// Conditions keyed by the participant they are attached to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionTable {
    entries: HashMap<ParticipantId, Vec<Condition>>,
}

impl ConditionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    pub fn for_participant(&self, id: ParticipantId) -> &[Condition] {
        self.entries.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, id: ParticipantId, name: &str) -> bool {
        self.for_participant(id).iter().any(|c| c.is_named(name))
    }

    pub fn apply(&mut self, id: ParticipantId, condition: Condition, policy: ReapplyPolicy) -> ConditionApplication {
        let records = self.entries.entry(id).or_default();
        let already = records.iter().any(|c| c.is_named(&condition.name));

        if !already {
            records.push(condition);
            return ConditionApplication::Applied;
        }

        match policy {
            ReapplyPolicy::Refresh => {
                records.retain(|c| !c.is_named(&condition.name));
                records.push(condition);
                ConditionApplication::Refreshed
            }
            ReapplyPolicy::Stack => {
                records.push(condition);
                ConditionApplication::Stacked
            }
            ReapplyPolicy::Reject => ConditionApplication::Rejected,
        }
    }

    pub fn remove(&mut self, id: ParticipantId, name: &str) -> ConditionRemoval {
        let Some(records) = self.entries.get_mut(&id) else {
            return ConditionRemoval::NotFound;
        };
        let before = records.len();
        records.retain(|c| !c.is_named(name));
        match before - records.len() {
            0 => ConditionRemoval::NotFound,
            n => ConditionRemoval::Removed(n),
        }
    }

    /// Drop everything attached to a participant leaving the encounter.
    pub fn forget(&mut self, id: ParticipantId) {
        self.entries.remove(&id);
    }

    /// End-of-round processing.
    ///
    /// Decrements every timed condition once, removes those that reach zero
    /// and reports them, visiting participants in `order`. Indefinite
    /// conditions are untouched.
    pub fn tick_round(&mut self, order: impl IntoIterator<Item = ParticipantId>) -> Vec<ExpiredCondition> {
        let mut expired = Vec::new();
        for id in order {
            let Some(records) = self.entries.get_mut(&id) else {
                continue;
            };
            records.retain_mut(|condition| {
                if condition.tick() {
                    expired.push(ExpiredCondition {
                        participant: id,
                        condition: condition.name.clone(),
                    });
                    false
                } else {
                    true
                }
            });
        }
        expired
    }
}
