//! Testing utilities for the combat engine.
//!
//! This module provides tools for deterministic tests:
//! - `ScriptedRoller` returns dice faces from a fixed script
//! - Participant fixtures with known stats

use crate::dice::DieRoller;
use crate::participant::{Ability, Participant, Weapon};

/// A die roller that replays a fixed script of faces.
///
/// Faces are handed out in order and the script wraps around once it runs
/// out. Each face is clamped into `1..=sides` for the die being rolled.
#[derive(Debug, Clone)]
pub struct ScriptedRoller {
    script: Vec<u32>,
    next: usize,
    consumed: usize,
}

impl ScriptedRoller {
    pub fn new(script: impl IntoIterator<Item = u32>) -> Self {
        Self {
            script: script.into_iter().collect(),
            next: 0,
            consumed: 0,
        }
    }

    /// Number of dice rolled so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    fn next_face(&mut self) -> u32 {
        if self.script.is_empty() {
            return 1;
        }
        let face = self.script[self.next % self.script.len()];
        self.next += 1;
        face
    }
}

impl DieRoller for ScriptedRoller {
    fn roll(&mut self, count: u32, sides: u32) -> Vec<u32> {
        self.consumed += count as usize;
        (0..count)
            .map(|_| self.next_face().clamp(1, sides.max(1)))
            .collect()
    }
}

/// Goblin: engine-controlled, DEX 14 (+2 initiative), AC 15, scimitar.
pub fn goblin() -> Participant {
    Participant::npc("Goblin")
        .with_hit_points(7)
        .with_armor_class(15)
        .with_ability(Ability::Strength, 8)
        .with_ability(Ability::Dexterity, 14)
        .with_proficiency_bonus(2)
        .with_weapon(Weapon::new("Scimitar", "1d6").finesse())
        .with_known_ability("Nimble Escape")
}

/// Orc: engine-controlled, DEX 12 (+1 initiative), AC 13, greataxe.
pub fn orc() -> Participant {
    Participant::npc("Orc")
        .with_hit_points(15)
        .with_armor_class(13)
        .with_ability(Ability::Strength, 16)
        .with_ability(Ability::Dexterity, 12)
        .with_proficiency_bonus(2)
        .with_weapon(Weapon::new("Greataxe", "1d12"))
}

/// Fighter: player-controlled, STR 16, AC 16, longsword.
pub fn fighter() -> Participant {
    Participant::player("Fighter")
        .with_hit_points(12)
        .with_armor_class(16)
        .with_ability(Ability::Strength, 16)
        .with_ability(Ability::Dexterity, 12)
        .with_proficiency_bonus(2)
        .with_weapon(Weapon::new("Longsword", "1d8"))
        .with_known_ability("Second Wind")
}

/// Wizard: player-controlled, knows Fire Bolt and Magic Missile.
pub fn wizard() -> Participant {
    Participant::player("Wizard")
        .with_hit_points(8)
        .with_armor_class(12)
        .with_ability(Ability::Dexterity, 14)
        .with_ability(Ability::Intelligence, 16)
        .with_proficiency_bonus(2)
        .with_spell("Fire Bolt")
        .with_spell("Magic Missile")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_wraps_and_clamps() {
        let mut roller = ScriptedRoller::new([3, 25]);
        assert_eq!(roller.roll(3, 20), vec![3, 20, 3]);
        assert_eq!(roller.roll_one(6), 6);
        assert_eq!(roller.consumed(), 4);
    }

    #[test]
    fn test_empty_script_rolls_ones() {
        let mut roller = ScriptedRoller::new([]);
        assert_eq!(roller.roll(2, 8), vec![1, 1]);
    }
}
