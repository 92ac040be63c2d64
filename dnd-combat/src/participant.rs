//! Creatures taking part in an encounter.
//!
//! A [`Participant`] carries just enough of a character sheet for the
//! engine to order turns and resolve attacks: hit points, armor class,
//! ability scores, proficiency, an equipped weapon and the names of the
//! spells and abilities it knows.

use crate::dice::{DiceError, DiceExpression};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identity
// ============================================================================

/// Caller-assigned identity of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who drives a participant, and therefore who rolls its dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    /// Operated by a human; rolls are supplied from outside the engine.
    Player,
    /// Monster or NPC; the engine rolls on its behalf.
    Engine,
}

impl ControlKind {
    pub fn engine_rolls(&self) -> bool {
        matches!(self, ControlKind::Engine)
    }
}

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Declared ability scores. Undeclared abilities contribute a +0 modifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityScores {
    pub strength: Option<u8>,
    pub dexterity: Option<u8>,
    pub constitution: Option<u8>,
    pub intelligence: Option<u8>,
    pub wisdom: Option<u8>,
    pub charisma: Option<u8>,
}

impl AbilityScores {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, ability: Ability) -> &mut Option<u8> {
        match ability {
            Ability::Strength => &mut self.strength,
            Ability::Dexterity => &mut self.dexterity,
            Ability::Constitution => &mut self.constitution,
            Ability::Intelligence => &mut self.intelligence,
            Ability::Wisdom => &mut self.wisdom,
            Ability::Charisma => &mut self.charisma,
        }
    }

    pub fn declare(&mut self, ability: Ability, score: u8) {
        *self.slot(ability) = Some(score);
    }

    pub fn get(&self, ability: Ability) -> Option<u8> {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    /// Score 8-9 = -1, 10-11 = 0, 12-13 = +1, etc.
    pub fn modifier(&self, ability: Ability) -> i8 {
        self.get(ability)
            .map(|score| (i16::from(score) - 10).div_euclid(2) as i8)
            .unwrap_or(0)
    }
}

// ============================================================================
// Combat Stats
// ============================================================================

/// Hit points tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i32,
    pub maximum: i32,
}

impl HitPoints {
    pub fn new(maximum: i32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    pub fn is_down(&self) -> bool {
        self.current <= 0
    }
}

/// An equipped weapon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    /// Damage notation, e.g. "1d8". A bare number is flat damage.
    pub damage_dice: String,
    pub finesse: bool,
    pub ranged: bool,
    /// Magic or other flat bonus to the attack roll.
    pub attack_bonus: i8,
}

impl Weapon {
    pub fn new(name: impl Into<String>, damage_dice: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            damage_dice: damage_dice.into(),
            finesse: false,
            ranged: false,
            attack_bonus: 0,
        }
    }

    pub fn unarmed() -> Self {
        Self::new("Unarmed Strike", "1")
    }

    pub fn finesse(mut self) -> Self {
        self.finesse = true;
        self
    }

    pub fn ranged(mut self) -> Self {
        self.ranged = true;
        self
    }

    pub fn with_attack_bonus(mut self, bonus: i8) -> Self {
        self.attack_bonus = bonus;
        self
    }

    /// Ranged: DEX. Finesse: the better of STR and DEX. Otherwise STR.
    pub fn attack_ability(&self, scores: &AbilityScores) -> Ability {
        if self.ranged {
            Ability::Dexterity
        } else if self.finesse
            && scores.modifier(Ability::Dexterity) > scores.modifier(Ability::Strength)
        {
            Ability::Dexterity
        } else {
            Ability::Strength
        }
    }

    pub fn damage_expression(&self) -> Result<DiceExpression, DiceError> {
        DiceExpression::parse(&self.damage_dice)
    }
}

/// The part of a character sheet combat cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub hit_points: HitPoints,
    pub armor_class: u8,
    pub ability_scores: AbilityScores,
    pub proficiency_bonus: i8,
    /// Ability whose modifier drives initiative.
    pub initiative_ability: Ability,
    pub weapon: Option<Weapon>,
    pub known_spells: Vec<String>,
    pub known_abilities: Vec<String>,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            hit_points: HitPoints::new(1),
            armor_class: 10,
            ability_scores: AbilityScores::new(),
            proficiency_bonus: 0,
            initiative_ability: Ability::Dexterity,
            weapon: None,
            known_spells: Vec::new(),
            known_abilities: Vec::new(),
        }
    }
}

impl CombatStats {
    pub fn initiative_modifier(&self) -> i8 {
        self.ability_scores.modifier(self.initiative_ability)
    }

    pub fn knows_spell(&self, spell: &str) -> bool {
        self.known_spells.iter().any(|s| s.eq_ignore_ascii_case(spell))
    }

    pub fn knows_ability(&self, ability: &str) -> bool {
        self.known_abilities
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ability))
    }
}

// ============================================================================
// Participant
// ============================================================================

/// One creature in the encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub control: ControlKind,
    pub stats: CombatStats,
    /// Absent until rolled by the engine or reported by the caller.
    pub initiative: Option<i32>,
    pub has_acted: bool,
}

impl Participant {
    pub fn new(name: impl Into<String>, control: ControlKind) -> Self {
        Self {
            id: ParticipantId::new(),
            name: name.into(),
            control,
            stats: CombatStats::default(),
            initiative: None,
            has_acted: false,
        }
    }

    /// A human-operated participant.
    pub fn player(name: impl Into<String>) -> Self {
        Self::new(name, ControlKind::Player)
    }

    /// An engine-operated participant (monster or NPC).
    pub fn npc(name: impl Into<String>) -> Self {
        Self::new(name, ControlKind::Engine)
    }

    pub fn with_id(mut self, id: ParticipantId) -> Self {
        self.id = id;
        self
    }

    pub fn with_hit_points(mut self, maximum: i32) -> Self {
        self.stats.hit_points = HitPoints::new(maximum);
        self
    }

    pub fn with_armor_class(mut self, ac: u8) -> Self {
        self.stats.armor_class = ac;
        self
    }

    pub fn with_ability(mut self, ability: Ability, score: u8) -> Self {
        self.stats.ability_scores.declare(ability, score);
        self
    }

    pub fn with_proficiency_bonus(mut self, bonus: i8) -> Self {
        self.stats.proficiency_bonus = bonus;
        self
    }

    pub fn with_initiative_ability(mut self, ability: Ability) -> Self {
        self.stats.initiative_ability = ability;
        self
    }

    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.stats.weapon = Some(weapon);
        self
    }

    pub fn with_spell(mut self, spell: impl Into<String>) -> Self {
        self.stats.known_spells.push(spell.into());
        self
    }

    pub fn with_known_ability(mut self, ability: impl Into<String>) -> Self {
        self.stats.known_abilities.push(ability.into());
        self
    }

    pub fn awaiting_initiative(&self) -> bool {
        self.initiative.is_none()
    }

    pub fn is_alive(&self) -> bool {
        !self.stats.hit_points.is_down()
    }

    /// The weapon in hand, or an unarmed strike.
    pub fn weapon(&self) -> Weapon {
        self.stats.weapon.clone().unwrap_or_else(Weapon::unarmed)
    }
}
