//! Dice for the combat engine.
//!
//! The engine never reaches for a random source directly. Every roll goes
//! through a [`DieRoller`], so tests can script results and front-ends can
//! animate or audit them. Notation parsing (`XdY+Z`, `kh`/`kl`) is kept for
//! weapon damage and for describing rolls the caller has to make.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice parsing.
#[derive(Debug, Error)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
    #[error("Cannot keep {keep} dice when only rolling {count} (in {notation})")]
    InvalidKeepCount {
        keep: u32,
        count: u32,
        notation: String,
    },
    #[error("Too many dice: {count} (at most {max} per term)", max = MAX_DICE)]
    TooManyDice { count: u32 },
    #[error("Modifier out of range in {0}")]
    ModifierOutOfRange(String),
}

/// Largest die count accepted in one notation term.
pub const MAX_DICE: u32 = 1000;

/// Largest flat modifier magnitude accepted by the parser.
pub const MAX_MODIFIER: i32 = 10_000;

/// Capability to roll `count` dice with `sides` faces each.
///
/// Implementations return one entry per die, each in `1..=sides`.
pub trait DieRoller {
    fn roll(&mut self, count: u32, sides: u32) -> Vec<u32>;

    /// Roll a single die.
    fn roll_one(&mut self, sides: u32) -> u32 {
        self.roll(1, sides).first().copied().unwrap_or(1)
    }
}

impl<R: DieRoller + ?Sized> DieRoller for &mut R {
    fn roll(&mut self, count: u32, sides: u32) -> Vec<u32> {
        (**self).roll(count, sides)
    }
}

impl<R: DieRoller + ?Sized> DieRoller for Box<R> {
    fn roll(&mut self, count: u32, sides: u32) -> Vec<u32> {
        (**self).roll(count, sides)
    }
}

/// Pseudo-random roller backed by [`StdRng`].
#[derive(Debug, Clone)]
pub struct RandomRoller {
    rng: StdRng,
}

impl RandomRoller {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for replays.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomRoller {
    fn default() -> Self {
        Self::new()
    }
}

impl DieRoller for RandomRoller {
    fn roll(&mut self, count: u32, sides: u32) -> Vec<u32> {
        let sides = sides.max(1);
        (0..count).map(|_| self.rng.gen_range(1..=sides)).collect()
    }
}

/// Advantage state for d20 rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Advantage {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

impl Advantage {
    /// Combine two advantage states (advantage + disadvantage = normal).
    pub fn combine(self, other: Advantage) -> Advantage {
        match (self, other) {
            (Advantage::Normal, x) | (x, Advantage::Normal) => x,
            (Advantage::Advantage, Advantage::Disadvantage) => Advantage::Normal,
            (Advantage::Disadvantage, Advantage::Advantage) => Advantage::Normal,
            (Advantage::Advantage, Advantage::Advantage) => Advantage::Advantage,
            (Advantage::Disadvantage, Advantage::Disadvantage) => Advantage::Disadvantage,
        }
    }
}

/// Standard D&D die types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// A single die component of a dice expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceComponent {
    pub count: u32,
    pub die_type: DieType,
    pub keep_highest: Option<u32>,
    pub keep_lowest: Option<u32>,
}

/// A complete dice expression (e.g., 2d6+3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub components: Vec<DiceComponent>,
    pub modifier: i32,
}

impl DiceExpression {
    /// A plain `NdS+M` expression.
    pub fn simple(count: u32, die_type: DieType, modifier: i32) -> Self {
        Self {
            components: vec![DiceComponent {
                count,
                die_type,
                keep_highest: None,
                keep_lowest: None,
            }],
            modifier,
        }
    }

    /// Parse a dice notation string.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation = notation.trim().to_lowercase();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let mut components = Vec::new();
        let mut modifier: i32 = 0;
        let mut current = String::new();
        let mut sign: i32 = 1;

        for ch in notation.chars() {
            match ch {
                '+' | '-' => {
                    if !current.is_empty() {
                        Self::parse_component(&current, sign, &mut components, &mut modifier)?;
                        current.clear();
                    }
                    sign = if ch == '+' { 1 } else { -1 };
                }
                ' ' => continue,
                _ => current.push(ch),
            }
        }

        if !current.is_empty() {
            Self::parse_component(&current, sign, &mut components, &mut modifier)?;
        }

        if components.is_empty() && modifier == 0 {
            return Err(DiceError::NoDice);
        }
        if !(-MAX_MODIFIER..=MAX_MODIFIER).contains(&modifier) {
            return Err(DiceError::ModifierOutOfRange(notation));
        }

        Ok(DiceExpression {
            components,
            modifier,
        })
    }

    fn parse_component(
        s: &str,
        sign: i32,
        components: &mut Vec<DiceComponent>,
        modifier: &mut i32,
    ) -> Result<(), DiceError> {
        let Some(d_pos) = s.find('d') else {
            let value: i32 = s
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;
            *modifier = sign
                .checked_mul(value)
                .and_then(|term| modifier.checked_add(term))
                .ok_or_else(|| DiceError::ModifierOutOfRange(s.to_string()))?;
            return Ok(());
        };

        let count_str = &s[..d_pos];
        let rest = &s[d_pos + 1..];

        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))?
        };
        if count > MAX_DICE {
            return Err(DiceError::TooManyDice { count });
        }

        let parse_keep = |digits: &str| -> Result<u32, DiceError> {
            digits
                .parse()
                .map_err(|_| DiceError::InvalidNotation(s.to_string()))
        };

        let (sides_str, keep_highest, keep_lowest) = if let Some(kh_pos) = rest.find("kh") {
            (&rest[..kh_pos], Some(parse_keep(&rest[kh_pos + 2..])?), None)
        } else if let Some(kl_pos) = rest.find("kl") {
            (&rest[..kl_pos], None, Some(parse_keep(&rest[kl_pos + 2..])?))
        } else {
            (rest, None, None)
        };

        let sides: u32 = sides_str
            .parse()
            .map_err(|_| DiceError::InvalidNotation(s.to_string()))?;

        let die_type = DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))?;

        if let Some(keep) = keep_highest.or(keep_lowest) {
            if keep > count {
                return Err(DiceError::InvalidKeepCount {
                    keep,
                    count,
                    notation: s.to_string(),
                });
            }
        }

        components.push(DiceComponent {
            count,
            die_type,
            keep_highest,
            keep_lowest,
        });
        Ok(())
    }

    /// Same expression with every die count doubled (critical hit damage).
    pub fn doubled_dice(&self) -> Result<Self, DiceError> {
        let double = |n: u32| n.checked_mul(2).ok_or(DiceError::TooManyDice { count: n });
        let mut doubled = self.clone();
        for component in &mut doubled.components {
            component.count = double(component.count)?;
            component.keep_highest = component.keep_highest.map(double).transpose()?;
            component.keep_lowest = component.keep_lowest.map(double).transpose()?;
        }
        Ok(doubled)
    }

    /// Same expression with `bonus` added to the flat modifier.
    pub fn plus(&self, bonus: i32) -> Result<Self, DiceError> {
        let mut out = self.clone();
        out.modifier = self
            .modifier
            .checked_add(bonus)
            .ok_or_else(|| DiceError::ModifierOutOfRange(format!("{self} + {bonus}")))?;
        Ok(out)
    }

    /// Roll the expression with the given roller.
    pub fn roll_with<R: DieRoller + ?Sized>(&self, roller: &mut R) -> RollResult {
        let mut component_results = Vec::new();

        for component in &self.components {
            let sides = component.die_type.sides();
            let rolls: Vec<u32> = roller
                .roll(component.count, sides)
                .into_iter()
                .map(|r| r.clamp(1, sides))
                .collect();

            let mut kept = rolls.clone();
            if let Some(keep) = component.keep_highest {
                kept.sort_by(|a, b| b.cmp(a));
                kept.truncate(keep as usize);
            } else if let Some(keep) = component.keep_lowest {
                kept.sort();
                kept.truncate(keep as usize);
            }

            let subtotal = kept.iter().fold(0u32, |acc, r| acc.saturating_add(*r));
            component_results.push(ComponentResult {
                die_type: component.die_type,
                rolls,
                kept,
                subtotal,
            });
        }

        let dice_total = component_results.iter().fold(0i32, |acc, c| {
            acc.saturating_add(i32::try_from(c.subtotal).unwrap_or(i32::MAX))
        });

        // Natural 20/1 only means something for a lone d20 (attack rolls).
        let natural = component_results
            .iter()
            .find(|c| c.die_type == DieType::D20 && c.kept.len() == 1)
            .and_then(|c| c.kept.first().copied());

        RollResult {
            expression: self.clone(),
            component_results,
            modifier: self.modifier,
            total: dice_total.saturating_add(self.modifier),
            natural,
        }
    }

    /// Roll with advantage/disadvantage (only applies to single d20 rolls).
    pub fn roll_with_advantage<R: DieRoller + ?Sized>(
        &self,
        advantage: Advantage,
        roller: &mut R,
    ) -> RollResult {
        if advantage == Advantage::Normal || !self.is_single_d20() {
            return self.roll_with(roller);
        }

        let mut expr = self.clone();
        expr.components[0].count = 2;
        match advantage {
            Advantage::Advantage => expr.components[0].keep_highest = Some(1),
            _ => expr.components[0].keep_lowest = Some(1),
        }
        let mut result = expr.roll_with(roller);
        result.expression = self.clone();
        result
    }

    fn is_single_d20(&self) -> bool {
        self.components.len() == 1
            && self.components[0].count == 1
            && self.components[0].die_type == DieType::D20
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceExpression::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for c in &self.components {
            if !first {
                write!(f, "+")?;
            }
            first = false;
            write!(f, "{}{}", c.count, c.die_type)?;
            if let Some(k) = c.keep_highest {
                write!(f, "kh{k}")?;
            } else if let Some(k) = c.keep_lowest {
                write!(f, "kl{k}")?;
            }
        }
        match (first, self.modifier) {
            (true, m) => write!(f, "{m}"),
            (false, 0) => Ok(()),
            (false, m) if m > 0 => write!(f, "+{m}"),
            (false, m) => write!(f, "{m}"),
        }
    }
}

/// Result of rolling a single dice component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentResult {
    pub die_type: DieType,
    pub rolls: Vec<u32>,
    pub kept: Vec<u32>,
    pub subtotal: u32,
}

/// Complete result of a dice roll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollResult {
    pub expression: DiceExpression,
    pub component_results: Vec<ComponentResult>,
    pub modifier: i32,
    pub total: i32,
    /// The kept face of a lone d20, if the expression had one.
    pub natural: Option<u32>,
}

impl RollResult {
    /// Format the individual dice results for display.
    pub fn dice_display(&self) -> String {
        let dice_str = self
            .component_results
            .iter()
            .map(|c| {
                let faces: Vec<String> = c.rolls.iter().map(|r| r.to_string()).collect();
                format!("[{}]", faces.join(", "))
            })
            .collect::<Vec<_>>()
            .join(" + ");

        match self.modifier {
            0 => dice_str,
            m if m > 0 => format!("{dice_str} + {m}"),
            m => format!("{dice_str} - {}", m.abs()),
        }
    }
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.dice_display(), self.total)
    }
}
