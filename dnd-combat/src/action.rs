//! Resolving the current participant's action.
//!
//! The engine only rolls for engine-controlled participants. A
//! player-controlled actor gets back [`ActionOutcome::RollRequired`] with
//! a [`RollRequest`] describing exactly what to roll, and re-submits the same
//! action carrying the [`ExternalRoll`]. Damage is never rolled here: a hit
//! always comes back with a damage roll request, whoever attacked.

use crate::config::EncounterConfig;
use crate::dice::{Advantage, DiceExpression, DieRoller, DieType};
use crate::error::{CombatError, Result};
use crate::events::EncounterEvent;
use crate::participant::{Participant, ParticipantId};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Requests
// ============================================================================

/// An action submitted on behalf of `actor`, who must be the current participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub actor: ParticipantId,
    pub kind: ActionKind,
}

impl ActionRequest {
    pub fn new(actor: ParticipantId, kind: ActionKind) -> Self {
        Self { actor, kind }
    }

    pub fn attack(actor: ParticipantId, target: ParticipantId) -> Self {
        Self::new(
            actor,
            ActionKind::Attack {
                target,
                advantage: Advantage::Normal,
                roll: None,
            },
        )
    }

    pub fn spell(actor: ParticipantId, spell: impl Into<String>, targets: Vec<ParticipantId>) -> Self {
        Self::new(
            actor,
            ActionKind::Spell {
                spell: spell.into(),
                targets,
            },
        )
    }

    pub fn ability(actor: ParticipantId, name: impl Into<String>, targets: Vec<ParticipantId>) -> Self {
        Self::new(
            actor,
            ActionKind::Ability {
                name: name.into(),
                targets,
            },
        )
    }

    pub fn movement(actor: ParticipantId, feet: u32, destination: Option<String>) -> Self {
        Self::new(actor, ActionKind::Move { feet, destination })
    }

    /// Attach an externally rolled attack result.
    pub fn with_roll(mut self, external: ExternalRoll) -> Self {
        if let ActionKind::Attack { roll, .. } = &mut self.kind {
            *roll = Some(external);
        }
        self
    }

    pub fn with_advantage(mut self, state: Advantage) -> Self {
        if let ActionKind::Attack { advantage, .. } = &mut self.kind {
            *advantage = state;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    Attack {
        target: ParticipantId,
        #[serde(default)]
        advantage: Advantage,
        /// Supplied by the caller when answering a roll request.
        #[serde(default)]
        roll: Option<ExternalRoll>,
    },
    Spell {
        spell: String,
        #[serde(default)]
        targets: Vec<ParticipantId>,
    },
    Ability {
        name: String,
        #[serde(default)]
        targets: Vec<ParticipantId>,
    },
    Move {
        feet: u32,
        #[serde(default)]
        destination: Option<String>,
    },
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Attack { .. } => "attack",
            ActionKind::Spell { .. } => "spell",
            ActionKind::Ability { .. } => "ability",
            ActionKind::Move { .. } => "move",
        }
    }
}

/// A roll made outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRoll {
    /// Total including modifiers.
    pub total: i32,
    /// The kept d20 face, when known. Needed for natural 20/1 rules.
    #[serde(default)]
    pub natural: Option<u32>,
}

impl ExternalRoll {
    pub fn total(total: i32) -> Self {
        Self {
            total,
            natural: None,
        }
    }

    pub fn with_natural(total: i32, natural: u32) -> Self {
        Self {
            total,
            natural: Some(natural),
        }
    }
}

// ============================================================================
// Roll Requests
// ============================================================================

/// A named contribution to a roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierSource {
    pub source: String,
    pub value: i32,
}

impl ModifierSource {
    pub fn new(source: impl Into<String>, value: i32) -> Self {
        Self {
            source: source.into(),
            value,
        }
    }
}

impl fmt::Display for ModifierSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:+}", self.source, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RollPurpose {
    Attack {
        target: ParticipantId,
        target_name: String,
        weapon: String,
    },
    Damage {
        target: ParticipantId,
        target_name: String,
        weapon: String,
        critical: bool,
    },
}

/// Instructions for a roll the caller has to make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRequest {
    pub purpose: RollPurpose,
    /// Dice plus the summed modifier, e.g. `1d20+5`.
    pub expression: DiceExpression,
    pub modifiers: Vec<ModifierSource>,
    pub advantage: Advantage,
}

impl RollRequest {
    /// Human-readable description of what to roll.
    pub fn instructions(&self) -> String {
        let what = match &self.purpose {
            RollPurpose::Attack {
                target_name,
                weapon,
                ..
            } => format!("to attack {target_name} with {weapon}"),
            RollPurpose::Damage {
                target_name,
                weapon,
                critical,
                ..
            } => {
                let crit = if *critical { "critical " } else { "" };
                format!("for {crit}{weapon} damage against {target_name}")
            }
        };
        let advantage = match self.advantage {
            Advantage::Normal => "",
            Advantage::Advantage => " with advantage",
            Advantage::Disadvantage => " with disadvantage",
        };
        let mut text = format!("Roll {}{advantage} {what}", self.expression);
        if !self.modifiers.is_empty() {
            let parts: Vec<String> = self.modifiers.iter().map(ToString::to_string).collect();
            text.push_str(&format!(" ({})", parts.join(", ")));
        }
        text
    }
}

// ============================================================================
// Outcomes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub attacker: ParticipantId,
    pub target: ParticipantId,
    pub weapon: String,
    pub attack_total: i32,
    pub natural: Option<u32>,
    pub target_ac: u8,
    pub hit: bool,
    pub critical: bool,
    /// Present on every hit; the caller rolls damage and applies it.
    pub damage: Option<RollRequest>,
}

impl AttackOutcome {
    pub fn damage_roll_required(&self) -> bool {
        self.damage.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellOutcome {
    pub caster: ParticipantId,
    pub spell: String,
    pub targets: Vec<ParticipantId>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Nothing changed; roll as instructed and submit again.
    RollRequired { request: RollRequest },
    Attack(AttackOutcome),
    Spell(SpellOutcome),
    Ability {
        actor: ParticipantId,
        name: String,
        targets: Vec<ParticipantId>,
    },
    Move {
        actor: ParticipantId,
        feet: u32,
        destination: Option<String>,
    },
}

impl ActionOutcome {
    pub fn roll_required(&self) -> bool {
        matches!(self, ActionOutcome::RollRequired { .. })
    }
}

// ============================================================================
// Hooks
// ============================================================================

/// Validation for ability and move actions, which carry no dice rules of
/// their own. Returning `Err(reason)` rejects the action.
pub trait ActionHook: Send + Sync {
    fn check_ability(
        &self,
        _actor: &Participant,
        _name: &str,
        _targets: &[ParticipantId],
    ) -> std::result::Result<(), String> {
        Ok(())
    }

    fn check_move(
        &self,
        _actor: &Participant,
        _feet: u32,
        _destination: Option<&str>,
    ) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Accepts every ability and move.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ActionHook for AcceptAll {}

/// Only allows abilities listed in the actor's known abilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireKnownAbilities;

impl ActionHook for RequireKnownAbilities {
    fn check_ability(
        &self,
        actor: &Participant,
        name: &str,
        _targets: &[ParticipantId],
    ) -> std::result::Result<(), String> {
        if actor.stats.knows_ability(name) {
            Ok(())
        } else {
            Err(format!("{} does not have the ability '{name}'", actor.name))
        }
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// The outcome of an action plus the events it produced.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub outcome: ActionOutcome,
    pub events: Vec<EncounterEvent>,
}

impl Resolution {
    fn new(outcome: ActionOutcome) -> Self {
        Self {
            outcome,
            events: Vec::new(),
        }
    }

    fn with_event(mut self, event: EncounterEvent) -> Self {
        self.events.push(event);
        self
    }
}

/// Resolves one action for the current participant. Never mutates the
/// encounter; the caller applies whatever the outcome implies.
pub struct ActionResolver<'a, R: DieRoller + ?Sized> {
    roller: &'a mut R,
    config: &'a EncounterConfig,
    hook: &'a dyn ActionHook,
}

impl<'a, R: DieRoller + ?Sized> ActionResolver<'a, R> {
    pub fn new(roller: &'a mut R, config: &'a EncounterConfig, hook: &'a dyn ActionHook) -> Self {
        Self {
            roller,
            config,
            hook,
        }
    }

    /// `actor` must already be confirmed as the current participant.
    pub fn resolve(
        &mut self,
        actor: &Participant,
        roster: &[Participant],
        kind: &ActionKind,
    ) -> Result<Resolution> {
        match kind {
            ActionKind::Attack {
                target,
                advantage,
                roll,
            } => {
                let target = find(roster, *target)?;
                self.resolve_attack(actor, target, *advantage, *roll)
            }
            ActionKind::Spell { spell, targets } => self.resolve_spell(actor, roster, spell, targets),
            ActionKind::Ability { name, targets } => {
                for id in targets {
                    find(roster, *id)?;
                }
                self.hook
                    .check_ability(actor, name, targets)
                    .map_err(CombatError::ActionRejected)?;
                Ok(Resolution::new(ActionOutcome::Ability {
                    actor: actor.id,
                    name: name.clone(),
                    targets: targets.clone(),
                })
                .with_event(EncounterEvent::ActionTaken {
                    actor: actor.name.clone(),
                    description: format!("uses {name}"),
                }))
            }
            ActionKind::Move { feet, destination } => {
                self.hook
                    .check_move(actor, *feet, destination.as_deref())
                    .map_err(CombatError::ActionRejected)?;
                let description = match destination {
                    Some(place) => format!("moves {feet} feet to {place}"),
                    None => format!("moves {feet} feet"),
                };
                Ok(Resolution::new(ActionOutcome::Move {
                    actor: actor.id,
                    feet: *feet,
                    destination: destination.clone(),
                })
                .with_event(EncounterEvent::ActionTaken {
                    actor: actor.name.clone(),
                    description,
                }))
            }
        }
    }

    fn resolve_attack(
        &mut self,
        attacker: &Participant,
        target: &Participant,
        advantage: Advantage,
        external: Option<ExternalRoll>,
    ) -> Result<Resolution> {
        let weapon = attacker.weapon();
        let scores = &attacker.stats.ability_scores;
        let ability = weapon.attack_ability(scores);
        let ability_mod = i32::from(scores.modifier(ability));

        let mut modifiers = vec![ModifierSource::new(ability.abbreviation(), ability_mod)];
        if attacker.stats.proficiency_bonus != 0 {
            modifiers.push(ModifierSource::new(
                "proficiency",
                i32::from(attacker.stats.proficiency_bonus),
            ));
        }
        if weapon.attack_bonus != 0 {
            modifiers.push(ModifierSource::new(
                weapon.name.clone(),
                i32::from(weapon.attack_bonus),
            ));
        }
        let attack_mod: i32 = modifiers.iter().map(|m| m.value).sum();
        let attack_expr = DiceExpression::simple(1, DieType::D20, attack_mod);

        let (attack_total, natural) = if attacker.control.engine_rolls() {
            let roll = attack_expr.roll_with_advantage(advantage, self.roller);
            (roll.total, roll.natural)
        } else {
            match external {
                Some(roll) => (roll.total, roll.natural),
                None => {
                    let request = RollRequest {
                        purpose: RollPurpose::Attack {
                            target: target.id,
                            target_name: target.name.clone(),
                            weapon: weapon.name.clone(),
                        },
                        expression: attack_expr,
                        modifiers,
                        advantage,
                    };
                    tracing::debug!(
                        attacker = %attacker.name,
                        target = %target.name,
                        expression = %request.expression,
                        "Attack roll deferred to player"
                    );
                    return Ok(Resolution::new(ActionOutcome::RollRequired {
                        request: request.clone(),
                    })
                    .with_event(EncounterEvent::RollRequested {
                        participant: attacker.id,
                        name: attacker.name.clone(),
                        request,
                    }));
                }
            }
        };

        let target_ac = target.stats.armor_class;
        let (hit, critical) = if self.config.critical_rules {
            match natural {
                Some(20) => (true, true),
                Some(1) => (false, false),
                _ => (attack_total >= i32::from(target_ac), false),
            }
        } else {
            (attack_total >= i32::from(target_ac), false)
        };

        tracing::debug!(
            attacker = %attacker.name,
            target = %target.name,
            attack_total,
            target_ac,
            hit,
            critical,
            "Attack resolved"
        );

        let mut resolution_events = vec![EncounterEvent::AttackResolved {
            attacker: attacker.name.clone(),
            target: target.name.clone(),
            attack_total,
            target_ac,
            hit,
            critical,
        }];

        let damage = if hit {
            let base = weapon.damage_expression()?;
            let dice = if critical { base.doubled_dice()? } else { base };
            let request = RollRequest {
                purpose: RollPurpose::Damage {
                    target: target.id,
                    target_name: target.name.clone(),
                    weapon: weapon.name.clone(),
                    critical,
                },
                expression: dice.plus(ability_mod)?,
                modifiers: vec![ModifierSource::new(ability.abbreviation(), ability_mod)],
                advantage: Advantage::Normal,
            };
            resolution_events.push(EncounterEvent::RollRequested {
                participant: attacker.id,
                name: attacker.name.clone(),
                request: request.clone(),
            });
            Some(request)
        } else {
            None
        };

        Ok(Resolution {
            outcome: ActionOutcome::Attack(AttackOutcome {
                attacker: attacker.id,
                target: target.id,
                weapon: weapon.name,
                attack_total,
                natural,
                target_ac,
                hit,
                critical,
                damage,
            }),
            events: resolution_events,
        })
    }

    fn resolve_spell(
        &mut self,
        caster: &Participant,
        roster: &[Participant],
        spell: &str,
        targets: &[ParticipantId],
    ) -> Result<Resolution> {
        if !caster.stats.knows_spell(spell) {
            return Err(CombatError::UnknownSpell {
                caster: caster.name.clone(),
                spell: spell.to_string(),
            });
        }

        let target_names = targets
            .iter()
            .map(|id| find(roster, *id).map(|p| p.name.clone()))
            .collect::<Result<Vec<_>>>()?;

        let description = if target_names.is_empty() {
            format!("{} casts {spell}", caster.name)
        } else {
            format!("{} casts {spell} targeting {}", caster.name, target_names.join(", "))
        };

        tracing::debug!(caster = %caster.name, spell, "Spell cast");

        Ok(Resolution::new(ActionOutcome::Spell(SpellOutcome {
            caster: caster.id,
            spell: spell.to_string(),
            targets: targets.to_vec(),
            description,
        }))
        .with_event(EncounterEvent::SpellCast {
            caster: caster.name.clone(),
            spell: spell.to_string(),
            targets: target_names,
        }))
    }
}

fn find(roster: &[Participant], id: ParticipantId) -> Result<&Participant> {
    roster
        .iter()
        .find(|p| p.id == id)
        .ok_or(CombatError::ParticipantNotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::DiceError;
    use crate::participant::{Ability, Weapon};
    use crate::testing::{fighter, goblin, wizard, ScriptedRoller};

    fn resolve(
        roller: &mut ScriptedRoller,
        config: &EncounterConfig,
        actor: &Participant,
        roster: &[Participant],
        kind: ActionKind,
    ) -> Result<Resolution> {
        ActionResolver::new(roller, config, &AcceptAll).resolve(actor, roster, &kind)
    }

    fn attack_on(target: &Participant) -> ActionKind {
        ActionKind::Attack {
            target: target.id,
            advantage: Advantage::Normal,
            roll: None,
        }
    }

    #[test]
    fn test_engine_attack_hits_and_defers_damage() {
        let config = EncounterConfig::default();
        let goblin = goblin();
        let fighter = fighter();
        let roster = vec![goblin.clone(), fighter.clone()];
        // Goblin: scimitar (finesse), DEX 14 -> +2, proficiency +2.
        let mut roller = ScriptedRoller::new([14]);

        let resolution = resolve(&mut roller, &config, &goblin, &roster, attack_on(&fighter)).unwrap();
        let ActionOutcome::Attack(attack) = resolution.outcome else {
            panic!("expected attack outcome");
        };
        assert_eq!(attack.attack_total, 18);
        assert!(attack.hit);
        assert!(attack.damage_roll_required());
        let damage = attack.damage.unwrap();
        assert_eq!(damage.expression.to_string(), "1d6+2");
        assert_eq!(resolution.events.len(), 2);
    }

    #[test]
    fn test_engine_attack_miss_has_no_damage() {
        let config = EncounterConfig::default();
        let goblin = goblin();
        let fighter = fighter();
        let roster = vec![goblin.clone(), fighter.clone()];
        let mut roller = ScriptedRoller::new([3]);

        let resolution = resolve(&mut roller, &config, &goblin, &roster, attack_on(&fighter)).unwrap();
        let ActionOutcome::Attack(attack) = resolution.outcome else {
            panic!("expected attack outcome");
        };
        assert!(!attack.hit);
        assert!(attack.damage.is_none());
    }

    #[test]
    fn test_player_attack_requires_roll_then_resolves() {
        let config = EncounterConfig::default();
        let goblin = goblin();
        let fighter = fighter();
        let roster = vec![goblin.clone(), fighter.clone()];
        let mut roller = ScriptedRoller::new([20]);

        let resolution = resolve(&mut roller, &config, &fighter, &roster, attack_on(&goblin)).unwrap();
        let ActionOutcome::RollRequired { request } = &resolution.outcome else {
            panic!("expected a roll request");
        };
        // Fighter: longsword, STR 16 -> +3, proficiency +2.
        assert_eq!(request.expression.to_string(), "1d20+5");
        assert_eq!(
            request.modifiers,
            vec![
                ModifierSource::new("STR", 3),
                ModifierSource::new("proficiency", 2)
            ]
        );
        assert_eq!(
            request.instructions(),
            "Roll 1d20+5 to attack Goblin with Longsword (STR +3, proficiency +2)"
        );
        assert_eq!(roller.consumed(), 0);

        let answered = ActionKind::Attack {
            target: goblin.id,
            advantage: Advantage::Normal,
            roll: Some(ExternalRoll::total(16)),
        };
        let resolution = resolve(&mut roller, &config, &fighter, &roster, answered).unwrap();
        let ActionOutcome::Attack(attack) = resolution.outcome else {
            panic!("expected attack outcome");
        };
        assert!(attack.hit);
        assert_eq!(attack.damage.unwrap().expression.to_string(), "1d8+3");
        assert_eq!(roller.consumed(), 0);
    }

    #[test]
    fn test_natural_twenty_doubles_damage_dice() {
        let config = EncounterConfig::default();
        let goblin = goblin();
        let armored = fighter().with_armor_class(30);
        let roster = vec![goblin.clone(), armored.clone()];
        let mut roller = ScriptedRoller::new([20]);

        let resolution = resolve(&mut roller, &config, &goblin, &roster, attack_on(&armored)).unwrap();
        let ActionOutcome::Attack(attack) = resolution.outcome else {
            panic!("expected attack outcome");
        };
        assert!(attack.hit && attack.critical);
        assert_eq!(attack.damage.unwrap().expression.to_string(), "2d6+2");
    }

    #[test]
    fn test_natural_one_misses_unless_rules_disabled() {
        let fighter = fighter().with_armor_class(1);
        let goblin = goblin();
        let roster = vec![goblin.clone(), fighter.clone()];

        let mut roller = ScriptedRoller::new([1]);
        let config = EncounterConfig::default();
        let resolution = resolve(&mut roller, &config, &goblin, &roster, attack_on(&fighter)).unwrap();
        assert!(matches!(resolution.outcome, ActionOutcome::Attack(AttackOutcome { hit: false, .. })));

        let mut roller = ScriptedRoller::new([1]);
        let config = EncounterConfig::default().with_critical_rules(false);
        let resolution = resolve(&mut roller, &config, &goblin, &roster, attack_on(&fighter)).unwrap();
        assert!(matches!(resolution.outcome, ActionOutcome::Attack(AttackOutcome { hit: true, .. })));
    }

    #[test]
    fn test_critical_on_oversized_damage_dice_is_an_error() {
        let config = EncounterConfig::default();
        let brute = Participant::npc("Brute").with_weapon(Weapon::new("Maul", "3000000000d6"));
        let target = fighter();
        let roster = vec![brute.clone(), target.clone()];
        let mut roller = ScriptedRoller::new([20]);

        assert!(matches!(
            resolve(&mut roller, &config, &brute, &roster, attack_on(&target)),
            Err(CombatError::Dice(DiceError::TooManyDice { .. }))
        ));
    }

    #[test]
    fn test_huge_flat_damage_bonus_is_an_error() {
        let config = EncounterConfig::default();
        let brute = Participant::npc("Brute")
            .with_ability(Ability::Strength, 18)
            .with_weapon(Weapon::new("Club", "1d6+2147483647"));
        let target = fighter().with_armor_class(1);
        let roster = vec![brute.clone(), target.clone()];
        let mut roller = ScriptedRoller::new([10]);

        assert!(matches!(
            resolve(&mut roller, &config, &brute, &roster, attack_on(&target)),
            Err(CombatError::Dice(DiceError::ModifierOutOfRange(_)))
        ));
    }

    #[test]
    fn test_critical_at_dice_limit_still_resolves() {
        let config = EncounterConfig::default();
        let titan = Participant::npc("Titan")
            .with_ability(Ability::Strength, 18)
            .with_weapon(Weapon::new("Hammer", "1000d6+9996"));
        let target = fighter();
        let roster = vec![titan.clone(), target.clone()];
        let mut roller = ScriptedRoller::new([20]);

        let resolution = resolve(&mut roller, &config, &titan, &roster, attack_on(&target)).unwrap();
        let ActionOutcome::Attack(attack) = resolution.outcome else {
            panic!("expected attack outcome");
        };
        assert!(attack.critical);
        assert_eq!(attack.damage.unwrap().expression.to_string(), "2000d6+10000");
    }

    #[test]
    fn test_unknown_target() {
        let config = EncounterConfig::default();
        let goblin = goblin();
        let mut roller = ScriptedRoller::new([10]);
        let kind = ActionKind::Attack {
            target: ParticipantId::new(),
            advantage: Advantage::Normal,
            roll: None,
        };
        assert!(matches!(
            resolve(&mut roller, &config, &goblin, &[goblin.clone()], kind),
            Err(CombatError::ParticipantNotFound(_))
        ));
    }

    #[test]
    fn test_spell_membership() {
        let config = EncounterConfig::default();
        let wizard = wizard();
        let goblin = goblin();
        let roster = vec![wizard.clone(), goblin.clone()];
        let mut roller = ScriptedRoller::new([10]);

        let known = ActionKind::Spell {
            spell: "fire bolt".to_string(),
            targets: vec![goblin.id],
        };
        let resolution = resolve(&mut roller, &config, &wizard, &roster, known).unwrap();
        let ActionOutcome::Spell(spell) = resolution.outcome else {
            panic!("expected spell outcome");
        };
        assert_eq!(spell.description, "Wizard casts fire bolt targeting Goblin");

        let unknown = ActionKind::Spell {
            spell: "Wish".to_string(),
            targets: Vec::new(),
        };
        assert!(matches!(
            resolve(&mut roller, &config, &wizard, &roster, unknown),
            Err(CombatError::UnknownSpell { spell, .. }) if spell == "Wish"
        ));
    }

    #[test]
    fn test_require_known_abilities_hook() {
        let config = EncounterConfig::default();
        let goblin = goblin();
        let roster = vec![goblin.clone()];
        let mut roller = ScriptedRoller::new([10]);
        let hook = RequireKnownAbilities;

        let known = ActionKind::Ability {
            name: "Nimble Escape".to_string(),
            targets: Vec::new(),
        };
        assert!(ActionResolver::new(&mut roller, &config, &hook)
            .resolve(&goblin, &roster, &known)
            .is_ok());

        let unknown = ActionKind::Ability {
            name: "Fly".to_string(),
            targets: Vec::new(),
        };
        assert!(matches!(
            ActionResolver::new(&mut roller, &config, &hook).resolve(&goblin, &roster, &unknown),
            Err(CombatError::ActionRejected(_))
        ));
    }

    #[test]
    fn test_move_passes_through() {
        let config = EncounterConfig::default();
        let runner = Participant::npc("Runner").with_weapon(Weapon::new("Club", "1d4"));
        let mut roller = ScriptedRoller::new([10]);
        let kind = ActionKind::Move {
            feet: 30,
            destination: Some("the doorway".to_string()),
        };
        let resolution = resolve(&mut roller, &config, &runner, &[runner.clone()], kind).unwrap();
        assert!(matches!(resolution.outcome, ActionOutcome::Move { feet: 30, .. }));
        assert_eq!(
            resolution.events[0].narrative(),
            "Runner moves 30 feet to the doorway."
        );
    }

    #[test]
    fn test_ranged_attack_uses_dexterity() {
        let config = EncounterConfig::default();
        let archer = Participant::npc("Archer")
            .with_ability(Ability::Strength, 8)
            .with_ability(Ability::Dexterity, 16)
            .with_weapon(Weapon::new("Shortbow", "1d6").ranged().with_attack_bonus(1));
        let target = fighter();
        let roster = vec![archer.clone(), target.clone()];
        let mut roller = ScriptedRoller::new([10]);

        let resolution = resolve(&mut roller, &config, &archer, &roster, attack_on(&target)).unwrap();
        let ActionOutcome::Attack(attack) = resolution.outcome else {
            panic!("expected attack outcome");
        };
        assert_eq!(attack.attack_total, 14);
    }
}
