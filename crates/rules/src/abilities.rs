//! Ability scores: the six-ability block, modifiers, and score resolution.
//!
//! Stored scores always include racial and feat bonuses (the persistence
//! backend knows nothing about where a point came from). Resolution is
//! therefore a one-way sum, with `base_from_final` to recover editable base
//! scores when a character is re-opened in the builder.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RulesError;

/// One of the six core abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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
    pub const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    /// Full lowercase name, matching the wire encoding of `ability_scores`.
    pub fn key(&self) -> &'static str {
        match self {
            Ability::Strength => "strength",
            Ability::Dexterity => "dexterity",
            Ability::Constitution => "constitution",
            Ability::Intelligence => "intelligence",
            Ability::Wisdom => "wisdom",
            Ability::Charisma => "charisma",
        }
    }

    /// Three-letter abbreviation (STR, DEX, ...).
    pub fn abbrev(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    /// Parse either the full name or the abbreviation, case-insensitive.
    pub fn parse(s: &str) -> Result<Self, RulesError> {
        match s.trim().to_lowercase().as_str() {
            "strength" | "str" => Ok(Ability::Strength),
            "dexterity" | "dex" => Ok(Ability::Dexterity),
            "constitution" | "con" => Ok(Ability::Constitution),
            "intelligence" | "int" => Ok(Ability::Intelligence),
            "wisdom" | "wis" => Ok(Ability::Wisdom),
            "charisma" | "cha" => Ok(Ability::Charisma),
            other => Err(RulesError::parse(format!("Unknown ability: {}", other))),
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbrev())
    }
}

/// Modifier for an ability score: floor((score - 10) / 2).
///
/// Rust's `/` rounds toward zero, so negative differences need explicit
/// floor division.
pub fn ability_modifier(score: i32) -> i32 {
    let diff = score - 10;
    if diff >= 0 {
        diff / 2
    } else {
        (diff - 1) / 2
    }
}

/// A complete six-ability score block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::all(10)
    }
}

impl AbilityScores {
    /// Block with the same value in every ability.
    pub fn all(value: i32) -> Self {
        Self {
            strength: value,
            dexterity: value,
            constitution: value,
            intelligence: value,
            wisdom: value,
            charisma: value,
        }
    }

    pub fn get(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, value: i32) {
        match ability {
            Ability::Strength => self.strength = value,
            Ability::Dexterity => self.dexterity = value,
            Ability::Constitution => self.constitution = value,
            Ability::Intelligence => self.intelligence = value,
            Ability::Wisdom => self.wisdom = value,
            Ability::Charisma => self.charisma = value,
        }
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        ability_modifier(self.get(ability))
    }
}

/// A set of flat bonuses keyed by ability (racial, subrace, or feat).
pub type BonusMap = HashMap<Ability, i32>;

/// Base scores as entered in the builder; abilities not yet assigned are
/// absent and default to 10 at resolution time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseScores(pub HashMap<Ability, i32>);

impl BaseScores {
    pub fn get(&self, ability: Ability) -> Option<i32> {
        self.0.get(&ability).copied()
    }

    pub fn set(&mut self, ability: Ability, value: i32) {
        self.0.insert(ability, value);
    }

    pub fn is_complete(&self) -> bool {
        Ability::ALL.iter().all(|a| self.0.contains_key(a))
    }
}

/// Final scores = base (missing -> 10) + every applicable bonus, with a
/// floor of 1 per ability.
pub fn resolve_scores(base: &BaseScores, bonuses: &[&BonusMap]) -> AbilityScores {
    let mut scores = AbilityScores::all(10);
    for ability in Ability::ALL {
        let b = base.get(ability).unwrap_or(10);
        let bonus: i32 = bonuses
            .iter()
            .map(|m| m.get(&ability).copied().unwrap_or(0))
            .sum();
        scores.set(ability, (b + bonus).max(1));
    }
    scores
}

/// Recover base scores from stored final scores by subtracting bonuses.
///
/// Stored scores already include racial/feat bonuses (see module docs), so
/// re-opening a character in the builder must undo them.
pub fn base_from_final(finals: &AbilityScores, bonuses: &[&BonusMap]) -> BaseScores {
    let mut base = BaseScores::default();
    for ability in Ability::ALL {
        let bonus: i32 = bonuses
            .iter()
            .map(|m| m.get(&ability).copied().unwrap_or(0))
            .sum();
        base.set(ability, finals.get(ability) - bonus);
    }
    base
}

/// The manual-entry clamp applied when a field is committed. While typing,
/// any integer is allowed; only the committed value is clamped.
pub fn clamp_manual(value: i32) -> i32 {
    value.clamp(3, 18)
}

/// The standard array of base scores.
pub const STANDARD_ARRAY: [i32; 6] = [15, 14, 13, 12, 10, 8];

/// Assignment of the standard array to abilities.
///
/// The assignment is a partial bijection: each array value sits in at most
/// one ability slot, and assigning a value already used elsewhere clears the
/// prior slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardArrayAssignment {
    slots: HashMap<Ability, i32>,
}

impl StandardArrayAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a standard-array value to an ability. If another ability
    /// already holds that value, its slot is cleared first.
    pub fn assign(&mut self, ability: Ability, value: i32) -> Result<(), RulesError> {
        if !STANDARD_ARRAY.contains(&value) {
            return Err(RulesError::validation(format!(
                "{} is not a standard array value",
                value
            )));
        }
        self.slots.retain(|_, v| *v != value);
        self.slots.insert(ability, value);
        Ok(())
    }

    pub fn unassign(&mut self, ability: Ability) {
        self.slots.remove(&ability);
    }

    pub fn get(&self, ability: Ability) -> Option<i32> {
        self.slots.get(&ability).copied()
    }

    /// Array values not yet assigned to any ability.
    pub fn remaining(&self) -> Vec<i32> {
        STANDARD_ARRAY
            .iter()
            .filter(|v| !self.slots.values().any(|used| used == *v))
            .copied()
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.len() == 6
    }

    pub fn to_base_scores(&self) -> BaseScores {
        BaseScores(self.slots.clone())
    }
}
