//! Character record as created by the builder and mutated by level-up.
//!
//! This mirrors what the backend persists. Fields are public: any
//! combination of values is representable, and the invariants that matter
//! (score bounds, HP clamps, allocation totals) are enforced by the
//! progression functions that produce these records.

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityScores;
use crate::entities::item::{Currency, ItemStack};
use crate::ids::CharacterId;

/// Levels held in a single class. Character level is the sum across all
/// entries; each class tracks its own sub-level for hit dice and spell
/// slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLevel {
    pub class: String,
    pub level: u8,
    pub subclass: Option<String>,
}

impl ClassLevel {
    pub fn new(class: impl Into<String>, level: u8) -> Self {
        Self {
            class: class.into(),
            level,
            subclass: None,
        }
    }
}

/// A player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Backend-assigned id; absent until first persisted.
    pub id: Option<CharacterId>,
    pub name: String,
    pub race: String,
    pub subrace: Option<String>,
    pub background: String,
    pub alignment: Option<String>,
    pub faith: Option<String>,
    pub lifestyle: Option<String>,
    /// Classes in acquisition order; the first entry is the primary class.
    pub classes: Vec<ClassLevel>,
    /// Final scores, racial and feat bonuses included.
    pub ability_scores: AbilityScores,
    pub current_hp: i32,
    pub max_hp: i32,
    pub experience: i32,
    pub experience_to_next_level: i32,
    pub gold: Currency,
    pub skills: Vec<String>,
    pub known_cantrips: Vec<String>,
    pub known_spells: Vec<String>,
    pub feats: Vec<String>,
    pub languages: Vec<String>,
    pub tool_proficiencies: Vec<String>,
    pub inventory: Vec<ItemStack>,
    pub avatar_path: Option<String>,
}

impl Character {
    /// Total character level (sum of class sub-levels).
    pub fn level(&self) -> u8 {
        self.classes.iter().map(|c| c.level).sum()
    }

    /// Primary class name, if any class has been chosen.
    pub fn primary_class(&self) -> Option<&str> {
        self.classes.first().map(|c| c.class.as_str())
    }

    /// Sub-level in a specific class (0 when not taken).
    pub fn class_level(&self, class: &str) -> u8 {
        self.classes
            .iter()
            .find(|c| c.class.eq_ignore_ascii_case(class))
            .map(|c| c.level)
            .unwrap_or(0)
    }

    pub fn class_mut(&mut self, class: &str) -> Option<&mut ClassLevel> {
        self.classes
            .iter_mut()
            .find(|c| c.class.eq_ignore_ascii_case(class))
    }
}
