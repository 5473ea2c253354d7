//! Rule table entry types.
//!
//! These deserialize straight from the bundled JSON tables. Entries are
//! read-only for the process lifetime; anything derived from them (final
//! scores, resolved kits, level-up plans) is computed by the progression
//! modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::abilities::{Ability, BonusMap};
use crate::entities::item::ItemStack;

/// A playable race with optional subraces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Flat ability bonuses applied on top of base scores.
    #[serde(default)]
    pub ability_bonuses: BonusMap,
    #[serde(default = "default_speed")]
    pub speed: u32,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub subraces: Vec<Subrace>,
}

fn default_speed() -> u32 {
    30
}

impl Race {
    pub fn subrace(&self, name: &str) -> Option<&Subrace> {
        let key = crate::tables::normalize_key(name);
        self.subraces
            .iter()
            .find(|s| crate::tables::normalize_key(&s.name) == key)
    }
}

/// A subrace variant carrying additional ability bonuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subrace {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ability_bonuses: BonusMap,
}

/// How fast a class accrues spell slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasterKind {
    Full,
    Half,
    Third,
    Pact,
}

/// Spellcasting parameters for a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spellcasting {
    pub ability: Ability,
    pub caster: CasterKind,
}

/// Minimum score in one ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreMinimum {
    pub ability: Ability,
    pub value: i32,
}

/// Ability-score gate for multiclassing into (or out of) a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MulticlassPrerequisite {
    /// Every listed minimum must be met (e.g., Paladin: STR 13 and CHA 13).
    All { minimums: Vec<ScoreMinimum> },
    /// At least one listed minimum must be met (e.g., Fighter: STR 13 or DEX 13).
    Any { minimums: Vec<ScoreMinimum> },
}

/// Skill proficiency picks granted by a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillChoice {
    pub choose: u8,
    pub from: Vec<String>,
}

/// One selectable starting-equipment option (e.g., "a longsword" or
/// "any martial weapon").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentOption {
    pub label: String,
    #[serde(default)]
    pub items: Vec<ItemStack>,
    /// Generic category requiring a sub-selection (key into the weapon
    /// category table). When set, `items` is empty.
    #[serde(default)]
    pub category: Option<String>,
}

/// A group of mutually exclusive starting-equipment options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceGroup {
    pub options: Vec<EquipmentOption>,
}

/// Class starting kit: unconditional items plus choice groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingEquipment {
    #[serde(default)]
    pub given: Vec<ItemStack>,
    #[serde(default)]
    pub choices: Vec<ChoiceGroup>,
}

/// Starting gold when taking gold instead of the class kit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingGold {
    /// Dice formula rolled, e.g. "5d4".
    pub dice: String,
    /// Multiplier applied to the roll (x10 for most classes).
    pub multiplier: i32,
    /// Fixed value for the "take the average" option.
    pub average_gp: i32,
}

/// A character class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub hit_die: u8,
    pub saving_throws: Vec<Ability>,
    /// Armor categories the class is proficient with ("light", "medium",
    /// "heavy", "shields"); feat prerequisite checks read these.
    #[serde(default)]
    pub armor_proficiencies: Vec<String>,
    pub skill_choices: SkillChoice,
    /// Character level in this class at which the subclass is chosen.
    pub subclass_level: u8,
    #[serde(default)]
    pub subclasses: Vec<Subclass>,
    #[serde(default)]
    pub spellcasting: Option<Spellcasting>,
    pub multiclass_prerequisite: MulticlassPrerequisite,
    #[serde(default)]
    pub equipment: StartingEquipment,
    pub starting_gold: StartingGold,
}

impl ClassEntry {
    pub fn subclass(&self, name: &str) -> Option<&Subclass> {
        let key = crate::tables::normalize_key(name);
        self.subclasses
            .iter()
            .find(|s| crate::tables::normalize_key(&s.name) == key)
    }

    pub fn is_spellcaster(&self) -> bool {
        self.spellcasting.is_some()
    }
}

/// A subclass option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subclass {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A character background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Number of extra languages the player picks.
    #[serde(default)]
    pub languages: u8,
    #[serde(default)]
    pub tool_proficiencies: Vec<String>,
    /// Fixed equipment list; gold pouches in here are summed into starting
    /// gold at resolution time.
    #[serde(default)]
    pub equipment: Vec<ItemStack>,
}

/// An equipment pack that expands into its component items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pack {
    pub name: String,
    pub contents: Vec<ItemStack>,
}

/// A spell, keyed to the classes that can learn it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellEntry {
    pub name: String,
    /// 0 means cantrip.
    pub level: u8,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl SpellEntry {
    pub fn is_cantrip(&self) -> bool {
        self.level == 0
    }
}

/// A deity for the faith field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deity {
    pub name: String,
    #[serde(default)]
    pub alignment: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// Shape of the bundled equipment table: packs plus generic weapon/armor
/// categories used by class choice groups.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct EquipmentTable {
    #[serde(default)]
    pub packs: Vec<Pack>,
    #[serde(default)]
    pub categories: HashMap<String, Vec<String>>,
}
