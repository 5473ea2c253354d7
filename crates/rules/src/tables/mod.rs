//! Immutable rule-data registry.
//!
//! The JSON tables are bundled into the binary, decoded once at startup,
//! and indexed by canonical key. The registry is passed by reference into
//! the progression and equipment functions; nothing here is ambient global
//! state.

mod entries;

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::error::RulesError;
use crate::feats::Feat;

pub use entries::{
    Background, CasterKind, ChoiceGroup, ClassEntry, Deity, EquipmentOption,
    MulticlassPrerequisite, Pack, Race, ScoreMinimum, SkillChoice, Spellcasting, SpellEntry,
    StartingEquipment, StartingGold, Subclass, Subrace,
};

/// Canonical key normalization: lowercase, apostrophes stripped, runs of
/// spaces/hyphens collapsed to single underscores.
///
/// This is the single source of truth for table keys. Both the normalized
/// form ("explorers_pack") and the display name ("Explorer's Pack")
/// normalize to the same key, so lookups tolerate either.
pub fn normalize_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    let mut last_was_sep = true;
    for ch in raw.trim().chars() {
        if ch == '\'' || ch == '\u{2019}' {
            continue;
        }
        if ch.is_whitespace() || ch == '-' || ch == '_' {
            if !last_was_sep {
                key.push('_');
                last_was_sep = true;
            }
            continue;
        }
        for lower in ch.to_lowercase() {
            key.push(lower);
        }
        last_was_sep = false;
    }
    while key.ends_with('_') {
        key.pop();
    }
    key
}

/// Entries that can be indexed by display name.
trait Keyed {
    fn display_name(&self) -> &str;
}

macro_rules! impl_keyed {
    ($($ty:ty),*) => {
        $(impl Keyed for $ty {
            fn display_name(&self) -> &str {
                &self.name
            }
        })*
    };
}

impl_keyed!(Race, ClassEntry, Background, Feat, Pack, SpellEntry, Deity);

/// An indexed, immutable table of entries.
#[derive(Debug, Clone)]
struct Table<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Keyed> Table<T> {
    fn build(table: &'static str, entries: Vec<T>) -> Result<Self, RulesError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let key = normalize_key(entry.display_name());
            if key.is_empty() {
                return Err(RulesError::MalformedTable {
                    table,
                    detail: format!("entry {} has an empty name", i),
                });
            }
            if index.insert(key.clone(), i).is_some() {
                return Err(RulesError::MalformedTable {
                    table,
                    detail: format!("duplicate key '{}'", key),
                });
            }
        }
        Ok(Self { entries, index })
    }

    fn get(&self, key: &str) -> Option<&T> {
        self.index
            .get(&normalize_key(key))
            .map(|&i| &self.entries[i])
    }
}

fn decode<T: DeserializeOwned>(table: &'static str, json: &str) -> Result<T, RulesError> {
    serde_json::from_str(json).map_err(|e| RulesError::MalformedTable {
        table,
        detail: e.to_string(),
    })
}

/// The loaded rule data: races, classes, backgrounds, feats, spells,
/// equipment packs, weapon categories, and deities.
#[derive(Debug, Clone)]
pub struct RuleTables {
    races: Table<Race>,
    classes: Table<ClassEntry>,
    backgrounds: Table<Background>,
    feats: Table<Feat>,
    packs: Table<Pack>,
    spells: Table<SpellEntry>,
    deities: Table<Deity>,
    weapon_categories: HashMap<String, Vec<String>>,
}

impl RuleTables {
    /// Decode and index the bundled tables. Called once at startup.
    pub fn load() -> Result<Self, RulesError> {
        let races: Vec<Race> = decode("races", include_str!("../../data/races.json"))?;
        let classes: Vec<ClassEntry> = decode("classes", include_str!("../../data/classes.json"))?;
        let backgrounds: Vec<Background> =
            decode("backgrounds", include_str!("../../data/backgrounds.json"))?;
        let feats: Vec<Feat> = decode("feats", include_str!("../../data/feats.json"))?;
        let spells: Vec<SpellEntry> = decode("spells", include_str!("../../data/spells.json"))?;
        let deities: Vec<Deity> = decode("deities", include_str!("../../data/deities.json"))?;
        let equipment: entries::EquipmentTable =
            decode("equipment", include_str!("../../data/equipment.json"))?;

        let weapon_categories = equipment
            .categories
            .into_iter()
            .map(|(k, v)| (normalize_key(&k), v))
            .collect();

        Ok(Self {
            races: Table::build("races", races)?,
            classes: Table::build("classes", classes)?,
            backgrounds: Table::build("backgrounds", backgrounds)?,
            feats: Table::build("feats", feats)?,
            packs: Table::build("packs", equipment.packs)?,
            spells: Table::build("spells", spells)?,
            deities: Table::build("deities", deities)?,
            weapon_categories,
        })
    }

    pub fn race(&self, key: &str) -> Result<&Race, RulesError> {
        self.races
            .get(key)
            .ok_or_else(|| RulesError::unknown_entry("race", key))
    }

    pub fn class(&self, key: &str) -> Result<&ClassEntry, RulesError> {
        self.classes
            .get(key)
            .ok_or_else(|| RulesError::unknown_entry("class", key))
    }

    pub fn background(&self, key: &str) -> Result<&Background, RulesError> {
        self.backgrounds
            .get(key)
            .ok_or_else(|| RulesError::unknown_entry("background", key))
    }

    pub fn feat(&self, key: &str) -> Result<&Feat, RulesError> {
        self.feats
            .get(key)
            .ok_or_else(|| RulesError::unknown_entry("feat", key))
    }

    /// Pack lookup is fallible by design: most item names are not packs.
    pub fn pack(&self, key: &str) -> Option<&Pack> {
        self.packs.get(key)
    }

    pub fn spell(&self, key: &str) -> Result<&SpellEntry, RulesError> {
        self.spells
            .get(key)
            .ok_or_else(|| RulesError::unknown_entry("spell", key))
    }

    pub fn deity(&self, key: &str) -> Result<&Deity, RulesError> {
        self.deities
            .get(key)
            .ok_or_else(|| RulesError::unknown_entry("deity", key))
    }

    /// Item names in a generic equipment category ("any martial weapon").
    pub fn weapon_category(&self, key: &str) -> Option<&[String]> {
        self.weapon_categories
            .get(&normalize_key(key))
            .map(|v| v.as_slice())
    }

    pub fn races(&self) -> impl Iterator<Item = &Race> {
        self.races.entries.iter()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassEntry> {
        self.classes.entries.iter()
    }

    pub fn backgrounds(&self) -> impl Iterator<Item = &Background> {
        self.backgrounds.entries.iter()
    }

    pub fn feats(&self) -> impl Iterator<Item = &Feat> {
        self.feats.entries.iter()
    }

    pub fn deities(&self) -> impl Iterator<Item = &Deity> {
        self.deities.entries.iter()
    }

    /// Spells a class can learn at or below a given spell level.
    pub fn spells_for_class(&self, class: &str, max_level: u8) -> Vec<&SpellEntry> {
        let class_key = normalize_key(class);
        self.spells
            .entries
            .iter()
            .filter(|s| s.level <= max_level)
            .filter(|s| s.classes.iter().any(|c| normalize_key(c) == class_key))
            .collect()
    }
}
