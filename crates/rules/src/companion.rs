//! Companions: NPCs recruited into the party.
//!
//! A companion starts as a monster-style stat block and can be converted,
//! once, into class-based progression. After conversion it levels up with
//! the same engine as a player character; the conversion is one-way because
//! class progression cannot be collapsed back into a challenge rating.

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityScores;
use crate::entities::{Character, ClassLevel, Currency};
use crate::error::RulesError;
use crate::ids::CompanionId;
use crate::progression::level_up::{apply_level_up, LevelUpRequest};
use crate::progression::{average_hp_gain, xp_for_next_level};
use crate::tables::RuleTables;

/// How a companion's capabilities are tracked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompanionKind {
    /// Monster-style stat block, as recruited.
    NpcStats {
        challenge_rating: String,
        /// Free-form stat block text from the source material or the GM.
        stat_block: String,
    },
    /// Full class progression, after conversion.
    ClassBased {
        class: String,
        level: u8,
        subclass: Option<String>,
        ability_scores: AbilityScores,
        current_hp: i32,
        max_hp: i32,
    },
}

/// A recruited companion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Companion {
    /// Backend-assigned id; absent until first persisted.
    pub id: Option<CompanionId>,
    pub name: String,
    pub race: String,
    #[serde(default)]
    pub description: String,
    pub kind: CompanionKind,
    /// Character that recruited this companion.
    pub recruited_by: Option<crate::ids::CharacterId>,
}

impl Companion {
    pub fn is_class_based(&self) -> bool {
        matches!(self.kind, CompanionKind::ClassBased { .. })
    }

    /// Convert stat-block tracking into class progression. One-way: a
    /// class-based companion cannot be converted again.
    ///
    /// The companion joins at the recruiter's current level, with hit
    /// points built from the class average at every level.
    pub fn convert_to_class_based(
        &mut self,
        tables: &RuleTables,
        class_key: &str,
        ability_scores: AbilityScores,
        recruiter_level: u8,
    ) -> Result<(), RulesError> {
        if self.is_class_based() {
            return Err(RulesError::constraint(
                "Companion already uses class progression",
            ));
        }
        if recruiter_level == 0 || recruiter_level > 20 {
            return Err(RulesError::validation(format!(
                "Recruiter level {} is outside 1..=20",
                recruiter_level
            )));
        }
        let class = tables.class(class_key)?;
        let con_mod = ability_scores.modifier(crate::abilities::Ability::Constitution);

        // Level 1 takes the full hit die; every later level the average.
        let mut max_hp = (class.hit_die as i32 + con_mod).max(1);
        for _ in 2..=recruiter_level {
            max_hp += average_hp_gain(class.hit_die, con_mod);
        }

        self.kind = CompanionKind::ClassBased {
            class: class.name.clone(),
            level: recruiter_level,
            subclass: None,
            ability_scores,
            current_hp: max_hp,
            max_hp,
        };
        Ok(())
    }

    /// Level up a class-based companion with the shared level-up engine.
    pub fn level_up(
        &mut self,
        tables: &RuleTables,
        request: &LevelUpRequest,
    ) -> Result<(), RulesError> {
        let character = self.as_character()?;
        let updated = apply_level_up(tables, &character, request)?;
        let primary = updated.classes.first().ok_or_else(|| {
            RulesError::constraint("Companion lost its class during level-up")
        })?;
        self.kind = CompanionKind::ClassBased {
            class: primary.class.clone(),
            level: updated.level(),
            subclass: primary.subclass.clone(),
            ability_scores: updated.ability_scores,
            current_hp: updated.current_hp,
            max_hp: updated.max_hp,
        };
        Ok(())
    }

    /// View a class-based companion as a character record for the
    /// progression functions. Companions track a single class.
    fn as_character(&self) -> Result<Character, RulesError> {
        match &self.kind {
            CompanionKind::NpcStats { .. } => Err(RulesError::constraint(
                "Companion must be converted to class progression first",
            )),
            CompanionKind::ClassBased {
                class,
                level,
                subclass,
                ability_scores,
                current_hp,
                max_hp,
            } => {
                let mut class_level = ClassLevel::new(class.clone(), *level);
                class_level.subclass = subclass.clone();
                Ok(Character {
                    id: None,
                    name: self.name.clone(),
                    race: self.race.clone(),
                    subrace: None,
                    background: String::new(),
                    alignment: None,
                    faith: None,
                    lifestyle: None,
                    classes: vec![class_level],
                    ability_scores: *ability_scores,
                    current_hp: *current_hp,
                    max_hp: *max_hp,
                    experience: 0,
                    experience_to_next_level: xp_for_next_level(*level),
                    gold: Currency::default(),
                    skills: vec![],
                    known_cantrips: vec![],
                    known_spells: vec![],
                    feats: vec![],
                    languages: vec![],
                    tool_proficiencies: vec![],
                    inventory: vec![],
                    avatar_path: None,
                })
            }
        }
    }
}
