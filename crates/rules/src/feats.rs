//! Feats: structured prerequisites, availability classification, and
//! benefit application.
//!
//! Prerequisites are stored as structured data alongside each feat instead
//! of prose. A migration parser for the legacy free-text phrasings is kept
//! for importing old data; clauses it cannot classify become
//! `Prerequisite::Custom`, which always evaluates as met but keeps the text
//! visible to callers.

use serde::{Deserialize, Serialize};

use crate::abilities::{Ability, AbilityScores, BonusMap};
use crate::error::RulesError;
use crate::tables::{normalize_key, ClassEntry};

/// A feat a character can acquire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feat {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Requirements to take this feat.
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
    /// Mechanical benefits granted by the feat.
    #[serde(default)]
    pub benefits: Vec<FeatBenefit>,
    /// Source book reference (e.g., "PHB p.165").
    #[serde(default)]
    pub source: String,
    /// Whether this feat can be taken multiple times.
    #[serde(default)]
    pub repeatable: bool,
}

/// A requirement for acquiring a feat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prerequisite {
    /// Minimum score in one ability.
    MinScore { ability: Ability, value: i32 },
    /// Minimum score in at least one of the listed abilities.
    AnyScore { abilities: Vec<Ability>, value: i32 },
    /// Proficiency with an armor category ("light", "medium", "heavy").
    ArmorProficiency { category: String },
    /// Must be able to cast at least one spell.
    Spellcaster,
    /// Free-form requirement carried over from legacy data. Always
    /// evaluates as met; the text is preserved for display.
    Custom { description: String },
}

/// A mechanical benefit granted by a feat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatBenefit {
    /// Increase a fixed ability score.
    ScoreIncrease { ability: Ability, value: i32 },
    /// Increase one ability chosen from a list.
    ScoreChoice { options: Vec<Ability>, value: i32 },
    /// Free-form benefit.
    Custom { description: String },
}

/// How a feat relates to the character being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatAvailability {
    /// All prerequisites met.
    Available,
    /// An ability-score prerequisite failed; the player can fix this by
    /// reallocating scores.
    Unavailable,
    /// A class, proficiency, or spellcasting prerequisite failed; fixed by
    /// the character's class, not by the player.
    Restricted,
}

impl Feat {
    /// Classify this feat against final scores and the chosen class.
    ///
    /// A restricted failure wins over an unavailable one: if the class gate
    /// fails there is nothing the player can reallocate to fix it.
    pub fn availability(&self, scores: &AbilityScores, class: &ClassEntry) -> FeatAvailability {
        let mut score_failure = false;
        for prereq in &self.prerequisites {
            match prereq {
                Prerequisite::MinScore { ability, value } => {
                    if scores.get(*ability) < *value {
                        score_failure = true;
                    }
                }
                Prerequisite::AnyScore { abilities, value } => {
                    if !abilities.iter().any(|a| scores.get(*a) >= *value) {
                        score_failure = true;
                    }
                }
                Prerequisite::ArmorProficiency { category } => {
                    let wanted = normalize_key(category);
                    let proficient = class
                        .armor_proficiencies
                        .iter()
                        .any(|p| normalize_key(p) == wanted);
                    if !proficient {
                        return FeatAvailability::Restricted;
                    }
                }
                Prerequisite::Spellcaster => {
                    if !class.is_spellcaster() {
                        return FeatAvailability::Restricted;
                    }
                }
                Prerequisite::Custom { .. } => {}
            }
        }
        if score_failure {
            FeatAvailability::Unavailable
        } else {
            FeatAvailability::Available
        }
    }

    /// The ability bonuses this feat grants, resolving a score choice to
    /// the player's pick.
    pub fn bonus_map(&self, chosen: Option<Ability>) -> Result<BonusMap, RulesError> {
        let mut bonuses = BonusMap::new();
        for benefit in &self.benefits {
            match benefit {
                FeatBenefit::ScoreIncrease { ability, value } => {
                    *bonuses.entry(*ability).or_insert(0) += value;
                }
                FeatBenefit::ScoreChoice { options, value } => {
                    let pick = chosen.ok_or_else(|| {
                        RulesError::validation(format!(
                            "Feat '{}' requires choosing an ability",
                            self.name
                        ))
                    })?;
                    if !options.contains(&pick) {
                        return Err(RulesError::validation(format!(
                            "{} is not a valid ability choice for '{}'",
                            pick, self.name
                        )));
                    }
                    *bonuses.entry(pick).or_insert(0) += value;
                }
                FeatBenefit::Custom { .. } => {}
            }
        }
        Ok(bonuses)
    }

    /// Whether taking this feat requires the player to pick an ability.
    pub fn requires_ability_choice(&self) -> bool {
        self.benefits
            .iter()
            .any(|b| matches!(b, FeatBenefit::ScoreChoice { .. }))
    }
}

/// Parse a legacy free-text prerequisite string into structured
/// prerequisites.
///
/// Recognized phrasings:
/// - "Strength 13 or higher"
/// - "Intelligence or Wisdom 13 or higher"
/// - "Proficiency with light/medium/heavy armor"
/// - "The ability to cast at least one spell"
///
/// Clauses are split on commas and semicolons. Anything unrecognized
/// becomes `Custom` (treated as met).
pub fn parse_legacy_prerequisites(text: &str) -> Vec<Prerequisite> {
    text.split([',', ';'])
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .map(parse_clause)
        .collect()
}

fn parse_clause(clause: &str) -> Prerequisite {
    let lower = clause.to_lowercase();

    if lower.contains("cast at least one spell") {
        return Prerequisite::Spellcaster;
    }

    if let Some(rest) = lower.strip_prefix("proficiency with ") {
        if let Some(category) = rest.strip_suffix(" armor") {
            if matches!(category, "light" | "medium" | "heavy") {
                return Prerequisite::ArmorProficiency {
                    category: category.to_string(),
                };
            }
        }
    }

    // "<Ability> N or higher" and "<Ability> or <Ability> N or higher"
    if let Some(stripped) = lower.strip_suffix(" or higher") {
        let tokens: Vec<&str> = stripped.split_whitespace().collect();
        if let Some((value_str, ability_tokens)) = tokens.split_last() {
            if let Ok(value) = value_str.parse::<i32>() {
                let abilities: Vec<Ability> = ability_tokens
                    .iter()
                    .filter(|t| **t != "or")
                    .map(|t| Ability::parse(t))
                    .collect::<Result<_, _>>()
                    .unwrap_or_default();
                match abilities.len() {
                    1 => {
                        return Prerequisite::MinScore {
                            ability: abilities[0],
                            value,
                        }
                    }
                    n if n > 1 => return Prerequisite::AnyScore { abilities, value },
                    _ => {}
                }
            }
        }
    }

    Prerequisite::Custom {
        description: clause.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::RuleTables;

    fn scores(str_: i32, int: i32) -> AbilityScores {
        let mut s = AbilityScores::all(10);
        s.strength = str_;
        s.intelligence = int;
        s
    }

    fn tables() -> RuleTables {
        RuleTables::load().expect("load")
    }

    #[test]
    fn parse_single_ability_clause() {
        let prereqs = parse_legacy_prerequisites("Strength 13 or higher");
        assert_eq!(
            prereqs,
            vec![Prerequisite::MinScore {
                ability: Ability::Strength,
                value: 13
            }]
        );
    }

    #[test]
    fn parse_either_ability_clause() {
        let prereqs = parse_legacy_prerequisites("Intelligence or Wisdom 13 or higher");
        assert_eq!(
            prereqs,
            vec![Prerequisite::AnyScore {
                abilities: vec![Ability::Intelligence, Ability::Wisdom],
                value: 13
            }]
        );
    }

    #[test]
    fn parse_armor_and_spellcasting_clauses() {
        let prereqs = parse_legacy_prerequisites(
            "Proficiency with medium armor, The ability to cast at least one spell",
        );
        assert_eq!(
            prereqs,
            vec![
                Prerequisite::ArmorProficiency {
                    category: "medium".to_string()
                },
                Prerequisite::Spellcaster,
            ]
        );
    }

    #[test]
    fn unrecognized_clause_becomes_custom() {
        let prereqs = parse_legacy_prerequisites("Elf or half-elf");
        assert_eq!(
            prereqs,
            vec![Prerequisite::Custom {
                description: "Elf or half-elf".to_string()
            }]
        );
    }

    #[test]
    fn availability_classification() {
        let tables = tables();
        let fighter = tables.class("fighter").expect("fighter");
        let wizard = tables.class("wizard").expect("wizard");

        let feat = Feat {
            name: "Heavily Armored".to_string(),
            description: String::new(),
            prerequisites: vec![Prerequisite::ArmorProficiency {
                category: "medium".to_string(),
            }],
            benefits: vec![],
            source: String::new(),
            repeatable: false,
        };
        // Fighter has medium armor proficiency, wizard does not.
        assert_eq!(
            feat.availability(&scores(10, 10), fighter),
            FeatAvailability::Available
        );
        assert_eq!(
            feat.availability(&scores(10, 10), wizard),
            FeatAvailability::Restricted
        );

        let grappler = Feat {
            name: "Grappler".to_string(),
            description: String::new(),
            prerequisites: vec![Prerequisite::MinScore {
                ability: Ability::Strength,
                value: 13,
            }],
            benefits: vec![],
            source: String::new(),
            repeatable: false,
        };
        assert_eq!(
            grappler.availability(&scores(13, 10), fighter),
            FeatAvailability::Available
        );
        assert_eq!(
            grappler.availability(&scores(12, 10), fighter),
            FeatAvailability::Unavailable
        );
    }

    #[test]
    fn restricted_wins_over_unavailable() {
        let tables = tables();
        let wizard = tables.class("wizard").expect("wizard");
        let feat = Feat {
            name: "Test".to_string(),
            description: String::new(),
            prerequisites: vec![
                Prerequisite::MinScore {
                    ability: Ability::Strength,
                    value: 13,
                },
                Prerequisite::ArmorProficiency {
                    category: "heavy".to_string(),
                },
            ],
            benefits: vec![],
            source: String::new(),
            repeatable: false,
        };
        assert_eq!(
            feat.availability(&scores(8, 10), wizard),
            FeatAvailability::Restricted
        );
    }

    #[test]
    fn custom_prerequisite_is_treated_as_met() {
        let tables = tables();
        let fighter = tables.class("fighter").expect("fighter");
        let feat = Feat {
            name: "Test".to_string(),
            description: String::new(),
            prerequisites: vec![Prerequisite::Custom {
                description: "Dwarf".to_string(),
            }],
            benefits: vec![],
            source: String::new(),
            repeatable: false,
        };
        assert_eq!(
            feat.availability(&scores(10, 10), fighter),
            FeatAvailability::Available
        );
    }

    #[test]
    fn bonus_map_with_fixed_and_chosen_bonuses() {
        let feat = Feat {
            name: "Resilient".to_string(),
            description: String::new(),
            prerequisites: vec![],
            benefits: vec![FeatBenefit::ScoreChoice {
                options: vec![Ability::Constitution, Ability::Wisdom],
                value: 1,
            }],
            source: String::new(),
            repeatable: true,
        };
        assert!(feat.requires_ability_choice());
        assert!(feat.bonus_map(None).is_err());
        assert!(feat.bonus_map(Some(Ability::Strength)).is_err());

        let bonuses = feat.bonus_map(Some(Ability::Constitution)).expect("bonus");
        assert_eq!(bonuses.get(&Ability::Constitution), Some(&1));
    }

    #[test]
    fn bundled_feats_round_trip_structured_prereqs() {
        let tables = tables();
        let heavily_armored = tables.feat("Heavily Armored").expect("feat");
        assert!(matches!(
            heavily_armored.prerequisites.as_slice(),
            [Prerequisite::ArmorProficiency { .. }]
        ));
    }
}
