//! Character creation flow: an explicit step machine over a draft.
//!
//! Each step owns its slice of the draft and validates only that slice;
//! `advance` refuses to move forward while the current step has errors, and
//! `finalize` re-runs every step's validation before producing a character.
//! The step order is fixed; going back never loses entered data.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::abilities::{
    clamp_manual, resolve_scores, Ability, AbilityScores, BaseScores, BonusMap,
    StandardArrayAssignment,
};
use crate::entities::Character;
use crate::equipment::{resolve_starting_equipment, EquipmentSource};
use crate::error::RulesError;
use crate::progression::spellcasting::{cantrips_known, max_spell_level, spells_known};
use crate::progression::xp_for_next_level;
use crate::tables::{normalize_key, RuleTables};

/// Steps of the creation flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Identity,
    Abilities,
    ClassOptions,
    Equipment,
    Extras,
    Review,
}

impl WizardStep {
    pub const ALL: [WizardStep; 6] = [
        WizardStep::Identity,
        WizardStep::Abilities,
        WizardStep::ClassOptions,
        WizardStep::Equipment,
        WizardStep::Extras,
        WizardStep::Review,
    ];

    pub fn next(self) -> Option<WizardStep> {
        let i = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(i + 1).copied()
    }

    pub fn previous(self) -> Option<WizardStep> {
        let i = Self::ALL.iter().position(|s| *s == self)?;
        i.checked_sub(1).map(|i| Self::ALL[i])
    }
}

/// How base ability scores are entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AbilityEntry {
    /// Assign the standard array to abilities.
    StandardArray(StandardArrayAssignment),
    /// Type scores directly. Values are clamped on commit, not while
    /// typing, so the draft may briefly hold out-of-range numbers.
    Manual {
        committed: BaseScores,
        #[serde(default)]
        pending: HashMap<Ability, i32>,
    },
}

impl Default for AbilityEntry {
    fn default() -> Self {
        AbilityEntry::StandardArray(StandardArrayAssignment::new())
    }
}

impl AbilityEntry {
    fn is_complete(&self) -> bool {
        match self {
            AbilityEntry::StandardArray(a) => a.is_complete(),
            AbilityEntry::Manual { committed, .. } => committed.is_complete(),
        }
    }

    fn base_scores(&self) -> BaseScores {
        match self {
            AbilityEntry::StandardArray(a) => a.to_base_scores(),
            AbilityEntry::Manual { committed, .. } => committed.clone(),
        }
    }
}

/// The in-progress character draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterDraft {
    pub name: String,
    pub race: Option<String>,
    pub subrace: Option<String>,
    pub background: Option<String>,
    pub alignment: Option<String>,
    pub faith: Option<String>,
    pub lifestyle: Option<String>,
    pub abilities: AbilityEntry,
    pub class: Option<String>,
    pub subclass: Option<String>,
    pub skills: Vec<String>,
    pub cantrips: Vec<String>,
    pub spells: Vec<String>,
    pub equipment: Option<EquipmentSource>,
    pub languages: Vec<String>,
}

/// The creation flow: current step plus draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreationWizard {
    step: WizardStep,
    pub draft: CharacterDraft,
}

impl Default for CreationWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl CreationWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Identity,
            draft: CharacterDraft::default(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Stage a manual score while the field is being edited.
    pub fn set_manual_score(&mut self, ability: Ability, value: i32) {
        if let AbilityEntry::Manual { pending, .. } = &mut self.draft.abilities {
            pending.insert(ability, value);
        }
    }

    /// Commit a staged manual score, clamping it into range.
    pub fn commit_manual_score(&mut self, ability: Ability) {
        if let AbilityEntry::Manual { committed, pending } = &mut self.draft.abilities {
            if let Some(value) = pending.remove(&ability) {
                committed.set(ability, clamp_manual(value));
            }
        }
    }

    /// Validation problems on a specific step.
    pub fn validation_errors(&self, tables: &RuleTables, step: WizardStep) -> Vec<String> {
        let mut errors = Vec::new();
        let draft = &self.draft;
        match step {
            WizardStep::Identity => {
                if draft.name.trim().is_empty() {
                    errors.push("Name is required".to_string());
                }
                match &draft.race {
                    None => errors.push("Race is required".to_string()),
                    Some(race) => match tables.race(race) {
                        Err(e) => errors.push(e.to_string()),
                        Ok(entry) => {
                            if let Some(subrace) = &draft.subrace {
                                if entry.subrace(subrace).is_none() {
                                    errors.push(format!(
                                        "{} is not a {} subrace",
                                        subrace, entry.name
                                    ));
                                }
                            } else if !entry.subraces.is_empty() {
                                errors.push(format!("{} requires a subrace", entry.name));
                            }
                        }
                    },
                }
                match &draft.background {
                    None => errors.push("Background is required".to_string()),
                    Some(bg) => {
                        if let Err(e) = tables.background(bg) {
                            errors.push(e.to_string());
                        }
                    }
                }
            }
            WizardStep::Abilities => {
                if !draft.abilities.is_complete() {
                    errors.push("All six ability scores must be assigned".to_string());
                }
            }
            WizardStep::ClassOptions => match &draft.class {
                None => errors.push("Class is required".to_string()),
                Some(class) => match tables.class(class) {
                    Err(e) => errors.push(e.to_string()),
                    Ok(entry) => {
                        self.validate_class_options(tables, entry, &mut errors);
                    }
                },
            },
            WizardStep::Equipment => match (&draft.equipment, &draft.class, &draft.background) {
                (None, _, _) => errors.push("Choose equipment or starting gold".to_string()),
                (Some(source), Some(class), Some(background)) => {
                    if let Err(e) =
                        resolve_starting_equipment(tables, class, background, source)
                    {
                        errors.push(e.to_string());
                    }
                }
                // Class/background errors are reported on their own steps.
                (Some(_), _, _) => {}
            },
            WizardStep::Extras => {
                if let Some(bg) = &draft.background {
                    if let Ok(entry) = tables.background(bg) {
                        if draft.languages.len() != entry.languages as usize {
                            errors.push(format!(
                                "{} grants {} extra language(s), {} chosen",
                                entry.name,
                                entry.languages,
                                draft.languages.len()
                            ));
                        }
                    }
                }
                if let Some(faith) = &draft.faith {
                    if tables.deity(faith).is_err() {
                        errors.push(format!("Unknown deity: {}", faith));
                    }
                }
            }
            WizardStep::Review => {
                for prior in &WizardStep::ALL[..5] {
                    errors.extend(self.validation_errors(tables, *prior));
                }
            }
        }
        errors
    }

    fn validate_class_options(
        &self,
        tables: &RuleTables,
        entry: &crate::tables::ClassEntry,
        errors: &mut Vec<String>,
    ) {
        let draft = &self.draft;

        // Subclass only when the class chooses at level 1.
        match (&draft.subclass, entry.subclass_level) {
            (None, 1) => errors.push(format!("{} chooses a subclass at level 1", entry.name)),
            (Some(choice), 1) => {
                if entry.subclass(choice).is_none() {
                    errors.push(format!("{} is not a {} subclass", choice, entry.name));
                }
            }
            (Some(_), _) => {
                errors.push(format!(
                    "{} does not choose a subclass until level {}",
                    entry.name, entry.subclass_level
                ));
            }
            (None, _) => {}
        }

        // Skill picks: exactly `choose`, all from the class list.
        let choice = &entry.skill_choices;
        if draft.skills.len() != choice.choose as usize {
            errors.push(format!(
                "{} picks {} skill(s), {} chosen",
                entry.name,
                choice.choose,
                draft.skills.len()
            ));
        }
        for skill in &draft.skills {
            let key = normalize_key(skill);
            if !choice.from.iter().any(|s| normalize_key(s) == key) {
                errors.push(format!("{} is not a {} skill option", skill, entry.name));
            }
        }

        // Spell picks for level-1 casters.
        let want_cantrips = cantrips_known(&entry.name, 1);
        if draft.cantrips.len() != want_cantrips as usize {
            errors.push(format!(
                "{} knows {} cantrip(s) at level 1, {} chosen",
                entry.name,
                want_cantrips,
                draft.cantrips.len()
            ));
        }
        if let Some(want_spells) = spells_known(&entry.name, 1) {
            if draft.spells.len() != want_spells as usize {
                errors.push(format!(
                    "{} knows {} spell(s) at level 1, {} chosen",
                    entry.name,
                    want_spells,
                    draft.spells.len()
                ));
            }
        }
        let max_level = entry
            .spellcasting
            .map(|sc| max_spell_level(sc.caster, 1))
            .unwrap_or(0);
        let class_key = normalize_key(&entry.name);
        for name in draft.cantrips.iter().chain(&draft.spells) {
            match tables.spell(name) {
                Err(e) => errors.push(e.to_string()),
                Ok(spell) => {
                    if spell.level > max_level {
                        errors.push(format!(
                            "{} is above spell level {}",
                            spell.name, max_level
                        ));
                    }
                    if !spell.classes.iter().any(|c| normalize_key(c) == class_key) {
                        errors.push(format!(
                            "{} is not on the {} spell list",
                            spell.name, entry.name
                        ));
                    }
                }
            }
        }
    }

    pub fn can_advance(&self, tables: &RuleTables) -> bool {
        self.step != WizardStep::Review && self.validation_errors(tables, self.step).is_empty()
    }

    /// Move to the next step; refuses while the current step has errors.
    pub fn advance(&mut self, tables: &RuleTables) -> Result<WizardStep, RulesError> {
        let errors = self.validation_errors(tables, self.step);
        if !errors.is_empty() {
            return Err(RulesError::validation(errors.join("; ")));
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                Ok(next)
            }
            None => Err(RulesError::invalid_step_transition(
                "Review is the final step",
            )),
        }
    }

    /// Move back one step. Entered data is kept.
    pub fn back(&mut self) -> Result<WizardStep, RulesError> {
        match self.step.previous() {
            Some(prev) => {
                self.step = prev;
                Ok(prev)
            }
            None => Err(RulesError::invalid_step_transition(
                "Identity is the first step",
            )),
        }
    }

    /// Final ability scores: base plus race and subrace bonuses.
    pub fn final_scores(&self, tables: &RuleTables) -> Result<AbilityScores, RulesError> {
        let race = match &self.draft.race {
            Some(r) => tables.race(r)?,
            None => return Ok(resolve_scores(&self.draft.abilities.base_scores(), &[])),
        };
        let mut bonuses: Vec<&BonusMap> = vec![&race.ability_bonuses];
        if let Some(name) = &self.draft.subrace {
            if let Some(subrace) = race.subrace(name) {
                bonuses.push(&subrace.ability_bonuses);
            }
        }
        Ok(resolve_scores(&self.draft.abilities.base_scores(), &bonuses))
    }

    /// Produce the finished character. Only valid from the Review step with
    /// every step passing validation.
    pub fn finalize(&self, tables: &RuleTables) -> Result<Character, RulesError> {
        if self.step != WizardStep::Review {
            return Err(RulesError::invalid_step_transition(
                "Finalize is only available from Review",
            ));
        }
        let errors = self.validation_errors(tables, WizardStep::Review);
        if !errors.is_empty() {
            return Err(RulesError::validation(errors.join("; ")));
        }
        let draft = &self.draft;

        // Validation guarantees these are present.
        let race_name = draft.race.clone().ok_or_else(missing_field)?;
        let background_name = draft.background.clone().ok_or_else(missing_field)?;
        let class_name = draft.class.clone().ok_or_else(missing_field)?;
        let source = draft.equipment.as_ref().ok_or_else(missing_field)?;

        let race = tables.race(&race_name)?;
        let background = tables.background(&background_name)?;
        let class = tables.class(&class_name)?;
        let scores = self.final_scores(tables)?;

        // Level 1: full hit die plus CON modifier.
        let max_hp = (class.hit_die as i32 + scores.modifier(Ability::Constitution)).max(1);

        let resolved = resolve_starting_equipment(tables, &class_name, &background_name, source)?;

        let mut skills = background.skills.clone();
        for skill in &draft.skills {
            let key = normalize_key(skill);
            if !skills.iter().any(|s| normalize_key(s) == key) {
                skills.push(skill.clone());
            }
        }

        let mut languages = race.languages.clone();
        for language in &draft.languages {
            let key = normalize_key(language);
            if !languages.iter().any(|l| normalize_key(l) == key) {
                languages.push(language.clone());
            }
        }

        let mut class_level = crate::entities::ClassLevel::new(class.name.clone(), 1);
        class_level.subclass = draft
            .subclass
            .as_ref()
            .and_then(|s| class.subclass(s))
            .map(|s| s.name.clone());

        Ok(Character {
            id: None,
            name: draft.name.trim().to_string(),
            race: race.name.clone(),
            subrace: draft
                .subrace
                .as_ref()
                .and_then(|s| race.subrace(s))
                .map(|s| s.name.clone()),
            background: background.name.clone(),
            alignment: draft.alignment.clone(),
            faith: draft.faith.clone(),
            lifestyle: draft.lifestyle.clone(),
            classes: vec![class_level],
            ability_scores: scores,
            current_hp: max_hp,
            max_hp,
            experience: 0,
            experience_to_next_level: xp_for_next_level(1),
            gold: resolved.gold,
            skills,
            known_cantrips: draft.cantrips.clone(),
            known_spells: draft.spells.clone(),
            feats: vec![],
            languages,
            tool_proficiencies: background.tool_proficiencies.clone(),
            inventory: resolved.items,
            avatar_path: None,
        })
    }
}

fn missing_field() -> RulesError {
    RulesError::validation("Draft is missing a required field")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::STANDARD_ARRAY;
    use crate::equipment::{GoldMethod, KitSelection};

    fn tables() -> RuleTables {
        RuleTables::load().expect("load")
    }

    fn filled_fighter() -> CreationWizard {
        let mut wizard = CreationWizard::new();
        wizard.draft.name = "Brel".to_string();
        wizard.draft.race = Some("Human".to_string());
        wizard.draft.background = Some("Soldier".to_string());

        let mut assignment = StandardArrayAssignment::new();
        for (ability, value) in Ability::ALL.iter().zip(STANDARD_ARRAY) {
            assignment.assign(*ability, value).expect("assign");
        }
        wizard.draft.abilities = AbilityEntry::StandardArray(assignment);

        wizard.draft.class = Some("Fighter".to_string());
        wizard.draft.skills = vec!["Athletics".to_string(), "Perception".to_string()];
        wizard.draft.equipment = Some(EquipmentSource::ClassKit {
            selections: vec![KitSelection {
                group: 0,
                option: 0,
                category_pick: None,
            }],
        });
        wizard
    }

    fn walk_to_review(wizard: &mut CreationWizard, tables: &RuleTables) {
        while wizard.step() != WizardStep::Review {
            wizard.advance(tables).expect("advance");
        }
    }

    #[test]
    fn step_order_is_fixed() {
        assert_eq!(WizardStep::Identity.next(), Some(WizardStep::Abilities));
        assert_eq!(WizardStep::Review.next(), None);
        assert_eq!(WizardStep::Identity.previous(), None);
        assert_eq!(
            WizardStep::Equipment.previous(),
            Some(WizardStep::ClassOptions)
        );
    }

    #[test]
    fn advance_blocked_by_validation() {
        let tables = tables();
        let mut wizard = CreationWizard::new();
        assert!(!wizard.can_advance(&tables));
        let err = wizard.advance(&tables).expect_err("empty identity");
        assert!(matches!(err, RulesError::Validation(_)));
        assert_eq!(wizard.step(), WizardStep::Identity);
    }

    #[test]
    fn back_from_first_step_is_rejected() {
        let mut wizard = CreationWizard::new();
        assert!(wizard.back().is_err());
    }

    #[test]
    fn back_preserves_entered_data() {
        let tables = tables();
        let mut wizard = filled_fighter();
        wizard.advance(&tables).expect("identity");
        wizard.back().expect("back");
        assert_eq!(wizard.draft.name, "Brel");
        assert_eq!(wizard.step(), WizardStep::Identity);
    }

    #[test]
    fn manual_scores_clamp_on_commit_only() {
        let mut wizard = CreationWizard::new();
        wizard.draft.abilities = AbilityEntry::Manual {
            committed: BaseScores::default(),
            pending: HashMap::new(),
        };
        wizard.set_manual_score(Ability::Strength, 42);
        if let AbilityEntry::Manual { pending, committed } = &wizard.draft.abilities {
            assert_eq!(pending.get(&Ability::Strength), Some(&42));
            assert_eq!(committed.get(Ability::Strength), None);
        }
        wizard.commit_manual_score(Ability::Strength);
        if let AbilityEntry::Manual { committed, .. } = &wizard.draft.abilities {
            assert_eq!(committed.get(Ability::Strength), Some(18));
        }
    }

    #[test]
    fn subclass_rejected_when_not_level_one() {
        let tables = tables();
        let mut wizard = filled_fighter();
        wizard.draft.subclass = Some("Champion".to_string());
        let errors = wizard.validation_errors(&tables, WizardStep::ClassOptions);
        assert!(!errors.is_empty());
    }

    #[test]
    fn finalize_requires_review_step() {
        let tables = tables();
        let wizard = filled_fighter();
        assert!(matches!(
            wizard.finalize(&tables),
            Err(RulesError::InvalidStepTransition(_))
        ));
    }

    #[test]
    fn fighter_happy_path() {
        let tables = tables();
        let mut wizard = filled_fighter();
        walk_to_review(&mut wizard, &tables);

        let character = wizard.finalize(&tables).expect("finalize");
        assert_eq!(character.level(), 1);
        assert_eq!(character.primary_class(), Some("Fighter"));
        // Standard array assigned in order: CON 13, Human +1 everywhere.
        assert_eq!(character.ability_scores.constitution, 14);
        // Level 1 HP: hit die 10 + CON mod 2.
        assert_eq!(character.max_hp, 12);
        assert_eq!(character.current_hp, 12);
        assert_eq!(character.experience, 0);
        assert_eq!(character.experience_to_next_level, 300);
        // Soldier background pouch.
        assert_eq!(character.gold.gp, 10);
        assert!(character.inventory.iter().any(|i| i.name == "Chain Mail"));
        assert!(character.skills.contains(&"Athletics".to_string()));
        assert!(character.languages.contains(&"Common".to_string()));
    }

    #[test]
    fn caster_must_pick_spells() {
        let tables = tables();
        let mut wizard = filled_fighter();
        wizard.draft.class = Some("Wizard".to_string());
        wizard.draft.skills = vec!["Arcana".to_string(), "History".to_string()];
        let errors = wizard.validation_errors(&tables, WizardStep::ClassOptions);
        assert!(errors.iter().any(|e| e.contains("cantrip")));

        wizard.draft.cantrips = vec![
            "Fire Bolt".to_string(),
            "Mage Hand".to_string(),
            "Light".to_string(),
        ];
        let errors = wizard.validation_errors(&tables, WizardStep::ClassOptions);
        assert!(errors.is_empty(), "unexpected: {:?}", errors);
    }

    #[test]
    fn gold_path_through_the_flow() {
        let tables = tables();
        let mut wizard = filled_fighter();
        wizard.draft.equipment = Some(EquipmentSource::Gold(GoldMethod::Average));
        walk_to_review(&mut wizard, &tables);
        let character = wizard.finalize(&tables).expect("finalize");
        let fighter = tables.class("fighter").expect("fighter");
        assert_eq!(character.gold.gp, fighter.starting_gold.average_gp + 10);
    }
}
