//! Level-up engine: hit points, proficiency, ability score improvements,
//! subclass unlocks, spell unlocks, and multiclass gates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::abilities::{Ability, AbilityScores};
use crate::entities::{Character, ClassLevel};
use crate::error::RulesError;
use crate::progression::experience::xp_for_next_level;
use crate::progression::spellcasting::{
    cantrips_known, max_spell_level, spell_slots, spells_known,
};
use crate::tables::{normalize_key, ClassEntry, MulticlassPrerequisite, RuleTables};

/// Class sub-levels that grant an Ability Score Improvement.
pub const ASI_LEVELS: [u8; 5] = [4, 8, 12, 16, 19];

/// Points distributed per ASI event.
pub const ASI_POINTS: i32 = 2;

/// Hard cap on any ability score.
pub const ABILITY_SCORE_CAP: i32 = 20;

/// Proficiency bonus for a character level: ceil(level/4) + 1.
pub fn proficiency_bonus(level: u8) -> i32 {
    ((level as i32 - 1) / 4) + 2
}

/// Average hit-point gain for one level: floor(hitDie/2) + 1 + CON mod,
/// never below 1.
pub fn average_hp_gain(hit_die: u8, con_mod: i32) -> i32 {
    ((hit_die as i32 / 2) + 1 + con_mod).max(1)
}

/// How hit points are gained on level-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum HpMethod {
    /// Take the class hit-die average.
    Average,
    /// Player-rolled die result.
    Roll { roll: i32 },
}

/// Hit points gained for one level of a class.
pub fn hp_gain(hit_die: u8, con_mod: i32, method: HpMethod) -> Result<i32, RulesError> {
    match method {
        HpMethod::Average => Ok(average_hp_gain(hit_die, con_mod)),
        HpMethod::Roll { roll } => {
            if roll < 1 || roll > hit_die as i32 {
                return Err(RulesError::validation(format!(
                    "Roll {} is outside 1..={}",
                    roll, hit_die
                )));
            }
            Ok((roll + con_mod).max(1))
        }
    }
}

/// Retroactive HP adjustment when an ASI raises the CON modifier:
/// `(new_mod - old_mod) * level` added to both current and max, with
/// current clamped to [1, new max].
pub fn retroactive_con_hp(
    level: u8,
    old_con_mod: i32,
    new_con_mod: i32,
    current_hp: i32,
    max_hp: i32,
) -> (i32, i32) {
    let delta = (new_con_mod - old_con_mod) * level as i32;
    let new_max = (max_hp + delta).max(1);
    let new_current = (current_hp + delta).clamp(1, new_max);
    (new_current, new_max)
}

/// An Ability Score Improvement distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsiAllocation(pub HashMap<Ability, i32>);

impl AsiAllocation {
    pub fn total(&self) -> i32 {
        self.0.values().sum()
    }

    /// All points placed: progression is blocked until this holds.
    pub fn is_complete(&self) -> bool {
        self.total() == ASI_POINTS
    }

    /// Check bounds against the scores being improved: 0-2 per ability,
    /// exactly 2 total, no score pushed above 20.
    pub fn validate(&self, scores: &AbilityScores) -> Result<(), RulesError> {
        for (ability, points) in &self.0 {
            if *points < 0 || *points > ASI_POINTS {
                return Err(RulesError::validation(format!(
                    "ASI points for {} must be 0-{}",
                    ability, ASI_POINTS
                )));
            }
            if scores.get(*ability) + points > ABILITY_SCORE_CAP {
                return Err(RulesError::validation(format!(
                    "{} cannot be raised above {}",
                    ability, ABILITY_SCORE_CAP
                )));
            }
        }
        if self.total() > ASI_POINTS {
            return Err(RulesError::validation(format!(
                "ASI distributes at most {} points",
                ASI_POINTS
            )));
        }
        if !self.is_complete() {
            return Err(RulesError::validation(format!(
                "All {} ASI points must be allocated",
                ASI_POINTS
            )));
        }
        Ok(())
    }

    pub fn apply(&self, scores: &AbilityScores) -> Result<AbilityScores, RulesError> {
        self.validate(scores)?;
        let mut updated = *scores;
        for (ability, points) in &self.0 {
            updated.set(*ability, updated.get(*ability) + points);
        }
        Ok(updated)
    }
}

/// Whether scores meet a class's multiclass ability gate.
pub fn meets_multiclass_prerequisite(
    scores: &AbilityScores,
    prereq: &MulticlassPrerequisite,
) -> bool {
    match prereq {
        MulticlassPrerequisite::All { minimums } => minimums
            .iter()
            .all(|m| scores.get(m.ability) >= m.value),
        MulticlassPrerequisite::Any { minimums } => minimums
            .iter()
            .any(|m| scores.get(m.ability) >= m.value),
    }
}

/// Classes the character may take the next level in: every current class,
/// plus new classes whose gates pass for both the current classes and the
/// target.
pub fn eligible_classes(tables: &RuleTables, character: &Character) -> Vec<String> {
    if character.level() >= 20 {
        return Vec::new();
    }
    let scores = &character.ability_scores;

    let leaves_current = character.classes.iter().all(|cl| {
        tables
            .class(&cl.class)
            .map(|entry| meets_multiclass_prerequisite(scores, &entry.multiclass_prerequisite))
            .unwrap_or(false)
    });

    let mut eligible: Vec<String> = character.classes.iter().map(|c| c.class.clone()).collect();
    if leaves_current {
        for entry in tables.classes() {
            let already = character
                .classes
                .iter()
                .any(|c| normalize_key(&c.class) == normalize_key(&entry.name));
            if !already
                && meets_multiclass_prerequisite(scores, &entry.multiclass_prerequisite)
            {
                eligible.push(entry.name.clone());
            }
        }
    }
    eligible
}

/// Everything the level-up flow needs to present its choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelUpInfo {
    pub class: String,
    pub new_class_level: u8,
    pub new_character_level: u8,
    pub hit_die: u8,
    pub average_hp_gain: i32,
    pub offers_asi: bool,
    pub offers_subclass: bool,
    pub subclass_options: Vec<String>,
    pub proficiency_bonus: i32,
    pub proficiency_bonus_increased: bool,
    /// Total cantrips known at the new class level (0 for non-casters).
    pub cantrips_known: u8,
    /// Total spells known at the new class level; None for prepared
    /// casters, which have no fixed limit.
    pub spells_known: Option<u8>,
    /// Spell slots by slot level at the new class level.
    pub spell_slots: HashMap<u8, u8>,
    /// Highest spell level learnable at the new class level.
    pub max_spell_level: u8,
}

/// Compute the choices offered when taking the next level in a class.
pub fn level_up_info(
    tables: &RuleTables,
    character: &Character,
    class_key: &str,
) -> Result<LevelUpInfo, RulesError> {
    let entry = tables.class(class_key)?;
    let current_class_level = character.class_level(&entry.name);
    let new_class_level = current_class_level + 1;
    let new_character_level = character.level() + 1;

    if character.level() >= 20 {
        return Err(RulesError::constraint("Character is already at level 20"));
    }
    if current_class_level == 0 && !character.classes.is_empty() {
        ensure_multiclass_allowed(tables, character, entry)?;
    }

    let con_mod = character.ability_scores.modifier(Ability::Constitution);
    let subclass_pending = new_class_level >= entry.subclass_level
        && character
            .classes
            .iter()
            .find(|c| normalize_key(&c.class) == normalize_key(&entry.name))
            .map(|c| c.subclass.is_none())
            .unwrap_or(true);

    let (cantrips, known, slots, max_level) = match entry.spellcasting {
        Some(sc) => (
            cantrips_known(&entry.name, new_class_level),
            spells_known(&entry.name, new_class_level),
            spell_slots(sc.caster, new_class_level),
            max_spell_level(sc.caster, new_class_level),
        ),
        None => (0, None, HashMap::new(), 0),
    };

    Ok(LevelUpInfo {
        class: entry.name.clone(),
        new_class_level,
        new_character_level,
        hit_die: entry.hit_die,
        average_hp_gain: average_hp_gain(entry.hit_die, con_mod),
        offers_asi: ASI_LEVELS.contains(&new_class_level),
        offers_subclass: new_class_level == entry.subclass_level && subclass_pending,
        subclass_options: entry.subclasses.iter().map(|s| s.name.clone()).collect(),
        proficiency_bonus: proficiency_bonus(new_character_level),
        proficiency_bonus_increased: proficiency_bonus(new_character_level)
            > proficiency_bonus(character.level()),
        cantrips_known: cantrips,
        spells_known: known,
        spell_slots: slots,
        max_spell_level: max_level,
    })
}

/// The player's submitted level-up choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpRequest {
    /// Class to take the level in (existing, or new for multiclass).
    pub class: String,
    pub hp: HpMethod,
    /// Required when the new class level grants an ASI.
    #[serde(default)]
    pub asi: Option<AsiAllocation>,
    /// Required when the new class level unlocks the subclass.
    #[serde(default)]
    pub subclass: Option<String>,
    #[serde(default)]
    pub new_cantrips: Vec<String>,
    #[serde(default)]
    pub new_spells: Vec<String>,
}

/// Apply a level-up, producing the updated character.
pub fn apply_level_up(
    tables: &RuleTables,
    character: &Character,
    request: &LevelUpRequest,
) -> Result<Character, RulesError> {
    let info = level_up_info(tables, character, &request.class)?;
    let entry = tables.class(&request.class)?;
    let mut updated = character.clone();

    // Hit points first, using the CON modifier before any ASI.
    let old_con_mod = updated.ability_scores.modifier(Ability::Constitution);
    let gain = hp_gain(entry.hit_die, old_con_mod, request.hp)?;
    updated.max_hp += gain;
    updated.current_hp += gain;

    // Class level.
    match updated.class_mut(&entry.name) {
        Some(cl) => cl.level += 1,
        None => updated.classes.push(ClassLevel::new(entry.name.clone(), 1)),
    }

    // Subclass: offered exactly once, at the unlock level.
    match (&request.subclass, info.offers_subclass) {
        (Some(choice), true) => {
            let subclass = entry
                .subclass(choice)
                .ok_or_else(|| RulesError::unknown_entry("subclass", choice.clone()))?;
            if let Some(cl) = updated.class_mut(&entry.name) {
                cl.subclass = Some(subclass.name.clone());
            }
        }
        (Some(_), false) => {
            return Err(RulesError::constraint(
                "Subclass is not chosen at this level",
            ));
        }
        (None, true) => {
            return Err(RulesError::validation(format!(
                "{} requires a subclass at level {}",
                entry.name, entry.subclass_level
            )));
        }
        (None, false) => {}
    }

    // Ability Score Improvement, with retroactive CON HP adjustment.
    match (&request.asi, info.offers_asi) {
        (Some(allocation), true) => {
            updated.ability_scores = allocation.apply(&updated.ability_scores)?;
            let new_con_mod = updated.ability_scores.modifier(Ability::Constitution);
            if new_con_mod != old_con_mod {
                let (current, max) = retroactive_con_hp(
                    updated.level(),
                    old_con_mod,
                    new_con_mod,
                    updated.current_hp,
                    updated.max_hp,
                );
                updated.current_hp = current;
                updated.max_hp = max;
            }
        }
        (Some(_), false) => {
            return Err(RulesError::constraint(
                "No ability score improvement at this level",
            ));
        }
        (None, true) => {
            return Err(RulesError::validation(
                "All 2 ASI points must be allocated before leveling up",
            ));
        }
        (None, false) => {}
    }

    apply_spell_choices(tables, &mut updated, entry, &info, request)?;

    updated.experience_to_next_level = xp_for_next_level(updated.level());
    Ok(updated)
}

fn apply_spell_choices(
    tables: &RuleTables,
    updated: &mut Character,
    entry: &ClassEntry,
    info: &LevelUpInfo,
    request: &LevelUpRequest,
) -> Result<(), RulesError> {
    if (!request.new_cantrips.is_empty() || !request.new_spells.is_empty())
        && entry.spellcasting.is_none()
    {
        return Err(RulesError::constraint(format!(
            "{} cannot learn spells",
            entry.name
        )));
    }

    // Limits are per class sub-level: only the picks this class level opens
    // up are spendable, so knowns granted by other classes never count
    // against them.
    let prev_class_level = info.new_class_level - 1;
    let cantrip_picks = info
        .cantrips_known
        .saturating_sub(cantrips_known(&entry.name, prev_class_level));

    let mut cantrips_added: u8 = 0;
    for name in &request.new_cantrips {
        let spell = tables.spell(name)?;
        if !spell.is_cantrip() {
            return Err(RulesError::validation(format!(
                "{} is not a cantrip",
                spell.name
            )));
        }
        ensure_class_spell(entry, spell.classes.as_slice(), &spell.name)?;
        if !updated.known_cantrips.contains(&spell.name) {
            updated.known_cantrips.push(spell.name.clone());
            cantrips_added += 1;
        }
    }
    if cantrips_added > cantrip_picks {
        return Err(RulesError::validation(format!(
            "{} learns at most {} new cantrips at this level",
            entry.name, cantrip_picks
        )));
    }

    let mut spells_added: u8 = 0;
    for name in &request.new_spells {
        let spell = tables.spell(name)?;
        if spell.is_cantrip() {
            return Err(RulesError::validation(format!(
                "{} is a cantrip, not a spell",
                spell.name
            )));
        }
        if spell.level > info.max_spell_level {
            return Err(RulesError::validation(format!(
                "{} is above spell level {}",
                spell.name, info.max_spell_level
            )));
        }
        ensure_class_spell(entry, spell.classes.as_slice(), &spell.name)?;
        if !updated.known_spells.contains(&spell.name) {
            updated.known_spells.push(spell.name.clone());
            spells_added += 1;
        }
    }
    if let Some(limit) = info.spells_known {
        let spell_picks =
            limit.saturating_sub(spells_known(&entry.name, prev_class_level).unwrap_or(0));
        if spells_added > spell_picks {
            return Err(RulesError::validation(format!(
                "{} learns at most {} new spells at this level",
                entry.name, spell_picks
            )));
        }
    }
    Ok(())
}

fn ensure_class_spell(
    entry: &ClassEntry,
    classes: &[String],
    spell_name: &str,
) -> Result<(), RulesError> {
    let class_key = normalize_key(&entry.name);
    if classes.iter().any(|c| normalize_key(c) == class_key) {
        Ok(())
    } else {
        Err(RulesError::validation(format!(
            "{} is not on the {} spell list",
            spell_name, entry.name
        )))
    }
}

fn ensure_multiclass_allowed(
    tables: &RuleTables,
    character: &Character,
    target: &ClassEntry,
) -> Result<(), RulesError> {
    let scores = &character.ability_scores;
    for cl in &character.classes {
        let current = tables.class(&cl.class)?;
        if !meets_multiclass_prerequisite(scores, &current.multiclass_prerequisite) {
            return Err(RulesError::constraint(format!(
                "Ability scores do not meet the multiclass requirement for {}",
                current.name
            )));
        }
    }
    if !meets_multiclass_prerequisite(scores, &target.multiclass_prerequisite) {
        return Err(RulesError::constraint(format!(
            "Ability scores do not meet the multiclass requirement for {}",
            target.name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Currency;
    use crate::tables::RuleTables;

    fn tables() -> RuleTables {
        RuleTables::load().expect("load")
    }

    fn fighter_at(level: u8, con: i32) -> Character {
        let mut scores = AbilityScores::all(10);
        scores.strength = 16;
        scores.constitution = con;
        Character {
            id: None,
            name: "Brel".to_string(),
            race: "Human".to_string(),
            subrace: None,
            background: "Soldier".to_string(),
            alignment: None,
            faith: None,
            lifestyle: None,
            classes: vec![{
                let mut cl = ClassLevel::new("Fighter", level);
                if level >= 3 {
                    cl.subclass = Some("Champion".to_string());
                }
                cl
            }],
            ability_scores: scores,
            current_hp: 40,
            max_hp: 44,
            experience: 6500,
            experience_to_next_level: 14000,
            gold: Currency::gp(10),
            skills: vec![],
            known_cantrips: vec![],
            known_spells: vec![],
            feats: vec![],
            languages: vec![],
            tool_proficiencies: vec![],
            inventory: vec![],
            avatar_path: None,
        }
    }

    #[test]
    fn proficiency_bonus_sequence() {
        let expected = [
            2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 6, 6, 6, 6,
        ];
        for (level, want) in (1..=20).zip(expected) {
            assert_eq!(proficiency_bonus(level), want);
        }
        // Monotonic over the whole range
        for level in 1..20u8 {
            assert!(proficiency_bonus(level + 1) >= proficiency_bonus(level));
        }
    }

    #[test]
    fn average_hp_gain_formula() {
        assert_eq!(average_hp_gain(10, 2), 8);
        assert_eq!(average_hp_gain(6, 0), 4);
        assert_eq!(average_hp_gain(12, 3), 10);
        // Floor of 1 regardless of negative CON
        assert_eq!(average_hp_gain(6, -5), 1);
    }

    #[test]
    fn rolled_hp_is_range_checked() {
        assert_eq!(hp_gain(10, 2, HpMethod::Roll { roll: 7 }).expect("gain"), 9);
        assert_eq!(hp_gain(6, -4, HpMethod::Roll { roll: 1 }).expect("gain"), 1);
        assert!(hp_gain(10, 2, HpMethod::Roll { roll: 0 }).is_err());
        assert!(hp_gain(10, 2, HpMethod::Roll { roll: 11 }).is_err());
    }

    #[test]
    fn retroactive_con_adjustment_clamps() {
        let (current, max) = retroactive_con_hp(6, 1, 2, 40, 44);
        assert_eq!((current, max), (46, 50));

        // Current never exceeds the new max
        let (current, max) = retroactive_con_hp(6, 2, 1, 44, 44);
        assert_eq!(max, 38);
        assert_eq!(current, 38);

        // And never drops below 1
        let (current, _) = retroactive_con_hp(10, 3, 1, 2, 60);
        assert_eq!(current, 1);
    }

    #[test]
    fn asi_allocation_bounds() {
        let scores = AbilityScores::all(10);

        let mut alloc = AsiAllocation::default();
        alloc.0.insert(Ability::Strength, 2);
        assert!(alloc.validate(&scores).is_ok());

        let mut split = AsiAllocation::default();
        split.0.insert(Ability::Strength, 1);
        split.0.insert(Ability::Wisdom, 1);
        assert!(split.validate(&scores).is_ok());

        let mut incomplete = AsiAllocation::default();
        incomplete.0.insert(Ability::Strength, 1);
        assert!(!incomplete.is_complete());
        assert!(incomplete.validate(&scores).is_err());

        let mut over = AsiAllocation::default();
        over.0.insert(Ability::Strength, 2);
        over.0.insert(Ability::Wisdom, 1);
        assert!(over.validate(&scores).is_err());

        let mut capped_scores = scores;
        capped_scores.strength = 19;
        let mut capped = AsiAllocation::default();
        capped.0.insert(Ability::Strength, 2);
        assert!(capped.validate(&capped_scores).is_err());
    }

    #[test]
    fn fighter_level_five_to_six_average() {
        let tables = tables();
        let character = fighter_at(5, 14); // CON mod +2
        let info = level_up_info(&tables, &character, "fighter").expect("info");
        assert_eq!(info.average_hp_gain, 8);
        assert_eq!(info.new_character_level, 6);
        assert!(!info.proficiency_bonus_increased);
        assert!(!info.offers_subclass);
        assert!(!info.offers_asi);

        let request = LevelUpRequest {
            class: "fighter".to_string(),
            hp: HpMethod::Average,
            asi: None,
            subclass: None,
            new_cantrips: vec![],
            new_spells: vec![],
        };
        let updated = apply_level_up(&tables, &character, &request).expect("level up");
        assert_eq!(updated.level(), 6);
        assert_eq!(updated.max_hp, 52);
        assert_eq!(updated.current_hp, 48);
        assert_eq!(updated.experience_to_next_level, 23000);
    }

    #[test]
    fn proficiency_increase_flagged_at_threshold() {
        let tables = tables();
        let character = fighter_at(4, 14);
        let info = level_up_info(&tables, &character, "fighter").expect("info");
        assert_eq!(info.proficiency_bonus, 3);
        assert!(info.proficiency_bonus_increased);
    }

    #[test]
    fn subclass_offered_exactly_once() {
        let tables = tables();
        let mut character = fighter_at(2, 14);
        character.classes[0].subclass = None;

        let info = level_up_info(&tables, &character, "fighter").expect("info");
        assert!(info.offers_subclass);
        assert!(info.subclass_options.contains(&"Champion".to_string()));

        // Missing choice blocks the level-up
        let request = LevelUpRequest {
            class: "fighter".to_string(),
            hp: HpMethod::Average,
            asi: None,
            subclass: None,
            new_cantrips: vec![],
            new_spells: vec![],
        };
        assert!(apply_level_up(&tables, &character, &request).is_err());

        let request = LevelUpRequest {
            subclass: Some("Champion".to_string()),
            ..request
        };
        let updated = apply_level_up(&tables, &character, &request).expect("level up");
        assert_eq!(
            updated.classes[0].subclass.as_deref(),
            Some("Champion")
        );

        // Level 4: not offered again, and choosing one is rejected
        let info = level_up_info(&tables, &updated, "fighter").expect("info");
        assert!(!info.offers_subclass);
        let request = LevelUpRequest {
            class: "fighter".to_string(),
            hp: HpMethod::Average,
            asi: Some(AsiAllocation(HashMap::from([(Ability::Strength, 2)]))),
            subclass: Some("Battle Master".to_string()),
            new_cantrips: vec![],
            new_spells: vec![],
        };
        assert!(apply_level_up(&tables, &updated, &request).is_err());
    }

    #[test]
    fn asi_with_con_increase_adjusts_hp_retroactively() {
        let tables = tables();
        let mut character = fighter_at(3, 13); // CON 13, mod +1
        character.current_hp = 28;
        character.max_hp = 28;

        let request = LevelUpRequest {
            class: "fighter".to_string(),
            hp: HpMethod::Average, // 5 + 1 + 1 = 7
            asi: Some(AsiAllocation(HashMap::from([(
                Ability::Constitution,
                1,
            ), (Ability::Strength, 1)]))),
            subclass: None,
            new_cantrips: vec![],
            new_spells: vec![],
        };
        let updated = apply_level_up(&tables, &character, &request).expect("level up");
        // CON 13 -> 14 raises the modifier by 1 at level 4: +4 HP on top
        // of the 7 gained.
        assert_eq!(updated.max_hp, 39);
        assert_eq!(updated.current_hp, 39);
        assert_eq!(updated.ability_scores.constitution, 14);
    }

    #[test]
    fn asi_required_at_asi_level() {
        let tables = tables();
        let character = fighter_at(3, 14);
        let request = LevelUpRequest {
            class: "fighter".to_string(),
            hp: HpMethod::Average,
            asi: None,
            subclass: None,
            new_cantrips: vec![],
            new_spells: vec![],
        };
        assert!(apply_level_up(&tables, &character, &request).is_err());
    }

    #[test]
    fn multiclass_requires_both_gates() {
        let tables = tables();

        // STR 16 meets Fighter's gate, but WIS 10 fails Cleric's.
        let character = fighter_at(5, 14);
        let eligible = eligible_classes(&tables, &character);
        assert!(eligible.contains(&"Fighter".to_string()));
        assert!(!eligible.contains(&"Cleric".to_string()));
        assert!(eligible.contains(&"Barbarian".to_string()));

        let mut wise = fighter_at(5, 14);
        wise.ability_scores.wisdom = 13;
        let eligible = eligible_classes(&tables, &wise);
        assert!(eligible.contains(&"Cleric".to_string()));

        // Taking a Cleric level adds a level-1 class entry.
        let request = LevelUpRequest {
            class: "cleric".to_string(),
            hp: HpMethod::Average,
            asi: None,
            subclass: Some("Life Domain".to_string()),
            new_cantrips: vec![],
            new_spells: vec![],
        };
        let updated = apply_level_up(&tables, &wise, &request).expect("multiclass");
        assert_eq!(updated.level(), 6);
        assert_eq!(updated.class_level("cleric"), 1);
        assert_eq!(updated.class_level("fighter"), 5);

        // And a character who fails the gate cannot.
        let request = LevelUpRequest {
            class: "cleric".to_string(),
            hp: HpMethod::Average,
            asi: None,
            subclass: Some("Life Domain".to_string()),
            new_cantrips: vec![],
            new_spells: vec![],
        };
        assert!(apply_level_up(&tables, &character, &request).is_err());
    }

    #[test]
    fn spell_choices_validated_against_class_list() {
        let tables = tables();
        let mut scores = AbilityScores::all(10);
        scores.intelligence = 16;
        scores.constitution = 14;
        let mut wizard = fighter_at(2, 14);
        wizard.ability_scores = scores;
        wizard.classes = vec![{
            let mut cl = ClassLevel::new("Wizard", 2);
            cl.subclass = Some("School of Evocation".to_string());
            cl
        }];
        wizard.known_cantrips = vec!["Fire Bolt".to_string()];

        let request = LevelUpRequest {
            class: "wizard".to_string(),
            hp: HpMethod::Average,
            asi: None,
            subclass: None,
            new_cantrips: vec![],
            new_spells: vec!["Fireball".to_string()],
        };
        // Fireball is level 3; a level-3 wizard caps at spell level 2.
        assert!(apply_level_up(&tables, &wizard, &request).is_err());

        let request = LevelUpRequest {
            new_spells: vec!["Misty Step".to_string()],
            ..request
        };
        let updated = apply_level_up(&tables, &wizard, &request).expect("level up");
        assert!(updated.known_spells.contains(&"Misty Step".to_string()));

        // Cure Wounds is not on the wizard list.
        let request = LevelUpRequest {
            class: "wizard".to_string(),
            hp: HpMethod::Average,
            asi: None,
            subclass: None,
            new_cantrips: vec![],
            new_spells: vec!["Cure Wounds".to_string()],
        };
        assert!(apply_level_up(&tables, &wizard, &request).is_err());
    }

    #[test]
    fn multiclass_caster_keeps_cantrips_from_first_class() {
        let tables = tables();
        let mut scores = AbilityScores::all(10);
        scores.intelligence = 16;
        scores.charisma = 13;
        scores.constitution = 14;
        let mut wizard = fighter_at(3, 14);
        wizard.ability_scores = scores;
        wizard.classes = vec![{
            let mut cl = ClassLevel::new("Wizard", 3);
            cl.subclass = Some("School of Evocation".to_string());
            cl
        }];
        wizard.known_cantrips = vec![
            "Fire Bolt".to_string(),
            "Mage Hand".to_string(),
            "Light".to_string(),
        ];

        assert!(eligible_classes(&tables, &wizard).contains(&"Bard".to_string()));

        // Three wizard cantrips exceed Bard's level-1 count of two, but
        // they were granted by Wizard levels and cost Bard nothing.
        let request = LevelUpRequest {
            class: "bard".to_string(),
            hp: HpMethod::Average,
            asi: None,
            subclass: None,
            new_cantrips: vec![],
            new_spells: vec![],
        };
        let updated = apply_level_up(&tables, &wizard, &request).expect("multiclass");
        assert_eq!(updated.level(), 4);
        assert_eq!(updated.class_level("bard"), 1);
        assert_eq!(updated.known_cantrips.len(), 3);

        // Bard level 1 grants two cantrip picks; an already-known cantrip
        // does not spend one.
        let request = LevelUpRequest {
            new_cantrips: vec![
                "Mage Hand".to_string(),
                "Vicious Mockery".to_string(),
                "Dancing Lights".to_string(),
            ],
            new_spells: vec!["Cure Wounds".to_string(), "Healing Word".to_string()],
            ..request
        };
        let updated = apply_level_up(&tables, &wizard, &request).expect("multiclass");
        assert_eq!(updated.known_cantrips.len(), 5);
        assert!(updated.known_spells.contains(&"Cure Wounds".to_string()));

        // A third new cantrip is one more than Bard level 1 grants.
        let request = LevelUpRequest {
            class: "bard".to_string(),
            hp: HpMethod::Average,
            asi: None,
            subclass: None,
            new_cantrips: vec![
                "Vicious Mockery".to_string(),
                "Dancing Lights".to_string(),
                "Minor Illusion".to_string(),
            ],
            new_spells: vec![],
        };
        assert!(apply_level_up(&tables, &wizard, &request).is_err());
    }

    #[test]
    fn cantrip_picks_limited_to_level_delta() {
        let tables = tables();
        let mut scores = AbilityScores::all(10);
        scores.intelligence = 16;
        scores.constitution = 14;
        let mut wizard = fighter_at(3, 14);
        wizard.ability_scores = scores;
        wizard.classes = vec![{
            let mut cl = ClassLevel::new("Wizard", 3);
            cl.subclass = Some("School of Evocation".to_string());
            cl
        }];
        wizard.known_cantrips = vec![
            "Fire Bolt".to_string(),
            "Mage Hand".to_string(),
            "Light".to_string(),
        ];

        // Wizard 3 -> 4 opens exactly one cantrip pick.
        let request = LevelUpRequest {
            class: "wizard".to_string(),
            hp: HpMethod::Average,
            asi: Some(AsiAllocation(HashMap::from([(Ability::Intelligence, 2)]))),
            subclass: None,
            new_cantrips: vec![
                "Prestidigitation".to_string(),
                "Minor Illusion".to_string(),
            ],
            new_spells: vec![],
        };
        assert!(apply_level_up(&tables, &wizard, &request).is_err());

        let request = LevelUpRequest {
            new_cantrips: vec!["Prestidigitation".to_string()],
            ..request
        };
        let updated = apply_level_up(&tables, &wizard, &request).expect("level up");
        assert_eq!(updated.known_cantrips.len(), 4);
    }

    #[test]
    fn level_twenty_is_terminal() {
        let tables = tables();
        let character = fighter_at(20, 14);
        assert!(eligible_classes(&tables, &character).is_empty());
        assert!(level_up_info(&tables, &character, "fighter").is_err());
    }
}
