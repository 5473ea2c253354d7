//! Starting equipment and gold resolution.
//!
//! Compiles the class kit (or a gold method), the player's choice-group
//! selections, and the background's fixed list into a flat inventory plus a
//! starting gold total. Pack names expand into their contents; gold pouches
//! are pulled out of the item list and summed into gold.

use serde::{Deserialize, Serialize};

use crate::dice::DiceFormula;
use crate::entities::item::{merge_stacks, Currency, ItemStack};
use crate::error::RulesError;
use crate::tables::{ClassEntry, EquipmentOption, RuleTables};

/// How starting gold is determined when the player takes gold instead of
/// the class kit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum GoldMethod {
    /// Player-rolled dice total (before the class multiplier).
    Rolled { roll: i32 },
    /// The class's fixed average value.
    Average,
    /// Manually entered total.
    Manual { gp: i32 },
}

/// The player's equipment path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum EquipmentSource {
    /// Take the class starting kit, with one selection per choice group.
    ClassKit { selections: Vec<KitSelection> },
    /// Take gold instead of the class kit.
    Gold(GoldMethod),
}

/// One resolved choice-group selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitSelection {
    /// Index into the class's choice groups.
    pub group: usize,
    /// Index into the group's options.
    pub option: usize,
    /// Concrete item for a generic category option ("any martial weapon").
    #[serde(default)]
    pub category_pick: Option<String>,
}

/// Flat item list plus compiled starting gold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEquipment {
    pub items: Vec<ItemStack>,
    pub gold: Currency,
}

/// Resolve the starting kit for a class/background pair.
pub fn resolve_starting_equipment(
    tables: &RuleTables,
    class_key: &str,
    background_key: &str,
    source: &EquipmentSource,
) -> Result<ResolvedEquipment, RulesError> {
    let class = tables.class(class_key)?;
    let background = tables.background(background_key)?;

    let mut items: Vec<ItemStack> = Vec::new();
    let mut gold_gp: i32 = 0;

    match source {
        EquipmentSource::ClassKit { selections } => {
            items.extend(class.equipment.given.iter().cloned());
            if selections.is_empty() && class.equipment.given.is_empty() {
                // No selections and nothing unconditional: take the first
                // option of every group so the kit is never empty.
                for group in &class.equipment.choices {
                    if let Some(option) = group.options.first() {
                        items.extend(resolve_option(tables, option, None)?);
                    }
                }
            } else {
                for selection in selections {
                    let group = class.equipment.choices.get(selection.group).ok_or_else(|| {
                        RulesError::validation(format!(
                            "Choice group {} does not exist for {}",
                            selection.group, class.name
                        ))
                    })?;
                    let option = group.options.get(selection.option).ok_or_else(|| {
                        RulesError::validation(format!(
                            "Option {} does not exist in choice group {}",
                            selection.option, selection.group
                        ))
                    })?;
                    items.extend(resolve_option(
                        tables,
                        option,
                        selection.category_pick.as_deref(),
                    )?);
                }
            }
        }
        EquipmentSource::Gold(method) => {
            gold_gp += resolve_gold(class, *method)?;
        }
    }

    items.extend(background.equipment.iter().cloned());

    // Pull gold pouches out of the item list before pack expansion.
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        match pouch_gold(&item.name) {
            Some(gp) => gold_gp += gp * item.quantity as i32,
            None => kept.push(item),
        }
    }

    let expanded = expand_packs(tables, kept);

    Ok(ResolvedEquipment {
        items: merge_stacks(expanded),
        gold: Currency::gp(gold_gp),
    })
}

fn resolve_option(
    tables: &RuleTables,
    option: &EquipmentOption,
    category_pick: Option<&str>,
) -> Result<Vec<ItemStack>, RulesError> {
    match &option.category {
        None => Ok(option.items.clone()),
        Some(category) => {
            let members = tables.weapon_category(category).ok_or_else(|| {
                RulesError::unknown_entry("weapon_category", category.clone())
            })?;
            let name = match category_pick {
                Some(pick) => {
                    let pick_key = crate::tables::normalize_key(pick);
                    members
                        .iter()
                        .find(|m| crate::tables::normalize_key(m) == pick_key)
                        .ok_or_else(|| {
                            RulesError::validation(format!(
                                "'{}' is not a valid {} choice",
                                pick, option.label
                            ))
                        })?
                }
                // No sub-selection made: first member of the category.
                None => members.first().ok_or_else(|| {
                    RulesError::MalformedTable {
                        table: "equipment",
                        detail: format!("category '{}' is empty", category),
                    }
                })?,
            };
            Ok(vec![ItemStack::one(name.clone())])
        }
    }
}

fn resolve_gold(class: &ClassEntry, method: GoldMethod) -> Result<i32, RulesError> {
    match method {
        GoldMethod::Rolled { roll } => {
            let dice = DiceFormula::parse(&class.starting_gold.dice)?;
            if roll < dice.min_roll() || roll > dice.max_roll() {
                return Err(RulesError::validation(format!(
                    "Roll {} is outside {} for {}",
                    roll, dice, class.name
                )));
            }
            Ok(roll * class.starting_gold.multiplier)
        }
        GoldMethod::Average => Ok(class.starting_gold.average_gp),
        GoldMethod::Manual { gp } => {
            if gp < 0 {
                return Err(RulesError::validation("Starting gold cannot be negative"));
            }
            Ok(gp)
        }
    }
}

/// Expand pack names into their contents. Items that are not packs pass
/// through unchanged, so expanding an already-expanded list is a no-op.
pub fn expand_packs(tables: &RuleTables, items: Vec<ItemStack>) -> Vec<ItemStack> {
    let mut expanded = Vec::with_capacity(items.len());
    for item in items {
        match tables.pack(&item.name) {
            Some(pack) => {
                for content in &pack.contents {
                    expanded.push(ItemStack::new(
                        content.name.clone(),
                        content.quantity * item.quantity,
                    ));
                }
            }
            None => expanded.push(item),
        }
    }
    expanded
}

/// Gold value of an item entry that is purely a money pouch
/// ("Pouch containing 15 gp", "15 gp"). Returns None for real items.
fn pouch_gold(name: &str) -> Option<i32> {
    let lower = name.to_lowercase();
    let mut amount: Option<i32> = None;
    for token in lower.split_whitespace() {
        if let Ok(value) = token.parse::<i32>() {
            if amount.is_some() {
                return None;
            }
            amount = Some(value);
        } else if !matches!(
            token,
            "a" | "belt" | "pouch" | "containing" | "with" | "of" | "gp"
        ) {
            return None;
        }
    }
    if lower.split_whitespace().last() == Some("gp") {
        amount
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::RuleTables;

    fn tables() -> RuleTables {
        RuleTables::load().expect("load")
    }

    #[test]
    fn pouch_gold_detection() {
        assert_eq!(pouch_gold("Pouch containing 15 gp"), Some(15));
        assert_eq!(pouch_gold("15 gp"), Some(15));
        assert_eq!(pouch_gold("A belt pouch with 10 gp"), Some(10));
        assert_eq!(pouch_gold("Longsword"), None);
        assert_eq!(pouch_gold("Bag of 20 caltrops"), None);
    }

    #[test]
    fn pack_expansion_is_idempotent() {
        let tables = tables();
        let items = vec![ItemStack::one("Explorer's Pack"), ItemStack::one("Torch")];
        let once = expand_packs(&tables, items);
        assert!(once.iter().all(|i| tables.pack(&i.name).is_none()));
        let twice = expand_packs(&tables, once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn class_kit_with_explicit_selections() {
        let tables = tables();
        let source = EquipmentSource::ClassKit {
            selections: vec![
                KitSelection {
                    group: 0,
                    option: 0,
                    category_pick: None,
                },
                KitSelection {
                    group: 1,
                    option: 0,
                    category_pick: Some("Greatsword".to_string()),
                },
            ],
        };
        let resolved = resolve_starting_equipment(&tables, "fighter", "soldier", &source)
            .expect("resolve");
        assert!(resolved.items.iter().any(|i| i.name == "Chain Mail"));
        assert!(resolved.items.iter().any(|i| i.name == "Greatsword"));
        // Soldier background pouch: 10 gp
        assert_eq!(resolved.gold.gp, 10);
    }

    #[test]
    fn empty_selection_falls_back_to_first_options() {
        let tables = tables();
        let source = EquipmentSource::ClassKit { selections: vec![] };
        let resolved =
            resolve_starting_equipment(&tables, "fighter", "soldier", &source).expect("resolve");
        // Fighter has no unconditional given items, so every group
        // contributes its first option.
        assert!(resolved.items.iter().any(|i| i.name == "Chain Mail"));
        assert!(!resolved.items.is_empty());
    }

    #[test]
    fn invalid_category_pick_is_rejected() {
        let tables = tables();
        let source = EquipmentSource::ClassKit {
            selections: vec![KitSelection {
                group: 1,
                option: 0,
                category_pick: Some("Fireball".to_string()),
            }],
        };
        let err = resolve_starting_equipment(&tables, "fighter", "soldier", &source)
            .expect_err("invalid pick");
        assert!(matches!(err, RulesError::Validation(_)));
    }

    #[test]
    fn rolled_gold_uses_class_multiplier() {
        let tables = tables();
        let source = EquipmentSource::Gold(GoldMethod::Rolled { roll: 12 });
        let resolved =
            resolve_starting_equipment(&tables, "fighter", "soldier", &source).expect("resolve");
        // 12 x 10 gp from the roll plus the soldier's 10 gp pouch.
        assert_eq!(resolved.gold.gp, 130);
    }

    #[test]
    fn rolled_gold_out_of_range_is_rejected() {
        let tables = tables();
        let source = EquipmentSource::Gold(GoldMethod::Rolled { roll: 99 });
        assert!(resolve_starting_equipment(&tables, "fighter", "soldier", &source).is_err());
    }

    #[test]
    fn average_gold_matches_class_table() {
        let tables = tables();
        let source = EquipmentSource::Gold(GoldMethod::Average);
        let resolved =
            resolve_starting_equipment(&tables, "fighter", "soldier", &source).expect("resolve");
        let fighter = tables.class("fighter").expect("fighter");
        assert_eq!(
            resolved.gold.gp,
            fighter.starting_gold.average_gp + 10
        );
    }

    #[test]
    fn background_equipment_always_included() {
        let tables = tables();
        let source = EquipmentSource::Gold(GoldMethod::Manual { gp: 50 });
        let resolved =
            resolve_starting_equipment(&tables, "wizard", "sage", &source).expect("resolve");
        assert!(resolved
            .items
            .iter()
            .any(|i| i.name == "Bottle of Black Ink"));
        assert_eq!(resolved.gold.gp, 60);
    }
}
