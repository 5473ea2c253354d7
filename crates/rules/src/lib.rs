//! Character rules engine: creation flow, advancement, companions, and the
//! bundled rule data that drives them.
//!
//! Everything here is deterministic given the loaded [`RuleTables`] (dice
//! rolls excepted); persistence and transport live in the client crate.

pub mod abilities;
pub mod companion;
pub mod dice;
pub mod entities;
pub mod equipment;
pub mod error;
pub mod feats;
pub mod ids;
pub mod progression;
pub mod tables;
pub mod wizard;

pub use abilities::{
    ability_modifier, base_from_final, clamp_manual, resolve_scores, Ability, AbilityScores,
    BaseScores, BonusMap, StandardArrayAssignment, STANDARD_ARRAY,
};
pub use companion::{Companion, CompanionKind};
pub use dice::DiceFormula;
pub use entities::{merge_stacks, Character, ClassLevel, Currency, ItemStack};
pub use equipment::{
    expand_packs, resolve_starting_equipment, EquipmentSource, GoldMethod, KitSelection,
    ResolvedEquipment,
};
pub use error::RulesError;
pub use feats::{Feat, FeatAvailability, FeatBenefit, Prerequisite};
pub use ids::{CharacterId, CompanionId};
pub use progression::{
    apply_level_up, eligible_classes, level_from_xp, level_up_info, proficiency_bonus,
    xp_for_level, xp_for_next_level, AsiAllocation, HpMethod, LevelUpInfo, LevelUpRequest,
};
pub use tables::{
    normalize_key, Background, CasterKind, ClassEntry, Deity, Race, RuleTables, SpellEntry,
};
pub use wizard::{AbilityEntry, CharacterDraft, CreationWizard, WizardStep};
