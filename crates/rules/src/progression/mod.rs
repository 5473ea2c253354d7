//! Character advancement: XP thresholds, spell progression, and the
//! level-up engine.

pub mod experience;
pub mod level_up;
pub mod spellcasting;

pub use experience::{level_from_xp, xp_for_level, xp_for_next_level};
pub use level_up::{
    apply_level_up, average_hp_gain, eligible_classes, hp_gain, level_up_info,
    meets_multiclass_prerequisite, proficiency_bonus, retroactive_con_hp, AsiAllocation,
    HpMethod, LevelUpInfo, LevelUpRequest, ABILITY_SCORE_CAP, ASI_LEVELS, ASI_POINTS,
};
pub use spellcasting::{cantrips_known, max_spell_level, spell_slots, spells_known};
