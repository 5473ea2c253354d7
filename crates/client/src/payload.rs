//! Wire payloads for the backend.
//!
//! The backend stores a flattened record: scalar columns plus several
//! JSON-encoded string columns (`ability_scores` as an object keyed by
//! ability name, `inventory`/`equipment` as arrays of `{name, quantity}`,
//! the other list fields as string arrays). Field names and encodings here
//! are load-bearing; the backend matches them byte for byte.
//!
//! Decoding is deliberately forgiving: a corrupt JSON column falls back to
//! a default (all-10 scores, empty list) instead of failing the whole
//! record, so one bad field never makes a character unloadable.

use serde::{Deserialize, Serialize};
use tracing::warn;

use chronicler_rules::{
    Ability, AbilityScores, Character, CharacterId, ClassLevel, Companion, CompanionId,
    CompanionKind, Currency, ItemStack,
};

/// Flattened character record as POSTed to and returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterPayload {
    pub name: String,
    pub race: String,
    #[serde(default)]
    pub subrace: Option<String>,
    /// Primary class; `classes` carries the full multiclass breakdown.
    pub class: String,
    #[serde(default)]
    pub subclass: Option<String>,
    pub background: String,
    #[serde(default)]
    pub alignment: Option<String>,
    #[serde(default)]
    pub faith: Option<String>,
    #[serde(default)]
    pub lifestyle: Option<String>,
    /// Total character level across all classes.
    pub level: u8,
    /// JSON-encoded array of `{class, level, subclass}`.
    #[serde(default)]
    pub classes: String,
    /// JSON-encoded object keyed by full lowercase ability name.
    pub ability_scores: String,
    pub current_hp: i32,
    pub max_hp: i32,
    pub experience: i32,
    pub experience_to_next_level: i32,
    pub gold_cp: i32,
    pub gold_sp: i32,
    pub gold_gp: i32,
    /// JSON-encoded string arrays.
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub known_cantrips: String,
    #[serde(default)]
    pub known_spells: String,
    #[serde(default)]
    pub feats: String,
    #[serde(default)]
    pub languages: String,
    #[serde(default)]
    pub tool_proficiencies: String,
    /// JSON-encoded array of `{name, quantity}`.
    #[serde(default)]
    pub inventory: String,
    /// Same encoding as `inventory`; kept for backend compatibility and
    /// read as a fallback when `inventory` is absent.
    #[serde(default)]
    pub equipment: String,
    #[serde(default)]
    pub avatar_path: Option<String>,
}

/// A persisted character: the payload plus its backend id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: i64,
    #[serde(flatten)]
    pub payload: CharacterPayload,
}

impl CharacterPayload {
    pub fn from_character(character: &Character) -> Self {
        let primary = character.classes.first();
        Self {
            name: character.name.clone(),
            race: character.race.clone(),
            subrace: character.subrace.clone(),
            class: primary.map(|c| c.class.clone()).unwrap_or_default(),
            subclass: primary.and_then(|c| c.subclass.clone()),
            background: character.background.clone(),
            alignment: character.alignment.clone(),
            faith: character.faith.clone(),
            lifestyle: character.lifestyle.clone(),
            level: character.level(),
            classes: encode_json(&character.classes),
            ability_scores: encode_scores(&character.ability_scores),
            current_hp: character.current_hp,
            max_hp: character.max_hp,
            experience: character.experience,
            experience_to_next_level: character.experience_to_next_level,
            gold_cp: character.gold.cp,
            gold_sp: character.gold.sp,
            gold_gp: character.gold.gp,
            skills: encode_json(&character.skills),
            known_cantrips: encode_json(&character.known_cantrips),
            known_spells: encode_json(&character.known_spells),
            feats: encode_json(&character.feats),
            languages: encode_json(&character.languages),
            tool_proficiencies: encode_json(&character.tool_proficiencies),
            inventory: encode_json(&character.inventory),
            equipment: encode_json(&character.inventory),
            avatar_path: character.avatar_path.clone(),
        }
    }

    fn into_character(self, id: Option<CharacterId>) -> Character {
        let classes = decode_classes(&self);
        let inventory = if self.inventory.trim().is_empty() {
            decode_items("equipment", &self.equipment)
        } else {
            decode_items("inventory", &self.inventory)
        };
        Character {
            id,
            name: self.name,
            race: self.race,
            subrace: self.subrace,
            background: self.background,
            alignment: self.alignment,
            faith: self.faith,
            lifestyle: self.lifestyle,
            classes,
            ability_scores: decode_scores(&self.ability_scores),
            current_hp: self.current_hp,
            max_hp: self.max_hp,
            experience: self.experience,
            experience_to_next_level: self.experience_to_next_level,
            gold: Currency {
                cp: self.gold_cp,
                sp: self.gold_sp,
                gp: self.gold_gp,
            },
            skills: decode_strings("skills", &self.skills),
            known_cantrips: decode_strings("known_cantrips", &self.known_cantrips),
            known_spells: decode_strings("known_spells", &self.known_spells),
            feats: decode_strings("feats", &self.feats),
            languages: decode_strings("languages", &self.languages),
            tool_proficiencies: decode_strings("tool_proficiencies", &self.tool_proficiencies),
            inventory,
            avatar_path: self.avatar_path,
        }
    }
}

impl CharacterRecord {
    pub fn into_character(self) -> Character {
        let id = Some(CharacterId::new(self.id));
        self.payload.into_character(id)
    }
}

/// Flattened companion record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanionPayload {
    pub name: String,
    pub race: String,
    #[serde(default)]
    pub description: String,
    /// "npc_stats" or "class_based".
    pub companion_type: String,
    #[serde(default)]
    pub challenge_rating: Option<String>,
    #[serde(default)]
    pub stat_block: Option<String>,
    #[serde(default)]
    pub companion_class: Option<String>,
    #[serde(default)]
    pub companion_level: Option<u8>,
    #[serde(default)]
    pub companion_subclass: Option<String>,
    /// Same encoding as the character's `ability_scores`.
    #[serde(default)]
    pub companion_ability_scores: Option<String>,
    #[serde(default)]
    pub current_hp: Option<i32>,
    #[serde(default)]
    pub max_hp: Option<i32>,
    #[serde(default)]
    pub recruited_by: Option<i64>,
}

/// A persisted companion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionRecord {
    pub id: i64,
    #[serde(flatten)]
    pub payload: CompanionPayload,
}

impl CompanionPayload {
    pub fn from_companion(companion: &Companion) -> Self {
        let mut payload = Self {
            name: companion.name.clone(),
            race: companion.race.clone(),
            description: companion.description.clone(),
            recruited_by: companion.recruited_by.map(|id| id.as_i64()),
            ..Self::default()
        };
        match &companion.kind {
            CompanionKind::NpcStats {
                challenge_rating,
                stat_block,
            } => {
                payload.companion_type = "npc_stats".to_string();
                payload.challenge_rating = Some(challenge_rating.clone());
                payload.stat_block = Some(stat_block.clone());
            }
            CompanionKind::ClassBased {
                class,
                level,
                subclass,
                ability_scores,
                current_hp,
                max_hp,
            } => {
                payload.companion_type = "class_based".to_string();
                payload.companion_class = Some(class.clone());
                payload.companion_level = Some(*level);
                payload.companion_subclass = subclass.clone();
                payload.companion_ability_scores = Some(encode_scores(ability_scores));
                payload.current_hp = Some(*current_hp);
                payload.max_hp = Some(*max_hp);
            }
        }
        payload
    }

    fn into_companion(self, id: Option<CompanionId>) -> Companion {
        let kind = if self.companion_type == "class_based" {
            CompanionKind::ClassBased {
                class: self.companion_class.unwrap_or_default(),
                level: self.companion_level.unwrap_or(1),
                subclass: self.companion_subclass,
                ability_scores: self
                    .companion_ability_scores
                    .as_deref()
                    .map(decode_scores)
                    .unwrap_or_default(),
                current_hp: self.current_hp.unwrap_or(1),
                max_hp: self.max_hp.unwrap_or(1),
            }
        } else {
            CompanionKind::NpcStats {
                challenge_rating: self.challenge_rating.unwrap_or_default(),
                stat_block: self.stat_block.unwrap_or_default(),
            }
        };
        Companion {
            id,
            name: self.name,
            race: self.race,
            description: self.description,
            kind,
            recruited_by: self.recruited_by.map(CharacterId::new),
        }
    }
}

impl CompanionRecord {
    pub fn into_companion(self) -> Companion {
        let id = Some(CompanionId::new(self.id));
        self.payload.into_companion(id)
    }
}

/// Encode ability scores as the backend's JSON object string.
fn encode_scores(scores: &AbilityScores) -> String {
    let map: serde_json::Map<String, serde_json::Value> = Ability::ALL
        .iter()
        .map(|a| (a.key().to_string(), serde_json::json!(scores.get(*a))))
        .collect();
    serde_json::Value::Object(map).to_string()
}

/// Decode the ability-score column; a corrupt value falls back to all 10s.
fn decode_scores(raw: &str) -> AbilityScores {
    let parsed: Result<serde_json::Map<String, serde_json::Value>, _> =
        serde_json::from_str(raw);
    let map = match parsed {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, "Corrupt ability_scores column, using defaults");
            return AbilityScores::default();
        }
    };
    let mut scores = AbilityScores::default();
    for ability in Ability::ALL {
        if let Some(value) = map.get(ability.key()).and_then(|v| v.as_i64()) {
            scores.set(ability, value as i32);
        }
    }
    scores
}

fn encode_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

fn decode_strings(field: &str, raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(raw) {
        Ok(list) => list,
        Err(e) => {
            warn!(field, error = %e, "Corrupt list column, using empty list");
            Vec::new()
        }
    }
}

fn decode_items(field: &str, raw: &str) -> Vec<ItemStack> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(raw) {
        Ok(items) => items,
        Err(e) => {
            warn!(field, error = %e, "Corrupt item column, using empty list");
            Vec::new()
        }
    }
}

/// Prefer the full `classes` column; fall back to the flattened
/// class/level/subclass fields for records written before multiclass.
fn decode_classes(payload: &CharacterPayload) -> Vec<ClassLevel> {
    if !payload.classes.trim().is_empty() {
        match serde_json::from_str::<Vec<ClassLevel>>(&payload.classes) {
            Ok(classes) if !classes.is_empty() => return classes,
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Corrupt classes column, using flat fields"),
        }
    }
    if payload.class.is_empty() {
        return Vec::new();
    }
    let mut class = ClassLevel::new(payload.class.clone(), payload.level.max(1));
    class.subclass = payload.subclass.clone();
    vec![class]
}
