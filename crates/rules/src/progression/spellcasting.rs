//! Spell slot, cantrip, and spells-known progression tables.

use std::collections::HashMap;

use crate::tables::{normalize_key, CasterKind};

/// Spell slots by slot level for a class sub-level.
pub fn spell_slots(caster: CasterKind, class_level: u8) -> HashMap<u8, u8> {
    match caster {
        CasterKind::Full => full_caster_slots(class_level),
        CasterKind::Half => half_caster_slots(class_level),
        CasterKind::Third => third_caster_slots(class_level),
        CasterKind::Pact => pact_slots(class_level),
    }
}

/// Highest slot level available, used to cap learnable spell levels.
pub fn max_spell_level(caster: CasterKind, class_level: u8) -> u8 {
    spell_slots(caster, class_level)
        .keys()
        .max()
        .copied()
        .unwrap_or(0)
}

fn slots_from_row(row: Option<&&[u8]>) -> HashMap<u8, u8> {
    row.map(|s| {
        s.iter()
            .enumerate()
            .map(|(i, &count)| ((i + 1) as u8, count))
            .collect()
    })
    .unwrap_or_default()
}

fn full_caster_slots(level: u8) -> HashMap<u8, u8> {
    let rows: &[&[u8]] = &[
        &[2],
        &[3],
        &[4, 2],
        &[4, 3],
        &[4, 3, 2],
        &[4, 3, 3],
        &[4, 3, 3, 1],
        &[4, 3, 3, 2],
        &[4, 3, 3, 3, 1],
        &[4, 3, 3, 3, 2],
        &[4, 3, 3, 3, 2, 1],
        &[4, 3, 3, 3, 2, 1],
        &[4, 3, 3, 3, 2, 1, 1],
        &[4, 3, 3, 3, 2, 1, 1],
        &[4, 3, 3, 3, 2, 1, 1, 1],
        &[4, 3, 3, 3, 2, 1, 1, 1],
        &[4, 3, 3, 3, 2, 1, 1, 1, 1],
        &[4, 3, 3, 3, 3, 1, 1, 1, 1],
        &[4, 3, 3, 3, 3, 2, 1, 1, 1],
        &[4, 3, 3, 3, 3, 2, 2, 1, 1],
    ];
    if level == 0 {
        return HashMap::new();
    }
    slots_from_row(rows.get((level - 1) as usize))
}

fn half_caster_slots(level: u8) -> HashMap<u8, u8> {
    // Half casters start at class level 2.
    let rows: &[(u8, &[u8])] = &[
        (2, &[2]),
        (3, &[3]),
        (4, &[3]),
        (5, &[4, 2]),
        (6, &[4, 2]),
        (7, &[4, 3]),
        (8, &[4, 3]),
        (9, &[4, 3, 2]),
        (10, &[4, 3, 2]),
        (11, &[4, 3, 3]),
        (12, &[4, 3, 3]),
        (13, &[4, 3, 3, 1]),
        (14, &[4, 3, 3, 1]),
        (15, &[4, 3, 3, 2]),
        (16, &[4, 3, 3, 2]),
        (17, &[4, 3, 3, 3, 1]),
        (18, &[4, 3, 3, 3, 1]),
        (19, &[4, 3, 3, 3, 2]),
        (20, &[4, 3, 3, 3, 2]),
    ];
    slots_from_row(rows.iter().find(|(l, _)| *l == level).map(|(_, s)| s))
}

fn third_caster_slots(level: u8) -> HashMap<u8, u8> {
    // Third casters (Eldritch Knight, Arcane Trickster) start at level 3.
    let rows: &[(u8, &[u8])] = &[
        (3, &[2]),
        (4, &[3]),
        (5, &[3]),
        (6, &[3]),
        (7, &[4, 2]),
        (8, &[4, 2]),
        (9, &[4, 2]),
        (10, &[4, 3]),
        (11, &[4, 3]),
        (12, &[4, 3]),
        (13, &[4, 3, 2]),
        (14, &[4, 3, 2]),
        (15, &[4, 3, 2]),
        (16, &[4, 3, 3]),
        (17, &[4, 3, 3]),
        (18, &[4, 3, 3]),
        (19, &[4, 3, 3, 1]),
        (20, &[4, 3, 3, 1]),
    ];
    slots_from_row(rows.iter().find(|(l, _)| *l == level).map(|(_, s)| s))
}

fn pact_slots(level: u8) -> HashMap<u8, u8> {
    // Pact magic: few slots, all at the same level.
    let (count, slot_level) = match level {
        1 => (1, 1),
        2 => (2, 1),
        3..=4 => (2, 2),
        5..=6 => (2, 3),
        7..=8 => (2, 4),
        9..=10 => (2, 5),
        11..=16 => (3, 5),
        17..=20 => (4, 5),
        _ => (0, 0),
    };
    if count > 0 {
        HashMap::from([(slot_level, count)])
    } else {
        HashMap::new()
    }
}

/// Cantrips known at a class sub-level.
pub fn cantrips_known(class: &str, level: u8) -> u8 {
    match normalize_key(class).as_str() {
        "wizard" | "cleric" | "druid" => match level {
            0 => 0,
            1..=3 => 3,
            4..=9 => 4,
            _ => 5,
        },
        "sorcerer" => match level {
            0 => 0,
            1..=3 => 4,
            4..=9 => 5,
            _ => 6,
        },
        "bard" | "warlock" => match level {
            0 => 0,
            1..=3 => 2,
            4..=9 => 3,
            _ => 4,
        },
        _ => 0,
    }
}

// Spells known tables (index is class level, index 0 unused)
const SORCERER_SPELLS_KNOWN: &[u8] = &[
    0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 12, 13, 13, 14, 14, 15, 15, 15, 15,
];

const BARD_SPELLS_KNOWN: &[u8] = &[
    0, 4, 5, 6, 7, 8, 9, 10, 11, 12, 14, 15, 15, 16, 18, 19, 19, 20, 22, 22, 22,
];

const RANGER_SPELLS_KNOWN: &[u8] = &[
    0, 0, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11,
];

const WARLOCK_SPELLS_KNOWN: &[u8] = &[
    0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 11, 11, 12, 12, 13, 13, 14, 14, 15, 15,
];

/// Spells known for classes that track a fixed count; None for prepared
/// casters, which have no hard limit.
pub fn spells_known(class: &str, level: u8) -> Option<u8> {
    let table = match normalize_key(class).as_str() {
        "sorcerer" => SORCERER_SPELLS_KNOWN,
        "bard" => BARD_SPELLS_KNOWN,
        "ranger" => RANGER_SPELLS_KNOWN,
        "warlock" => WARLOCK_SPELLS_KNOWN,
        _ => return None,
    };
    Some(
        table
            .get(level as usize)
            .copied()
            .unwrap_or_else(|| table[table.len() - 1]),
    )
}
