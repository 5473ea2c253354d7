//! XP thresholds per character level.

/// XP required to reach each level. Index is level - 1.
const XP_THRESHOLDS: [i32; 20] = [
    0,      // Level 1
    300,    // Level 2
    900,    // Level 3
    2700,   // Level 4
    6500,   // Level 5
    14000,  // Level 6
    23000,  // Level 7
    34000,  // Level 8
    48000,  // Level 9
    64000,  // Level 10
    85000,  // Level 11
    100000, // Level 12
    120000, // Level 13
    140000, // Level 14
    165000, // Level 15
    195000, // Level 16
    225000, // Level 17
    265000, // Level 18
    305000, // Level 19
    355000, // Level 20
];

/// XP required for a given level.
pub fn xp_for_level(level: u8) -> i32 {
    if level == 0 || level > 20 {
        return 0;
    }
    XP_THRESHOLDS[(level - 1) as usize]
}

/// XP required for the next level (clamped at the level 20 threshold).
pub fn xp_for_next_level(current_level: u8) -> i32 {
    if current_level >= 20 {
        return XP_THRESHOLDS[19];
    }
    XP_THRESHOLDS[current_level as usize]
}

/// Level implied by an XP total.
pub fn level_from_xp(xp: i32) -> u8 {
    for (i, &threshold) in XP_THRESHOLDS.iter().enumerate().rev() {
        if xp >= threshold {
            return (i + 1) as u8;
        }
    }
    1
}
