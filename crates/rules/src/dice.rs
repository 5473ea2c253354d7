//! Dice formula value object and parsing
//!
//! Supports formulas like "1d10", "5d4", "2d6+1". Used for rolled hit points
//! and rolled starting gold; players rolling physical dice submit the result
//! as a plain integer instead.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error when parsing a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    /// The formula string is empty
    #[error("Empty dice formula")]
    Empty,
    /// Invalid format - expected XdY or XdY+Z
    #[error("Invalid dice format: {0}")]
    InvalidFormat(String),
    /// Dice count must be at least 1
    #[error("Dice count must be at least 1")]
    InvalidDiceCount,
    /// Die size must be at least 2
    #[error("Die size must be at least 2")]
    InvalidDieSize,
}

/// A parsed dice formula like "5d4+2"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceFormula {
    /// Number of dice to roll (X in XdY)
    pub dice_count: u8,
    /// Size of each die (Y in XdY)
    pub die_size: u8,
    /// Modifier to add/subtract after rolling (+Z or -Z)
    pub modifier: i32,
}

impl DiceFormula {
    /// Create a new dice formula
    pub fn new(dice_count: u8, die_size: u8, modifier: i32) -> Result<Self, DiceParseError> {
        if dice_count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }
        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }
        Ok(Self {
            dice_count,
            die_size,
            modifier,
        })
    }

    /// Parse a dice formula string like "1d10", "5d4", "2d6+1", "d8"
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let input = input.trim().to_lowercase();
        if input.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let d_pos = input.find('d').ok_or_else(|| {
            DiceParseError::InvalidFormat(format!("Missing 'd' separator in '{}'", input))
        })?;

        let dice_count_str = &input[..d_pos];
        let dice_count: u8 = if dice_count_str.is_empty() {
            1 // "d8" means "1d8"
        } else {
            dice_count_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid dice count: '{}'", dice_count_str))
            })?
        };

        if dice_count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }

        let after_d = &input[d_pos + 1..];

        let (die_size_str, modifier) = if let Some(plus_pos) = after_d.find('+') {
            let mod_str = &after_d[plus_pos + 1..];
            let modifier: i32 = mod_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid modifier: '+{}'", mod_str))
            })?;
            (&after_d[..plus_pos], modifier)
        } else if let Some(minus_pos) = after_d.rfind('-') {
            if minus_pos == 0 {
                return Err(DiceParseError::InvalidFormat(format!(
                    "Invalid die size: '{}'",
                    after_d
                )));
            }
            let mod_str = &after_d[minus_pos + 1..];
            let modifier: i32 = mod_str.parse::<i32>().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid modifier: '-{}'", mod_str))
            })?;
            (&after_d[..minus_pos], -modifier)
        } else {
            (after_d, 0)
        };

        let die_size: u8 = die_size_str.parse().map_err(|_| {
            DiceParseError::InvalidFormat(format!("Invalid die size: '{}'", die_size_str))
        })?;

        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }

        Ok(Self {
            dice_count,
            die_size,
            modifier,
        })
    }

    /// Roll the dice and return the total
    pub fn roll(&self) -> i32 {
        let mut rng = rand::thread_rng();
        let dice_total: i32 = (0..self.dice_count)
            .map(|_| rng.gen_range(1..=self.die_size as i32))
            .sum();
        dice_total + self.modifier
    }

    /// Get the minimum possible roll
    pub fn min_roll(&self) -> i32 {
        self.dice_count as i32 + self.modifier
    }

    /// Get the maximum possible roll
    pub fn max_roll(&self) -> i32 {
        (self.dice_count as i32 * self.die_size as i32) + self.modifier
    }

    /// Average roll, rounded down (the "take the average" level-up option
    /// for a single hit die is `die_size / 2 + 1`)
    pub fn average(&self) -> i32 {
        let per_die = (self.die_size as i32 + 1) as f64 / 2.0;
        (per_die * self.dice_count as f64).floor() as i32 + self.modifier
    }

    /// Format as a display string (e.g., "5d4", "1d8+2")
    pub fn display(&self) -> String {
        if self.modifier == 0 {
            format!("{}d{}", self.dice_count, self.die_size)
        } else if self.modifier > 0 {
            format!("{}d{}+{}", self.dice_count, self.die_size, self.modifier)
        } else {
            format!("{}d{}{}", self.dice_count, self.die_size, self.modifier)
        }
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
