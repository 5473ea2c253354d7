//! Persisted record types.

pub mod character;
pub mod item;

pub use character::{Character, ClassLevel};
pub use item::{merge_stacks, Currency, ItemStack};
