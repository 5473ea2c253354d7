//! Inventory item stacks.
//!
//! Inventories are flat lists of `{name, quantity}` pairs; that exact shape
//! is what the backend stores, so nothing richer lives here.

use serde::{Deserialize, Serialize};

/// A named item with a quantity, as stored in inventories and equipment
/// lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub name: String,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }

    /// Single item shorthand.
    pub fn one(name: impl Into<String>) -> Self {
        Self::new(name, 1)
    }
}

/// Currency pouch, tracked per coin type the way the backend stores it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub cp: i32,
    pub sp: i32,
    pub gp: i32,
}

impl Currency {
    pub fn gp(gp: i32) -> Self {
        Self { cp: 0, sp: 0, gp }
    }
}

/// Merge duplicate stacks by name, summing quantities. Order of first
/// appearance is preserved.
pub fn merge_stacks(items: Vec<ItemStack>) -> Vec<ItemStack> {
    let mut merged: Vec<ItemStack> = Vec::with_capacity(items.len());
    for item in items {
        match merged.iter_mut().find(|m| m.name == item.name) {
            Some(existing) => existing.quantity += item.quantity,
            None => merged.push(item),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let stack = ItemStack::new("Torch", 10);
        let json = serde_json::to_string(&stack).expect("serialize");
        assert_eq!(json, r#"{"name":"Torch","quantity":10}"#);
    }

    #[test]
    fn test_merge_stacks() {
        let merged = merge_stacks(vec![
            ItemStack::one("Torch"),
            ItemStack::new("Rations", 5),
            ItemStack::new("Torch", 9),
        ]);
        assert_eq!(
            merged,
            vec![ItemStack::new("Torch", 10), ItemStack::new("Rations", 5)]
        );
    }
}
