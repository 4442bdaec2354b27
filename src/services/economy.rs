//! Resource economy consulted for task rewards

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

pub trait ResourceEconomy {
    /// Returns the amount actually added (storage may be capped)
    fn add_resource(&mut self, id: &str, amount: u32) -> u32;

    /// All-or-nothing withdrawal
    fn use_resource(&mut self, id: &str, amount: u32) -> bool;

    fn amount(&self, id: &str) -> u32;
}

/// Capped per-resource storage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stockpile {
    /// Resources stored: id -> (current, capacity)
    resources: AHashMap<String, (u32, u32)>,
}

impl Stockpile {
    const DEFAULT_CAPACITY: u32 = 500;

    pub fn new() -> Self {
        Self::default()
    }

    /// Set capacity for a resource
    pub fn set_capacity(&mut self, id: &str, capacity: u32) {
        let entry = self.resources.entry(id.to_string()).or_insert((0, 0));
        entry.1 = capacity;
        entry.0 = entry.0.min(capacity);
    }

    pub fn capacity(&self, id: &str) -> u32 {
        self.resources
            .get(id)
            .map(|(_, cap)| *cap)
            .unwrap_or(Self::DEFAULT_CAPACITY)
    }
}

impl ResourceEconomy for Stockpile {
    fn add_resource(&mut self, id: &str, amount: u32) -> u32 {
        let entry = self
            .resources
            .entry(id.to_string())
            .or_insert((0, Self::DEFAULT_CAPACITY));
        let space = entry.1.saturating_sub(entry.0);
        let added = amount.min(space);
        entry.0 += added;
        added
    }

    fn use_resource(&mut self, id: &str, amount: u32) -> bool {
        match self.resources.get_mut(id) {
            Some(entry) if entry.0 >= amount => {
                entry.0 -= amount;
                true
            }
            _ => amount == 0,
        }
    }

    fn amount(&self, id: &str) -> u32 {
        self.resources.get(id).map(|(c, _)| *c).unwrap_or(0)
    }
}
