//! Damage kinds and their static side-effect table
//!
//! Read-only after initialization. The table decides whether a kind
//! dispatches a status effect and whether it splashes.

use crate::core::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageKind {
    Physical,
    Fire,
    Explosive,
    Toxic,
}

impl DamageKind {
    pub fn all() -> [DamageKind; 4] {
        [
            DamageKind::Physical,
            DamageKind::Fire,
            DamageKind::Explosive,
            DamageKind::Toxic,
        ]
    }

    fn index(self) -> usize {
        match self {
            DamageKind::Physical => 0,
            DamageKind::Fire => 1,
            DamageKind::Explosive => 2,
            DamageKind::Toxic => 3,
        }
    }
}

/// Status effects a damage kind can hand to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffect {
    Burning,
    Poisoned,
    Stunned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageKindDefinition {
    pub kind: DamageKind,
    /// Display color for damage numbers; carried for the UI, unused here
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub status_effect: Option<StatusEffect>,
    /// Present when hits of this kind splash onto nearby targets
    #[serde(default)]
    pub area_multiplier: Option<f32>,
}

impl DamageKindDefinition {
    pub fn plain(kind: DamageKind) -> Self {
        Self {
            kind,
            color: None,
            status_effect: None,
            area_multiplier: None,
        }
    }
}

/// Lookup table keyed by damage kind
#[derive(Debug, Clone)]
pub struct DamageKindTable {
    definitions: [DamageKindDefinition; 4],
}

impl Default for DamageKindTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl DamageKindTable {
    pub fn with_defaults() -> Self {
        Self {
            definitions: [
                DamageKindDefinition {
                    color: Some("#ffffff".into()),
                    ..DamageKindDefinition::plain(DamageKind::Physical)
                },
                DamageKindDefinition {
                    color: Some("#ff8c00".into()),
                    status_effect: Some(StatusEffect::Burning),
                    ..DamageKindDefinition::plain(DamageKind::Fire)
                },
                DamageKindDefinition {
                    color: Some("#ffd700".into()),
                    area_multiplier: Some(1.0),
                    ..DamageKindDefinition::plain(DamageKind::Explosive)
                },
                DamageKindDefinition {
                    color: Some("#7cfc00".into()),
                    status_effect: Some(StatusEffect::Poisoned),
                    ..DamageKindDefinition::plain(DamageKind::Toxic)
                },
            ],
        }
    }

    pub fn get(&self, kind: DamageKind) -> &DamageKindDefinition {
        &self.definitions[kind.index()]
    }

    /// Replace one kind's definition, used while building custom tables
    pub fn set(&mut self, definition: DamageKindDefinition) {
        let idx = definition.kind.index();
        self.definitions[idx] = definition;
    }

    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse a `[[kinds]]` table; kinds not listed are plain (no side effects)
    pub fn parse_toml(content: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct TomlKinds {
            kinds: Vec<DamageKindDefinition>,
        }

        let parsed: TomlKinds = toml::from_str(content)?;
        let mut table = Self {
            definitions: DamageKind::all().map(DamageKindDefinition::plain),
        };
        for definition in parsed.kinds {
            if let Some(multiplier) = definition.area_multiplier {
                if multiplier <= 0.0 {
                    return Err(SimError::Config(format!(
                        "{:?} area_multiplier must be positive, got {}",
                        definition.kind, multiplier
                    )));
                }
            }
            table.set(definition);
        }
        Ok(table)
    }
}
