//! Asset / prefab loading by address

use ahash::{AHashMap, AHashSet};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetHandle(pub u32);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("no asset at address '{0}'")]
    NotFound(String),
}

/// Loads prefabs by address. Repeated loads of one address must return the
/// same handle; a failure must leave no trace in simulation state.
pub trait AssetProvider {
    fn load(&mut self, address: &str) -> Result<AssetHandle, AssetError>;
}

/// In-memory provider with a load cache
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    /// `None` means every address resolves
    known: Option<AHashSet<String>>,
    cache: AHashMap<String, AssetHandle>,
    next_handle: u32,
}

impl AssetRegistry {
    /// Only the listed addresses load
    pub fn with_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: Some(addresses.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl AssetProvider for AssetRegistry {
    fn load(&mut self, address: &str) -> Result<AssetHandle, AssetError> {
        if let Some(handle) = self.cache.get(address) {
            return Ok(*handle);
        }
        if let Some(known) = &self.known {
            if !known.contains(address) {
                return Err(AssetError::NotFound(address.to_string()));
            }
        }
        let handle = AssetHandle(self.next_handle);
        self.next_handle += 1;
        self.cache.insert(address.to_string(), handle);
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_loads_are_idempotent() {
        let mut registry = AssetRegistry::permissive();
        let a = registry.load("prefabs/rocket").unwrap();
        let b = registry.load("prefabs/rocket").unwrap();
        let c = registry.load("prefabs/grenade").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(registry.cached(), 2);
    }

    #[test]
    fn test_unknown_address_fails() {
        let mut registry = AssetRegistry::with_addresses(["prefabs/rocket"]);
        assert!(registry.load("prefabs/rocket").is_ok());
        assert_eq!(
            registry.load("prefabs/missing"),
            Err(AssetError::NotFound("prefabs/missing".into()))
        );
    }
}
