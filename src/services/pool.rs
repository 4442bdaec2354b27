//! Pooled instantiation for projectiles and impact effects

use crate::core::types::Vec2;
use crate::services::assets::AssetHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PooledInstance {
    pub id: u32,
    pub prefab: AssetHandle,
}

pub trait ObjectPool {
    /// `orientation` is the facing angle in radians
    fn acquire(&mut self, prefab: AssetHandle, position: Vec2, orientation: f32) -> PooledInstance;
    fn release(&mut self, instance: PooledInstance);
}

/// Recycles instance ids per prefab
#[derive(Debug, Clone, Default)]
pub struct InstancePool {
    free: Vec<PooledInstance>,
    active: usize,
    next_id: u32,
}

impl InstancePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> usize {
        self.active
    }
}

impl ObjectPool for InstancePool {
    fn acquire(&mut self, prefab: AssetHandle, _position: Vec2, _orientation: f32) -> PooledInstance {
        self.active += 1;
        if let Some(idx) = self.free.iter().position(|i| i.prefab == prefab) {
            return self.free.swap_remove(idx);
        }
        let instance = PooledInstance {
            id: self.next_id,
            prefab,
        };
        self.next_id += 1;
        instance
    }

    fn release(&mut self, instance: PooledInstance) {
        self.active = self.active.saturating_sub(1);
        self.free.push(instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_released_instances_are_reused() {
        let mut pool = InstancePool::new();
        let rocket = AssetHandle(1);

        let first = pool.acquire(rocket, Vec2::ZERO, 0.0);
        pool.release(first);
        let second = pool.acquire(rocket, Vec2::ZERO, 0.0);

        assert_eq!(first, second);
        assert_eq!(pool.active(), 1);

        let other = pool.acquire(AssetHandle(2), Vec2::ZERO, 0.0);
        assert_ne!(other.id, second.id);
    }
}
