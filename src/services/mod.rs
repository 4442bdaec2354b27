//! External collaborators
//!
//! The simulation core talks to assets, pooling, the resource economy and
//! audio/animation only through these traits. Each comes with a small
//! in-memory implementation used by the headless runner and the tests.

pub mod assets;
pub mod economy;
pub mod feedback;
pub mod pool;

pub use assets::{AssetError, AssetHandle, AssetProvider, AssetRegistry};
pub use economy::{ResourceEconomy, Stockpile};
pub use feedback::{FeedbackSink, TracingFeedback};
pub use pool::{InstancePool, ObjectPool, PooledInstance};

/// Bundle of collaborators handed to `World::new`
pub struct Services {
    pub assets: Box<dyn AssetProvider>,
    pub pool: Box<dyn ObjectPool>,
    pub economy: Box<dyn ResourceEconomy>,
    pub feedback: Box<dyn FeedbackSink>,
}

impl Services {
    pub fn new(
        assets: Box<dyn AssetProvider>,
        pool: Box<dyn ObjectPool>,
        economy: Box<dyn ResourceEconomy>,
        feedback: Box<dyn FeedbackSink>,
    ) -> Self {
        Self {
            assets,
            pool,
            economy,
            feedback,
        }
    }
}

impl Default for Services {
    /// Permissive in-memory collaborators: every asset address resolves
    fn default() -> Self {
        Self {
            assets: Box::new(AssetRegistry::permissive()),
            pool: Box::new(InstancePool::new()),
            economy: Box::new(Stockpile::new()),
            feedback: Box::new(TracingFeedback),
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
