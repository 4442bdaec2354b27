pub mod query;
pub mod sparse_hash;

pub use query::{ray_circle, Classification, RayHit, SpatialQuery};
pub use sparse_hash::SparseHashGrid;
