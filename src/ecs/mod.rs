pub mod actors;
pub mod world;

pub use actors::{Actor, ActorStore, Obstacle};
pub use world::World;
