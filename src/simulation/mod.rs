pub mod behavior;
pub mod events;
pub mod scheduler;
pub mod tick;

pub use events::SimulationEvent;
pub use scheduler::TaskScheduler;
pub use tick::{fixed_tick, tick};
