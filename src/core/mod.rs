pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Deferred, SimClock, TimerId, TimerQueue};
pub use config::SimulationConfig;
pub use error::{Conflict, Result, Shortage, SimError};
