//! Holdout - survival combat and survivor labor simulation
//!
//! Weapons fire, reload and switch modes under timing gates; hits become
//! final damage with criticals, splash and status effects; survivors are
//! matched to tasks and driven by a small behavior state machine. Everything
//! runs single-threaded off `simulation::tick` and `simulation::fixed_tick`.

pub mod combat;
pub mod core;
pub mod ecs;
pub mod entity;
pub mod services;
pub mod simulation;
pub mod spatial;
