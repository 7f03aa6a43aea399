//! Core simulation engine: particle state, broad-phase grid, collision and
//! reaction resolution, and the append-only snapshot history.

pub mod collision;
pub mod grid;
pub mod particle;
pub mod sim;
pub mod species;
pub mod state;

pub use collision::{Contact, ReactionDirection, ReactionParams};
pub use grid::CellGrid;
pub use particle::Particle;
pub use sim::Simulation;
pub use species::Species;
pub use state::State;
