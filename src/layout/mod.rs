//! Force-directed layout of an ego-network with a pinned anchor.

mod engine;
pub mod forces;
mod simulation;

pub use engine::{LayoutEngine, LayoutFrame, LayoutGeneration};
pub use simulation::Simulation;
