//! Aquarium simulation engine.
//!
//! A [`Simulation`] owns a [`Tank`] full of creatures and food. Each call to
//! [`Simulation::advance`] moves everything by one tick and returns the
//! rendered [`Frame`].

pub mod behavior;
pub mod compositor;
pub mod creature;
pub mod food;
pub mod frame;
pub mod simulation;
pub mod tank;

pub use behavior::{Behavior, StepOutcome};
pub use compositor::{mirror_glyph, Compositor};
pub use creature::{Creature, CreatureSnapshot};
pub use food::Food;
pub use frame::Frame;
pub use simulation::{CreatureSpec, Simulation};
pub use tank::Tank;
