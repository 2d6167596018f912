//! State management for order simulations.
//!
//! Transition logic lives here as a pure function so it can be tested
//! without timers or storage. The engine feeds it inputs and decides which
//! timer to arm from the resulting stage.

pub mod transition;

pub use transition::{
	is_valid_transition, transition, Delegation, SimulationInput, SimulationParams, Transition,
};
