//! Order simulation engine.
//!
//! Drives each tracked order through grace period, photo review, shipping
//! and delivery on local timers, and hosts the checkout, cancellation and
//! refund flows around it.

pub mod builder;
pub mod engine;
pub mod handlers;
pub mod navigation;
pub mod state;
pub mod views;

pub use builder::{BuilderError, TrackerBuilder};
pub use engine::driver::{
	ActionOutcome, RunningSimulation, SimulationAction, SimulationDriver, SimulationError,
	SimulationHandle,
};
pub use engine::event_bus::EventBus;
pub use engine::{EngineError, TrackerEngine};
pub use navigation::{LoggingNavigator, Navigator, RecordingNavigator};
pub use state::SimulationParams;
