//! Event types broadcast by the tracker engine.
//!
//! Events flow through an event bus so a front end can follow every order
//! without polling storage.

use crate::{RefundProgress, Route, SimulationStage, SimulationState};
use serde::{Deserialize, Serialize};

/// Main event type encompassing all tracker events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrackerEvent {
	/// Events from an order simulation.
	Simulation(SimulationEvent),
	/// Events from a refund tracker.
	Refund(RefundEvent),
	/// A navigation request handed to the front end.
	Navigation(Route),
}

/// Events emitted while an order simulation runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SimulationEvent {
	/// The state changed without leaving the current stage.
	Updated { order_id: String, state: SimulationState },
	/// The order moved to a new stage.
	StageChanged {
		order_id: String,
		from: SimulationStage,
		to: SimulationStage,
		state: SimulationState,
	},
	/// The customer rejected the packing photo.
	PhotoRejected { order_id: String },
	/// The simulation reached its terminal stage and stopped its timers.
	Finished { order_id: String },
}

impl SimulationEvent {
	pub fn order_id(&self) -> &str {
		match self {
			SimulationEvent::Updated { order_id, .. }
			| SimulationEvent::StageChanged { order_id, .. }
			| SimulationEvent::PhotoRejected { order_id }
			| SimulationEvent::Finished { order_id } => order_id,
		}
	}
}

/// Events emitted by the refund tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RefundEvent {
	/// The refund advanced along its timeline.
	Progressed {
		order_id: String,
		progress: RefundProgress,
	},
	/// Every refund stage is complete.
	Completed { order_id: String },
}
