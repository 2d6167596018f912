//! Order simulation state machine.
//!
//! Orders move through GracePeriod -> PhotoReview -> Shipped -> Delivered.
//! Each stage except the last has one periodic timer; a tick advances the
//! timer of the current stage. Photo acceptance short-circuits the review
//! timer. Rejecting the photo, editing and cancelling are handed off to
//! other flows and never change the state here.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracker_config::SimulationConfig;
use tracker_types::{mock_delivery_partner, Route, SimulationStage, SimulationState};

/// Slack used when deciding whether accumulated progress reached 100.
///
/// Repeated float increments such as `100 / 60 * 2` can land a hair under
/// 100 after the last step.
const PROGRESS_EPSILON: f64 = 1e-6;

/// Timings that parameterize the state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
	pub grace_seconds: u32,
	pub photo_review_seconds: u32,
	pub delivery_duration_seconds: u32,
	pub delivery_tick_seconds: u32,
	pub estimated_arrival: chrono::Duration,
}

impl SimulationParams {
	/// Fresh state for a newly tracked order.
	pub fn initial_state(&self) -> SimulationState {
		SimulationState::new(self.grace_seconds, self.photo_review_seconds)
	}

	/// Progress added by one delivery tick, in percent.
	pub fn progress_increment(&self) -> f64 {
		(100.0 / f64::from(self.delivery_duration_seconds)) * f64::from(self.delivery_tick_seconds)
	}

	/// Period of the timer active in `stage`, or `None` when the stage has no timer.
	pub fn tick_period(&self, stage: SimulationStage) -> Option<Duration> {
		match stage {
			SimulationStage::GracePeriod | SimulationStage::PhotoReview => {
				Some(Duration::from_secs(1))
			},
			SimulationStage::Shipped => {
				Some(Duration::from_secs(u64::from(self.delivery_tick_seconds)))
			},
			SimulationStage::Delivered => None,
		}
	}
}

impl From<&SimulationConfig> for SimulationParams {
	fn from(config: &SimulationConfig) -> Self {
		Self {
			grace_seconds: config.grace_period_seconds,
			photo_review_seconds: config.photo_review_seconds,
			delivery_duration_seconds: config.delivery_duration_seconds,
			delivery_tick_seconds: config.delivery_tick_seconds,
			estimated_arrival: chrono::Duration::minutes(config.estimated_arrival_minutes),
		}
	}
}

impl Default for SimulationParams {
	fn default() -> Self {
		Self::from(&SimulationConfig::default())
	}
}

/// Something that can happen to a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationInput {
	/// The active timer fired.
	Tick { now: DateTime<Utc> },
	/// The customer approved the packing photo.
	AcceptPhoto { now: DateTime<Utc> },
	/// The customer rejected the packing photo.
	RejectPhoto,
	/// The customer asked to edit the order.
	EditOrder,
	/// The customer asked to cancel the order.
	CancelOrder,
}

/// A flow outside the simulation that should take over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delegation {
	/// Rejected photo; handled by the cancellation flow.
	PhotoRejected,
	EditOrder,
	CancelOrder,
}

impl Delegation {
	/// Route the front end should open for this hand-off.
	pub fn route(&self, order_id: &str) -> Route {
		let order_id = order_id.to_string();
		match self {
			Delegation::PhotoRejected | Delegation::CancelOrder => Route::CancelOrder { order_id },
			Delegation::EditOrder => Route::EditOrder { order_id },
		}
	}
}

/// Result of applying one input.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
	/// State after the input. Equal to the previous state when nothing changed.
	pub state: SimulationState,
	/// Stage before the input.
	pub from: SimulationStage,
	/// Whether the state changed.
	pub changed: bool,
	/// Hand-off requested by the input, if any.
	pub delegation: Option<Delegation>,
}

impl Transition {
	fn unchanged(state: &SimulationState) -> Self {
		Self {
			state: state.clone(),
			from: state.stage,
			changed: false,
			delegation: None,
		}
	}

	fn delegate(state: &SimulationState, delegation: Delegation) -> Self {
		Self {
			delegation: Some(delegation),
			..Self::unchanged(state)
		}
	}

	fn updated(previous: &SimulationState, state: SimulationState) -> Self {
		Self {
			changed: state != *previous,
			from: previous.stage,
			state,
			delegation: None,
		}
	}

	/// Whether the input moved the order to another stage.
	pub fn stage_changed(&self) -> bool {
		self.from != self.state.stage
	}
}

/// Applies `input` to `state`.
///
/// Inputs that make no sense in the current stage are no-ops.
pub fn transition(
	state: &SimulationState,
	input: SimulationInput,
	params: &SimulationParams,
) -> Transition {
	use SimulationInput::*;
	use SimulationStage::*;

	match (state.stage, input) {
		(GracePeriod, Tick { .. }) => {
			let remaining = state.grace_time_remaining.saturating_sub(1);
			let next = if remaining == 0 {
				SimulationState {
					stage: PhotoReview,
					grace_time_remaining: 0,
					photo_review_time_remaining: params.photo_review_seconds,
					..state.clone()
				}
			} else {
				SimulationState {
					grace_time_remaining: remaining,
					..state.clone()
				}
			};
			Transition::updated(state, next)
		},
		(PhotoReview, Tick { now }) => {
			let remaining = state.photo_review_time_remaining.saturating_sub(1);
			let next = if remaining == 0 {
				ship(state, now, params)
			} else {
				SimulationState {
					photo_review_time_remaining: remaining,
					..state.clone()
				}
			};
			Transition::updated(state, next)
		},
		(PhotoReview, AcceptPhoto { now }) => Transition::updated(state, ship(state, now, params)),
		(PhotoReview, RejectPhoto) => Transition::delegate(state, Delegation::PhotoRejected),
		(Shipped, Tick { .. }) => {
			let progress = (state.delivery_progress + params.progress_increment()).min(100.0);
			let next = if progress >= 100.0 - PROGRESS_EPSILON {
				SimulationState {
					stage: Delivered,
					delivery_progress: 100.0,
					..state.clone()
				}
			} else {
				SimulationState {
					delivery_progress: progress,
					..state.clone()
				}
			};
			Transition::updated(state, next)
		},
		(GracePeriod, EditOrder) => Transition::delegate(state, Delegation::EditOrder),
		(GracePeriod, CancelOrder) => Transition::delegate(state, Delegation::CancelOrder),
		_ => Transition::unchanged(state),
	}
}

/// Moves a reviewed order to Shipped, assigning the partner and arrival together.
fn ship(state: &SimulationState, now: DateTime<Utc>, params: &SimulationParams) -> SimulationState {
	let (delivery_partner, estimated_arrival) = if state.has_partner() {
		(state.delivery_partner.clone(), state.estimated_arrival)
	} else {
		(
			Some(mock_delivery_partner()),
			Some(now + params.estimated_arrival),
		)
	};

	SimulationState {
		stage: SimulationStage::Shipped,
		photo_review_time_remaining: 0,
		delivery_partner,
		estimated_arrival,
		..state.clone()
	}
}

/// Checks if moving from one stage to another is allowed.
///
/// Staying put is always allowed; otherwise only the next stage is.
pub fn is_valid_transition(from: SimulationStage, to: SimulationStage) -> bool {
	use SimulationStage::*;

	static TRANSITIONS: Lazy<HashMap<SimulationStage, HashSet<SimulationStage>>> =
		Lazy::new(|| {
			HashMap::from([
				(GracePeriod, HashSet::from([GracePeriod, PhotoReview])),
				(PhotoReview, HashSet::from([PhotoReview, Shipped])),
				(Shipped, HashSet::from([Shipped, Delivered])),
				(Delivered, HashSet::from([Delivered])), // terminal
			])
		});

	TRANSITIONS
		.get(&from)
		.is_some_and(|allowed| allowed.contains(&to))
}
