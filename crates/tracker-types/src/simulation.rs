//! Order simulation state.
//!
//! The state document persisted per order. Field names follow the JSON
//! layout stored under `order_simulation_state_<orderId>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default length of the grace period in seconds.
pub const GRACE_PERIOD_DURATION: u32 = 30;
/// Default length of the photo review window in seconds.
pub const PHOTO_REVIEW_DURATION: u32 = 20;
/// Default time for a full delivery run in seconds.
pub const DELIVERY_DURATION: u32 = 60;
/// Default interval between delivery progress updates in seconds.
pub const DELIVERY_TICK_SECONDS: u32 = 2;
/// Default offset of the estimated arrival from the moment a partner is assigned.
pub const ESTIMATED_ARRIVAL_MINUTES: i64 = 30;

/// Discrete phase of the order lifecycle.
///
/// Variants are declared in lifecycle order, so the derived `Ord` matches
/// forward progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationStage {
	/// The order may still be edited or cancelled.
	GracePeriod,
	/// The packing photo awaits approval.
	PhotoReview,
	/// A delivery partner is on the way.
	Shipped,
	/// Terminal.
	Delivered,
}

impl SimulationStage {
	/// Returns the wire name of the stage.
	pub fn as_str(&self) -> &'static str {
		match self {
			SimulationStage::GracePeriod => "GRACE_PERIOD",
			SimulationStage::PhotoReview => "PHOTO_REVIEW",
			SimulationStage::Shipped => "SHIPPED",
			SimulationStage::Delivered => "DELIVERED",
		}
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, SimulationStage::Delivered)
	}
}

impl fmt::Display for SimulationStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Identity of the partner assigned to deliver an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPartner {
	pub name: String,
	pub phone: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub photo: Option<String>,
}

/// Snapshot of a single order's simulated lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
	/// Current stage.
	pub stage: SimulationStage,
	/// Seconds left in the grace period. Zero once the grace period is over.
	pub grace_time_remaining: u32,
	/// Seconds left in the photo review window. Zero once shipped.
	pub photo_review_time_remaining: u32,
	/// Delivery progress as a percentage in `[0, 100]`.
	pub delivery_progress: f64,
	/// Assigned when the photo is accepted, together with `estimated_arrival`.
	pub delivery_partner: Option<DeliveryPartner>,
	pub estimated_arrival: Option<DateTime<Utc>>,
}

impl SimulationState {
	/// Creates a fresh state at the start of the grace period.
	pub fn new(grace_seconds: u32, photo_review_seconds: u32) -> Self {
		Self {
			stage: SimulationStage::GracePeriod,
			grace_time_remaining: grace_seconds,
			photo_review_time_remaining: photo_review_seconds,
			delivery_progress: 0.0,
			delivery_partner: None,
			estimated_arrival: None,
		}
	}

	/// Returns true once a delivery partner has been assigned.
	pub fn has_partner(&self) -> bool {
		self.delivery_partner.is_some() && self.estimated_arrival.is_some()
	}
}

impl Default for SimulationState {
	fn default() -> Self {
		Self::new(GRACE_PERIOD_DURATION, PHOTO_REVIEW_DURATION)
	}
}
