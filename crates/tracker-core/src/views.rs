//! Read-only views derived from a simulation state.
//!
//! Everything here is a pure function of the state, so front ends can
//! recompute views on every update without touching the engine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracker_types::{Location, SimulationStage, SimulationState};

/// The photo review countdown turns urgent below this many seconds.
pub const PHOTO_REVIEW_URGENT_BELOW: u32 = 5;

/// A countdown ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Countdown {
	pub remaining: u32,
	pub total: u32,
	/// Share of the total still remaining, in percent.
	pub percent: f64,
	pub urgent: bool,
}

impl Countdown {
	fn new(remaining: u32, total: u32, urgent: bool) -> Self {
		let percent = if total == 0 {
			0.0
		} else {
			(f64::from(remaining) / f64::from(total) * 100.0).clamp(0.0, 100.0)
		};
		Self {
			remaining,
			total,
			percent,
			urgent,
		}
	}
}

/// Grace period countdown, only while the order is in its grace period.
pub fn grace_countdown(
	state: &SimulationState,
	total: u32,
	urgent_threshold: u32,
) -> Option<Countdown> {
	(state.stage == SimulationStage::GracePeriod).then(|| {
		Countdown::new(
			state.grace_time_remaining,
			total,
			state.grace_time_remaining <= urgent_threshold,
		)
	})
}

/// Photo review countdown, only while the photo awaits approval.
pub fn photo_review_countdown(state: &SimulationState, total: u32) -> Option<Countdown> {
	(state.stage == SimulationStage::PhotoReview).then(|| {
		Countdown::new(
			state.photo_review_time_remaining,
			total,
			state.photo_review_time_remaining < PHOTO_REVIEW_URGENT_BELOW,
		)
	})
}

/// One row of the order timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineStep {
	pub id: &'static str,
	pub label: &'static str,
	pub description: String,
	pub complete: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub estimated_arrival: Option<DateTime<Utc>>,
}

/// Builds the four timeline rows for the current stage.
pub fn timeline(state: &SimulationState, seller_name: &str) -> Vec<TimelineStep> {
	let shipped = state.stage >= SimulationStage::Shipped;

	vec![
		TimelineStep {
			id: "placed",
			label: "Order Placed",
			description: format!("Order placed at {}", seller_name),
			complete: true,
			estimated_arrival: None,
		},
		TimelineStep {
			id: "shipped",
			label: "Order Shipped",
			description: "Order shipped from warehouse".to_string(),
			complete: shipped,
			estimated_arrival: None,
		},
		TimelineStep {
			id: "out_for_delivery",
			label: "Out for Delivery",
			description: "Delivery partner assigned".to_string(),
			complete: shipped,
			estimated_arrival: state.estimated_arrival,
		},
		TimelineStep {
			id: "delivered",
			label: "Delivered",
			description: "Order delivered successfully".to_string(),
			complete: state.stage == SimulationStage::Delivered,
			estimated_arrival: None,
		},
	]
}

/// Courier position on the straight line from seller to customer.
pub fn courier_position(progress: f64, seller: &Location, customer: &Location) -> (f64, f64) {
	let t = if progress.is_finite() {
		progress.clamp(0.0, 100.0) / 100.0
	} else {
		0.0
	};
	(
		seller.lat + (customer.lat - seller.lat) * t,
		seller.lng + (customer.lng - seller.lng) * t,
	)
}

/// Customer actions offered on the tracking screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AvailableActions {
	pub edit: bool,
	pub cancel: bool,
	pub accept_photo: bool,
	pub reject_photo: bool,
}

pub fn available_actions(stage: SimulationStage) -> AvailableActions {
	match stage {
		SimulationStage::GracePeriod => AvailableActions {
			edit: true,
			cancel: true,
			..Default::default()
		},
		SimulationStage::PhotoReview => AvailableActions {
			accept_photo: true,
			reject_photo: true,
			..Default::default()
		},
		SimulationStage::Shipped | SimulationStage::Delivered => AvailableActions::default(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tracker_types::{MOCK_CUSTOMER_LOCATION, MOCK_SELLER_LOCATION};

	#[test]
	fn test_grace_countdown() {
		let mut state = SimulationState::default();
		let countdown = grace_countdown(&state, 30, 10).unwrap();
		assert_eq!(countdown.percent, 100.0);
		assert!(!countdown.urgent);

		state.grace_time_remaining = 10;
		let countdown = grace_countdown(&state, 30, 10).unwrap();
		assert!((countdown.percent - 33.333).abs() < 0.01);
		assert!(countdown.urgent);

		state.stage = SimulationStage::PhotoReview;
		assert!(grace_countdown(&state, 30, 10).is_none());
		assert!(!photo_review_countdown(&state, 20).unwrap().urgent);

		state.photo_review_time_remaining = 4;
		assert!(photo_review_countdown(&state, 20).unwrap().urgent);
	}

	#[test]
	fn test_timeline_follows_stage() {
		let mut state = SimulationState::default();
		let complete = |state: &SimulationState| -> Vec<bool> {
			timeline(state, "Rahul Shop")
				.iter()
				.map(|s| s.complete)
				.collect()
		};

		assert_eq!(complete(&state), vec![true, false, false, false]);
		assert_eq!(timeline(&state, "Rahul Shop")[0].description, "Order placed at Rahul Shop");

		state.stage = SimulationStage::Shipped;
		assert_eq!(complete(&state), vec![true, true, true, false]);

		state.stage = SimulationStage::Delivered;
		assert_eq!(complete(&state), vec![true; 4]);
	}

	#[test]
	fn test_courier_position_interpolates() {
		let start = courier_position(0.0, &MOCK_SELLER_LOCATION, &MOCK_CUSTOMER_LOCATION);
		assert_eq!(start, (MOCK_SELLER_LOCATION.lat, MOCK_SELLER_LOCATION.lng));

		let end = courier_position(100.0, &MOCK_SELLER_LOCATION, &MOCK_CUSTOMER_LOCATION);
		assert!((end.0 - MOCK_CUSTOMER_LOCATION.lat).abs() < 1e-9);
		assert!((end.1 - MOCK_CUSTOMER_LOCATION.lng).abs() < 1e-9);

		let (lat, lng) = courier_position(50.0, &MOCK_SELLER_LOCATION, &MOCK_CUSTOMER_LOCATION);
		assert!((lat - 28.5747).abs() < 1e-9);
		assert!((lng - 77.3).abs() < 1e-9);
	}

	#[test]
	fn test_available_actions() {
		let grace = available_actions(SimulationStage::GracePeriod);
		assert!(grace.edit && grace.cancel && !grace.accept_photo);

		let review = available_actions(SimulationStage::PhotoReview);
		assert!(review.accept_photo && review.reject_photo && !review.cancel);

		assert_eq!(
			available_actions(SimulationStage::Delivered),
			AvailableActions::default()
		);
	}
}
