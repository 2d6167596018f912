//! Simulation handler for a single order.
//!
//! Owns the in-memory state of one order, applies inputs through the pure
//! transition function and writes every change through to storage.

use crate::state::{is_valid_transition, transition, SimulationInput, SimulationParams, Transition};
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;
use tracker_storage::{StorageError, StorageService};
use tracker_types::{truncate_id, Route, SimulationStage, SimulationState, StorageKey};

/// One order's simulation state with write-through persistence.
pub struct OrderSimulation {
	order_id: String,
	state: SimulationState,
	params: SimulationParams,
	storage: Arc<StorageService>,
}

impl OrderSimulation {
	/// Restores the persisted state for `order_id`, or starts fresh.
	///
	/// Never fails: a missing, unreadable or inconsistent document yields
	/// a fresh state, which is persisted immediately.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn initialize(
		order_id: &str,
		storage: Arc<StorageService>,
		params: SimulationParams,
	) -> Self {
		let restored = match storage
			.retrieve::<SimulationState>(StorageKey::SimulationState, order_id)
			.await
		{
			Ok(state) if is_consistent(&state, &params) => {
				tracing::debug!(stage = %state.stage, "Restored simulation state");
				Some(state)
			},
			Ok(_) => {
				tracing::warn!("Persisted simulation state is inconsistent, starting fresh");
				None
			},
			Err(StorageError::NotFound) => {
				tracing::debug!("No persisted simulation state, starting fresh");
				None
			},
			Err(e) => {
				tracing::warn!(error = %e, "Failed to restore simulation state, starting fresh");
				None
			},
		};

		let mut simulation = Self {
			order_id: order_id.to_string(),
			state: params.initial_state(),
			params,
			storage,
		};

		match restored {
			Some(state) => simulation.state = state,
			None => simulation.persist().await,
		}
		simulation
	}

	pub fn order_id(&self) -> &str {
		&self.order_id
	}

	pub fn state(&self) -> &SimulationState {
		&self.state
	}

	pub fn params(&self) -> &SimulationParams {
		&self.params
	}

	pub fn stage(&self) -> SimulationStage {
		self.state.stage
	}

	/// Applies an input, persisting the new state when it changed.
	pub async fn apply(&mut self, input: SimulationInput) -> Transition {
		let result = transition(&self.state, input, &self.params);

		if !is_valid_transition(result.from, result.state.stage) {
			tracing::error!(
				order_id = %truncate_id(&self.order_id),
				from = %result.from,
				to = %result.state.stage,
				"Rejected invalid stage transition"
			);
			return Transition {
				state: self.state.clone(),
				from: self.state.stage,
				changed: false,
				delegation: None,
			};
		}

		if result.changed {
			self.state = result.state.clone();
			if result.stage_changed() {
				tracing::info!(
					order_id = %truncate_id(&self.order_id),
					from = %result.from,
					to = %result.state.stage,
					"Stage changed"
				);
			} else {
				tracing::debug!(
					order_id = %truncate_id(&self.order_id),
					stage = %self.state.stage,
					grace = self.state.grace_time_remaining,
					photo = self.state.photo_review_time_remaining,
					progress = self.state.delivery_progress,
					"Tick"
				);
			}
			self.persist().await;
		}

		result
	}

	/// Advances the timer of the current stage by one unit.
	pub async fn tick(&mut self) -> Transition {
		self.apply(SimulationInput::Tick { now: Utc::now() }).await
	}

	/// Approves the packing photo. No-op outside photo review.
	pub async fn accept_photo(&mut self) -> Transition {
		self.apply(SimulationInput::AcceptPhoto { now: Utc::now() }).await
	}

	/// Rejects the packing photo, returning the route of the cancellation flow.
	pub async fn reject_photo(&mut self) -> Option<Route> {
		self.delegate(SimulationInput::RejectPhoto).await
	}

	/// Requests an edit, returning the route of the edit flow.
	pub async fn edit_order(&mut self) -> Option<Route> {
		self.delegate(SimulationInput::EditOrder).await
	}

	/// Requests a cancellation, returning the route of the cancellation flow.
	pub async fn cancel_order(&mut self) -> Option<Route> {
		self.delegate(SimulationInput::CancelOrder).await
	}

	async fn delegate(&mut self, input: SimulationInput) -> Option<Route> {
		let result = self.apply(input).await;
		result
			.delegation
			.map(|delegation| delegation.route(&self.order_id))
	}

	/// Removes the persisted state of an order.
	pub async fn clear(storage: &StorageService, order_id: &str) -> Result<(), StorageError> {
		storage
			.remove(StorageKey::SimulationState, order_id)
			.await
	}

	async fn persist(&self) {
		if let Err(e) = self
			.storage
			.store(StorageKey::SimulationState, &self.order_id, &self.state)
			.await
		{
			tracing::warn!(
				order_id = %truncate_id(&self.order_id),
				error = %e,
				"Failed to persist simulation state"
			);
		}
	}
}

/// Checks that a restored document could have been produced by the state machine
/// running with `params`.
fn is_consistent(state: &SimulationState, params: &SimulationParams) -> bool {
	use SimulationStage::*;

	let progress = state.delivery_progress;
	if !progress.is_finite() || !(0.0..=100.0).contains(&progress) {
		return false;
	}
	if state.grace_time_remaining > params.grace_seconds
		|| state.photo_review_time_remaining > params.photo_review_seconds
	{
		return false;
	}
	// Partner and arrival are assigned together, on shipping.
	if state.delivery_partner.is_some() != state.estimated_arrival.is_some() {
		return false;
	}

	match state.stage {
		GracePeriod => state.grace_time_remaining > 0 && !state.has_partner() && progress == 0.0,
		PhotoReview => {
			state.grace_time_remaining == 0
				&& state.photo_review_time_remaining > 0
				&& !state.has_partner()
				&& progress == 0.0
		},
		Shipped => {
			state.grace_time_remaining == 0
				&& state.photo_review_time_remaining == 0
				&& state.has_partner()
				&& progress < 100.0
		},
		Delivered => {
			state.grace_time_remaining == 0
				&& state.photo_review_time_remaining == 0
				&& state.has_partner()
				&& progress == 100.0
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use tracker_storage::implementations::memory::MemoryStorage;
	use tracker_storage::StorageInterface;
	use tracker_types::{mock_delivery_partner, ConfigSchema};

	fn service(memory: &MemoryStorage) -> Arc<StorageService> {
		Arc::new(StorageService::new(Box::new(memory.clone())))
	}

	async fn raw(memory: &MemoryStorage, order_id: &str) -> serde_json::Value {
		let bytes = memory
			.get_bytes(&StorageKey::SimulationState.key_for(order_id))
			.await
			.unwrap();
		serde_json::from_slice(&bytes).unwrap()
	}

	#[tokio::test]
	async fn test_fresh_state_is_persisted() {
		let memory = MemoryStorage::default();
		let simulation =
			OrderSimulation::initialize("ORD-2026-1", service(&memory), SimulationParams::default())
				.await;

		assert_eq!(simulation.stage(), SimulationStage::GracePeriod);
		assert_eq!(simulation.state().grace_time_remaining, 30);

		let stored = raw(&memory, "ORD-2026-1").await;
		assert_eq!(stored["stage"], "GRACE_PERIOD");
		assert_eq!(stored["graceTimeRemaining"], 30);
		assert_eq!(stored["deliveryPartner"], serde_json::Value::Null);
	}

	#[tokio::test]
	async fn test_restores_persisted_state() {
		let memory = MemoryStorage::default();
		let storage = service(&memory);

		let mut simulation =
			OrderSimulation::initialize("A", storage.clone(), SimulationParams::default()).await;
		for _ in 0..5 {
			simulation.tick().await;
		}
		drop(simulation);

		let restored = OrderSimulation::initialize("A", storage, SimulationParams::default()).await;
		assert_eq!(restored.state().grace_time_remaining, 25);
	}

	#[tokio::test]
	async fn test_restores_from_file_storage_after_restart() {
		use tracker_storage::implementations::file::FileStorage;

		let dir = tempfile::TempDir::new().unwrap();
		let open = || {
			Arc::new(StorageService::new(Box::new(FileStorage::new(
				dir.path().to_path_buf(),
			))))
		};

		let mut simulation =
			OrderSimulation::initialize("ORD-2026-8898", open(), SimulationParams::default()).await;
		for _ in 0..30 {
			simulation.tick().await;
		}
		simulation.accept_photo().await;
		let shipped = simulation.state().clone();
		drop(simulation);

		let restored =
			OrderSimulation::initialize("ORD-2026-8898", open(), SimulationParams::default()).await;
		assert_eq!(restored.state(), &shipped);
	}

	#[tokio::test]
	async fn test_corrupt_state_falls_back_to_default() {
		let memory = MemoryStorage::default();
		memory
			.set_bytes(
				&StorageKey::SimulationState.key_for("B"),
				b"{not json".to_vec(),
			)
			.await
			.unwrap();

		let simulation =
			OrderSimulation::initialize("B", service(&memory), SimulationParams::default()).await;
		assert_eq!(simulation.state(), &SimulationState::default());
		assert_eq!(raw(&memory, "B").await["stage"], "GRACE_PERIOD");
	}

	#[tokio::test]
	async fn test_inconsistent_state_falls_back_to_default() {
		let memory = MemoryStorage::default();
		let shipped_without_partner = SimulationState {
			stage: SimulationStage::Shipped,
			..SimulationState::default()
		};
		service(&memory)
			.store(StorageKey::SimulationState, "C", &shipped_without_partner)
			.await
			.unwrap();

		let simulation =
			OrderSimulation::initialize("C", service(&memory), SimulationParams::default()).await;
		assert_eq!(simulation.stage(), SimulationStage::GracePeriod);
	}

	async fn restore(order_id: &str, stored: &SimulationState) -> SimulationState {
		let memory = MemoryStorage::default();
		service(&memory)
			.store(StorageKey::SimulationState, order_id, stored)
			.await
			.unwrap();
		OrderSimulation::initialize(order_id, service(&memory), SimulationParams::default())
			.await
			.state()
			.clone()
	}

	#[tokio::test]
	async fn test_out_of_range_timers_fall_back_to_default() {
		let long_grace = SimulationState {
			grace_time_remaining: 100_000,
			..SimulationState::default()
		};
		assert_eq!(restore("H", &long_grace).await, SimulationState::default());

		let long_review = SimulationState {
			stage: SimulationStage::PhotoReview,
			grace_time_remaining: 0,
			photo_review_time_remaining: 500,
			..SimulationState::default()
		};
		assert_eq!(restore("H", &long_review).await, SimulationState::default());
	}

	#[tokio::test]
	async fn test_partner_before_shipping_falls_back_to_default() {
		let forged = SimulationState {
			delivery_partner: Some(mock_delivery_partner()),
			estimated_arrival: Some(Utc::now()),
			..SimulationState::default()
		};
		let restored = restore("I", &forged).await;
		assert_eq!(restored, SimulationState::default());
		assert!(!restored.has_partner());

		let in_review = SimulationState {
			stage: SimulationStage::PhotoReview,
			grace_time_remaining: 0,
			..forged
		};
		assert_eq!(restore("I", &in_review).await, SimulationState::default());
	}

	#[tokio::test]
	async fn test_unfinished_delivery_falls_back_to_default() {
		let delivered = SimulationState {
			stage: SimulationStage::Delivered,
			grace_time_remaining: 0,
			photo_review_time_remaining: 0,
			delivery_progress: 40.0,
			delivery_partner: Some(mock_delivery_partner()),
			estimated_arrival: Some(Utc::now()),
		};
		assert_eq!(restore("J", &delivered).await, SimulationState::default());

		let complete = SimulationState {
			delivery_progress: 100.0,
			..delivered
		};
		assert_eq!(restore("J", &complete).await, complete);
	}

	#[tokio::test]
	async fn test_unknown_order_starts_fresh_next_to_saved_one() {
		let memory = MemoryStorage::default();
		let storage = service(&memory);

		let mut saved =
			OrderSimulation::initialize("X", storage.clone(), SimulationParams::default()).await;
		for _ in 0..7 {
			saved.tick().await;
		}
		drop(saved);

		let other =
			OrderSimulation::initialize("Y", storage.clone(), SimulationParams::default()).await;
		assert_eq!(other.state(), &SimulationState::default());

		let restored = OrderSimulation::initialize("X", storage, SimulationParams::default()).await;
		assert_eq!(restored.state().grace_time_remaining, 23);
	}

	#[tokio::test]
	async fn test_reject_photo_delegates_without_mutation() {
		let memory = MemoryStorage::default();
		let mut simulation =
			OrderSimulation::initialize("D", service(&memory), SimulationParams::default()).await;

		assert_eq!(simulation.reject_photo().await, None);
		assert_eq!(
			simulation.cancel_order().await,
			Some(Route::CancelOrder {
				order_id: "D".into()
			})
		);

		for _ in 0..30 {
			simulation.tick().await;
		}
		let before = simulation.state().clone();
		assert_eq!(
			simulation.reject_photo().await,
			Some(Route::CancelOrder {
				order_id: "D".into()
			})
		);
		assert_eq!(simulation.edit_order().await, None);
		assert_eq!(simulation.state(), &before);
	}

	#[tokio::test]
	async fn test_accept_persists_partner() {
		let memory = MemoryStorage::default();
		let mut simulation =
			OrderSimulation::initialize("E", service(&memory), SimulationParams::default()).await;
		for _ in 0..30 {
			simulation.tick().await;
		}
		assert!(simulation.accept_photo().await.stage_changed());

		let stored = raw(&memory, "E").await;
		assert_eq!(stored["stage"], "SHIPPED");
		assert_eq!(stored["photoReviewTimeRemaining"], 0);
		assert_eq!(stored["deliveryPartner"]["name"], "Rajesh Kumar");
		assert!(stored["estimatedArrival"].is_string());
	}

	#[tokio::test]
	async fn test_clear_removes_state() {
		let memory = MemoryStorage::default();
		let storage = service(&memory);
		OrderSimulation::initialize("F", storage.clone(), SimulationParams::default()).await;
		assert!(storage.exists(StorageKey::SimulationState, "F").await.unwrap());

		OrderSimulation::clear(&storage, "F").await.unwrap();
		assert!(!storage.exists(StorageKey::SimulationState, "F").await.unwrap());
	}

	struct FailingStorage;

	#[async_trait]
	impl StorageInterface for FailingStorage {
		async fn get_bytes(&self, _key: &str) -> Result<Vec<u8>, StorageError> {
			Err(StorageError::Backend("offline".into()))
		}

		async fn set_bytes(&self, _key: &str, _value: Vec<u8>) -> Result<(), StorageError> {
			Err(StorageError::Backend("offline".into()))
		}

		async fn delete(&self, _key: &str) -> Result<(), StorageError> {
			Err(StorageError::Backend("offline".into()))
		}

		async fn exists(&self, _key: &str) -> Result<bool, StorageError> {
			Err(StorageError::Backend("offline".into()))
		}

		async fn keys_with_prefix(&self, _prefix: &str) -> Result<Vec<String>, StorageError> {
			Err(StorageError::Backend("offline".into()))
		}

		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(tracker_storage::implementations::memory::MemoryStorageSchema)
		}
	}

	#[tokio::test]
	async fn test_storage_failures_are_swallowed() {
		let storage = Arc::new(StorageService::new(Box::new(FailingStorage)));
		let mut simulation =
			OrderSimulation::initialize("G", storage, SimulationParams::default()).await;

		simulation.tick().await;
		assert_eq!(simulation.state().grace_time_remaining, 29);
	}
}
