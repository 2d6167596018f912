//! Tracker engine that owns every running order simulation.
//!
//! The engine keeps at most one simulation per order id, routes user
//! actions to it and forwards hand-offs to the navigator. Checkout,
//! cancellation and refund flows are exposed here as well so a front end
//! only talks to one type.

pub mod driver;
pub mod event_bus;
pub mod lifecycle;

use crate::handlers::{
	CancellationError, CancellationHandler, CheckoutError, CheckoutService, OrderSimulation,
	RefundTracker, RunningRefund,
};
use crate::navigation::Navigator;
use crate::state::SimulationParams;
use driver::{RunningSimulation, SimulationDriver, SimulationError, SimulationHandle};
use event_bus::EventBus;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracker_config::Config;
use tracker_storage::{StorageError, StorageService};
use tracker_types::{
	truncate_id, CancellationRequest, Route, SimulationState, StorageKey, TrackerEvent,
};

/// Events buffered per slow subscriber.
const EVENT_BUS_CAPACITY: usize = 1000;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
	#[error(transparent)]
	Simulation(#[from] SimulationError),
	#[error(transparent)]
	Checkout(#[from] CheckoutError),
	#[error(transparent)]
	Cancellation(#[from] CancellationError),
}

/// Main engine of the order tracker.
pub struct TrackerEngine {
	pub(crate) config: Config,
	params: SimulationParams,
	pub(crate) storage: Arc<StorageService>,
	event_bus: EventBus,
	navigator: Arc<dyn Navigator>,
	pub(crate) simulations: Mutex<HashMap<String, RunningSimulation>>,
	cancellations: CancellationHandler,
	refunds: RefundTracker,
}

impl TrackerEngine {
	pub fn new(config: Config, storage: Arc<StorageService>, navigator: Arc<dyn Navigator>) -> Self {
		let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
		Self {
			params: SimulationParams::from(&config.simulation),
			cancellations: CancellationHandler::new(storage.clone()),
			refunds: RefundTracker::new(config.refund, event_bus.clone()),
			config,
			storage,
			event_bus,
			navigator,
			simulations: Mutex::new(HashMap::new()),
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	pub fn storage(&self) -> &Arc<StorageService> {
		&self.storage
	}

	/// Starts tracking an order, or returns the running simulation for it.
	pub async fn track(&self, order_id: &str) -> SimulationHandle {
		let mut simulations = self.simulations.lock().await;

		if let Some(running) = simulations.get(order_id) {
			if !running.is_finished() {
				return running.handle().clone();
			}
		}

		let simulation =
			OrderSimulation::initialize(order_id, self.storage.clone(), self.params).await;
		tracing::info!(
			order_id = %truncate_id(order_id),
			stage = %simulation.stage(),
			"Tracking order"
		);

		let running = SimulationDriver::spawn(simulation, self.event_bus.clone());
		let handle = running.handle().clone();
		simulations.insert(order_id.to_string(), running);
		handle
	}

	/// Handle of a running simulation, if the order is being tracked.
	pub async fn handle(&self, order_id: &str) -> Option<SimulationHandle> {
		self.simulations
			.lock()
			.await
			.get(order_id)
			.map(|running| running.handle().clone())
	}

	/// Approves the packing photo of a tracked order.
	pub async fn accept_photo(&self, order_id: &str) -> Result<SimulationState, EngineError> {
		Ok(self.track(order_id).await.accept_photo().await?)
	}

	/// Rejects the packing photo and opens the cancellation flow when allowed.
	pub async fn reject_photo(&self, order_id: &str) -> Result<Option<Route>, EngineError> {
		let route = self.track(order_id).await.reject_photo().await?;
		Ok(self.follow(route))
	}

	/// Opens the edit flow when the order is still in its grace period.
	pub async fn edit_order(&self, order_id: &str) -> Result<Option<Route>, EngineError> {
		let route = self.track(order_id).await.edit_order().await?;
		Ok(self.follow(route))
	}

	/// Opens the cancellation flow when the order is still in its grace period.
	pub async fn cancel_order(&self, order_id: &str) -> Result<Option<Route>, EngineError> {
		let route = self.track(order_id).await.cancel_order().await?;
		Ok(self.follow(route))
	}

	/// Current state of an order without starting its timers.
	pub async fn snapshot(&self, order_id: &str) -> Result<Option<SimulationState>, EngineError> {
		if let Some(handle) = self.handle(order_id).await {
			return Ok(Some(handle.state()));
		}
		match self
			.storage
			.retrieve(StorageKey::SimulationState, order_id)
			.await
		{
			Ok(state) => Ok(Some(state)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	/// Stops the simulation of an order. Returns false when it was not running.
	pub async fn stop(&self, order_id: &str) -> bool {
		let running = self.simulations.lock().await.remove(order_id);
		match running {
			Some(running) => {
				running.shutdown().await;
				tracing::debug!(order_id = %truncate_id(order_id), "Stopped tracking order");
				true
			},
			None => false,
		}
	}

	/// Stops an order and clears its persisted state.
	pub async fn reset(&self, order_id: &str) -> Result<(), EngineError> {
		self.stop(order_id).await;
		OrderSimulation::clear(&self.storage, order_id).await?;
		tracing::info!(order_id = %truncate_id(order_id), "Cleared order state");
		Ok(())
	}

	/// Ids of every order with persisted state.
	pub async fn list_orders(&self) -> Result<Vec<String>, EngineError> {
		Ok(self.storage.list_ids(StorageKey::SimulationState).await?)
	}

	/// A checkout over the demo cart using the configured charges.
	pub fn checkout(&self) -> CheckoutService {
		CheckoutService::new(self.config.checkout)
	}

	/// Places an order and opens its confirmation screen.
	pub async fn place_order(&self, checkout: &CheckoutService) -> Result<String, EngineError> {
		let order_id = checkout.place_order().await?;
		self.navigate(Route::OrderConfirmation {
			order_id: order_id.clone(),
		});
		Ok(order_id)
	}

	/// Waits on the confirmation screen, then starts tracking the order.
	///
	/// Without an order id the front end is sent home and nothing is tracked.
	pub async fn confirm_order(&self, order_id: &str) -> Option<SimulationHandle> {
		tokio::time::sleep(self.config.checkout.confirmation_redirect()).await;
		if order_id.trim().is_empty() {
			self.navigate(Route::Home);
			return None;
		}
		self.navigate(Route::Tracking {
			order_id: order_id.to_string(),
		});
		Some(self.track(order_id).await)
	}

	/// Opens the place-order screen, offered once an order is delivered.
	pub fn order_again(&self) {
		self.navigate(Route::PlaceOrder);
	}

	/// Records a cancellation, stops the order and opens the confirmation screen.
	///
	/// Without an explicit amount the configured default refund is shown.
	pub async fn cancel(
		&self,
		order_id: &str,
		reason_id: &str,
		custom_reason: Option<&str>,
		refund_amount: Option<u64>,
	) -> Result<CancellationRequest, EngineError> {
		let amount = refund_amount.unwrap_or(self.config.refund.default_amount);
		let (request, route) = self
			.cancellations
			.submit(order_id, reason_id, custom_reason, amount)
			.await?;

		self.stop(order_id).await;
		self.navigate(route);
		Ok(request)
	}

	/// Recorded cancellation of an order, if any.
	pub async fn cancellation(
		&self,
		order_id: &str,
	) -> Result<Option<CancellationRequest>, EngineError> {
		Ok(self.cancellations.find(order_id).await?)
	}

	/// Opens the refund status screen and starts its timeline.
	pub fn track_refund(&self, order_id: &str) -> RunningRefund {
		self.navigate(Route::RefundStatus {
			order_id: order_id.to_string(),
		});
		self.refunds.start(order_id)
	}

	fn follow(&self, route: Option<Route>) -> Option<Route> {
		if let Some(route) = &route {
			self.navigate(route.clone());
		}
		route
	}

	fn navigate(&self, route: Route) {
		self.event_bus
			.publish(TrackerEvent::Navigation(route.clone()));
		self.navigator.navigate(route);
	}
}
