//! Lifecycle management for the tracker engine.

use super::{EngineError, TrackerEngine};
use tracker_types::truncate_id;

impl TrackerEngine {
	/// Logs the effective timings before any order is tracked.
	pub async fn initialize(&self) -> Result<(), EngineError> {
		let simulation = &self.config.simulation;
		tracing::info!(
			tracker = %self.config.tracker.id,
			grace = simulation.grace_period_seconds,
			photo_review = simulation.photo_review_seconds,
			delivery = simulation.delivery_duration_seconds,
			storage = %self.config.storage.primary,
			"Initializing tracker engine"
		);
		Ok(())
	}

	/// Stops every running simulation. Persisted state is kept.
	pub async fn shutdown(&self) -> Result<(), EngineError> {
		tracing::info!("Shutting down tracker engine");

		let running: Vec<_> = self.simulations.lock().await.drain().collect();
		for (order_id, simulation) in running {
			tracing::debug!(order_id = %truncate_id(&order_id), "Stopping simulation");
			simulation.shutdown().await;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use crate::engine::TrackerEngine;
	use crate::navigation::LoggingNavigator;
	use std::sync::Arc;
	use tracker_config::Config;
	use tracker_storage::implementations::memory::MemoryStorage;
	use tracker_storage::StorageService;

	#[tokio::test]
	async fn test_shutdown_stops_all_simulations() {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::default())));
		let engine = TrackerEngine::new(Config::default(), storage, Arc::new(LoggingNavigator));
		engine.initialize().await.unwrap();

		let handle = engine.track("A").await;
		engine.track("B").await;
		engine.shutdown().await.unwrap();

		assert!(engine.handle("A").await.is_none());
		assert!(handle.accept_photo().await.is_err());
		assert_eq!(engine.list_orders().await.unwrap().len(), 2);
	}
}
