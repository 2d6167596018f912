//! Navigation collaborator.
//!
//! The engine does not own any screens. When a flow hands off (photo
//! rejected, cancel, edit, checkout finished) it asks a [`Navigator`] to
//! open a [`Route`].

use std::sync::Mutex;
use tracker_types::Route;

/// Receives navigation requests from the engine.
pub trait Navigator: Send + Sync {
	fn navigate(&self, route: Route);
}

/// Navigator that only logs the request.
#[derive(Debug, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
	fn navigate(&self, route: Route) {
		tracing::info!(path = %route, "Navigate");
	}
}

/// Navigator that keeps every route it was asked to open.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
	routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Routes requested so far, oldest first.
	pub fn routes(&self) -> Vec<Route> {
		self.routes
			.lock()
			.map(|routes| routes.clone())
			.unwrap_or_default()
	}

	pub fn last(&self) -> Option<Route> {
		self.routes().pop()
	}
}

impl Navigator for RecordingNavigator {
	fn navigate(&self, route: Route) {
		if let Ok(mut routes) = self.routes.lock() {
			routes.push(route);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_recording_navigator_keeps_order() {
		let navigator = RecordingNavigator::new();
		assert_eq!(navigator.last(), None);

		navigator.navigate(Route::PlaceOrder);
		navigator.navigate(Route::Tracking {
			order_id: "ORD-2026-1".into(),
		});

		assert_eq!(navigator.routes().len(), 2);
		assert_eq!(navigator.routes()[0], Route::PlaceOrder);
		assert_eq!(navigator.last().unwrap().path(), "/order/ORD-2026-1/tracking");
	}
}
