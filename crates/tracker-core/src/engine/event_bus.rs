//! Event bus for fanning tracker events out to subscribers.
//!
//! Built on a tokio broadcast channel. Publishing never blocks, and a
//! publish with no subscribers is not an error.

use tokio::sync::broadcast;
use tracker_types::TrackerEvent;

/// Cloneable handle to the shared event channel.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<TrackerEvent>,
}

impl EventBus {
	/// Creates a bus that buffers up to `capacity` events per slow subscriber.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to every current subscriber.
	pub fn publish(&self, event: TrackerEvent) {
		if let Err(e) = self.sender.send(event) {
			tracing::trace!("Event dropped, no subscribers: {:?}", e.0);
		}
	}
}
