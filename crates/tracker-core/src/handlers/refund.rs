//! Refund status timeline.
//!
//! A refund walks through the three stages of `REFUND_STAGES` on fixed
//! offsets from when tracking starts. Nothing is persisted.

use crate::engine::event_bus::EventBus;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracker_config::RefundConfig;
use tracker_types::{truncate_id, RefundEvent, RefundProgress, TrackerEvent};

/// Schedules refund progress for an order.
pub struct RefundTracker {
	config: RefundConfig,
	event_bus: EventBus,
}

impl RefundTracker {
	pub fn new(config: RefundConfig, event_bus: EventBus) -> Self {
		Self { config, event_bus }
	}

	/// Progress points of the timeline, as offsets from the start.
	fn schedule(&self) -> [(Duration, RefundProgress); 3] {
		[
			(
				Duration::from_millis(self.config.processing_after_ms),
				RefundProgress {
					active_stage_index: 1,
					is_completed: false,
				},
			),
			(
				Duration::from_millis(self.config.delivered_after_ms),
				RefundProgress {
					active_stage_index: 2,
					is_completed: false,
				},
			),
			(
				Duration::from_millis(self.config.completed_after_ms),
				RefundProgress {
					active_stage_index: 2,
					is_completed: true,
				},
			),
		]
	}

	/// Starts the timeline for `order_id`.
	pub fn start(&self, order_id: &str) -> RunningRefund {
		let (progress_tx, progress_rx) = watch::channel(RefundProgress::default());
		let schedule = self.schedule();
		let event_bus = self.event_bus.clone();
		let order_id = order_id.to_string();
		let task_order_id = order_id.clone();

		let task = tokio::spawn(async move {
			let started = Instant::now();
			for (offset, progress) in schedule {
				sleep_until(started + offset).await;
				progress_tx.send_replace(progress);
				tracing::debug!(
					order_id = %truncate_id(&task_order_id),
					stage = progress.active_stage_index,
					completed = progress.is_completed,
					"Refund progressed"
				);
				event_bus.publish(TrackerEvent::Refund(RefundEvent::Progressed {
					order_id: task_order_id.clone(),
					progress,
				}));
			}
			tracing::info!(order_id = %truncate_id(&task_order_id), "Refund completed");
			event_bus.publish(TrackerEvent::Refund(RefundEvent::Completed {
				order_id: task_order_id,
			}));
		});

		RunningRefund {
			order_id,
			progress: progress_rx,
			task,
		}
	}
}

/// A refund timeline in progress. Dropping it cancels the remaining timers.
pub struct RunningRefund {
	order_id: String,
	progress: watch::Receiver<RefundProgress>,
	task: JoinHandle<()>,
}

impl RunningRefund {
	pub fn order_id(&self) -> &str {
		&self.order_id
	}

	pub fn progress(&self) -> RefundProgress {
		*self.progress.borrow()
	}

	pub fn subscribe(&self) -> watch::Receiver<RefundProgress> {
		self.progress.clone()
	}

	/// Waits until every stage is complete.
	pub async fn completed(&mut self) -> RefundProgress {
		let result = self
			.progress
			.wait_for(|p| p.is_completed)
			.await
			.map(|progress| *progress);
		// An error means the task is gone; report where it stopped.
		result.unwrap_or_else(|_| *self.progress.borrow())
	}
}

impl Drop for RunningRefund {
	fn drop(&mut self) {
		self.task.abort();
	}
}
