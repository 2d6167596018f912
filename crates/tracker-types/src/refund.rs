//! Refund timeline types.

use serde::{Deserialize, Serialize};

/// Display status of a single refund stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundStageStatus {
	Pending,
	Active,
	Completed,
}

/// Static description of a refund stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefundStage {
	pub id: &'static str,
	pub title: &'static str,
	pub description: &'static str,
}

pub const REFUND_STAGES: [RefundStage; 3] = [
	RefundStage {
		id: "initiated",
		title: "Refund Initiated",
		description: "Your cancellation has been confirmed. We've started processing your refund.",
	},
	RefundStage {
		id: "processing",
		title: "Bank Processing",
		description: "Your refund is being processed by your bank. This typically takes 3-5 business days.",
	},
	RefundStage {
		id: "delivered",
		title: "Money Delivered to Your Account",
		description: "Once processing is complete, the money will appear in your bank account.",
	},
];

/// Position of a refund along [`REFUND_STAGES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundProgress {
	pub active_stage_index: usize,
	pub is_completed: bool,
}

impl RefundProgress {
	/// Status of the stage at `index` given the current progress.
	pub fn stage_status(&self, index: usize) -> RefundStageStatus {
		if index < self.active_stage_index {
			RefundStageStatus::Completed
		} else if index == self.active_stage_index {
			if self.is_completed {
				RefundStageStatus::Completed
			} else {
				RefundStageStatus::Active
			}
		} else {
			RefundStageStatus::Pending
		}
	}

	/// Statuses for every stage in order.
	pub fn statuses(&self) -> Vec<RefundStageStatus> {
		(0..REFUND_STAGES.len()).map(|i| self.stage_status(i)).collect()
	}
}
