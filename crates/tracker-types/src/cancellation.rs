//! Cancellation reasons and requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reason the customer can pick when cancelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationReason {
	pub id: &'static str,
	pub label: &'static str,
	/// The customer must type their own reason when this one is picked.
	pub requires_custom_input: bool,
}

const fn reason(id: &'static str, label: &'static str) -> CancellationReason {
	CancellationReason {
		id,
		label,
		requires_custom_input: false,
	}
}

/// Reason id that requires free-form text.
pub const OTHER_REASON_ID: &str = "other";

pub const CANCELLATION_REASONS: [CancellationReason; 11] = [
	reason("change-address", "I want to change the delivery address"),
	reason("shorter-delivery", "I was hoping for a shorter delivery time"),
	reason("change-contact", "I want to change the contact details"),
	reason("price-decreased", "Price of the product has decreased"),
	reason("better-alternative", "Found a better alternative elsewhere"),
	reason("changed-mind", "Changed my mind about the purchase"),
	reason("ordered-mistake", "Ordered by mistake"),
	reason("specs-not-met", "Product specifications don't meet my needs"),
	reason("delivery-date", "Delivery date not suitable"),
	reason("payment-issues", "Payment issues"),
	CancellationReason {
		id: OTHER_REASON_ID,
		label: "Other",
		requires_custom_input: true,
	},
];

/// Looks up a reason by id.
pub fn find_reason(id: &str) -> Option<&'static CancellationReason> {
	CANCELLATION_REASONS.iter().find(|r| r.id == id)
}

/// A submitted cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationRequest {
	pub order_id: String,
	pub reason: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub custom_reason: Option<String>,
	pub timestamp: DateTime<Utc>,
}
