//! Cancellation flow.
//!
//! Validates the chosen reason, records the request and points the front
//! end at the cancellation confirmation with the refund amount.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracker_storage::{StorageError, StorageService};
use tracker_types::{
	find_reason, truncate_id, CancellationRequest, Route, StorageKey, OTHER_REASON_ID,
};

/// Errors that can occur while cancelling an order.
#[derive(Debug, Error)]
pub enum CancellationError {
	#[error("Unknown cancellation reason: {0}")]
	UnknownReason(String),
	#[error("Please describe your reason for cancelling")]
	MissingCustomReason,
	#[error("Storage error: {0}")]
	Storage(String),
}

/// Builds a request from the customer's choice.
///
/// Custom text is only kept for the `other` reason, where it must not be blank.
pub fn build_request(
	order_id: &str,
	reason_id: &str,
	custom_reason: Option<&str>,
	timestamp: DateTime<Utc>,
) -> Result<CancellationRequest, CancellationError> {
	let reason =
		find_reason(reason_id).ok_or_else(|| CancellationError::UnknownReason(reason_id.into()))?;

	let custom_reason = if reason.id == OTHER_REASON_ID {
		match custom_reason.map(str::trim) {
			Some(text) if !text.is_empty() => Some(text.to_string()),
			_ => return Err(CancellationError::MissingCustomReason),
		}
	} else {
		None
	};

	Ok(CancellationRequest {
		order_id: order_id.to_string(),
		reason: reason.id.to_string(),
		custom_reason,
		timestamp,
	})
}

/// Records cancellation requests.
pub struct CancellationHandler {
	storage: Arc<StorageService>,
}

impl CancellationHandler {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Validates and stores a request, returning it with the confirmation route.
	pub async fn submit(
		&self,
		order_id: &str,
		reason_id: &str,
		custom_reason: Option<&str>,
		refund_amount: u64,
	) -> Result<(CancellationRequest, Route), CancellationError> {
		let request = build_request(order_id, reason_id, custom_reason, Utc::now())?;

		self.storage
			.store(StorageKey::Cancellations, order_id, &request)
			.await
			.map_err(|e| CancellationError::Storage(e.to_string()))?;

		tracing::info!(
			order_id = %truncate_id(order_id),
			reason = %request.reason,
			"Cancellation requested"
		);

		let route = Route::CancellationConfirmed {
			order_id: order_id.to_string(),
			amount: refund_amount,
		};
		Ok((request, route))
	}

	/// Returns the recorded request for an order, if any.
	pub async fn find(
		&self,
		order_id: &str,
	) -> Result<Option<CancellationRequest>, CancellationError> {
		match self
			.storage
			.retrieve(StorageKey::Cancellations, order_id)
			.await
		{
			Ok(request) => Ok(Some(request)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(CancellationError::Storage(e.to_string())),
		}
	}
}
