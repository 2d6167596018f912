//! Routes understood by the navigation collaborator.
//!
//! The tracker never renders screens itself; it asks a navigator to move to
//! one of these routes and carries the order id and amount along.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A screen the front end can be asked to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
	Home,
	PlaceOrder,
	OrderConfirmation { order_id: String },
	Tracking { order_id: String },
	CancelOrder { order_id: String },
	EditOrder { order_id: String },
	CancellationConfirmed { order_id: String, amount: u64 },
	RefundStatus { order_id: String },
}

impl Route {
	/// Returns the path the front end uses for this route.
	pub fn path(&self) -> String {
		match self {
			Route::Home => "/".to_string(),
			Route::PlaceOrder => "/place-order".to_string(),
			Route::OrderConfirmation { order_id } => {
				format!("/order-confirmation?orderId={}", order_id)
			},
			Route::Tracking { order_id } => format!("/order/{}/tracking", order_id),
			Route::CancelOrder { order_id } => format!("/cancel-order?orderId={}", order_id),
			Route::EditOrder { order_id } => format!("/order/{}/edit", order_id),
			Route::CancellationConfirmed { order_id, amount } => format!(
				"/cancellation-confirmed?orderId={}&amount={}",
				order_id, amount
			),
			Route::RefundStatus { order_id } => format!("/refund-status/{}", order_id),
		}
	}
}

impl fmt::Display for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.path())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_paths() {
		let id = "ORD-2026-42".to_string();
		assert_eq!(
			Route::Tracking {
				order_id: id.clone()
			}
			.path(),
			"/order/ORD-2026-42/tracking"
		);
		assert_eq!(
			Route::CancellationConfirmed {
				order_id: id.clone(),
				amount: 44322
			}
			.path(),
			"/cancellation-confirmed?orderId=ORD-2026-42&amount=44322"
		);
		assert_eq!(Route::RefundStatus { order_id: id }.to_string(), "/refund-status/ORD-2026-42");
		assert_eq!(Route::Home.path(), "/");
	}
}
