//! Console front end.
//!
//! Each screen of the tracker is rendered as a few lines of text. The
//! navigator prints the requested route instead of switching screens.

use chrono::Local;
use tracker_config::Config;
use tracker_core::views::{
	available_actions, courier_position, grace_countdown, photo_review_countdown, timeline,
};
use tracker_core::Navigator;
use tracker_types::{
	format_currency, format_percent, BillSummary, CartItem, RefundProgress, RefundStageStatus,
	Route, SimulationStage, SimulationState, CANCELLATION_REASONS, MOCK_CUSTOMER_LOCATION,
	MOCK_ORDER, MOCK_SELLER_LOCATION, REFUND_STAGES,
};

/// Navigator that prints each route to stdout.
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
	fn navigate(&self, route: Route) {
		tracing::debug!(path = %route, "Navigate");
		println!("-> {}", route);
	}
}

/// Place-order screen: cart lines and bill.
pub fn render_checkout(cart: &[CartItem], bill: &BillSummary) -> String {
	let mut lines = Vec::new();
	for item in cart {
		lines.push(format!(
			"{} {} x{}  {}",
			item.icon.as_deref().unwrap_or("-"),
			item.product_name,
			item.quantity,
			format_currency(item.total_price)
		));
	}
	lines.push(format!("Items total    {}", format_currency(bill.items_total)));
	lines.push(format!("Shipping fee   {}", format_currency(bill.shipping_fee)));
	lines.push(format!("Taxes          {}", format_currency(bill.taxes)));
	lines.push(format!("Discount      -{}", format_currency(bill.discount)));
	lines.push(format!("Total payable  {}", format_currency(bill.total_payable)));
	lines.join("\n")
}

/// Tracking screen for the current state.
pub fn render_tracking(order_id: &str, state: &SimulationState, config: &Config) -> String {
	let simulation = &config.simulation;
	let mut lines = vec![format!(
		"[{}] {} x{} ({})",
		order_id, MOCK_ORDER.product_name, MOCK_ORDER.quantity, state.stage
	)];

	if let Some(countdown) = grace_countdown(
		state,
		simulation.grace_period_seconds,
		simulation.urgent_threshold_seconds,
	) {
		lines.push(format!(
			"Time to shipment: {}s ({}){}",
			countdown.remaining,
			format_percent(countdown.percent),
			if countdown.urgent { " !" } else { "" }
		));
	}

	if let Some(countdown) = photo_review_countdown(state, simulation.photo_review_seconds) {
		lines.push(format!(
			"Review the packing photo: {}s left{}",
			countdown.remaining,
			if countdown.urgent { " !" } else { "" }
		));
	}

	for step in timeline(state, MOCK_ORDER.seller_name) {
		let mark = if step.complete { "x" } else { " " };
		let eta = step
			.estimated_arrival
			.map(|eta| {
				format!(
					" (est. arrival {})",
					eta.with_timezone(&Local).format("%H:%M")
				)
			})
			.unwrap_or_default();
		lines.push(format!("  [{}] {}{}", mark, step.label, eta));
	}

	if state.stage >= SimulationStage::Shipped {
		if let Some(partner) = &state.delivery_partner {
			lines.push(format!("Delivery partner: {} {}", partner.name, partner.phone));
		}
		let (lat, lng) = courier_position(
			state.delivery_progress,
			&MOCK_SELLER_LOCATION,
			&MOCK_CUSTOMER_LOCATION,
		);
		lines.push(format!(
			"Courier at {:.4}, {:.4} ({} of the way to {})",
			lat,
			lng,
			format_percent(state.delivery_progress),
			MOCK_CUSTOMER_LOCATION.label
		));
	}

	let actions = available_actions(state.stage);
	let mut offered = Vec::new();
	if actions.edit {
		offered.push("edit");
	}
	if actions.cancel {
		offered.push("cancel");
	}
	if actions.accept_photo {
		offered.push("accept photo");
	}
	if actions.reject_photo {
		offered.push("reject photo");
	}
	if !offered.is_empty() {
		lines.push(format!("Actions: {}", offered.join(", ")));
	}

	if state.stage == SimulationStage::Delivered {
		lines.push(format!(
			"Order Delivered Successfully! Enjoy your {}.",
			MOCK_ORDER.product_name
		));
	}

	lines.join("\n")
}

/// Refund status screen.
pub fn render_refund(order_id: &str, amount: u64, progress: &RefundProgress) -> String {
	let mut lines = vec![format!("Refund of {} for {}", format_currency(amount), order_id)];
	for (stage, status) in REFUND_STAGES.iter().zip(progress.statuses()) {
		let mark = match status {
			RefundStageStatus::Completed => "x",
			RefundStageStatus::Active => ">",
			RefundStageStatus::Pending => " ",
		};
		lines.push(format!("  [{}] {}", mark, stage.title));
	}
	lines.join("\n")
}

/// Lists the cancellation reasons with their ids.
pub fn render_reasons() -> String {
	CANCELLATION_REASONS
		.iter()
		.map(|reason| {
			let note = if reason.requires_custom_input {
				" (requires --custom)"
			} else {
				""
			};
			format!("{:<20} {}{}", reason.id, reason.label, note)
		})
		.collect::<Vec<_>>()
		.join("\n")
}

#[cfg(test)]
mod tests {
	use super::*;
	use tracker_types::{mock_cart, BillPolicy};

	#[test]
	fn test_render_checkout_totals() {
		let cart = mock_cart();
		let bill = BillSummary::calculate(&cart, &BillPolicy::default());
		let screen = render_checkout(&cart, &bill);

		assert!(screen.contains("Wireless Earbuds x1  ₹17.99"));
		assert!(screen.contains("Total payable  ₹37.57"));
	}

	#[test]
	fn test_render_tracking_grace() {
		let state = SimulationState {
			grace_time_remaining: 9,
			..SimulationState::default()
		};
		let screen = render_tracking("ORD-2026-1", &state, &Config::default());

		assert!(screen.contains("GRACE_PERIOD"));
		assert!(screen.contains("Time to shipment: 9s (30%) !"));
		assert!(screen.contains("Actions: edit, cancel"));
		assert!(!screen.contains("Courier"));
	}

	#[test]
	fn test_render_refund_and_reasons() {
		let progress = RefundProgress {
			active_stage_index: 1,
			is_completed: false,
		};
		let screen = render_refund("A", 44322, &progress);
		assert!(screen.contains("Refund of ₹443.22 for A"));
		assert!(screen.contains("[x] Refund Initiated"));
		assert!(screen.contains("[>] Bank Processing"));

		let reasons = render_reasons();
		assert_eq!(reasons.lines().count(), 11);
		assert!(reasons.contains("other"));
	}
}
