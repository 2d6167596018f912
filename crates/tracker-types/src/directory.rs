//! Mock directory records.
//!
//! Static identities and coordinates consumed read-only by the simulation
//! and by anything that wants to plot the courier.

use crate::DeliveryPartner;
use serde::Serialize;

/// A labelled geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
	pub lat: f64,
	pub lng: f64,
	pub label: &'static str,
}

/// Summary of the sample order shown on the tracking screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockOrder {
	pub id: &'static str,
	pub product_name: &'static str,
	pub quantity: u32,
	pub icon: &'static str,
	pub is_returnable: bool,
	pub is_exchangeable: bool,
	pub seller_name: &'static str,
}

pub const MOCK_SELLER_LOCATION: Location = Location {
	lat: 28.6139,
	lng: 77.209,
	label: "Rahul Shop, Connaught Place",
};

pub const MOCK_CUSTOMER_LOCATION: Location = Location {
	lat: 28.5355,
	lng: 77.391,
	label: "123, Green Street, Noida",
};

pub const MOCK_ORDER: MockOrder = MockOrder {
	id: "ORD-2026-8898",
	product_name: "Wireless Earbuds",
	quantity: 1,
	icon: "🎧",
	is_returnable: true,
	is_exchangeable: false,
	seller_name: "Rahul Shop",
};

/// Returns the partner assigned to every simulated delivery.
pub fn mock_delivery_partner() -> DeliveryPartner {
	DeliveryPartner {
		name: "Rajesh Kumar".to_string(),
		phone: "+91 98765 43210".to_string(),
		photo: None,
	}
}
