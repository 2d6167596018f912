//! Checkout types.
//!
//! Amounts are integer minor units throughout.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment options offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
	#[default]
	#[serde(rename = "UPI")]
	Upi,
	Card,
	#[serde(rename = "COD")]
	Cod,
}

impl fmt::Display for PaymentMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PaymentMethod::Upi => f.write_str("UPI"),
			PaymentMethod::Card => f.write_str("Card"),
			PaymentMethod::Cod => f.write_str("COD"),
		}
	}
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
	pub id: String,
	pub product_name: String,
	pub quantity: u32,
	pub unit_price: u64,
	pub total_price: u64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub icon: Option<String>,
}

impl CartItem {
	/// Creates a cart line, deriving the line total from quantity and unit price.
	pub fn new(id: &str, product_name: &str, quantity: u32, unit_price: u64) -> Self {
		Self {
			id: id.to_string(),
			product_name: product_name.to_string(),
			quantity,
			unit_price,
			total_price: unit_price * u64::from(quantity),
			icon: None,
		}
	}

	pub fn with_icon(mut self, icon: &str) -> Self {
		self.icon = Some(icon.to_string());
		self
	}
}

/// Delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
	pub street: String,
	pub city: String,
	pub zip_code: String,
	pub full_address: String,
}

/// Fixed charges applied on top of the items total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillPolicy {
	pub shipping_fee: u64,
	pub taxes: u64,
	pub discount: u64,
}

impl Default for BillPolicy {
	fn default() -> Self {
		Self {
			shipping_fee: 50,
			taxes: 210,
			discount: 300,
		}
	}
}

/// Breakdown shown before the order is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSummary {
	pub items_total: u64,
	pub shipping_fee: u64,
	pub taxes: u64,
	pub discount: u64,
	pub total_payable: u64,
}

impl BillSummary {
	/// Computes the bill for a cart. The discount never drives the total below zero.
	pub fn calculate(items: &[CartItem], policy: &BillPolicy) -> Self {
		let items_total: u64 = items.iter().map(|item| item.total_price).sum();
		let total_payable = (items_total + policy.shipping_fee + policy.taxes)
			.saturating_sub(policy.discount);

		Self {
			items_total,
			shipping_fee: policy.shipping_fee,
			taxes: policy.taxes,
			discount: policy.discount,
			total_payable,
		}
	}
}

/// Returns the demo cart.
pub fn mock_cart() -> Vec<CartItem> {
	vec![
		CartItem::new("1", "Wireless Earbuds", 1, 1799).with_icon("🎧"),
		CartItem::new("2", "Cotton T-Shirt (Blue)", 2, 999).with_icon("👕"),
	]
}

/// Returns the demo delivery address.
pub fn mock_address() -> Address {
	Address {
		street: "123, Green Street".to_string(),
		city: "Teal City".to_string(),
		zip_code: "56789".to_string(),
		full_address: "123, Green Street, Teal City, 56789".to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_mock_cart_bill() {
		let bill = BillSummary::calculate(&mock_cart(), &BillPolicy::default());
		assert_eq!(bill.items_total, 3797);
		assert_eq!(bill.total_payable, 3797 + 50 + 210 - 300);
	}

	#[test]
	fn test_discount_saturates() {
		let policy = BillPolicy {
			shipping_fee: 0,
			taxes: 0,
			discount: 1_000,
		};
		let bill = BillSummary::calculate(&[CartItem::new("x", "Pen", 1, 10)], &policy);
		assert_eq!(bill.total_payable, 0);
	}

	#[test]
	fn test_payment_method_wire_names() {
		assert_eq!(serde_json::to_string(&PaymentMethod::Upi).unwrap(), "\"UPI\"");
		assert_eq!(serde_json::to_string(&PaymentMethod::Cod).unwrap(), "\"COD\"");
		assert_eq!(PaymentMethod::Card.to_string(), "Card");
	}
}
