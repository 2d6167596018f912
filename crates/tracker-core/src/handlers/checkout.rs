//! Checkout flow: bill summary and simulated order placement.

use rand::Rng;
use thiserror::Error;
use tracker_config::CheckoutConfig;
use tracker_types::{mock_address, mock_cart, Address, BillSummary, CartItem, PaymentMethod};

/// Shown to the customer when a simulated placement fails.
pub const PLACEMENT_FAILED_NOTICE: &str = "Failed to place order. Please try again.";

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
	#[error("Cart is empty")]
	EmptyCart,
	#[error("Delivery address is missing")]
	MissingAddress,
	#[error("{0}")]
	Placement(String),
}

/// Generates an order id of the form `ORD-2026-<n>` with `n` in `0..10000`.
pub fn generate_order_id<R: Rng + ?Sized>(rng: &mut R) -> String {
	format!("ORD-2026-{}", rng.gen_range(0..10_000))
}

/// State of the place-order screen.
#[derive(Debug, Clone)]
pub struct CheckoutService {
	config: CheckoutConfig,
	cart: Vec<CartItem>,
	address: Option<Address>,
	payment: PaymentMethod,
}

impl CheckoutService {
	/// Starts from the demo cart and address, paying by UPI.
	pub fn new(config: CheckoutConfig) -> Self {
		Self {
			config,
			cart: mock_cart(),
			address: Some(mock_address()),
			payment: PaymentMethod::default(),
		}
	}

	pub fn with_cart(mut self, cart: Vec<CartItem>) -> Self {
		self.cart = cart;
		self
	}

	pub fn with_address(mut self, address: Option<Address>) -> Self {
		self.address = address;
		self
	}

	pub fn with_payment(mut self, payment: PaymentMethod) -> Self {
		self.payment = payment;
		self
	}

	pub fn cart(&self) -> &[CartItem] {
		&self.cart
	}

	pub fn address(&self) -> Option<&Address> {
		self.address.as_ref()
	}

	pub fn payment(&self) -> PaymentMethod {
		self.payment
	}

	pub fn bill_summary(&self) -> BillSummary {
		BillSummary::calculate(&self.cart, &self.config.bill_policy())
	}

	/// Places the order after the simulated latency and returns its id.
	pub async fn place_order(&self) -> Result<String, CheckoutError> {
		if self.cart.is_empty() {
			return Err(CheckoutError::EmptyCart);
		}
		if self.address.is_none() {
			return Err(CheckoutError::MissingAddress);
		}

		tracing::debug!(
			items = self.cart.len(),
			payment = %self.payment,
			"Placing order"
		);
		tokio::time::sleep(self.config.placement_delay()).await;

		let mut rng = rand::thread_rng();
		if rng.gen::<f64>() < self.config.failure_rate {
			tracing::warn!("Simulated order placement failure");
			return Err(CheckoutError::Placement(PLACEMENT_FAILED_NOTICE.to_string()));
		}

		let order_id = generate_order_id(&mut rng);
		tracing::info!(order_id = %order_id, "Order placed");
		Ok(order_id)
	}
}
