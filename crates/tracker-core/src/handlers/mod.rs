//! Handlers for the flows around an order.
//!
//! The simulation handler owns one order's lifecycle. Checkout, cancellation
//! and refund cover the screens before and after it.

pub mod cancellation;
pub mod checkout;
pub mod refund;
pub mod simulation;

pub use cancellation::{build_request, CancellationError, CancellationHandler};
pub use checkout::{generate_order_id, CheckoutError, CheckoutService};
pub use refund::{RefundTracker, RunningRefund};
pub use simulation::OrderSimulation;
