//! Common types module for the order tracker.
//!
//! This module defines the data model shared by every tracker component:
//! the simulation state persisted per order, the mock directory records,
//! checkout and cancellation types, refund timeline types, events and
//! navigation routes.

/// Cancellation reasons and requests.
pub mod cancellation;
/// Cart, address and bill types used when placing an order.
pub mod checkout;
/// Static mock records for the delivery partner, locations and sample order.
pub mod directory;
/// Event types broadcast by the engine.
pub mod events;
/// Routes understood by the navigation collaborator.
pub mod navigation;
/// Refund timeline types.
pub mod refund;
/// Registry trait for pluggable implementations.
pub mod registry;
/// Order simulation state and stages.
pub mod simulation;
/// Storage key namespaces.
pub mod storage;
/// Display helpers.
pub mod utils;
/// Configuration validation types.
pub mod validation;

pub use cancellation::*;
pub use checkout::*;
pub use directory::*;
pub use events::*;
pub use navigation::*;
pub use refund::*;
pub use registry::ImplementationRegistry;
pub use simulation::*;
pub use storage::*;
pub use utils::{format_currency, format_percent, truncate_id};
pub use validation::*;
