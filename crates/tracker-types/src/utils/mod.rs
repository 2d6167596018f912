//! Display helpers shared by the engine and the console front end.

pub mod formatting;

pub use formatting::{format_currency, format_percent, truncate_id};
