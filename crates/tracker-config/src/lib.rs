//! Configuration module for the order tracker.
//!
//! Configuration is loaded from TOML. Every section has defaults, so an
//! empty file (or no file at all) yields a runnable demo. Values may
//! reference environment variables with `${NAME}` or `${NAME:-default}`.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["storage.toml"]` to include other config files
//! - Each top-level section must be unique across all files

mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracker_types::{
	BillPolicy, DELIVERY_DURATION, DELIVERY_TICK_SECONDS, ESTIMATED_ARRIVAL_MINUTES,
	GRACE_PERIOD_DURATION, PHOTO_REVIEW_DURATION,
};

pub use loader::ConfigLoader;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the tracker.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this tracker instance.
	#[serde(default)]
	pub tracker: TrackerConfig,
	/// Timings of the order simulation.
	#[serde(default)]
	pub simulation: SimulationConfig,
	/// Persistence backend.
	#[serde(default)]
	pub storage: StorageConfig,
	/// Order placement.
	#[serde(default)]
	pub checkout: CheckoutConfig,
	/// Refund timeline.
	#[serde(default)]
	pub refund: RefundConfig,
}

/// Configuration specific to the tracker instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
	/// Identifier used in logs.
	#[serde(default = "default_tracker_id")]
	pub id: String,
}

fn default_tracker_id() -> String {
	"order-tracker".to_string()
}

impl Default for TrackerConfig {
	fn default() -> Self {
		Self {
			id: default_tracker_id(),
		}
	}
}

/// Timings driving the order simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SimulationConfig {
	/// Length of the grace period in seconds.
	#[serde(default = "default_grace_period_seconds")]
	pub grace_period_seconds: u32,
	/// Length of the photo review window in seconds.
	#[serde(default = "default_photo_review_seconds")]
	pub photo_review_seconds: u32,
	/// Time for a delivery to go from 0 to 100 percent, in seconds.
	#[serde(default = "default_delivery_duration_seconds")]
	pub delivery_duration_seconds: u32,
	/// Interval between delivery progress updates, in seconds.
	#[serde(default = "default_delivery_tick_seconds")]
	pub delivery_tick_seconds: u32,
	/// Offset of the estimated arrival from partner assignment, in minutes.
	#[serde(default = "default_estimated_arrival_minutes")]
	pub estimated_arrival_minutes: i64,
	/// Countdowns at or below this many seconds are shown as urgent.
	#[serde(default = "default_urgent_threshold_seconds")]
	pub urgent_threshold_seconds: u32,
}

fn default_grace_period_seconds() -> u32 {
	GRACE_PERIOD_DURATION
}

fn default_photo_review_seconds() -> u32 {
	PHOTO_REVIEW_DURATION
}

fn default_delivery_duration_seconds() -> u32 {
	DELIVERY_DURATION
}

fn default_delivery_tick_seconds() -> u32 {
	DELIVERY_TICK_SECONDS
}

fn default_estimated_arrival_minutes() -> i64 {
	ESTIMATED_ARRIVAL_MINUTES
}

fn default_urgent_threshold_seconds() -> u32 {
	10
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			grace_period_seconds: default_grace_period_seconds(),
			photo_review_seconds: default_photo_review_seconds(),
			delivery_duration_seconds: default_delivery_duration_seconds(),
			delivery_tick_seconds: default_delivery_tick_seconds(),
			estimated_arrival_minutes: default_estimated_arrival_minutes(),
			urgent_threshold_seconds: default_urgent_threshold_seconds(),
		}
	}
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	#[serde(default = "default_storage_primary")]
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	#[serde(default = "default_storage_implementations")]
	pub implementations: HashMap<String, toml::Value>,
}

fn default_storage_primary() -> String {
	"file".to_string()
}

fn default_storage_implementations() -> HashMap<String, toml::Value> {
	let mut table = toml::map::Map::new();
	table.insert(
		"storage_path".to_string(),
		toml::Value::String("./data/storage".to_string()),
	);
	HashMap::from([("file".to_string(), toml::Value::Table(table))])
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			primary: default_storage_primary(),
			implementations: default_storage_implementations(),
		}
	}
}

/// Configuration for order placement.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct CheckoutConfig {
	/// Simulated latency of placing an order, in milliseconds.
	#[serde(default = "default_placement_delay_ms")]
	pub placement_delay_ms: u64,
	/// Delay before the confirmation screen moves on to tracking, in milliseconds.
	#[serde(default = "default_confirmation_redirect_ms")]
	pub confirmation_redirect_ms: u64,
	#[serde(default = "default_shipping_fee")]
	pub shipping_fee: u64,
	#[serde(default = "default_taxes")]
	pub taxes: u64,
	#[serde(default = "default_discount")]
	pub discount: u64,
	/// Probability in `[0, 1]` that a placement attempt fails.
	#[serde(default)]
	pub failure_rate: f64,
}

fn default_placement_delay_ms() -> u64 {
	1500
}

fn default_confirmation_redirect_ms() -> u64 {
	3000
}

fn default_shipping_fee() -> u64 {
	BillPolicy::default().shipping_fee
}

fn default_taxes() -> u64 {
	BillPolicy::default().taxes
}

fn default_discount() -> u64 {
	BillPolicy::default().discount
}

impl CheckoutConfig {
	pub fn placement_delay(&self) -> Duration {
		Duration::from_millis(self.placement_delay_ms)
	}

	pub fn confirmation_redirect(&self) -> Duration {
		Duration::from_millis(self.confirmation_redirect_ms)
	}

	pub fn bill_policy(&self) -> BillPolicy {
		BillPolicy {
			shipping_fee: self.shipping_fee,
			taxes: self.taxes,
			discount: self.discount,
		}
	}
}

impl Default for CheckoutConfig {
	fn default() -> Self {
		Self {
			placement_delay_ms: default_placement_delay_ms(),
			confirmation_redirect_ms: default_confirmation_redirect_ms(),
			shipping_fee: default_shipping_fee(),
			taxes: default_taxes(),
			discount: default_discount(),
			failure_rate: 0.0,
		}
	}
}

/// Offsets of the refund timeline, measured from when tracking starts.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RefundConfig {
	/// When bank processing becomes the active stage, in milliseconds.
	#[serde(default = "default_processing_after_ms")]
	pub processing_after_ms: u64,
	/// When the final stage becomes active, in milliseconds.
	#[serde(default = "default_delivered_after_ms")]
	pub delivered_after_ms: u64,
	/// When every stage is marked complete, in milliseconds.
	#[serde(default = "default_completed_after_ms")]
	pub completed_after_ms: u64,
	/// Amount refunded when none is given, in minor units.
	#[serde(default = "default_refund_amount")]
	pub default_amount: u64,
}

fn default_processing_after_ms() -> u64 {
	1500
}

fn default_delivered_after_ms() -> u64 {
	3500
}

fn default_completed_after_ms() -> u64 {
	5000
}

fn default_refund_amount() -> u64 {
	44322
}

impl Default for RefundConfig {
	fn default() -> Self {
		Self {
			processing_after_ms: default_processing_after_ms(),
			delivered_after_ms: default_delivered_after_ms(),
			completed_after_ms: default_completed_after_ms(),
			default_amount: default_refund_amount(),
		}
	}
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut missing = None;
	let resolved = re.replace_all(input, |caps: &regex::Captures| {
		let var_name = &caps[1];
		match (std::env::var(var_name), caps.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				missing.get_or_insert_with(|| var_name.to_string());
				String::new()
			},
		}
	});

	match missing {
		Some(var_name) => Err(ConfigError::Validation(format!(
			"Environment variable '{}' not found",
			var_name
		))),
		None => Ok(resolved.into_owned()),
	}
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = ConfigLoader::new(base_dir);
		let file_name = path
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path.display())))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration.
	///
	/// - Tracker id is not empty
	/// - Simulation durations and tick are positive, and the delivery run spans at least one tick
	/// - Storage primary names a configured implementation
	/// - Checkout failure rate is a probability
	/// - Refund offsets are non-decreasing
	fn validate(&self) -> Result<(), ConfigError> {
		if self.tracker.id.trim().is_empty() {
			return Err(ConfigError::Validation("Tracker ID cannot be empty".into()));
		}

		let sim = &self.simulation;
		if sim.grace_period_seconds == 0 || sim.photo_review_seconds == 0 {
			return Err(ConfigError::Validation(
				"Grace period and photo review durations must be greater than 0".into(),
			));
		}
		if sim.delivery_tick_seconds == 0 {
			return Err(ConfigError::Validation(
				"delivery_tick_seconds must be greater than 0".into(),
			));
		}
		if sim.delivery_duration_seconds < sim.delivery_tick_seconds {
			return Err(ConfigError::Validation(format!(
				"delivery_duration_seconds ({}) cannot be shorter than delivery_tick_seconds ({})",
				sim.delivery_duration_seconds, sim.delivery_tick_seconds
			)));
		}
		if sim.estimated_arrival_minutes < 0 {
			return Err(ConfigError::Validation(
				"estimated_arrival_minutes cannot be negative".into(),
			));
		}

		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		if !(0.0..=1.0).contains(&self.checkout.failure_rate) {
			return Err(ConfigError::Validation(
				"checkout failure_rate must be between 0 and 1".into(),
			));
		}

		let refund = &self.refund;
		if !(refund.processing_after_ms <= refund.delivered_after_ms
			&& refund.delivered_after_ms <= refund.completed_after_ms)
		{
			return Err(ConfigError::Validation(
				"Refund offsets must be non-decreasing: processing <= delivered <= completed"
					.into(),
			));
		}

		Ok(())
	}
}

/// Parses TOML, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("TRACKER_TEST_DIR", "/tmp/tracker");

		let input = "storage_path = \"${TRACKER_TEST_DIR}/orders\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "storage_path = \"/tmp/tracker/orders\"");

		std::env::remove_var("TRACKER_TEST_DIR");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${TRACKER_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${TRACKER_MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.unwrap_err().to_string().contains("TRACKER_MISSING_VAR"));
	}

	#[test]
	fn test_empty_config_uses_defaults() {
		let config: Config = "".parse().unwrap();
		assert_eq!(config.tracker.id, "order-tracker");
		assert_eq!(config.simulation.grace_period_seconds, 30);
		assert_eq!(config.simulation.photo_review_seconds, 20);
		assert_eq!(config.simulation.delivery_duration_seconds, 60);
		assert_eq!(config.simulation.delivery_tick_seconds, 2);
		assert_eq!(config.simulation.estimated_arrival_minutes, 30);
		assert_eq!(config.storage.primary, "file");
		assert_eq!(config.checkout.placement_delay(), Duration::from_millis(1500));
		assert_eq!(config.checkout.bill_policy(), BillPolicy::default());
		assert_eq!(config.refund.default_amount, 44322);
	}

	#[test]
	fn test_partial_sections() {
		let config: Config = r#"
[simulation]
grace_period_seconds = 5

[storage]
primary = "memory"
[storage.implementations.memory]
"#
		.parse()
		.unwrap();

		assert_eq!(config.simulation.grace_period_seconds, 5);
		assert_eq!(config.simulation.photo_review_seconds, 20);
		assert_eq!(config.storage.primary, "memory");
	}

	#[test]
	fn test_rejects_zero_tick() {
		let result: Result<Config, _> = "[simulation]\ndelivery_tick_seconds = 0".parse();
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_rejects_unknown_primary_storage() {
		let result: Result<Config, _> = r#"
[storage]
primary = "redis"
[storage.implementations.memory]
"#
		.parse();
		let err = result.unwrap_err().to_string();
		assert!(err.contains("Primary storage 'redis'"));
	}

	#[test]
	fn test_rejects_unordered_refund_offsets() {
		let result: Result<Config, _> = r#"
[refund]
processing_after_ms = 4000
delivered_after_ms = 3000
"#
		.parse();
		assert!(result.is_err());
	}

	#[test]
	fn test_rejects_failure_rate_outside_unit_interval() {
		let result: Result<Config, _> = "[checkout]\nfailure_rate = 1.5".parse();
		assert!(matches!(result, Err(ConfigError::Validation(msg)) if msg.contains("failure_rate")));

		let config: Config = "[checkout]\nfailure_rate = 0.25".parse().unwrap();
		assert_eq!(config.checkout.failure_rate, 0.25);
	}
}
