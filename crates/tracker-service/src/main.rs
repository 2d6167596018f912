//! Main entry point for the order tracker.
//!
//! A console front end over the tracker engine: place the demo order,
//! follow it through its lifecycle, cancel it and watch the refund.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracker_config::Config;
use tracker_core::{TrackerBuilder, TrackerEngine};
use tracker_storage::implementations::file::create_storage as create_file_storage;
use tracker_storage::implementations::memory::create_storage as create_memory_storage;
use tracker_types::{format_currency, SimulationStage};

mod console;

use console::ConsoleNavigator;

/// Command-line arguments for the tracker.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file; built-in defaults are used when it is missing
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Place the demo order and follow it until delivery
	Place,
	/// Follow an order until it is delivered
	Track {
		order_id: String,
		/// Approve the packing photo as soon as it is shown
		#[arg(long, conflicts_with = "reject_photo")]
		accept_photo: bool,
		/// Reject the packing photo as soon as it is shown
		#[arg(long)]
		reject_photo: bool,
	},
	/// Print the stored state of an order
	Status { order_id: String },
	/// Forget the stored state of an order
	Reset { order_id: String },
	/// Cancel an order
	Cancel {
		order_id: String,
		/// Reason id, see `reasons`
		#[arg(long)]
		reason: String,
		/// Free-form reason, required for `other`
		#[arg(long)]
		custom: Option<String>,
		/// Refund amount in minor units
		#[arg(long)]
		amount: Option<u64>,
	},
	/// Follow the refund of a cancelled order
	Refund {
		order_id: String,
		/// Refund amount in minor units
		#[arg(long)]
		amount: Option<u64>,
	},
	/// List the cancellation reasons
	Reasons,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.init();

	let config = load_config(&args.config).await?;
	tracing::info!("Loaded configuration [{}]", config.tracker.id);

	let engine = build_engine(config)?;
	engine.initialize().await?;

	let result = run(&engine, args.command).await;

	engine.shutdown().await?;
	result
}

async fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
	if tokio::fs::try_exists(path).await? {
		Ok(Config::from_file(path).await?)
	} else {
		tracing::info!(path = %path.display(), "No configuration file, using defaults");
		Ok(Config::default())
	}
}

/// Creates a factory map keyed by implementation name.
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

fn build_engine(config: Config) -> Result<TrackerEngine, Box<dyn std::error::Error>> {
	let storage_factories = create_factory_map!(
		tracker_storage::StorageInterface,
		tracker_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	Ok(TrackerBuilder::new(config).build(storage_factories, Arc::new(ConsoleNavigator))?)
}

async fn run(engine: &TrackerEngine, command: Command) -> Result<(), Box<dyn std::error::Error>> {
	match command {
		Command::Place => {
			let checkout = engine.checkout();
			println!(
				"{}",
				console::render_checkout(checkout.cart(), &checkout.bill_summary())
			);
			println!("Paying by {}", checkout.payment());

			let order_id = engine.place_order(&checkout).await?;
			println!("Order placed: {}", order_id);
			if engine.confirm_order(&order_id).await.is_none() {
				return Ok(());
			}
			follow(engine, &order_id, PhotoDecision::Wait).await
		},
		Command::Track {
			order_id,
			accept_photo,
			reject_photo,
		} => {
			let decision = if accept_photo {
				PhotoDecision::Accept
			} else if reject_photo {
				PhotoDecision::Reject
			} else {
				PhotoDecision::Wait
			};
			follow(engine, &order_id, decision).await
		},
		Command::Status { order_id } => {
			match engine.snapshot(&order_id).await? {
				Some(state) => {
					println!(
						"{}",
						console::render_tracking(&order_id, &state, engine.config())
					)
				},
				None => println!("No state stored for {}", order_id),
			}
			if let Some(request) = engine.cancellation(&order_id).await? {
				println!("Cancelled ({}) at {}", request.reason, request.timestamp);
			}
			Ok(())
		},
		Command::Reset { order_id } => {
			engine.reset(&order_id).await?;
			println!("Cleared {}", order_id);
			Ok(())
		},
		Command::Cancel {
			order_id,
			reason,
			custom,
			amount,
		} => {
			let request = engine
				.cancel(&order_id, &reason, custom.as_deref(), amount)
				.await?;
			let amount = amount.unwrap_or(engine.config().refund.default_amount);
			println!(
				"Cancelled {} ({}). Refund of {} initiated.",
				request.order_id,
				request.reason,
				format_currency(amount)
			);
			Ok(())
		},
		Command::Refund { order_id, amount } => {
			let amount = amount.unwrap_or(engine.config().refund.default_amount);
			let mut refund = engine.track_refund(&order_id);
			let mut updates = refund.subscribe();
			println!(
				"{}",
				console::render_refund(&order_id, amount, &refund.progress())
			);
			while updates.changed().await.is_ok() {
				let progress = *updates.borrow_and_update();
				println!("{}", console::render_refund(&order_id, amount, &progress));
				if progress.is_completed {
					break;
				}
			}
			refund.completed().await;
			Ok(())
		},
		Command::Reasons => {
			println!("{}", console::render_reasons());
			Ok(())
		},
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhotoDecision {
	Wait,
	Accept,
	Reject,
}

/// Prints the tracking screen on every change until delivery, a hand-off or Ctrl+C.
async fn follow(
	engine: &TrackerEngine,
	order_id: &str,
	decision: PhotoDecision,
) -> Result<(), Box<dyn std::error::Error>> {
	let handle = engine.track(order_id).await;
	let mut updates = handle.subscribe();
	let mut last_stage = None;

	loop {
		let state = updates.borrow_and_update().clone();
		println!(
			"{}\n",
			console::render_tracking(order_id, &state, engine.config())
		);

		if state.stage == SimulationStage::Delivered {
			engine.order_again();
			return Ok(());
		}

		if state.stage == SimulationStage::PhotoReview && last_stage != Some(state.stage) {
			match decision {
				PhotoDecision::Accept => {
					engine.accept_photo(order_id).await?;
				},
				PhotoDecision::Reject => {
					if engine.reject_photo(order_id).await?.is_some() {
						return Ok(());
					}
				},
				PhotoDecision::Wait => {},
			}
		}
		last_stage = Some(state.stage);

		tokio::select! {
			changed = updates.changed() => {
				if changed.is_err() {
					tracing::warn!("Simulation stopped");
					return Ok(());
				}
			}
			_ = tokio::signal::ctrl_c() => {
				tracing::info!("Interrupted");
				return Ok(());
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn test_args_defaults() {
		let args = Args::try_parse_from(["tracker", "reasons"]).unwrap();

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
		assert!(matches!(args.command, Command::Reasons));
	}

	#[test]
	fn test_args_track_flags() {
		let args = Args::try_parse_from([
			"tracker",
			"-l",
			"debug",
			"track",
			"ORD-2026-1",
			"--accept-photo",
		])
		.unwrap();

		assert_eq!(args.log_level, "debug");
		match args.command {
			Command::Track {
				order_id,
				accept_photo,
				reject_photo,
			} => {
				assert_eq!(order_id, "ORD-2026-1");
				assert!(accept_photo);
				assert!(!reject_photo);
			},
			other => panic!("unexpected command {:?}", other),
		}

		assert!(Args::try_parse_from([
			"tracker",
			"track",
			"A",
			"--accept-photo",
			"--reject-photo"
		])
		.is_err());
	}

	#[test]
	fn test_args_cancel() {
		let args = Args::try_parse_from([
			"tracker", "cancel", "A", "--reason", "other", "--custom", "late", "--amount", "100",
		])
		.unwrap();

		match args.command {
			Command::Cancel {
				reason,
				custom,
				amount,
				..
			} => {
				assert_eq!(reason, "other");
				assert_eq!(custom.as_deref(), Some("late"));
				assert_eq!(amount, Some(100));
			},
			other => panic!("unexpected command {:?}", other),
		}
	}

	#[test]
	fn test_create_factory_map_macro() {
		let factories = create_factory_map!(
			tracker_storage::StorageInterface,
			tracker_storage::StorageError,
			"memory" => create_memory_storage,
			"file" => create_file_storage,
		);

		assert_eq!(factories.len(), 2);
		assert!(factories.contains_key("memory"));
		assert!(factories.contains_key("file"));
	}

	#[tokio::test]
	async fn test_missing_config_uses_defaults() {
		let dir = tempdir().unwrap();
		let config = load_config(&dir.path().join("absent.toml")).await.unwrap();
		assert_eq!(config.tracker.id, "order-tracker");
	}

	#[tokio::test]
	async fn test_build_engine_with_file_storage() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(
			&path,
			format!(
				"[storage]\nprimary = \"file\"\n[storage.implementations.file]\nstorage_path = \"{}\"\n",
				dir.path().join("orders").display()
			),
		)
		.unwrap();

		let engine = build_engine(load_config(&path).await.unwrap()).unwrap();
		engine.track("ORD-2026-1").await;
		assert_eq!(
			engine.list_orders().await.unwrap(),
			vec!["ORD-2026-1".to_string()]
		);
		engine.shutdown().await.unwrap();
	}
}
