//! Timer driver for a running order simulation.
//!
//! Each tracked order gets one task. The task owns the simulation and at
//! most one `Interval`, chosen from the current stage. Timer ticks and user
//! commands are handled in the same `select!` loop, so they never race.

use crate::engine::event_bus::EventBus;
use crate::handlers::OrderSimulation;
use crate::state::{Delegation, SimulationInput, Transition};
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracker_types::{
	truncate_id, Route, SimulationEvent, SimulationStage, SimulationState, TrackerEvent,
};

const COMMAND_BUFFER: usize = 16;

/// Errors returned by a simulation handle.
#[derive(Debug, Error)]
pub enum SimulationError {
	#[error("Simulation for order {0} is not running")]
	Stopped(String),
}

/// A user action on a tracked order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationAction {
	AcceptPhoto,
	RejectPhoto,
	EditOrder,
	CancelOrder,
}

/// What an action did.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
	pub state: SimulationState,
	/// Route to open when the action was handed off to another flow.
	pub route: Option<Route>,
}

enum SimulationCommand {
	Act {
		action: SimulationAction,
		reply: oneshot::Sender<ActionOutcome>,
	},
	Shutdown,
}

/// Runs one simulation until shut down.
pub struct SimulationDriver {
	simulation: OrderSimulation,
	commands: mpsc::Receiver<SimulationCommand>,
	state: watch::Sender<SimulationState>,
	event_bus: EventBus,
}

impl SimulationDriver {
	/// Spawns the driver task for an initialized simulation.
	pub fn spawn(simulation: OrderSimulation, event_bus: EventBus) -> RunningSimulation {
		let order_id = simulation.order_id().to_string();
		let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
		let (state_tx, state_rx) = watch::channel(simulation.state().clone());

		let driver = Self {
			simulation,
			commands: command_rx,
			state: state_tx,
			event_bus,
		};
		let task = tokio::spawn(driver.run());

		RunningSimulation {
			handle: SimulationHandle {
				order_id,
				commands: command_tx,
				state: state_rx,
			},
			task: Some(task),
		}
	}

	async fn run(mut self) {
		let mut timer = self.arm();

		loop {
			tokio::select! {
				_ = next_tick(&mut timer) => {
					let result = self.simulation.tick().await;
					if self.publish(&result) {
						timer = self.arm();
					}
				}
				command = self.commands.recv() => match command {
					Some(SimulationCommand::Act { action, reply }) => {
						let (result, route) = self.act(action).await;
						if self.publish(&result) {
							timer = self.arm();
						}
						let outcome = ActionOutcome {
							state: result.state,
							route,
						};
						if reply.send(outcome).is_err() {
							tracing::debug!("Action caller went away before the reply");
						}
					}
					Some(SimulationCommand::Shutdown) | None => break,
				}
			}
		}

		tracing::debug!(
			order_id = %truncate_id(self.simulation.order_id()),
			"Simulation driver stopped"
		);
	}

	async fn act(&mut self, action: SimulationAction) -> (Transition, Option<Route>) {
		let simulation = &mut self.simulation;
		let result = match action {
			SimulationAction::AcceptPhoto => simulation.accept_photo().await,
			SimulationAction::RejectPhoto => simulation.apply(SimulationInput::RejectPhoto).await,
			SimulationAction::EditOrder => simulation.apply(SimulationInput::EditOrder).await,
			SimulationAction::CancelOrder => simulation.apply(SimulationInput::CancelOrder).await,
		};
		let route = result
			.delegation
			.map(|delegation| delegation.route(simulation.order_id()));
		(result, route)
	}

	/// Arms the timer for the current stage. Delivered orders get none.
	fn arm(&self) -> Option<Interval> {
		let period = self.simulation.params().tick_period(self.simulation.stage())?;
		let mut interval = interval_at(Instant::now() + period, period);
		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
		Some(interval)
	}

	/// Publishes events for a transition. Returns true when the stage changed.
	fn publish(&self, result: &Transition) -> bool {
		let order_id = self.simulation.order_id().to_string();

		if result.delegation == Some(Delegation::PhotoRejected) {
			self.event_bus
				.publish(TrackerEvent::Simulation(SimulationEvent::PhotoRejected {
					order_id: order_id.clone(),
				}));
		}

		if !result.changed {
			return false;
		}

		self.state.send_replace(result.state.clone());

		if !result.stage_changed() {
			self.event_bus
				.publish(TrackerEvent::Simulation(SimulationEvent::Updated {
					order_id,
					state: result.state.clone(),
				}));
			return false;
		}

		self.event_bus
			.publish(TrackerEvent::Simulation(SimulationEvent::StageChanged {
				order_id: order_id.clone(),
				from: result.from,
				to: result.state.stage,
				state: result.state.clone(),
			}));

		if result.state.stage == SimulationStage::Delivered {
			self.event_bus
				.publish(TrackerEvent::Simulation(SimulationEvent::Finished { order_id }));
		}
		true
	}
}

async fn next_tick(timer: &mut Option<Interval>) {
	match timer {
		Some(interval) => {
			interval.tick().await;
		},
		None => std::future::pending().await,
	}
}

/// Cloneable handle for talking to a running simulation.
#[derive(Clone)]
pub struct SimulationHandle {
	order_id: String,
	commands: mpsc::Sender<SimulationCommand>,
	state: watch::Receiver<SimulationState>,
}

impl SimulationHandle {
	pub fn order_id(&self) -> &str {
		&self.order_id
	}

	/// Latest state published by the driver.
	pub fn state(&self) -> SimulationState {
		self.state.borrow().clone()
	}

	/// Receiver that is notified on every state change.
	pub fn subscribe(&self) -> watch::Receiver<SimulationState> {
		self.state.clone()
	}

	/// Sends an action to the driver and waits for its outcome.
	pub async fn act(&self, action: SimulationAction) -> Result<ActionOutcome, SimulationError> {
		let (reply, outcome) = oneshot::channel();
		self.commands
			.send(SimulationCommand::Act { action, reply })
			.await
			.map_err(|_| SimulationError::Stopped(self.order_id.clone()))?;
		outcome
			.await
			.map_err(|_| SimulationError::Stopped(self.order_id.clone()))
	}

	pub async fn accept_photo(&self) -> Result<SimulationState, SimulationError> {
		Ok(self.act(SimulationAction::AcceptPhoto).await?.state)
	}

	pub async fn reject_photo(&self) -> Result<Option<Route>, SimulationError> {
		Ok(self.act(SimulationAction::RejectPhoto).await?.route)
	}

	pub async fn edit_order(&self) -> Result<Option<Route>, SimulationError> {
		Ok(self.act(SimulationAction::EditOrder).await?.route)
	}

	pub async fn cancel_order(&self) -> Result<Option<Route>, SimulationError> {
		Ok(self.act(SimulationAction::CancelOrder).await?.route)
	}
}

/// Owner of a driver task. Dropping it aborts the task.
pub struct RunningSimulation {
	handle: SimulationHandle,
	task: Option<JoinHandle<()>>,
}

impl RunningSimulation {
	pub fn handle(&self) -> &SimulationHandle {
		&self.handle
	}

	pub fn is_finished(&self) -> bool {
		self.task.as_ref().is_none_or(|task| task.is_finished())
	}

	/// Stops the driver and waits for its task to exit.
	///
	/// When the command queue is full the task is aborted instead of
	/// waiting for it to drain.
	pub async fn shutdown(mut self) {
		let Some(task) = self.task.take() else {
			return;
		};
		let order_id = truncate_id(&self.handle.order_id);

		match self.handle.commands.try_send(SimulationCommand::Shutdown) {
			Ok(()) => {},
			Err(TrySendError::Full(_)) => {
				tracing::debug!(
					order_id = %order_id,
					"Command queue full, aborting simulation driver"
				);
				task.abort();
			},
			// Receiver gone: the task already left its loop.
			Err(TrySendError::Closed(_)) => {},
		}

		match task.await {
			Ok(()) => {},
			Err(e) if e.is_cancelled() => {},
			Err(e) => {
				tracing::warn!(
					order_id = %order_id,
					error = %e,
					"Simulation driver exited abnormally"
				);
			},
		}
	}
}

impl Drop for RunningSimulation {
	fn drop(&mut self) {
		if let Some(task) = self.task.take() {
			task.abort();
		}
	}
}
