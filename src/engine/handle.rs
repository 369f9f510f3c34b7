//! Engine handle - runs the tag engine on its own tokio task
//!
//! ```text
//! InputSource ──sample()──┐
//! EngineCommand (mpsc) ───┼──► TagEngine::tick ──► LoggedEvent (mpsc)
//! definitions (watch) ────┘                   └──► PlaybackRequest (mpsc)
//! ```
//!
//! The task ticks on a fixed interval independent of any UI frame rate and
//! is the only writer of engine state.

use super::TagEngine;
use crate::controller::sampler::InputSource;
use crate::event::{Roster, Team};
use crate::mapping::{AnalysisMode, EventDefinition};
use chrono::Local;
use egui::Key;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Inputs that arrive between ticks.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    KeyDown(Key),
    KeyUp(Key),
    FocusLost,
    SetMode(AnalysisMode),
    SetKeyboardEmulation(bool),
    SetRoster(Team, Roster),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("Engine task failed: {0}")]
    TaskError(String),
}

pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Spawns the engine loop ticking `tick_hz` times per second.
    pub fn spawn(
        engine: TagEngine,
        source: Box<dyn InputSource>,
        definitions: watch::Receiver<Vec<EventDefinition>>,
        tick_hz: u32,
    ) -> Result<Self, EngineError> {
        if tick_hz == 0 {
            return Err(EngineError::InitializationError(
                "tick rate must be at least 1 Hz".to_string(),
            ));
        }

        let (command_tx, command_rx) = mpsc::channel(256);
        let cancel = CancellationToken::new();
        let period = Duration::from_micros(1_000_000 / u64::from(tick_hz));

        info!("Spawning engine task with {:?} tick period", period);
        let task = tokio::spawn(run_engine_loop(
            engine,
            source,
            command_rx,
            definitions,
            cancel.clone(),
            period,
        ));

        Ok(Self {
            commands: command_tx,
            cancel,
            task,
        })
    }

    pub fn commands(&self) -> mpsc::Sender<EngineCommand> {
        self.commands.clone()
    }

    pub async fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .await
            .map_err(|e| EngineError::ChannelError(e.to_string()))
    }

    /// Stops the loop and waits for the task to finish.
    pub async fn shutdown(self) -> Result<(), EngineError> {
        info!("Stopping engine task");
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| EngineError::TaskError(e.to_string()))
    }
}

async fn run_engine_loop(
    mut engine: TagEngine,
    mut source: Box<dyn InputSource>,
    mut commands: mpsc::Receiver<EngineCommand>,
    mut definitions: watch::Receiver<Vec<EventDefinition>>,
    cancel: CancellationToken,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut commands_open = true;
    let mut definitions_open = true;

    // Stats for performance monitoring
    let mut ticks = 0u64;
    let mut slowest = Duration::ZERO;
    let mut last_stats_time = Local::now();
    let stats_interval = chrono::Duration::seconds(30);

    info!("Entering engine loop");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Engine loop cancelled");
                break;
            }
            _ = interval.tick() => {
                let started = Instant::now();
                let snapshot = source.sample();
                engine.tick(started, snapshot.as_ref());

                ticks += 1;
                slowest = slowest.max(started.elapsed());
                let now = Local::now();
                if now - last_stats_time > stats_interval {
                    debug!(
                        "Engine stats: {} ticks, slowest {:?}, {:?}",
                        ticks, slowest, engine
                    );
                    ticks = 0;
                    slowest = Duration::ZERO;
                    last_stats_time = now;
                }
            }
            command = commands.recv(), if commands_open => {
                match command {
                    Some(command) => engine.apply(command, Instant::now()),
                    None => {
                        warn!("Command channel closed");
                        commands_open = false;
                    }
                }
            }
            changed = definitions.changed(), if definitions_open => {
                match changed {
                    Ok(()) => {
                        let updated = definitions.borrow_and_update().clone();
                        engine.set_definitions(updated);
                    }
                    Err(e) => {
                        debug!("Definition channel closed: {}", e);
                        definitions_open = false;
                    }
                }
            }
        }
    }
}
