//! Event loop driving a [`SimulationController`].
//!
//! One task owns the controller and is the only writer of its state. It
//! reacts to three event sources:
//! - shell intents arriving over an mpsc channel,
//! - completed service requests (a `JoinSet` of spawned fetches),
//! - the autoplay timer, armed and disarmed explicitly after every event.
//!
//! Each processed event publishes a fresh [`ControllerState`] on a watch
//! channel for the shell to render.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinHandle, JoinSet};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::controller::{
    ControllerOptions, ControllerState, FetchRequest, Speed, SimulationController, Ticket,
};
use crate::grid::{Grid, GridSet};
use crate::service::{GridService, ServiceError};

/// User intents accepted by the controller task.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Initialize,
    Step,
    StepSingle(Grid),
    /// Click on the grid at this index of the current state.
    Click(usize),
    Reset,
    TogglePlay,
    SetSpeed(Speed),
    Retry,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("controller task has stopped")]
pub struct ControllerClosed;

/// Shell-side access: send intents, read state.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    intents: mpsc::Sender<Intent>,
    state: watch::Receiver<ControllerState>,
}

impl ControllerHandle {
    pub async fn send(&self, intent: Intent) -> Result<(), ControllerClosed> {
        self.intents.send(intent).await.map_err(|_| ControllerClosed)
    }

    /// Latest published state.
    pub fn state(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state.clone()
    }

    pub async fn initialize(&self) -> Result<(), ControllerClosed> {
        self.send(Intent::Initialize).await
    }

    pub async fn step(&self) -> Result<(), ControllerClosed> {
        self.send(Intent::Step).await
    }

    pub async fn step_single(&self, grid: Grid) -> Result<(), ControllerClosed> {
        self.send(Intent::StepSingle(grid)).await
    }

    pub async fn click(&self, index: usize) -> Result<(), ControllerClosed> {
        self.send(Intent::Click(index)).await
    }

    pub async fn reset(&self) -> Result<(), ControllerClosed> {
        self.send(Intent::Reset).await
    }

    pub async fn toggle_play(&self) -> Result<(), ControllerClosed> {
        self.send(Intent::TogglePlay).await
    }

    pub async fn set_speed(&self, speed: Speed) -> Result<(), ControllerClosed> {
        self.send(Intent::SetSpeed(speed)).await
    }

    pub async fn retry(&self) -> Result<(), ControllerClosed> {
        self.send(Intent::Retry).await
    }

    pub async fn shutdown(&self) -> Result<(), ControllerClosed> {
        self.send(Intent::Shutdown).await
    }
}

/// Recurring autoplay timer. Dropping it cancels the pending tick.
struct Ticker {
    interval: Interval,
    period: Duration,
}

impl Ticker {
    /// First tick one full period from now, then every `period`.
    fn arm(period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval, period }
    }
}

async fn next_tick(ticker: &mut Option<Ticker>) {
    match ticker {
        Some(t) => {
            t.interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

pub struct ControllerRuntime<S> {
    controller: SimulationController,
    service: Arc<S>,
    in_flight: JoinSet<Result<GridSet, ServiceError>>,
    tickets: HashMap<task::Id, Ticket>,
    ticker: Option<Ticker>,
    intents: mpsc::Receiver<Intent>,
    published: watch::Sender<ControllerState>,
}

/// Starts the controller task. Call [`ControllerHandle::initialize`] to
/// issue the first load.
pub fn spawn<S>(service: Arc<S>, options: ControllerOptions) -> (ControllerHandle, JoinHandle<()>)
where
    S: GridService + 'static,
{
    let (runtime, handle) = ControllerRuntime::new(service, options);
    (handle, tokio::spawn(runtime.run()))
}

impl<S> ControllerRuntime<S>
where
    S: GridService + 'static,
{
    pub fn new(service: Arc<S>, options: ControllerOptions) -> (Self, ControllerHandle) {
        let controller = SimulationController::new(options);
        let (intent_tx, intent_rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(controller.state().clone());
        let runtime = Self {
            controller,
            service,
            in_flight: JoinSet::new(),
            tickets: HashMap::new(),
            ticker: None,
            intents: intent_rx,
            published: state_tx,
        };
        let handle = ControllerHandle {
            intents: intent_tx,
            state: state_rx,
        };
        (runtime, handle)
    }

    pub async fn run(mut self) {
        info!("controller started");
        loop {
            tokio::select! {
                intent = self.intents.recv() => match intent {
                    Some(Intent::Shutdown) | None => break,
                    Some(intent) => self.apply(intent),
                },
                Some(joined) = self.in_flight.join_next_with_id(), if !self.in_flight.is_empty() => {
                    self.finish(joined);
                }
                _ = next_tick(&mut self.ticker), if self.ticker.is_some() => {
                    if let Some(req) = self.controller.tick() {
                        self.dispatch(req);
                    }
                }
            }
            self.reconcile_timer();
            self.publish();
        }

        self.ticker = None;
        self.in_flight.abort_all();
        info!("controller stopped");
    }

    fn apply(&mut self, intent: Intent) {
        debug!(?intent, "intent");
        let request = match intent {
            Intent::Initialize => Some(self.controller.initialize()),
            Intent::Reset => Some(self.controller.reset()),
            Intent::Retry => Some(self.controller.retry()),
            Intent::Step => self.controller.step(),
            Intent::StepSingle(grid) => self.controller.step_single(grid),
            Intent::Click(index) => match self.controller.state().grids.get(index).cloned() {
                Some(grid) => self.controller.step_single(grid),
                None => {
                    warn!(index, "click on a grid that is not displayed");
                    None
                }
            },
            Intent::TogglePlay => {
                self.controller.toggle_play();
                None
            }
            Intent::SetSpeed(speed) => {
                self.controller.set_speed(speed);
                None
            }
            Intent::Shutdown => None,
        };
        if let Some(req) = request {
            self.dispatch(req);
        }
    }

    fn dispatch(&mut self, req: FetchRequest) {
        let service = Arc::clone(&self.service);
        let FetchRequest { ticket, payload, .. } = req;
        let abort = self
            .in_flight
            .spawn(async move { service.fetch_next(payload).await });
        self.tickets.insert(abort.id(), ticket);
    }

    fn finish(
        &mut self,
        joined: Result<(task::Id, Result<GridSet, ServiceError>), task::JoinError>,
    ) {
        let (id, result) = match joined {
            Ok((id, result)) => (id, result),
            Err(e) => {
                error!("request task failed: {e}");
                let message = format!("request task failed: {e}");
                (e.id(), Err(ServiceError::Transport(message)))
            }
        };
        match self.tickets.remove(&id) {
            Some(ticket) => {
                self.controller.complete(ticket, result);
            }
            None => warn!(?id, "finished task has no ticket"),
        }
    }

    /// Arms, rearms or disarms the timer to match the controller.
    fn reconcile_timer(&mut self) {
        let wanted = self.controller.timer_period();
        match (&self.ticker, wanted) {
            (None, Some(period)) => {
                info!(period_ms = period.as_millis() as u64, "autoplay timer armed");
                self.ticker = Some(Ticker::arm(period));
            }
            (Some(current), Some(period)) if current.period != period => {
                info!(period_ms = period.as_millis() as u64, "autoplay timer rearmed");
                self.ticker = Some(Ticker::arm(period));
            }
            (Some(_), None) => {
                info!("autoplay timer disarmed");
                self.ticker = None;
            }
            _ => {}
        }
    }

    fn publish(&self) {
        let next = self.controller.state();
        self.published.send_if_modified(|current| {
            if *current == *next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
    }
}
