//! Simulation controller: the single owner of [`ControllerState`].
//!
//! This type is a synchronous state machine. Operations that need the
//! service return a [`FetchRequest`]; the caller performs the I/O and hands
//! the outcome back through [`SimulationController::complete`]. Timing lives
//! in [`crate::runtime`], which asks [`SimulationController::timer_period`]
//! whether autoplay wants a timer.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::grid::{Grid, GridSet};
use crate::service::ServiceError;

pub const MIN_INTERVAL_MS: u32 = 50;
pub const MAX_INTERVAL_MS: u32 = 4000;
pub const DEFAULT_INTERVAL_MS: u32 = 500;
/// Interval multiplier for one `faster` step (division for `slower`).
pub const SPEED_FACTOR: f64 = 0.7;

/// Everything the shell renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerState {
    pub grids: GridSet,
    pub initial_loading: bool,
    pub fetching: bool,
    pub error: Option<String>,
    pub playing: bool,
    pub interval_ms: u32,
}

/// When a displayed error is cleared by a new load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClearPolicy {
    /// Cleared as soon as any request starts.
    OnStart,
    /// Kept until a request succeeds; a retry does not flash the loading view.
    #[default]
    OnSuccess,
}

/// What happens when requests complete out of issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// Whatever completes last is displayed.
    LastCompletedWins,
    /// A response older than the last applied one is dropped.
    #[default]
    DiscardStale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Faster,
    Slower,
}

impl Speed {
    pub fn apply(self, interval_ms: u32) -> u32 {
        let ms = f64::from(interval_ms);
        match self {
            Speed::Faster => ((ms * SPEED_FACTOR).round() as u32).max(MIN_INTERVAL_MS),
            Speed::Slower => ((ms / SPEED_FACTOR).round() as u32).min(MAX_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Initialize,
    Reset,
    Step,
    StepSingle,
    Tick,
}

impl FetchKind {
    /// Requests that compute a next generation from displayed grids.
    pub fn is_advance(self) -> bool {
        matches!(self, FetchKind::Step | FetchKind::StepSingle | FetchKind::Tick)
    }

    fn shows_loading(self) -> bool {
        matches!(self, FetchKind::Initialize | FetchKind::Reset)
    }

    pub fn label(self) -> &'static str {
        match self {
            FetchKind::Initialize => "initialize",
            FetchKind::Reset => "reset",
            FetchKind::Step => "step",
            FetchKind::StepSingle => "step_single",
            FetchKind::Tick => "tick",
        }
    }
}

/// Monotonically increasing request id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// A request the caller must send to the service.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub ticket: Ticket,
    pub kind: FetchKind,
    /// `None` asks for an initial grid set.
    pub payload: Option<GridSet>,
}

/// How a completed request affected the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Failed,
    /// Superseded or unknown; state flags updated, content untouched.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub initial_interval_ms: u32,
    pub error_clear: ErrorClearPolicy,
    pub ordering: ResponseOrdering,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            initial_interval_ms: DEFAULT_INTERVAL_MS,
            error_clear: ErrorClearPolicy::default(),
            ordering: ResponseOrdering::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: Ticket,
    kind: FetchKind,
    loading: bool,
    /// Response the payload was read from; advances are built on it.
    based_on: Option<Ticket>,
}

#[derive(Debug)]
pub struct SimulationController {
    state: ControllerState,
    options: ControllerOptions,
    next_ticket: u64,
    in_flight: Vec<InFlight>,
    last_applied: Option<Ticket>,
}

impl SimulationController {
    pub fn new(options: ControllerOptions) -> Self {
        Self {
            state: ControllerState {
                grids: Vec::new(),
                initial_loading: true,
                fetching: false,
                error: None,
                playing: false,
                interval_ms: options
                    .initial_interval_ms
                    .clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS),
            },
            options,
            next_ticket: 0,
            in_flight: Vec::new(),
            last_applied: None,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Autoplay period, or `None` when no timer should be armed.
    pub fn timer_period(&self) -> Option<Duration> {
        self.state
            .playing
            .then(|| Duration::from_millis(u64::from(self.state.interval_ms)))
    }

    pub fn advance_in_flight(&self) -> bool {
        self.in_flight.iter().any(|f| f.kind.is_advance())
    }

    pub fn initialize(&mut self) -> FetchRequest {
        self.begin(FetchKind::Initialize, None)
    }

    pub fn reset(&mut self) -> FetchRequest {
        self.begin(FetchKind::Reset, None)
    }

    /// Recovery from an error state; same request as [`Self::reset`].
    pub fn retry(&mut self) -> FetchRequest {
        info!(error = ?self.state.error, "retry requested");
        self.reset()
    }

    /// Advances every displayed grid. Refused while playing or fetching.
    pub fn step(&mut self) -> Option<FetchRequest> {
        if self.state.playing || self.state.fetching {
            debug!(
                playing = self.state.playing,
                fetching = self.state.fetching,
                "step ignored"
            );
            return None;
        }
        let payload = self.state.grids.clone();
        Some(self.begin(FetchKind::Step, Some(payload)))
    }

    /// Advances one clicked grid. Whatever the service returns replaces the
    /// whole displayed set.
    pub fn step_single(&mut self, grid: Grid) -> Option<FetchRequest> {
        if self.advance_in_flight() {
            debug!("step_single ignored: generation-advance already in flight");
            return None;
        }
        Some(self.begin(FetchKind::StepSingle, Some(vec![grid])))
    }

    /// Timer callback. Reads the grids as they are now.
    pub fn tick(&mut self) -> Option<FetchRequest> {
        if !self.state.playing || self.state.grids.is_empty() {
            return None;
        }
        if self.advance_in_flight() {
            debug!("tick skipped: generation-advance already in flight");
            return None;
        }
        let payload = self.state.grids.clone();
        Some(self.begin(FetchKind::Tick, Some(payload)))
    }

    /// Returns the new `playing` value.
    pub fn toggle_play(&mut self) -> bool {
        if self.state.playing {
            self.state.playing = false;
            info!("autoplay paused");
        } else if self.state.grids.is_empty() {
            info!("autoplay not started: no grids to advance");
        } else {
            self.state.playing = true;
            info!(interval_ms = self.state.interval_ms, "autoplay started");
        }
        self.state.playing
    }

    /// Returns the new interval.
    pub fn set_speed(&mut self, speed: Speed) -> u32 {
        let before = self.state.interval_ms;
        self.state.interval_ms = speed.apply(before);
        debug!(from = before, to = self.state.interval_ms, ?speed, "speed changed");
        self.state.interval_ms
    }

    fn begin(&mut self, kind: FetchKind, payload: Option<GridSet>) -> FetchRequest {
        if self.options.error_clear == ErrorClearPolicy::OnStart {
            self.state.error = None;
        }
        // A visible error keeps the content view; loading would hide it.
        let loading = kind.shows_loading() && self.state.error.is_none();

        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        self.in_flight.push(InFlight {
            ticket,
            kind,
            loading,
            based_on: self.last_applied,
        });
        self.sync_flags();

        debug!(
            ticket = ticket.0,
            kind = kind.label(),
            grids = payload.as_ref().map_or(0, Vec::len),
            "request started"
        );
        FetchRequest {
            ticket,
            kind,
            payload,
        }
    }

    /// Applies the outcome of a request started by this controller.
    pub fn complete(&mut self, ticket: Ticket, result: Result<GridSet, ServiceError>) -> Outcome {
        let Some(pos) = self.in_flight.iter().position(|f| f.ticket == ticket) else {
            warn!(ticket = ticket.0, "completion for unknown request ignored");
            return Outcome::Discarded;
        };
        let finished = self.in_flight.remove(pos);

        // An advance is also stale when another response replaced the grids
        // it was computed from, even if that response was issued earlier.
        let stale = self.options.ordering == ResponseOrdering::DiscardStale
            && (self.last_applied.is_some_and(|last| ticket < last)
                || (finished.kind.is_advance() && finished.based_on != self.last_applied));
        if stale {
            debug!(
                ticket = ticket.0,
                kind = finished.kind.label(),
                "stale response discarded"
            );
            self.sync_flags();
            return Outcome::Discarded;
        }

        let outcome = match result {
            Ok(grids) => {
                debug!(
                    ticket = ticket.0,
                    kind = finished.kind.label(),
                    grids = grids.len(),
                    "response applied"
                );
                self.state.grids = grids;
                self.state.error = None;
                self.last_applied = Some(ticket);
                if self.state.playing && self.state.grids.is_empty() {
                    warn!("service returned no grids; autoplay stopped");
                    self.state.playing = false;
                }
                Outcome::Applied
            }
            Err(e) => {
                warn!(
                    ticket = ticket.0,
                    kind = finished.kind.label(),
                    error_kind = e.kind(),
                    "request failed: {e}"
                );
                self.state.error = Some(e.to_string());
                for other in &mut self.in_flight {
                    other.loading = false;
                }
                Outcome::Failed
            }
        };
        self.sync_flags();
        outcome
    }

    fn sync_flags(&mut self) {
        self.state.fetching = !self.in_flight.is_empty();
        self.state.initial_loading = self.in_flight.iter().any(|f| f.loading);
    }
}
