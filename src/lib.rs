#[path = "core/grid.rs"]
pub mod grid;

#[path = "core/normalize.rs"]
pub mod normalize;

#[path = "core/service.rs"]
pub mod service;

#[path = "core/controller.rs"]
pub mod controller;

#[path = "core/runtime.rs"]
pub mod runtime;

pub mod config;

pub use controller::{ControllerState, SimulationController, Speed};
pub use grid::{Grid, GridSet};
pub use normalize::normalize;
pub use service::{GridService, HttpGridService, ServiceError};
