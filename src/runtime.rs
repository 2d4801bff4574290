//! Runtime driving one assessment session
//!
//! Accepts user actions, runs at most one engine exchange at a time, and
//! hands the resulting directives to the presentation layer.

mod controller;
pub mod traits;


pub use controller::{SessionController, TurnError, TurnOutcome};
pub use traits::Presenter;

use crate::engine::{HttpEngine, LoggingEngine};
use crate::terminal::TerminalPresenter;
use std::sync::Arc;

/// Controller wired to the real engine and the terminal front-end
pub type ProductionController =
    SessionController<LoggingEngine<HttpEngine>, Arc<TerminalPresenter>>;
