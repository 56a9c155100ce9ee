//! Night-shift survival simulation core.
//!
//! A single-threaded, seed-deterministic game core: a night clock, a
//! draining power budget, four adversaries with their own state machines
//! and an office control panel, orchestrated by `GameSession`. The
//! presentation layer drives it with commands and `advance(dt)` and
//! listens to the events it emits.

pub mod types;
pub mod error;
pub mod config;
pub mod rng;
pub mod event;
pub mod command;
pub mod subsystem;
pub mod clock;
pub mod room_graph;
pub mod control_panel;
pub mod power_subsystem;
pub mod adversary;
pub mod adversary_subsystem;
pub mod outage_subsystem;
pub mod snapshot;
pub mod engine;

pub use command::{CommandOutcome, IgnoreReason, PlayerCommand};
pub use config::SessionConfig;
pub use engine::{GameSession, Outcome, SessionState};
pub use error::{SimError, SimResult};
pub use event::{CaptureCause, SimEvent};
pub use types::{Millis, Night, Side};
