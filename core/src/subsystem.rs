//! Stage trait and per-frame inputs.
//!
//! RULE: Every stage of the night implements SimSubsystem.
//! The session calls update() on each stage in a fixed order,
//! Clock → Power → Adversary, once per due period.
//! Stages never call each other; they read the frame and the events
//! emitted earlier in the same frame, and return new events.

use crate::{
    control_panel::ControlPanel,
    event::SimEvent,
    rng::SubsystemRng,
    types::{Millis, Night, Tick},
};

/// Read-only view of the session handed to every stage.
#[derive(Debug, Clone, Copy)]
pub struct TickFrame<'a> {
    pub tick: Tick,
    /// Simulated time since the night started.
    pub now_ms: Millis,
    /// Time covered by this update.
    pub dt_ms: Millis,
    pub night: Night,
    pub hour: u8,
    pub panel: &'a ControlPanel,
}

/// The contract every stage must fulfill.
pub trait SimSubsystem {
    /// Unique stable name for this stage.
    fn name(&self) -> &'static str;

    /// Called by the session each time this stage's period elapses.
    ///
    /// - `frame`:     clock, night and control state as of this update
    /// - `events_in`: events emitted by earlier stages this frame
    /// - `rng`:       this stage's deterministic RNG for this frame
    fn update(
        &mut self,
        frame: &TickFrame<'_>,
        events_in: &[SimEvent],
        rng: &mut SubsystemRng,
    ) -> Vec<SimEvent>;
}
