//! Night clock — owns the in-game hour.
//!
//! The hour only ever moves forward. Reaching the final hour emits
//! `NightComplete` once; after that the clock is inert until the
//! session builds a fresh one.

use crate::{
    config::ClockConfig,
    event::SimEvent,
    rng::SubsystemRng,
    subsystem::{SimSubsystem, TickFrame},
    types::{Millis, Night},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NightClock {
    pub hour:            u8,
    pub elapsed_in_hour: Millis,
    night:               Night,
    hour_duration_ms:    Millis,
    final_hour:          u8,
    complete:            bool,
}

impl NightClock {
    pub fn new(night: Night, config: &ClockConfig) -> Self {
        Self {
            hour: 0,
            elapsed_in_hour: 0,
            night,
            hour_duration_ms: config.hour_duration_ms,
            final_hour: config.final_hour,
            complete: false,
        }
    }

    /// Accumulate `dt`. Crossing an hour boundary bumps the hour and
    /// resets the accumulator; the final hour emits `NightComplete`.
    pub fn advance(&mut self, dt: Millis) -> Vec<SimEvent> {
        let mut events = Vec::new();
        if self.complete {
            return events;
        }
        self.elapsed_in_hour += dt;
        while self.elapsed_in_hour >= self.hour_duration_ms {
            self.elapsed_in_hour -= self.hour_duration_ms;
            self.hour += 1;
            events.push(SimEvent::HourChanged { hour: self.hour });
            if self.hour >= self.final_hour {
                self.complete = true;
                self.elapsed_in_hour = 0;
                events.push(SimEvent::NightComplete { night: self.night.index() });
                break;
            }
        }
        events
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Wall-clock style label: hour 0 is midnight.
    pub fn label(&self) -> String {
        match self.hour {
            0 => "12 AM".to_string(),
            h => format!("{h} AM"),
        }
    }
}

impl SimSubsystem for NightClock {
    fn name(&self) -> &'static str { "clock" }

    fn update(
        &mut self,
        frame: &TickFrame<'_>,
        _events_in: &[SimEvent],
        _rng: &mut SubsystemRng,
    ) -> Vec<SimEvent> {
        let events = self.advance(frame.dt_ms);
        if !events.is_empty() {
            log::debug!("tick={} clock: {} ({:?})", frame.tick, self.label(), events);
        }
        events
    }
}
