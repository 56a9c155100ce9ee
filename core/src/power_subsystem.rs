//! Power budget — the shared resource every control draws from.
//!
//! The draw rate is recomputed from the control panel on every tick:
//!   base + door_draw per closed door + light_draw per lit light
//!   + camera_draw while the camera view is up.
//!
//! `remaining` lives in [0, 100] and only goes down. Hitting zero emits
//! `PowerExhausted` exactly once; the session owns the outage transition.

use crate::{
    config::PowerConfig,
    control_panel::ControlPanel,
    event::SimEvent,
    rng::SubsystemRng,
    subsystem::{SimSubsystem, TickFrame},
    types::{Millis, Side},
};

/// In-game minutes per hour; the drain divisor is expressed in these.
const MINUTES_PER_HOUR: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct PowerBudget {
    remaining:        f64,
    draw_rate:        f64,
    hour_duration_ms: Millis,
    exhausted:        bool,
    config:           PowerConfig,
}

impl PowerBudget {
    pub fn new(config: &PowerConfig, hour_duration_ms: Millis) -> Self {
        Self {
            remaining: config.initial.clamp(0.0, 100.0),
            draw_rate: config.base_draw,
            hour_duration_ms,
            exhausted: false,
            config: config.clone(),
        }
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn draw_rate(&self) -> f64 {
        self.draw_rate
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Draw implied by the current panel state.
    pub fn draw_for(&self, panel: &ControlPanel) -> f64 {
        let doors = Side::BOTH.iter().filter(|s| panel.door_closed(**s)).count() as f64;
        let lights = Side::BOTH.iter().filter(|s| panel.light_on(**s)).count() as f64;
        let camera = if panel.camera_open() { self.config.camera_draw } else { 0.0 };
        self.config.base_draw
            + doors * self.config.door_draw
            + lights * self.config.light_draw
            + camera
    }

    /// Usage meter shown on the HUD: one bar plus one per active source, max five.
    pub fn usage_level(panel: &ControlPanel) -> u8 {
        let sources = Side::BOTH.iter().filter(|s| panel.door_closed(**s)).count()
            + Side::BOTH.iter().filter(|s| panel.light_on(**s)).count()
            + usize::from(panel.camera_open());
        (1 + sources).min(5) as u8
    }

    /// Drain for `dt` of simulated time at the panel's current draw.
    pub fn tick(&mut self, dt: Millis, panel: &ControlPanel) -> Option<SimEvent> {
        self.draw_rate = self.draw_for(panel);
        if self.exhausted {
            return None;
        }
        let minutes = dt as f64 / self.hour_duration_ms as f64 * MINUTES_PER_HOUR;
        let drain = self.draw_rate * 100.0 * minutes / self.config.drain_divisor;
        self.set_remaining(self.remaining - drain)
    }

    /// Discrete deduction, e.g. a charge absorbed by a closed door.
    pub fn apply_penalty(&mut self, amount: f64) -> Option<SimEvent> {
        if amount < 0.0 {
            crate::invariant_violation!("negative power penalty {amount}");
            return None;
        }
        self.set_remaining(self.remaining - amount)
    }

    /// Overwrite the remaining charge, clamped to [0, 100].
    pub fn set_remaining(&mut self, value: f64) -> Option<SimEvent> {
        self.remaining = value.clamp(0.0, 100.0);
        if self.remaining <= 0.0 && !self.exhausted {
            self.exhausted = true;
            return Some(SimEvent::PowerExhausted);
        }
        None
    }
}

impl SimSubsystem for PowerBudget {
    fn name(&self) -> &'static str { "power" }

    fn update(
        &mut self,
        frame: &TickFrame<'_>,
        _events_in: &[SimEvent],
        _rng: &mut SubsystemRng,
    ) -> Vec<SimEvent> {
        let exhausted = self.tick(frame.dt_ms, frame.panel);
        if let Some(event) = &exhausted {
            log::info!("tick={} power: exhausted at draw {:.1} ({event:?})", frame.tick, self.draw_rate);
        }
        exhausted.into_iter().collect()
    }
}
