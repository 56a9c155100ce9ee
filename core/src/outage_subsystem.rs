//! Power outage sequence — the only unconditional capture.
//!
//! Entered once, when the power budget runs dry:
//!   1. Grace: a fixed quiet period after the lights go out.
//!   2. Countdown: a random 5–20 s wait, drawn when the grace ends.
//!   3. Capture by the special case's blackout variant.
//!
//! The sequence is owned by the session; tearing the session down drops
//! it, and with it any capture still pending.

use crate::{
    config::OutageConfig,
    event::{AudioCue, CaptureCause, SimEvent},
    rng::SubsystemRng,
    subsystem::{SimSubsystem, TickFrame},
    types::{AdversaryId, Countdown, Millis},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutagePhase {
    Grace(Countdown),
    Countdown(Countdown),
    Done,
}

#[derive(Debug, Clone)]
pub struct OutageSequence {
    phase:   OutagePhase,
    config:  OutageConfig,
    stalker: AdversaryId,
    overrun: Millis,
}

impl OutageSequence {
    pub fn new(config: &OutageConfig, stalker: AdversaryId) -> Self {
        Self {
            phase: OutagePhase::Grace(Countdown::new(config.grace_ms)),
            config: config.clone(),
            stalker,
            overrun: 0,
        }
    }

    pub fn phase(&self) -> OutagePhase {
        self.phase
    }

    /// Part of the last update's `dt` that fell after the capture.
    pub fn overrun(&self) -> Millis {
        self.overrun
    }
}

impl SimSubsystem for OutageSequence {
    fn name(&self) -> &'static str { "outage" }

    /// Time left over when a phase ends carries into the next one, so the
    /// capture lands at the same instant whatever the frame length.
    fn update(
        &mut self,
        frame: &TickFrame<'_>,
        _events_in: &[SimEvent],
        rng: &mut SubsystemRng,
    ) -> Vec<SimEvent> {
        let mut events = Vec::new();
        let mut dt = frame.dt_ms;
        loop {
            match self.phase {
                OutagePhase::Grace(mut grace) => match grace.consume(dt) {
                    Some(left) => {
                        let wait = rng.millis_between(
                            self.config.countdown_min_ms,
                            self.config.countdown_max_ms,
                        );
                        log::info!("tick={} outage: countdown of {wait} ms begins", frame.tick);
                        self.phase = OutagePhase::Countdown(Countdown::new(wait));
                        events.push(SimEvent::AudioCue { cue: AudioCue::BlackoutMusic });
                        dt = left;
                    }
                    None => {
                        self.phase = OutagePhase::Grace(grace);
                        return events;
                    }
                },
                OutagePhase::Countdown(mut countdown) => match countdown.consume(dt) {
                    Some(left) => {
                        self.phase = OutagePhase::Done;
                        self.overrun = left;
                        events.push(SimEvent::PlayerCaught {
                            adversary: self.stalker.clone(),
                            cause: CaptureCause::Blackout,
                        });
                        events.push(SimEvent::AudioCue { cue: AudioCue::Jumpscare });
                        return events;
                    }
                    None => {
                        self.phase = OutagePhase::Countdown(countdown);
                        return events;
                    }
                },
                OutagePhase::Done => return events,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::control_panel::ControlPanel;
    use crate::rng::{RngBank, SubsystemSlot};
    use crate::types::Night;

    #[test]
    fn capture_lands_inside_the_countdown_window() {
        let config = SessionConfig::default();
        let panel = ControlPanel::new("show_stage".into());
        for seed in 0..25u64 {
            let bank = RngBank::new(seed, Night::new(1));
            let mut outage = OutageSequence::new(&config.outage, "dash".into());
            let mut elapsed = 0;
            let mut caught_at = None;
            for tick in 0..400u64 {
                elapsed += 100;
                let frame = TickFrame {
                    tick,
                    now_ms: elapsed,
                    dt_ms: 100,
                    night: Night::new(1),
                    hour: 2,
                    panel: &panel,
                };
                let mut rng = bank.for_subsystem_at_tick(SubsystemSlot::Outage, tick);
                let events = outage.update(&frame, &[], &mut rng);
                if events.iter().any(|e| matches!(e, SimEvent::PlayerCaught { cause: CaptureCause::Blackout, .. })) {
                    caught_at = Some(elapsed);
                    break;
                }
            }
            let caught_at = caught_at.expect("outage must always end in a capture");
            assert!(
                (3_000 + 5_000..=3_000 + 20_000).contains(&caught_at),
                "seed {seed}: capture at {caught_at} ms is outside the window"
            );
            assert_eq!(outage.phase(), OutagePhase::Done);
        }
    }

    #[test]
    fn one_long_update_catches_at_the_same_instant() {
        let config = SessionConfig::default();
        let panel = ControlPanel::new("show_stage".into());
        let bank = RngBank::new(11, Night::new(1));
        let frame = |dt_ms| TickFrame {
            tick: 0,
            now_ms: 0,
            dt_ms,
            night: Night::new(1),
            hour: 2,
            panel: &panel,
        };

        let mut stepped = OutageSequence::new(&config.outage, "dash".into());
        let mut elapsed = 0;
        loop {
            elapsed += 100;
            let mut rng = bank.for_subsystem_at_tick(SubsystemSlot::Outage, 0);
            let events = stepped.update(&frame(100), &[], &mut rng);
            if events.iter().any(|e| matches!(e, SimEvent::PlayerCaught { .. })) {
                break;
            }
        }
        let stepped_at = elapsed - stepped.overrun();

        let mut whole = OutageSequence::new(&config.outage, "dash".into());
        let mut rng = bank.for_subsystem_at_tick(SubsystemSlot::Outage, 0);
        let events = whole.update(&frame(60_000), &[], &mut rng);
        assert_eq!(
            events.first(),
            Some(&SimEvent::AudioCue { cue: AudioCue::BlackoutMusic }),
            "grace must end before the capture in the same update"
        );
        assert_eq!(whole.phase(), OutagePhase::Done);
        assert_eq!(60_000 - whole.overrun(), stepped_at);
    }
}
