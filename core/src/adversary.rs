//! Adversary state machines.
//!
//! One tagged variant per archetype, both driven by the single AI tick
//! in `adversary_subsystem`:
//!   - Patroller: rolls each tick to step one room along a fixed path
//!     toward the office. Walking in through an open door is a capture;
//!     a closed door pushes it back to the threshold.
//!   - SpecialCase: aggression climbs while nobody watches its home
//!     camera and falls while someone does. The stage is a pure function
//!     of aggression; reaching Charging arms a short delay after which
//!     the charge either lands (door open) or is absorbed (door closed,
//!     power penalty).

use crate::{
    config::{AiConfig, PatrollerConfig, SpecialCaseConfig},
    control_panel::ControlPanel,
    event::{AudioCue, CaptureCause, SimEvent},
    room_graph::RoomGraph,
    rng::SubsystemRng,
    types::{AdversaryId, Countdown, Millis, Night, RoomId, Side},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatrolStage {
    Idle,
    MovingNextStep,
    AtThreshold,
    InOffice,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStage {
    Hidden = 0,
    Peeking = 1,
    SteppingOut = 2,
    Charging = 3,
}

impl ChargeStage {
    pub fn from_aggression(aggression: f64, config: &AiConfig) -> Self {
        if aggression >= config.charge_threshold {
            Self::Charging
        } else if aggression >= config.step_out_threshold {
            Self::SteppingOut
        } else if aggression >= config.peek_threshold {
            Self::Peeking
        } else {
            Self::Hidden
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdversaryKind {
    Patroller {
        path_index:   usize,
        at_threshold: bool,
        stage:        PatrolStage,
        /// Door guarding the end of its path.
        side:         Side,
    },
    SpecialCase {
        stage:          ChargeStage,
        home:           RoomId,
        approach:       RoomId,
        side:           Side,
        baseline:       f64,
        pending_charge: Option<Countdown>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Adversary {
    pub id:         AdversaryId,
    pub location:   RoomId,
    pub aggression: f64,
    pub kind:       AdversaryKind,
}

impl Adversary {
    /// Returns None if the path's threshold room has no door, which a
    /// validated layout rules out.
    pub fn patroller(
        config: &PatrollerConfig,
        graph: &RoomGraph,
        night: Night,
        ai: &AiConfig,
    ) -> Option<Self> {
        let start = config.path.first()?.clone();
        let side = graph.door_for(graph.threshold_room(&config.id)?)?;
        Some(Self {
            id: config.id.clone(),
            location: start,
            aggression: ai.aggression_per_night * f64::from(night.index()) + config.aggression_offset,
            kind: AdversaryKind::Patroller {
                path_index: 0,
                at_threshold: false,
                stage: PatrolStage::Idle,
                side,
            },
        })
    }

    pub fn special_case(config: &SpecialCaseConfig) -> Self {
        Self {
            id: config.id.clone(),
            location: config.home.clone(),
            aggression: config.baseline_aggression,
            kind: AdversaryKind::SpecialCase {
                stage: ChargeStage::Hidden,
                home: config.home.clone(),
                approach: config.approach.clone(),
                side: config.side,
                baseline: config.baseline_aggression,
                pending_charge: None,
            },
        }
    }

    pub fn is_patroller(&self) -> bool {
        matches!(self.kind, AdversaryKind::Patroller { .. })
    }

    pub fn at_threshold(&self) -> bool {
        matches!(self.kind, AdversaryKind::Patroller { at_threshold: true, .. })
    }

    pub fn side(&self) -> Side {
        match &self.kind {
            AdversaryKind::Patroller { side, .. } | AdversaryKind::SpecialCase { side, .. } => *side,
        }
    }

    /// Chance, in percent, that a patroller steps forward this tick.
    pub fn move_chance_percent(&self, hour: u8, ai: &AiConfig) -> f64 {
        (f64::from(hour) + 1.0) * self.aggression / ai.movement_divisor * 100.0
    }

    /// One patrol roll. The roll is drawn even when it cannot succeed so
    /// every adversary consumes the same amount of randomness per tick.
    pub fn patrol_tick(
        &mut self,
        hour: u8,
        graph: &RoomGraph,
        panel: &ControlPanel,
        ai: &AiConfig,
        rng: &mut SubsystemRng,
    ) -> Vec<SimEvent> {
        let chance = self.move_chance_percent(hour, ai);
        let roll = rng.roll_percent();
        let Self { id, location, kind, .. } = self;
        let AdversaryKind::Patroller { path_index, at_threshold, stage, side } = kind else {
            return vec![];
        };

        if graph.is_office(location) {
            return vec![];
        }
        if roll >= chance {
            *stage = if *at_threshold { PatrolStage::AtThreshold } else { PatrolStage::Idle };
            return vec![];
        }

        let Some(next) = graph.next_room(id, location).cloned() else {
            crate::invariant_violation!("patroller '{id}' has no room after '{location}'");
            return vec![];
        };

        if graph.is_office(&next) {
            *stage = PatrolStage::InOffice;
            if panel.door_closed(*side) {
                // Blocked: stays at the threshold, no penalty.
                *stage = PatrolStage::AtThreshold;
                return vec![SimEvent::DoorBlocked { adversary: id.clone(), side: *side }];
            }
            let from = std::mem::replace(location, next.clone());
            *path_index += 1;
            *at_threshold = false;
            return vec![
                SimEvent::AdversaryMoved { adversary: id.clone(), from, to: next },
                SimEvent::PlayerCaught { adversary: id.clone(), cause: CaptureCause::Patrol },
                SimEvent::AudioCue { cue: AudioCue::Jumpscare },
            ];
        }

        let from = std::mem::replace(location, next.clone());
        *path_index += 1;
        let mut events = vec![SimEvent::AdversaryMoved {
            adversary: id.clone(),
            from,
            to: next.clone(),
        }];
        if graph.door_for(&next) == Some(*side) {
            *at_threshold = true;
            *stage = PatrolStage::AtThreshold;
            events.push(SimEvent::ThresholdReached { adversary: id.clone(), side: *side });
            events.push(SimEvent::AudioCue { cue: AudioCue::Footsteps });
        } else {
            *stage = PatrolStage::MovingNextStep;
        }
        events
    }

    /// Aggression update for the special case. Frozen while a charge is
    /// already underway.
    pub fn special_tick(&mut self, panel: &ControlPanel, ai: &AiConfig) -> Vec<SimEvent> {
        let Self { id, location, aggression, kind } = self;
        let AdversaryKind::SpecialCase { stage, home, approach, side, pending_charge, .. } = kind
        else {
            return vec![];
        };
        if pending_charge.is_some() {
            return vec![];
        }

        if panel.observing(home) {
            *aggression = (*aggression - ai.observed_decay).max(0.0);
        } else {
            *aggression += ai.unobserved_gain;
        }

        let next_stage = ChargeStage::from_aggression(*aggression, ai);
        if next_stage == *stage {
            return vec![];
        }
        *stage = next_stage;
        let mut events = vec![SimEvent::StageChanged { adversary: id.clone(), stage: next_stage }];
        if next_stage == ChargeStage::Charging {
            *pending_charge = Some(Countdown::new(ai.charge_delay_ms));
            *location = approach.clone();
            events.push(SimEvent::ChargeStarted { adversary: id.clone(), side: *side });
            events.push(SimEvent::AudioCue { cue: AudioCue::Footsteps });
        }
        events
    }

    /// Run the charge delay down and resolve it when it expires.
    pub fn advance_charge(
        &mut self,
        dt: Millis,
        graph: &RoomGraph,
        panel: &ControlPanel,
        ai: &AiConfig,
    ) -> Vec<SimEvent> {
        let Self { id, location, aggression, kind } = self;
        let AdversaryKind::SpecialCase { stage, home, side, baseline, pending_charge, .. } = kind
        else {
            return vec![];
        };
        let Some(countdown) = pending_charge.as_mut() else {
            return vec![];
        };
        if countdown.consume(dt).is_none() {
            return vec![];
        }
        *pending_charge = None;

        if !panel.door_closed(*side) {
            *location = graph.office().clone();
            return vec![
                SimEvent::PlayerCaught { adversary: id.clone(), cause: CaptureCause::Charge },
                SimEvent::AudioCue { cue: AudioCue::Jumpscare },
            ];
        }

        *aggression = *baseline;
        *stage = ChargeStage::Hidden;
        *location = home.clone();
        vec![
            SimEvent::DoorForced { side: *side, penalty: ai.door_penalty },
            SimEvent::AudioCue { cue: AudioCue::DoorBang },
            SimEvent::StageChanged { adversary: id.clone(), stage: ChargeStage::Hidden },
        ]
    }

    /// Drop any charge in flight.
    pub fn cancel_charge(&mut self) {
        if let AdversaryKind::SpecialCase { pending_charge, .. } = &mut self.kind {
            *pending_charge = None;
        }
    }

    /// Time until a pending charge lands.
    pub fn charge_remaining(&self) -> Option<Millis> {
        match &self.kind {
            AdversaryKind::SpecialCase { pending_charge: Some(countdown), .. } => {
                Some(countdown.remaining())
            }
            _ => None,
        }
    }

    pub fn charge_pending(&self) -> bool {
        matches!(self.kind, AdversaryKind::SpecialCase { pending_charge: Some(_), .. })
    }
}
