//! The event bus — everything the presentation layer hears about.
//!
//! RULE: Stages communicate ONLY through events.
//! The session applies cross-stage effects (penalties, captures,
//! outage) by reading the events a stage returns.

use crate::{
    adversary::ChargeStage,
    types::{AdversaryId, Millis, RoomId, Side, Tick},
};
use serde::{Deserialize, Serialize};

/// Every event emitted during a night.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Session events ─────────────────────────────
    NightStarted {
        night: u32,
        seed: u64,
    },
    NightWon {
        night: u32,
    },
    ReturnedToMenu,

    // ── Clock events ───────────────────────────────
    HourChanged {
        hour: u8,
    },
    NightComplete {
        night: u32,
    },

    // ── Power events ───────────────────────────────
    PowerExhausted,
    PowerOutageStarted,

    // ── Control panel events ───────────────────────
    PanelChanged {
        command: String,
    },

    // ── Adversary events ───────────────────────────
    AdversaryMoved {
        adversary: AdversaryId,
        from: RoomId,
        to: RoomId,
    },
    ThresholdReached {
        adversary: AdversaryId,
        side: Side,
    },
    DoorBlocked {
        adversary: AdversaryId,
        side: Side,
    },
    StageChanged {
        adversary: AdversaryId,
        stage: ChargeStage,
    },
    ChargeStarted {
        adversary: AdversaryId,
        side: Side,
    },
    DoorForced {
        side: Side,
        penalty: f64,
    },
    PlayerCaught {
        adversary: AdversaryId,
        cause: CaptureCause,
    },

    // ── Presentation cues ──────────────────────────
    AudioCue {
        cue: AudioCue,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaptureCause {
    /// A patroller walked through an open door.
    Patrol,
    /// The special case charged an open door.
    Charge,
    /// The outage ran its course.
    Blackout,
}

/// Opaque cue ids handed to the audio collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Footsteps,
    DoorBang,
    PowerDown,
    BlackoutMusic,
    Jumpscare,
    Chimes,
}

/// A logged event, tagged with when and by whom it was emitted.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventLogEntry {
    pub tick:       Tick,
    pub at_ms:      Millis,
    pub subsystem:  &'static str,
    pub event_type: &'static str,
    pub event:      SimEvent,
}

/// Extract a stable string name from a SimEvent variant.
pub fn event_type_name(event: &SimEvent) -> &'static str {
    match event {
        SimEvent::NightStarted { .. }     => "night_started",
        SimEvent::NightWon { .. }         => "night_won",
        SimEvent::ReturnedToMenu          => "returned_to_menu",
        SimEvent::HourChanged { .. }      => "hour_changed",
        SimEvent::NightComplete { .. }    => "night_complete",
        SimEvent::PowerExhausted          => "power_exhausted",
        SimEvent::PowerOutageStarted      => "power_outage_started",
        SimEvent::PanelChanged { .. }     => "panel_changed",
        SimEvent::AdversaryMoved { .. }   => "adversary_moved",
        SimEvent::ThresholdReached { .. } => "threshold_reached",
        SimEvent::DoorBlocked { .. }      => "door_blocked",
        SimEvent::StageChanged { .. }     => "stage_changed",
        SimEvent::ChargeStarted { .. }    => "charge_started",
        SimEvent::DoorForced { .. }       => "door_forced",
        SimEvent::PlayerCaught { .. }     => "player_caught",
        SimEvent::AudioCue { .. }         => "audio_cue",
    }
}
