//! Tunable balance constants and the room layout.
//!
//! `SessionConfig::default()` carries the canonical numbers.
//! `SessionConfig::load()` reads the same shape from JSON
//! (see data/night_shift.json) and validates it.

use crate::{
    error::{SimError, SimResult},
    room_graph::RoomGraph,
    types::{AdversaryId, Millis, RoomId, Side},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClockConfig {
    /// Real (simulated) milliseconds per in-game hour.
    pub hour_duration_ms: Millis,
    /// Hour at which the night is survived.
    pub final_hour: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerConfig {
    pub initial: f64,
    pub base_draw: f64,
    pub door_draw: f64,
    pub light_draw: f64,
    pub camera_draw: f64,
    /// Night length in in-game minutes that base draw spends the whole budget over.
    pub drain_divisor: f64,
    /// Period of the power/clock accumulator tick.
    pub tick_ms: Millis,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiConfig {
    pub base_interval_ms: Millis,
    pub interval_step_ms: Millis,
    pub min_interval_ms: Millis,
    /// Patroller aggression gained per night index.
    pub aggression_per_night: f64,
    /// Denominator of the patrol movement probability.
    pub movement_divisor: f64,
    pub unobserved_gain: f64,
    pub observed_decay: f64,
    pub peek_threshold: f64,
    pub step_out_threshold: f64,
    pub charge_threshold: f64,
    pub charge_delay_ms: Millis,
    pub door_penalty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutageConfig {
    /// Quiet period between the lights going out and the countdown.
    pub grace_ms: Millis,
    pub countdown_min_ms: Millis,
    pub countdown_max_ms: Millis,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomConfig {
    pub id: RoomId,
    pub label: String,
    #[serde(default)]
    pub audio_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfficeAdjacent {
    pub left: RoomId,
    pub right: RoomId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatrollerConfig {
    pub id: AdversaryId,
    pub aggression_offset: f64,
    /// Ordered rooms from the starting room to the office.
    pub path: Vec<RoomId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecialCaseConfig {
    pub id: AdversaryId,
    /// Room it hides in; watching this camera calms it down.
    pub home: RoomId,
    /// Room it runs through while charging.
    pub approach: RoomId,
    /// Door it charges at.
    pub side: Side,
    #[serde(default)]
    pub baseline_aggression: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    pub rooms: Vec<RoomConfig>,
    pub office: RoomId,
    pub office_adjacent: OfficeAdjacent,
    pub patrollers: Vec<PatrollerConfig>,
    pub special: SpecialCaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub clock: ClockConfig,
    pub power: PowerConfig,
    pub ai: AiConfig,
    pub outage: OutageConfig,
    pub layout: LayoutConfig,
}

impl SessionConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &str) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> SimResult<Self> {
        let config: SessionConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.clock.hour_duration_ms == 0 {
            return Err(invalid("clock.hour_duration_ms", "must be positive"));
        }
        if self.clock.final_hour == 0 {
            return Err(invalid("clock.final_hour", "must be positive"));
        }
        if !(0.0..=100.0).contains(&self.power.initial) {
            return Err(invalid("power.initial", "must be within [0, 100]"));
        }
        if self.power.base_draw < 1.0 {
            return Err(invalid("power.base_draw", "must be at least 1.0"));
        }
        if self.power.drain_divisor <= 0.0 {
            return Err(invalid("power.drain_divisor", "must be positive"));
        }
        if self.power.tick_ms == 0 {
            return Err(invalid("power.tick_ms", "must be positive"));
        }
        if self.ai.min_interval_ms == 0 || self.ai.base_interval_ms < self.ai.min_interval_ms {
            return Err(invalid(
                "ai.base_interval_ms",
                "must be at least ai.min_interval_ms, which must be positive",
            ));
        }
        if self.ai.movement_divisor <= 0.0 {
            return Err(invalid("ai.movement_divisor", "must be positive"));
        }
        if !(self.ai.peek_threshold <= self.ai.step_out_threshold
            && self.ai.step_out_threshold <= self.ai.charge_threshold)
        {
            return Err(invalid("ai.charge_threshold", "stage thresholds must be ascending"));
        }
        if self.outage.countdown_min_ms > self.outage.countdown_max_ms {
            return Err(invalid("outage.countdown_min_ms", "must not exceed countdown_max_ms"));
        }
        RoomGraph::from_layout(&self.layout).map(|_| ())
    }

    /// AI tick period for a night: shrinks linearly down to the floor.
    pub fn ai_interval_ms(&self, night_index: u32) -> Millis {
        let steps = Millis::from(night_index.saturating_sub(1));
        self.ai
            .base_interval_ms
            .saturating_sub(steps.saturating_mul(self.ai.interval_step_ms))
            .max(self.ai.min_interval_ms)
    }
}

fn invalid(field: &'static str, reason: &str) -> SimError {
    SimError::InvalidConfig { field, reason: reason.to_string() }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            clock: ClockConfig {
                hour_duration_ms: 89_000,
                final_hour: 6,
            },
            power: PowerConfig {
                initial: 100.0,
                base_draw: 1.0,
                door_draw: 1.0,
                light_draw: 0.5,
                camera_draw: 1.0,
                drain_divisor: 360.0,
                tick_ms: 1_000,
            },
            ai: AiConfig {
                base_interval_ms: 3_000,
                interval_step_ms: 500,
                min_interval_ms: 1_000,
                aggression_per_night: 2.0,
                movement_divisor: 20.0,
                unobserved_gain: 0.5,
                observed_decay: 1.0,
                peek_threshold: 10.0,
                step_out_threshold: 15.0,
                charge_threshold: 20.0,
                charge_delay_ms: 2_000,
                door_penalty: 5.0,
            },
            outage: OutageConfig {
                grace_ms: 3_000,
                countdown_min_ms: 5_000,
                countdown_max_ms: 20_000,
            },
            layout: LayoutConfig::default(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let room = |id: &str, label: &str, audio_only: bool| RoomConfig {
            id: id.into(),
            label: label.into(),
            audio_only,
        };
        let path = |rooms: &[&str]| rooms.iter().map(|r| r.to_string()).collect::<Vec<_>>();

        Self {
            rooms: vec![
                room("show_stage", "Show Stage", false),
                room("dining_area", "Dining Area", false),
                room("backstage", "Backstage", false),
                room("restrooms", "Restrooms", false),
                room("kitchen", "Kitchen", true),
                room("supply_closet", "Supply Closet", false),
                room("curtain_cove", "Curtain Cove", false),
                room("west_hall", "West Hall", false),
                room("west_corner", "West Hall Corner", false),
                room("east_hall", "East Hall", false),
                room("east_corner", "East Hall Corner", false),
                room("office", "Office", false),
            ],
            office: "office".into(),
            office_adjacent: OfficeAdjacent {
                left: "west_corner".into(),
                right: "east_corner".into(),
            },
            patrollers: vec![
                PatrollerConfig {
                    id: "stitch".into(),
                    aggression_offset: 0.0,
                    path: path(&[
                        "show_stage", "dining_area", "backstage", "west_hall", "west_corner", "office",
                    ]),
                },
                PatrollerConfig {
                    id: "wren".into(),
                    aggression_offset: 1.0,
                    path: path(&[
                        "show_stage", "dining_area", "restrooms", "kitchen", "east_hall",
                        "east_corner", "office",
                    ]),
                },
                PatrollerConfig {
                    id: "mott".into(),
                    aggression_offset: 2.0,
                    path: path(&[
                        "show_stage", "dining_area", "supply_closet", "west_hall", "west_corner",
                        "office",
                    ]),
                },
            ],
            special: SpecialCaseConfig {
                id: "dash".into(),
                home: "curtain_cove".into(),
                approach: "west_hall".into(),
                side: Side::Left,
                baseline_aggression: 0.0,
            },
        }
    }
}
