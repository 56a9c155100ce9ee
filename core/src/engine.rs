//! The game session — the heart of the night shift.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Clock      every power tick (1 simulated second)
//!   2. Power      every power tick, right after the clock
//!   3. Adversary  charge timers on every step, then the AI tick every
//!                 AI interval (patrollers in layout order, then the
//!                 special case)
//!   4. Outage     every frame, only while the lights are out
//!
//! RULES:
//!   - One monotonic timeline drives everything. A frame is cut into
//!     steps at each power tick, AI tick and charge expiry it spans, and
//!     each step runs the order above, so frame length never changes
//!     the outcome.
//!   - Power running out is handled before adversaries move at the same
//!     instant: an outage always wins the tie against a capture. Time
//!     left in the frame carries into the outage.
//!   - All randomness flows through the RngBank.
//!   - Commands apply immediately and are seen by the next frame.
//!   - Starting, restarting or leaving a night rebuilds every child, so
//!     no delayed transition survives a teardown.

use crate::{
    adversary::Adversary,
    clock::NightClock,
    command::{CommandOutcome, IgnoreReason, PlayerCommand},
    config::SessionConfig,
    control_panel::ControlPanel,
    adversary_subsystem::AdversarySubsystem,
    error::SimResult,
    event::{event_type_name, AudioCue, CaptureCause, EventLogEntry, SimEvent},
    outage_subsystem::{OutagePhase, OutageSequence},
    power_subsystem::PowerBudget,
    rng::{RngBank, SubsystemSlot},
    room_graph::RoomGraph,
    snapshot::HudSnapshot,
    subsystem::{SimSubsystem, TickFrame},
    types::{AdversaryId, Millis, Night, Side, Tick},
};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Menu,
    Active,
    PowerOutage,
    Resolved { outcome: Outcome },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Won,
    Lost { adversary: AdversaryId, cause: CaptureCause },
}

/// Callback invoked for every event, in emission order.
pub type EventListener = Box<dyn FnMut(&SimEvent)>;

/// Everything that lives for exactly one night.
struct NightShift {
    clock:       NightClock,
    power:       PowerBudget,
    panel:       ControlPanel,
    ai:          AdversarySubsystem,
    outage:      Option<OutageSequence>,
    rng_bank:    RngBank,
    ai_interval: Millis,
    power_acc:   Millis,
    ai_acc:      Millis,
    power_ticks: Tick,
    ai_ticks:    Tick,
}

impl NightShift {
    fn new(config: &SessionConfig, graph: &RoomGraph, night: Night, seed: u64) -> Self {
        let first_camera = config
            .layout
            .rooms
            .first()
            .map(|r| r.id.clone())
            .unwrap_or_else(|| graph.office().clone());
        Self {
            clock: NightClock::new(night, &config.clock),
            power: PowerBudget::new(&config.power, config.clock.hour_duration_ms),
            panel: ControlPanel::new(first_camera),
            ai: AdversarySubsystem::new(graph.clone(), &config.layout, &config.ai, night),
            outage: None,
            rng_bank: RngBank::new(seed, night),
            ai_interval: config.ai_interval_ms(night.index()),
            power_acc: 0,
            ai_acc: 0,
            power_ticks: 0,
            ai_ticks: 0,
        }
    }
}

pub struct GameSession {
    config:       SessionConfig,
    graph:        RoomGraph,
    seed:         u64,
    night:        Night,
    state:        SessionState,
    tick:         Tick,
    now_ms:       Millis,
    shift:        NightShift,
    event_log:    Vec<EventLogEntry>,
    frame_events: Vec<SimEvent>,
    pending:      Vec<SimEvent>,
    listeners:    Vec<EventListener>,
}

impl GameSession {
    /// Build a session sitting at the menu, night 1 prepared.
    pub fn new(config: SessionConfig, seed: u64) -> SimResult<Self> {
        config.validate()?;
        let graph = RoomGraph::from_layout(&config.layout)?;
        let night = Night::default();
        let shift = NightShift::new(&config, &graph, night, seed);
        Ok(Self {
            config,
            graph,
            seed,
            night,
            state: SessionState::Menu,
            tick: 0,
            now_ms: 0,
            shift,
            event_log: Vec::new(),
            frame_events: Vec::new(),
            pending: Vec::new(),
            listeners: Vec::new(),
        })
    }

    // ── Session control ────────────────────────────────────────

    pub fn start_night(&mut self, index: u32) -> CommandOutcome {
        if self.is_running() {
            log::warn!("start_night({index}) ignored: night {} in progress", self.night.index());
            return CommandOutcome::Ignored(IgnoreReason::AlreadyRunning);
        }
        self.begin_night(Night::new(index));
        CommandOutcome::Applied
    }

    /// Tear the current night down and play it again from the top.
    pub fn restart_night(&mut self) -> CommandOutcome {
        self.teardown();
        self.begin_night(self.night);
        CommandOutcome::Applied
    }

    /// Move on to the next night. Only a survived night can be advanced.
    pub fn advance_night(&mut self) -> CommandOutcome {
        if !matches!(self.state, SessionState::Resolved { outcome: Outcome::Won }) {
            log::warn!("advance_night ignored: night {} not won", self.night.index());
            return CommandOutcome::Ignored(IgnoreReason::NotActive);
        }
        self.teardown();
        self.begin_night(self.night.next());
        CommandOutcome::Applied
    }

    pub fn return_to_menu(&mut self) -> CommandOutcome {
        if self.state == SessionState::Menu {
            return CommandOutcome::Ignored(IgnoreReason::NoChange);
        }
        self.teardown();
        self.emit("session", SimEvent::ReturnedToMenu);
        CommandOutcome::Applied
    }

    // ── Office controls ────────────────────────────────────────

    pub fn toggle_door(&mut self, side: Side) -> CommandOutcome {
        self.panel_command("toggle_door", |panel| panel.toggle_door(side))
    }

    pub fn set_light(&mut self, side: Side, on: bool) -> CommandOutcome {
        self.panel_command("set_light", |panel| panel.set_light(side, on))
    }

    pub fn toggle_camera(&mut self) -> CommandOutcome {
        self.panel_command("toggle_camera", ControlPanel::toggle_camera_view)
    }

    pub fn select_camera(&mut self, room: &str) -> CommandOutcome {
        if !self.graph.contains(room) || self.graph.is_office(room) {
            log::warn!("select_camera ignored: no camera in '{room}'");
            return CommandOutcome::Ignored(IgnoreReason::UnknownRoom);
        }
        let room = room.to_string();
        self.panel_command("select_camera", |panel| panel.select_camera(room))
    }

    /// Dispatch a serialized command.
    pub fn apply(&mut self, command: PlayerCommand) -> CommandOutcome {
        match command {
            PlayerCommand::StartNight { index } => self.start_night(index),
            PlayerCommand::RestartNight => self.restart_night(),
            PlayerCommand::AdvanceNight => self.advance_night(),
            PlayerCommand::ReturnToMenu => self.return_to_menu(),
            PlayerCommand::ToggleDoor { side } => self.toggle_door(side),
            PlayerCommand::SetLight { side, on } => self.set_light(side, on),
            PlayerCommand::ToggleCamera => self.toggle_camera(),
            PlayerCommand::SelectCamera { room } => self.select_camera(&room),
        }
    }

    // ── Frame loop ─────────────────────────────────────────────

    /// Advance the night by `dt` simulated milliseconds and return the
    /// events emitted during this frame. A no-op outside a night.
    ///
    /// The frame is cut at every power tick, AI tick and charge expiry
    /// inside it, so one long frame plays out exactly like many short ones.
    pub fn advance(&mut self, dt: Millis) -> Vec<SimEvent> {
        if !self.is_running() {
            return Vec::new();
        }
        self.tick += 1;
        self.frame_events.clear();

        match self.state {
            SessionState::Active => self.run_active(dt),
            SessionState::PowerOutage => self.run_outage(dt),
            _ => {}
        }
        std::mem::take(&mut self.frame_events)
    }

    fn run_active(&mut self, dt: Millis) {
        let tick_ms = self.config.power.tick_ms;
        let mut left = dt;
        while left > 0 && self.state == SessionState::Active {
            let mut step = left
                .min(tick_ms - self.shift.power_acc)
                .min(self.shift.ai_interval - self.shift.ai_acc);
            if let Some(due) = self.shift.ai.next_timer_due() {
                step = step.min(due);
            }
            let step = step.max(1);
            left -= step;
            self.now_ms += step;
            self.shift.power_acc += step;
            self.shift.ai_acc += step;

            if self.shift.power_acc >= tick_ms {
                self.shift.power_acc -= tick_ms;
                self.power_tick(tick_ms);
                if self.state != SessionState::Active {
                    break;
                }
            }

            let timer_events = self.shift.ai.advance_timers(step, &self.shift.panel);
            self.dispatch("adversary", timer_events);
            if self.state != SessionState::Active {
                break;
            }

            if self.shift.ai_acc >= self.shift.ai_interval {
                self.shift.ai_acc -= self.shift.ai_interval;
                self.ai_tick();
            }
        }
        if self.state == SessionState::PowerOutage && left > 0 {
            self.run_outage(left);
        }
    }

    /// Clock, then power: one simulated second.
    fn power_tick(&mut self, tick_ms: Millis) {
        self.shift.power_ticks += 1;
        let clock_events = {
            let frame = TickFrame {
                tick: self.tick,
                now_ms: self.now_ms,
                dt_ms: tick_ms,
                night: self.night,
                hour: self.shift.clock.hour,
                panel: &self.shift.panel,
            };
            let mut rng = self
                .shift
                .rng_bank
                .for_subsystem_at_tick(SubsystemSlot::Clock, self.shift.power_ticks);
            self.shift.clock.update(&frame, &self.frame_events, &mut rng)
        };
        self.dispatch("clock", clock_events);
        if self.state != SessionState::Active {
            return;
        }

        let power_events = {
            let frame = TickFrame {
                tick: self.tick,
                now_ms: self.now_ms,
                dt_ms: tick_ms,
                night: self.night,
                hour: self.shift.clock.hour,
                panel: &self.shift.panel,
            };
            let mut rng = self
                .shift
                .rng_bank
                .for_subsystem_at_tick(SubsystemSlot::Power, self.shift.power_ticks);
            self.shift.power.update(&frame, &self.frame_events, &mut rng)
        };
        self.dispatch("power", power_events);
    }

    fn ai_tick(&mut self) {
        self.shift.ai_ticks += 1;
        let ai_events = {
            let frame = TickFrame {
                tick: self.tick,
                now_ms: self.now_ms,
                dt_ms: self.shift.ai_interval,
                night: self.night,
                hour: self.shift.clock.hour,
                panel: &self.shift.panel,
            };
            let mut rng = self
                .shift
                .rng_bank
                .for_subsystem_at_tick(SubsystemSlot::Adversary, self.shift.ai_ticks);
            self.shift.ai.update(&frame, &self.frame_events, &mut rng)
        };
        self.dispatch("adversary", ai_events);
    }

    fn run_outage(&mut self, dt: Millis) {
        let (outage_events, overrun) = match self.shift.outage.as_mut() {
            Some(outage) => {
                let frame = TickFrame {
                    tick: self.tick,
                    now_ms: self.now_ms,
                    dt_ms: dt,
                    night: self.night,
                    hour: self.shift.clock.hour,
                    panel: &self.shift.panel,
                };
                // The clock is frozen in the dark, so the power tick count
                // pins the countdown draw to the moment the lights went out.
                let mut rng = self
                    .shift
                    .rng_bank
                    .for_subsystem_at_tick(SubsystemSlot::Outage, self.shift.power_ticks);
                let events = outage.update(&frame, &self.frame_events, &mut rng);
                (events, outage.overrun())
            }
            None => {
                crate::invariant_violation!("power outage without an outage sequence");
                (Vec::new(), 0)
            }
        };
        let caught = outage_events.iter().any(|e| matches!(e, SimEvent::PlayerCaught { .. }));
        self.now_ms += if caught { dt - overrun.min(dt) } else { dt };
        if caught {
            self.shift.ai.blackout_approach();
        }
        self.dispatch("outage", outage_events);
    }

    // ── Transitions ────────────────────────────────────────────

    fn begin_night(&mut self, night: Night) {
        self.night = night;
        self.shift = NightShift::new(&self.config, &self.graph, night, self.seed);
        self.tick = 0;
        self.now_ms = 0;
        self.event_log.clear();
        self.pending.clear();
        self.state = SessionState::Active;
        log::info!(
            "night {} started (seed {}, AI every {} ms)",
            night.index(),
            self.seed,
            self.shift.ai_interval
        );
        self.emit("session", SimEvent::NightStarted { night: night.index(), seed: self.seed });
    }

    /// Drop every child of the current night, pending timers included.
    fn teardown(&mut self) {
        self.shift = NightShift::new(&self.config, &self.graph, self.night, self.seed);
        self.state = SessionState::Menu;
        log::info!("night {} torn down", self.night.index());
    }

    fn enter_outage(&mut self) {
        if self.state != SessionState::Active {
            return;
        }
        self.state = SessionState::PowerOutage;
        self.shift.panel.lock_out();
        self.shift.ai.cancel_pending();
        match self.shift.ai.special_id().cloned() {
            Some(stalker) => {
                self.shift.outage = Some(OutageSequence::new(&self.config.outage, stalker));
            }
            None => crate::invariant_violation!("no special case adversary to end the outage"),
        }
        log::info!("tick={} power outage at hour {}", self.tick, self.shift.clock.hour);
        self.emit("session", SimEvent::PowerOutageStarted);
        self.emit("session", SimEvent::AudioCue { cue: AudioCue::PowerDown });
    }

    fn resolve(&mut self, outcome: Outcome) {
        if !self.is_running() {
            return;
        }
        self.shift.ai.cancel_pending();
        self.shift.outage = None;
        log::info!("tick={} night {} resolved: {outcome:?}", self.tick, self.night.index());
        let won = outcome == Outcome::Won;
        self.state = SessionState::Resolved { outcome };
        if won {
            self.emit("session", SimEvent::NightWon { night: self.night.index() });
            self.emit("session", SimEvent::AudioCue { cue: AudioCue::Chimes });
        }
    }

    fn dispatch(&mut self, subsystem: &'static str, events: Vec<SimEvent>) {
        for event in events {
            self.emit(subsystem, event.clone());
            self.react(event);
        }
    }

    /// Apply the cross-stage consequences of an event.
    fn react(&mut self, event: SimEvent) {
        match event {
            SimEvent::NightComplete { .. } if self.state == SessionState::Active => {
                self.resolve(Outcome::Won);
            }
            SimEvent::PowerExhausted => self.enter_outage(),
            SimEvent::PlayerCaught { adversary, cause } => {
                self.resolve(Outcome::Lost { adversary, cause });
            }
            SimEvent::DoorForced { penalty, .. } => {
                if let Some(exhausted) = self.shift.power.apply_penalty(penalty) {
                    self.dispatch("power", vec![exhausted]);
                }
            }
            _ => {}
        }
    }

    fn emit(&mut self, subsystem: &'static str, event: SimEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
        self.event_log.push(EventLogEntry {
            tick: self.tick,
            at_ms: self.now_ms,
            subsystem,
            event_type: event_type_name(&event),
            event: event.clone(),
        });
        self.frame_events.push(event.clone());
        self.pending.push(event);
    }

    fn panel_command(
        &mut self,
        name: &str,
        command: impl FnOnce(&mut ControlPanel) -> CommandOutcome,
    ) -> CommandOutcome {
        match self.state {
            SessionState::Active => {}
            SessionState::PowerOutage => return CommandOutcome::Ignored(IgnoreReason::PanelLocked),
            _ => {
                log::warn!("{name} ignored: session is {:?}", self.state);
                return CommandOutcome::Ignored(IgnoreReason::NotActive);
            }
        }
        if self.shift.power.is_exhausted() {
            return CommandOutcome::Ignored(IgnoreReason::PanelLocked);
        }
        let outcome = command(&mut self.shift.panel);
        if outcome.is_applied() {
            self.emit("panel", SimEvent::PanelChanged { command: name.to_string() });
        }
        outcome
    }

    fn is_running(&self) -> bool {
        matches!(self.state, SessionState::Active | SessionState::PowerOutage)
    }

    // ── Queries ────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn night(&self) -> Night {
        self.night
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Simulated time since the night started.
    pub fn now_ms(&self) -> Millis {
        self.now_ms
    }

    pub fn hour(&self) -> u8 {
        self.shift.clock.hour
    }

    pub fn power_remaining(&self) -> f64 {
        self.shift.power.remaining()
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.shift.panel
    }

    pub fn graph(&self) -> &RoomGraph {
        &self.graph
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn adversaries(&self) -> &[Adversary] {
        self.shift.ai.adversaries()
    }

    pub fn adversary(&self, id: &str) -> Option<&Adversary> {
        self.shift.ai.get(id)
    }

    pub fn outage_phase(&self) -> Option<OutagePhase> {
        self.shift.outage.as_ref().map(OutageSequence::phase)
    }

    /// Adversaries currently standing in `room`.
    pub fn room_occupants(&self, room: &str) -> BTreeSet<AdversaryId> {
        self.shift.ai.occupants(room)
    }

    /// Who is at this side's door, as seen under that side's light.
    pub fn peek(&self, side: Side) -> Option<AdversaryId> {
        if self.state != SessionState::Active || !self.shift.panel.light_on(side) {
            return None;
        }
        self.shift.ai.at_door(side).cloned()
    }

    pub fn hud(&self) -> HudSnapshot {
        let power = self.shift.power.remaining();
        HudSnapshot {
            power,
            power_shown: power.floor() as u8,
            usage: PowerBudget::usage_level(&self.shift.panel),
            hour: self.shift.clock.hour,
            clock_label: self.shift.clock.label(),
            night: self.night.index(),
            state: self.state.clone(),
            panel: self.shift.panel.clone(),
        }
    }

    /// Events of the current night, oldest first.
    pub fn event_log(&self) -> &[EventLogEntry] {
        &self.event_log
    }

    /// Hand over every event emitted since the last drain. Undrained
    /// events are dropped when a new night begins.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Register a listener; it hears every event from now on, across nights.
    pub fn subscribe(&mut self, listener: EventListener) {
        self.listeners.push(listener);
    }

    // ── Overrides for tests and tooling ────────────────────────

    /// Force the remaining power. Reaching zero starts the outage at once.
    pub fn set_power(&mut self, value: f64) {
        if !self.is_running() {
            return;
        }
        if let Some(exhausted) = self.shift.power.set_remaining(value) {
            self.dispatch("power", vec![exhausted]);
        }
    }

    /// Force an adversary's aggression. Returns false for unknown ids.
    pub fn set_aggression(&mut self, id: &str, aggression: f64) -> bool {
        self.shift.ai.set_aggression(id, aggression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        GameSession::new(SessionConfig::default(), 42).expect("default session")
    }

    #[test]
    fn new_session_waits_at_the_menu() {
        let mut s = session();
        assert_eq!(*s.state(), SessionState::Menu);
        assert!(s.advance(10_000).is_empty());
        assert_eq!(s.toggle_door(Side::Left), CommandOutcome::Ignored(IgnoreReason::NotActive));
    }

    #[test]
    fn commands_are_visible_to_the_next_frame() {
        let mut s = session();
        s.start_night(1);
        s.toggle_door(Side::Left);
        s.toggle_door(Side::Right);
        s.advance(1_000);
        assert!(s.hud().usage == 3);
        let drained = 100.0 - s.power_remaining();
        let expected = 3.0 * 100.0 * (60.0 / 89.0) / 360.0;
        assert!((drained - expected).abs() < 1e-9, "drained {drained}, expected {expected}");
    }

    #[test]
    fn unknown_camera_is_ignored() {
        let mut s = session();
        s.start_night(1);
        assert_eq!(s.select_camera("attic"), CommandOutcome::Ignored(IgnoreReason::UnknownRoom));
        assert_eq!(s.select_camera("office"), CommandOutcome::Ignored(IgnoreReason::UnknownRoom));
        assert!(s.select_camera("kitchen").is_applied());
        assert_eq!(s.panel().camera(), "kitchen");
    }

    #[test]
    fn peek_needs_the_light() {
        let mut s = session();
        s.start_night(1);
        s.set_aggression("stitch", 20.0);
        s.set_aggression("wren", 0.0);
        s.toggle_door(Side::Left);
        for _ in 0..20 {
            s.advance(1_000);
        }
        assert_eq!(s.peek(Side::Left), None, "dark doorway shows nothing");
        s.set_light(Side::Left, true);
        assert_eq!(s.peek(Side::Left).as_deref(), Some("stitch"));
        assert_eq!(s.peek(Side::Right), None);
    }

    #[test]
    fn listeners_hear_every_event() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let heard = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&heard);
        let mut s = session();
        s.subscribe(Box::new(move |e: &SimEvent| sink.borrow_mut().push(event_type_name(e))));
        s.start_night(2);
        s.advance(89_000);
        let heard = heard.borrow();
        assert_eq!(heard.first(), Some(&"night_started"));
        assert!(heard.contains(&"hour_changed"));
        assert_eq!(heard.len(), s.event_log().len());
    }

    #[test]
    fn starting_over_a_running_night_is_refused() {
        let mut s = session();
        s.start_night(2);
        s.advance(5_000);
        assert_eq!(s.start_night(3), CommandOutcome::Ignored(IgnoreReason::AlreadyRunning));
        assert_eq!(s.night().index(), 2);
        assert_eq!(s.now_ms(), 5_000);
    }

    #[test]
    fn undrained_events_do_not_outlive_their_night() {
        let mut s = session();
        s.start_night(1);
        s.advance(100_000);
        s.restart_night();
        assert_eq!(
            s.drain_events(),
            vec![SimEvent::NightStarted { night: 1, seed: 42 }],
            "only the fresh night's events are queued"
        );
    }
}
