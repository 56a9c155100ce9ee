//! Adversary AI driver — one tick for every adversary, in layout order.
//!
//! Execution: once per AI interval (shrinks with the night index).
//! Patrollers roll first, in the order the layout lists them, then the
//! special case updates its aggression. Charge delays run on every
//! frame through `advance_timers`, independently of the AI interval.

use crate::{
    config::{AiConfig, LayoutConfig},
    control_panel::ControlPanel,
    adversary::{Adversary, AdversaryKind},
    event::SimEvent,
    rng::SubsystemRng,
    room_graph::RoomGraph,
    subsystem::{SimSubsystem, TickFrame},
    types::{AdversaryId, Millis, Night, Side},
};
use std::collections::BTreeSet;

pub struct AdversarySubsystem {
    graph:       RoomGraph,
    ai:          AiConfig,
    adversaries: Vec<Adversary>,
}

impl AdversarySubsystem {
    pub fn new(graph: RoomGraph, layout: &LayoutConfig, ai: &AiConfig, night: Night) -> Self {
        let mut adversaries: Vec<Adversary> = layout
            .patrollers
            .iter()
            .filter_map(|p| {
                let built = Adversary::patroller(p, &graph, night, ai);
                if built.is_none() {
                    crate::invariant_violation!("patroller '{}' has no door on its path", p.id);
                }
                built
            })
            .collect();
        adversaries.push(Adversary::special_case(&layout.special));
        Self { graph, ai: ai.clone(), adversaries }
    }

    pub fn adversaries(&self) -> &[Adversary] {
        &self.adversaries
    }

    pub fn get(&self, id: &str) -> Option<&Adversary> {
        self.adversaries.iter().find(|a| a.id == id)
    }

    /// Override an adversary's aggression. Returns false for unknown ids.
    pub fn set_aggression(&mut self, id: &str, aggression: f64) -> bool {
        match self.adversaries.iter_mut().find(|a| a.id == id) {
            Some(a) => {
                a.aggression = aggression.max(0.0);
                true
            }
            None => false,
        }
    }

    /// The special case adversary; the layout always has exactly one.
    pub fn special_id(&self) -> Option<&AdversaryId> {
        self.adversaries.iter().find(|a| !a.is_patroller()).map(|a| &a.id)
    }

    pub fn occupants(&self, room: &str) -> BTreeSet<AdversaryId> {
        self.adversaries
            .iter()
            .filter(|a| a.location == room)
            .map(|a| a.id.clone())
            .collect()
    }

    /// Patroller standing at this side's door, if any.
    pub fn at_door(&self, side: Side) -> Option<&AdversaryId> {
        self.adversaries
            .iter()
            .find(|a| a.at_threshold() && a.side() == side)
            .map(|a| &a.id)
    }

    /// Advance charge delays by `dt`.
    pub fn advance_timers(&mut self, dt: Millis, panel: &ControlPanel) -> Vec<SimEvent> {
        let mut events = Vec::new();
        for adversary in &mut self.adversaries {
            events.extend(adversary.advance_charge(dt, &self.graph, panel, &self.ai));
        }
        events
    }

    /// Soonest pending charge, if any.
    pub fn next_timer_due(&self) -> Option<Millis> {
        self.adversaries.iter().filter_map(Adversary::charge_remaining).min()
    }

    pub fn cancel_pending(&mut self) {
        for adversary in &mut self.adversaries {
            adversary.cancel_charge();
        }
    }

    /// Outage finale: the special case walks into the office.
    pub fn blackout_approach(&mut self) -> Option<AdversaryId> {
        let office = self.graph.office().clone();
        let special = self
            .adversaries
            .iter_mut()
            .find(|a| matches!(a.kind, AdversaryKind::SpecialCase { .. }))?;
        special.cancel_charge();
        special.location = office;
        Some(special.id.clone())
    }
}

impl SimSubsystem for AdversarySubsystem {
    fn name(&self) -> &'static str { "adversary" }

    fn update(
        &mut self,
        frame: &TickFrame<'_>,
        _events_in: &[SimEvent],
        rng: &mut SubsystemRng,
    ) -> Vec<SimEvent> {
        let mut events = Vec::new();
        for adversary in &mut self.adversaries {
            let produced = if adversary.is_patroller() {
                adversary.patrol_tick(frame.hour, &self.graph, frame.panel, &self.ai, rng)
            } else {
                adversary.special_tick(frame.panel, &self.ai)
            };
            if !produced.is_empty() {
                log::debug!(
                    "tick={} adversary: {} at {} (aggression {:.1}) -> {:?}",
                    frame.tick, adversary.id, adversary.location, adversary.aggression, produced
                );
            }
            let caught = produced.iter().any(|e| matches!(e, SimEvent::PlayerCaught { .. }));
            events.extend(produced);
            if caught {
                break;
            }
        }
        events
    }
}
