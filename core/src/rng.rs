//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SubsystemRng instances derived
//! from the session seed and the night being played.
//!
//! Each stage gets its own stream per frame, seeded from
//! (night_seed, slot, tick). This means:
//!   - Restarting a night with the same seed replays every roll.
//!   - Adding a new slot never changes existing streams.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

use crate::types::{Millis, Night, Tick};

/// A named, deterministic RNG for a single stage.
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    pub fn new(seed: u64) -> Self {
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Roll a percentage in [0.0, 100.0).
    pub fn roll_percent(&mut self) -> f64 {
        self.next_f64() * 100.0
    }

    /// Roll a duration uniformly in [min, max].
    pub fn millis_between(&mut self, min: Millis, max: Millis) -> Millis {
        if max <= min {
            return min;
        }
        self.inner.gen_range(min..=max)
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// All stage RNGs for one night, indexed by stable slot.
#[derive(Debug, Clone)]
pub struct RngBank {
    night_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64, night: Night) -> Self {
        let night_seed =
            master_seed ^ (u64::from(night.index())).wrapping_mul(0xd1b5_4a32_d192_ed03);
        Self { night_seed }
    }

    pub fn for_subsystem_at_tick(&self, slot: SubsystemSlot, tick: Tick) -> SubsystemRng {
        let derived = self.night_seed
            ^ (slot as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
            ^ tick.wrapping_mul(0xbf58_476d_1ce4_e5b9);
        SubsystemRng::new(derived).with_name(slot.name())
    }
}

/// Stable slot assignments.
/// NEVER reorder or remove entries — only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum SubsystemSlot {
    Clock = 0,
    Power = 1,
    Adversary = 2,
    Outage = 3,
}

impl SubsystemSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clock => "clock",
            Self::Power => "power",
            Self::Adversary => "adversary",
            Self::Outage => "outage",
        }
    }
}
