//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scheduler frame. One frame = one call to `GameSession::advance`.
pub type Tick = u64;

/// Simulated milliseconds.
pub type Millis = u64;

/// Stable identifier of a room (and of the camera watching it).
pub type RoomId = String;

/// Stable identifier of an adversary, taken from the layout.
pub type AdversaryId = String;

/// The two doors of the office.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// The night being played. Immutable once a session starts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Night {
    index: u32,
}

impl Night {
    /// Nights are 1-based; an index of 0 is clamped to the first night.
    pub fn new(index: u32) -> Self {
        Self { index: index.max(1) }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn next(self) -> Self {
        Self { index: self.index.saturating_add(1) }
    }
}

impl Default for Night {
    fn default() -> Self {
        Self::new(1)
    }
}

/// A one-shot delay measured in simulated milliseconds.
///
/// Owned by whatever state it delays; dropping the owner cancels it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Countdown {
    remaining: Millis,
}

impl Countdown {
    pub fn new(duration: Millis) -> Self {
        Self { remaining: duration }
    }

    /// Consume up to `dt`. Once the countdown has run out, returns the
    /// part of `dt` left over past the expiry.
    pub fn consume(&mut self, dt: Millis) -> Option<Millis> {
        if dt < self.remaining {
            self.remaining -= dt;
            return None;
        }
        let left = dt - self.remaining;
        self.remaining = 0;
        Some(left)
    }

    pub fn remaining(&self) -> Millis {
        self.remaining
    }
}

/// Report a broken internal invariant.
///
/// Debug builds fail loudly; release builds log and carry on so a live
/// session is never brought down by it.
#[macro_export]
macro_rules! invariant_violation {
    ($($arg:tt)*) => {{
        debug_assert!(false, $($arg)*);
        log::error!("invariant violation: {}", format_args!($($arg)*));
    }};
}
