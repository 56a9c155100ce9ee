//! HUD snapshot — the read-only view the presentation layer polls.
//!
//! This is a view of the live session, not a save state: nothing here
//! can be fed back in to resume a night.

use crate::{
    control_panel::ControlPanel,
    engine::SessionState,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HudSnapshot {
    /// Remaining power in [0, 100].
    pub power:       f64,
    /// Whole percent, as the HUD prints it.
    pub power_shown: u8,
    /// Usage meter, 1–5 bars.
    pub usage:       u8,
    pub hour:        u8,
    pub clock_label: String,
    pub night:       u32,
    pub state:       SessionState,
    pub panel:       ControlPanel,
}
