use serde::{Deserialize, Serialize};
use crate::types::{RoomId, Side};

/// All player-issued commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Session control ───────────────────────────
    StartNight { index: u32 },
    RestartNight,
    AdvanceNight,
    ReturnToMenu,

    // ── Office controls ───────────────────────────
    ToggleDoor { side: Side },
    SetLight { side: Side, on: bool },
    ToggleCamera,
    SelectCamera { room: RoomId },
}

/// What became of a command. Commands never fail; they are either
/// applied synchronously or ignored with a reason.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum CommandOutcome {
    Applied,
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// The session is not in a state that accepts this command.
    NotActive,
    /// A night is already being played.
    AlreadyRunning,
    /// Power is gone; the panel is dead.
    PanelLocked,
    /// Lights cannot come on while the camera view is up.
    CameraOpen,
    UnknownRoom,
    NoChange,
}

impl CommandOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, CommandOutcome::Applied)
    }
}
