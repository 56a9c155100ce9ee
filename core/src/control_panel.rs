//! Player-controlled office state: doors, lights, camera.
//!
//! Lights and the camera view are never on together. Once locked out
//! (power gone) every control reads off/open and commands are ignored.

use crate::{
    command::{CommandOutcome, IgnoreReason},
    types::{RoomId, Side},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlPanel {
    doors_closed: [bool; 2],
    lights_on:    [bool; 2],
    camera_open:  bool,
    camera:       RoomId,
    locked:       bool,
}

impl ControlPanel {
    pub fn new(initial_camera: RoomId) -> Self {
        Self {
            doors_closed: [false; 2],
            lights_on: [false; 2],
            camera_open: false,
            camera: initial_camera,
            locked: false,
        }
    }

    pub fn door_closed(&self, side: Side) -> bool {
        self.doors_closed[side.index()]
    }

    pub fn light_on(&self, side: Side) -> bool {
        self.lights_on[side.index()]
    }

    pub fn camera_open(&self) -> bool {
        self.camera_open
    }

    pub fn camera(&self) -> &RoomId {
        &self.camera
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// True while the camera view is up and pointed at `room`.
    pub fn observing(&self, room: &str) -> bool {
        self.camera_open && self.camera == room
    }

    pub fn toggle_door(&mut self, side: Side) -> CommandOutcome {
        if self.locked {
            return CommandOutcome::Ignored(IgnoreReason::PanelLocked);
        }
        let door = &mut self.doors_closed[side.index()];
        *door = !*door;
        CommandOutcome::Applied
    }

    pub fn set_light(&mut self, side: Side, on: bool) -> CommandOutcome {
        if self.locked {
            return CommandOutcome::Ignored(IgnoreReason::PanelLocked);
        }
        if on && self.camera_open {
            return CommandOutcome::Ignored(IgnoreReason::CameraOpen);
        }
        let light = &mut self.lights_on[side.index()];
        if *light == on {
            return CommandOutcome::Ignored(IgnoreReason::NoChange);
        }
        *light = on;
        CommandOutcome::Applied
    }

    pub fn toggle_camera_view(&mut self) -> CommandOutcome {
        if self.locked {
            return CommandOutcome::Ignored(IgnoreReason::PanelLocked);
        }
        self.camera_open = !self.camera_open;
        if self.camera_open {
            self.lights_on = [false; 2];
        }
        CommandOutcome::Applied
    }

    /// Point the camera at `room`. The caller has already checked that
    /// the room exists.
    pub fn select_camera(&mut self, room: RoomId) -> CommandOutcome {
        if self.locked {
            return CommandOutcome::Ignored(IgnoreReason::PanelLocked);
        }
        if self.camera == room {
            return CommandOutcome::Ignored(IgnoreReason::NoChange);
        }
        self.camera = room;
        CommandOutcome::Applied
    }

    /// Power is gone: doors swing open, lights and camera die, and the
    /// panel stops responding.
    pub fn lock_out(&mut self) {
        self.doors_closed = [false; 2];
        self.lights_on = [false; 2];
        self.camera_open = false;
        self.locked = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> ControlPanel {
        ControlPanel::new("show_stage".into())
    }

    #[test]
    fn lights_and_camera_are_mutually_exclusive() {
        let mut p = panel();
        assert!(p.set_light(Side::Left, true).is_applied());
        assert!(p.set_light(Side::Right, true).is_applied());
        assert!(p.toggle_camera_view().is_applied());
        assert!(!p.light_on(Side::Left) && !p.light_on(Side::Right));
        assert_eq!(
            p.set_light(Side::Left, true),
            CommandOutcome::Ignored(IgnoreReason::CameraOpen)
        );
        assert!(!p.light_on(Side::Left));
    }

    #[test]
    fn observing_requires_open_camera_on_that_room() {
        let mut p = panel();
        p.select_camera("curtain_cove".into());
        assert!(!p.observing("curtain_cove"));
        p.toggle_camera_view();
        assert!(p.observing("curtain_cove"));
        assert!(!p.observing("show_stage"));
    }

    #[test]
    fn lock_out_forces_everything_off_and_ignores_commands() {
        let mut p = panel();
        p.toggle_door(Side::Left);
        p.toggle_door(Side::Right);
        p.toggle_camera_view();
        p.lock_out();
        assert!(!p.door_closed(Side::Left) && !p.door_closed(Side::Right));
        assert!(!p.camera_open());
        assert_eq!(p.toggle_door(Side::Left), CommandOutcome::Ignored(IgnoreReason::PanelLocked));
        assert_eq!(p.toggle_camera_view(), CommandOutcome::Ignored(IgnoreReason::PanelLocked));
        assert!(!p.door_closed(Side::Left));
    }
}
