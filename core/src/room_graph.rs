//! Static room topology.
//!
//! Built once from a `LayoutConfig` and never mutated. Every lookup the
//! adversary AI performs at runtime goes through here, so the layout is
//! validated up front and runtime lookups treat a miss as an invariant
//! violation rather than an error.

use crate::{
    config::{LayoutConfig, OfficeAdjacent},
    error::{SimError, SimResult},
    types::{AdversaryId, RoomId, Side},
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub label: String,
    pub audio_only: bool,
}

#[derive(Debug, Clone)]
pub struct RoomGraph {
    rooms: BTreeMap<RoomId, Room>,
    paths: BTreeMap<AdversaryId, Vec<RoomId>>,
    office: RoomId,
    office_adjacent: OfficeAdjacent,
}

impl RoomGraph {
    pub fn from_layout(layout: &LayoutConfig) -> SimResult<Self> {
        let mut rooms = BTreeMap::new();
        for r in &layout.rooms {
            let room = Room { id: r.id.clone(), label: r.label.clone(), audio_only: r.audio_only };
            if rooms.insert(r.id.clone(), room).is_some() {
                return Err(SimError::layout(format!("duplicate room '{}'", r.id)));
            }
        }

        let known = |id: &RoomId, what: &str| -> SimResult<()> {
            if rooms.contains_key(id) {
                Ok(())
            } else {
                Err(SimError::layout(format!("{what} references unknown room '{id}'")))
            }
        };
        known(&layout.office, "office")?;
        known(&layout.office_adjacent.left, "office_adjacent.left")?;
        known(&layout.office_adjacent.right, "office_adjacent.right")?;
        if layout.office_adjacent.left == layout.office_adjacent.right {
            return Err(SimError::layout("both doors share one office-adjacent room"));
        }

        let mut paths = BTreeMap::new();
        for p in &layout.patrollers {
            if p.path.len() < 2 {
                return Err(SimError::layout(format!("path of '{}' is too short", p.id)));
            }
            let mut seen = BTreeSet::new();
            for room in &p.path {
                known(room, &format!("path of '{}'", p.id))?;
                if !seen.insert(room) {
                    return Err(SimError::layout(format!(
                        "path of '{}' visits '{room}' twice",
                        p.id
                    )));
                }
            }
            if p.path.last() != Some(&layout.office) {
                return Err(SimError::layout(format!("path of '{}' does not end at the office", p.id)));
            }
            let threshold = &p.path[p.path.len() - 2];
            if *threshold != layout.office_adjacent.left && *threshold != layout.office_adjacent.right {
                return Err(SimError::layout(format!(
                    "path of '{}' reaches the office without passing a door",
                    p.id
                )));
            }
            if paths.insert(p.id.clone(), p.path.clone()).is_some() {
                return Err(SimError::layout(format!("duplicate adversary '{}'", p.id)));
            }
        }

        let special = &layout.special;
        if paths.contains_key(&special.id) {
            return Err(SimError::layout(format!("duplicate adversary '{}'", special.id)));
        }
        known(&special.home, "special.home")?;
        known(&special.approach, "special.approach")?;

        Ok(Self {
            rooms,
            paths,
            office: layout.office.clone(),
            office_adjacent: layout.office_adjacent.clone(),
        })
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn office(&self) -> &RoomId {
        &self.office
    }

    pub fn is_office(&self, id: &str) -> bool {
        self.office == id
    }

    /// The room a door opens onto.
    pub fn office_adjacent(&self, side: Side) -> &RoomId {
        match side {
            Side::Left => &self.office_adjacent.left,
            Side::Right => &self.office_adjacent.right,
        }
    }

    /// Which door, if any, opens onto `room`.
    pub fn door_for(&self, room: &str) -> Option<Side> {
        Side::BOTH.into_iter().find(|s| self.office_adjacent(*s) == room)
    }

    pub fn path(&self, adversary: &str) -> Option<&[RoomId]> {
        self.paths.get(adversary).map(Vec::as_slice)
    }

    /// The threshold room of a patrol path: the step before the office.
    pub fn threshold_room(&self, adversary: &str) -> Option<&RoomId> {
        self.path(adversary).and_then(|p| p.iter().rev().nth(1))
    }

    pub fn next_room(&self, adversary: &str, current: &str) -> Option<&RoomId> {
        let path = self.path(adversary)?;
        let idx = path.iter().position(|r| r == current)?;
        path.get(idx + 1)
    }
}
