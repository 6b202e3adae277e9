//! Timed drag gesture: hold a closed hand inside the interaction zone long
//! enough and a drag starts; let go (or leave the zone) and it stops.
//!
//! The transition function is pure. The caller owns the [`DragSession`] and
//! threads it through every frame.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::hands::gesture_classifier::Gesture;
use crate::shared::constants::{ZONE_BOTTOM_MARGIN, ZONE_LEFT, ZONE_TOP};

/// Axis-aligned rectangle; containment is strict on every edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoneRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ZoneRect {
    /// Left third of the frame inset by fixed margins.
    pub fn default_for_frame(frame_width: u32, frame_height: u32) -> Self {
        let right = frame_width as i32 / 3;
        let bottom = frame_height as i32 - ZONE_BOTTOM_MARGIN;
        Self {
            x: ZONE_LEFT,
            y: ZONE_TOP,
            width: right - ZONE_LEFT,
            height: bottom - ZONE_TOP,
        }
    }

    pub fn contains(&self, (px, py): (f64, f64)) -> bool {
        px > self.x as f64
            && px < (self.x + self.width) as f64
            && py > self.y as f64
            && py < (self.y + self.height) as f64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Pending { since: Duration },
    Dragging { since: Duration },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DragEvent {
    Started { at: Duration, position: (f64, f64) },
    Stopped { at: Duration, held_for: Duration },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    pub state: DragState,
    /// Zone used by the most recent transition.
    pub zone: Option<ZoneRect>,
}

impl Default for DragSession {
    fn default() -> Self {
        Self {
            state: DragState::Idle,
            zone: None,
        }
    }
}

impl DragSession {
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }
}

/// What the primary hand is doing this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragInput {
    pub gesture: Gesture,
    pub position: (f64, f64),
}

/// One step of the drag state machine.
///
/// `input` is `None` when no hand was seen. The qualifying condition is a
/// `Closed` gesture centred strictly inside `zone`.
pub fn advance(
    session: DragSession,
    input: Option<DragInput>,
    zone: ZoneRect,
    now: Duration,
    hold_threshold: Duration,
) -> (DragSession, Option<DragEvent>) {
    let qualifies = input.is_some_and(|i| i.gesture == Gesture::Closed && zone.contains(i.position));
    let at = |state| DragSession {
        state,
        zone: Some(zone),
    };

    match (session.state, qualifies) {
        (DragState::Idle, true) => (at(DragState::Pending { since: now }), None),
        (DragState::Idle, false) => (at(DragState::Idle), None),
        (DragState::Pending { since }, true) => {
            if now.saturating_sub(since) >= hold_threshold {
                log::info!("Drag started after {:.2}s hold", now.saturating_sub(since).as_secs_f64());
                let position = input.map(|i| i.position).unwrap_or_default();
                (
                    at(DragState::Dragging { since: now }),
                    Some(DragEvent::Started { at: now, position }),
                )
            } else {
                (at(DragState::Pending { since }), None)
            }
        }
        (DragState::Pending { .. }, false) => (at(DragState::Idle), None),
        (DragState::Dragging { since }, true) => (at(DragState::Dragging { since }), None),
        (DragState::Dragging { since }, false) => {
            let held_for = now.saturating_sub(since);
            log::info!("Drag stopped after {:.2}s", held_for.as_secs_f64());
            (
                at(DragState::Idle),
                Some(DragEvent::Stopped { at: now, held_for }),
            )
        }
    }
}
