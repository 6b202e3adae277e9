use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use serde::Serialize;

use crate::hands::gesture_classifier::Gesture;
use crate::hands::HandSide;
use crate::interaction::drag_fsm::DragEvent;

/// Gesture of the primary hand in one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GestureEvent {
    pub gesture: Gesture,
    pub side: HandSide,
    pub position: (f64, f64),
    pub timestamp: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionEvent {
    Gesture(GestureEvent),
    Drag(DragEvent),
}

/// Receives events as the orchestrator produces them.
///
/// Publishing must never block the frame loop.
pub trait EventSink: Send {
    fn publish(&mut self, event: &DetectionEvent);
}

/// Forwards events over a bounded channel; drops them when the consumer
/// falls behind or has gone away.
pub struct ChannelEventSink {
    tx: Sender<DetectionEvent>,
    dropped: usize,
}

impl ChannelEventSink {
    pub fn new(tx: Sender<DetectionEvent>) -> Self {
        Self { tx, dropped: 0 }
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl EventSink for ChannelEventSink {
    fn publish(&mut self, event: &DetectionEvent) {
        match self.tx.try_send(*event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                log::debug!("Event channel full, dropping {event:?}");
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
                log::debug!("Event receiver gone, dropping {event:?}");
            }
        }
    }
}

pub fn channel_sink(capacity: usize) -> (ChannelEventSink, Receiver<DetectionEvent>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    (ChannelEventSink::new(tx), rx)
}
