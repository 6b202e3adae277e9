//! Per-frame coordinator.
//!
//! Runs the enabled detectors in a fixed order (faces and expressions,
//! hands and gestures, humans, then the drag state machine), hands the
//! events to subscribed sinks and reports stage timings.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::observations::{
    ExpressionObservation, FaceObservation, HumanObservation,
};
use crate::detection::infrastructure::expression_analyzer::ExpressionAnalyzer;
use crate::detection::infrastructure::human_region_detector::HumanRegionDetector;
use crate::hands::gesture_history::{GestureHistory, HistoryEntry};
use crate::hands::hand_detector::{HandDetector, HandObservation};
use crate::hands::HandSide;
use crate::interaction::drag_fsm::{self, DragEvent, DragInput, DragSession, ZoneRect};
use crate::pipeline::config::DetectionConfig;
use crate::pipeline::events::{DetectionEvent, EventSink, GestureEvent};
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::frame::Frame;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HandCounts {
    pub left: usize,
    pub right: usize,
}

/// Everything found in one frame. Owned by the caller.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameDetectionResult {
    pub frame_index: usize,
    pub timestamp: Duration,
    pub faces: Vec<FaceObservation>,
    pub hands: Vec<HandObservation>,
    pub humans: Vec<HumanObservation>,
    pub expressions: Vec<ExpressionObservation>,
    pub gesture: Option<GestureEvent>,
    pub drag_event: Option<DragEvent>,
}

impl FrameDetectionResult {
    fn empty(frame: &Frame) -> Self {
        Self {
            frame_index: frame.index(),
            timestamp: frame.timestamp(),
            faces: Vec::new(),
            hands: Vec::new(),
            humans: Vec::new(),
            expressions: Vec::new(),
            gesture: None,
            drag_event: None,
        }
    }

    /// Highest-confidence hand; the first one found wins a tie.
    pub fn primary_hand(&self) -> Option<&HandObservation> {
        primary_by_confidence(&self.hands, |h| h.region.confidence)
    }

    pub fn primary_human(&self) -> Option<&HumanObservation> {
        primary_by_confidence(&self.humans, |h| h.region.confidence)
    }

    pub fn hand_counts(&self) -> HandCounts {
        self.hands
            .iter()
            .fold(HandCounts::default(), |mut counts, hand| {
                match hand.side {
                    HandSide::Left => counts.left += 1,
                    HandSide::Right => counts.right += 1,
                }
                counts
            })
    }
}

fn primary_by_confidence<T>(items: &[T], confidence: impl Fn(&T) -> f64) -> Option<&T> {
    items.iter().fold(None, |best: Option<&T>, item| match best {
        Some(b) if confidence(b) >= confidence(item) => Some(b),
        _ => Some(item),
    })
}

pub struct DetectionOrchestrator {
    face_detector: Box<dyn FaceDetector>,
    human_detector: HumanRegionDetector,
    expression_analyzer: ExpressionAnalyzer,
    session: DragSession,
    history: GestureHistory,
    sinks: Vec<Box<dyn EventSink>>,
    logger: Box<dyn PipelineLogger>,
}

impl DetectionOrchestrator {
    pub fn new(face_detector: Box<dyn FaceDetector>) -> Self {
        Self {
            face_detector,
            human_detector: HumanRegionDetector::new(),
            expression_analyzer: ExpressionAnalyzer::new(),
            session: DragSession::default(),
            history: GestureHistory::default(),
            sinks: Vec::new(),
            logger: Box::new(NullPipelineLogger),
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn session(&self) -> &DragSession {
        &self.session
    }

    pub fn history(&self) -> &GestureHistory {
        &self.history
    }

    /// Drops any pending or active drag and forgets past gestures.
    pub fn reset(&mut self) {
        self.session = DragSession::default();
        self.history.clear();
    }

    /// Emits the logger's end-of-run summary.
    pub fn finish(&self) {
        self.logger.summary();
    }

    pub fn process(&mut self, frame: &Frame, config: &DetectionConfig) -> FrameDetectionResult {
        let mut result = FrameDetectionResult::empty(frame);
        let mut timings: Vec<(&'static str, f64)> = Vec::new();

        // Faces and expressions
        let faces_ran = config.runs_face_detection();
        if faces_ran {
            let t0 = Instant::now();
            self.face_detector.set_scan_passes(&config.face_scan);
            result.faces = match self.face_detector.detect(frame) {
                Ok(faces) => faces,
                Err(e) => {
                    log::warn!("Face detection failed on frame {}: {e}", frame.index());
                    Vec::new()
                }
            };
            timings.push(("faces", elapsed_ms(t0)));

            if config.expressions && !result.faces.is_empty() {
                let t0 = Instant::now();
                let gray = frame.to_gray();
                result.expressions = result
                    .faces
                    .iter()
                    .filter_map(|f| self.expression_analyzer.analyze(&gray, &f.region))
                    .collect();
                timings.push(("expressions", elapsed_ms(t0)));
            }
        }

        // Hands and gestures
        if config.runs_hand_detection() {
            let t0 = Instant::now();
            let detector = HandDetector::new(config.orientation);
            let faces = faces_ran.then_some(result.faces.as_slice());
            result.hands = detector.detect(frame, config.hand_preset(), &config.skin, faces);
            timings.push(("hands", elapsed_ms(t0)));

            if config.gestures {
                result.gesture = result.primary_hand().map(|hand| GestureEvent {
                    gesture: hand.gesture,
                    side: hand.side,
                    position: hand.region.center(),
                    timestamp: frame.timestamp(),
                });
                if let Some(event) = result.gesture {
                    self.history.push(HistoryEntry {
                        gesture: event.gesture,
                        side: event.side,
                        position: event.position,
                        timestamp: event.timestamp,
                    });
                }
            }
        }

        if config.humans {
            let t0 = Instant::now();
            result.humans = self.human_detector.detect(frame, &config.human);
            timings.push(("humans", elapsed_ms(t0)));
        }

        // Drag. With gestures off the machine still steps on an empty input,
        // so a pending hold lapses and an active drag stops.
        let zone = config
            .drag
            .zone
            .unwrap_or_else(|| ZoneRect::default_for_frame(frame.width(), frame.height()));
        let input = result.gesture.map(|g| DragInput {
            gesture: g.gesture,
            position: g.position,
        });
        let (session, event) = drag_fsm::advance(
            self.session,
            input,
            zone,
            frame.timestamp(),
            config.hold_threshold(),
        );
        self.session = session;
        result.drag_event = event;
        if let Some(event) = event {
            self.logger.info(&describe_drag(frame.index(), &event));
        }

        self.publish(&result);

        for (stage, ms) in timings {
            self.logger.timing(stage, ms);
        }
        self.logger.metric("faces", result.faces.len() as f64);
        self.logger.metric("hands", result.hands.len() as f64);
        self.logger.metric("humans", result.humans.len() as f64);
        self.logger.frame_done(frame.index());

        result
    }

    fn publish(&mut self, result: &FrameDetectionResult) {
        if self.sinks.is_empty() {
            return;
        }
        let events = result
            .gesture
            .map(DetectionEvent::Gesture)
            .into_iter()
            .chain(result.drag_event.map(DetectionEvent::Drag));
        for event in events {
            for sink in &mut self.sinks {
                sink.publish(&event);
            }
        }
    }
}

fn describe_drag(frame_index: usize, event: &DragEvent) -> String {
    match event {
        DragEvent::Started { position, .. } => format!(
            "Drag started on frame {frame_index} at ({:.0}, {:.0})",
            position.0, position.1
        ),
        DragEvent::Stopped { held_for, .. } => format!(
            "Drag stopped on frame {frame_index} after {:.2}s",
            held_for.as_secs_f64()
        ),
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
