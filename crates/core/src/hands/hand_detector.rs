use serde::{Deserialize, Serialize};

use crate::detection::domain::observations::FaceObservation;
use crate::hands::gesture_classifier::{Gesture, GestureClassifier};
use crate::hands::orientation::{HandOrientationClassifier, OrientationThresholds};
use crate::hands::shape_analyzer::HandShapeAnalyzer;
use crate::hands::HandSide;
use crate::segmentation::color_segmenter::{ColorSegmenter, HsvRange};
use crate::segmentation::contour_extractor::{ContourExtractor, ContourFilter};
use crate::shared::constants::FACE_AWARE_MIN_HAND_AREA;
use crate::shared::frame::Frame;
use crate::shared::region::{DetectionRegion, DEFAULT_IOU_THRESHOLD};

/// Segmentation and counting parameters for one hand-detection mode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandPreset {
    pub morph_radius: u8,
    pub filter: ContourFilter,
    /// Minimum convexity-defect depth, in pixels, that counts as a finger gap.
    pub defect_depth: f64,
    pub min_confidence: f64,
}

impl HandPreset {
    /// Presence detection: light cleanup, generous area bounds.
    pub fn basic() -> Self {
        Self {
            morph_radius: 2,
            filter: ContourFilter::basic_hand(),
            defect_depth: 15.0,
            min_confidence: 0.3,
        }
    }

    /// Gesture recognition: heavier cleanup, tighter bounds, deeper gaps.
    pub fn gesture() -> Self {
        Self {
            morph_radius: 3,
            filter: ContourFilter::gesture_hand(),
            defect_depth: 20.0,
            min_confidence: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HandObservation {
    pub region: DetectionRegion,
    pub side: HandSide,
    pub finger_count: usize,
    pub gesture: Gesture,
    pub solidity: f64,
    pub compactness: f64,
    pub has_thumb: bool,
    pub has_index: bool,
}

/// Skin mask → contours → shape metrics → side → gesture.
#[derive(Clone, Debug, Default)]
pub struct HandDetector {
    extractor: ContourExtractor,
    orientation: HandOrientationClassifier,
    classifier: GestureClassifier,
}

impl HandDetector {
    pub fn new(orientation: OrientationThresholds) -> Self {
        Self {
            extractor: ContourExtractor::new(),
            orientation: HandOrientationClassifier::new(orientation),
            classifier: GestureClassifier::new(),
        }
    }

    /// `faces` is `Some` when face detection ran this frame. Hands are then
    /// held to a larger minimum area and skin blobs on a face are dropped.
    pub fn detect(
        &self,
        frame: &Frame,
        preset: &HandPreset,
        skin: &HsvRange,
        faces: Option<&[FaceObservation]>,
    ) -> Vec<HandObservation> {
        let mask = ColorSegmenter::new(*skin, preset.morph_radius).segment(frame);

        let mut filter = preset.filter;
        if faces.is_some() {
            filter.area.min = filter.area.min.max(FACE_AWARE_MIN_HAND_AREA);
        }
        let analyzer = HandShapeAnalyzer::new(preset.defect_depth);

        self.extractor
            .extract(&mask, &filter)
            .into_iter()
            .filter_map(|cand| {
                let bbox = DetectionRegion::from_rect(cand.bbox, 1.0);
                if faces.is_some_and(|faces| overlaps_face(&bbox, faces)) {
                    log::debug!("Dropping skin region at ({}, {}) on a face", bbox.x, bbox.y);
                    return None;
                }

                let side = self.orientation.classify(&cand.contour, cand.bbox, frame.width());
                let metrics = analyzer.analyze(&cand.contour, Some(side));
                let gesture = self.classifier.classify(metrics.finger_count, metrics.solidity);
                let confidence = self
                    .classifier
                    .confidence(metrics.finger_count, metrics.solidity);
                if confidence < preset.min_confidence {
                    return None;
                }

                Some(HandObservation {
                    region: DetectionRegion { confidence, ..bbox },
                    side,
                    finger_count: metrics.finger_count,
                    gesture,
                    solidity: metrics.solidity,
                    compactness: metrics.compactness,
                    has_thumb: metrics.has_thumb,
                    has_index: metrics.has_index,
                })
            })
            .collect()
    }
}

fn overlaps_face(hand: &DetectionRegion, faces: &[FaceObservation]) -> bool {
    let (cx, cy) = hand.center();
    faces.iter().any(|f| {
        f.region.iou(hand) > DEFAULT_IOU_THRESHOLD || f.region.contains_point(cx, cy)
    })
}
