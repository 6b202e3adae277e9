use std::path::Path;

use imageproc::contrast::equalize_histogram;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::observations::FaceObservation;
use crate::detection::domain::scan_params::FaceScanPasses;
use crate::shared::frame::Frame;
use crate::shared::region::DetectionRegion;

use super::haar_cascade::{HaarCascade, ObjectClassifier};

/// Face detector backed by a frontal-face cascade.
///
/// A model that fails to load leaves the detector disabled for the rest of
/// the session: every call then returns an empty list.
pub struct CascadeFaceDetector {
    classifier: Option<Box<dyn ObjectClassifier>>,
    passes: FaceScanPasses,
}

impl CascadeFaceDetector {
    pub fn from_file(path: &Path, passes: FaceScanPasses) -> Self {
        match HaarCascade::from_file(path) {
            Ok(cascade) => {
                log::info!("Loaded face cascade from {}", path.display());
                Self::with_classifier(Box::new(cascade), passes)
            }
            Err(e) => {
                log::warn!("Face detection disabled: {e}");
                Self::disabled()
            }
        }
    }

    pub fn with_classifier(classifier: Box<dyn ObjectClassifier>, passes: FaceScanPasses) -> Self {
        Self {
            classifier: Some(classifier),
            passes,
        }
    }

    pub fn disabled() -> Self {
        Self {
            classifier: None,
            passes: FaceScanPasses::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.classifier.is_some()
    }
}

/// `n / (n + 2)` for a group of `n` raw hits.
pub fn group_confidence(neighbors: usize) -> f64 {
    let n = neighbors as f64;
    n / (n + 2.0)
}

impl FaceDetector for CascadeFaceDetector {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<FaceObservation>, Box<dyn std::error::Error>> {
        let Some(classifier) = self.classifier.as_ref() else {
            return Ok(Vec::new());
        };

        let gray = equalize_histogram(&frame.to_gray());
        let mut hits = classifier.detect_multi_scale(&gray, &self.passes.strict);
        if hits.is_empty() {
            hits = classifier.detect_multi_scale(&gray, &self.passes.permissive);
        }

        Ok(hits
            .into_iter()
            .map(|hit| FaceObservation {
                region: DetectionRegion::from_rect(hit.rect, group_confidence(hit.neighbors)),
            })
            .collect())
    }

    fn set_scan_passes(&mut self, passes: &FaceScanPasses) {
        self.passes = *passes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::scan_params::ScanParams;
    use crate::detection::infrastructure::haar_cascade::ScoredRect;
    use crate::test_support::{filled_frame, BACKGROUND};
    use approx::assert_relative_eq;
    use image::GrayImage;
    use imageproc::rect::Rect;
    use std::sync::{Arc, Mutex};

    /// Answers from a fixed table keyed by `min_neighbors`, recording calls.
    struct ScriptedClassifier {
        strict_hits: Vec<ScoredRect>,
        permissive_hits: Vec<ScoredRect>,
        calls: Arc<Mutex<Vec<usize>>>,
    }

    impl ObjectClassifier for ScriptedClassifier {
        fn detect_multi_scale(&self, _gray: &GrayImage, params: &ScanParams) -> Vec<ScoredRect> {
            self.calls.lock().unwrap().push(params.min_neighbors);
            if params.min_neighbors >= 2 {
                self.strict_hits.clone()
            } else {
                self.permissive_hits.clone()
            }
        }
    }

    fn hit(x: i32, neighbors: usize) -> ScoredRect {
        ScoredRect {
            rect: Rect::at(x, 10).of_size(40, 40),
            neighbors,
        }
    }

    fn scripted(
        strict: Vec<ScoredRect>,
        permissive: Vec<ScoredRect>,
    ) -> (CascadeFaceDetector, Arc<Mutex<Vec<usize>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let classifier = ScriptedClassifier {
            strict_hits: strict,
            permissive_hits: permissive,
            calls: Arc::clone(&calls),
        };
        (
            CascadeFaceDetector::with_classifier(Box::new(classifier), FaceScanPasses::default()),
            calls,
        )
    }

    #[test]
    fn test_missing_model_disables_detector_for_every_call() {
        let mut detector =
            CascadeFaceDetector::from_file(Path::new("/nonexistent/face.json"), FaceScanPasses::default());
        assert!(!detector.is_enabled());
        let frame = filled_frame(64, 48, BACKGROUND);
        for _ in 0..3 {
            assert!(detector.detect(&frame).unwrap().is_empty());
        }
    }

    #[test]
    fn test_unparsable_model_disables_detector() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "not a cascade").unwrap();
        let mut detector = CascadeFaceDetector::from_file(file.path(), FaceScanPasses::default());
        assert!(!detector.is_enabled());
        assert!(detector.detect(&filled_frame(32, 32, BACKGROUND)).unwrap().is_empty());
    }

    #[test]
    fn test_strict_hits_skip_permissive_pass() {
        let (mut detector, calls) = scripted(vec![hit(10, 3)], vec![hit(100, 1)]);
        let faces = detector.detect(&filled_frame(200, 100, BACKGROUND)).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].region.x, 10);
        assert_eq!(*calls.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_empty_strict_pass_falls_back_to_permissive() {
        let (mut detector, calls) = scripted(vec![], vec![hit(100, 2)]);
        let faces = detector.detect(&filled_frame(200, 100, BACKGROUND)).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].region.x, 100);
        assert_relative_eq!(faces[0].region.confidence, 0.5);
        assert_eq!(*calls.lock().unwrap(), vec![2, 1]);
    }

    #[test]
    fn test_scan_passes_follow_latest_settings() {
        let (mut detector, calls) = scripted(vec![], vec![]);
        let mut passes = FaceScanPasses::default();
        passes.strict.min_neighbors = 4;
        passes.permissive.min_neighbors = 0;
        detector.set_scan_passes(&passes);
        detector.detect(&filled_frame(200, 100, BACKGROUND)).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![4, 0]);
    }

    #[test]
    fn test_group_confidence_grows_with_neighbors() {
        assert_relative_eq!(group_confidence(2), 0.5);
        assert_relative_eq!(group_confidence(8), 0.8);
        assert!(group_confidence(100) < 1.0);
    }
}
