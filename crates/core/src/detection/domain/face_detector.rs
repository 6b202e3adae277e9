use crate::detection::domain::observations::FaceObservation;
use crate::detection::domain::scan_params::FaceScanPasses;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// Implementations may keep per-session state (a disabled model, scan
/// parameters), hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame)
        -> Result<Vec<FaceObservation>, Box<dyn std::error::Error>>;

    /// Scan settings for the following `detect` calls. Detectors without a
    /// multi-scale scan ignore them.
    fn set_scan_passes(&mut self, _passes: &FaceScanPasses) {}
}
