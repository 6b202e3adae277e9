//! Per-call detection settings.
//!
//! A [`DetectionConfig`] is an immutable snapshot handed to every
//! `process` call, so toggling a detector between frames never races with a
//! frame in flight.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::scan_params::{FaceScanPasses, ScanParams};
use crate::detection::infrastructure::human_region_detector::HumanDetectionParams;
use crate::hands::hand_detector::HandPreset;
use crate::hands::orientation::OrientationThresholds;
use crate::interaction::drag_fsm::ZoneRect;
use crate::segmentation::color_segmenter::HsvRange;
use crate::segmentation::contour_extractor::ContourFilter;
use crate::shared::constants::DRAG_HOLD_THRESHOLD_SECS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragSettings {
    pub hold_threshold_secs: f64,
    /// Interaction zone; defaults to the left third of the frame.
    pub zone: Option<ZoneRect>,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            hold_threshold_secs: DRAG_HOLD_THRESHOLD_SECS,
            zone: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub faces: bool,
    pub hands: bool,
    pub gestures: bool,
    pub humans: bool,
    pub expressions: bool,
    pub skin: HsvRange,
    pub basic_hands: HandPreset,
    pub gesture_hands: HandPreset,
    pub face_scan: FaceScanPasses,
    pub human: HumanDetectionParams,
    pub orientation: OrientationThresholds,
    pub drag: DragSettings,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            faces: true,
            hands: true,
            gestures: true,
            humans: false,
            expressions: false,
            skin: HsvRange::default(),
            basic_hands: HandPreset::basic(),
            gesture_hands: HandPreset::gesture(),
            face_scan: FaceScanPasses::default(),
            human: HumanDetectionParams::default(),
            orientation: OrientationThresholds::default(),
            drag: DragSettings::default(),
        }
    }
}

impl DetectionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: DetectionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Face detection runs when faces or expressions are requested.
    pub fn runs_face_detection(&self) -> bool {
        self.faces || self.expressions
    }

    pub fn runs_hand_detection(&self) -> bool {
        self.hands || self.gestures
    }

    /// Gesture recognition needs the finer segmentation.
    pub fn hand_preset(&self) -> &HandPreset {
        if self.gestures {
            &self.gesture_hands
        } else {
            &self.basic_hands
        }
    }

    /// Hold time before a drag starts. Values `validate` would reject
    /// (negative, NaN, infinite) fall back to the default threshold.
    pub fn hold_threshold(&self) -> Duration {
        let secs = self.drag.hold_threshold_secs;
        if secs.is_finite() && secs >= 0.0 {
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        } else {
            log::warn!("Ignoring drag hold threshold {secs}, using {DRAG_HOLD_THRESHOLD_SECS}s");
            Duration::from_secs_f64(DRAG_HOLD_THRESHOLD_SECS)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.skin.is_empty() {
            return Err(invalid(format!(
                "skin range lower {:?} exceeds upper {:?}",
                self.skin.lower, self.skin.upper
            )));
        }
        check_filter("basic_hands", &self.basic_hands.filter)?;
        check_filter("gesture_hands", &self.gesture_hands.filter)?;
        check_filter("human", &self.human.filter)?;
        for (name, preset) in [("basic_hands", &self.basic_hands), ("gesture_hands", &self.gesture_hands)] {
            if !(preset.defect_depth >= 0.0) {
                return Err(invalid(format!("{name}.defect_depth must be >= 0")));
            }
        }
        check_scan("face_scan.strict", &self.face_scan.strict)?;
        check_scan("face_scan.permissive", &self.face_scan.permissive)?;

        let hold = self.drag.hold_threshold_secs;
        if !(hold.is_finite() && hold > 0.0) {
            return Err(invalid(format!(
                "drag.hold_threshold_secs must be positive, got {hold}"
            )));
        }
        if let Some(zone) = self.drag.zone {
            if zone.width <= 0 || zone.height <= 0 {
                return Err(invalid(format!(
                    "drag.zone must have positive size, got {}x{}",
                    zone.width, zone.height
                )));
            }
        }
        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

fn check_filter(name: &str, filter: &ContourFilter) -> Result<(), ConfigError> {
    if filter.area.min >= filter.area.max {
        return Err(invalid(format!(
            "{name}.filter.area: min {} must be below max {}",
            filter.area.min, filter.area.max
        )));
    }
    if filter.aspect.min >= filter.aspect.max {
        return Err(invalid(format!(
            "{name}.filter.aspect: min {} must be below max {}",
            filter.aspect.min, filter.aspect.max
        )));
    }
    Ok(())
}

fn check_scan(name: &str, scan: &ScanParams) -> Result<(), ConfigError> {
    if !(scan.scale_factor > 1.0) {
        return Err(invalid(format!(
            "{name}.scale_factor must exceed 1.0, got {}",
            scan.scale_factor
        )));
    }
    if scan.min_size > scan.max_size {
        return Err(invalid(format!(
            "{name}: min_size {} exceeds max_size {}",
            scan.min_size, scan.max_size
        )));
    }
    Ok(())
}
