//! Stump-based Haar cascade evaluated over integral images.
//!
//! Models are JSON documents:
//!
//! ```json
//! {
//!   "window": [24, 24],
//!   "stages": [
//!     { "threshold": 0.5,
//!       "classifiers": [
//!         { "rects": [[0, 0, 24, 12, 1.0], [0, 12, 24, 12, -1.0]],
//!           "threshold": 0.2, "left": -1.0, "right": 1.0 } ] }
//!   ]
//! }
//! ```
//!
//! A feature is the weighted sum of its rectangle sums divided by the window
//! area, compared against `threshold · σ` where σ is the window's standard
//! deviation. Rectangles are given in base-window coordinates and scaled with
//! the window; at every scale a rectangle contributes its mean intensity
//! times its base-window area.

use std::path::{Path, PathBuf};

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::integral_image::{integral_image, integral_squared_image};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::math::group_rectangles;
use crate::detection::domain::scan_params::ScanParams;

/// Rectangle-similarity tolerance used when grouping raw hits.
pub const GROUP_EPS: f64 = 0.2;

#[derive(Debug, Error)]
pub enum CascadeLoadError {
    #[error("cannot read cascade model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed cascade model: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid cascade model: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stump {
    /// `[x, y, w, h, weight]` in base-window pixels.
    pub rects: Vec<[f64; 5]>,
    pub threshold: f64,
    pub left: f64,
    pub right: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub threshold: f64,
    pub classifiers: Vec<Stump>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CascadeModel {
    pub window: [u32; 2],
    pub stages: Vec<Stage>,
}

impl CascadeModel {
    pub fn from_json_str(json: &str) -> Result<Self, CascadeLoadError> {
        let model: CascadeModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_file(path: &Path) -> Result<Self, CascadeLoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| CascadeLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    fn validate(&self) -> Result<(), CascadeLoadError> {
        let [ww, wh] = self.window;
        if ww == 0 || wh == 0 {
            return Err(CascadeLoadError::Invalid(format!(
                "window must be non-empty, got {ww}x{wh}"
            )));
        }
        if self.stages.is_empty() {
            return Err(CascadeLoadError::Invalid("model has no stages".into()));
        }
        for (si, stage) in self.stages.iter().enumerate() {
            if stage.classifiers.is_empty() {
                return Err(CascadeLoadError::Invalid(format!(
                    "stage {si} has no classifiers"
                )));
            }
            for stump in &stage.classifiers {
                if stump.rects.is_empty() {
                    return Err(CascadeLoadError::Invalid(format!(
                        "stage {si} has a classifier without rectangles"
                    )));
                }
                for &[x, y, w, h, _] in &stump.rects {
                    let inside = x >= 0.0
                        && y >= 0.0
                        && w > 0.0
                        && h > 0.0
                        && x + w <= ww as f64
                        && y + h <= wh as f64;
                    if !inside {
                        return Err(CascadeLoadError::Invalid(format!(
                            "stage {si}: rectangle [{x}, {y}, {w}, {h}] leaves the {ww}x{wh} window"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// A grouped detection and the number of raw hits that formed it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredRect {
    pub rect: Rect,
    pub neighbors: usize,
}

/// Anything that can scan a grayscale image for objects at multiple scales.
pub trait ObjectClassifier: Send {
    fn detect_multi_scale(&self, gray: &GrayImage, params: &ScanParams) -> Vec<ScoredRect>;
}

type Integral = ImageBuffer<Luma<u64>, Vec<u64>>;

struct IntegralPair {
    sum: Integral,
    sq: Integral,
}

impl IntegralPair {
    fn new(gray: &GrayImage) -> Self {
        Self {
            sum: integral_image::<_, u64>(gray),
            sq: integral_squared_image::<_, u64>(gray),
        }
    }

    fn rect_sum(table: &Integral, x: u32, y: u32, w: u32, h: u32) -> f64 {
        let at = |px: u32, py: u32| table.get_pixel(px, py)[0] as i128;
        (at(x + w, y + h) - at(x, y + h) - at(x + w, y) + at(x, y)) as f64
    }
}

/// Viola-Jones cascade over a [`CascadeModel`].
#[derive(Clone, Debug)]
pub struct HaarCascade {
    model: CascadeModel,
}

impl HaarCascade {
    pub fn new(model: CascadeModel) -> Self {
        Self { model }
    }

    pub fn from_file(path: &Path) -> Result<Self, CascadeLoadError> {
        CascadeModel::from_file(path).map(Self::new)
    }

    pub fn window(&self) -> (u32, u32) {
        (self.model.window[0], self.model.window[1])
    }

    fn passes(&self, ii: &IntegralPair, x: u32, y: u32, scale: f64, ww: u32, wh: u32) -> bool {
        let area = (ww * wh) as f64;
        let mean = IntegralPair::rect_sum(&ii.sum, x, y, ww, wh) / area;
        let var = IntegralPair::rect_sum(&ii.sq, x, y, ww, wh) / area - mean * mean;
        let std = if var > 1.0 { var.sqrt() } else { 1.0 };
        let [base_w, base_h] = self.model.window;
        let base_area = (base_w * base_h) as f64;

        self.model.stages.iter().all(|stage| {
            let score: f64 = stage
                .classifiers
                .iter()
                .map(|stump| {
                    let feature: f64 = stump
                        .rects
                        .iter()
                        .map(|&[rx, ry, rw, rh, weight]| {
                            weight * rw * rh * scaled_rect_mean(ii, x, y, ww, wh, [rx, ry, rw, rh], scale)
                        })
                        .sum::<f64>()
                        / base_area;
                    if feature < stump.threshold * std {
                        stump.left
                    } else {
                        stump.right
                    }
                })
                .sum();
            score >= stage.threshold
        })
    }
}

/// Mean intensity under a base-window rectangle scaled into the window at
/// `(x, y)`. Rounding changes each rectangle's area independently, so sums
/// are compared as means to keep zero-sum features at zero on flat input.
fn scaled_rect_mean(
    ii: &IntegralPair,
    x: u32,
    y: u32,
    ww: u32,
    wh: u32,
    [rx, ry, rw, rh]: [f64; 4],
    scale: f64,
) -> f64 {
    let sx = ((rx * scale).round() as u32).min(ww - 1);
    let sy = ((ry * scale).round() as u32).min(wh - 1);
    let sw = ((rw * scale).round() as u32).clamp(1, ww - sx);
    let sh = ((rh * scale).round() as u32).clamp(1, wh - sy);
    IntegralPair::rect_sum(&ii.sum, x + sx, y + sy, sw, sh) / (sw * sh) as f64
}

impl ObjectClassifier for HaarCascade {
    fn detect_multi_scale(&self, gray: &GrayImage, params: &ScanParams) -> Vec<ScoredRect> {
        let (img_w, img_h) = gray.dimensions();
        let (base_w, base_h) = self.window();
        if img_w < base_w || img_h < base_h || params.scale_factor <= 1.0 {
            return Vec::new();
        }
        let ii = IntegralPair::new(gray);

        let mut hits = Vec::new();
        let mut scale = 1.0;
        loop {
            let ww = (base_w as f64 * scale).round() as u32;
            let wh = (base_h as f64 * scale).round() as u32;
            if ww > img_w || wh > img_h || ww.max(wh) > params.max_size {
                break;
            }
            if ww.min(wh) >= params.min_size {
                let step = ((scale * 2.0).round() as u32).max(1);
                for y in (0..=img_h - wh).step_by(step as usize) {
                    for x in (0..=img_w - ww).step_by(step as usize) {
                        if self.passes(&ii, x, y, scale, ww, wh) {
                            hits.push(Rect::at(x as i32, y as i32).of_size(ww, wh));
                        }
                    }
                }
            }
            scale *= params.scale_factor;
        }

        group_rectangles(&hits, params.min_neighbors, GROUP_EPS)
            .into_iter()
            .map(|(rect, neighbors)| ScoredRect { rect, neighbors })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_rect_mut;
    use rstest::rstest;
    use std::io::Write;

    /// One stage, one stump: bright upper half over a dark lower half.
    const EDGE_MODEL: &str = r#"{
        "window": [10, 10],
        "stages": [
            { "threshold": 0.5,
              "classifiers": [
                { "rects": [[0, 0, 10, 5, 1.0], [0, 5, 10, 5, -1.0]],
                  "threshold": 0.2, "left": -1.0, "right": 1.0 } ] }
        ]
    }"#;

    fn params(min_neighbors: usize) -> ScanParams {
        ScanParams {
            scale_factor: 1.2,
            min_neighbors,
            min_size: 10,
            max_size: 40,
        }
    }

    #[test]
    fn test_model_parses_and_validates() {
        let model = CascadeModel::from_json_str(EDGE_MODEL).unwrap();
        assert_eq!(model.window, [10, 10]);
        assert_eq!(model.stages[0].classifiers[0].rects.len(), 2);
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let err = CascadeModel::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, CascadeLoadError::Parse(_)));
    }

    #[test]
    fn test_rect_outside_window_is_invalid() {
        let json = EDGE_MODEL.replace("[0, 5, 10, 5, -1.0]", "[0, 8, 10, 5, -1.0]");
        let err = CascadeModel::from_json_str(&json).unwrap_err();
        assert!(matches!(err, CascadeLoadError::Invalid(_)));
    }

    #[test]
    fn test_empty_stages_are_invalid() {
        let err = CascadeModel::from_json_str(r#"{"window": [10, 10], "stages": []}"#).unwrap_err();
        assert!(matches!(err, CascadeLoadError::Invalid(_)));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = HaarCascade::from_file(Path::new("/nonexistent/cascade.json")).unwrap_err();
        assert!(matches!(err, CascadeLoadError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/cascade.json"));
    }

    #[test]
    fn test_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EDGE_MODEL.as_bytes()).unwrap();
        let cascade = HaarCascade::from_file(file.path()).unwrap();
        assert_eq!(cascade.window(), (10, 10));
    }

    #[rstest]
    #[case::scale_1_1(1.1)]
    #[case::scale_1_2(1.2)]
    #[case::scale_1_3(1.3)]
    fn test_flat_image_has_no_detections(#[case] scale_factor: f64) {
        let cascade = HaarCascade::new(CascadeModel::from_json_str(EDGE_MODEL).unwrap());
        let gray = GrayImage::from_pixel(120, 120, Luma([128]));
        let scan = ScanParams {
            scale_factor,
            max_size: 120,
            ..params(0)
        };
        assert!(cascade.detect_multi_scale(&gray, &scan).is_empty());
    }

    #[test]
    fn test_horizontal_ramp_has_no_detections() {
        // Columns vary, rows do not: the top and bottom halves always match.
        let cascade = HaarCascade::new(CascadeModel::from_json_str(EDGE_MODEL).unwrap());
        let gray = GrayImage::from_fn(120, 120, |x, _| Luma([(x * 2) as u8]));
        let scan = ScanParams {
            max_size: 120,
            ..params(0)
        };
        assert!(cascade.detect_multi_scale(&gray, &scan).is_empty());
    }

    #[test]
    fn test_scaled_rect_mean_ignores_rounding() {
        let gray = GrayImage::from_pixel(40, 40, Luma([90]));
        let ii = IntegralPair::new(&gray);
        // 10x5 rectangles at scale 1.728 round to 17x9 and 17x8.
        let top = scaled_rect_mean(&ii, 0, 0, 17, 17, [0.0, 0.0, 10.0, 5.0], 1.728);
        let bottom = scaled_rect_mean(&ii, 0, 0, 17, 17, [0.0, 5.0, 10.0, 5.0], 1.728);
        assert_eq!(top, 90.0);
        assert_eq!(bottom, 90.0);
    }

    #[test]
    fn test_finds_bright_over_dark_pattern() {
        let cascade = HaarCascade::new(CascadeModel::from_json_str(EDGE_MODEL).unwrap());
        let mut gray = GrayImage::new(60, 60);
        draw_filled_rect_mut(&mut gray, Rect::at(20, 20).of_size(20, 10), Luma([255u8]));

        let found = cascade.detect_multi_scale(&gray, &params(1));
        assert!(!found.is_empty());
        for hit in &found {
            let cx = hit.rect.left() + hit.rect.width() as i32 / 2;
            let cy = hit.rect.top() + hit.rect.height() as i32 / 2;
            assert!((15..=45).contains(&cx), "centre x {cx}");
            assert!((20..=40).contains(&cy), "centre y {cy}");
            assert!(hit.neighbors > 1);
        }
    }

    #[test]
    fn test_image_smaller_than_window_is_skipped() {
        let cascade = HaarCascade::new(CascadeModel::from_json_str(EDGE_MODEL).unwrap());
        let gray = GrayImage::new(8, 8);
        assert!(cascade.detect_multi_scale(&gray, &params(0)).is_empty());
    }
}
