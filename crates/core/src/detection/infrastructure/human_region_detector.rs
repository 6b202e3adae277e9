use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;
use serde::{Deserialize, Serialize};

use crate::detection::domain::observations::HumanObservation;
use crate::segmentation::contour_extractor::{ContourExtractor, ContourFilter};
use crate::shared::frame::Frame;
use crate::shared::geometry::polygon_area;
use crate::shared::region::{DetectionRegion, DEFAULT_IOU_THRESHOLD};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanDetectionParams {
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub close_radius: u8,
    pub filter: ContourFilter,
    /// Silhouettes rounder than this are rejected (heads, balls, lamps).
    pub max_circularity: f64,
    pub min_solidity: f64,
    pub min_confidence: f64,
    pub iou_threshold: f64,
}

impl Default for HumanDetectionParams {
    fn default() -> Self {
        Self {
            blur_sigma: 1.4,
            canny_low: 50.0,
            canny_high: 150.0,
            close_radius: 2,
            filter: ContourFilter::human(),
            max_circularity: 0.8,
            min_solidity: 0.7,
            min_confidence: 0.4,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }
}

/// Full-body candidates from closed edge contours.
///
/// Purely geometric: elongated, solid, not-too-round outlines inside the
/// configured area and aspect bounds. The first returned observation is the
/// primary human.
#[derive(Clone, Debug, Default)]
pub struct HumanRegionDetector {
    extractor: ContourExtractor,
}

impl HumanRegionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detect(&self, frame: &Frame, params: &HumanDetectionParams) -> Vec<HumanObservation> {
        let edges = self.edge_mask(&frame.to_gray(), params);

        let candidates: Vec<HumanObservation> = self
            .extractor
            .extract(&edges, &params.filter)
            .into_iter()
            .filter_map(|cand| {
                let circularity = cand.contour.circularity();
                if circularity >= params.max_circularity {
                    return None;
                }
                let hull: Vec<_> = cand
                    .contour
                    .convex_hull_indices()
                    .into_iter()
                    .map(|i| cand.contour.points()[i])
                    .collect();
                let hull_area = polygon_area(&hull);
                let solidity = if hull_area > 0.0 {
                    cand.area / hull_area
                } else {
                    0.0
                };
                if solidity <= params.min_solidity {
                    return None;
                }
                let confidence =
                    (0.8 * cand.area / params.filter.area.max + 0.2 * solidity).min(1.0);
                if confidence <= params.min_confidence {
                    return None;
                }
                Some(HumanObservation {
                    region: DetectionRegion::from_rect(cand.bbox, confidence),
                    circularity,
                    solidity,
                })
            })
            .collect();

        DetectionRegion::deduplicate(candidates, params.iou_threshold, |h| &h.region)
    }

    fn edge_mask(&self, gray: &GrayImage, params: &HumanDetectionParams) -> GrayImage {
        let blurred = gaussian_blur_f32(gray, params.blur_sigma);
        let edges = canny(&blurred, params.canny_low, params.canny_high);
        if params.close_radius == 0 {
            edges
        } else {
            close(&edges, Norm::LInf, params.close_radius)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::frame_from;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn canvas() -> RgbImage {
        RgbImage::new(640, 480)
    }

    fn detect(img: RgbImage) -> Vec<HumanObservation> {
        HumanRegionDetector::new().detect(&frame_from(img, 0), &HumanDetectionParams::default())
    }

    #[test]
    fn test_blank_frame_has_no_humans() {
        assert!(detect(canvas()).is_empty());
    }

    #[test]
    fn test_tall_solid_silhouette_is_detected() {
        let mut img = canvas();
        draw_filled_rect_mut(&mut img, Rect::at(100, 30).of_size(200, 420), WHITE);
        let humans = detect(img);
        assert_eq!(humans.len(), 1);
        let h = &humans[0];
        assert!((h.region.x - 100).abs() <= 3);
        assert!((h.region.height - 420).abs() <= 6);
        assert!(h.solidity > 0.9);
        assert!(h.circularity < 0.8);
        // 0.8 · 84000 / 300000 + 0.2 · ~1.0
        assert!(h.region.confidence > 0.4 && h.region.confidence < 0.45);
    }

    #[test]
    fn test_two_silhouettes_are_reported_in_scan_order() {
        let mut img = canvas();
        draw_filled_rect_mut(&mut img, Rect::at(20, 30).of_size(200, 420), WHITE);
        draw_filled_rect_mut(&mut img, Rect::at(400, 30).of_size(200, 420), WHITE);
        let humans = detect(img);
        assert_eq!(humans.len(), 2);
        assert!(humans[0].region.x < humans[1].region.x);
    }

    #[test]
    fn test_small_blobs_are_ignored() {
        let mut img = canvas();
        draw_filled_rect_mut(&mut img, Rect::at(100, 100).of_size(50, 80), WHITE);
        assert!(detect(img).is_empty());
    }

    #[test]
    fn test_round_silhouette_is_rejected() {
        let mut img = canvas();
        draw_filled_circle_mut(&mut img, (320, 240), 150, WHITE);
        assert!(detect(img).is_empty());
    }

    #[test]
    fn test_low_confidence_silhouette_is_rejected() {
        // Area ≈ 120·240 = 28800: 0.8 · 0.096 + 0.2 ≈ 0.28.
        let mut img = canvas();
        draw_filled_rect_mut(&mut img, Rect::at(100, 100).of_size(120, 240), WHITE);
        assert!(detect(img).is_empty());
    }
}
