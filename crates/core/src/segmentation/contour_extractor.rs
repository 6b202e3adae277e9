use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::shared::geometry::Contour;

/// Open interval `(min, max)` on contour area in square pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaBounds {
    pub min: f64,
    pub max: f64,
}

impl AreaBounds {
    pub fn contains(&self, area: f64) -> bool {
        area > self.min && area < self.max
    }
}

/// Open interval `(min, max)` on bounding-box `width / height`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AspectBounds {
    pub min: f64,
    pub max: f64,
}

impl AspectBounds {
    pub fn contains(&self, aspect: f64) -> bool {
        aspect > self.min && aspect < self.max
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContourFilter {
    pub area: AreaBounds,
    pub aspect: AspectBounds,
}

impl ContourFilter {
    pub fn basic_hand() -> Self {
        Self {
            area: AreaBounds {
                min: 3_000.0,
                max: 100_000.0,
            },
            aspect: AspectBounds { min: 0.5, max: 2.0 },
        }
    }

    pub fn gesture_hand() -> Self {
        Self {
            area: AreaBounds {
                min: 5_000.0,
                max: 50_000.0,
            },
            aspect: AspectBounds { min: 0.4, max: 2.5 },
        }
    }

    pub fn human() -> Self {
        Self {
            area: AreaBounds {
                min: crate::shared::constants::HUMAN_MIN_AREA,
                max: crate::shared::constants::HUMAN_MAX_AREA,
            },
            aspect: AspectBounds { min: 0.3, max: 1.2 },
        }
    }

    pub fn accepts(&self, area: f64, rect: &Rect) -> bool {
        self.area.contains(area) && self.aspect.contains(aspect_ratio(rect))
    }
}

/// A contour that passed the filter, with its precomputed measurements.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub contour: Contour,
    pub bbox: Rect,
    pub area: f64,
}

pub fn aspect_ratio(rect: &Rect) -> f64 {
    if rect.height() == 0 {
        0.0
    } else {
        rect.width() as f64 / rect.height() as f64
    }
}

/// Traces the outer borders of top-level mask components and keeps those
/// whose area and aspect ratio fall inside the filter.
#[derive(Clone, Debug, Default)]
pub struct ContourExtractor;

impl ContourExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, mask: &GrayImage, filter: &ContourFilter) -> Vec<Candidate> {
        find_contours::<i32>(mask)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .filter_map(|c| {
                let contour = Contour::new(c.points);
                let bbox = contour.bounding_rect()?;
                let area = contour.area();
                filter.accepts(area, &bbox).then_some(Candidate {
                    contour,
                    bbox,
                    area,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;

    fn mask_with(rects: &[(i32, i32, u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(300, 300);
        for &(x, y, w, h) in rects {
            draw_filled_rect_mut(&mut mask, Rect::at(x, y).of_size(w, h), Luma([255u8]));
        }
        mask
    }

    fn loose() -> ContourFilter {
        ContourFilter {
            area: AreaBounds {
                min: 100.0,
                max: 1e9,
            },
            aspect: AspectBounds {
                min: 0.1,
                max: 10.0,
            },
        }
    }

    #[test]
    fn test_empty_mask_yields_nothing() {
        let mask = GrayImage::new(50, 50);
        assert!(ContourExtractor::new().extract(&mask, &loose()).is_empty());
    }

    #[test]
    fn test_blob_bbox_and_area() {
        let mask = mask_with(&[(10, 20, 100, 50)]);
        let found = ContourExtractor::new().extract(&mask, &loose());
        assert_eq!(found.len(), 1);
        let c = &found[0];
        assert_eq!(
            (c.bbox.left(), c.bbox.top(), c.bbox.width(), c.bbox.height()),
            (10, 20, 100, 50)
        );
        // Traced border runs through pixel centres: (w-1)·(h-1).
        assert!((c.area - 99.0 * 49.0).abs() < 1.0);
    }

    #[test]
    fn test_holes_and_nested_blobs_are_not_reported() {
        let mut mask = mask_with(&[(10, 10, 200, 200)]);
        draw_filled_rect_mut(&mut mask, Rect::at(50, 50).of_size(100, 100), Luma([0u8]));
        draw_filled_rect_mut(&mut mask, Rect::at(80, 80).of_size(30, 30), Luma([255u8]));
        let found = ContourExtractor::new().extract(&mask, &loose());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bbox.width(), 200);
    }

    #[test]
    fn test_area_filter_is_exclusive() {
        let mask = mask_with(&[(10, 10, 11, 11), (100, 100, 60, 60)]);
        let filter = ContourFilter {
            area: AreaBounds {
                min: 100.0,
                max: 10_000.0,
            },
            ..loose()
        };
        let found = ContourExtractor::new().extract(&mask, &filter);
        // The 11x11 square traces to exactly 100 px² and sits on the bound.
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bbox.left(), 100);
    }

    #[test]
    fn test_aspect_filter_drops_wide_blobs() {
        let mask = mask_with(&[(10, 10, 200, 40), (10, 100, 60, 80)]);
        let found = ContourExtractor::new().extract(&mask, &ContourFilter::basic_hand());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bbox.top(), 100);
    }

    #[test]
    fn test_presets() {
        assert_eq!(ContourFilter::human().aspect.min, 0.3);
        assert_eq!(ContourFilter::gesture_hand().area.max, 50_000.0);
        assert!(ContourFilter::basic_hand().area.contains(3_001.0));
        assert!(!ContourFilter::basic_hand().area.contains(3_000.0));
    }
}
