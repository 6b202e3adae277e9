use imageproc::rect::Rect;
use serde::Serialize;

pub const DEFAULT_IOU_THRESHOLD: f64 = 0.3;

/// An axis-aligned detection box with a confidence score in `[0, 1]`.
///
/// Width and height are always positive; [`DetectionRegion::new`] refuses
/// degenerate boxes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DetectionRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f64,
}

impl DetectionRegion {
    pub fn new(x: i32, y: i32, width: i32, height: i32, confidence: f64) -> Option<Self> {
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(Self {
            x,
            y,
            width,
            height,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }

    pub fn from_rect(rect: Rect, confidence: f64) -> Self {
        Self {
            x: rect.left(),
            y: rect.top(),
            width: rect.width() as i32,
            height: rect.height() as i32,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        px >= self.x as f64
            && px < (self.x + self.width) as f64
            && py >= self.y as f64
            && py < (self.y + self.height) as f64
    }

    pub fn iou(&self, other: &DetectionRegion) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.width).min(other.x + other.width);
        let iy2 = (self.y + self.height).min(other.y + other.height);

        let inter = (ix2 - ix1).max(0) as f64 * (iy2 - iy1).max(0) as f64;
        if inter == 0.0 {
            return 0.0;
        }

        inter / (self.area() + other.area() - inter)
    }

    /// Greedy deduplication in input order: a region is kept only if its
    /// IoU with every previously-kept region is at or below the threshold.
    pub fn deduplicate<T, F>(items: Vec<T>, iou_threshold: f64, region_of: F) -> Vec<T>
    where
        F: Fn(&T) -> &DetectionRegion,
    {
        let mut kept: Vec<T> = Vec::with_capacity(items.len());
        for item in items {
            let candidate = region_of(&item);
            let dominated = kept
                .iter()
                .any(|k| candidate.iou(region_of(k)) > iou_threshold);
            if !dominated {
                kept.push(item);
            }
        }
        kept
    }
}
