use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use serde::{Deserialize, Serialize};

use crate::shared::constants::{SKIN_HSV_LOWER, SKIN_HSV_UPPER};
use crate::shared::frame::Frame;

pub const MASK_ON: u8 = 255;

/// Inclusive HSV box on the OpenCV 8-bit scale: H in `0..180`, S and V in `0..=255`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c])
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|c| self.lower[c] > self.upper[c])
    }
}

impl Default for HsvRange {
    fn default() -> Self {
        Self {
            lower: SKIN_HSV_LOWER,
            upper: SKIN_HSV_UPPER,
        }
    }
}

/// RGB → HSV with OpenCV's 8-bit conventions (hue halved to fit a byte).
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let s = if max == 0.0 { 0.0 } else { delta * 255.0 / max };

    let h = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [
        ((h / 2.0).round() as u16 % 180) as u8,
        s.round().clamp(0.0, 255.0) as u8,
        max as u8,
    ]
}

/// Classifies pixels as skin by HSV range, then closes and opens the mask
/// with a disk-shaped structuring element to fill gaps and drop speckle.
#[derive(Clone, Debug)]
pub struct ColorSegmenter {
    range: HsvRange,
    morph_radius: u8,
}

impl ColorSegmenter {
    pub fn new(range: HsvRange, morph_radius: u8) -> Self {
        Self {
            range,
            morph_radius,
        }
    }

    pub fn range(&self) -> &HsvRange {
        &self.range
    }

    pub fn morph_radius(&self) -> u8 {
        self.morph_radius
    }

    /// Binary mask with the frame's dimensions: 255 = skin, 0 = background.
    pub fn segment(&self, frame: &Frame) -> GrayImage {
        let raw: Vec<u8> = frame
            .rgb_pixels()
            .map(|(r, g, b)| {
                if self.range.contains(rgb_to_hsv(r, g, b)) {
                    MASK_ON
                } else {
                    0
                }
            })
            .collect();
        let mask = GrayImage::from_raw(frame.width(), frame.height(), raw)
            .expect("mask buffer matches frame dimensions");
        let cleaned = self.clean(&mask);
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "Frame {}: {} skin pixels ({} before cleanup)",
                frame.index(),
                count_on(&cleaned),
                count_on(&mask)
            );
        }
        cleaned
    }

    fn clean(&self, mask: &GrayImage) -> GrayImage {
        if self.morph_radius == 0 {
            return mask.clone();
        }
        let closed = close(mask, Norm::L2, self.morph_radius);
        open(&closed, Norm::L2, self.morph_radius)
    }
}

pub fn count_on(mask: &GrayImage) -> usize {
    mask.pixels().filter(|&&Luma([v])| v > 0).count()
}
