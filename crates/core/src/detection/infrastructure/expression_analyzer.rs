use image::imageops::crop_imm;
use image::GrayImage;
use imageproc::contrast::equalize_histogram;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use crate::detection::domain::observations::{ExpressionObservation, FacialExpression};
use crate::shared::region::DetectionRegion;

/// Faces shorter than this cannot be split into eye and mouth bands.
pub const MIN_FACE_HEIGHT: u32 = 5;

/// Intensity statistics of one horizontal band of a face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandStats {
    pub mean: f64,
    pub std_dev: f64,
    /// Shannon entropy of the 256-bin histogram, in bits.
    pub entropy: f64,
}

impl BandStats {
    pub fn of(band: &GrayImage) -> Self {
        let n = (band.width() * band.height()) as f64;
        if n == 0.0 {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
                entropy: 0.0,
            };
        }
        let mut hist = [0u32; 256];
        for p in band.pixels() {
            hist[p[0] as usize] += 1;
        }
        let mean = hist
            .iter()
            .enumerate()
            .map(|(v, &c)| v as f64 * c as f64)
            .sum::<f64>()
            / n;
        let var = hist
            .iter()
            .enumerate()
            .map(|(v, &c)| (v as f64 - mean).powi(2) * c as f64)
            .sum::<f64>()
            / n;
        let entropy = hist
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / n;
                -p * p.log2()
            })
            .sum();
        Self {
            mean,
            std_dev: var.sqrt(),
            entropy,
        }
    }
}

/// Mean Sobel gradient magnitude.
pub fn mean_gradient(band: &GrayImage) -> f64 {
    let n = (band.width() * band.height()) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let gx = horizontal_sobel(band);
    let gy = vertical_sobel(band);
    gx.pixels()
        .zip(gy.pixels())
        .map(|(x, y)| {
            let (x, y) = (x[0] as f64, y[0] as f64);
            (x * x + y * y).sqrt()
        })
        .sum::<f64>()
        / n
}

/// Rule-based expression guess from eye and mouth band statistics.
#[derive(Clone, Debug, Default)]
pub struct ExpressionAnalyzer;

impl ExpressionAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// `None` when the face box, clipped to the frame, is too small.
    pub fn analyze(&self, gray: &GrayImage, face: &DetectionRegion) -> Option<ExpressionObservation> {
        let x0 = face.x.max(0) as u32;
        let y0 = face.y.max(0) as u32;
        let x1 = ((face.x + face.width).max(0) as u32).min(gray.width());
        let y1 = ((face.y + face.height).max(0) as u32).min(gray.height());
        if x1 <= x0 || y1 <= y0 || y1 - y0 < MIN_FACE_HEIGHT {
            return None;
        }

        let roi = equalize_histogram(&crop_imm(gray, x0, y0, x1 - x0, y1 - y0).to_image());
        let (w, h) = roi.dimensions();
        let eyes = crop_imm(&roi, 0, h / 5, w, 2 * h / 5 - h / 5).to_image();
        let mouth = crop_imm(&roi, 0, 3 * h / 5, w, 4 * h / 5 - 3 * h / 5).to_image();

        let expression = classify(&BandStats::of(&eyes), &BandStats::of(&mouth), mean_gradient(&mouth));
        Some(ExpressionObservation {
            region: *face,
            expression,
        })
    }
}

pub fn classify(eyes: &BandStats, mouth: &BandStats, mouth_gradient: f64) -> FacialExpression {
    if mouth_gradient > 30.0
        && mouth.std_dev > 25.0
        && mouth.entropy > 6.5
        && mouth.mean > eyes.mean
    {
        FacialExpression::Smile
    } else if mouth_gradient < 15.0
        && mouth.std_dev < 20.0
        && mouth.mean < eyes.mean
        && mouth.entropy < 6.0
    {
        FacialExpression::Sad
    } else if eyes.entropy > 7.0
        && eyes.std_dev > 30.0
        && mouth_gradient > 25.0
        && mouth.std_dev > 25.0
    {
        FacialExpression::Surprised
    } else {
        FacialExpression::Neutral
    }
}
