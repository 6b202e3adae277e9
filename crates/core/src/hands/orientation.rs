//! Left/right labelling of a hand region.
//!
//! Four heuristics run in a fixed order and the first one with an opinion
//! wins. When none of them is decisive the region is labelled by the frame
//! half its centre falls in.

use imageproc::geometry::min_area_rect;
use imageproc::point::Point;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

use crate::hands::HandSide;
use crate::shared::geometry::Contour;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationThresholds {
    /// Minimum protrusion imbalance as a fraction of the box width.
    pub thumb_protrusion_ratio: f64,
    /// Point share needed for the label matching the region's frame half.
    pub agreeing_share: f64,
    /// Point share needed for the label opposing the region's frame half.
    pub opposing_share: f64,
    /// Width of the undecided band around the frame midpoint, as a
    /// fraction of the frame width.
    pub neutral_band_ratio: f64,
    /// Tilt needed when the hand leans toward the frame centre.
    pub agreeing_angle_deg: f64,
    /// Tilt needed when the hand leans away from the frame centre.
    pub opposing_angle_deg: f64,
}

impl Default for OrientationThresholds {
    fn default() -> Self {
        Self {
            thumb_protrusion_ratio: 0.28,
            agreeing_share: 0.55,
            opposing_share: 0.65,
            neutral_band_ratio: 0.18,
            agreeing_angle_deg: 10.0,
            opposing_angle_deg: 35.0,
        }
    }
}

pub struct OrientationInput<'a> {
    pub contour: &'a Contour,
    pub bbox: Rect,
    pub frame_width: u32,
    pub thresholds: &'a OrientationThresholds,
}

impl OrientationInput<'_> {
    fn centre_x(&self) -> f64 {
        self.bbox.left() as f64 + self.bbox.width() as f64 / 2.0
    }

    fn midpoint(&self) -> f64 {
        self.frame_width as f64 / 2.0
    }

    fn in_left_half(&self) -> bool {
        self.centre_x() < self.midpoint()
    }

    fn half_side(&self) -> HandSide {
        if self.in_left_half() {
            HandSide::Left
        } else {
            HandSide::Right
        }
    }
}

type Stage = fn(&OrientationInput<'_>) -> Option<HandSide>;

const STAGES: [(&str, Stage); 4] = [
    ("thumb protrusion", thumb_protrusion),
    ("point distribution", point_distribution),
    ("frame position", frame_position),
    ("rectangle angle", rectangle_angle),
];

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandOrientationClassifier {
    thresholds: OrientationThresholds,
}

impl HandOrientationClassifier {
    pub fn new(thresholds: OrientationThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, contour: &Contour, bbox: Rect, frame_width: u32) -> HandSide {
        let input = OrientationInput {
            contour,
            bbox,
            frame_width,
            thresholds: &self.thresholds,
        };
        STAGES
            .iter()
            .find_map(|(name, stage)| {
                let side = stage(&input)?;
                log::debug!("Hand side {side:?} from {name}");
                Some(side)
            })
            .unwrap_or_else(|| input.half_side())
    }
}

/// The thumb sticks out further from the fingertip axis than the little
/// finger does. A thumb on the side facing away from the region's frame
/// half is treated as a misread and flipped.
pub fn thumb_protrusion(input: &OrientationInput<'_>) -> Option<HandSide> {
    let ext = input.contour.extreme_points()?;
    if ext.rightmost.x - ext.leftmost.x < 1 {
        return None;
    }
    let axis = ext.topmost.x;
    let left = (axis - ext.leftmost.x) as f64;
    let right = (ext.rightmost.x - axis) as f64;
    if (left - right).abs() <= input.thresholds.thumb_protrusion_ratio * input.bbox.width() as f64 {
        return None;
    }

    let raw = if left > right {
        HandSide::Left
    } else {
        HandSide::Right
    };
    let corrected = match (raw, input.in_left_half()) {
        (HandSide::Right, true) => HandSide::Left,
        (HandSide::Left, false) => HandSide::Right,
        (side, _) => side,
    };
    Some(corrected)
}

/// Outline points pile up on the side where the fingers splay.
pub fn point_distribution(input: &OrientationInput<'_>) -> Option<HandSide> {
    let (cx, _) = input.contour.centroid()?;
    let points = input.contour.points();
    let total = points.len() as f64;
    let left = points.iter().filter(|p| (p.x as f64) < cx).count() as f64 / total;
    let right = points.iter().filter(|p| (p.x as f64) > cx).count() as f64 / total;

    let t = input.thresholds;
    let (left_needed, right_needed) = if input.in_left_half() {
        (t.agreeing_share, t.opposing_share)
    } else {
        (t.opposing_share, t.agreeing_share)
    };
    if left > left_needed {
        Some(HandSide::Left)
    } else if right > right_needed {
        Some(HandSide::Right)
    } else {
        None
    }
}

pub fn frame_position(input: &OrientationInput<'_>) -> Option<HandSide> {
    let half_band = input.thresholds.neutral_band_ratio * input.frame_width as f64 / 2.0;
    let offset = input.centre_x() - input.midpoint();
    if offset.abs() <= half_band {
        None
    } else if offset < 0.0 {
        Some(HandSide::Left)
    } else {
        Some(HandSide::Right)
    }
}

/// Lean of the outline's minimum-area rectangle.
///
/// A hand leaning toward the frame centre belongs to the half it sits in.
/// Leaning away reads as the other side, but only past the larger
/// `opposing_angle_deg`.
pub fn rectangle_angle(input: &OrientationInput<'_>) -> Option<HandSide> {
    let tilt = long_axis_tilt(input.contour.points())?;
    // Positive tilt leans right, toward the centre from the left half.
    let toward_centre = if input.in_left_half() { tilt } else { -tilt };
    let t = input.thresholds;
    if toward_centre > t.agreeing_angle_deg {
        Some(input.half_side())
    } else if toward_centre < -t.opposing_angle_deg {
        Some(opposite(input.half_side()))
    } else {
        None
    }
}

fn opposite(side: HandSide) -> HandSide {
    match side {
        HandSide::Left => HandSide::Right,
        HandSide::Right => HandSide::Left,
    }
}

/// Degrees between the rectangle's long axis and the vertical, in
/// `[-90, 90]`, positive when the top leans to the image right.
pub fn long_axis_tilt(points: &[Point<i32>]) -> Option<f64> {
    if points.len() < 3 {
        return None;
    }
    let corners = min_area_rect(points);
    let edge = |a: Point<i32>, b: Point<i32>| ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let e1 = edge(corners[0], corners[1]);
    let e2 = edge(corners[1], corners[2]);
    let len = |(dx, dy): (f64, f64)| dx.hypot(dy);
    let (mut dx, mut dy) = if len(e1) >= len(e2) { e1 } else { e2 };
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    // Point the axis upward (image y grows downward).
    if dy > 0.0 {
        dx = -dx;
        dy = -dy;
    }
    Some(dx.atan2(-dy).to_degrees())
}
