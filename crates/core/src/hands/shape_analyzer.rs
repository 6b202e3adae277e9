//! Convex hull, convexity defects and finger counting.

use std::f64::consts::PI;

use imageproc::point::Point;
use thiserror::Error;

use crate::hands::HandSide;
use crate::shared::geometry::{distance, polygon_area, Contour};

pub const MAX_FINGERS: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("convexity defects need at least 3 hull points, got {0}")]
    TooFewHullPoints(usize),
    #[error("hull indices are not strictly increasing at position {0}")]
    NonMonotonicHull(usize),
    #[error("hull index {index} is outside a contour of {len} points")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A stretch of contour between two consecutive hull vertices, with the
/// contour point farthest from the hull edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvexityDefect {
    pub start: Point<i32>,
    pub end: Point<i32>,
    pub far: Point<i32>,
    pub depth: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShapeMetrics {
    pub finger_count: usize,
    pub solidity: f64,
    pub compactness: f64,
    pub defects: Vec<ConvexityDefect>,
    pub has_thumb: bool,
    pub has_index: bool,
}

/// Heron's formula on `(start, end, far)`: twice the triangle area over the
/// `start → end` base. Zero for a degenerate base.
pub fn defect_depth(start: Point<i32>, end: Point<i32>, far: Point<i32>) -> f64 {
    let a = distance(start, end);
    if a == 0.0 {
        return 0.0;
    }
    let b = distance(start, far);
    let c = distance(end, far);
    let s = (a + b + c) / 2.0;
    let area = (s * (s - a) * (s - b) * (s - c)).max(0.0).sqrt();
    2.0 * area / a
}

/// Defects between every pair of cyclically consecutive hull vertices.
///
/// `hull` must be strictly increasing contour indices. Far points are chosen
/// by perpendicular distance to the hull edge; `depth` uses Heron's formula.
pub fn convexity_defects(
    points: &[Point<i32>],
    hull: &[usize],
) -> Result<Vec<ConvexityDefect>, GeometryError> {
    if hull.len() < 3 {
        return Err(GeometryError::TooFewHullPoints(hull.len()));
    }
    let n = points.len();
    if let Some(&index) = hull.iter().find(|&&i| i >= n) {
        return Err(GeometryError::IndexOutOfRange { index, len: n });
    }
    if let Some(pos) = hull.windows(2).position(|w| w[1] <= w[0]) {
        return Err(GeometryError::NonMonotonicHull(pos + 1));
    }

    let mut defects = Vec::new();
    for k in 0..hull.len() {
        let si = hull[k];
        let ei = hull[(k + 1) % hull.len()];
        let span = if ei > si { ei - si } else { ei + n - si };
        if span < 2 {
            continue;
        }
        let (start, end) = (points[si], points[ei]);
        let far = (1..span)
            .map(|off| points[(si + off) % n])
            .max_by(|p, q| {
                line_distance(start, end, *p).total_cmp(&line_distance(start, end, *q))
            });
        if let Some(far) = far {
            defects.push(ConvexityDefect {
                start,
                end,
                far,
                depth: defect_depth(start, end, far),
            });
        }
    }
    Ok(defects)
}

fn line_distance(a: Point<i32>, b: Point<i32>, p: Point<i32>) -> f64 {
    let base = distance(a, b);
    if base == 0.0 {
        return distance(a, p);
    }
    let cross = (b.x - a.x) as f64 * (p.y - a.y) as f64 - (b.y - a.y) as f64 * (p.x - a.x) as f64;
    cross.abs() / base
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandShapeAnalyzer {
    depth_threshold: f64,
}

impl HandShapeAnalyzer {
    pub fn new(depth_threshold: f64) -> Self {
        Self { depth_threshold }
    }

    pub fn depth_threshold(&self) -> f64 {
        self.depth_threshold
    }

    /// Thumb and index flags need the hand side; pass `None` to skip them.
    pub fn analyze(&self, contour: &Contour, side: Option<HandSide>) -> ShapeMetrics {
        let area = contour.area();
        let perimeter = contour.perimeter();
        let compactness = if perimeter > 0.0 {
            4.0 * PI * area / (perimeter * perimeter)
        } else {
            0.0
        };

        let hull = contour.convex_hull_indices();
        let hull_points: Vec<Point<i32>> = hull.iter().map(|&i| contour.points()[i]).collect();
        let hull_area = polygon_area(&hull_points);
        let solidity = if hull_area > 0.0 {
            (area / hull_area).min(1.0)
        } else {
            0.0
        };

        let defects = match convexity_defects(contour.points(), &hull) {
            Ok(defects) => defects,
            Err(e) => {
                log::debug!("No convexity defects for {}-point contour: {e}", contour.len());
                Vec::new()
            }
        };

        let counted: Vec<&ConvexityDefect> = defects
            .iter()
            .filter(|d| d.depth > self.depth_threshold)
            .collect();

        let mut has_thumb = false;
        let mut has_index = false;
        if let Some(side) = side {
            for (i, d) in counted.iter().enumerate() {
                let thumb_like = match side {
                    HandSide::Right => d.far.x > d.start.x && d.far.x > d.end.x,
                    HandSide::Left => d.far.x < d.start.x && d.far.x < d.end.x,
                };
                if thumb_like {
                    has_thumb = true;
                } else if i == 0 {
                    has_index = true;
                }
            }
        }

        ShapeMetrics {
            finger_count: counted.len().min(MAX_FINGERS),
            solidity,
            compactness,
            defects,
            has_thumb,
            has_index,
        }
    }
}
