//! Polygon measurements over traced contours.
//!
//! Contours are closed pixel polylines in image coordinates (y grows
//! downward). All measurements treat the last point as connected back to
//! the first.

use std::f64::consts::PI;

use imageproc::point::Point;
use imageproc::rect::Rect;

/// A closed outline traced from a binary mask.
#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shoelace area of the outline.
    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| distance(self.points[i], self.points[(i + 1) % n]))
            .sum()
    }

    /// `4π·area / perimeter²`; 1.0 for a circle, 0 when the perimeter is 0.
    pub fn circularity(&self) -> f64 {
        let perimeter = self.perimeter();
        if perimeter > 0.0 {
            4.0 * PI * self.area() / (perimeter * perimeter)
        } else {
            0.0
        }
    }

    /// Inclusive pixel bounding box.
    pub fn bounding_rect(&self) -> Option<Rect> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(
            Rect::at(min_x, min_y)
                .of_size((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32),
        )
    }

    /// Area centroid from first-order polygon moments, falling back to the
    /// mean of the points for zero-area outlines.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        let n = self.points.len();
        if n == 0 {
            return None;
        }
        let mut a2 = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let p = self.points[i];
            let q = self.points[(i + 1) % n];
            let cross = p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
            a2 += cross;
            cx += (p.x + q.x) as f64 * cross;
            cy += (p.y + q.y) as f64 * cross;
        }
        if a2.abs() < f64::EPSILON {
            let sx: f64 = self.points.iter().map(|p| p.x as f64).sum();
            let sy: f64 = self.points.iter().map(|p| p.y as f64).sum();
            return Some((sx / n as f64, sy / n as f64));
        }
        Some((cx / (3.0 * a2), cy / (3.0 * a2)))
    }

    pub fn extreme_points(&self) -> Option<ExtremePoints> {
        let first = *self.points.first()?;
        let mut ext = ExtremePoints {
            leftmost: first,
            rightmost: first,
            topmost: first,
            bottommost: first,
        };
        for &p in &self.points[1..] {
            if p.x < ext.leftmost.x {
                ext.leftmost = p;
            }
            if p.x > ext.rightmost.x {
                ext.rightmost = p;
            }
            if p.y < ext.topmost.y {
                ext.topmost = p;
            }
            if p.y > ext.bottommost.y {
                ext.bottommost = p;
            }
        }
        Some(ext)
    }

    /// Indices of the convex hull vertices, in ascending contour order.
    ///
    /// Collinear points are not hull vertices.
    pub fn convex_hull_indices(&self) -> Vec<usize> {
        convex_hull_indices(&self.points)
    }
}

/// First occurrence of each extreme coordinate along the contour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtremePoints {
    pub leftmost: Point<i32>,
    pub rightmost: Point<i32>,
    pub topmost: Point<i32>,
    pub bottommost: Point<i32>,
}

pub fn distance(a: Point<i32>, b: Point<i32>) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

pub fn polygon_area(points: &[Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: i64 = (0..n)
        .map(|i| {
            let p = points[i];
            let q = points[(i + 1) % n];
            p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64
        })
        .sum();
    (twice as f64).abs() / 2.0
}

fn cross(o: Point<i32>, a: Point<i32>, b: Point<i32>) -> i64 {
    (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
}

/// Andrew's monotone chain over point indices.
pub fn convex_hull_indices(points: &[Point<i32>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| (points[i].x, points[i].y));
    order.dedup_by_key(|i| (points[*i].x, points[*i].y));
    if order.len() < 3 {
        return order;
    }

    let mut hull: Vec<usize> = Vec::with_capacity(order.len() * 2);
    let push_chain = |hull: &mut Vec<usize>, i: usize, floor: usize| {
        while hull.len() >= floor
            && cross(
                points[hull[hull.len() - 2]],
                points[hull[hull.len() - 1]],
                points[i],
            ) <= 0
        {
            hull.pop();
        }
        hull.push(i);
    };
    for &i in &order {
        push_chain(&mut hull, i, 2);
    }
    let lower_len = hull.len() + 1;
    for &i in order.iter().rev().skip(1) {
        push_chain(&mut hull, i, lower_len);
    }
    hull.pop();
    hull.sort_unstable();
    hull
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn contour(pts: &[(i32, i32)]) -> Contour {
        Contour::new(pts.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    fn square() -> Contour {
        contour(&[(0, 0), (10, 0), (10, 10), (0, 10)])
    }

    #[test]
    fn test_area_and_perimeter_of_square() {
        let c = square();
        assert_relative_eq!(c.area(), 100.0);
        assert_relative_eq!(c.perimeter(), 40.0);
    }

    #[test]
    fn test_circularity_of_square() {
        assert_relative_eq!(square().circularity(), std::f64::consts::PI / 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bounding_rect_is_inclusive() {
        let r = square().bounding_rect().unwrap();
        assert_eq!((r.left(), r.top(), r.width(), r.height()), (0, 0, 11, 11));
    }

    #[test]
    fn test_centroid_uses_area_not_point_density() {
        // Extra collinear points along the left edge must not move the centroid.
        let c = contour(&[(0, 0), (10, 0), (10, 10), (0, 10), (0, 8), (0, 6), (0, 4), (0, 2)]);
        let (cx, cy) = c.centroid().unwrap();
        assert_relative_eq!(cx, 5.0, epsilon = 1e-9);
        assert_relative_eq!(cy, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_centroid_of_degenerate_line_is_mean() {
        let c = contour(&[(0, 0), (4, 0)]);
        assert_eq!(c.centroid(), Some((2.0, 0.0)));
    }

    #[test]
    fn test_empty_contour_measurements() {
        let c = Contour::new(vec![]);
        assert!(c.bounding_rect().is_none());
        assert!(c.centroid().is_none());
        assert!(c.extreme_points().is_none());
        assert_relative_eq!(c.circularity(), 0.0);
    }

    #[test]
    fn test_hull_indices_skip_concave_and_collinear_points() {
        // Arrow-like shape: index 2 is a notch, index 4 is collinear on the bottom edge.
        let c = contour(&[(0, 0), (10, 0), (5, 5), (10, 10), (5, 10), (0, 10)]);
        assert_eq!(c.convex_hull_indices(), vec![0, 1, 3, 5]);
    }

    #[test]
    fn test_extreme_points() {
        let c = contour(&[(5, 0), (10, 5), (5, 10), (0, 5)]);
        let e = c.extreme_points().unwrap();
        assert_eq!(e.leftmost, Point::new(0, 5));
        assert_eq!(e.rightmost, Point::new(10, 5));
        assert_eq!(e.topmost, Point::new(5, 0));
        assert_eq!(e.bottommost, Point::new(5, 10));
    }
}
