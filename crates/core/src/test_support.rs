//! Synthetic frames and hand silhouettes shared by the unit tests.

use std::time::Duration;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;

use crate::shared::frame::Frame;
use crate::shared::geometry::Contour;

/// Inside the default skin range (H≈10, S≈115, V=200).
pub const SKIN: [u8; 3] = [200, 140, 110];
/// Saturated blue, far outside the skin hue band.
pub const BACKGROUND: [u8; 3] = [40, 60, 160];

pub const FPS: f64 = 30.0;

const FINGER_WIDTH: f64 = 20.0;
const GAP_WIDTH: f64 = 12.0;
const TIP_HEIGHT: f64 = 12.0;
const PALM_TOP: f64 = -20.0;
const PALM_BOTTOM: f64 = 60.0;
const PALM_ONLY_WIDTH: f64 = 148.0;

pub fn filled_image(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

pub fn filled_frame(width: u32, height: u32, color: [u8; 3]) -> Frame {
    frame_from(filled_image(width, height, color), 0)
}

pub fn paint_rect(img: &mut RgbImage, x: i32, y: i32, w: u32, h: u32, color: [u8; 3]) {
    draw_filled_rect_mut(img, Rect::at(x, y).of_size(w, h), Rgb(color));
}

pub fn paint_polygon(img: &mut RgbImage, vertices: &[Point<i32>], color: [u8; 3]) {
    draw_polygon_mut(img, vertices, Rgb(color));
}

/// Frame `index` of a 30 fps capture.
pub fn frame_from(img: RgbImage, index: usize) -> Frame {
    Frame::from_rgb_image(img, index, timestamp(index)).unwrap()
}

pub fn timestamp(index: usize) -> Duration {
    Duration::from_secs_f64(index as f64 / FPS)
}

fn apex_y(x: f64) -> f64 {
    // Apexes sit on a parabola so every fingertip is a strict hull vertex.
    -75.0 + 0.004 * x * x
}

/// Hand outline centred on the origin with `notches` deep gaps between
/// `notches + 1` fingers. Zero notches gives a plain palm rectangle.
pub fn hand_vertices(notches: usize) -> Vec<(f64, f64)> {
    if notches == 0 {
        let half = PALM_ONLY_WIDTH / 2.0;
        return vec![
            (-half, PALM_BOTTOM),
            (half, PALM_BOTTOM),
            (half, PALM_TOP),
            (-half, PALM_TOP),
        ];
    }

    let fingers = notches + 1;
    let width = fingers as f64 * FINGER_WIDTH + notches as f64 * GAP_WIDTH;
    let centres: Vec<f64> = (0..fingers)
        .map(|i| -width / 2.0 + FINGER_WIDTH / 2.0 + i as f64 * (FINGER_WIDTH + GAP_WIDTH))
        .collect();

    let half = FINGER_WIDTH / 2.0;
    let mut out = vec![(-width / 2.0, PALM_BOTTOM), (width / 2.0, PALM_BOTTOM)];
    for (k, &xc) in centres.iter().enumerate().rev() {
        let apex = apex_y(xc);
        let shoulder = apex + TIP_HEIGHT;
        out.push((xc + half, shoulder));
        out.push((xc, apex));
        out.push((xc - half, shoulder));
        if k > 0 {
            out.push((xc - half, PALM_TOP));
            out.push((centres[k - 1] + half, PALM_TOP));
        }
    }
    out
}

/// Hand vertices rotated by `angle_deg` and moved to `(cx, cy)`.
pub fn hand_polygon(notches: usize, cx: f64, cy: f64, angle_deg: f64) -> Vec<Point<i32>> {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let mut points: Vec<Point<i32>> = hand_vertices(notches)
        .into_iter()
        .map(|(x, y)| {
            Point::new(
                (cx + x * cos - y * sin).round() as i32,
                (cy + x * sin + y * cos).round() as i32,
            )
        })
        .collect();
    points.dedup();
    points
}

/// Samples every edge at roughly one-pixel steps, like a traced border.
pub fn densify(vertices: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = vertices.len();
    let mut out = Vec::new();
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let steps = (a.x - b.x).abs().max((a.y - b.y).abs()).max(1);
        for s in 0..steps {
            let t = s as f64 / steps as f64;
            let p = Point::new(
                (a.x as f64 + t * (b.x - a.x) as f64).round() as i32,
                (a.y as f64 + t * (b.y - a.y) as f64).round() as i32,
            );
            if out.last() != Some(&p) {
                out.push(p);
            }
        }
    }
    out
}

pub fn hand_contour(notches: usize, angle_deg: f64) -> Contour {
    Contour::new(densify(&hand_polygon(notches, 200.0, 200.0, angle_deg)))
}

/// 320x240 frame with a single skin-coloured hand centred at `(cx, cy)`.
pub fn hand_frame(notches: usize, cx: f64, cy: f64, index: usize) -> Frame {
    let mut img = filled_image(320, 240, BACKGROUND);
    paint_polygon(&mut img, &hand_polygon(notches, cx, cy, 0.0), SKIN);
    frame_from(img, index)
}
