use std::cmp::Ordering;

use egui::Pos2;
use egui::Vec2;

/// A point in normalized detection space: both axes run `0.0..=1.0`,
/// with `y` increasing upward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Simple centroid: the independent means of the x and y coordinates.
/// Not area-weighted.
pub fn centroid(points: &[Point; 4]) -> Point {
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / 4.0, sy / 4.0)
}

/// Maps normalized points onto the plot area of a canvas.
///
/// Built fresh for every render from the canvas size at that moment, so a
/// resize takes effect on the next redraw.
#[derive(Debug, Clone, Copy)]
pub struct CanvasTransform {
    /// Top-left of the canvas in screen space.
    pub origin: Pos2,
    /// Canvas width and height in screen pixels.
    pub size: Vec2,
    /// Distance from each canvas edge to the plot area.
    pub margin: f32,
}

impl CanvasTransform {
    pub fn new(origin: Pos2, size: Vec2, margin: f32) -> Self {
        Self { origin, size, margin }
    }

    /// `(nx, ny)` → `(margin + nx*(W-2m), margin + (1-ny)*(H-2m))`, offset by the origin.
    /// The y axis is flipped: normalized y grows upward, screen y downward.
    pub fn to_screen(&self, p: Point) -> Pos2 {
        let plot = self.plot_size();
        Pos2::new(
            self.origin.x + self.margin + p.x as f32 * plot.x,
            self.origin.y + self.margin + (1.0 - p.y as f32) * plot.y,
        )
    }

    pub fn plot_size(&self) -> Vec2 {
        Vec2::new(self.size.x - 2.0 * self.margin, self.size.y - 2.0 * self.margin)
    }

    pub fn center(&self) -> Pos2 {
        self.origin + self.size / 2.0
    }

    /// Screen x of the left plot edge.
    pub fn left(&self) -> f32 {
        self.origin.x + self.margin
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.x - self.margin
    }

    pub fn top(&self) -> f32 {
        self.origin.y + self.margin
    }

    /// Screen y of the bottom plot edge (where the x axis sits).
    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.y - self.margin
    }
}

/// Twice the signed area of the triangle `o, a, b`. Positive for a
/// counter-clockwise (left) turn.
pub fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Graham scan returning hull vertices counter-clockwise, starting from the
/// lowest point (ties broken by smallest x).
///
/// Returns an empty vector when fewer than 3 points are given or when the
/// points are collinear. Points sharing a polar angle keep their input order
/// (the sort is stable) and are otherwise not disambiguated, so the order in
/// which such points are considered can vary with input order.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return Vec::new();
    }

    let mut points = points.to_vec();
    let anchor_idx = points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y).then_with(|| a.x.total_cmp(&b.x)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    points.swap(0, anchor_idx);

    let anchor = points[0];
    let polar_angle = |p: &Point| (p.y - anchor.y).atan2(p.x - anchor.x);
    let mut rest = points.split_off(1);
    rest.sort_by(|a, b| polar_angle(a).partial_cmp(&polar_angle(b)).unwrap_or(Ordering::Equal));

    let mut hull = vec![anchor];
    for p in rest {
        while hull.len() > 1 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }

    if hull.len() < 3 { Vec::new() } else { hull }
}
