//! Page-space primitives shared by the locator, detector and resolver.
//!
//! Coordinates use a top-left origin with `y` growing downward, so "one third
//! down" a box means `y0 + height * 0.33`.

/// Fraction of a text box's height at which its check-point sits.
pub const CHECK_POINT_DEPTH: f32 = 0.33;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Smallest box covering every point, or `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BBox::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            bbox.x0 = bbox.x0.min(p.x);
            bbox.y0 = bbox.y0.min(p.y);
            bbox.x1 = bbox.x1.max(p.x);
            bbox.y1 = bbox.y1.max(p.y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x0, self.y0)
    }

    pub fn center(&self) -> Point {
        Point::new((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Horizontally centred, one third down: where a digit sits inside its cell.
    pub fn check_point(&self) -> Point {
        Point::new(
            (self.x0 + self.x1) / 2.0,
            self.y0 + self.height() * CHECK_POINT_DEPTH,
        )
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Grow every edge by `margin` and truncate to whole units.
    pub fn inflate(&self, margin: f32) -> BBox {
        BBox::new(
            (self.x0 - margin).trunc(),
            (self.y0 - margin).trunc(),
            (self.x1 + margin).trunc(),
            (self.y1 + margin).trunc(),
        )
    }

    /// Strict containment: points on an edge are outside.
    pub fn contains_strict(&self, p: Point) -> bool {
        self.x0 < p.x && p.x < self.x1 && self.y0 < p.y && p.y < self.y1
    }

    /// Distance from `p` to the nearest edge; negative when `p` lies outside.
    pub fn edge_margin(&self, p: Point) -> f32 {
        let margin_x = (p.x - self.x0).min(self.x1 - p.x);
        let margin_y = (p.y - self.y0).min(self.y1 - p.y);
        margin_x.min(margin_y)
    }
}

/// Median of `values`, averaging the two middle elements for even lengths.
pub fn median(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_point_is_centered_one_third_down() {
        let bbox = BBox::new(10.0, 100.0, 20.0, 112.0);
        let p = bbox.check_point();
        assert_eq!(p.x, 15.0);
        assert!((p.y - 103.96).abs() < 1e-4);
    }

    #[test]
    fn edge_margin_is_distance_to_nearest_edge() {
        let bbox = BBox::new(0.0, 0.0, 40.0, 20.0);
        assert_eq!(bbox.edge_margin(Point::new(20.0, 10.0)), 10.0);
        assert_eq!(bbox.edge_margin(Point::new(3.0, 10.0)), 3.0);
        assert!(bbox.edge_margin(Point::new(-5.0, 10.0)) < 0.0);
    }

    #[test]
    fn contains_strict_excludes_edges() {
        let bbox = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(bbox.contains_strict(Point::new(5.0, 5.0)));
        assert!(!bbox.contains_strict(Point::new(0.0, 5.0)));
        assert!(!bbox.contains_strict(Point::new(5.0, 10.0)));
    }

    #[test]
    fn inflate_truncates_towards_zero() {
        let bbox = BBox::new(100.6, 50.2, 120.4, 70.9).inflate(8.0);
        assert_eq!(bbox, BBox::new(92.0, 42.0, 128.0, 78.0));
    }

    #[test]
    fn median_handles_even_and_odd_lengths() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }
}
