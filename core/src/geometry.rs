//! Document-space geometry and the screen to document coordinate adapter.
//!
//! All hit-testing happens in the puzzle document's user space. Pointer
//! positions arrive in client (screen) pixels and are mapped through the
//! inverse of the root element's screen matrix, which already folds in the
//! viewBox, any pan offset and the current zoom scale.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset_to(self, other: Point) -> Point {
        Point::new(other.x - self.x, other.y - self.y)
    }

    pub fn translate(self, delta: Point) -> Point {
        Point::new(self.x + delta.x, self.y + delta.y)
    }

    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

pub fn distance(a: Point, b: Point) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Axis-aligned bounding box in document coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        let (min_x, max_x) = if width >= 0.0 { (x, x + width) } else { (x + width, x) };
        let (min_y, max_y) = if height >= 0.0 { (y, y + height) } else { (y + height, y) };
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BBox {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for point in &points[1..] {
            bbox.min_x = bbox.min_x.min(point.x);
            bbox.min_y = bbox.min_y.min(point.y);
            bbox.max_x = bbox.max_x.max(point.x);
            bbox.max_y = bbox.max_y.max(point.y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    pub fn expand(&self, padding: f32) -> BBox {
        BBox {
            min_x: self.min_x - padding,
            min_y: self.min_y - padding,
            max_x: self.max_x + padding,
            max_y: self.max_y + padding,
        }
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }

    pub fn transformed(&self, matrix: &Affine) -> BBox {
        let corners = self.corners().map(|corner| matrix.apply(corner));
        // from_points only fails on an empty slice
        BBox::from_points(&corners).unwrap_or(*self)
    }
}

/// 2x3 affine matrix in SVG order: `[a c e; b d f]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(dx: f32, dy: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn scale_about(factor: f32, origin: Point) -> Self {
        Affine::translate(-origin.x, -origin.y)
            .then(&Affine::scale(factor, factor))
            .then(&Affine::translate(origin.x, origin.y))
    }

    pub fn apply(&self, point: Point) -> Point {
        Point::new(
            self.a * point.x + self.c * point.y + self.e,
            self.b * point.x + self.d * point.y + self.f,
        )
    }

    /// `self` followed by `next`.
    pub fn then(&self, next: &Affine) -> Affine {
        Affine {
            a: next.a * self.a + next.c * self.b,
            b: next.b * self.a + next.d * self.b,
            c: next.a * self.c + next.c * self.d,
            d: next.b * self.c + next.d * self.d,
            e: next.a * self.e + next.c * self.f + next.e,
            f: next.b * self.e + next.d * self.f + next.f,
        }
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    pub fn invert(&self) -> Option<Affine> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() <= f32::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Affine {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

/// Maps a client-space pointer into document space given the root's screen CTM.
pub fn screen_to_document(screen: Point, screen_ctm: &Affine) -> Option<Point> {
    let inverse = screen_ctm.invert()?;
    let point = inverse.apply(screen);
    point.is_finite().then_some(point)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewBox {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewBox {
    /// Parses a `viewBox` attribute: four numbers separated by whitespace
    /// and/or commas. Non-positive sizes are rejected.
    pub fn parse(value: &str) -> Option<ViewBox> {
        let mut numbers = value
            .split(|ch: char| ch == ',' || ch.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(str::parse::<f32>);
        let min_x = numbers.next()?.ok()?;
        let min_y = numbers.next()?.ok()?;
        let width = numbers.next()?.ok()?;
        let height = numbers.next()?.ok()?;
        if numbers.next().is_some() || width <= 0.0 || height <= 0.0 {
            return None;
        }
        Some(ViewBox {
            min_x,
            min_y,
            width,
            height,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClientRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Fallback mapping for when no screen matrix is available: derives the
/// transform from the element's client rect and its viewBox, letterboxed the
/// way `preserveAspectRatio="xMidYMid meet"` lays it out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportMapping {
    pub rect: ClientRect,
    pub view_box: ViewBox,
}

impl ViewportMapping {
    pub fn screen_ctm(&self) -> Option<Affine> {
        let rect = self.rect;
        let view = self.view_box;
        if rect.width <= 0.0 || rect.height <= 0.0 || view.width <= 0.0 || view.height <= 0.0 {
            return None;
        }
        let scale = (rect.width / view.width).min(rect.height / view.height);
        let pad_x = (rect.width - view.width * scale) * 0.5;
        let pad_y = (rect.height - view.height * scale) * 0.5;
        Some(Affine::new(
            scale,
            0.0,
            0.0,
            scale,
            rect.left + pad_x - view.min_x * scale,
            rect.top + pad_y - view.min_y * scale,
        ))
    }

    pub fn screen_to_document(&self, screen: Point) -> Option<Point> {
        screen_to_document(screen, &self.screen_ctm()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Point, expected: Point) {
        assert!(
            distance(actual, expected) <= 1e-3,
            "expected {expected:?} got {actual:?}"
        );
    }

    #[test]
    fn inverse_round_trips_a_zoomed_and_panned_matrix() {
        let ctm = Affine::translate(-40.0, 25.0).then(&Affine::scale(2.5, 2.5));
        let doc = Point::new(12.0, 80.0);
        let screen = ctm.apply(doc);
        let mapped = screen_to_document(screen, &ctm).expect("invertible");
        assert_close(mapped, doc);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert!(Affine::scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn meet_mapping_letterboxes_wide_viewport() {
        let mapping = ViewportMapping {
            rect: ClientRect {
                left: 0.0,
                top: 0.0,
                width: 400.0,
                height: 200.0,
            },
            view_box: ViewBox {
                min_x: 0.0,
                min_y: 0.0,
                width: 100.0,
                height: 100.0,
            },
        };
        // Content is 200px wide, centred with 100px bars each side.
        let mapped = mapping
            .screen_to_document(Point::new(100.0, 0.0))
            .expect("mapping");
        assert_close(mapped, Point::new(0.0, 0.0));
        let mapped = mapping
            .screen_to_document(Point::new(200.0, 100.0))
            .expect("mapping");
        assert_close(mapped, Point::new(50.0, 50.0));
    }

    #[test]
    fn bbox_expand_keeps_center() {
        let bbox = BBox::new(10.0, 20.0, 4.0, 2.0);
        let grown = bbox.expand(10.0);
        assert_eq!(grown.center(), bbox.center());
        assert_eq!(grown.width(), 24.0);
        assert_eq!(grown.height(), 22.0);
    }

    #[test]
    fn view_box_attribute_parsing() {
        assert_eq!(
            ViewBox::parse("0 0 800,600"),
            Some(ViewBox {
                min_x: 0.0,
                min_y: 0.0,
                width: 800.0,
                height: 600.0
            })
        );
        assert_eq!(ViewBox::parse("-10 5  20 0"), None);
        assert_eq!(ViewBox::parse("0 0 10"), None);
        assert_eq!(ViewBox::parse("0 0 10 10 10"), None);
    }
}
