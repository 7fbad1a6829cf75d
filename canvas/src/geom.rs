//! Points and the affine state of a grouped skeleton.
//!
//! A [`GroupTransform`] follows the drawing-surface convention for groups:
//! `left`/`top` is the (rotated) top-left corner, `width`/`height` is the
//! unscaled bounding box, scale is always positive per axis, and mirroring is
//! carried separately by the flip flags. Member keypoints store coordinates
//! relative to the group center in that unscaled, unrotated frame.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

/// A point in canvas or group-local space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

/// Rotate `v` about the origin by `angle_deg` (clockwise on a y-down canvas).
#[must_use]
pub fn rotate_deg(v: Point, angle_deg: f64) -> Point {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    Point::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Normalize an angle into `[0, 360)`.
#[must_use]
pub fn normalize_degrees_360(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped.is_finite() { wrapped } else { 0.0 }
}

/// Affine state of one skeleton group.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupTransform {
    /// Canvas x of the rotated top-left corner.
    pub left: f64,
    /// Canvas y of the rotated top-left corner.
    pub top: f64,
    /// Unscaled bounding-box width.
    pub width: f64,
    /// Unscaled bounding-box height.
    pub height: f64,
    /// Horizontal scale factor (positive).
    pub scale_x: f64,
    /// Vertical scale factor (positive).
    pub scale_y: f64,
    /// Mirror across the vertical axis.
    pub flip_x: bool,
    /// Mirror across the horizontal axis.
    pub flip_y: bool,
    /// Clockwise rotation in degrees about the group center.
    pub angle: f64,
}

impl Default for GroupTransform {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            flip_x: false,
            flip_y: false,
            angle: 0.0,
        }
    }
}

impl GroupTransform {
    /// Identity transform whose bounding box tightly fits `points`.
    #[must_use]
    pub fn fitting(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        let (mut min, mut max) = (*first, *first);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Self { left: min.x, top: min.y, width: max.x - min.x, height: max.y - min.y, ..Self::default() }
    }

    /// `(flip_x, flip_y)` as `-1.0` / `1.0` multipliers.
    #[must_use]
    pub fn flip_signs(&self) -> (f64, f64) {
        (if self.flip_x { -1.0 } else { 1.0 }, if self.flip_y { -1.0 } else { 1.0 })
    }

    /// Exactly one axis is flipped.
    #[must_use]
    pub fn is_mirrored(&self) -> bool {
        let (fx, fy) = self.flip_signs();
        fx * fy < 0.0
    }

    /// Bounding-box size after scaling.
    #[must_use]
    pub fn scaled_size(&self) -> (f64, f64) {
        (self.width * self.scale_x, self.height * self.scale_y)
    }

    /// The four affine corners: top-left, top-right, bottom-right, bottom-left.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        let (w, h) = self.scaled_size();
        let tl = Point::new(self.left, self.top);
        let offset = |dx: f64, dy: f64| {
            let r = rotate_deg(Point::new(dx, dy), self.angle);
            Point::new(tl.x + r.x, tl.y + r.y)
        };
        [tl, offset(w, 0.0), offset(w, h), offset(0.0, h)]
    }

    /// Center of the bounding box, from the top-left and bottom-right corners.
    #[must_use]
    pub fn center(&self) -> Point {
        let [tl, _, br, _] = self.corners();
        Point::new((tl.x + br.x) / 2.0, (tl.y + br.y) / 2.0)
    }

    /// Move the group so its center lands on `center`, keeping angle and size.
    pub fn set_center(&mut self, center: Point) {
        let (w, h) = self.scaled_size();
        let half = rotate_deg(Point::new(w / 2.0, h / 2.0), self.angle);
        self.left = center.x - half.x;
        self.top = center.y - half.y;
    }

    /// Map a group-local coordinate to canvas space.
    #[must_use]
    pub fn to_canvas(&self, local: Point) -> Point {
        let (fx, fy) = self.flip_signs();
        let scaled = Point::new(local.x * self.scale_x * fx, local.y * self.scale_y * fy);
        let r = rotate_deg(scaled, self.angle);
        let c = self.center();
        Point::new(c.x + r.x, c.y + r.y)
    }

    /// Map a canvas coordinate back into the group-local frame.
    #[must_use]
    pub fn to_local(&self, canvas: Point) -> Point {
        let c = self.center();
        let r = rotate_deg(Point::new(canvas.x - c.x, canvas.y - c.y), -self.angle);
        let (fx, fy) = self.flip_signs();
        Point::new(r.x / nonzero(self.scale_x * fx), r.y / nonzero(self.scale_y * fy))
    }
}

fn nonzero(v: f64) -> f64 {
    if v.abs() < f64::EPSILON { 1.0 } else { v }
}
