#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use crate::consts::DEFAULT_CANVAS_SIZE;
use crate::geom::Point;

/// Mapping between the widget's on-screen box and the fixed canvas backing.
///
/// The canvas is always `canvas_size` units square; the host stretches it to
/// `display_width` x `display_height` CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub canvas_size: f64,
    pub display_width: f64,
    pub display_height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { canvas_size: DEFAULT_CANVAS_SIZE, display_width: DEFAULT_CANVAS_SIZE, display_height: DEFAULT_CANVAS_SIZE }
    }
}

impl Viewport {
    /// Horizontal CSS pixels per canvas unit.
    #[must_use]
    pub fn scale_x(&self) -> f64 {
        ratio(self.display_width, self.canvas_size)
    }

    /// Vertical CSS pixels per canvas unit.
    #[must_use]
    pub fn scale_y(&self) -> f64 {
        ratio(self.display_height, self.canvas_size)
    }

    /// Convert a display-space point (CSS pixels) to canvas coordinates.
    #[must_use]
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        Point { x: screen.x / self.scale_x(), y: screen.y / self.scale_y() }
    }

    /// Convert a canvas point to display space (CSS pixels).
    #[must_use]
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point { x: canvas.x * self.scale_x(), y: canvas.y * self.scale_y() }
    }

    /// Convert a screen-space distance (pixels) to canvas units, using the
    /// smaller axis scale so hit slop never shrinks below its pixel size.
    #[must_use]
    pub fn screen_dist_to_canvas(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale_x().min(self.scale_y())
    }
}

fn ratio(display: f64, canvas: f64) -> f64 {
    if display <= 0.0 || canvas <= 0.0 { 1.0 } else { display / canvas }
}
