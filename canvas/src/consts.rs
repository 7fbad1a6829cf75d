//! Shared numeric constants for the pose canvas crate.

// ── Skeleton shape ──────────────────────────────────────────────

/// Keypoints per skeleton.
pub const KEYPOINT_COUNT: usize = 18;

/// Bones per skeleton.
pub const BONE_COUNT: usize = 17;

/// Keypoint indices of the two eyes.
pub const EYE_KEYPOINTS: [usize; 2] = [14, 15];

// ── Drawing ─────────────────────────────────────────────────────

/// Radius of a visible keypoint circle, in canvas units.
pub const KEYPOINT_RADIUS: f64 = 5.0;

/// Outline width of a keypoint circle.
pub const KEYPOINT_STROKE_WIDTH: f64 = 1.0;

/// Hidden eye radius on the axis-aligned path.
pub const HIDDEN_EYE_RADIUS: f64 = 0.0;

/// Hidden eye radius on the rotated path. Non-zero so the circle keeps a
/// defined bounding box under rotation.
pub const HIDDEN_EYE_RADIUS_ROTATED: f64 = 0.3;

/// Stroke width of a visible bone.
pub const BONE_STROKE_WIDTH: f64 = 10.0;

/// Alpha applied to every bone color.
pub const BONE_ALPHA: f64 = 0.7;

/// Canvas background.
pub const BACKGROUND_COLOR: &str = "#000";

/// Default backing size of the square pose canvas.
pub const DEFAULT_CANVAS_SIZE: f64 = 512.0;

// ── Selection UI ────────────────────────────────────────────────

/// Selection border and handle color.
pub const SELECTION_COLOR: &str = "#108ce6";

/// Edge length of a corner handle square, in screen pixels.
pub const CORNER_SIZE_PX: f64 = 10.0;

/// Screen-space hit slop in pixels for handles and keypoints.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Distance from the bounding box top edge to the rotate handle, in screen pixels.
pub const ROTATE_HANDLE_OFFSET_PX: f64 = 40.0;

// ── Gestures ────────────────────────────────────────────────────

/// Smallest absolute per-axis scale a gesture may produce.
pub const MIN_SCALE: f64 = 0.01;

/// Angle step used when rotation snapping is requested (shift held).
pub const ROTATE_SNAP_DEG: f64 = 15.0;
