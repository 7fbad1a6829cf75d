//! Fixed skeleton topology: which keypoints each bone connects, the shared
//! color table, and the built-in standing pose.
//!
//! Everything here is `const` and indexed. Bone `i` connects
//! `CONNECT_KEYPOINTS[i]` and is drawn in `CONNECT_COLORS[i]` at
//! [`BONE_ALPHA`]; keypoint `i` is drawn in `CONNECT_COLORS[i]` opaque.

#[cfg(test)]
#[path = "topology_test.rs"]
mod topology_test;

use std::fmt;

use crate::consts::{BONE_ALPHA, BONE_COUNT, KEYPOINT_COUNT};

/// `(src, dst)` keypoint pairs, one per bone.
pub const CONNECT_KEYPOINTS: [[usize; 2]; BONE_COUNT] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 4],
    [1, 5],
    [5, 6],
    [6, 7],
    [1, 8],
    [8, 9],
    [9, 10],
    [1, 11],
    [11, 12],
    [12, 13],
    [0, 14],
    [14, 16],
    [0, 15],
    [15, 17],
];

/// Color table shared by bones (first 17 entries) and keypoints (all 18).
pub const CONNECT_COLORS: [[u8; 3]; KEYPOINT_COUNT] = [
    [0, 0, 255],
    [255, 0, 0],
    [255, 170, 0],
    [255, 255, 0],
    [255, 85, 0],
    [170, 255, 0],
    [85, 255, 0],
    [0, 255, 0],
    [0, 255, 85],
    [0, 255, 170],
    [0, 255, 255],
    [0, 170, 255],
    [0, 85, 255],
    [85, 0, 255],
    [170, 0, 255],
    [255, 0, 255],
    [255, 0, 170],
    [255, 0, 85],
];

/// Built-in standing pose used for new and reset skeletons.
pub const DEFAULT_KEYPOINTS: [[f64; 2]; KEYPOINT_COUNT] = [
    [241.0, 77.0],
    [241.0, 120.0],
    [191.0, 118.0],
    [177.0, 183.0],
    [163.0, 252.0],
    [298.0, 118.0],
    [317.0, 182.0],
    [332.0, 245.0],
    [225.0, 241.0],
    [213.0, 359.0],
    [215.0, 454.0],
    [270.0, 240.0],
    [282.0, 360.0],
    [286.0, 456.0],
    [232.0, 59.0],
    [253.0, 60.0],
    [225.0, 70.0],
    [260.0, 72.0],
];

/// Opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

/// RGB color with a fractional alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub alpha: f64,
}

impl Rgba {
    /// Alpha as an 8-bit channel value.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn alpha_u8(&self) -> u8 {
        (self.alpha.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Rgb(r, g, b) = self.rgb;
        write!(f, "rgba({r}, {g}, {b}, {})", self.alpha)
    }
}

/// `(src, dst)` keypoint indices of bone `bone`.
///
/// # Panics
///
/// Panics if `bone >= BONE_COUNT`.
#[must_use]
pub fn bone_endpoints(bone: usize) -> (usize, usize) {
    let [src, dst] = CONNECT_KEYPOINTS[bone];
    (src, dst)
}

/// Translucent draw color of bone `bone`.
#[must_use]
pub fn bone_color(bone: usize) -> Rgba {
    let [r, g, b] = CONNECT_COLORS[bone];
    Rgba { rgb: Rgb(r, g, b), alpha: BONE_ALPHA }
}

/// Opaque draw color of keypoint `keypoint`.
#[must_use]
pub fn keypoint_color(keypoint: usize) -> Rgb {
    let [r, g, b] = CONNECT_COLORS[keypoint];
    Rgb(r, g, b)
}

/// Bones that reference `keypoint`, in table order.
pub fn bones_touching(keypoint: usize) -> impl Iterator<Item = usize> {
    CONNECT_KEYPOINTS
        .iter()
        .enumerate()
        .filter(move |(_, pair)| pair.contains(&keypoint))
        .map(|(idx, _)| idx)
}
