//! Recompute absolute keypoint and bone coordinates from a group transform.
//!
//! Called on every pointer-move of a group gesture. The axis-aligned case adds
//! half the scaled bounding box to the top-left origin; the rotated case
//! rotates around the center of the affine corners. Both produce the same
//! result at 0°, the split only avoids trigonometry on the common path.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use crate::consts::{BONE_STROKE_WIDTH, EYE_KEYPOINTS, HIDDEN_EYE_RADIUS, HIDDEN_EYE_RADIUS_ROTATED, KEYPOINT_RADIUS};
use crate::doc::Skeleton;
use crate::geom::{Point, rotate_deg};

/// What a recompute pass derived from the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeOutcome {
    /// Exactly one axis is flipped.
    pub mirrored: bool,
    /// Whether the eye keypoints ended up visible.
    pub show_eyes: bool,
}

/// Fold `skeleton.transform` into every keypoint position and bone endpoint.
///
/// `visible_eyes` is the user's eye setting; a mirrored skeleton inverts it so
/// that the eye pair reads correctly after a flip. Hidden eyes keep their
/// links and only shrink, so the bone wiring never changes.
pub fn recompute(skeleton: &mut Skeleton, visible_eyes: bool) -> RecomputeOutcome {
    let t = skeleton.transform;
    let mirrored = t.is_mirrored();
    let show_eyes = if mirrored { !visible_eyes } else { visible_eyes };
    let (fx, fy) = t.flip_signs();
    let axis_aligned = t.angle.abs() < f64::EPSILON;

    let place: Box<dyn Fn(Point) -> Point> = if axis_aligned {
        let (w, h) = t.scaled_size();
        Box::new(move |local: Point| {
            Point::new(
                t.left + local.x * t.scale_x * fx + w / 2.0,
                t.top + local.y * t.scale_y * fy + h / 2.0,
            )
        })
    } else {
        let center = t.center();
        Box::new(move |local: Point| {
            let r = rotate_deg(Point::new(local.x * t.scale_x * fx, local.y * t.scale_y * fy), t.angle);
            Point::new(center.x + r.x, center.y + r.y)
        })
    };
    let hidden_radius = if axis_aligned { HIDDEN_EYE_RADIUS } else { HIDDEN_EYE_RADIUS_ROTATED };

    let Skeleton { keypoints, bones, .. } = skeleton;
    for kp in keypoints.iter_mut() {
        kp.position = place(kp.local);
        kp.scale_x = 1.0;
        kp.scale_y = 1.0;

        let is_eye = EYE_KEYPOINTS.contains(&kp.index);
        if is_eye {
            kp.radius = if show_eyes { KEYPOINT_RADIUS } else { hidden_radius };
        }

        for link in &kp.links {
            let Some(bone) = bones.get_mut(link.bone) else {
                continue;
            };
            bone.set_endpoint(link.end, kp.position);
            if is_eye {
                bone.stroke_width = if show_eyes { BONE_STROKE_WIDTH } else { 0.0 };
            }
        }
    }

    RecomputeOutcome { mirrored, show_eyes }
}
