#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::{HANDLE_RADIUS_PX, ROTATE_HANDLE_OFFSET_PX};
use crate::doc::Scene;
use crate::geom::{GroupTransform, Point, rotate_deg};
use crate::input::Corner;
use crate::viewport::Viewport;

/// Hidden eyes shrink below this radius and stop being grabbable.
const MIN_GRABBABLE_RADIUS: f64 = 1.0;

/// Which part of a skeleton was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Keypoint(usize),
    Body,
    ScaleHandle(Corner),
    RotateHandle,
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub skeleton: usize,
    pub part: HitPart,
}

/// Canvas position of the rotate handle: above the middle of the top edge.
#[must_use]
pub fn rotate_handle_position(t: &GroupTransform, offset: f64) -> Point {
    let (w, _) = t.scaled_size();
    let r = rotate_deg(Point::new(w / 2.0, -offset), t.angle);
    Point::new(t.left + r.x, t.top + r.y)
}

/// Whether `pt` lies inside the rotated bounding box of `t`.
#[must_use]
pub fn contains(t: &GroupTransform, pt: Point) -> bool {
    let (w, h) = t.scaled_size();
    let r = rotate_deg(Point::new(pt.x - t.left, pt.y - t.top), -t.angle);
    (0.0..=w).contains(&r.x) && (0.0..=h).contains(&r.y)
}

/// Test what is under `pt` (canvas space).
///
/// Handles of the selected skeleton win, then keypoints, then skeleton
/// bodies. Later skeletons are drawn on top, so they are tested first.
#[must_use]
pub fn hit_test(pt: Point, scene: &Scene, viewport: &Viewport, selected: Option<usize>) -> Option<Hit> {
    let slop = viewport.screen_dist_to_canvas(HANDLE_RADIUS_PX);

    if let Some(index) = selected {
        if let Some(skeleton) = scene.get(index) {
            let t = &skeleton.transform;
            let rotate_offset = viewport.screen_dist_to_canvas(ROTATE_HANDLE_OFFSET_PX);
            if rotate_handle_position(t, rotate_offset).distance(pt) <= slop {
                return Some(Hit { skeleton: index, part: HitPart::RotateHandle });
            }
            let corners = t.corners();
            for corner in Corner::ALL {
                if corners[corner.index()].distance(pt) <= slop {
                    return Some(Hit { skeleton: index, part: HitPart::ScaleHandle(corner) });
                }
            }
        }
    }

    for (index, skeleton) in scene.skeletons().iter().enumerate().rev() {
        let nearest = skeleton
            .keypoints
            .iter()
            .filter(|k| k.radius >= MIN_GRABBABLE_RADIUS)
            .map(|k| (k.index, k.position.distance(pt), k.radius))
            .filter(|(_, dist, radius)| *dist <= radius.max(slop))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((keypoint, _, _)) = nearest {
            return Some(Hit { skeleton: index, part: HitPart::Keypoint(keypoint) });
        }
    }

    scene
        .skeletons()
        .iter()
        .enumerate()
        .rev()
        .find(|(_, s)| contains(&s.transform, pt))
        .map(|(index, _)| Hit { skeleton: index, part: HitPart::Body })
}
