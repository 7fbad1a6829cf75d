#![allow(clippy::float_cmp)]

use super::*;
use crate::consts::{EYE_KEYPOINTS, ROTATE_HANDLE_OFFSET_PX};
use crate::topology::DEFAULT_KEYPOINTS;

// =============================================================
// Helpers
// =============================================================

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn approx_pt(a: Point, b: Point) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y)
}

fn no_mods() -> Modifiers {
    Modifiers::default()
}

fn shift() -> Modifiers {
    Modifiers { shift: true, ..Modifiers::default() }
}

fn default_flat(dx: f64) -> Vec<Point> {
    DEFAULT_KEYPOINTS.iter().map(|[x, y]| Point::new(x + dx, *y)).collect()
}

fn kp(core: &EngineCore, skeleton: usize, keypoint: usize) -> Point {
    core.skeleton(skeleton).map(|s| s.keypoints[keypoint].position).unwrap_or_default()
}

fn transform_of(core: &EngineCore, skeleton: usize) -> GroupTransform {
    core.skeleton(skeleton).map(|s| s.transform).unwrap_or_default()
}

fn has_commit(actions: &[Action]) -> bool {
    actions.iter().any(|a| matches!(a, Action::Committed(_)))
}

fn persist_versions(actions: &[Action]) -> Vec<u64> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::PersistRequested { version, .. } => Some(*version),
            _ => None,
        })
        .collect()
}

fn nudge(core: &mut EngineCore, dx: f64) -> Vec<Action> {
    core.edit_transform(0, |t| t.left += dx)
}

fn drag(core: &mut EngineCore, from: Point, to: Point, modifiers: Modifiers) -> Vec<Action> {
    core.on_pointer_down(from, Button::Primary, modifiers);
    core.on_pointer_move(to, modifiers);
    core.on_pointer_up(to, Button::Primary, modifiers)
}

// =============================================================
// Construction
// =============================================================

#[test]
fn new_engine_shows_default_pose() {
    let core = EngineCore::new();
    assert_eq!(core.scene.len(), 1);
    assert_eq!(core.serialize_scene(), PoseDocument::default_pose());
    assert_eq!(core.history.undo_len(), 1);
    assert_eq!(core.selection(), None);
    assert!(core.input.is_idle());
}

#[test]
fn with_document_makes_preset_the_floor() {
    let mut core = EngineCore::new();
    let mut flat = default_flat(0.0);
    flat.extend(default_flat(40.0));
    assert!(core.set_pose(&flat).is_ok());
    let preset = core.serialize_scene();

    let mut restored = match EngineCore::with_document(&preset) {
        Ok(core) => core,
        Err(e) => panic!("preset rejected: {e}"),
    };
    assert_eq!(restored.scene.len(), 2);
    assert_eq!(restored.history.current(), Some(&preset));
    restored.undo();
    assert_eq!(restored.serialize_scene(), preset);
}

#[test]
fn with_document_rejects_partial_skeleton() {
    let doc = PoseDocument { keypoints: vec![[1, 1]; 20] };
    assert_eq!(EngineCore::with_document(&doc).err(), Some(SceneError::MalformedPreset { count: 20 }));
}

// =============================================================
// Host contract
// =============================================================

#[test]
fn set_pose_loads_two_skeletons() {
    let mut core = EngineCore::new();
    let mut flat = default_flat(0.0);
    flat.extend(default_flat(100.0));
    assert_eq!(core.set_pose(&flat), Ok(vec![Action::RenderNeeded]));
    assert_eq!(core.scene.len(), 2);
    assert_eq!(core.serialize_scene().keypoints.len(), 36);
    assert_eq!(kp(&core, 1, 0), Point::new(341.0, 77.0));
}

#[test]
fn set_pose_rejects_bad_count_and_keeps_scene() {
    let mut core = EngineCore::new();
    core.add_pose(None);
    let before = core.serialize_scene();
    let mut flat = default_flat(0.0);
    flat.pop();
    assert_eq!(core.set_pose(&flat), Err(SceneError::MalformedPreset { count: 17 }));
    assert_eq!(core.serialize_scene(), before);
}

#[test]
fn set_pose_does_not_commit() {
    let mut core = EngineCore::new();
    assert!(core.set_pose(&default_flat(10.0)).is_ok());
    assert_eq!(core.history.undo_len(), 1);
}

#[test]
fn load_preset_replaces_scene() {
    let mut core = EngineCore::new();
    let doc = PoseDocument { keypoints: vec![[7, 9]; 36] };
    assert!(core.load_preset(&doc).is_ok());
    assert_eq!(core.serialize_scene(), doc);
}

#[test]
fn add_pose_selects_new_skeleton_without_commit() {
    let mut core = EngineCore::new();
    let actions = core.add_pose(None);
    assert_eq!(actions, vec![Action::RenderNeeded]);
    assert_eq!(core.scene.len(), 2);
    assert_eq!(core.selection(), Some(1));
    assert_eq!(core.history.undo_len(), 1);
}

#[test]
fn add_pose_with_explicit_points() {
    let mut core = EngineCore::new();
    let points = DEFAULT_KEYPOINTS.map(|[x, y]| Point::new(x + 5.0, y));
    core.add_pose(Some(points));
    assert_eq!(kp(&core, 1, 0), Point::new(246.0, 77.0));
}

#[test]
fn reset_scene_leaves_single_default() {
    let mut core = EngineCore::new();
    core.add_pose(None);
    core.add_pose(None);
    nudge(&mut core, 30.0);
    core.reset_scene();
    assert_eq!(core.scene.len(), 1);
    assert_eq!(core.serialize_scene(), PoseDocument::default_pose());
    assert_eq!(core.selection(), Some(0));
}

#[test]
fn serialize_default_scene_matches_table() {
    let core = EngineCore::new();
    let doc = core.serialize_scene();
    assert_eq!(doc.keypoints[0], [241, 77]);
    assert_eq!(doc.keypoints[17], [260, 72]);
}

// =============================================================
// History
// =============================================================

#[test]
fn edit_commits_and_requests_persist() {
    let mut core = EngineCore::new();
    let actions = nudge(&mut core, 10.0);
    assert!(has_commit(&actions));
    assert_eq!(persist_versions(&actions), vec![1]);
    assert_eq!(core.history.undo_len(), 2);
    assert_eq!(kp(&core, 0, 0), Point::new(251.0, 77.0));
}

#[test]
fn commit_clears_redo() {
    let mut core = EngineCore::new();
    nudge(&mut core, 10.0);
    nudge(&mut core, 10.0);
    core.undo();
    assert!(core.history.can_redo());
    nudge(&mut core, 5.0);
    assert!(!core.history.can_redo());
}

#[test]
fn undo_then_redo_restores_scene() {
    let mut core = EngineCore::new();
    nudge(&mut core, 10.0);
    let edited = core.serialize_scene();
    core.undo();
    assert_eq!(core.serialize_scene(), PoseDocument::default_pose());
    core.redo();
    assert_eq!(core.serialize_scene(), edited);
}

#[test]
fn three_commits_two_undos_one_redo() {
    let mut core = EngineCore::new();
    nudge(&mut core, 10.0);
    nudge(&mut core, 10.0);
    let second = core.serialize_scene();
    nudge(&mut core, 10.0);

    core.undo();
    core.undo();
    core.redo();
    assert_eq!(core.serialize_scene(), second);
    assert_eq!(core.history.undo_len(), 3);
    assert_eq!(core.history.redo_len(), 1);
}

#[test]
fn undo_does_not_push_history() {
    let mut core = EngineCore::new();
    nudge(&mut core, 10.0);
    let actions = core.undo();
    assert!(!has_commit(&actions));
    assert!(!core.history.is_replaying());
    assert_eq!(core.history.undo_len(), 1);
}

#[test]
fn undo_at_floor_reloads_and_persists() {
    let mut core = EngineCore::new();
    let actions = core.undo();
    assert_eq!(actions.first(), Some(&Action::RenderNeeded));
    assert_eq!(persist_versions(&actions), vec![1]);
    assert_eq!(core.history.undo_len(), 1);
    assert_eq!(core.serialize_scene(), PoseDocument::default_pose());
}

#[test]
fn redo_with_empty_stack_is_noop() {
    let mut core = EngineCore::new();
    assert!(core.redo().is_empty());
    assert_eq!(core.edit_version(), 0);
}

#[test]
fn persist_versions_increase() {
    let mut core = EngineCore::new();
    let a = persist_versions(&nudge(&mut core, 1.0));
    let b = persist_versions(&core.undo());
    let c = persist_versions(&core.redo());
    assert_eq!([a, b, c].concat(), vec![1, 2, 3]);
    assert_eq!(core.edit_version(), 3);
}

#[test]
fn request_persist_leaves_history_alone() {
    let mut core = EngineCore::new();
    let actions = core.request_persist();
    assert_eq!(persist_versions(&actions), vec![1]);
    assert!(!has_commit(&actions));
    assert_eq!(core.history.undo_len(), 1);
    assert_eq!(core.edit_version(), 1);
}

#[test]
fn undo_restores_every_skeleton() {
    let mut core = EngineCore::new();
    core.add_pose(None);
    core.edit_transform(1, |t| t.top += 20.0);
    let two = core.serialize_scene();
    core.edit_transform(0, |t| t.left -= 20.0);
    core.undo();
    assert_eq!(core.serialize_scene(), two);
    assert_eq!(core.scene.len(), 2);
}

// =============================================================
// Direct edits
// =============================================================

#[test]
fn edit_transform_unknown_skeleton_is_noop() {
    let mut core = EngineCore::new();
    assert!(core.edit_transform(4, |t| t.left += 1.0).is_empty());
    assert_eq!(core.history.undo_len(), 1);
}

#[test]
fn edit_keypoint_moves_one_point() {
    let mut core = EngineCore::new();
    let actions = core.edit_keypoint(0, 4, Point::new(150.0, 260.0));
    assert!(has_commit(&actions));
    assert_eq!(kp(&core, 0, 4), Point::new(150.0, 260.0));
    assert_eq!(kp(&core, 0, 3), Point::new(177.0, 183.0));
    assert!(approx(transform_of(&core, 0).left, 150.0));
}

#[test]
fn edit_keypoint_then_group_move_keeps_shape() {
    let mut core = EngineCore::new();
    core.edit_keypoint(0, 4, Point::new(150.0, 260.0));
    nudge(&mut core, 10.0);
    assert!(approx_pt(kp(&core, 0, 4), Point::new(160.0, 260.0)));
    assert!(approx_pt(kp(&core, 0, 0), Point::new(251.0, 77.0)));
}

#[test]
fn flip_mirrors_and_hides_eyes() {
    let mut core = EngineCore::new();
    core.edit_transform(0, |t| t.flip_x = true);
    assert!(core.mirrored());
    for eye in EYE_KEYPOINTS {
        assert_eq!(core.skeleton(0).map(|s| s.keypoints[eye].radius), Some(0.0));
    }
}

#[test]
fn set_visible_eyes_does_not_commit() {
    let mut core = EngineCore::new();
    let actions = core.set_visible_eyes(false);
    assert_eq!(actions, vec![Action::RenderNeeded]);
    assert_eq!(core.skeleton(0).map(|s| s.keypoints[14].radius), Some(0.0));
    assert_eq!(core.history.undo_len(), 1);
}

fn eye_radii(core: &EngineCore, skeleton: usize) -> Vec<f64> {
    core.skeleton(skeleton).map(|s| EYE_KEYPOINTS.iter().map(|&eye| s.keypoints[eye].radius).collect()).unwrap_or_default()
}

fn eye_strokes(core: &EngineCore, skeleton: usize) -> Vec<f64> {
    core.skeleton(skeleton).map(|s| [13, 15].iter().map(|&bone| s.bones[bone].stroke_width).collect()).unwrap_or_default()
}

#[test]
fn hidden_eyes_survive_scene_rebuilds() {
    let mut core = EngineCore::new();
    core.set_visible_eyes(false);

    core.add_pose(None);
    assert_eq!(eye_radii(&core, 1), vec![0.0, 0.0]);
    assert_eq!(eye_strokes(&core, 1), vec![0.0, 0.0]);

    nudge(&mut core, 4.0);
    core.undo();
    assert_eq!(eye_radii(&core, 0), vec![0.0, 0.0]);
    assert_eq!(eye_radii(&core, 1), vec![0.0, 0.0]);

    core.redo();
    assert_eq!(eye_radii(&core, 0), vec![0.0, 0.0]);

    core.reset_scene();
    assert_eq!(eye_radii(&core, 0), vec![0.0, 0.0]);
    assert_eq!(eye_strokes(&core, 0), vec![0.0, 0.0]);

    assert!(core.set_pose(&default_flat(10.0)).is_ok());
    assert_eq!(eye_radii(&core, 0), vec![0.0, 0.0]);
}

#[test]
fn rebuilds_keep_positions_when_hiding_eyes() {
    let mut core = EngineCore::new();
    core.set_visible_eyes(false);
    core.reset_scene();
    assert_eq!(core.serialize_scene(), PoseDocument::default_pose());
}

#[test]
fn visible_eyes_stay_visible_after_add() {
    let mut core = EngineCore::new();
    core.add_pose(None);
    assert_eq!(eye_radii(&core, 1), vec![5.0, 5.0]);
    assert_eq!(eye_strokes(&core, 1), vec![10.0, 10.0]);
}

// =============================================================
// Gestures
// =============================================================

#[test]
fn click_without_move_does_not_commit() {
    let mut core = EngineCore::new();
    let p = Point::new(250.0, 300.0);
    core.on_pointer_down(p, Button::Primary, no_mods());
    let actions = core.on_pointer_up(p, Button::Primary, no_mods());
    assert!(actions.is_empty());
    assert_eq!(core.selection(), Some(0));
    assert_eq!(core.history.undo_len(), 1);
}

#[test]
fn secondary_button_is_ignored() {
    let mut core = EngineCore::new();
    let actions = core.on_pointer_down(Point::new(250.0, 300.0), Button::Secondary, no_mods());
    assert!(actions.is_empty());
    assert!(core.input.is_idle());
}

#[test]
fn click_on_empty_area_deselects() {
    let mut core = EngineCore::new();
    core.ui.selected = Some(0);
    let actions = core.on_pointer_down(Point::new(5.0, 5.0), Button::Primary, no_mods());
    assert_eq!(actions, vec![Action::RenderNeeded]);
    assert_eq!(core.selection(), None);
}

#[test]
fn body_drag_moves_whole_skeleton() {
    let mut core = EngineCore::new();
    let actions = drag(&mut core, Point::new(250.0, 300.0), Point::new(260.0, 310.0), no_mods());
    assert!(has_commit(&actions));
    assert!(approx_pt(kp(&core, 0, 0), Point::new(251.0, 87.0)));
    assert!(approx_pt(kp(&core, 0, 13), Point::new(296.0, 466.0)));
    assert!(core.input.is_idle());
}

#[test]
fn move_without_gesture_is_noop() {
    let mut core = EngineCore::new();
    assert!(core.on_pointer_move(Point::new(10.0, 10.0), no_mods()).is_empty());
}

#[test]
fn keypoint_drag_moves_only_that_keypoint() {
    let mut core = EngineCore::new();
    let actions = drag(&mut core, Point::new(163.0, 252.0), Point::new(150.0, 260.0), no_mods());
    assert!(has_commit(&actions));
    assert_eq!(kp(&core, 0, 4), Point::new(150.0, 260.0));
    assert_eq!(kp(&core, 0, 3), Point::new(177.0, 183.0));
    assert_eq!(core.skeleton(0).map(|s| s.bones[3].end), Some(Point::new(150.0, 260.0)));
    assert_eq!(core.selection(), None);
    assert_eq!(core.serialize_scene().keypoints[4], [150, 260]);
}

#[test]
fn shift_on_keypoint_moves_group() {
    let mut core = EngineCore::new();
    drag(&mut core, Point::new(163.0, 252.0), Point::new(173.0, 252.0), shift());
    assert!(approx_pt(kp(&core, 0, 4), Point::new(173.0, 252.0)));
    assert!(approx_pt(kp(&core, 0, 3), Point::new(187.0, 183.0)));
    assert_eq!(core.selection(), Some(0));
}

#[test]
fn corner_drag_scales_from_opposite_corner() {
    let mut core = EngineCore::new();
    core.ui.selected = Some(0);
    let t = transform_of(&core, 0);
    let br = t.corners()[2];
    let target = Point::new(t.left + 2.0 * t.width, t.top + 2.0 * t.height);
    drag(&mut core, br, target, no_mods());

    let scaled = transform_of(&core, 0);
    assert!(approx(scaled.scale_x, 2.0));
    assert!(approx(scaled.scale_y, 2.0));
    assert!(approx(scaled.left, t.left));
    assert!(approx(scaled.top, t.top));
    assert!(approx_pt(kp(&core, 0, 4), Point::new(163.0, 59.0 + (252.0 - 59.0) * 2.0)));
    assert!(approx_pt(kp(&core, 0, 7), Point::new(163.0 + (332.0 - 163.0) * 2.0, 59.0 + (245.0 - 59.0) * 2.0)));
}

#[test]
fn corner_drag_across_anchor_flips() {
    let mut core = EngineCore::new();
    core.ui.selected = Some(0);
    let t = transform_of(&core, 0);
    let br = t.corners()[2];
    drag(&mut core, br, Point::new(t.left - t.width, br.y), no_mods());

    let flipped = transform_of(&core, 0);
    assert!(flipped.flip_x);
    assert!(!flipped.flip_y);
    assert!(approx(flipped.scale_x, 1.0));
    assert!(core.mirrored());
    // The leftmost keypoint mirrors onto the pinned edge.
    assert!(approx_pt(kp(&core, 0, 4), Point::new(163.0, 252.0)));
    assert!(approx_pt(kp(&core, 0, 7), Point::new(163.0 - (332.0 - 163.0), 245.0)));
    assert_eq!(core.skeleton(0).map(|s| s.keypoints[15].radius), Some(0.0));
}

#[test]
fn scale_never_collapses() {
    let mut core = EngineCore::new();
    core.ui.selected = Some(0);
    let t = transform_of(&core, 0);
    drag(&mut core, t.corners()[2], Point::new(t.left, t.top), no_mods());
    let scaled = transform_of(&core, 0);
    assert!(scaled.scale_x >= MIN_SCALE);
    assert!(scaled.scale_y >= MIN_SCALE);
}

#[test]
fn rotate_handle_drag_rotates_about_center() {
    let mut core = EngineCore::new();
    core.ui.selected = Some(0);
    let t = transform_of(&core, 0);
    let center = t.center();
    let handle = hit::rotate_handle_position(&t, ROTATE_HANDLE_OFFSET_PX);
    let actions = drag(&mut core, handle, Point::new(center.x + 200.0, center.y), no_mods());
    assert!(has_commit(&actions));

    let rotated = transform_of(&core, 0);
    assert!(approx(rotated.angle, 90.0));
    assert!(approx_pt(rotated.center(), center));
    let local = Point::new(241.0 - center.x, 77.0 - center.y);
    assert!(approx_pt(kp(&core, 0, 0), Point::new(center.x - local.y, center.y + local.x)));
}

#[test]
fn shift_snaps_rotation() {
    let mut core = EngineCore::new();
    core.ui.selected = Some(0);
    let t = transform_of(&core, 0);
    let center = t.center();
    let handle = hit::rotate_handle_position(&t, ROTATE_HANDLE_OFFSET_PX);
    let (sin, cos) = 40f64.to_radians().sin_cos();
    drag(&mut core, handle, Point::new(center.x + 100.0 * cos, center.y + 100.0 * sin), shift());
    assert!(approx(transform_of(&core, 0).angle, 135.0));
}

#[test]
fn rotation_is_normalized() {
    let mut core = EngineCore::new();
    core.ui.selected = Some(0);
    let t = transform_of(&core, 0);
    let center = t.center();
    let handle = hit::rotate_handle_position(&t, ROTATE_HANDLE_OFFSET_PX);
    drag(&mut core, handle, Point::new(center.x - 200.0, center.y), no_mods());
    assert!(approx(transform_of(&core, 0).angle, 270.0));
}

#[test]
fn gesture_undo_restores_pre_gesture_scene() {
    let mut core = EngineCore::new();
    drag(&mut core, Point::new(250.0, 300.0), Point::new(300.0, 300.0), no_mods());
    core.undo();
    assert_eq!(core.serialize_scene(), PoseDocument::default_pose());
}

#[test]
fn gestures_respect_viewport_scale() {
    let mut core = EngineCore::new();
    core.viewport.display_width = 256.0;
    core.viewport.display_height = 256.0;
    drag(&mut core, Point::new(125.0, 150.0), Point::new(130.0, 150.0), no_mods());
    assert!(approx_pt(kp(&core, 0, 0), Point::new(251.0, 77.0)));
}

// =============================================================
// Free helpers
// =============================================================

#[test]
fn bearing_is_clockwise_degrees() {
    assert!(approx(bearing(Point::new(0.0, 0.0), Point::new(0.0, 10.0)), 90.0));
    assert!(approx(bearing(Point::new(0.0, 0.0), Point::new(-10.0, 0.0)), 180.0));
}

#[test]
fn keep_aspect_uses_larger_axis() {
    let orig = GroupTransform { left: 0.0, top: 0.0, width: 100.0, height: 50.0, ..GroupTransform::default() };
    let t = scale_from_corner(&orig, Corner::BottomRight, Point::new(0.0, 0.0), Point::new(300.0, 60.0), true);
    assert!(approx(t.scale_x, 3.0));
    assert!(approx(t.scale_y, 3.0));
    assert!(approx(t.left, 0.0));
    assert!(approx(t.top, 0.0));
}
