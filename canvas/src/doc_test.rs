#![allow(clippy::float_cmp)]

use super::*;
use crate::topology::CONNECT_KEYPOINTS;

// =============================================================
// Helpers
// =============================================================

fn approx_pt(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

fn shifted_pose(dx: f64, dy: f64) -> Vec<Point> {
    DEFAULT_KEYPOINTS.iter().map(|[x, y]| Point::new(x + dx, y + dy)).collect()
}

fn default_points() -> [Point; KEYPOINT_COUNT] {
    DEFAULT_KEYPOINTS.map(Point::from)
}

// =============================================================
// Skeleton assembly
// =============================================================

#[test]
fn assemble_builds_full_topology() {
    let s = Skeleton::default_pose();
    assert_eq!(s.keypoints.len(), KEYPOINT_COUNT);
    assert_eq!(s.bones.len(), BONE_COUNT);
}

#[test]
fn assemble_copies_points_into_bone_endpoints() {
    let s = Skeleton::default_pose();
    for bone in &s.bones {
        let [src, dst] = CONNECT_KEYPOINTS[bone.index];
        assert_eq!(bone.start, Point::from(DEFAULT_KEYPOINTS[src]));
        assert_eq!(bone.end, Point::from(DEFAULT_KEYPOINTS[dst]));
    }
}

#[test]
fn assemble_sets_drawing_attributes() {
    let s = Skeleton::default_pose();
    let kp = &s.keypoints[3];
    assert_eq!(kp.radius, KEYPOINT_RADIUS);
    assert_eq!(kp.stroke_width, KEYPOINT_STROKE_WIDTH);
    assert_eq!(kp.color, Rgb(255, 255, 0));
    assert_eq!(s.bones[0].stroke_width, BONE_STROKE_WIDTH);
    assert_eq!(s.bones[0].color.alpha, 0.7);
}

#[test]
fn assemble_fits_transform_to_points() {
    let s = Skeleton::default_pose();
    let t = s.transform;
    assert_eq!((t.left, t.top), (163.0, 59.0));
    assert_eq!((t.width, t.height), (332.0 - 163.0, 456.0 - 59.0));
}

#[test]
fn assemble_locals_map_back_to_positions() {
    let s = Skeleton::default_pose();
    for kp in &s.keypoints {
        assert!(approx_pt(s.transform.to_canvas(kp.local), kp.position));
    }
}

#[test]
fn links_cover_every_bone_end_exactly_once() {
    let s = Skeleton::default_pose();
    let mut starts = [0; BONE_COUNT];
    let mut ends = [0; BONE_COUNT];
    for kp in &s.keypoints {
        for link in &kp.links {
            match link.end {
                Endpoint::Start => starts[link.bone] += 1,
                Endpoint::End => ends[link.bone] += 1,
            }
        }
    }
    assert!(starts.iter().all(|&n| n == 1));
    assert!(ends.iter().all(|&n| n == 1));
}

#[test]
fn move_keypoint_drags_its_bones() {
    let mut s = Skeleton::default_pose();
    let target = Point::new(10.0, 20.0);
    assert!(s.move_keypoint(1, target));
    assert_eq!(s.keypoints[1].position, target);
    assert_eq!(s.bones[0].end, target);
    for bone in [1, 4, 7, 10] {
        assert_eq!(s.bones[bone].start, target);
    }
    assert!(approx_pt(s.transform.to_canvas(s.keypoints[1].local), target));
}

#[test]
fn move_keypoint_out_of_range_is_noop() {
    let mut s = Skeleton::default_pose();
    let before = s.clone();
    assert!(!s.move_keypoint(KEYPOINT_COUNT, Point::new(0.0, 0.0)));
    assert_eq!(s, before);
}

#[test]
fn refit_grows_box_without_moving_keypoints() {
    let mut s = Skeleton::default_pose();
    s.move_keypoint(4, Point::new(20.0, 500.0));
    let before: Vec<Point> = s.positions().collect();
    s.refit();
    assert!((s.transform.left - 20.0).abs() < 1e-9);
    assert!((s.transform.width - (332.0 - 20.0)).abs() < 1e-9);
    assert!((s.transform.height - (500.0 - 59.0)).abs() < 1e-9);
    for (kp, p) in s.keypoints.iter().zip(before) {
        assert!(approx_pt(s.transform.to_canvas(kp.local), p));
    }
}

// =============================================================
// PoseDocument
// =============================================================

#[test]
fn default_document_serializes_to_default_keypoints() {
    let json = PoseDocument::default_pose().to_json().unwrap_or_default();
    assert!(json.starts_with(r#"{"keypoints":[[241,77],[241,120],"#));
    assert!(json.ends_with("[260,72]]}"));
}

#[test]
fn from_json_accepts_two_skeletons() {
    let keypoints: Vec<[i64; 2]> = (0..36).map(|i| [i, i * 2]).collect();
    let raw = serde_json::to_string(&PoseDocument { keypoints }).unwrap_or_default();
    let doc = PoseDocument::from_json(&raw);
    assert!(matches!(doc, Ok(ref d) if d.skeleton_count() == 2));
}

#[test]
fn from_json_rejects_partial_skeleton() {
    let keypoints: Vec<[i64; 2]> = (0..19).map(|i| [i, i]).collect();
    let raw = serde_json::to_string(&PoseDocument { keypoints }).unwrap_or_default();
    match PoseDocument::from_json(&raw) {
        Err(PresetError::Scene(SceneError::MalformedPreset { count })) => assert_eq!(count, 19),
        other => panic!("expected malformed preset, got {other:?}"),
    }
}

#[test]
fn from_json_rejects_garbage() {
    assert!(matches!(PoseDocument::from_json("not json"), Err(PresetError::Json(_))));
    assert!(matches!(PoseDocument::from_json(r#"{"keypoints":[[1.5,2]]}"#), Err(PresetError::Json(_))));
}

#[test]
fn empty_document_is_valid() {
    let doc = PoseDocument::default();
    assert!(doc.validate().is_ok());
    assert_eq!(doc.skeleton_count(), 0);
}

#[test]
fn malformed_preset_message_names_count() {
    let msg = SceneError::MalformedPreset { count: 7 }.to_string();
    assert!(msg.contains("keypoints is invalid"));
    assert!(msg.contains('7'));
}

// =============================================================
// Scene
// =============================================================

#[test]
fn scene_default_pose_serializes_to_defaults() {
    let scene = Scene::with_default_pose();
    assert_eq!(scene.serialize(), PoseDocument::default_pose());
}

#[test]
fn scene_load_splits_into_skeletons() {
    let mut scene = Scene::new();
    let mut flat = shifted_pose(0.0, 0.0);
    flat.extend(shifted_pose(100.0, 0.0));
    assert_eq!(scene.load(&flat), Ok(2));
    assert_eq!(scene.len(), 2);
    assert_eq!(scene.get(1).map(|s| s.keypoints[0].position), Some(Point::new(341.0, 77.0)));
}

#[test]
fn scene_load_round_trips_through_serialize() {
    let mut scene = Scene::new();
    let mut flat = shifted_pose(-3.0, 4.0);
    flat.extend(shifted_pose(50.0, 60.0));
    flat.extend(shifted_pose(1.0, 1.0));
    assert_eq!(scene.load(&flat), Ok(3));
    let doc = scene.serialize();
    assert_eq!(doc.points(), flat);
}

#[test]
fn scene_load_rejects_bad_count_and_keeps_scene() {
    let mut scene = Scene::with_default_pose();
    scene.add(Skeleton::assemble(default_points()));
    let before = scene.serialize();

    let mut flat = shifted_pose(0.0, 0.0);
    flat.push(Point::new(1.0, 1.0));
    assert_eq!(scene.load(&flat), Err(SceneError::MalformedPreset { count: 19 }));
    assert_eq!(scene.serialize(), before);
}

#[test]
fn scene_load_empty_clears() {
    let mut scene = Scene::with_default_pose();
    assert_eq!(scene.load(&[]), Ok(0));
    assert!(scene.is_empty());
    assert_eq!(scene.serialize(), PoseDocument::default());
}

#[test]
fn scene_serialize_rounds_to_nearest() {
    let mut scene = Scene::new();
    let mut flat = shifted_pose(0.0, 0.0);
    flat[0] = Point::new(10.4, 10.6);
    assert_eq!(scene.load(&flat), Ok(1));
    assert_eq!(scene.serialize().keypoints[0], [10, 11]);
}

#[test]
fn scene_serialize_rounds_halves_up() {
    let mut scene = Scene::new();
    let mut flat = shifted_pose(0.0, 0.0);
    flat[0] = Point::new(-2.5, 3.5);
    flat[1] = Point::new(2.5, -0.5);
    assert_eq!(scene.load(&flat), Ok(1));
    let doc = scene.serialize();
    assert_eq!(doc.keypoints[0], [-2, 4]);
    assert_eq!(doc.keypoints[1], [3, 0]);
}

#[test]
fn scene_add_returns_index() {
    let mut scene = Scene::new();
    assert_eq!(scene.add(Skeleton::default_pose()), 0);
    assert_eq!(scene.add(Skeleton::default_pose()), 1);
}

#[test]
fn scene_reset_leaves_single_default() {
    let mut scene = Scene::new();
    scene.add(Skeleton::default_pose());
    scene.add(Skeleton::default_pose());
    scene.reset();
    assert_eq!(scene.len(), 1);
    assert_eq!(scene.serialize(), PoseDocument::default_pose());
}

#[test]
fn scene_clear_empties() {
    let mut scene = Scene::with_default_pose();
    scene.clear();
    assert!(scene.is_empty());
}
