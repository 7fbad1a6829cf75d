//! Document model: keypoints, bones, skeleton assembly, and the scene store.
//!
//! A [`Skeleton`] is assembled from exactly 18 points. Each bone copies the
//! positions of its two keypoints into its endpoints, and each keypoint keeps
//! the list of bone endpoints it must drive ([`BoneLink`]). The [`Scene`] is
//! the ordered list of skeletons on the canvas and the only thing that is
//! serialized: a flat `{ "keypoints": [[x, y], ...] }` document with 18
//! entries per skeleton.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::consts::{BONE_COUNT, BONE_STROKE_WIDTH, KEYPOINT_COUNT, KEYPOINT_RADIUS, KEYPOINT_STROKE_WIDTH};
use crate::geom::{GroupTransform, Point};
use crate::topology::{self, DEFAULT_KEYPOINTS, Rgb, Rgba};

/// Error returned when a keypoint stream cannot be split into skeletons.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The keypoint count is not a multiple of [`KEYPOINT_COUNT`].
    #[error("keypoints is invalid: {count} keypoints is not a multiple of {KEYPOINT_COUNT}")]
    MalformedPreset { count: usize },
}

/// Error returned when parsing a preset JSON document.
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("invalid preset json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Which end of a bone a keypoint drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Endpoint 1, owned by the bone's `src` keypoint.
    Start,
    /// Endpoint 2, owned by the bone's `dst` keypoint.
    End,
}

/// A reference from a keypoint to one bone endpoint it keeps in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoneLink {
    pub bone: usize,
    pub end: Endpoint,
}

/// One skeletal landmark.
#[derive(Debug, Clone, PartialEq)]
pub struct Keypoint {
    /// Index in `0..KEYPOINT_COUNT`.
    pub index: usize,
    /// Absolute canvas position.
    pub position: Point,
    /// Position relative to the group center, before scale/flip/rotation.
    pub local: Point,
    pub color: Rgb,
    pub radius: f64,
    pub stroke_width: f64,
    /// Member-level scale. The group owns scale, so this is reset to 1 on recompute.
    pub scale_x: f64,
    pub scale_y: f64,
    /// Bone endpoints that track this keypoint, in topology-table order.
    pub links: Vec<BoneLink>,
}

/// A line segment between two keypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Index into the topology table.
    pub index: usize,
    pub src: usize,
    pub dst: usize,
    pub color: Rgba,
    /// Endpoint 1, mirrors `src`.
    pub start: Point,
    /// Endpoint 2, mirrors `dst`.
    pub end: Point,
    pub stroke_width: f64,
}

impl Bone {
    pub fn set_endpoint(&mut self, end: Endpoint, p: Point) {
        match end {
            Endpoint::Start => self.start = p,
            Endpoint::End => self.end = p,
        }
    }
}

/// One full 18-keypoint, 17-bone pose, grouped under a single transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    pub keypoints: Vec<Keypoint>,
    pub bones: Vec<Bone>,
    pub transform: GroupTransform,
}

impl Skeleton {
    /// Build a skeleton from 18 absolute points.
    ///
    /// Bones come from the topology table; each keypoint collects links to
    /// every bone that names it, with the endpoint role taken from whether it
    /// is that bone's `src` or `dst`. The group transform starts as identity
    /// with a bounding box that fits the points.
    #[must_use]
    pub fn assemble(points: [Point; KEYPOINT_COUNT]) -> Self {
        let bones = (0..BONE_COUNT)
            .map(|index| {
                let (src, dst) = topology::bone_endpoints(index);
                Bone {
                    index,
                    src,
                    dst,
                    color: topology::bone_color(index),
                    start: points[src],
                    end: points[dst],
                    stroke_width: BONE_STROKE_WIDTH,
                }
            })
            .collect();

        let transform = GroupTransform::fitting(&points);

        let keypoints = points
            .iter()
            .enumerate()
            .map(|(index, &position)| Keypoint {
                index,
                position,
                local: transform.to_local(position),
                color: topology::keypoint_color(index),
                radius: KEYPOINT_RADIUS,
                stroke_width: KEYPOINT_STROKE_WIDTH,
                scale_x: 1.0,
                scale_y: 1.0,
                links: links_for(index),
            })
            .collect();

        Self { keypoints, bones, transform }
    }

    /// The built-in standing pose.
    #[must_use]
    pub fn default_pose() -> Self {
        Self::assemble(DEFAULT_KEYPOINTS.map(Point::from))
    }

    /// Absolute keypoint positions in index order.
    pub fn positions(&self) -> impl Iterator<Item = Point> + '_ {
        self.keypoints.iter().map(|k| k.position)
    }

    /// Copy keypoint `index`'s position into every bone endpoint it drives.
    pub fn sync_bones(&mut self, index: usize) {
        let Some(kp) = self.keypoints.get(index) else {
            return;
        };
        let position = kp.position;
        for link in &kp.links {
            if let Some(bone) = self.bones.get_mut(link.bone) {
                bone.set_endpoint(link.end, position);
            }
        }
    }

    /// Place a single keypoint at `position` outside of any group gesture.
    ///
    /// Bone endpoints follow directly; the group-local coordinate is updated
    /// through the inverse group transform so later group edits keep it.
    pub fn move_keypoint(&mut self, index: usize, position: Point) -> bool {
        let local = self.transform.to_local(position);
        let Some(kp) = self.keypoints.get_mut(index) else {
            return false;
        };
        kp.position = position;
        kp.local = local;
        self.sync_bones(index);
        true
    }

    /// Shrink or grow the group bounding box to fit the current keypoints
    /// without moving any of them.
    pub fn refit(&mut self) {
        let locals: Vec<Point> = self.keypoints.iter().map(|k| k.local).collect();
        let bounds = GroupTransform::fitting(&locals);
        let shift = Point::new(bounds.left + bounds.width / 2.0, bounds.top + bounds.height / 2.0);

        let new_center = self.transform.to_canvas(shift);
        self.transform.width = bounds.width;
        self.transform.height = bounds.height;
        self.transform.set_center(new_center);

        for kp in &mut self.keypoints {
            kp.local = Point::new(kp.local.x - shift.x, kp.local.y - shift.y);
        }
    }
}

/// Round to the nearest integer, with halves going toward +∞ (`-2.5` → `-2`),
/// matching the preset files written by the browser editor.
#[allow(clippy::cast_possible_truncation)]
fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

fn links_for(keypoint: usize) -> Vec<BoneLink> {
    topology::bones_touching(keypoint)
        .map(|bone| {
            let (src, _) = topology::bone_endpoints(bone);
            let end = if src == keypoint { Endpoint::Start } else { Endpoint::End };
            BoneLink { bone, end }
        })
        .collect()
}

/// Serialized scene: a flat list of integer keypoints, 18 per skeleton.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseDocument {
    pub keypoints: Vec<[i64; 2]>,
}

impl PoseDocument {
    /// Parse and validate a preset JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::Json`] for malformed JSON and
    /// [`PresetError::Scene`] when the keypoint count is not a multiple of 18.
    pub fn from_json(raw: &str) -> Result<Self, PresetError> {
        let doc: Self = serde_json::from_str(raw)?;
        if let Err(e) = doc.validate() {
            error!(count = doc.keypoints.len(), "keypoints is invalid; preset not loaded");
            return Err(e.into());
        }
        Ok(doc)
    }

    /// Encode as compact JSON.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The document for a single default-pose skeleton.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn default_pose() -> Self {
        Self { keypoints: DEFAULT_KEYPOINTS.iter().map(|[x, y]| [*x as i64, *y as i64]).collect() }
    }

    /// Check that the keypoints split evenly into skeletons.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MalformedPreset`] otherwise.
    pub fn validate(&self) -> Result<(), SceneError> {
        let count = self.keypoints.len();
        if count % KEYPOINT_COUNT == 0 {
            Ok(())
        } else {
            Err(SceneError::MalformedPreset { count })
        }
    }

    #[must_use]
    pub fn skeleton_count(&self) -> usize {
        self.keypoints.len() / KEYPOINT_COUNT
    }

    /// Keypoints as canvas points.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn points(&self) -> Vec<Point> {
        self.keypoints.iter().map(|[x, y]| Point::new(*x as f64, *y as f64)).collect()
    }
}

/// Ordered set of skeletons on the canvas.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    skeletons: Vec<Skeleton>,
}

impl Scene {
    /// An empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self { skeletons: Vec::new() }
    }

    /// A scene holding one default-pose skeleton.
    #[must_use]
    pub fn with_default_pose() -> Self {
        Self { skeletons: vec![Skeleton::default_pose()] }
    }

    /// Append a skeleton and return its index.
    pub fn add(&mut self, skeleton: Skeleton) -> usize {
        self.skeletons.push(skeleton);
        self.skeletons.len() - 1
    }

    /// Remove every skeleton.
    pub fn clear(&mut self) {
        self.skeletons.clear();
    }

    /// Replace the scene with a single default-pose skeleton.
    pub fn reset(&mut self) {
        self.skeletons.clear();
        self.skeletons.push(Skeleton::default_pose());
    }

    /// Replace the scene with one skeleton per 18-point chunk of `flat`.
    ///
    /// Returns the number of skeletons built.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MalformedPreset`] when `flat.len()` is not a
    /// multiple of 18. The scene is left untouched in that case.
    pub fn load(&mut self, flat: &[Point]) -> Result<usize, SceneError> {
        if flat.len() % KEYPOINT_COUNT != 0 {
            error!(count = flat.len(), "keypoints is invalid; preset not loaded");
            return Err(SceneError::MalformedPreset { count: flat.len() });
        }

        let mut skeletons = Vec::with_capacity(flat.len() / KEYPOINT_COUNT);
        for chunk in flat.chunks_exact(KEYPOINT_COUNT) {
            let mut points = [Point::default(); KEYPOINT_COUNT];
            points.copy_from_slice(chunk);
            skeletons.push(Skeleton::assemble(points));
        }
        self.skeletons = skeletons;
        Ok(self.skeletons.len())
    }

    /// Load a serialized document.
    ///
    /// # Errors
    ///
    /// See [`Scene::load`].
    pub fn load_document(&mut self, doc: &PoseDocument) -> Result<usize, SceneError> {
        self.load(&doc.points())
    }

    /// Flatten every keypoint, skeleton by skeleton, rounding to integers.
    #[must_use]
    pub fn serialize(&self) -> PoseDocument {
        let keypoints = self
            .skeletons
            .iter()
            .flat_map(Skeleton::positions)
            .map(|p| [round_half_up(p.x), round_half_up(p.y)])
            .collect();
        PoseDocument { keypoints }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Skeleton> {
        self.skeletons.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Skeleton> {
        self.skeletons.get_mut(index)
    }

    /// Skeletons in creation order.
    #[must_use]
    pub fn skeletons(&self) -> &[Skeleton] {
        &self.skeletons
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skeletons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skeletons.is_empty()
    }
}
