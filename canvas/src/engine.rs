use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::consts::{KEYPOINT_COUNT, MIN_SCALE, ROTATE_SNAP_DEG};
use crate::doc::{PoseDocument, Scene, SceneError, Skeleton};
use crate::geom::{GroupTransform, Point, normalize_degrees_360, rotate_deg};
use crate::hit::{self, Hit, HitPart};
use crate::history::History;
use crate::input::{Button, Corner, InputState, Modifiers, UiState};
use crate::render;
use crate::transform;
use crate::viewport::Viewport;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from engine calls for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The canvas must be redrawn.
    RenderNeeded,
    /// A finished user edit was pushed onto the undo stack.
    Committed(PoseDocument),
    /// The host should render and persist the scene. `version` increases with
    /// every request so that late results of older requests can be dropped.
    PersistRequested { version: u64, document: PoseDocument },
}

/// Core engine state: all logic that does not depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
#[derive(Debug)]
pub struct EngineCore {
    pub scene: Scene,
    pub history: History,
    pub ui: UiState,
    pub input: InputState,
    pub viewport: Viewport,
    pub dpr: f64,
    mirrored: bool,
    edit_version: u64,
    gesture_changed: bool,
}

impl Default for EngineCore {
    fn default() -> Self {
        let scene = Scene::with_default_pose();
        let history = History::new(scene.serialize());
        Self {
            scene,
            history,
            ui: UiState::default(),
            input: InputState::default(),
            viewport: Viewport::default(),
            dpr: 1.0,
            mirrored: false,
            edit_version: 0,
            gesture_changed: false,
        }
    }
}

impl EngineCore {
    /// Engine showing the default pose, with that pose as the history floor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine initialized from a stored preset, which becomes the history floor.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MalformedPreset`] when the preset cannot be split
    /// into skeletons.
    pub fn with_document(doc: &PoseDocument) -> Result<Self, SceneError> {
        let mut scene = Scene::new();
        scene.load_document(doc)?;
        let history = History::new(scene.serialize());
        Ok(Self { scene, history, ..Self::default() })
    }

    // --- Host contract ---

    /// Replace the scene with skeletons built from a flat keypoint list.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MalformedPreset`] and leaves the scene as it was
    /// when the list length is not a multiple of 18.
    pub fn set_pose(&mut self, keypoints: &[Point]) -> Result<Vec<Action>, SceneError> {
        self.scene.load(keypoints)?;
        self.apply_eye_setting(0);
        self.ui.selected = None;
        self.input = InputState::Idle;
        Ok(vec![Action::RenderNeeded])
    }

    /// Load a serialized preset into the scene.
    ///
    /// # Errors
    ///
    /// See [`EngineCore::set_pose`].
    pub fn load_preset(&mut self, doc: &PoseDocument) -> Result<Vec<Action>, SceneError> {
        self.set_pose(&doc.points())
    }

    /// Add one skeleton (the default pose when `keypoints` is `None`) and make
    /// it the active selection.
    pub fn add_pose(&mut self, keypoints: Option<[Point; KEYPOINT_COUNT]>) -> Vec<Action> {
        let skeleton = keypoints.map_or_else(Skeleton::default_pose, Skeleton::assemble);
        let index = self.scene.add(skeleton);
        self.apply_eye_setting(index);
        self.ui.selected = Some(index);
        vec![Action::RenderNeeded]
    }

    /// Clear to a single default-pose skeleton.
    pub fn reset_scene(&mut self) -> Vec<Action> {
        self.scene.reset();
        self.apply_eye_setting(0);
        self.ui.selected = Some(0);
        self.input = InputState::Idle;
        vec![Action::RenderNeeded]
    }

    /// Step back one history entry and reload it.
    pub fn undo(&mut self) -> Vec<Action> {
        match self.history.undo() {
            Some(snapshot) => self.replay(snapshot),
            None => Vec::new(),
        }
    }

    /// Re-apply the last undone entry.
    pub fn redo(&mut self) -> Vec<Action> {
        match self.history.redo() {
            Some(snapshot) => self.replay(snapshot),
            None => Vec::new(),
        }
    }

    /// Ask the host to persist the current scene without touching history.
    /// Used for the initial upload of a freshly created widget.
    pub fn request_persist(&mut self) -> Vec<Action> {
        let document = self.scene.serialize();
        vec![self.persist_request(document)]
    }

    /// The scene as a flat, rounded keypoint document.
    #[must_use]
    pub fn serialize_scene(&self) -> PoseDocument {
        self.scene.serialize()
    }

    // --- Direct transform edits ---

    /// Apply `edit` to a skeleton's group transform as one complete gesture:
    /// recompute, then commit.
    pub fn edit_transform(&mut self, index: usize, edit: impl FnOnce(&mut GroupTransform)) -> Vec<Action> {
        let Some(skeleton) = self.scene.get_mut(index) else {
            return Vec::new();
        };
        edit(&mut skeleton.transform);
        let mut actions = self.recompute(index);
        actions.extend(self.commit());
        actions
    }

    /// Move one keypoint as one complete gesture.
    pub fn edit_keypoint(&mut self, index: usize, keypoint: usize, position: Point) -> Vec<Action> {
        let Some(skeleton) = self.scene.get_mut(index) else {
            return Vec::new();
        };
        if !skeleton.move_keypoint(keypoint, position) {
            return Vec::new();
        }
        skeleton.refit();
        let mut actions = vec![Action::RenderNeeded];
        actions.extend(self.commit());
        actions
    }

    /// Change the user-level eye setting and re-derive every skeleton.
    pub fn set_visible_eyes(&mut self, visible: bool) -> Vec<Action> {
        self.ui.visible_eyes = visible;
        for skeleton in 0..self.scene.len() {
            self.recompute(skeleton);
        }
        vec![Action::RenderNeeded]
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let pt = self.viewport.screen_to_canvas(screen_pt);
        self.gesture_changed = false;

        let Some(Hit { skeleton, part }) = hit::hit_test(pt, &self.scene, &self.viewport, self.ui.selected) else {
            self.input = InputState::Idle;
            return if self.ui.selected.take().is_some() { vec![Action::RenderNeeded] } else { Vec::new() };
        };
        let Some(target) = self.scene.get(skeleton) else {
            return Vec::new();
        };
        let t = target.transform;

        self.input = match part {
            HitPart::RotateHandle => {
                let center = t.center();
                InputState::RotatingSkeleton { index: skeleton, center, start_bearing: bearing(center, pt), orig_angle: t.angle }
            }
            HitPart::ScaleHandle(corner) => {
                let anchor = t.corners()[corner.opposite().index()];
                InputState::ScalingSkeleton { index: skeleton, corner, anchor, orig: t }
            }
            HitPart::Keypoint(keypoint) if !modifiers.shift => {
                let position = target.keypoints.get(keypoint).map_or(pt, |k| k.position);
                self.ui.selected = None;
                InputState::DraggingKeypoint {
                    skeleton,
                    keypoint,
                    grab_offset: Point::new(position.x - pt.x, position.y - pt.y),
                }
            }
            HitPart::Keypoint(_) | HitPart::Body => {
                self.ui.selected = Some(skeleton);
                InputState::MovingSkeleton { index: skeleton, last: pt }
            }
        };
        vec![Action::RenderNeeded]
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let pt = self.viewport.screen_to_canvas(screen_pt);

        match self.input.clone() {
            InputState::Idle => Vec::new(),
            InputState::MovingSkeleton { index, last } => {
                let Some(skeleton) = self.scene.get_mut(index) else {
                    return Vec::new();
                };
                skeleton.transform.left += pt.x - last.x;
                skeleton.transform.top += pt.y - last.y;
                self.input = InputState::MovingSkeleton { index, last: pt };
                self.recompute(index)
            }
            InputState::ScalingSkeleton { index, corner, anchor, orig } => {
                let Some(skeleton) = self.scene.get_mut(index) else {
                    return Vec::new();
                };
                skeleton.transform = scale_from_corner(&orig, corner, anchor, pt, modifiers.shift);
                self.recompute(index)
            }
            InputState::RotatingSkeleton { index, center, start_bearing, orig_angle } => {
                let Some(skeleton) = self.scene.get_mut(index) else {
                    return Vec::new();
                };
                let mut angle = normalize_degrees_360(orig_angle + bearing(center, pt) - start_bearing);
                if modifiers.shift {
                    angle = normalize_degrees_360((angle / ROTATE_SNAP_DEG).round() * ROTATE_SNAP_DEG);
                }
                skeleton.transform.angle = angle;
                skeleton.transform.set_center(center);
                self.recompute(index)
            }
            InputState::DraggingKeypoint { skeleton, keypoint, grab_offset } => {
                let Some(target) = self.scene.get_mut(skeleton) else {
                    return Vec::new();
                };
                if !target.move_keypoint(keypoint, Point::new(pt.x + grab_offset.x, pt.y + grab_offset.y)) {
                    return Vec::new();
                }
                self.gesture_changed = true;
                vec![Action::RenderNeeded]
            }
        }
    }

    /// End the active gesture. Commits history only if the gesture changed
    /// something.
    pub fn on_pointer_up(&mut self, _screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let finished = std::mem::take(&mut self.input);
        if finished.is_idle() || !self.gesture_changed {
            return Vec::new();
        }
        self.gesture_changed = false;

        if let InputState::DraggingKeypoint { skeleton, .. } = finished {
            if let Some(target) = self.scene.get_mut(skeleton) {
                target.refit();
            }
        }
        self.commit()
    }

    // --- Queries ---

    /// The currently selected skeleton, if any.
    #[must_use]
    pub fn selection(&self) -> Option<usize> {
        self.ui.selected
    }

    /// Mirror parity of the most recently recomputed skeleton.
    #[must_use]
    pub fn mirrored(&self) -> bool {
        self.mirrored
    }

    /// Version tag of the most recent persist request.
    #[must_use]
    pub fn edit_version(&self) -> u64 {
        self.edit_version
    }

    #[must_use]
    pub fn skeleton(&self, index: usize) -> Option<&Skeleton> {
        self.scene.get(index)
    }

    // --- Internals ---

    fn recompute(&mut self, index: usize) -> Vec<Action> {
        let Some(skeleton) = self.scene.get_mut(index) else {
            return Vec::new();
        };
        let outcome = transform::recompute(skeleton, self.ui.visible_eyes);
        self.mirrored = outcome.mirrored;
        self.gesture_changed = true;
        vec![Action::RenderNeeded]
    }

    /// Re-derive eye visibility for skeletons `from..` after they were built
    /// fresh. Assembled skeletons have an identity transform, so only the eyes
    /// change.
    fn apply_eye_setting(&mut self, from: usize) {
        for index in from..self.scene.len() {
            if let Some(skeleton) = self.scene.get_mut(index) {
                transform::recompute(skeleton, self.ui.visible_eyes);
            }
        }
    }

    fn commit(&mut self) -> Vec<Action> {
        let document = self.scene.serialize();
        let mut actions = Vec::with_capacity(2);
        if self.history.commit(document.clone()) {
            actions.push(Action::Committed(document.clone()));
        }
        actions.push(self.persist_request(document));
        actions
    }

    fn replay(&mut self, snapshot: PoseDocument) -> Vec<Action> {
        let guard = self.history.replay_scope();
        let loaded = self.scene.load_document(&snapshot);
        drop(guard);
        if loaded.is_err() {
            return Vec::new();
        }
        self.apply_eye_setting(0);
        self.ui.selected = None;
        self.input = InputState::Idle;
        vec![Action::RenderNeeded, self.persist_request(snapshot)]
    }

    fn persist_request(&mut self, document: PoseDocument) -> Action {
        self.edit_version += 1;
        Action::PersistRequested { version: self.edit_version, document }
    }
}

/// Bearing of `pt` as seen from `center`, in degrees.
fn bearing(center: Point, pt: Point) -> f64 {
    (pt.y - center.y).atan2(pt.x - center.x).to_degrees()
}

/// Transform produced by dragging `corner` to `pt` while the opposite corner
/// stays pinned at `anchor`. Dragging across the anchor flips that axis.
fn scale_from_corner(orig: &GroupTransform, corner: Corner, anchor: Point, pt: Point, keep_aspect: bool) -> GroupTransform {
    let (sign_x, sign_y) = corner.signs();
    let d = rotate_deg(Point::new(pt.x - anchor.x, pt.y - anchor.y), -orig.angle);

    let axis_scale = |along: f64, extent: f64, current: f64| {
        if extent.abs() < f64::EPSILON { current } else { along / extent }
    };
    let mut scale_x = axis_scale(d.x * sign_x, orig.width, orig.scale_x);
    let mut scale_y = axis_scale(d.y * sign_y, orig.height, orig.scale_y);

    if keep_aspect {
        let k = (scale_x.abs() / orig.scale_x).max(scale_y.abs() / orig.scale_y);
        scale_x = (k * orig.scale_x).copysign(scale_x);
        scale_y = (k * orig.scale_y).copysign(scale_y);
    }

    let mut t = *orig;
    t.flip_x = if scale_x < 0.0 { !orig.flip_x } else { orig.flip_x };
    t.flip_y = if scale_y < 0.0 { !orig.flip_y } else { orig.flip_y };
    t.scale_x = scale_x.abs().max(MIN_SCALE);
    t.scale_y = scale_y.abs().max(MIN_SCALE);

    let (w, h) = t.scaled_size();
    let half = Point::new(sign_x * scale_x.signum() * w / 2.0, sign_y * scale_y.signum() * h / 2.0);
    let offset = rotate_deg(half, t.angle);
    t.set_center(Point::new(anchor.x + offset.x, anchor.y + offset.y));
    t
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        let core = EngineCore::new();
        let size = backing_size(core.viewport.canvas_size);
        canvas.set_width(size);
        canvas.set_height(size);
        Self { canvas, core }
    }

    // --- Delegated host contract ---

    /// # Errors
    ///
    /// See [`EngineCore::set_pose`].
    pub fn set_pose(&mut self, keypoints: &[Point]) -> Result<Vec<Action>, SceneError> {
        self.core.set_pose(keypoints)
    }

    /// # Errors
    ///
    /// See [`EngineCore::load_preset`].
    pub fn load_preset(&mut self, doc: &PoseDocument) -> Result<Vec<Action>, SceneError> {
        self.core.load_preset(doc)
    }

    pub fn add_pose(&mut self, keypoints: Option<[Point; KEYPOINT_COUNT]>) -> Vec<Action> {
        self.core.add_pose(keypoints)
    }

    pub fn reset_scene(&mut self) -> Vec<Action> {
        self.core.reset_scene()
    }

    pub fn undo(&mut self) -> Vec<Action> {
        self.core.undo()
    }

    pub fn redo(&mut self) -> Vec<Action> {
        self.core.redo()
    }

    #[must_use]
    pub fn serialize_scene(&self) -> PoseDocument {
        self.core.serialize_scene()
    }

    // --- Viewport ---

    /// Update the on-screen size of the canvas and the device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.viewport.display_width = width_css;
        self.core.viewport.display_height = height_css;
        self.core.dpr = dpr;
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button, modifiers)
    }

    // --- Render ---

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or a draw call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        let ctx = self
            .canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(JsValue::from)?;
        render::draw(&ctx, &self.core.scene, &self.core.ui, &self.core.viewport)
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn selection(&self) -> Option<usize> {
        self.core.selection()
    }

    #[must_use]
    pub fn skeleton(&self, index: usize) -> Option<&Skeleton> {
        self.core.skeleton(index)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn backing_size(size: f64) -> u32 {
    size.max(1.0).round() as u32
}
