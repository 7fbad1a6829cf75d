//! Pose widget: one editor node wired to the shared preset store and uploader.
//!
//! DESIGN
//! ======
//! The widget owns its [`EngineCore`] and acts on the actions it returns.
//! `PersistRequested` is rasterized on the spot and handed to
//! [`spawn_upload`]; the outcome comes back later through the app's outcome
//! channel and is applied with [`PoseWidget::on_persisted`]. The engine is not
//! `Send`, so the widget lives on the task that drives it and never moves into
//! a spawned task.
//!
//! LIFECYCLE
//! =========
//! - create: pick the node name, register it in the store, load the preset for
//!   `<node>.png` if one exists, then upload the initial scene.
//! - image selection: load the selected preset, if stored.
//! - removal: drop the node's presets and save the store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use pose_canvas::doc::{PoseDocument, PresetError, SceneError};
use pose_canvas::engine::{Action, EngineCore};
use pose_canvas::geom::{GroupTransform, Point};
use pose_canvas::input::{Button, Modifiers};
use tracing::{debug, error, info};

use crate::services::persistence::{PersistError, PersistJob, PersistOutcome, spawn_upload};
use crate::services::raster;
use crate::state::AppState;

/// The node's image combo: the selected image name and the known names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageCombo {
    pub value: String,
    pub values: Vec<String>,
}

pub struct PoseWidget {
    node: String,
    engine: EngineCore,
    image: ImageCombo,
    latest_version: Arc<AtomicU64>,
    state: AppState,
}

impl PoseWidget {
    /// Create a widget for a new node and start its initial upload.
    pub async fn create(state: AppState) -> Self {
        let node = state.config.node_name.clone().unwrap_or_else(|| state.next_node_name());
        let value = format!("{node}.png");

        let (stored, values) = {
            let mut presets = state.presets.write().await;
            presets.ensure_node(&node);
            (presets.lookup(&node, &value).cloned(), presets.images(&node))
        };

        let mut engine = match stored {
            Some(doc) => EngineCore::with_document(&doc).unwrap_or_else(|e| {
                error!(node = %node, error = %e, "stored preset rejected; using default pose");
                EngineCore::new()
            }),
            None => EngineCore::new(),
        };
        let size = f64::from(state.config.canvas_size);
        engine.viewport.canvas_size = size;
        engine.viewport.display_width = size;
        engine.viewport.display_height = size;
        engine.set_visible_eyes(state.config.visible_eyes);

        info!(node = %node, skeletons = engine.scene.len(), "pose widget created");
        let mut widget = Self {
            node,
            engine,
            image: ImageCombo { value, values },
            latest_version: Arc::new(AtomicU64::new(0)),
            state,
        };
        let actions = widget.engine.request_persist();
        widget.apply(actions);
        widget
    }

    #[must_use]
    pub fn node(&self) -> &str {
        &self.node
    }

    #[must_use]
    pub fn image(&self) -> &ImageCombo {
        &self.image
    }

    #[must_use]
    pub fn engine(&self) -> &EngineCore {
        &self.engine
    }

    /// Version of the most recent upload this widget asked for.
    #[must_use]
    pub fn latest_version(&self) -> u64 {
        self.latest_version.load(Ordering::Acquire)
    }

    // =========================================================================
    // HOST CONTRACT
    // =========================================================================

    /// Replace the scene from a flat keypoint list.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MalformedPreset`] when the list length is not a
    /// multiple of 18; the scene is left as it was.
    pub fn set_pose(&mut self, keypoints: &[Point]) -> Result<(), SceneError> {
        let actions = self.engine.set_pose(keypoints)?;
        self.apply(actions);
        Ok(())
    }

    /// Load a preset given as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError`] for invalid JSON or a bad keypoint count.
    pub fn load_preset_json(&mut self, raw: &str) -> Result<(), PresetError> {
        let doc = PoseDocument::from_json(raw)?;
        let actions = self.engine.load_preset(&doc)?;
        self.apply(actions);
        Ok(())
    }

    pub fn add_pose(&mut self) {
        let actions = self.engine.add_pose(None);
        self.apply(actions);
    }

    pub fn reset(&mut self) {
        let actions = self.engine.reset_scene();
        self.apply(actions);
    }

    pub fn undo(&mut self) {
        let actions = self.engine.undo();
        self.apply(actions);
    }

    pub fn redo(&mut self) {
        let actions = self.engine.redo();
        self.apply(actions);
    }

    /// The scene as preset JSON.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize_json(&self) -> Result<String, serde_json::Error> {
        self.engine.serialize_scene().to_json()
    }

    // =========================================================================
    // EDITS
    // =========================================================================

    /// Apply a change to one skeleton's group transform as a committed edit.
    /// Returns `false` when the skeleton does not exist.
    pub fn edit_transform(&mut self, skeleton: usize, edit: impl FnOnce(&mut GroupTransform)) -> bool {
        let actions = self.engine.edit_transform(skeleton, edit);
        let changed = !actions.is_empty();
        self.apply(actions);
        changed
    }

    /// Move one keypoint as a committed edit.
    pub fn move_keypoint(&mut self, skeleton: usize, keypoint: usize, to: Point) -> bool {
        let actions = self.engine.edit_keypoint(skeleton, keypoint, to);
        let changed = !actions.is_empty();
        self.apply(actions);
        changed
    }

    pub fn set_visible_eyes(&mut self, visible: bool) {
        let actions = self.engine.set_visible_eyes(visible);
        self.apply(actions);
    }

    /// Replay a primary-button drag from `from` to `to`, in display pixels.
    pub fn drag(&mut self, from: Point, to: Point, modifiers: Modifiers) {
        let mut actions = self.engine.on_pointer_down(from, Button::Primary, modifiers);
        actions.extend(self.engine.on_pointer_move(to, modifiers));
        actions.extend(self.engine.on_pointer_up(to, Button::Primary, modifiers));
        self.apply(actions);
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Select `name` in the image combo and load its preset, if stored.
    /// Returns whether a preset was loaded.
    pub async fn select_image(&mut self, name: &str) -> bool {
        self.image.value = name.to_string();
        let stored = self.state.presets.read().await.lookup(&self.node, name).cloned();
        let Some(doc) = stored else {
            return false;
        };
        match self.engine.load_preset(&doc) {
            Ok(actions) => {
                self.apply(actions);
                true
            }
            Err(e) => {
                error!(node = %self.node, image = name, error = %e, "stored preset rejected");
                false
            }
        }
    }

    /// Apply a finished upload. Returns the alert text for a failure.
    pub fn on_persisted(&mut self, outcome: PersistOutcome) -> Option<String> {
        match outcome {
            PersistOutcome::Stored { node, image, version } if node == self.node => {
                if !self.image.values.contains(&image) {
                    self.image.values.push(image.clone());
                }
                debug!(node = %node, version, image = %image, "image combo updated");
                self.image.value = image;
                None
            }
            PersistOutcome::Failed { node, message, .. } if node == self.node => Some(message),
            _ => None,
        }
    }

    /// Drop this node's presets and save the store.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when the store cannot be written.
    pub async fn on_removed(self) -> Result<(), PersistError> {
        let mut presets = self.state.presets.write().await;
        let removed = presets.remove_node(&self.node);
        presets.save().await?;
        info!(node = %self.node, removed, "pose widget removed");
        Ok(())
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    fn apply(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::RenderNeeded => {}
                Action::Committed(doc) => {
                    debug!(node = %self.node, keypoints = doc.keypoints.len(), "edit committed");
                }
                Action::PersistRequested { version, document } => self.persist(version, document),
            }
        }
    }

    fn persist(&mut self, version: u64, document: PoseDocument) {
        self.latest_version.store(version, Ordering::Release);
        let png = match raster::render_png(&self.engine.scene, self.state.config.canvas_size) {
            Ok(png) => png,
            Err(e) => {
                error!(node = %self.node, version, error = %e, "pose rasterize failed");
                let failed = PersistOutcome::Failed { node: self.node.clone(), version, message: e.to_string() };
                if self.state.outcomes.send(failed).is_err() {
                    debug!(node = %self.node, "outcome channel closed");
                }
                return;
            }
        };
        let job = PersistJob { node: self.node.clone(), file_name: format!("{}.png", self.node), version, document, png };
        spawn_upload(&self.state, job, Arc::clone(&self.latest_version));
    }
}

#[cfg(test)]
#[path = "widget_test.rs"]
mod tests;
