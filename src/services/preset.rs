//! Preset store: every node's saved scenes, keyed by node name and image name.
//!
//! DESIGN
//! ======
//! On disk the store is one JSON object `{ node: { image: scene } }`. Each
//! widget receives the store explicitly, records a scene after each
//! successful upload, and removes its node's entries when the node is
//! deleted. Writes go to a sibling temp file first and are renamed into
//! place, so a crash never leaves a truncated store behind.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pose_canvas::doc::PoseDocument;
use tracing::{debug, info};

use super::persistence::PersistError;

type NodePresets = BTreeMap<String, PoseDocument>;

#[derive(Debug, Clone, Default)]
pub struct PresetStore {
    path: PathBuf,
    nodes: BTreeMap<String, NodePresets>,
}

impl PresetStore {
    /// An empty store that will be written to `path`.
    #[must_use]
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), nodes: BTreeMap::new() }
    }

    /// Read the store from `path`. A missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Io`] when the file cannot be read and
    /// [`PersistError::Json`] when it does not hold a valid store.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let path = path.into();
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "preset store not found; starting empty");
                return Ok(Self::empty(path));
            }
            Err(e) => return Err(e.into()),
        };
        let nodes = if raw.trim().is_empty() { BTreeMap::new() } else { serde_json::from_str(&raw)? };
        Ok(Self { path, nodes })
    }

    /// Write the store atomically.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Io`] when the temp file cannot be written or
    /// renamed.
    pub async fn save(&self) -> Result<(), PersistError> {
        let json = serde_json::to_string(&self.nodes)?;
        let tmp = temp_path(&self.path);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), nodes = self.nodes.len(), "preset store saved");
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make sure `node` has an entry, even if it has no presets yet.
    pub fn ensure_node(&mut self, node: &str) {
        self.nodes.entry(node.to_string()).or_default();
    }

    /// Record `doc` as the scene behind `image` for `node`.
    pub fn record(&mut self, node: &str, image: &str, doc: PoseDocument) {
        self.nodes.entry(node.to_string()).or_default().insert(image.to_string(), doc);
    }

    /// The scene stored for `(node, image)`, if any. A miss is logged and
    /// otherwise ignored.
    #[must_use]
    pub fn lookup(&self, node: &str, image: &str) -> Option<&PoseDocument> {
        let found = self.nodes.get(node).and_then(|presets| presets.get(image));
        if found.is_none() {
            info!(node, image, "pose not found in preset store");
        }
        found
    }

    /// Image names stored for `node`, sorted.
    #[must_use]
    pub fn images(&self, node: &str) -> Vec<String> {
        self.nodes.get(node).map(|presets| presets.keys().cloned().collect()).unwrap_or_default()
    }

    /// Drop every preset of `node`. Returns whether the node was present.
    pub fn remove_node(&mut self, node: &str) -> bool {
        self.nodes.remove(node).is_some()
    }

    #[must_use]
    pub fn contains_node(&self, node: &str) -> bool {
        self.nodes.contains_key(node)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "preset_test.rs"]
mod tests;
