//! Persistence service: upload the rendered scene, then record it as a preset.
//!
//! DESIGN
//! ======
//! Every commit, undo and redo makes the engine emit a persist request with a
//! fresh edit version. The widget rasterizes the scene right away and hands
//! the PNG to a spawned task, so editing never waits on the network. Uploads
//! may finish out of order; a result is only recorded if its version is still
//! the latest one the widget asked for.
//!
//! ERROR HANDLING
//! ==============
//! Upload and store failures are logged and reported back to the widget as a
//! [`PersistOutcome::Failed`], which the host shows as an alert. A failure of
//! a stale upload is dropped like a stale success. The scene and history are
//! never touched by this module.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use pose_canvas::doc::PoseDocument;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::state::AppState;

/// Errors from rendering, uploading, or storing a pose.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The HTTP request could not be built or sent, or its body was unreadable.
    #[error("upload request failed: {0}")]
    Upload(#[from] reqwest::Error),

    /// The upload endpoint answered with a non-success status.
    #[error("{code} - {reason}")]
    Status { code: u16, reason: String },

    /// The scene could not be encoded as PNG.
    #[error("rasterize failed: {0}")]
    Raster(#[from] image::ImageError),

    /// The preset store file could not be read or written.
    #[error("preset store io failed: {0}")]
    Io(#[from] std::io::Error),

    /// The preset store held invalid JSON.
    #[error("preset store json failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// One rendered scene waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct PersistJob {
    pub node: String,
    /// Requested file name, `<node>.png`.
    pub file_name: String,
    pub version: u64,
    pub document: PoseDocument,
    pub png: Vec<u8>,
}

/// Result of a finished upload, delivered back to the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The image was uploaded and its scene recorded under `image`.
    Stored { node: String, image: String, version: u64 },
    /// Upload or store write failed; `message` is shown to the user.
    Failed { node: String, version: u64, message: String },
}

/// Spawn the upload for `job`. `latest` is the widget's most recent requested
/// version.
pub fn spawn_upload(state: &AppState, job: PersistJob, latest: Arc<AtomicU64>) -> JoinHandle<()> {
    let state = state.clone();
    tokio::spawn(async move {
        let node = job.node.clone();
        let Some(outcome) = run_upload(&state, job, &latest).await else {
            return;
        };
        if state.outcomes.send(outcome).is_err() {
            warn!(node = %node, "persist outcome dropped; widget closed");
        }
    })
}

/// Upload `job` and record it. Returns `None` when the result is stale,
/// whether the upload succeeded or not.
pub(crate) async fn run_upload(state: &AppState, job: PersistJob, latest: &AtomicU64) -> Option<PersistOutcome> {
    let PersistJob { node, file_name, version, document, png } = job;

    let uploaded = state.sink.upload(&file_name, png).await;

    // EDGE: a newer edit was requested while this upload was in flight. Its
    // own upload reports success or failure, so this one stays silent.
    let newest = latest.load(Ordering::Acquire);
    if newest != version {
        debug!(node = %node, version, newest, failed = uploaded.is_err(), "stale upload result dropped");
        return None;
    }

    let receipt = match uploaded {
        Ok(receipt) => receipt,
        Err(e) => {
            error!(error = %e, node = %node, version, "pose upload failed");
            return Some(PersistOutcome::Failed { node, version, message: e.to_string() });
        }
    };

    let saved = {
        let mut store = state.presets.write().await;
        store.record(&node, &receipt.name, document);
        store.save().await
    };
    match saved {
        Ok(()) => {
            info!(node = %node, version, image = %receipt.name, "pose preset stored");
            Some(PersistOutcome::Stored { node, image: receipt.name, version })
        }
        Err(e) => {
            error!(error = %e, node = %node, version, "preset store write failed");
            Some(PersistOutcome::Failed { node, version, message: e.to_string() })
        }
    }
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
