//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is handed to every pose widget and to the upload tasks they
//! spawn. It holds the configuration, the preset store shared by all widgets,
//! the upload sink, and the channel on which finished uploads report back to
//! the console loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{RwLock, mpsc};

use crate::config::EditorConfig;
use crate::services::persistence::PersistOutcome;
use crate::services::preset::PresetStore;
use crate::services::upload::ArtifactSink;

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is cheap: every field is Arc-wrapped or a
/// channel handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EditorConfig>,
    /// Saved scenes of every node, keyed by node and image name.
    pub presets: Arc<RwLock<PresetStore>>,
    /// Where rendered pose images are uploaded.
    pub sink: Arc<dyn ArtifactSink>,
    /// Finished uploads, consumed by the widget owner.
    pub outcomes: mpsc::UnboundedSender<PersistOutcome>,
    node_counter: Arc<AtomicUsize>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: EditorConfig,
        presets: PresetStore,
        sink: Arc<dyn ArtifactSink>,
        outcomes: mpsc::UnboundedSender<PersistOutcome>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            presets: Arc::new(RwLock::new(presets)),
            sink,
            outcomes,
            node_counter: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Name for the next pose node: `Pose_1`, `Pose_2`, ...
    #[must_use]
    pub fn next_node_name(&self) -> String {
        let n = self.node_counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("Pose_{n}")
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::services::persistence::PersistError;
    use crate::services::upload::UploadReceipt;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Sink that records requested file names and echoes them back.
    #[derive(Default)]
    pub struct FakeSink {
        pub uploads: Mutex<Vec<(String, usize)>>,
        /// When set, the receipt carries this name instead of the requested one.
        pub rename_to: Option<String>,
    }

    impl FakeSink {
        pub fn file_names(&self) -> Vec<String> {
            self.uploads.lock().unwrap().iter().map(|(name, _)| name.clone()).collect()
        }
    }

    #[async_trait]
    impl ArtifactSink for FakeSink {
        async fn upload(&self, file_name: &str, png: Vec<u8>) -> Result<UploadReceipt, PersistError> {
            self.uploads.lock().unwrap().push((file_name.to_string(), png.len()));
            let name = self.rename_to.clone().unwrap_or_else(|| file_name.to_string());
            Ok(UploadReceipt { name, subfolder: String::new(), kind: "temp".into() })
        }
    }

    /// Sink whose endpoint always rejects the upload.
    pub struct FailingSink;

    #[async_trait]
    impl ArtifactSink for FailingSink {
        async fn upload(&self, _file_name: &str, _png: Vec<u8>) -> Result<UploadReceipt, PersistError> {
            Err(PersistError::Status { code: 500, reason: "Internal Server Error".into() })
        }
    }

    /// A fresh directory under the system temp dir.
    pub fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pose-node-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Log sink shared between a test and the subscriber it installs.
    #[derive(Clone, Default)]
    pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` with a plain-text subscriber and return its result and output.
    pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt().with_ansi(false).with_writer(move || writer.clone()).finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
        (result, logs)
    }

    /// Test `AppState` backed by `sink` and an empty store in a temp dir.
    pub fn test_app_state_with_sink(sink: Arc<dyn ArtifactSink>) -> (AppState, mpsc::UnboundedReceiver<PersistOutcome>) {
        let path = temp_dir().join("poses.json");
        let config = EditorConfig { store_path: path.clone(), ..EditorConfig::default() };
        let (tx, rx) = mpsc::unbounded_channel();
        (AppState::new(config, PresetStore::empty(path), sink, tx), rx)
    }

    /// Test `AppState` with a [`FakeSink`].
    pub fn test_app_state() -> (AppState, mpsc::UnboundedReceiver<PersistOutcome>, Arc<FakeSink>) {
        let sink = Arc::new(FakeSink::default());
        let (state, rx) = test_app_state_with_sink(sink.clone());
        (state, rx, sink)
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
