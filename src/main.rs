mod config;
mod console;
mod services;
mod state;
mod widget;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::EditorConfig;
use crate::services::preset::PresetStore;
use crate::services::upload::HttpUploader;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match EditorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(2);
        }
    };

    let presets = match PresetStore::load(&config.store_path).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, path = %config.store_path.display(), "preset store load failed");
            std::process::exit(1);
        }
    };

    let uploader = match HttpUploader::new(config.upload_url.clone(), config.upload_timeout_secs) {
        Ok(uploader) => uploader,
        Err(e) => {
            tracing::error!(error = %e, "upload client init failed");
            std::process::exit(1);
        }
    };

    tracing::info!(url = %config.upload_url, store = %config.store_path.display(), nodes = presets.node_count(), "pose editor starting");
    let (tx, rx) = mpsc::unbounded_channel();
    let state = state::AppState::new(config, presets, Arc::new(uploader), tx);

    if let Err(e) = console::run(state, rx).await {
        tracing::error!(error = %e, "console failed");
        std::process::exit(1);
    }
}
