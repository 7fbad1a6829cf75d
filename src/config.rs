//! Editor configuration parsed from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_UPLOAD_URL: &str = "http://127.0.0.1:8188/upload/image";
pub const DEFAULT_STORE_PATH: &str = "comfyui_poses.json";
pub const DEFAULT_CANVAS_SIZE: u32 = 512;
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 30;

/// A configuration variable is present but unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Endpoint that receives the rendered pose image.
    pub upload_url: String,
    /// JSON file holding every node's presets.
    pub store_path: PathBuf,
    /// Fixed node name; `Pose_<n>` is generated when absent.
    pub node_name: Option<String>,
    /// Backing size of the square canvas and of the uploaded image.
    pub canvas_size: u32,
    /// Initial eye visibility.
    pub visible_eyes: bool,
    pub upload_timeout_secs: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            node_name: None,
            canvas_size: DEFAULT_CANVAS_SIZE,
            visible_eyes: true,
            upload_timeout_secs: DEFAULT_UPLOAD_TIMEOUT_SECS,
        }
    }
}

impl EditorConfig {
    /// Build typed editor config from environment variables.
    ///
    /// Optional:
    /// - `POSE_UPLOAD_URL`: default `http://127.0.0.1:8188/upload/image`
    /// - `POSE_STORE_PATH`: default `comfyui_poses.json`
    /// - `POSE_NODE_NAME`: generated `Pose_<n>` when absent
    /// - `POSE_CANVAS_SIZE`: default 512
    /// - `POSE_VISIBLE_EYES`: `true` (default) or `false`
    /// - `POSE_UPLOAD_TIMEOUT_SECS`: default 30
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is set but does not
    /// parse, or the canvas size is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let upload_url = std::env::var("POSE_UPLOAD_URL").unwrap_or_else(|_| DEFAULT_UPLOAD_URL.to_string());
        let store_path = std::env::var("POSE_STORE_PATH").map_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH), PathBuf::from);
        let node_name = std::env::var("POSE_NODE_NAME").ok().filter(|name| !name.trim().is_empty());

        let canvas_size = env_parse("POSE_CANVAS_SIZE", DEFAULT_CANVAS_SIZE)?;
        if canvas_size == 0 {
            return Err(ConfigError::Invalid { var: "POSE_CANVAS_SIZE", value: "0".into() });
        }
        let visible_eyes = match std::env::var("POSE_VISIBLE_EYES") {
            Ok(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { var: "POSE_VISIBLE_EYES", value: raw })?,
            Err(_) => true,
        };
        let upload_timeout_secs = env_parse("POSE_UPLOAD_TIMEOUT_SECS", DEFAULT_UPLOAD_TIMEOUT_SECS)?;

        Ok(Self { upload_url, store_path, node_name, canvas_size, visible_eyes, upload_timeout_secs })
    }
}

/// Parse `key` as `T`, falling back to `default` only when the variable is unset.
pub(crate) fn env_parse<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid { var: key, value: raw }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
