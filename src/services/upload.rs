//! Upload of the rendered pose image to the host's image endpoint.
//!
//! The endpoint takes a multipart form with the PNG under `image` and
//! `type=temp`, and answers with the name it stored the file under. That
//! name, not the requested one, keys the preset store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use super::persistence::PersistError;

/// Response body of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    /// Name the file was stored under.
    pub name: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// Destination for rendered pose images.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Store `png` as `file_name` and return what the sink recorded.
    async fn upload(&self, file_name: &str, png: Vec<u8>) -> Result<UploadReceipt, PersistError>;
}

/// [`ArtifactSink`] that posts to an HTTP upload endpoint.
pub struct HttpUploader {
    http: reqwest::Client,
    url: String,
}

impl HttpUploader {
    /// # Errors
    ///
    /// Returns [`PersistError::Upload`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, PersistError> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(timeout_secs)).build()?;
        Ok(Self { http, url: url.into() })
    }
}

#[async_trait]
impl ArtifactSink for HttpUploader {
    async fn upload(&self, file_name: &str, png: Vec<u8>) -> Result<UploadReceipt, PersistError> {
        let size = png.len();
        let part = Part::bytes(png).file_name(file_name.to_string()).mime_str("image/png")?;
        let form = Form::new().part("image", part).text("type", "temp");

        let response = self.http.post(&self.url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PersistError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let receipt: UploadReceipt = response.json().await?;
        debug!(file_name, size, stored = %receipt.name, "pose image uploaded");
        Ok(receipt)
    }
}
