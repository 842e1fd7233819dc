//! Image uploads to the media host (Cloudinary)

use crate::config::MediaConfig;
use crate::models::Clock;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const UPLOAD_FORMAT: &str = "jpeg";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Invalid file type. Only images are allowed!")]
    InvalidType,

    #[error("File too large. Max size allowed is 10MB!")]
    TooLarge { limit: usize },

    #[error("Media host request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Media host rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// An image received from a client, fully buffered
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Reject non-image content types and oversize payloads
    pub fn check(&self, max_bytes: usize) -> Result<(), MediaError> {
        check_content_type(&self.content_type)?;
        if self.bytes.len() > max_bytes {
            return Err(MediaError::TooLarge { limit: max_bytes });
        }
        Ok(())
    }
}

pub fn check_content_type(content_type: &str) -> Result<(), MediaError> {
    match content_type.parse::<mime::Mime>() {
        Ok(m) if m.type_() == mime::IMAGE => Ok(()),
        _ => Err(MediaError::InvalidType),
    }
}

/// Stores images and hands back a public URL
#[async_trait]
pub trait MediaUploader: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<String, MediaError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

pub struct CloudinaryUploader {
    client: Client,
    config: MediaConfig,
    clock: Arc<dyn Clock>,
}

impl CloudinaryUploader {
    pub fn new(config: MediaConfig, clock: Arc<dyn Clock>) -> Result<Self, MediaError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            config,
            clock,
        })
    }

    fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.config.cloud_name
        )
    }
}

#[async_trait]
impl MediaUploader for CloudinaryUploader {
    async fn upload(&self, image: ImageUpload) -> Result<String, MediaError> {
        image.check(self.config.max_upload_bytes)?;

        let now = self.clock.now();
        let mut params = BTreeMap::new();
        params.insert("folder", self.config.folder.clone());
        params.insert("format", UPLOAD_FORMAT.to_string());
        params.insert("public_id", public_id(now, &image.file_name));
        params.insert("timestamp", now.timestamp().to_string());
        let signature = sign(&params, &self.config.api_secret);

        let file_part = Part::bytes(image.bytes)
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        tracing::debug!(url = %uploaded.secure_url, "image uploaded");
        Ok(uploaded.secure_url)
    }
}

/// `<unix millis>-<file name without extension>`
pub fn public_id(now: DateTime<Utc>, file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    format!("{}-{}", now.timestamp_millis(), stem)
}

/// Cloudinary request signature: SHA-1 over `k=v&...` (sorted) followed by the secret
pub fn sign(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_public_id_strips_extension() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(public_id(now, "cat.png"), "1700000000123-cat");
        assert_eq!(public_id(now, "archive.tar.gz"), "1700000000123-archive.tar");
        assert_eq!(public_id(now, "noext"), "1700000000123-noext");
        assert_eq!(public_id(now, ".hidden"), "1700000000123-.hidden");
    }

    #[test]
    fn test_signature_over_sorted_params() {
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1700000000".to_string());
        params.insert("public_id", "1700000000123-cat".to_string());
        params.insert("format", "jpeg".to_string());
        params.insert("folder", "uploads".to_string());

        assert_eq!(sign(&params, "abcd"), "28672d04b9d0cdf99178fd9469c98332a07be6d0");
    }

    #[test]
    fn test_check_rejects_non_images_and_oversize() {
        let mut upload = ImageUpload {
            file_name: "a.txt".to_string(),
            content_type: "text/plain".to_string(),
            bytes: vec![0; 4],
        };
        assert!(matches!(upload.check(10), Err(MediaError::InvalidType)));

        upload.content_type = "image/png".to_string();
        assert!(upload.check(10).is_ok());
        assert!(matches!(upload.check(3), Err(MediaError::TooLarge { limit: 3 })));
    }
}
