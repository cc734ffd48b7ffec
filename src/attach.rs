//! Attachment helper: hash-then-check-then-upload.
//!
//! Before any bytes leave the machine, the file's BLAKE3 digest is posted to
//! `/fs/check-file`; when the content already exists server-side the upload
//! is skipped. Otherwise the file goes up as one multipart body — no
//! chunking, no resume.

use crate::error::ChatError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Serialize)]
struct CheckFileRequest<'a> {
    hash: &'a str,
}

#[derive(Deserialize)]
struct CheckFileResponse {
    #[serde(default)]
    exists: bool,
}

/// What [`AttachmentClient::submit`] did with the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The server already has this content; nothing was uploaded.
    AlreadyPresent { hash: String },
    Uploaded { hash: String },
}

/// HTTP client for the `/fs/…` endpoints.
pub struct AttachmentClient {
    http: reqwest::Client,
    base_url: String,
}

impl AttachmentClient {
    /// `base_url` is the forum root, e.g. `https://forum.example`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// BLAKE3 hex digest of the whole file. Attachments are bounded by the
    /// forum's upload cap, so a single read is fine.
    pub async fn hash_file(path: &Path) -> Result<String, ChatError> {
        let bytes = tokio::fs::read(path).await?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }

    /// Ask the server whether content with this hash already exists.
    pub async fn check_exists(&self, hash: &str) -> Result<bool, ChatError> {
        let url = format!("{}/fs/check-file", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&CheckFileRequest { hash })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ChatError::Status {
                status: resp.status().as_u16(),
                url,
            });
        }
        let body: CheckFileResponse = resp.json().await?;
        Ok(body.exists)
    }

    /// Upload the file as a multipart body under the `file` field.
    pub async fn upload(&self, path: &Path) -> Result<(), ChatError> {
        let url = format!("{}/fs/upload-file", self.base_url);
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self.http.post(&url).multipart(form).send().await?;
        if !resp.status().is_success() {
            return Err(ChatError::Status {
                status: resp.status().as_u16(),
                url,
            });
        }
        Ok(())
    }

    /// The full flow: hash, check, upload unless the content is a duplicate.
    pub async fn submit(&self, path: &Path) -> Result<UploadOutcome, ChatError> {
        let hash = Self::hash_file(path).await?;
        debug!(%hash, path = %path.display(), "hashed attachment");

        if self.check_exists(&hash).await? {
            info!(%hash, "content already on server, skipping upload");
            return Ok(UploadOutcome::AlreadyPresent { hash });
        }

        self.upload(path).await?;
        info!(%hash, "attachment uploaded");
        Ok(UploadOutcome::Uploaded { hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_hash_file_known_digest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"foo").unwrap();
        let hash = AttachmentClient::hash_file(file.path()).await.unwrap();
        assert_eq!(
            hash,
            "04e0bb39f30b1a3feb89f536c93be15055482df748674b00d26e5a75777702e9"
        );
    }

    #[tokio::test]
    async fn test_hash_file_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let hash = AttachmentClient::hash_file(file.path()).await.unwrap();
        assert_eq!(
            hash,
            "af1349b9f5f9a1a6a0404dee36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[tokio::test]
    async fn test_hash_file_is_deterministic() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"some attachment bytes").unwrap();
        let a = AttachmentClient::hash_file(file.path()).await.unwrap();
        let b = AttachmentClient::hash_file(file.path()).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn test_hash_file_missing_path_errors() {
        let result = AttachmentClient::hash_file(Path::new("/no/such/file.bin")).await;
        assert!(matches!(result, Err(ChatError::Io(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = AttachmentClient::new("https://forum.example/");
        assert_eq!(client.base_url, "https://forum.example");
    }
}
