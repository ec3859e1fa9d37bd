// src/services/acquire.rs

//! Linked document download with size and type guards.
//!
//! A document is fetched in two steps: a metadata probe (HEAD) checks the
//! declared size and content type, then the body is streamed into a staging
//! file next to its destination. The ceiling is enforced again while
//! streaming, since the declared length may be absent or wrong. The staging
//! file is renamed into place only after the whole body is written, so a
//! failed acquisition never leaves a file behind.

use std::path::{Path, PathBuf};

use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::AcquisitionError;
use crate::models::AcquisitionConfig;
use crate::utils::url::{file_name, has_extension};

/// Downloads notice documents into a local directory.
#[derive(Debug, Clone)]
pub struct DocumentAcquirer {
    client: Client,
    config: AcquisitionConfig,
    dest_dir: PathBuf,
}

impl DocumentAcquirer {
    pub fn new(client: Client, config: AcquisitionConfig, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            config,
            dest_dir: dest_dir.into(),
        }
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    /// Directory downloaded documents are written to.
    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Download the document at `raw_url` and return its local path.
    pub async fn acquire(&self, raw_url: &str) -> Result<PathBuf, AcquisitionError> {
        let url = self.validate_url(raw_url)?;
        self.probe(&url).await?;
        self.download(&url).await
    }

    /// Require a scheme, a host, and the configured document extension.
    pub fn validate_url(&self, raw_url: &str) -> Result<Url, AcquisitionError> {
        let invalid = || AcquisitionError::InvalidUrl(raw_url.to_string());

        let url = Url::parse(raw_url.trim()).map_err(|_| invalid())?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid());
        }
        if !has_extension(&url, &self.config.document_extension) {
            return Err(invalid());
        }
        Ok(url)
    }

    /// Check probe headers against the ceiling and expected type.
    ///
    /// A missing `Content-Length` counts as zero; the stream check still
    /// applies during download.
    pub fn check_probe(&self, url: &str, headers: &HeaderMap) -> Result<(), AcquisitionError> {
        let size = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        if size > self.config.max_document_bytes {
            return Err(AcquisitionError::SizeLimitExceeded {
                url: url.to_string(),
                size,
                limit: self.config.max_document_bytes,
            });
        }

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let expected = self.config.content_type.to_ascii_lowercase();
        if !content_type.to_ascii_lowercase().contains(&expected) {
            return Err(AcquisitionError::TypeMismatch {
                url: url.to_string(),
                content_type: content_type.to_string(),
            });
        }
        Ok(())
    }

    async fn probe(&self, url: &Url) -> Result<(), AcquisitionError> {
        let response = self
            .client
            .head(url.as_str())
            .timeout(self.config.probe_timeout())
            .send()
            .await
            .map_err(|e| AcquisitionError::transport(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::transport(
                url.as_str(),
                format!("probe returned {status}"),
            ));
        }
        self.check_probe(url.as_str(), response.headers())
    }

    async fn download(&self, url: &Url) -> Result<PathBuf, AcquisitionError> {
        let transport = |e: &dyn std::fmt::Display| AcquisitionError::transport(url.as_str(), e);

        let mut response = self
            .client
            .get(url.as_str())
            .timeout(self.config.download_timeout())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| transport(&e))?;

        tokio::fs::create_dir_all(&self.dest_dir)
            .await
            .map_err(|e| transport(&e))?;

        // Removed on drop unless persisted.
        let staging = tempfile::Builder::new()
            .prefix(".partial-")
            .tempfile_in(&self.dest_dir)
            .map_err(|e| transport(&e))?;
        let mut file = tokio::fs::File::from_std(staging.reopen().map_err(|e| transport(&e))?);

        let limit = self.config.max_document_bytes;
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await.map_err(|e| transport(&e))? {
            written += chunk.len() as u64;
            if written > limit {
                return Err(AcquisitionError::SizeLimitExceeded {
                    url: url.to_string(),
                    size: written,
                    limit,
                });
            }
            file.write_all(&chunk).await.map_err(|e| transport(&e))?;
        }
        file.flush().await.map_err(|e| transport(&e))?;
        drop(file);

        let dest = self.destination(url);
        staging.persist(&dest).map_err(|e| transport(&e.error))?;

        log::info!("Downloaded {} ({} bytes) to {}", url, written, dest.display());
        Ok(dest)
    }

    /// Last path segment, or `pdf_<unix-seconds>.pdf` when the URL has none.
    ///
    /// URLs that passed `validate_url` always end in a named segment.
    fn destination(&self, url: &Url) -> PathBuf {
        let name = file_name(url).unwrap_or_else(|| {
            format!(
                "pdf_{}{}",
                chrono::Utc::now().timestamp(),
                self.config.document_extension
            )
        });
        self.dest_dir.join(name)
    }
}
