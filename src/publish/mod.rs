// src/publish/mod.rs

//! Publish mode: push each resolved file to a downstream HTTP endpoint.
//!
//! Delivery is at-least-once: a multipart POST retried with exponential
//! backoff, then dropped after exhaustion (no dead-letter persistence). Only
//! the newest file at trigger-resolution time is ever uploaded; a later
//! trigger supersedes older intent.

use std::future::Future;
use std::pin::Pin;

use reqwest::multipart::{Form, Part};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::PublishConfig;
use crate::engine::{LatestSink, ResolvedFile};
use crate::errors::{LastframeError, Result};

/// Multipart uploader with retry/backoff.
#[derive(Debug, Clone)]
pub struct Uploader {
    client: reqwest::Client,
    cfg: PublishConfig,
}

impl Uploader {
    pub fn new(cfg: PublishConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| LastframeError::ConfigError(format!("building HTTP client: {e}")))?;
        Ok(Self { client, cfg })
    }

    /// Upload `file`, retrying up to the configured attempt count with the
    /// backoff doubling between attempts. 2xx is success; everything else
    /// (including transport errors) is retried.
    pub async fn upload_with_retries(&self, file: &ResolvedFile) -> Result<()> {
        let mut delay = self.cfg.backoff;
        let mut last_error = String::new();

        for attempt in 1..=self.cfg.attempts {
            match self.post_once(file).await {
                Ok(status) if status.is_success() => {
                    info!(
                        path = %file.path.display(),
                        endpoint = %self.cfg.endpoint,
                        %status,
                        "uploaded"
                    );
                    return Ok(());
                }
                Ok(status) => {
                    last_error = format!("HTTP {status}");
                    warn!(
                        attempt,
                        attempts = self.cfg.attempts,
                        %status,
                        "upload failed"
                    );
                }
                Err(err) => {
                    last_error = err.to_string();
                    warn!(
                        attempt,
                        attempts = self.cfg.attempts,
                        %err,
                        "upload error"
                    );
                }
            }

            if attempt < self.cfg.attempts {
                sleep(delay).await;
                delay *= 2;
            }
        }

        Err(LastframeError::UploadExhausted {
            attempts: self.cfg.attempts,
            last_error,
        })
    }

    async fn post_once(&self, file: &ResolvedFile) -> anyhow::Result<reqwest::StatusCode> {
        let bytes = tokio::fs::read(&file.path).await?;
        let name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let mut form = Form::new().part(
            self.cfg.field_name.clone(),
            Part::bytes(bytes).file_name(name),
        );
        for (k, v) in &self.cfg.extra {
            form = form.text(k.clone(), v.clone());
        }

        let mut request = self.client.post(&self.cfg.endpoint).multipart(form);
        if let Some(token) = &self.cfg.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        Ok(response.status())
    }
}

/// `LatestSink` that uploads each resolved file.
#[derive(Debug)]
pub struct UploadSink {
    uploader: Uploader,
}

impl UploadSink {
    pub fn new(uploader: Uploader) -> Self {
        Self { uploader }
    }
}

impl LatestSink for UploadSink {
    fn deliver(
        &mut self,
        resolved: ResolvedFile,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { self.uploader.upload_with_retries(&resolved).await })
    }
}
