//! Authenticated file transfer against the coordinator API
//!
//! The [`Transfer`] trait is the seam the worker loop talks to. The production
//! implementation, [`HttpTransfer`], wraps one pooled `reqwest::Client`, adds
//! the session header to every request, and retries transport failures via
//! [`crate::retry::with_retry`].

use crate::config::{CoordinatorConfig, RetryConfig, SessionToken};
use crate::error::{Error, Result};
use crate::retry::with_retry;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// File name used in the multipart upload when the source has none
const FALLBACK_UPLOAD_NAME: &str = "results.txt";

/// File download/upload against the coordinator
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Download `url` into `dest`, truncating any previous content
    ///
    /// Returns the number of bytes written. A non-success status leaves `dest`
    /// untouched and is reported as [`Error::BadStatus`].
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;

    /// Upload `source` to `url` as a single multipart file field
    ///
    /// The source file is only read. A non-success status is reported as
    /// [`Error::BadStatus`].
    async fn submit(&self, url: &str, source: &Path) -> Result<()>;
}

/// [`Transfer`] over HTTP(S) with connection reuse and bounded retry
pub struct HttpTransfer {
    client: reqwest::Client,
    session_header: HeaderName,
    session_value: HeaderValue,
    upload_field: String,
    retry: RetryConfig,
}

impl std::fmt::Debug for HttpTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransfer")
            .field("session_header", &self.session_header)
            .field("upload_field", &self.upload_field)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl HttpTransfer {
    /// Build a transfer client
    ///
    /// Fails with [`Error::MissingSessionToken`] when `session` is empty; no
    /// request is ever attempted without a token.
    pub fn new(
        coordinator: &CoordinatorConfig,
        retry: &RetryConfig,
        session: &SessionToken,
    ) -> Result<Self> {
        session.require()?;

        let session_header = HeaderName::from_bytes(coordinator.session_header.as_bytes())
            .map_err(|e| Error::config("coordinator.session_header", e.to_string()))?;
        let mut session_value = HeaderValue::from_str(session.expose())
            .map_err(|_| Error::config("session", "token contains invalid header characters"))?;
        session_value.set_sensitive(true);

        let client = reqwest::Client::builder()
            .timeout(coordinator.request_timeout)
            .build()?;

        Ok(Self {
            client,
            session_header,
            session_value,
            upload_field: coordinator.upload_field.clone(),
            retry: retry.clone(),
        })
    }

    async fn fetch_once(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .header(self.session_header.clone(), self.session_value.clone())
            .send()
            .await?;

        check_status(url, &response)?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| Error::io_at(dest, e))?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::io_at(dest, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| Error::io_at(dest, e))?;

        Ok(written)
    }

    async fn submit_once(&self, url: &str, body: &[u8], file_name: &str) -> Result<()> {
        let part = Part::bytes(body.to_vec())
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = Form::new().part(self.upload_field.clone(), part);

        let response = self
            .client
            .post(url)
            .header(self.session_header.clone(), self.session_value.clone())
            .multipart(form)
            .send()
            .await?;

        check_status(url, &response)
    }
}

fn check_status(url: &str, response: &reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(Error::BadStatus {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl Transfer for HttpTransfer {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        let bytes = with_retry(&self.retry, || self.fetch_once(url, dest)).await?;
        tracing::debug!(url, dest = %dest.display(), bytes, "Fetched file");
        Ok(bytes)
    }

    async fn submit(&self, url: &str, source: &Path) -> Result<()> {
        let body = tokio::fs::read(source)
            .await
            .map_err(|e| Error::io_at(source, e))?;
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(FALLBACK_UPLOAD_NAME);

        with_retry(&self.retry, || self.submit_once(url, &body, file_name)).await?;
        tracing::debug!(url, source = %source.display(), bytes = body.len(), "Submitted file");
        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
