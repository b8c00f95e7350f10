//! Artifact download to local storage.
//!
//! Each download streams into its own temporary file next to the
//! destination and is renamed over the destination only once it
//! completed. The rename is the only step concurrent downloads share, so
//! a failed or concurrent run never leaves a truncated or mixed file at
//! the well-known path.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// Errors from the artifact download stage.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request failed or the body stream broke off.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The artifact host answered with a non-2xx status.
    #[error("artifact host returned HTTP {0}")]
    HttpStatus(u16),

    /// Fewer (or more) bytes arrived than `Content-Length` announced.
    #[error("incomplete download: expected {expected} bytes, received {received}")]
    Incomplete { expected: u64, received: u64 },

    /// Writing the artifact locally failed.
    #[error("local write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Materialises a finished artifact at a local path.
#[async_trait]
pub trait ArtifactFetch: Send + Sync {
    /// Download `url` into `destination`.
    ///
    /// Returns the bytes this call downloaded. Callers use them rather
    /// than reading `destination` back, which a concurrent download may
    /// already have replaced.
    async fn fetch(&self, url: &str, destination: &Path) -> Result<Vec<u8>, FetchError>;
}

/// HTTP implementation of [`ArtifactFetch`].
#[derive(Debug, Clone, Default)]
pub struct ArtifactFetcher {
    client: reqwest::Client,
}

impl ArtifactFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Stream the body into `file`, keeping a copy of the payload.
    async fn stream_to(
        &self,
        response: reqwest::Response,
        file: std::fs::File,
    ) -> Result<Vec<u8>, FetchError> {
        let expected = response.content_length();
        let mut file = tokio::fs::File::from_std(file);
        let mut stream = response.bytes_stream();
        let mut payload = Vec::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(FetchError::Network)?;
            file.write_all(&chunk).await?;
            payload.extend_from_slice(&chunk);
        }

        file.flush().await?;
        file.sync_all().await?;

        let received = payload.len() as u64;
        if let Some(expected) = expected {
            if expected != received {
                return Err(FetchError::Incomplete { expected, received });
            }
        }
        Ok(payload)
    }
}

#[async_trait]
impl ArtifactFetch for ArtifactFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        tokio::fs::create_dir_all(parent).await?;

        // Dropping `partial` on an error removes the unfinished file.
        let (file, partial) = NamedTempFile::new_in(parent)?.into_parts();
        let payload = self.stream_to(response, file).await?;
        partial
            .persist(destination)
            .map_err(|e| FetchError::Io(e.error))?;

        tracing::debug!(
            url,
            destination = %destination.display(),
            bytes = payload.len(),
            "Artifact downloaded",
        );
        Ok(payload)
    }
}
