// Extraction client trait definition

use async_trait::async_trait;

use super::errors::DownloadError;
use super::models::{DownloadOptions, Metadata, MetadataRequest, ProgressEvent};

/// Receives progress callbacks for a single download
pub trait ProgressSink: Send {
    fn on_progress(&mut self, event: ProgressEvent);
}

/// Trait for extraction client implementations
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Name of the client (for logging)
    fn name(&self) -> &'static str;

    /// Resolve a URL to metadata without downloading anything.
    /// `Ok(None)` means the extractor produced no usable metadata.
    async fn fetch_metadata(
        &self,
        url: &str,
        request: &MetadataRequest,
    ) -> Result<Option<Metadata>, DownloadError>;

    /// Download one video, reporting progress to `progress`
    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        progress: &mut dyn ProgressSink,
    ) -> Result<(), DownloadError>;
}
