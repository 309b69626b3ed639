// Per-video download task

use std::path::PathBuf;
use std::sync::Arc;

use indicatif::MultiProgress;
use tokio::sync::Semaphore;
use tracing::{error, info};

use super::errors::DownloadError;
use super::models::{DownloadOptions, DownloadOutcome, MetadataRequest};
use super::progress::ProgressReporter;
use super::traits::ExtractionClient;

/// Settings shared by every task of one playlist run
#[derive(Clone)]
pub struct TaskContext {
    pub cookies_path: Option<PathBuf>,
    pub options: DownloadOptions,
    /// Where progress bars are drawn; `None` keeps them hidden
    pub progress: Option<MultiProgress>,
}

/// One video URL waiting for a slot in the concurrency gate
pub struct DownloadTask {
    url: String,
    gate: Arc<Semaphore>,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>, gate: Arc<Semaphore>) -> Self {
        Self {
            url: url.into(),
            gate,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch metadata and download the video. Failures are logged and
    /// returned as [`DownloadOutcome::Failed`]; this never errors.
    pub async fn run(self, client: &dyn ExtractionClient, ctx: &TaskContext) -> DownloadOutcome {
        // Held until the end of this function, on every path
        let _permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return self.fail(DownloadError::ExecutionError(
                    "concurrency gate closed".to_string(),
                ))
            }
        };

        let request = MetadataRequest::single_video(ctx.cookies_path.clone());
        let metadata = match client.fetch_metadata(&self.url, &request).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                error!("Could not fetch video info: {}", self.url);
                return self.fail(DownloadError::Unavailable("no metadata returned".to_string()));
            }
            Err(e) => {
                error!("Could not fetch video info for {}: {}", self.url, e);
                return self.fail(e);
            }
        };

        let title = metadata.display_title().to_string();
        info!("Fetched video info: {}", title);

        let mut reporter = match &ctx.progress {
            Some(multi) => ProgressReporter::new(title.clone(), multi.clone()),
            None => ProgressReporter::hidden(title.clone()),
        };

        info!("Starting download: {}", title);
        match client.download(&self.url, &ctx.options, &mut reporter).await {
            Ok(()) => {
                info!("Downloaded: {}", title);
                DownloadOutcome::Downloaded { title }
            }
            Err(e) => {
                error!("Failed to download {} ({}): {}", title, self.url, e);
                self.fail(e)
            }
        }
    }

    fn fail(&self, reason: DownloadError) -> DownloadOutcome {
        DownloadOutcome::Failed {
            url: self.url.clone(),
            reason,
        }
    }
}
