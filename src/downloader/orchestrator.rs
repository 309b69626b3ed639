// Playlist orchestrator: resolve entries, fan out downloads under one gate

use std::path::PathBuf;
use std::sync::Arc;

use indicatif::MultiProgress;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::models::{DownloadOptions, DownloadOutcome, MediaKind, MetadataRequest, VideoEntry};
use super::task::{DownloadTask, TaskContext};
use super::traits::ExtractionClient;
use super::utils::{normalize_playlist_url, resolve_cookies_file};

/// Settings for one playlist run
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub output_dir: PathBuf,
    pub cookies_file: PathBuf,
    pub format: String,
    pub age_limit: Option<u8>,
    /// Capacity of the concurrency gate
    pub max_concurrent: usize,
    /// Explicit ffmpeg binary handed to yt-dlp
    pub ffmpeg_path: Option<String>,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            cookies_file: PathBuf::from("cookies.txt"),
            format: "best".to_string(),
            age_limit: Some(99),
            max_concurrent: 1,
            ffmpeg_path: None,
        }
    }
}

/// Keep the first `limit` entries when a positive limit is given
pub fn select_entries(mut entries: Vec<VideoEntry>, limit: Option<usize>) -> Vec<VideoEntry> {
    if let Some(limit) = limit.filter(|&n| n > 0) {
        entries.truncate(limit);
    }
    entries
}

pub struct PlaylistDownloader {
    client: Arc<dyn ExtractionClient>,
    settings: DownloadSettings,
    progress: Option<MultiProgress>,
}

impl PlaylistDownloader {
    pub fn new(client: Arc<dyn ExtractionClient>, settings: DownloadSettings) -> Self {
        Self {
            client,
            settings,
            progress: None,
        }
    }

    /// Draw per-video progress bars through `multi`
    pub fn with_progress(mut self, multi: MultiProgress) -> Self {
        self.progress = Some(multi);
        self
    }

    pub fn settings(&self) -> &DownloadSettings {
        &self.settings
    }

    /// Download every video of the playlist (or the first `limit`) and
    /// return the titles that were downloaded. Resolution failures are
    /// logged and yield an empty list.
    pub async fn process_playlist(&self, playlist_url: &str, limit: Option<usize>) -> Vec<String> {
        let playlist_url = normalize_playlist_url(playlist_url);
        info!("Processing playlist: {} (via {})", playlist_url, self.client.name());

        let cookies_path = resolve_cookies_file(&self.settings.cookies_file);

        let request = MetadataRequest::flat_playlist(cookies_path.clone());
        let metadata = match self.client.fetch_metadata(&playlist_url, &request).await {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                error!("Could not fetch playlist info. Check the URL and the playlist's access settings.");
                return Vec::new();
            }
            Err(e) => {
                error!("Could not fetch playlist info for {}: {}", playlist_url, e);
                return Vec::new();
            }
        };

        if metadata.unresolved > 0 {
            warn!("Skipping {} playlist entries that could not be resolved", metadata.unresolved);
        }

        if metadata.entries.is_empty() {
            match metadata.kind {
                MediaKind::Video => {
                    error!("The URL points to a single video, not a playlist: {}", playlist_url)
                }
                MediaKind::Playlist => error!(
                    "The playlist has no available videos. Check the playlist's privacy settings."
                ),
            }
            return Vec::new();
        }

        let found = metadata.entries.len();
        let entries = select_entries(metadata.entries, limit);
        if entries.len() < found {
            info!("Found {} videos in playlist, downloading {}", found, entries.len());
        } else {
            info!("Found {} videos in playlist", found);
        }

        let options = DownloadOptions::new(&self.settings.output_dir)
            .with_format(self.settings.format.clone())
            .with_age_limit(self.settings.age_limit)
            .with_cookies_path(cookies_path.clone())
            .with_ffmpeg_location(self.settings.ffmpeg_path.clone());
        let ctx = Arc::new(TaskContext {
            cookies_path,
            options,
            progress: self.progress.clone(),
        });

        let tasks = self.build_tasks(&entries);
        let attempted = tasks.len();
        let titles = self.run_tasks(tasks, ctx).await;

        info!("Downloaded {} of {} videos", titles.len(), attempted);
        titles
    }

    /// One task per entry, all sharing a fresh gate
    pub fn build_tasks(&self, entries: &[VideoEntry]) -> Vec<DownloadTask> {
        let gate = Arc::new(Semaphore::new(self.settings.max_concurrent.max(1)));
        entries
            .iter()
            .map(|entry| DownloadTask::new(entry.video_url(), gate.clone()))
            .collect()
    }

    async fn run_tasks(&self, tasks: Vec<DownloadTask>, ctx: Arc<TaskContext>) -> Vec<String> {
        let mut set = JoinSet::new();
        for task in tasks {
            let client = self.client.clone();
            let ctx = ctx.clone();
            set.spawn(async move { task.run(client.as_ref(), &ctx).await });
        }

        let mut titles = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(DownloadOutcome::Downloaded { title }) => titles.push(title),
                Ok(DownloadOutcome::Failed { url, reason }) => {
                    warn!("Skipped {}: {}", url, reason);
                }
                Err(e) => error!("Download task aborted: {}", e),
            }
        }
        titles
    }
}
