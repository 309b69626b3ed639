// Instrumented in-memory extraction client for tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::errors::DownloadError;
use super::models::{DownloadOptions, Metadata, MetadataRequest, ProgressEvent, VideoEntry};
use super::traits::{ExtractionClient, ProgressSink};

enum PlaylistBehavior {
    Entries(Vec<VideoEntry>),
    Nothing,
    Broken,
}

pub struct FakeClient {
    playlist: PlaylistBehavior,
    failing_metadata: HashSet<String>,
    failing_download: HashSet<String>,
    untitled: HashSet<String>,
    download_delay: Duration,
    playlist_calls: AtomicUsize,
    metadata_calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
    downloaded: Mutex<Vec<String>>,
    options_seen: Mutex<Vec<DownloadOptions>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeClient {
    fn new(playlist: PlaylistBehavior) -> Self {
        Self {
            playlist,
            failing_metadata: HashSet::new(),
            failing_download: HashSet::new(),
            untitled: HashSet::new(),
            download_delay: Duration::ZERO,
            playlist_calls: AtomicUsize::new(0),
            metadata_calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
            downloaded: Mutex::new(Vec::new()),
            options_seen: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_videos(ids: &[&str]) -> Self {
        Self::new(PlaylistBehavior::Entries(
            ids.iter().map(|id| VideoEntry::new(*id)).collect(),
        ))
    }

    /// Playlist request succeeds but returns nothing
    pub fn without_metadata() -> Self {
        Self::new(PlaylistBehavior::Nothing)
    }

    /// Playlist request fails outright
    pub fn broken() -> Self {
        Self::new(PlaylistBehavior::Broken)
    }

    pub fn failing_metadata(mut self, ids: &[&str]) -> Self {
        self.failing_metadata.extend(ids.iter().map(|id| id.to_string()));
        self
    }

    pub fn failing_download(mut self, ids: &[&str]) -> Self {
        self.failing_download.extend(ids.iter().map(|id| id.to_string()));
        self
    }

    pub fn untitled(mut self, ids: &[&str]) -> Self {
        self.untitled.extend(ids.iter().map(|id| id.to_string()));
        self
    }

    pub fn with_download_delay(mut self, delay: Duration) -> Self {
        self.download_delay = delay;
        self
    }

    pub fn playlist_calls(&self) -> usize {
        self.playlist_calls.load(Ordering::SeqCst)
    }

    /// Number of single-video metadata requests, one per task that got a permit
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    /// Video URLs whose metadata was requested, in request order
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    /// Video URLs whose download completed
    pub fn downloaded(&self) -> Vec<String> {
        self.downloaded.lock().unwrap().clone()
    }

    /// Options passed to each download call
    pub fn options_seen(&self) -> Vec<DownloadOptions> {
        self.options_seen.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn video_id(url: &str) -> String {
        url.rsplit("v=").next().unwrap_or(url).to_string()
    }
}

#[async_trait]
impl ExtractionClient for FakeClient {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_metadata(
        &self,
        url: &str,
        request: &MetadataRequest,
    ) -> Result<Option<Metadata>, DownloadError> {
        if request.flat {
            self.playlist_calls.fetch_add(1, Ordering::SeqCst);
            return match &self.playlist {
                PlaylistBehavior::Entries(entries) => Ok(Some(Metadata::playlist(entries.clone()))),
                PlaylistBehavior::Nothing => Ok(None),
                PlaylistBehavior::Broken => {
                    Err(DownloadError::InvalidUrl(format!("Unsupported URL: {}", url)))
                }
            };
        }

        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.to_string());

        let id = Self::video_id(url);
        if self.failing_metadata.contains(&id) {
            return Err(DownloadError::Unavailable(format!("{}: Private video", id)));
        }
        let title = if self.untitled.contains(&id) {
            None
        } else {
            Some(format!("Video {}", id))
        };
        Ok(Some(Metadata::video(id, title)))
    }

    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        progress: &mut dyn ProgressSink,
    ) -> Result<(), DownloadError> {
        self.options_seen.lock().unwrap().push(options.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        progress.on_progress(ProgressEvent::Downloading {
            downloaded_bytes: 50,
            total_bytes: Some(100),
            total_bytes_estimate: None,
        });
        if !self.download_delay.is_zero() {
            tokio::time::sleep(self.download_delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        let id = Self::video_id(url);
        let result = if self.failing_download.contains(&id) {
            Err(DownloadError::NetworkTimeout)
        } else {
            progress.on_progress(ProgressEvent::Downloading {
                downloaded_bytes: 100,
                total_bytes: Some(100),
                total_bytes_estimate: None,
            });
            progress.on_progress(ProgressEvent::Finished);
            self.downloaded.lock().unwrap().push(url.to_string());
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
