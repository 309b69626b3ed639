// Common data models for the downloader

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::errors::DownloadError;

/// Placeholder title for videos whose metadata carries none
pub const UNKNOWN_TITLE: &str = "Unknown video";

/// Kind of object a URL resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MediaKind {
    #[default]
    Video,
    Playlist,
}

/// One playlist member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub id: String,
    pub title: Option<String>,
}

impl VideoEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Watch URL for this entry
    pub fn video_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// Metadata returned by the extraction client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub id: Option<String>,
    pub title: Option<String>,
    pub kind: MediaKind,
    /// Resolved playlist entries, in playlist order
    pub entries: Vec<VideoEntry>,
    /// Entries the extractor could not resolve (skipped)
    pub unresolved: usize,
}

impl Metadata {
    pub fn video(id: impl Into<String>, title: Option<String>) -> Self {
        Self {
            id: Some(id.into()),
            title,
            kind: MediaKind::Video,
            ..Default::default()
        }
    }

    pub fn playlist(entries: Vec<VideoEntry>) -> Self {
        Self {
            kind: MediaKind::Playlist,
            entries,
            ..Default::default()
        }
    }

    /// Human title, falling back to a placeholder
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNKNOWN_TITLE)
    }
}

/// Network settings shared by every yt-dlp invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Socket timeout in seconds
    pub timeout: Option<u32>,
    pub retries: u32,
    pub user_agent: String,
    pub referer: String,
    /// Skip TLS certificate validation. Off unless explicitly requested.
    pub insecure: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: Some(30),
            retries: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36".to_string(),
            referer: "https://www.youtube.com/".to_string(),
            insecure: false,
        }
    }
}

/// Options for a metadata request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRequest {
    /// List playlist entries without extracting each video
    pub flat: bool,
    pub cookies_path: Option<PathBuf>,
}

impl MetadataRequest {
    pub fn flat_playlist(cookies_path: Option<PathBuf>) -> Self {
        Self {
            flat: true,
            cookies_path,
        }
    }

    pub fn single_video(cookies_path: Option<PathBuf>) -> Self {
        Self {
            flat: false,
            cookies_path,
        }
    }
}

/// Download options for a single video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    /// yt-dlp format selector
    pub format: String,
    /// yt-dlp output template, e.g. `downloads/%(title)s.%(ext)s`
    pub output_template: String,
    pub cookies_path: Option<PathBuf>,
    /// Age limit passed to the extractor (99 lets everything through)
    pub age_limit: Option<u8>,
    /// ffmpeg binary for merging; `None` lets yt-dlp search PATH
    pub ffmpeg_location: Option<String>,
}

impl DownloadOptions {
    pub fn new(output_dir: &std::path::Path) -> Self {
        Self {
            format: "best".to_string(),
            output_template: output_dir
                .join("%(title)s.%(ext)s")
                .to_string_lossy()
                .into_owned(),
            cookies_path: None,
            age_limit: Some(99),
            ffmpeg_location: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_cookies_path(mut self, path: Option<PathBuf>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_age_limit(mut self, age_limit: Option<u8>) -> Self {
        self.age_limit = age_limit;
        self
    }

    pub fn with_ffmpeg_location(mut self, path: Option<String>) -> Self {
        self.ffmpeg_location = path;
        self
    }
}

/// Progress callback payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Downloading {
        /// Cumulative bytes downloaded so far
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
        total_bytes_estimate: Option<u64>,
    },
    Finished,
}

/// Result of one per-video download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { title: String },
    Failed { url: String, reason: DownloadError },
}

impl DownloadOutcome {
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Downloaded { title } => Some(title),
            Self::Failed { .. } => None,
        }
    }

    pub fn into_title(self) -> Option<String> {
        match self {
            Self::Downloaded { title } => Some(title),
            Self::Failed { .. } => None,
        }
    }
}
