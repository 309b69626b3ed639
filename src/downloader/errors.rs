// Error types for the extraction client and per-video downloads

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DownloadError {
    /// Network timeout while talking to the platform
    #[error("Network timeout: the server is not responding")]
    NetworkTimeout,

    /// The platform refused the request (429, bot detection, etc.)
    #[error("Request blocked by the platform (rate limiting or bot detection)")]
    Blocked,

    /// Private, deleted or otherwise unavailable video
    #[error("Video unavailable: {0}")]
    Unavailable(String),

    /// yt-dlp or ffmpeg not found on the system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// URL rejected by the extractor
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Command execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Unknown error with details
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Classify raw yt-dlp stderr into an error kind
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::NetworkTimeout;
        }

        if lower.contains("429") || lower.contains("confirm you're not a bot") {
            return Self::Blocked;
        }

        if lower.contains("private video")
            || lower.contains("video unavailable")
            || lower.contains("has been removed")
            || lower.contains("sign in to confirm your age")
        {
            return Self::Unavailable(s);
        }

        if lower.contains("command not found") || lower.contains("no such file") {
            return Self::ToolNotFound(s);
        }

        if lower.contains("unsupported url") || lower.contains("is not a valid url") {
            return Self::InvalidUrl(s);
        }

        if lower.contains("json") {
            return Self::ParseError(s);
        }

        Self::Unknown(s)
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            Self::ToolNotFound(e.to_string())
        } else {
            Self::ExecutionError(e.to_string())
        }
    }
}
