//! Interactive collection of the playlist URL and video limit.

use inquire::Text;
use tracing::warn;

use crate::error::{AppError, Result};

/// What the user asked to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRequest {
    pub url: String,
    /// `None` downloads the whole playlist
    pub limit: Option<usize>,
}

/// Parsed video-count input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitInput {
    /// Blank input
    All,
    First(usize),
    NotPositive,
    NotANumber,
}

impl LimitInput {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::All;
        }
        match trimmed.parse::<i64>() {
            Ok(n) if n > 0 => Self::First(n as usize),
            Ok(_) => Self::NotPositive,
            Err(_) => Self::NotANumber,
        }
    }

    /// Effective limit; anything but a positive number means "no limit"
    pub fn limit(&self) -> Option<usize> {
        match self {
            Self::First(n) => Some(*n),
            _ => None,
        }
    }

    pub fn warning(&self) -> Option<&'static str> {
        match self {
            Self::NotPositive => {
                Some("The number of videos must be positive. The whole playlist will be downloaded.")
            }
            Self::NotANumber => Some("Invalid number entered. The whole playlist will be downloaded."),
            _ => None,
        }
    }
}

/// Validate a playlist URL
pub fn parse_url(raw: &str) -> Result<String> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(AppError::EmptyUrl);
    }
    Ok(url.to_string())
}

/// Build the request from flags, prompting for whatever is missing
pub fn collect_request(url: Option<String>, limit: Option<String>) -> Result<PlaylistRequest> {
    let url = match url {
        Some(url) => url,
        None => Text::new("Playlist URL:").prompt()?,
    };
    let url = parse_url(&url)?;

    let limit = match limit {
        Some(limit) => limit,
        None => Text::new("How many videos to download?")
            .with_help_message("Press Enter to download the whole playlist")
            .prompt()?,
    };
    let limit = LimitInput::parse(&limit);
    if let Some(message) = limit.warning() {
        warn!("Ignoring video limit: {}", message);
        println!("{}", message);
    }

    Ok(PlaylistRequest {
        url,
        limit: limit.limit(),
    })
}
