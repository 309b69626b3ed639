use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use crate::downloader::{DownloadSettings, NetworkConfig};

/// Download every video of a playlist with yt-dlp
#[derive(Debug, Parser)]
#[command(name = "playlist-dl", version, about)]
pub struct Args {
    /// Playlist URL (prompted for when omitted)
    #[arg(short, long)]
    pub url: Option<String>,

    /// Download only the first N videos (prompted for when omitted)
    #[arg(short = 'n', long, allow_hyphen_values = true)]
    pub limit: Option<String>,

    /// Directory the videos are saved to
    #[arg(short, long, default_value = "downloads")]
    pub output_dir: PathBuf,

    /// Netscape cookie file used for private or restricted videos
    #[arg(long, default_value = "cookies.txt")]
    pub cookies: PathBuf,

    /// Log file (appended to)
    #[arg(long, default_value = "download.log")]
    pub log_file: PathBuf,

    /// Number of videos downloaded at the same time
    #[arg(short = 'j', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=16))]
    pub concurrency: u32,

    /// yt-dlp format selector
    #[arg(short, long, default_value = "best")]
    pub format: String,

    /// Socket timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub socket_timeout: u32,

    /// Retries per request
    #[arg(long, default_value_t = 10)]
    pub retries: u32,

    /// Do not verify TLS certificates
    #[arg(long)]
    pub insecure: bool,

    /// Path to the yt-dlp binary
    #[arg(long)]
    pub yt_dlp: Option<String>,

    /// Path to the ffmpeg binary
    #[arg(long)]
    pub ffmpeg: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file: Some(PathBuf::from("download.log")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub output_dir: PathBuf,
    pub cookies_file: PathBuf,
    pub format: String,
    pub age_limit: Option<u8>,
    pub max_concurrent: usize,
    pub network: NetworkConfig,
    pub log: LogConfig,
    pub ytdlp_path: Option<String>,
    pub ffmpeg_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            cookies_file: PathBuf::from("cookies.txt"),
            format: "best".to_string(),
            age_limit: Some(99),
            max_concurrent: 1,
            network: NetworkConfig::default(),
            log: LogConfig::default(),
            ytdlp_path: None,
            ffmpeg_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Self {
        let defaults = Self::default();
        let level = if args.verbose {
            Level::DEBUG
        } else if args.quiet {
            Level::WARN
        } else {
            Level::INFO
        };

        Self {
            output_dir: args.output_dir.clone(),
            cookies_file: args.cookies.clone(),
            format: args.format.clone(),
            max_concurrent: args.concurrency as usize,
            network: NetworkConfig {
                timeout: Some(args.socket_timeout),
                retries: args.retries,
                insecure: args.insecure,
                ..defaults.network
            },
            log: LogConfig {
                level,
                file: Some(args.log_file.clone()),
            },
            ytdlp_path: args.yt_dlp.clone(),
            ffmpeg_path: args.ffmpeg.clone(),
            ..defaults
        }
    }

    pub fn download_settings(&self) -> DownloadSettings {
        DownloadSettings {
            output_dir: self.output_dir.clone(),
            cookies_file: self.cookies_file.clone(),
            format: self.format.clone(),
            age_limit: self.age_limit,
            max_concurrent: self.max_concurrent,
            ffmpeg_path: self.ffmpeg_path.clone(),
        }
    }
}
