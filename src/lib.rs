pub mod config;
pub mod downloader;
pub mod error;
pub mod input;
pub mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use indicatif::MultiProgress;
use tracing::info;

use config::{AppConfig, Args};
use downloader::{
    DownloadSettings, PlaylistDownloader, ToolInfo, ToolManager, ToolType, YtDlpClient,
};
use error::{AppError, Result};

/// Printed after an unexpected top-level failure
pub const TROUBLESHOOTING_HINTS: [&str; 4] = [
    "Make sure the playlist URL is correct",
    "Check that cookies.txt exists if the playlist contains private videos",
    "Make sure your internet connection is stable",
    "Update yt-dlp: pip install --upgrade yt-dlp (or yt-dlp -U)",
];

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub titles: Vec<String>,
    pub output_dir: PathBuf,
}

/// Resolved locations of the external tools
#[derive(Debug, Clone)]
pub struct Prerequisites {
    pub ffmpeg: ToolInfo,
    pub ytdlp: ToolInfo,
}

impl Prerequisites {
    /// ffmpeg path to hand to yt-dlp; `None` when it was found through PATH
    pub fn ffmpeg_location(&self) -> Option<String> {
        self.ffmpeg
            .path
            .clone()
            .filter(|path| path != ToolType::Ffmpeg.as_str())
    }

    pub fn ytdlp_path(&self) -> String {
        self.ytdlp
            .path
            .clone()
            .unwrap_or_else(|| ToolType::YtDlp.as_str().to_string())
    }
}

fn require_tool(tools: &ToolManager, tool: ToolType) -> Result<ToolInfo> {
    let info = tools.get_tool_info(tool);
    if !info.is_available {
        return Err(AppError::MissingTool {
            tool: info.name,
            hint: tool.install_hint(),
        });
    }
    info!(
        "Found {} {}",
        info.name,
        info.version.as_deref().unwrap_or("(unknown version)")
    );
    Ok(info)
}

/// Check ffmpeg then yt-dlp, stopping at the first one missing
pub fn ensure_prerequisites(tools: &ToolManager) -> Result<Prerequisites> {
    let ffmpeg = require_tool(tools, ToolType::Ffmpeg)?;
    let ytdlp = require_tool(tools, ToolType::YtDlp)?;
    Ok(Prerequisites { ffmpeg, ytdlp })
}

/// Run one playlist download. Progress bars are drawn through `progress`,
/// which should be the same instance the log writer suspends.
pub async fn run(args: Args, progress: MultiProgress) -> Result<RunSummary> {
    let config = AppConfig::from_args(&args);

    let tools = ToolManager::new()
        .with_override(ToolType::Ffmpeg, config.ffmpeg_path.clone())
        .with_override(ToolType::YtDlp, config.ytdlp_path.clone());
    let prerequisites = ensure_prerequisites(&tools)?;

    std::fs::create_dir_all(&config.output_dir)?;

    let request = input::collect_request(args.url, args.limit)?;

    let client = Arc::new(YtDlpClient::new(
        prerequisites.ytdlp_path(),
        config.network.clone(),
    ));
    let settings = DownloadSettings {
        ffmpeg_path: prerequisites.ffmpeg_location(),
        ..config.download_settings()
    };
    let downloader = PlaylistDownloader::new(client, settings).with_progress(progress);

    let titles = tokio::select! {
        titles = downloader.process_playlist(&request.url, request.limit) => titles,
        _ = tokio::signal::ctrl_c() => return Err(AppError::Interrupted),
    };

    Ok(RunSummary {
        titles,
        output_dir: config.output_dir,
    })
}
