// External tool discovery (ffmpeg, yt-dlp)

use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ToolType {
    Ffmpeg,
    YtDlp,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::Ffmpeg => "ffmpeg",
            ToolType::YtDlp => "yt-dlp",
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::Ffmpeg => "-version", // ffmpeg uses a single dash
            ToolType::YtDlp => "--version",
        }
    }

    /// Platform-specific installation guidance
    pub fn install_hint(&self) -> String {
        match self {
            ToolType::Ffmpeg => {
                if cfg!(target_os = "windows") {
                    "FFmpeg is not installed. To install it on Windows:\n\
                     1. Download a build from https://www.gyan.dev/ffmpeg/builds/ (ffmpeg-git-full.7z)\n\
                     2. Unpack the archive\n\
                     3. Add its bin folder to the PATH environment variable\n\
                     4. Restart the terminal\n\n\
                     Or use a package manager:\n\
                     choco install ffmpeg\n\
                     scoop install ffmpeg"
                        .to_string()
                } else if cfg!(target_os = "macos") {
                    "FFmpeg is not installed. To install it:\n\
                     brew install ffmpeg"
                        .to_string()
                } else {
                    "FFmpeg is not installed. To install it:\n\
                     Ubuntu/Debian: sudo apt-get install ffmpeg\n\
                     Fedora: sudo dnf install ffmpeg\n\
                     Arch: sudo pacman -S ffmpeg"
                        .to_string()
                }
            }
            ToolType::YtDlp => {
                if cfg!(target_os = "windows") {
                    "yt-dlp is not installed. To install it on Windows:\n\
                     winget install yt-dlp\n\
                     or: pip install -U yt-dlp"
                        .to_string()
                } else if cfg!(target_os = "macos") {
                    "yt-dlp is not installed. To install it:\n\
                     brew install yt-dlp\n\
                     or: pip3 install -U yt-dlp"
                        .to_string()
                } else {
                    "yt-dlp is not installed. To install it:\n\
                     pip3 install -U yt-dlp\n\
                     or download the binary from https://github.com/yt-dlp/yt-dlp/releases"
                        .to_string()
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    ffmpeg_override: Option<String>,
    ytdlp_override: Option<String>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit binary path instead of searching for the tool
    pub fn with_override(mut self, tool_type: ToolType, path: Option<String>) -> Self {
        match tool_type {
            ToolType::Ffmpeg => self.ffmpeg_override = path,
            ToolType::YtDlp => self.ytdlp_override = path,
        }
        self
    }

    pub fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let name = tool_type.as_str().to_string();
        let (path, version) = self.detect_tool(tool_type);

        ToolInfo {
            name,
            tool_type,
            version,
            is_available: path.is_some(),
            path,
        }
    }

    fn candidates(&self, tool_type: ToolType) -> Vec<String> {
        let overridden = match tool_type {
            ToolType::Ffmpeg => &self.ffmpeg_override,
            ToolType::YtDlp => &self.ytdlp_override,
        };
        if let Some(path) = overridden {
            return vec![path.clone()];
        }

        let binary_name = tool_type.as_str();
        let mut paths = Vec::new();
        if cfg!(unix) {
            for dir in ["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"] {
                let path = format!("{}/{}", dir, binary_name);
                if std::path::Path::new(&path).exists() {
                    paths.push(path);
                }
            }
        }
        // Bare name resolves through PATH
        paths.push(binary_name.to_string());
        paths
    }

    fn detect_tool(&self, tool_type: ToolType) -> (Option<String>, Option<String>) {
        for candidate in self.candidates(tool_type) {
            if let Some(version) = self.get_version(&candidate, tool_type) {
                debug!("Found {} at {} ({})", tool_type.as_str(), candidate, version);
                return (Some(candidate), Some(version));
            }
        }

        debug!("{} not found", tool_type.as_str());
        (None, None)
    }

    fn get_version(&self, path: &str, tool_type: ToolType) -> Option<String> {
        match Command::new(path)
            .arg(tool_type.version_arg())
            .stdin(Stdio::null())
            .output()
        {
            Ok(output) if output.status.success() => {
                let out = String::from_utf8_lossy(&output.stdout);
                // ffmpeg prints a banner; the first line carries the version
                Some(out.lines().next().unwrap_or("").trim().to_string())
            }
            _ => None,
        }
    }
}
