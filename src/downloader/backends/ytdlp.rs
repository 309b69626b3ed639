// yt-dlp extraction client - drives the native `yt-dlp` binary

use std::process::Stdio;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::downloader::errors::DownloadError;
use crate::downloader::models::{
    DownloadOptions, MediaKind, Metadata, MetadataRequest, NetworkConfig, ProgressEvent,
    VideoEntry,
};
use crate::downloader::traits::{ExtractionClient, ProgressSink};
use crate::downloader::utils::{
    get_network_args, get_timeout_args, last_error_line, run_output_with_timeout,
};

/// Marker prepended to progress lines so they can be told apart from other output
const PROGRESS_MARKER: &str = "[progress]";

const PLAYLIST_FETCH_TIMEOUT_SECS: u64 = 300;
const VIDEO_FETCH_TIMEOUT_SECS: u64 = 120;

pub struct YtDlpClient {
    ytdlp_path: String,
    network: NetworkConfig,
    playlist_timeout_secs: u64,
    video_timeout_secs: u64,
}

impl YtDlpClient {
    pub fn new(ytdlp_path: impl Into<String>, network: NetworkConfig) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
            network,
            playlist_timeout_secs: PLAYLIST_FETCH_TIMEOUT_SECS,
            video_timeout_secs: VIDEO_FETCH_TIMEOUT_SECS,
        }
    }

    /// Override how long a metadata dump may run before it is killed
    pub fn with_fetch_timeouts(mut self, playlist_secs: u64, video_secs: u64) -> Self {
        self.playlist_timeout_secs = playlist_secs;
        self.video_timeout_secs = video_secs;
        self
    }

    pub fn path(&self) -> &str {
        &self.ytdlp_path
    }

    fn metadata_args(&self, url: &str, request: &MetadataRequest) -> Vec<String> {
        let mut args = vec!["--dump-single-json".to_string(), "--no-warnings".to_string()];

        if request.flat {
            args.extend([
                "--flat-playlist".to_string(),
                "--ignore-errors".to_string(),
                "--extractor-args".to_string(),
                "youtubetab:skip=authcheck".to_string(),
            ]);
        } else {
            args.extend(["--no-playlist".to_string(), "--skip-download".to_string()]);
        }

        args.extend(get_timeout_args(&self.network));
        args.extend(get_network_args(&self.network));

        if let Some(path) = &request.cookies_path {
            args.push("--cookies".to_string());
            args.push(path.to_string_lossy().into_owned());
        }

        args.push(url.to_string());
        args
    }

    fn download_args(&self, url: &str, options: &DownloadOptions) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            options.format.clone(),
            "-o".to_string(),
            options.output_template.clone(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--newline".to_string(),
            "--progress-template".to_string(),
            format!("download:{}%(progress)j", PROGRESS_MARKER),
        ];

        args.extend(get_timeout_args(&self.network));
        args.extend(get_network_args(&self.network));

        if let Some(path) = &options.cookies_path {
            args.push("--cookies".to_string());
            args.push(path.to_string_lossy().into_owned());
        }

        if let Some(age) = options.age_limit {
            args.push("--age-limit".to_string());
            args.push(age.to_string());
        }

        if let Some(ffmpeg) = &options.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(ffmpeg.clone());
        }

        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl ExtractionClient for YtDlpClient {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch_metadata(
        &self,
        url: &str,
        request: &MetadataRequest,
    ) -> Result<Option<Metadata>, DownloadError> {
        let args = self.metadata_args(url, request);
        let timeout_secs = if request.flat {
            self.playlist_timeout_secs
        } else {
            self.video_timeout_secs
        };
        debug!("[yt-dlp] {} {}", self.ytdlp_path, args.join(" "));

        let output = run_output_with_timeout(&self.ytdlp_path, &args, timeout_secs).await?;

        // With --ignore-errors yt-dlp exits non-zero on partial failures but
        // still prints usable JSON, so stdout decides.
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            if output.status.success() {
                return Ok(None);
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = last_error_line(&stderr)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            return Err(DownloadError::from(reason));
        }

        parse_metadata(&output.stdout)
    }

    async fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        progress: &mut dyn ProgressSink,
    ) -> Result<(), DownloadError> {
        let args = self.download_args(url, options);
        debug!("[yt-dlp] {} {}", self.ytdlp_path, args.join(" "));

        let mut child = Command::new(&self.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture yt-dlp stdout".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture yt-dlp stderr".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).into_owned()
        });

        let mut finished = false;
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            // Output is in the locale encoding, which is not always UTF-8
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\r', '\n']);
            match parse_output_line(line) {
                OutputLine::Progress(event) => {
                    finished |= event == ProgressEvent::Finished;
                    progress.on_progress(event);
                }
                OutputLine::Destination(path) => debug!("[yt-dlp] Destination: {}", path),
                OutputLine::AlreadyDownloaded => {
                    info!("[yt-dlp] File already downloaded: {}", url);
                }
                OutputLine::Other => debug!("[yt-dlp] {}", line),
            }
        }

        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();

        if status.success() {
            if !finished {
                progress.on_progress(ProgressEvent::Finished);
            }
            Ok(())
        } else {
            let reason =
                last_error_line(&stderr).unwrap_or_else(|| format!("yt-dlp exited with {}", status));
            Err(DownloadError::from(reason))
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawInfo {
    id: Option<String>,
    title: Option<String>,
    #[serde(rename = "_type")]
    kind: Option<String>,
    entries: Option<Vec<Option<RawEntry>>>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    id: Option<String>,
    title: Option<String>,
}

/// Parse `--dump-single-json` output
fn parse_metadata(stdout: &[u8]) -> Result<Option<Metadata>, DownloadError> {
    let raw: Option<RawInfo> = serde_json::from_slice(stdout)
        .map_err(|e| DownloadError::ParseError(format!("Invalid JSON from yt-dlp: {}", e)))?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    let kind = match raw.kind.as_deref() {
        Some("playlist") | Some("multi_video") => MediaKind::Playlist,
        _ => MediaKind::Video,
    };

    let mut entries = Vec::new();
    let mut unresolved = 0;
    for entry in raw.entries.unwrap_or_default() {
        match entry {
            Some(RawEntry { id: Some(id), title }) if !id.trim().is_empty() => {
                entries.push(VideoEntry { id, title });
            }
            _ => unresolved += 1,
        }
    }

    Ok(Some(Metadata {
        id: raw.id,
        title: raw.title,
        kind,
        entries,
        unresolved,
    }))
}

#[derive(Debug, PartialEq)]
enum OutputLine {
    Progress(ProgressEvent),
    Destination(String),
    AlreadyDownloaded,
    Other,
}

#[derive(Debug, Deserialize)]
struct RawProgress {
    status: String,
    downloaded_bytes: Option<f64>,
    total_bytes: Option<f64>,
    total_bytes_estimate: Option<f64>,
}

fn as_bytes(value: Option<f64>) -> Option<u64> {
    value.filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u64)
}

fn parse_output_line(line: &str) -> OutputLine {
    lazy_static::lazy_static! {
        static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
        static ref ALREADY_RE: Regex = Regex::new(r"has already been downloaded").unwrap();
    }

    if let Some(json) = line.trim().strip_prefix(PROGRESS_MARKER) {
        return match serde_json::from_str::<RawProgress>(json) {
            Ok(raw) if raw.status == "downloading" => OutputLine::Progress(ProgressEvent::Downloading {
                downloaded_bytes: as_bytes(raw.downloaded_bytes).unwrap_or(0),
                total_bytes: as_bytes(raw.total_bytes),
                total_bytes_estimate: as_bytes(raw.total_bytes_estimate),
            }),
            Ok(raw) if raw.status == "finished" => OutputLine::Progress(ProgressEvent::Finished),
            _ => OutputLine::Other,
        };
    }

    if let Some(caps) = DEST_RE.captures(line) {
        let path = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        return OutputLine::Destination(path.to_string());
    }

    if ALREADY_RE.is_match(line) {
        return OutputLine::AlreadyDownloaded;
    }

    OutputLine::Other
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn client() -> YtDlpClient {
        YtDlpClient::new("yt-dlp", NetworkConfig::default())
    }

    #[test]
    fn test_parse_flat_playlist_skips_unresolved_entries() {
        let json = br#"{
            "_type": "playlist",
            "id": "PL123",
            "title": "Lectures",
            "entries": [
                {"_type": "url", "id": "aaa", "title": "One"},
                null,
                {"_type": "url", "id": "bbb", "title": null},
                {"_type": "url", "title": "No id"}
            ]
        }"#;

        let metadata = parse_metadata(json).unwrap().unwrap();
        assert_eq!(metadata.kind, MediaKind::Playlist);
        assert_eq!(metadata.title.as_deref(), Some("Lectures"));
        assert_eq!(
            metadata.entries,
            vec![VideoEntry::new("aaa").with_title("One"), VideoEntry::new("bbb")]
        );
        assert_eq!(metadata.unresolved, 2);
    }

    #[test]
    fn test_parse_single_video() {
        let json = br#"{"id": "aaa", "title": "Clip", "formats": []}"#;
        let metadata = parse_metadata(json).unwrap().unwrap();
        assert_eq!(metadata.kind, MediaKind::Video);
        assert_eq!(metadata.display_title(), "Clip");
        assert!(metadata.entries.is_empty());
    }

    #[test]
    fn test_parse_null_and_garbage() {
        assert_eq!(parse_metadata(b"null").unwrap(), None);
        assert!(matches!(parse_metadata(b"<html>"), Err(DownloadError::ParseError(_))));
    }

    #[test]
    fn test_parse_progress_line() {
        let line = r#"[progress]{"status": "downloading", "downloaded_bytes": 1024, "total_bytes": null, "total_bytes_estimate": 4096.5, "speed": 12.0}"#;
        assert_eq!(
            parse_output_line(line),
            OutputLine::Progress(ProgressEvent::Downloading {
                downloaded_bytes: 1024,
                total_bytes: None,
                total_bytes_estimate: Some(4096),
            })
        );

        let line = r#"[progress]{"status": "finished", "downloaded_bytes": 4096, "total_bytes": 4096}"#;
        assert_eq!(parse_output_line(line), OutputLine::Progress(ProgressEvent::Finished));
    }

    #[test]
    fn test_parse_other_lines() {
        assert_eq!(
            parse_output_line("[download] Destination: downloads/Clip.mp4"),
            OutputLine::Destination("downloads/Clip.mp4".to_string())
        );
        assert_eq!(
            parse_output_line("[download] downloads/Clip.mp4 has already been downloaded"),
            OutputLine::AlreadyDownloaded
        );
        assert_eq!(parse_output_line("[youtube] aaa: Downloading webpage"), OutputLine::Other);
        assert_eq!(parse_output_line("[progress]not json"), OutputLine::Other);
    }

    #[test]
    fn test_flat_metadata_args() {
        let cookies = PathBuf::from("cookies.txt");
        let args = client().metadata_args(
            "https://www.youtube.com/playlist?list=PL1",
            &MetadataRequest::flat_playlist(Some(cookies)),
        );
        assert!(args.contains(&"--flat-playlist".to_string()));
        assert!(args.contains(&"--ignore-errors".to_string()));
        assert!(args.windows(2).any(|w| w[0] == "--cookies" && w[1] == "cookies.txt"));
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/playlist?list=PL1");
        assert!(!args.contains(&"--no-check-certificates".to_string()));
    }

    #[test]
    fn test_single_video_metadata_args() {
        let args = client().metadata_args("https://youtu.be/x", &MetadataRequest::single_video(None));
        assert!(args.contains(&"--skip-download".to_string()));
        assert!(!args.contains(&"--flat-playlist".to_string()));
        assert!(!args.contains(&"--cookies".to_string()));
    }

    #[test]
    fn test_download_args() {
        let options = DownloadOptions::new(Path::new("downloads"));
        let args = client().download_args("https://www.youtube.com/watch?v=aaa", &options);
        assert!(args.windows(2).any(|w| w[0] == "-f" && w[1] == "best"));
        assert!(args.windows(2).any(|w| w[0] == "--age-limit" && w[1] == "99"));
        assert!(args
            .windows(2)
            .any(|w| w[0] == "--progress-template" && w[1] == "download:[progress]%(progress)j"));
    }

    #[test]
    fn test_download_args_pass_ffmpeg_location() {
        let options = DownloadOptions::new(Path::new("out"))
            .with_ffmpeg_location(Some("/usr/local/bin/ffmpeg".to_string()));
        let args = client().download_args("u", &options);
        assert!(args
            .windows(2)
            .any(|w| w[0] == "--ffmpeg-location" && w[1] == "/usr/local/bin/ffmpeg"));

        let args = client().download_args("u", &DownloadOptions::new(Path::new("out")));
        assert!(!args.contains(&"--ffmpeg-location".to_string()));
    }

    #[test]
    fn test_insecure_download_args() {
        let network = NetworkConfig {
            insecure: true,
            ..NetworkConfig::default()
        };
        let client = YtDlpClient::new("yt-dlp", network);
        let args = client.download_args("u", &DownloadOptions::new(Path::new("out")));
        assert!(args.contains(&"--no-check-certificates".to_string()));
    }
}
