// Playlist URL and cookie handling, plus the process and argument helpers
// behind every yt-dlp invocation

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use regex::Regex;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};
use url::Url;

use crate::downloader::errors::DownloadError;
use crate::downloader::models::NetworkConfig;

const PLAYLIST_BASE: &str = "https://www.youtube.com/playlist";

/// Keep only the playlist identifier of a playlist URL.
///
/// `https://www.youtube.com/watch?v=abc&list=PL123&index=4` becomes
/// `https://www.youtube.com/playlist?list=PL123`. URLs without a `list`
/// parameter, and anything that does not parse, are returned unchanged.
pub fn normalize_playlist_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(parsed) = Url::parse(trimmed) else {
        return raw.to_string();
    };

    let list = parsed
        .query_pairs()
        .find(|(key, value)| key == "list" && !value.is_empty())
        .map(|(_, value)| value.into_owned());

    match list {
        Some(id) => match Url::parse_with_params(PLAYLIST_BASE, &[("list", id.as_str())]) {
            Ok(url) => url.to_string(),
            Err(_) => raw.to_string(),
        },
        None => raw.to_string(),
    }
}

/// Return the cookie file if it exists; its absence only limits access to
/// private or restricted videos.
pub fn resolve_cookies_file(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        info!("Using {} for authentication", path.display());
        Some(path.to_path_buf())
    } else {
        warn!(
            "Cookie file {} not found. Private or restricted videos may fail to download.",
            path.display()
        );
        None
    }
}

/// Last `ERROR:` line from yt-dlp stderr, or the last non-empty line
pub fn last_error_line(stderr: &str) -> Option<String> {
    lazy_static::lazy_static! {
        static ref ERROR_RE: Regex = Regex::new(r"(?m)^ERROR:\s*(.+)$").unwrap();
    }

    if let Some(caps) = ERROR_RE.captures_iter(stderr).last() {
        return caps.get(1).map(|m| m.as_str().trim().to_string());
    }

    stderr
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(str::to_string)
}

/// Run `program` to completion and capture both streams. A child still
/// running after `timeout_secs` is killed and reported as a network timeout.
pub async fn run_output_with_timeout(
    program: &str,
    args: &[String],
    timeout_secs: u64,
) -> Result<Output, DownloadError> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    // Dropping the pending future drops the child, which kills it
    match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(output) => Ok(output?),
        Err(_) => {
            warn!("{} did not finish within {}s, killed", program, timeout_secs);
            Err(DownloadError::NetworkTimeout)
        }
    }
}

/// Build timeout and retry arguments for yt-dlp
pub fn get_timeout_args(config: &NetworkConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(timeout) = config.timeout {
        args.push("--socket-timeout".to_string());
        args.push(timeout.to_string());
    }

    args.push("--retries".to_string());
    args.push(config.retries.to_string());

    args
}

/// Build header and TLS arguments for yt-dlp
pub fn get_network_args(config: &NetworkConfig) -> Vec<String> {
    let mut args = vec![
        "--user-agent".to_string(),
        config.user_agent.clone(),
        "--referer".to_string(),
        config.referer.clone(),
    ];

    if config.insecure {
        args.push("--no-check-certificates".to_string());
        args.push("--prefer-insecure".to_string());
        args.push("--legacy-server-connect".to_string());
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_keeps_only_list() {
        let url = "https://www.youtube.com/watch?v=abc123&list=PLxyz&index=4&si=noise";
        assert_eq!(
            normalize_playlist_url(url),
            "https://www.youtube.com/playlist?list=PLxyz"
        );
    }

    #[test]
    fn test_normalize_playlist_page_is_stable() {
        let url = "https://www.youtube.com/playlist?list=PLxyz";
        assert_eq!(normalize_playlist_url(url), url);
    }

    #[test]
    fn test_normalize_without_list_is_unchanged() {
        let url = "https://www.youtube.com/watch?v=abc123&t=42";
        assert_eq!(normalize_playlist_url(url), url);
    }

    #[test]
    fn test_normalize_malformed_passes_through() {
        assert_eq!(normalize_playlist_url("not a url"), "not a url");
        assert_eq!(normalize_playlist_url(""), "");
    }

    #[test]
    fn test_normalize_empty_list_value_is_ignored() {
        let url = "https://www.youtube.com/watch?v=abc&list=";
        assert_eq!(normalize_playlist_url(url), url);
    }

    #[test]
    fn test_last_error_line_prefers_error_lines() {
        let stderr = "WARNING: something\nERROR: [youtube] abc: Private video\nmore\n";
        assert_eq!(
            last_error_line(stderr).as_deref(),
            Some("[youtube] abc: Private video")
        );
        assert_eq!(last_error_line("first\nsecond\n\n").as_deref(), Some("second"));
        assert_eq!(last_error_line(""), None);
    }

    #[test]
    fn test_insecure_flags_only_when_enabled() {
        let config = NetworkConfig::default();
        assert!(!get_network_args(&config).contains(&"--no-check-certificates".to_string()));

        let config = NetworkConfig {
            insecure: true,
            ..NetworkConfig::default()
        };
        assert!(get_network_args(&config).contains(&"--no-check-certificates".to_string()));
    }

    #[test]
    fn test_timeout_args() {
        let args = get_timeout_args(&NetworkConfig::default());
        assert_eq!(args, vec!["--socket-timeout", "30", "--retries", "10"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_output_captures_both_streams() {
        let args = vec!["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()];
        let output = run_output_with_timeout("sh", &args, 10).await.unwrap();

        assert_eq!(output.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&output.stdout), "out\n");
        assert_eq!(String::from_utf8_lossy(&output.stderr), "err\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_output_kills_slow_child() {
        let args = vec!["-c".to_string(), "exec sleep 10".to_string()];
        let started = std::time::Instant::now();
        let result = run_output_with_timeout("sh", &args, 1).await;

        assert_eq!(result.unwrap_err(), DownloadError::NetworkTimeout);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_run_output_missing_program() {
        let result = run_output_with_timeout("/nonexistent/yt-dlp", &[], 1).await;
        assert!(matches!(result, Err(DownloadError::ToolNotFound(_))));
    }

    #[test]
    fn test_resolve_missing_cookie_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_cookies_file(&dir.path().join("cookies.txt")), None);

        let path = dir.path().join("cookies.txt");
        std::fs::write(&path, "# Netscape HTTP Cookie File\n").unwrap();
        assert_eq!(resolve_cookies_file(&path), Some(path));
    }
}
