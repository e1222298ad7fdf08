// Universal provider - uses native `yt-dlp` binary
//
// Works for every platform yt-dlp knows about, which makes it the last
// entry of each platform's strategy list. For YouTube several player
// clients are tried in order, since some are blocked more often than others.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::resolver::config::YtDlpConfig;
use crate::resolver::errors::ProviderError;
use crate::resolver::models::{
    Author, FormatKind, MediaCandidate, MediaFormat, MediaMetadata, Statistics,
};
use crate::resolver::platform::Platform;
use crate::resolver::router::provider_ids::YT_DLP;
use crate::resolver::traits::StrategyProvider;
use crate::resolver::utils::{
    binary_responds, find_binary, run_output_with_timeout, PROBE_TIMEOUT_SECS,
};

pub struct YtDlpProvider {
    ytdlp_path: String,
    config: YtDlpConfig,
    available: OnceCell<bool>,
}

impl YtDlpProvider {
    pub fn new(config: YtDlpConfig) -> Self {
        Self {
            ytdlp_path: find_binary("yt-dlp", config.binary_path.as_deref()),
            config,
            available: OnceCell::new(),
        }
    }

    /// Build command arguments
    fn build_args(&self, url: &str, client: Option<&str>) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.config.timeout_seconds.to_string(),
            "--retries".to_string(),
            "2".to_string(),
        ];

        if let Some(client) = client {
            args.push("--extractor-args".to_string());
            args.push(format!("youtube:player_client={}", client));
        }

        if let Some(path) = &self.config.cookies_path {
            args.push("--cookies".to_string());
            args.push(path.clone());
        }

        if let Some(proxy) = &self.config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args.push(url.to_string());
        args
    }

    /// Player clients to try for `url`; `[None]` outside YouTube
    fn clients_for(&self, url: &str) -> Vec<Option<&str>> {
        if Platform::detect(url) != Platform::Youtube || self.config.player_clients.is_empty() {
            return vec![None];
        }

        // With cookies the web client sees the logged-in session, so it goes first
        let mut clients: Vec<&str> = self.config.player_clients.iter().map(String::as_str).collect();
        if self.config.cookies_path.is_some() {
            if let Some(pos) = clients.iter().position(|c| *c == "web") {
                let web = clients.remove(pos);
                clients.insert(0, web);
            }
        }

        clients.into_iter().map(Some).collect()
    }

    async fn try_with_clients(&self, url: &str) -> Result<MediaCandidate, ProviderError> {
        let mut last_error = ProviderError::Unknown("No clients to try".to_string());
        // socket timeout plus headroom for startup and retries
        let process_timeout = self.config.timeout_seconds as u64 * 2 + 10;

        for client in self.clients_for(url) {
            let args = self.build_args(url, client);
            debug!(client = client.unwrap_or("default"), "Running yt-dlp");

            match run_output_with_timeout(&self.ytdlp_path, &args, process_timeout).await {
                Ok(out) if out.status.success() => {
                    info!(client = client.unwrap_or("default"), "yt-dlp extraction succeeded");
                    return parse_candidate(&out.stdout);
                }
                Ok(out) => {
                    let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
                    warn!(client = client.unwrap_or("default"), error = %stderr, "yt-dlp failed");
                    last_error = ProviderError::from(stderr);
                }
                Err(e) => {
                    warn!(client = client.unwrap_or("default"), error = %e, "yt-dlp error");
                    last_error = ProviderError::from(e);
                }
            }
        }

        Err(last_error)
    }
}

impl Default for YtDlpProvider {
    fn default() -> Self {
        Self::new(YtDlpConfig::default())
    }
}

#[async_trait]
impl StrategyProvider for YtDlpProvider {
    fn name(&self) -> &'static str {
        YT_DLP
    }

    async fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| binary_responds(&self.ytdlp_path, PROBE_TIMEOUT_SECS))
            .await
    }

    async fn fetch(&self, url: &str) -> Result<MediaCandidate, ProviderError> {
        if url.trim().is_empty() {
            return Err(ProviderError::InvalidUrl("empty URL".to_string()));
        }

        self.try_with_clients(url).await
    }
}

/// Turn yt-dlp JSON output into a candidate.
///
/// Playlists resolve to their first entry.
pub fn parse_candidate(stdout: &[u8]) -> Result<MediaCandidate, ProviderError> {
    let json: Value = serde_json::from_slice(stdout)
        .map_err(|e| ProviderError::ParseError(format!("Invalid JSON: {}", e)))?;

    let item = match json.get("entries").and_then(Value::as_array) {
        Some(entries) => entries
            .iter()
            .find(|e| e.is_object())
            .ok_or_else(|| ProviderError::NoData("Playlist has no entries".to_string()))?,
        None => &json,
    };

    let source_url = best_url(item)
        .ok_or_else(|| ProviderError::NoData("No playable URL in output".to_string()))?;

    Ok(MediaCandidate::new(source_url, YT_DLP).with_metadata(parse_metadata(item)))
}

const VIDEO_EXTS: [&str; 3] = ["mp4", "webm", "mov"];

/// Format list, falling back to what yt-dlp would download
fn format_entries(item: &Value) -> &[Value] {
    item.get("formats")
        .and_then(Value::as_array)
        .filter(|f| !f.is_empty())
        .or_else(|| item.get("requested_downloads").and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Widest container-friendly video, else the first format, else the top-level URL
fn best_url(item: &Value) -> Option<String> {
    let formats = format_entries(item);

    let best_video = formats
        .iter()
        .filter(|f| {
            f.get("ext")
                .and_then(Value::as_str)
                .map_or(false, |ext| VIDEO_EXTS.contains(&ext))
                && f.get("vcodec").and_then(Value::as_str) != Some("none")
        })
        // rev: among equal widths the earliest entry wins
        .rev()
        .max_by_key(|f| f.get("width").and_then(Value::as_u64).unwrap_or(0));

    best_video
        .and_then(|f| str_field(f, "url"))
        .or_else(|| formats.first().and_then(|f| str_field(f, "url")))
        .or_else(|| str_field(item, "url"))
}

fn parse_metadata(item: &Value) -> MediaMetadata {
    let author = Author {
        id: str_field(item, "uploader_id").or_else(|| str_field(item, "channel_id")),
        username: str_field(item, "uploader"),
        nickname: str_field(item, "channel").or_else(|| str_field(item, "creator")),
        url: str_field(item, "uploader_url").or_else(|| str_field(item, "channel_url")),
    };

    let statistics = Statistics {
        play_count: item.get("view_count").and_then(Value::as_u64),
        like_count: item.get("like_count").and_then(Value::as_u64),
        comment_count: item.get("comment_count").and_then(Value::as_u64),
        share_count: item.get("repost_count").and_then(Value::as_u64),
    };

    MediaMetadata {
        title: str_field(item, "title"),
        description: str_field(item, "description"),
        author: (author != Author::default()).then_some(author),
        thumbnail: item
            .get("thumbnails")
            .and_then(Value::as_array)
            .and_then(|t| t.first())
            .and_then(|t| str_field(t, "url"))
            .or_else(|| str_field(item, "thumbnail")),
        duration: item.get("duration").and_then(Value::as_f64),
        statistics: (statistics != Statistics::default()).then_some(statistics),
        formats: parse_formats(item),
    }
}

fn parse_formats(item: &Value) -> Vec<MediaFormat> {
    format_entries(item)
        .iter()
        .map(|f| {
            let kind = match f.get("vcodec").and_then(Value::as_str) {
                Some("none") => FormatKind::Audio,
                _ => FormatKind::Video,
            };

            MediaFormat {
                url: str_field(f, "url"),
                kind,
                resolution: str_field(f, "resolution"),
                ext: str_field(f, "ext"),
            }
        })
        .collect()
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = r#"{
        "id": "7301",
        "title": "Dance",
        "uploader": "dancer",
        "uploader_id": "42",
        "thumbnail": "https://cdn/thumb.jpg",
        "duration": 15.2,
        "view_count": 1000,
        "like_count": 50,
        "formats": [
            {"format_id": "a", "url": "https://cdn/audio.m4a", "vcodec": "none", "acodec": "mp4a", "ext": "m4a"},
            {"format_id": "low", "url": "https://cdn/360.mp4", "vcodec": "h264", "acodec": "aac", "width": 640, "ext": "mp4"},
            {"format_id": "high", "url": "https://cdn/720.webm", "vcodec": "vp9", "acodec": "opus", "width": 1280, "ext": "webm", "resolution": "1280x720"},
            {"format_id": "hls", "url": "https://cdn/1080.m3u8", "vcodec": "h264", "acodec": "aac", "width": 1920, "ext": "m3u8"}
        ]
    }"#;

    #[test]
    fn test_picks_widest_video_format() {
        let candidate = parse_candidate(SINGLE.as_bytes()).unwrap();

        assert_eq!(candidate.source_url, "https://cdn/720.webm");
        assert_eq!(candidate.provider_tag, "yt-dlp");
        assert_eq!(candidate.metadata.title.as_deref(), Some("Dance"));
        assert_eq!(candidate.metadata.duration_label().as_deref(), Some("0:15"));
        assert_eq!(
            candidate.metadata.author.as_ref().and_then(|a| a.username.as_deref()),
            Some("dancer")
        );
        assert_eq!(
            candidate.metadata.statistics.as_ref().and_then(|s| s.play_count),
            Some(1000)
        );
        assert_eq!(candidate.metadata.formats.len(), 4);
        assert_eq!(candidate.metadata.formats[0].kind, FormatKind::Audio);
    }

    #[test]
    fn test_top_level_url_without_formats() {
        let json = r#"{"title": "x", "url": "https://cdn/direct.mp4", "formats": []}"#;
        let candidate = parse_candidate(json.as_bytes()).unwrap();
        assert_eq!(candidate.source_url, "https://cdn/direct.mp4");
        assert_eq!(candidate.metadata.author, None);
    }

    #[test]
    fn test_first_format_when_no_video_matches() {
        let json = r#"{"url": "https://cdn/top.mp4", "thumbnails": [{"url": "https://cdn/t0.jpg"}], "thumbnail": "https://cdn/t.jpg", "formats": [{"url": "https://cdn/a.m4a", "ext": "m4a", "vcodec": "none"}]}"#;
        let candidate = parse_candidate(json.as_bytes()).unwrap();
        assert_eq!(candidate.source_url, "https://cdn/a.m4a");
        assert_eq!(candidate.metadata.thumbnail.as_deref(), Some("https://cdn/t0.jpg"));
    }

    #[test]
    fn test_playlist_uses_first_entry() {
        let json = r#"{"_type": "playlist", "entries": [{"title": "first", "url": "https://cdn/1.mp4"}, {"title": "second", "url": "https://cdn/2.mp4"}]}"#;
        let candidate = parse_candidate(json.as_bytes()).unwrap();
        assert_eq!(candidate.source_url, "https://cdn/1.mp4");
        assert_eq!(candidate.metadata.title.as_deref(), Some("first"));
    }

    #[test]
    fn test_no_playable_url() {
        let json = r#"{"title": "x", "formats": [{"vcodec": "none", "acodec": "none"}]}"#;
        assert!(matches!(
            parse_candidate(json.as_bytes()),
            Err(ProviderError::NoData(_))
        ));

        let empty_playlist = r#"{"_type": "playlist", "entries": []}"#;
        assert!(matches!(
            parse_candidate(empty_playlist.as_bytes()),
            Err(ProviderError::NoData(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_candidate(b"ERROR: not json"),
            Err(ProviderError::ParseError(_))
        ));
    }

    #[test]
    fn test_build_args_with_proxy_and_cookies() {
        let provider = YtDlpProvider::new(YtDlpConfig {
            binary_path: Some("/bin/yt-dlp".to_string()),
            proxy: Some("socks5h://127.0.0.1:1080".to_string()),
            cookies_path: Some("/tmp/cookies.txt".to_string()),
            ..YtDlpConfig::default()
        });
        let args = provider.build_args("https://www.tiktok.com/@a/video/1", None);

        assert_eq!(args[0], "--dump-single-json");
        assert!(args.windows(2).any(|w| w[0] == "--proxy" && w[1] == "socks5h://127.0.0.1:1080"));
        assert!(args.windows(2).any(|w| w[0] == "--cookies" && w[1] == "/tmp/cookies.txt"));
        assert!(!args.contains(&"--extractor-args".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://www.tiktok.com/@a/video/1"));
    }

    #[test]
    fn test_player_clients_only_for_youtube() {
        let provider = YtDlpProvider::new(YtDlpConfig {
            binary_path: Some("/bin/yt-dlp".to_string()),
            ..YtDlpConfig::default()
        });
        assert_eq!(
            provider.clients_for("https://youtu.be/abc"),
            vec![Some("android"), Some("web")]
        );
        assert_eq!(provider.clients_for("https://www.tiktok.com/@a/video/1"), vec![None]);

        let with_cookies = YtDlpProvider::new(YtDlpConfig {
            binary_path: Some("/bin/yt-dlp".to_string()),
            cookies_path: Some("/tmp/c.txt".to_string()),
            ..YtDlpConfig::default()
        });
        assert_eq!(
            with_cookies.clients_for("https://youtu.be/abc"),
            vec![Some("web"), Some("android")]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let provider = YtDlpProvider::new(YtDlpConfig {
            binary_path: Some("definitely-not-yt-dlp-xyz".to_string()),
            ..YtDlpConfig::default()
        });
        assert!(!provider.is_available().await);
        assert!(matches!(
            provider.fetch("https://www.tiktok.com/@a/video/1").await,
            Err(ProviderError::ToolNotFound(_))
        ));
    }
}
