// Configuration for the resolution pipeline

use serde::Deserialize;
use std::path::PathBuf;

/// What to do when no frames could be inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InconclusivePolicy {
    /// Accept the candidate; a sampling failure says nothing about the media
    #[default]
    Accept,
    /// Treat as a failed strategy and move on
    Escalate,
}

impl std::str::FromStr for InconclusivePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accept" => Ok(Self::Accept),
            "escalate" => Ok(Self::Escalate),
            other => Err(format!("Unknown inconclusive policy: {}", other)),
        }
    }
}

/// Frame sampler settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub ffmpeg_path: Option<String>,
    /// Where partial downloads and frames are written
    pub temp_dir: Option<PathBuf>,
    /// Estimated media bytes per second of playback
    pub bytes_per_second: u64,
    pub margin_seconds: f64,
    /// Absolute cap on the downloaded prefix
    pub max_prefix_bytes: u64,
    pub download_timeout_secs: u64,
    pub extract_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            temp_dir: None,
            bytes_per_second: 512 * 1024,
            margin_seconds: 1.0,
            max_prefix_bytes: 4 * 1024 * 1024,
            download_timeout_secs: 10,
            extract_timeout_secs: 15,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

impl SamplerConfig {
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Text recognizer settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub tesseract_path: Option<String>,
    pub language: String,
    /// Restricts recognized characters to reduce noise
    pub char_whitelist: String,
    pub timeout_secs: u64,
    /// Concurrent recognitions; 1 serializes every request
    pub max_concurrent: usize,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            tesseract_path: None,
            language: "eng".to_string(),
            char_whitelist: "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789."
                .to_string(),
            timeout_secs: 15,
            max_concurrent: 1,
        }
    }
}

/// Universal extractor settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct YtDlpConfig {
    pub binary_path: Option<String>,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<String>,
    pub timeout_seconds: u32,
    /// YouTube player clients, tried in order
    pub player_clients: Vec<String>,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            proxy: None,
            cookies_path: None,
            timeout_seconds: 30,
            player_clients: vec!["android".to_string(), "web".to_string()],
        }
    }
}

/// Top-level resolver configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Forbidden marking; `None` disables watermark validation
    pub watermark: Option<String>,
    /// Offsets (seconds) at which frames are sampled
    pub sample_offsets: Vec<f64>,
    pub inconclusive_policy: InconclusivePolicy,
    pub sampler: SamplerConfig,
    pub recognizer: RecognizerConfig,
    pub ytdlp: YtDlpConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            watermark: Some("ssstik.io".to_string()),
            sample_offsets: vec![1.0, 2.0],
            inconclusive_policy: InconclusivePolicy::Accept,
            sampler: SamplerConfig::default(),
            recognizer: RecognizerConfig::default(),
            ytdlp: YtDlpConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Defaults overlaid with environment variables
    pub fn from_env() -> Self {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    fn overlay(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(mark) = var("RESOLVER_WATERMARK") {
            self.watermark = if mark.trim().is_empty() { None } else { Some(mark) };
        }
        if let Some(policy) = var("RESOLVER_INCONCLUSIVE_POLICY") {
            match policy.parse() {
                Ok(p) => self.inconclusive_policy = p,
                Err(e) => tracing::warn!("{}; keeping {:?}", e, self.inconclusive_policy),
            }
        }
        if let Some(path) = var("FFMPEG_PATH") {
            self.sampler.ffmpeg_path = Some(path);
        }
        if let Some(path) = var("TESSERACT_PATH") {
            self.recognizer.tesseract_path = Some(path);
        }
        if let Some(path) = var("YTDLP_PATH") {
            self.ytdlp.binary_path = Some(path);
        }
        if let Some(proxy) = var("YTDLP_PROXY") {
            self.ytdlp.proxy = Some(proxy);
        }
        if let Some(cookies) = var("YTDLP_COOKIES") {
            self.ytdlp.cookies_path = Some(cookies);
        }
        self
    }

    pub fn with_watermark(mut self, watermark: Option<String>) -> Self {
        self.watermark = watermark;
        self
    }

    pub fn with_sample_offsets(mut self, offsets: Vec<f64>) -> Self {
        self.sample_offsets = offsets;
        self
    }

    pub fn with_inconclusive_policy(mut self, policy: InconclusivePolicy) -> Self {
        self.inconclusive_policy = policy;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.ytdlp.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<String>) -> Self {
        self.ytdlp.cookies_path = path;
        self
    }

    pub fn with_temp_dir(mut self, dir: PathBuf) -> Self {
        self.sampler.temp_dir = Some(dir);
        self
    }
}
