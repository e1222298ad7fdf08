// Error types for the resolution pipeline

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a strategy provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Upstream did not answer in time
    #[error("Network timeout: upstream is not responding")]
    NetworkTimeout,

    /// Upstream refused the request (429, bot detection, etc.)
    #[error("Blocked by upstream: {0}")]
    Blocked(String),

    /// Extractor binary not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// URL rejected by the extractor
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Extraction succeeded but produced no playable media
    #[error("No media data: {0}")]
    NoData(String),

    /// Failed to parse extractor output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Command execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Unknown error with details
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// Message used for blocking diagnostics
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

// Classify raw extractor stderr
impl From<String> for ProviderError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::NetworkTimeout;
        }

        if lower.contains("429") || lower.contains("bot") || lower.contains("blocked") {
            return Self::Blocked(s);
        }

        // `HTTP Error 404: Not Found` is missing media
        if lower.contains("http error 404") || lower.contains("http error 410") {
            return Self::NoData(s);
        }

        if lower.contains("not found")
            || lower.contains("no such file")
            || lower.contains("command not found")
        {
            return Self::ToolNotFound(s);
        }

        if lower.contains("parse") || lower.contains("json") {
            return Self::ParseError(s);
        }

        if lower.contains("invalid url") || lower.contains("unsupported url") {
            return Self::InvalidUrl(s);
        }

        Self::Unknown(s)
    }
}

impl From<ProcessError> for ProviderError {
    fn from(e: ProcessError) -> Self {
        match e {
            ProcessError::Spawn { program, .. } => Self::ToolNotFound(program),
            ProcessError::Timeout { .. } => Self::NetworkTimeout,
            other => Self::ExecutionError(other.to_string()),
        }
    }
}

/// Why an upstream refused to serve media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockingReason {
    /// 429 or similar throttling
    RateLimited,
    /// Automated access detected
    BotDetection,
    /// Not available in this region
    GeoBlocked,
    /// Private post
    PrivateVideo,
    /// Deleted or otherwise gone
    VideoUnavailable,
    /// Needs a logged-in session
    LoginRequired,
    /// Soft block / slow network
    NetworkTimeout,
    Unknown,
}

impl BlockingReason {
    /// Whether a later attempt (or another provider) may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::BotDetection | Self::NetworkTimeout | Self::Unknown
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::RateLimited => "Rate limited by upstream",
            Self::BotDetection => "Bot detection triggered",
            Self::GeoBlocked => "Geographic restriction",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::LoginRequired => "Login required",
            Self::NetworkTimeout => "Network timeout (possible IP throttling)",
            Self::Unknown => "Unknown blocking reason",
        }
    }
}

/// Analyze an error message and return the blocking reason, if any
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    let lower = error.to_lowercase();

    if lower.contains("private video") || lower.contains("this video is private") {
        return Some(BlockingReason::PrivateVideo);
    }

    if lower.contains("video unavailable")
        || lower.contains("has been removed")
        || lower.contains("does not exist")
        || lower.contains("404")
    {
        return Some(BlockingReason::VideoUnavailable);
    }

    if lower.contains("not available in your country") || lower.contains("geo-restricted") {
        return Some(BlockingReason::GeoBlocked);
    }

    if lower.contains("login required")
        || lower.contains("log in")
        || lower.contains("sign in")
        || lower.contains("cookies")
    {
        return Some(BlockingReason::LoginRequired);
    }

    if lower.contains("429")
        || lower.contains("too many requests")
        || lower.contains("rate limit")
        || lower.contains("rate-limit")
    {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("bot") || lower.contains("captcha") {
        return Some(BlockingReason::BotDetection);
    }

    if lower.contains("timeout") || lower.contains("timed out") {
        return Some(BlockingReason::NetworkTimeout);
    }

    if lower.contains("403") || lower.contains("forbidden") || lower.contains("blocked") {
        return Some(BlockingReason::Unknown);
    }

    None
}

/// Why a single strategy did not yield an accepted candidate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailureCause {
    #[error("provider failed: {0}")]
    Provider(ProviderError),

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("validation rejected after {attempts} attempt(s)")]
    ValidationRejected { attempts: u32 },

    #[error("sampling inconclusive: {0}")]
    SamplingInconclusive(String),
}

impl FailureCause {
    pub fn blocking_reason(&self) -> Option<BlockingReason> {
        match self {
            Self::Provider(e) => diagnose_error(&e.detail()),
            _ => None,
        }
    }
}

/// Last recorded failure of one strategy
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyFailure {
    pub provider: String,
    pub cause: FailureCause,
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.cause)?;
        if let Some(reason) = self.cause.blocking_reason() {
            write!(f, " ({})", reason.description())?;
        }
        Ok(())
    }
}

/// Every strategy for the platform failed
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineExhausted {
    pub failures: Vec<StrategyFailure>,
}

impl fmt::Display for PipelineExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "All strategies failed")?;
        for failure in &self.failures {
            write!(f, "\n  - {}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for PipelineExhausted {}

/// Subprocess failures (ffmpeg, tesseract, yt-dlp)
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to capture output of {0}")]
    Capture(String),

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },
}

/// Frame sampler failures; swallowed into an empty result
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Download timed out after {0}s")]
    DownloadTimeout(u64),

    #[error("Media file not found: {0}")]
    MissingInput(PathBuf),

    #[error("ffmpeg failed: {0}")]
    Extraction(String),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text recognition failures
#[derive(Debug, Clone, Error)]
pub enum RecognitionError {
    #[error("Recognition engine failed to start: {0}")]
    Init(String),

    #[error("Image not found: {0}")]
    MissingImage(PathBuf),

    #[error("Recognition failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_extractor_stderr() {
        assert_eq!(
            ProviderError::from("ERROR: Read timed out".to_string()),
            ProviderError::NetworkTimeout
        );
        assert!(matches!(
            ProviderError::from("HTTP Error 429: Too Many Requests".to_string()),
            ProviderError::Blocked(_)
        ));
        assert!(matches!(
            ProviderError::from("ERROR: Unsupported URL: https://example.com".to_string()),
            ProviderError::InvalidUrl(_)
        ));
        assert!(matches!(
            ProviderError::from(
                "ERROR: [generic] Unable to download webpage: HTTP Error 404: Not Found".to_string()
            ),
            ProviderError::NoData(_)
        ));
        assert!(matches!(
            ProviderError::from("sh: yt-dlp: command not found".to_string()),
            ProviderError::ToolNotFound(_)
        ));
        assert!(matches!(
            ProviderError::from("something odd".to_string()),
            ProviderError::Unknown(_)
        ));
    }

    #[test]
    fn test_diagnose_error() {
        assert_eq!(
            diagnose_error("ERROR: [TikTok] 123: This video is private"),
            Some(BlockingReason::PrivateVideo)
        );
        assert_eq!(
            diagnose_error("HTTP Error 429: Too Many Requests"),
            Some(BlockingReason::RateLimited)
        );
        assert_eq!(diagnose_error("all good"), None);

        assert!(BlockingReason::RateLimited.is_retryable());
        assert!(BlockingReason::NetworkTimeout.is_retryable());
        assert!(!BlockingReason::PrivateVideo.is_retryable());
        assert!(!BlockingReason::LoginRequired.is_retryable());
    }

    #[test]
    fn test_exhausted_display_keeps_order() {
        let err = PipelineExhausted {
            failures: vec![
                StrategyFailure {
                    provider: "tiktok-v2".to_string(),
                    cause: FailureCause::ValidationRejected { attempts: 2 },
                },
                StrategyFailure {
                    provider: "yt-dlp".to_string(),
                    cause: FailureCause::Provider(ProviderError::NetworkTimeout),
                },
            ],
        };
        let text = err.to_string();
        let first = text.find("tiktok-v2").unwrap();
        let second = text.find("yt-dlp").unwrap();
        assert!(first < second);
        assert!(text.contains("Network timeout (possible IP throttling)"));
    }
}
